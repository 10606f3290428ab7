pub mod app;
pub mod fuse;

pub use app::FuseSettings;
pub use fuse::{FuseConfig, StoreConfig};

/// Errors raised while loading or validating configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A configuration source could not be read or deserialized
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),
    /// A value was loaded but is out of range
    #[error("invalid configuration: {0}")]
    ValidationError(String),
}

/// Range checks run after deserialization
pub trait Validate {
    fn validate(&self) -> Result<(), ConfigError>;
}

/// Load fuse settings from files and environment variables
pub fn load() -> Result<FuseSettings, ConfigError> {
    app::load_config()
}
