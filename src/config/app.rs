use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::{ConfigError, FuseConfig, StoreConfig, Validate};

/// Top-level configuration for a fuse box
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FuseSettings {
    /// Parameters for fuses without their own entry
    #[serde(default)]
    pub defaults: FuseConfig,
    /// Per-fuse overrides, keyed by fuse name
    #[serde(default)]
    pub fuses: HashMap<String, FuseConfig>,
    /// Store backend
    #[serde(default)]
    pub store: StoreConfig,
}

impl FuseSettings {
    /// Configuration for the named fuse, falling back to the defaults
    pub fn for_fuse(&self, name: &str) -> FuseConfig {
        self.fuses.get(name).copied().unwrap_or(self.defaults)
    }
}

impl Validate for FuseSettings {
    fn validate(&self) -> Result<(), ConfigError> {
        self.defaults.validate()?;
        for (name, fuse) in &self.fuses {
            if name.is_empty() {
                return Err(ConfigError::ValidationError("fuses.<name> cannot be empty".to_string()));
            }
            fuse.validate().map_err(|e| match e {
                ConfigError::ValidationError(msg) => {
                    ConfigError::ValidationError(format!("fuses.{}: {}", name, msg))
                }
                other => other,
            })?;
        }
        self.store.validate()?;
        Ok(())
    }
}

/// Load the configuration with layered sources
///
/// Later layers win: `config/default`, `config/{LIGHTER_FUSE_ENV}`,
/// `config/local`, then `LIGHTER_FUSE__*` environment variables
/// (e.g. `LIGHTER_FUSE__DEFAULTS__MAX_MELTS=5`).
pub fn load_config() -> Result<FuseSettings, ConfigError> {
    use config::{Config, Environment, File};

    // Determine the environment
    let env = std::env::var("LIGHTER_FUSE_ENV").unwrap_or_else(|_| "development".to_string());

    let config = Config::builder()
        // Layer 1: Base defaults
        .add_source(File::with_name("config/default").required(false))
        // Layer 2: Environment-specific overrides
        .add_source(File::with_name(&format!("config/{}", env)).required(false))
        // Layer 3: Local developer overrides (git-ignored)
        .add_source(File::with_name("config/local").required(false))
        // Layer 4: Environment variables (highest precedence)
        .add_source(
            Environment::with_prefix("LIGHTER_FUSE")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    let settings: FuseSettings = config.try_deserialize()?;

    settings.validate()?;

    ::tracing::debug!(
        environment = %env,
        overrides = settings.fuses.len(),
        "Fuse configuration loaded"
    );

    Ok(settings)
}
