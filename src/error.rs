/// Errors surfaced by fuse operations
#[derive(Debug, thiserror::Error)]
pub enum FuseError {
    /// Construction parameters were rejected
    #[error("invalid fuse configuration: {0}")]
    InvalidConfig(String),
    /// The backing store failed to answer a read or write
    ///
    /// Never raised for an absent key; absence falls back to the defaults.
    #[error(transparent)]
    Store(#[from] anyhow::Error),
    /// A persisted record holds a value the fuse does not understand
    #[error("corrupt fuse state at `{key}`: {value:?}")]
    CorruptState { key: String, value: String },
}

impl From<crate::config::ConfigError> for FuseError {
    fn from(err: crate::config::ConfigError) -> Self {
        match err {
            crate::config::ConfigError::ValidationError(msg) => FuseError::InvalidConfig(msg),
            other => FuseError::InvalidConfig(other.to_string()),
        }
    }
}
