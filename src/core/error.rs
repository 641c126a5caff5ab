use thiserror::Error;

#[derive(Error, Debug)]
pub enum TideholmError {
    /// A hard invariant was broken; this is a programming error, not a
    /// recoverable runtime condition
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    TomlError(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, TideholmError>;
