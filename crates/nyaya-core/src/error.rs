use thiserror::Error;

/// Top-level error type for Nyaya.
///
/// Subsystem crates keep their own error enums and implement
/// `From<SubsystemError> for NyayaError` so the binary can use `?` across
/// crate boundaries.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum NyayaError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Chat error: {0}")]
    Chat(String),
}

impl From<toml::de::Error> for NyayaError {
    fn from(err: toml::de::Error) -> Self {
        NyayaError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for NyayaError {
    fn from(err: toml::ser::Error) -> Self {
        NyayaError::Config(err.to_string())
    }
}

/// A specialized `Result` type for Nyaya operations.
pub type Result<T> = std::result::Result<T, NyayaError>;
