use thiserror::Error;

#[allow(clippy::enum_variant_names)]
#[derive(Debug, Error)]
pub enum StevedoreError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    SerializationError(String),
    #[error("Configuration error: {0}")]
    ConfigurationError(String),
    #[error("Transfer error: {0}")]
    TransferError(String),
    #[error("Error: {0}")]
    GenericError(String),
}

impl From<bincode::Error> for StevedoreError {
    fn from(e: bincode::Error) -> Self {
        Self::SerializationError(e.to_string())
    }
}

impl From<toml::de::Error> for StevedoreError {
    fn from(e: toml::de::Error) -> Self {
        Self::ConfigurationError(e.to_string())
    }
}

impl From<String> for StevedoreError {
    fn from(e: String) -> Self {
        Self::GenericError(e)
    }
}

impl From<&str> for StevedoreError {
    fn from(e: &str) -> Self {
        Self::GenericError(e.to_string())
    }
}
