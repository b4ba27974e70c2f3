use thiserror::Error;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Duplicate key: {0}")]
    DuplicateKey(String),

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

impl DomainError {
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    pub fn duplicate_key(msg: impl Into<String>) -> Self {
        Self::DuplicateKey(msg.into())
    }

    pub fn storage(msg: impl Into<String>) -> Self {
        Self::StorageError(msg.into())
    }

    pub fn serialization(msg: impl Into<String>) -> Self {
        Self::SerializationError(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, Self::InvalidArgument(_))
    }

    pub fn is_duplicate_key(&self) -> bool {
        matches!(self, Self::DuplicateKey(_))
    }

    /// Errors raised by the document store rather than by local validation.
    pub fn is_store_failure(&self) -> bool {
        matches!(
            self,
            Self::DuplicateKey(_) | Self::StorageError(_) | Self::SerializationError(_)
        )
    }
}

impl From<bson::ser::Error> for DomainError {
    fn from(err: bson::ser::Error) -> Self {
        Self::serialization(format!("Failed to encode document: {}", err))
    }
}

impl From<bson::de::Error> for DomainError {
    fn from(err: bson::de::Error) -> Self {
        Self::serialization(format!("Failed to decode document: {}", err))
    }
}
