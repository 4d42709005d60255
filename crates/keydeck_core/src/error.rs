use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConsoleError {
    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Unexpected response: {0}")]
    InvalidResponse(String),

    #[error("Key not found: {0}")]
    NotFound(String),

    #[error("Write rejected: {0}")]
    WriteRejected(String),

    #[error("Key name is required")]
    MissingKey,

    #[error("Invalid {key_type} value: {message}")]
    InvalidEditValue { key_type: String, message: String },

    #[error("Unsupported key type: {0}")]
    UnsupportedType(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl ConsoleError {
    pub fn request_failed(message: impl Into<String>) -> Self {
        Self::RequestFailed(message.into())
    }

    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::InvalidResponse(message.into())
    }

    pub fn not_found(key: impl Into<String>) -> Self {
        Self::NotFound(key.into())
    }

    pub fn write_rejected(message: impl Into<String>) -> Self {
        Self::WriteRejected(message.into())
    }

    pub fn invalid_edit_value(key_type: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidEditValue {
            key_type: key_type.into(),
            message: message.into(),
        }
    }
}
