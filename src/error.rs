use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
/// Bulk error
pub enum BulkError {
    #[error("bulk has already been executed and can no longer be modified")]
    IllegalState,

    #[error("bulk has already been executed")]
    AlreadyExecuted,

    #[error("invalid usage: {0}")]
    InvalidUsage(String),

    #[error("transport error: {message}")]
    Transport { code: Option<i64>, message: String },

    #[error("serialization error: {0}")]
    Serialization(String),
}

impl BulkError {
    /// Builds a transport error without a server error code.
    pub fn transport(message: impl Into<String>) -> Self {
        BulkError::Transport {
            code: None,
            message: message.into(),
        }
    }

    /// Error code carried by the failure, if any.
    pub fn code(&self) -> Option<i64> {
        match self {
            BulkError::Transport { code, .. } => *code,
            _ => None,
        }
    }
}

impl From<serde_json::Error> for BulkError {
    fn from(error: serde_json::Error) -> Self {
        BulkError::Serialization(error.to_string())
    }
}

impl From<std::io::Error> for BulkError {
    fn from(error: std::io::Error) -> Self {
        BulkError::transport(error.to_string())
    }
}
