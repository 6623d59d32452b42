use crate::query::response::AssistantMessage;
use std::path::PathBuf;

/// Shown in place of a reply when the service cannot be reached.
pub const UNAVAILABLE_MESSAGE: &str =
    "An error occurred while fetching the response. Please try again later.";

/// Errors from forwarding a query.
#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    #[error("{0} must not be empty")]
    EmptyInput(&'static str),
    #[error("path must be absolute: {0}")]
    InvalidPath(String),
    #[error("file does not exist: {0}")]
    NotFound(PathBuf),
    #[error("assistant service unavailable: {0}")]
    ServiceUnavailable(String),
    #[error("unexpected reply from the assistant service: {0}")]
    Decode(String),
}

impl QueryError {
    /// Stable tag used on the IPC surface.
    pub fn kind(&self) -> &'static str {
        match self {
            QueryError::EmptyInput(_) => "BadRequest",
            QueryError::InvalidPath(_) => "InvalidPath",
            QueryError::NotFound(_) => "NotFound",
            QueryError::ServiceUnavailable(_) | QueryError::Decode(_) => "ServiceUnavailable",
        }
    }

    /// Render the failure as an inline assistant message.
    pub fn to_message(&self) -> AssistantMessage {
        match self {
            QueryError::ServiceUnavailable(_) | QueryError::Decode(_) => {
                AssistantMessage::failure(UNAVAILABLE_MESSAGE)
            },
            other => AssistantMessage::failure(other.to_string()),
        }
    }
}
