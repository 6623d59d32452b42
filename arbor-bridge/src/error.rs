// SPDX-License-Identifier: LGPL-3.0-only
use arbor_services::filesystem::FsError;
use arbor_services::query::QueryError;

/// Errors surfaced to IPC callers.
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    #[error("malformed request: {0}")]
    BadRequest(String),
    #[error("unknown channel: {0}")]
    UnknownChannel(String),
    #[error("no downloads folder on this system")]
    NoDownloads,
    #[error("cannot encode reply: {0}")]
    Encode(#[from] serde_json::Error),
    #[error(transparent)]
    Fs(#[from] FsError),
    #[error(transparent)]
    Query(#[from] QueryError),
}

impl BridgeError {
    /// Tag sent in the `error.kind` field of a response.
    pub fn kind(&self) -> &'static str {
        match self {
            BridgeError::BadRequest(_) | BridgeError::UnknownChannel(_) => "BadRequest",
            BridgeError::NoDownloads => "NotFound",
            BridgeError::Encode(_) => "Io",
            BridgeError::Fs(e) => e.kind(),
            BridgeError::Query(e) => e.kind(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn kinds_follow_the_wrapped_error() {
        let fs = BridgeError::from(FsError::AlreadyExistsAsFile(PathBuf::from("/tmp/x")));
        assert_eq!(fs.kind(), "AlreadyExists");

        let query = BridgeError::from(QueryError::ServiceUnavailable("refused".into()));
        assert_eq!(query.kind(), "ServiceUnavailable");

        assert_eq!(BridgeError::UnknownChannel("open-terminal".into()).kind(), "BadRequest");
    }
}
