//! Client error types.

use thiserror::Error;

pub type ClientResult<T> = Result<T, ClientError>;

/// Errors from the model endpoint clients.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Transcription failed: {0}")]
    Asr(String),

    #[error("Transcription response malformed: {0}")]
    AsrMalformed(String),

    #[error("Grading failed: {0}")]
    Grade(String),

    #[error("Server error: {0}")]
    Server(String),

    #[error("Endpoint unhealthy: {0}")]
    Unhealthy(String),

    #[error("Request timed out after {0} seconds")]
    Timeout(u64),

    #[error("Operation cancelled")]
    Cancelled,

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ClientError {
    /// Whether the transport layer may retry the request.
    ///
    /// 5xx statuses and connection-level failures are transient; 4xx and
    /// malformed payloads are not.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Server(_) | Self::Timeout(_) => true,
            Self::Http(e) => {
                if let Some(status) = e.status() {
                    status.is_server_error()
                } else {
                    // Connect/reset/body errors without a status.
                    !e.is_builder()
                }
            }
            Self::Asr(_)
            | Self::AsrMalformed(_)
            | Self::Grade(_)
            | Self::Unhealthy(_)
            | Self::Cancelled
            | Self::Io(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryability() {
        assert!(ClientError::Server("503".into()).is_retryable());
        assert!(ClientError::Timeout(45).is_retryable());
        assert!(!ClientError::Grade("bad json".into()).is_retryable());
        assert!(!ClientError::AsrMalformed("bad".into()).is_retryable());
        assert!(!ClientError::Cancelled.is_retryable());
    }
}
