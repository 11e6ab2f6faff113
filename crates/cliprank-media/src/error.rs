//! Error types for media operations.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for media operations.
pub type MediaResult<T> = Result<T, MediaError>;

/// Errors that can occur during media processing.
#[derive(Debug, Error)]
pub enum MediaError {
    #[error("External tool not found: {0}. Install it and ensure it's in your PATH.")]
    ToolNotFound(String),

    #[error("FFmpeg command failed: {message}")]
    FfmpegFailed {
        message: String,
        stderr: Option<String>,
        exit_code: Option<i32>,
    },

    #[error("FFprobe command failed: {message}")]
    FfprobeFailed {
        message: String,
        stderr: Option<String>,
    },

    #[error("Ingest failed: {message}")]
    IngestFailed {
        message: String,
        /// Permanent refusals (HTTP 4xx other than 408/429, private or
        /// removed videos) must not be retried.
        permanent: bool,
    },

    #[error("Render failed: {0}")]
    RenderFailed(String),

    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Operation timed out after {0} seconds")]
    Timeout(u64),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("Invalid video file: {0}")]
    InvalidVideo(String),
}

impl MediaError {
    /// Create an FFmpeg failure error.
    pub fn ffmpeg_failed(
        message: impl Into<String>,
        stderr: Option<String>,
        exit_code: Option<i32>,
    ) -> Self {
        Self::FfmpegFailed {
            message: message.into(),
            stderr,
            exit_code,
        }
    }

    /// Create a retryable ingest failure.
    pub fn ingest_failed(message: impl Into<String>) -> Self {
        Self::IngestFailed {
            message: message.into(),
            permanent: false,
        }
    }

    /// Create a permanent (non-retryable) ingest failure.
    pub fn ingest_refused(message: impl Into<String>) -> Self {
        Self::IngestFailed {
            message: message.into(),
            permanent: true,
        }
    }

    /// Whether the orchestrator may retry the operation.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::IngestFailed { permanent, .. } => !permanent,
            Self::Cancelled => false,
            Self::Timeout(_) => true,
            _ => false,
        }
    }
}
