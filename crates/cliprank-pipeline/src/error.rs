//! Pipeline error taxonomy.

use thiserror::Error;

pub type PipelineResult<T> = Result<T, PipelineError>;

/// Job-level errors.
///
/// Per-window grading failures and per-clip render failures are not
/// represented here: they degrade in place (sentinel grade, logged clip
/// failure) and only surface through the job report.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Endpoints unhealthy: {0}")]
    Health(String),

    #[error("Ingest failed: {0}")]
    Ingest(String),

    #[error("Transcription failed: {0}")]
    Asr(String),

    #[error("Job cancelled")]
    Cancelled,

    #[error("Media error: {0}")]
    Media(#[from] cliprank_media::MediaError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl PipelineError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn ingest(msg: impl Into<String>) -> Self {
        Self::Ingest(msg.into())
    }

    pub fn asr(msg: impl Into<String>) -> Self {
        Self::Asr(msg.into())
    }
}
