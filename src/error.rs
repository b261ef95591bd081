use thiserror::Error;

/// Errors raised by the plumbing around the pipeline (files, config, threads).
///
/// The pipeline itself never fails: malformed reports and degenerate samples
/// are absorbed where they occur.
#[derive(Error, Debug)]
pub enum MonitorError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Capture format error at line {line}: {reason}")]
    CaptureFormat { line: usize, reason: String },

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Failed to spawn {0} thread")]
    ThreadSpawn(&'static str),

    #[error("{0} thread panicked")]
    ThreadPanicked(&'static str),
}

pub type Result<T> = std::result::Result<T, MonitorError>;
