//! Recording errors
//!
//! Errors surfaced synchronously by session operations and backends.

use thiserror::Error;

/// Errors that can occur during recording
#[derive(Error, Debug)]
pub enum RecordingError {
    #[error("Camera unavailable: {0}")]
    CameraUnavailable(String),

    #[error("Configuration rejected: {0}")]
    ConfigurationRejected(String),

    #[error("Preview surface unusable: {0}")]
    PreviewSurfaceUnusable(String),

    #[error("Thumbnail extraction failed: {0}")]
    ThumbnailExtractionFailed(String),

    #[error("Already recording")]
    AlreadyRecording,

    #[error("Not recording")]
    NotRecording,

    #[error("Recording session already released")]
    Released,

    #[error("Invalid camera id: {0}")]
    InvalidCameraId(u32),

    #[error("Encoding error: {0}")]
    Encoding(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for recording operations
pub type RecordingResult<T> = Result<T, RecordingError>;
