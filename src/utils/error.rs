//! Error types and handling
//!
//! Application-level errors and the shape they take at the frontend boundary.

use crate::recorder::error::RecordingError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Application-wide error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Recording(#[from] RecordingError),

    #[error("No active recording")]
    NoSession,

    #[error("Background task failed: {0}")]
    Task(String),
}

/// Error response for frontend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
}

impl From<AppError> for ErrorResponse {
    fn from(error: AppError) -> Self {
        let code = match &error {
            AppError::Recording(recording) => match recording {
                RecordingError::CameraUnavailable(_) => "CAMERA_UNAVAILABLE",
                RecordingError::ConfigurationRejected(_) => "CONFIGURATION_REJECTED",
                RecordingError::PreviewSurfaceUnusable(_) => "PREVIEW_SURFACE_UNUSABLE",
                RecordingError::ThumbnailExtractionFailed(_) => "THUMBNAIL_EXTRACTION_FAILED",
                RecordingError::AlreadyRecording => "ALREADY_RECORDING",
                RecordingError::NotRecording => "NOT_RECORDING",
                RecordingError::Released => "SESSION_RELEASED",
                RecordingError::InvalidCameraId(_) => "INVALID_CAMERA_ID",
                RecordingError::Encoding(_) => "ENCODING_ERROR",
                RecordingError::Io(_) => "IO_ERROR",
            },
            AppError::NoSession => "NO_SESSION",
            AppError::Task(_) => "TASK_ERROR",
        };

        ErrorResponse {
            code: code.to_string(),
            message: error.to_string(),
        }
    }
}

/// Result type alias using AppError
pub type AppResult<T> = Result<T, AppError>;
