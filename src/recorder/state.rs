//! Recording state management
//!
//! Defines the recording state machine values, creation options and the
//! summary returned when a recording stops.

use crate::capture::traits::CameraId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Current state of a recording session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RecordingState {
    /// Previewing, no encoder active
    #[default]
    NotRecording,
    /// Encoder writing the output file
    Recording,
    /// Encoder suspended, file still open
    Paused,
}

impl RecordingState {
    /// Whether an encoder is held in this state
    pub fn is_active(self) -> bool {
        !matches!(self, RecordingState::NotRecording)
    }
}

/// Parameters for creating a recording session
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordingOptions {
    /// Camera to preview and record from
    pub camera_id: CameraId,

    /// Destination of the recorded media
    pub output_path: PathBuf,

    /// Opaque quality profile value from the backend
    pub profile: String,

    /// Opaque container format value, where the backend supports choosing one
    #[serde(default)]
    pub output_format: Option<String>,

    /// Number of thumbnails to extract after stopping (0 disables)
    #[serde(default)]
    pub thumbnail_count: u32,
}

/// Result of a stopped recording
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordingSummary {
    /// Path of the written media file, if a recording was stopped
    pub output_path: Option<PathBuf>,

    /// Extracted thumbnail files in ascending index order
    pub thumbnails: Vec<PathBuf>,

    /// When the encoder started
    pub started_at: Option<DateTime<Utc>>,

    /// When the encoder was finalized
    pub stopped_at: Option<DateTime<Utc>>,

    /// Wall-clock time between start and stop, pauses included
    pub duration_ms: u64,
}

impl RecordingSummary {
    pub(crate) fn new(
        output_path: PathBuf,
        started_at: Option<DateTime<Utc>>,
        stopped_at: DateTime<Utc>,
    ) -> Self {
        let duration_ms = started_at
            .map(|start| (stopped_at - start).num_milliseconds().max(0) as u64)
            .unwrap_or(0);
        Self {
            output_path: Some(output_path),
            thumbnails: Vec::new(),
            started_at,
            stopped_at: Some(stopped_at),
            duration_ms,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_state_wire_names() {
        assert_eq!(
            serde_json::to_string(&RecordingState::NotRecording).unwrap(),
            "\"notRecording\""
        );
        assert_eq!(RecordingState::default(), RecordingState::NotRecording);
        assert!(RecordingState::Paused.is_active());
    }

    #[test]
    fn test_options_defaults() {
        let options: RecordingOptions = serde_json::from_str(
            r#"{"cameraId":1,"outputPath":"/tmp/vid.mp4","profile":"1280x720"}"#,
        )
        .unwrap();
        assert_eq!(options.camera_id, CameraId::Front);
        assert_eq!(options.output_format, None);
        assert_eq!(options.thumbnail_count, 0);
    }

    #[test]
    fn test_summary_duration() {
        let start = Utc::now();
        let summary = RecordingSummary::new(
            PathBuf::from("/tmp/a.mp4"),
            Some(start),
            start + Duration::milliseconds(1500),
        );
        assert_eq!(summary.duration_ms, 1500);

        let summary = RecordingSummary::new(PathBuf::from("/tmp/a.mp4"), None, start);
        assert_eq!(summary.duration_ms, 0);
    }
}
