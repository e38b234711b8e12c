//! Capture trait definitions
//!
//! Platform-agnostic traits for the camera, encoder and decoder capabilities
//! a recording session consumes. Concrete backends live next to this module.

use crate::recorder::error::{RecordingError, RecordingResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Logical camera selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum CameraId {
    /// Rear-facing (or first) camera, id 0
    Back,
    /// Front-facing (or second) camera, id 1
    Front,
}

impl CameraId {
    /// The camera on the other side
    pub fn other(self) -> Self {
        match self {
            CameraId::Back => CameraId::Front,
            CameraId::Front => CameraId::Back,
        }
    }

    /// Numeric id used by the frontend and device tables
    pub fn index(self) -> u32 {
        match self {
            CameraId::Back => 0,
            CameraId::Front => 1,
        }
    }
}

impl TryFrom<u32> for CameraId {
    type Error = RecordingError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(CameraId::Back),
            1 => Ok(CameraId::Front),
            other => Err(RecordingError::InvalidCameraId(other)),
        }
    }
}

impl From<CameraId> for u32 {
    fn from(id: CameraId) -> Self {
        id.index()
    }
}

impl fmt::Display for CameraId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CameraId::Back => write!(f, "back"),
            CameraId::Front => write!(f, "front"),
        }
    }
}

/// Information about a camera
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CameraInfo {
    /// Logical id passed back when creating a recording
    pub id: CameraId,

    /// Human readable name
    pub name: String,
}

/// An opaque backend-defined choice (quality profile or container format)
///
/// `value` is handed back to the backend untouched when a session is created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputOption {
    pub name: String,
    pub value: String,
}

impl OutputOption {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Feature flags a backend advertises
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackendCapabilities {
    /// Encoder can suspend without closing the file
    pub supports_pause: bool,

    /// Container format is selectable at creation time
    pub supports_output_formats: bool,

    /// Preview and recording run in one pipeline; stopping tears it down
    pub shared_pipeline: bool,
}

/// Everything the encoder needs besides the camera itself
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncoderConfig {
    pub output_path: PathBuf,
    pub profile: String,
    pub container_format: Option<String>,
}

/// A decoded still frame in tightly packed RGBA8
#[derive(Debug, Clone)]
pub struct VideoFrame {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

impl VideoFrame {
    /// Expected buffer length for the frame dimensions
    pub fn expected_len(&self) -> usize {
        self.width as usize * self.height as usize * 4
    }
}

/// Display target the live camera feed is bound to
pub trait PreviewSurface: Send + Sync {
    /// Identifier used in logs
    fn label(&self) -> &str;

    /// Whether the surface can accept a camera feed right now
    fn is_ready(&self) -> bool;
}

/// One acquired camera device
pub trait CameraDevice: Send {
    /// Logical id this device was opened with
    fn id(&self) -> CameraId;

    /// Backend-specific device address (e.g. `/dev/video0`)
    fn device_name(&self) -> &str;

    /// Bind the live feed to a surface and start previewing
    fn start_preview(&mut self, surface: &dyn PreviewSurface) -> RecordingResult<()>;

    /// Stop the live feed
    fn stop_preview(&mut self);

    /// Hand the device over to an encoder
    fn unlock(&mut self) -> RecordingResult<()>;

    /// Take the device back from the encoder so preview can continue
    fn lock(&mut self) -> RecordingResult<()>;

    /// Release the device. Must tolerate being called more than once.
    fn release(&mut self);
}

/// An encoder bound to a camera and writing one output file
pub trait EncoderPipeline: Send {
    /// Begin writing the output file
    fn start(&mut self) -> RecordingResult<()>;

    fn pause(&mut self) -> RecordingResult<()>;

    fn resume(&mut self) -> RecordingResult<()>;

    /// Flush and close the output file
    fn finish(&mut self) -> RecordingResult<()>;

    /// Detach from the camera and free native resources. Idempotent.
    fn release(&mut self);
}

/// Random-access still frame reader over a finished media file
pub trait FrameDecoder: Send {
    /// Total media duration in milliseconds
    fn duration_ms(&self) -> u64;

    /// Decode the frame closest to `timestamp_ms`
    fn frame_at(&mut self, timestamp_ms: u64) -> RecordingResult<VideoFrame>;

    /// Free native resources. Idempotent.
    fn release(&mut self);
}

/// Source of camera, encoder and decoder capabilities for a platform
pub trait MediaBackend: Send + Sync {
    fn capabilities(&self) -> BackendCapabilities;

    /// Available cameras, in display order
    fn cameras(&self) -> Vec<CameraInfo>;

    fn output_profiles(&self) -> Vec<OutputOption>;

    /// Empty when the backend does not let callers pick a container
    fn output_formats(&self) -> Vec<OutputOption>;

    fn open_camera(&self, id: CameraId) -> RecordingResult<Box<dyn CameraDevice>>;

    /// Configure an encoder against an unlocked camera
    fn configure_encoder(
        &self,
        camera: &mut dyn CameraDevice,
        config: &EncoderConfig,
    ) -> RecordingResult<Box<dyn EncoderPipeline>>;

    fn open_decoder(&self, path: &Path) -> RecordingResult<Box<dyn FrameDecoder>>;
}
