//! Capture backends
//!
//! Platform-agnostic capability traits plus the FFmpeg implementation.

pub mod ffmpeg;
pub mod surface;
pub mod traits;

#[cfg(feature = "native-camera")]
pub mod native;

// Re-export traits
pub use traits::{
    BackendCapabilities, CameraDevice, CameraId, CameraInfo, EncoderConfig, EncoderPipeline,
    FrameDecoder, MediaBackend, OutputOption, PreviewSurface, VideoFrame,
};

pub use ffmpeg::{BackendConfig, FfmpegBackend};
pub use surface::SurfaceHandle;
