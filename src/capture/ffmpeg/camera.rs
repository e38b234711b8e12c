//! Camera devices addressed through FFmpeg input formats
//!
//! FFmpeg opens the device itself when recording starts, so acquiring a camera
//! here validates the address and tracks who currently owns the device.

use crate::capture::traits::{CameraDevice, CameraId, PreviewSurface};
use crate::recorder::error::{RecordingError, RecordingResult};

/// A camera reachable by FFmpeg
pub struct FfmpegCamera {
    id: CameraId,
    device: String,
    previewing: bool,
    lent_to_encoder: bool,
    released: bool,
}

impl FfmpegCamera {
    /// Acquire the device configured for `id`
    pub fn open(id: CameraId, devices: &[String]) -> RecordingResult<Self> {
        let device = devices.get(id.index() as usize).ok_or_else(|| {
            RecordingError::CameraUnavailable(format!("no device configured for {id} camera"))
        })?;

        if !device_exists(device) {
            return Err(RecordingError::CameraUnavailable(format!(
                "{id} camera device {device} not found"
            )));
        }

        tracing::info!("Opened {} camera at {}", id, device);
        Ok(Self {
            id,
            device: device.clone(),
            previewing: false,
            lent_to_encoder: false,
            released: false,
        })
    }

    pub fn is_previewing(&self) -> bool {
        self.previewing
    }

    pub fn is_lent_to_encoder(&self) -> bool {
        self.lent_to_encoder
    }
}

impl CameraDevice for FfmpegCamera {
    fn id(&self) -> CameraId {
        self.id
    }

    fn device_name(&self) -> &str {
        &self.device
    }

    fn start_preview(&mut self, surface: &dyn PreviewSurface) -> RecordingResult<()> {
        if self.released {
            return Err(RecordingError::CameraUnavailable(format!(
                "{} camera already released",
                self.id
            )));
        }
        if !surface.is_ready() {
            return Err(RecordingError::PreviewSurfaceUnusable(format!(
                "surface {} is not ready",
                surface.label()
            )));
        }
        self.previewing = true;
        Ok(())
    }

    fn stop_preview(&mut self) {
        self.previewing = false;
    }

    fn unlock(&mut self) -> RecordingResult<()> {
        if self.released {
            return Err(RecordingError::CameraUnavailable(format!(
                "{} camera already released",
                self.id
            )));
        }
        self.lent_to_encoder = true;
        Ok(())
    }

    fn lock(&mut self) -> RecordingResult<()> {
        self.lent_to_encoder = false;
        Ok(())
    }

    fn release(&mut self) {
        if self.released {
            return;
        }
        self.previewing = false;
        self.lent_to_encoder = false;
        self.released = true;
        tracing::info!("Released {} camera at {}", self.id, self.device);
    }
}

impl Drop for FfmpegCamera {
    fn drop(&mut self) {
        self.release();
    }
}

/// Device nodes can be checked on Linux; other platforms address devices by
/// index or name and are validated when FFmpeg opens them.
fn device_exists(device: &str) -> bool {
    #[cfg(target_os = "linux")]
    {
        std::path::Path::new(device).exists()
    }

    #[cfg(not(target_os = "linux"))]
    {
        !device.is_empty()
    }
}
