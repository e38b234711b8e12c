//! Scoped ownership of backend resources
//!
//! Each handle releases its device exactly once, either explicitly or on drop.

use crate::capture::traits::{
    CameraDevice, CameraId, EncoderPipeline, FrameDecoder, PreviewSurface,
};
use crate::recorder::error::RecordingResult;

/// Owns one acquired camera device
pub struct CameraHandle {
    id: CameraId,
    device: Option<Box<dyn CameraDevice>>,
    previewing: bool,
    locked: bool,
}

impl CameraHandle {
    pub fn new(device: Box<dyn CameraDevice>) -> Self {
        Self {
            id: device.id(),
            device: Some(device),
            previewing: false,
            locked: true,
        }
    }

    pub fn id(&self) -> CameraId {
        self.id
    }

    /// Whether the live feed is running and the camera is not lent to an encoder
    pub fn is_previewing(&self) -> bool {
        self.device.is_some() && self.previewing && self.locked
    }

    pub fn start_preview(&mut self, surface: &dyn PreviewSurface) -> RecordingResult<()> {
        if let Some(device) = self.device.as_mut() {
            device.start_preview(surface)?;
            self.previewing = true;
            tracing::debug!("Preview started on {} camera ({})", self.id, surface.label());
        }
        Ok(())
    }

    pub fn unlock(&mut self) -> RecordingResult<()> {
        if let Some(device) = self.device.as_mut() {
            if self.locked {
                device.unlock()?;
                self.locked = false;
            }
        }
        Ok(())
    }

    pub fn lock(&mut self) -> RecordingResult<()> {
        if let Some(device) = self.device.as_mut() {
            if !self.locked {
                device.lock()?;
                self.locked = true;
            }
        }
        Ok(())
    }

    /// Borrow the device for encoder configuration
    pub fn device_mut(&mut self) -> Option<&mut (dyn CameraDevice + 'static)> {
        self.device.as_deref_mut()
    }

    /// Stop preview and release the device. Safe to call repeatedly.
    pub fn release(&mut self) {
        if let Some(mut device) = self.device.take() {
            if self.previewing {
                device.stop_preview();
                self.previewing = false;
            }
            device.release();
            tracing::debug!("Released {} camera", self.id);
        }
    }
}

impl Drop for CameraHandle {
    fn drop(&mut self) {
        self.release();
    }
}

/// Owns one configured encoder pipeline
pub struct EncoderHandle {
    pipeline: Option<Box<dyn EncoderPipeline>>,
}

impl EncoderHandle {
    pub fn new(pipeline: Box<dyn EncoderPipeline>) -> Self {
        Self {
            pipeline: Some(pipeline),
        }
    }

    pub fn start(&mut self) -> RecordingResult<()> {
        match self.pipeline.as_mut() {
            Some(pipeline) => pipeline.start(),
            None => Ok(()),
        }
    }

    pub fn pause(&mut self) -> RecordingResult<()> {
        match self.pipeline.as_mut() {
            Some(pipeline) => pipeline.pause(),
            None => Ok(()),
        }
    }

    pub fn resume(&mut self) -> RecordingResult<()> {
        match self.pipeline.as_mut() {
            Some(pipeline) => pipeline.resume(),
            None => Ok(()),
        }
    }

    /// Flush and close the output, then release. The pipeline is released
    /// even when finalization fails.
    pub fn finish(&mut self) -> RecordingResult<()> {
        let result = match self.pipeline.as_mut() {
            Some(pipeline) => pipeline.finish(),
            None => Ok(()),
        };
        self.release();
        result
    }

    pub fn release(&mut self) {
        if let Some(mut pipeline) = self.pipeline.take() {
            pipeline.release();
            tracing::debug!("Released encoder pipeline");
        }
    }
}

impl Drop for EncoderHandle {
    fn drop(&mut self) {
        self.release();
    }
}

/// Owns one open frame decoder
pub struct DecoderHandle {
    decoder: Option<Box<dyn FrameDecoder>>,
}

impl DecoderHandle {
    pub fn new(decoder: Box<dyn FrameDecoder>) -> Self {
        Self {
            decoder: Some(decoder),
        }
    }

    pub fn decoder_mut(&mut self) -> Option<&mut (dyn FrameDecoder + 'static)> {
        self.decoder.as_deref_mut()
    }

    pub fn release(&mut self) {
        if let Some(mut decoder) = self.decoder.take() {
            decoder.release();
        }
    }
}

impl Drop for DecoderHandle {
    fn drop(&mut self) {
        self.release();
    }
}
