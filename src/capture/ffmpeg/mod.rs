//! FFmpeg media backend
//!
//! Records from the platform's camera input (v4l2, avfoundation or dshow)
//! through the `ffmpeg` executable and decodes thumbnails with `ffprobe`
//! and `ffmpeg`. Preview and recording use separate pipelines and FFmpeg
//! cannot suspend a running encode, so pause is not offered.

pub mod camera;
pub mod config;
pub mod decoder;
pub mod encoder;

pub use camera::FfmpegCamera;
pub use config::BackendConfig;
pub use decoder::FfmpegDecoder;
pub use encoder::FfmpegEncoder;

use crate::capture::traits::{
    BackendCapabilities, CameraDevice, CameraId, CameraInfo, EncoderConfig, EncoderPipeline,
    FrameDecoder, MediaBackend, OutputOption,
};
use crate::recorder::error::RecordingResult;
use std::path::Path;

/// Backend driving the FFmpeg command-line tools
#[derive(Debug, Clone, Default)]
pub struct FfmpegBackend {
    config: BackendConfig,
}

impl FfmpegBackend {
    pub fn new(config: BackendConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &BackendConfig {
        &self.config
    }
}

impl MediaBackend for FfmpegBackend {
    fn capabilities(&self) -> BackendCapabilities {
        BackendCapabilities {
            supports_pause: false,
            supports_output_formats: true,
            shared_pipeline: false,
        }
    }

    fn cameras(&self) -> Vec<CameraInfo> {
        #[allow(unused_mut)]
        let mut cameras: Vec<CameraInfo> = [CameraId::Back, CameraId::Front]
            .into_iter()
            .zip(&self.config.camera_devices)
            .map(|(id, _)| CameraInfo {
                id,
                name: match id {
                    CameraId::Back => "Back".to_string(),
                    CameraId::Front => "Front".to_string(),
                },
            })
            .collect();

        #[cfg(feature = "native-camera")]
        {
            let names = super::native::camera_names();
            for (camera, name) in cameras.iter_mut().zip(names) {
                camera.name = name;
            }
        }

        cameras
    }

    fn output_profiles(&self) -> Vec<OutputOption> {
        vec![
            OutputOption::new("QUALITY_480P", "640x480"),
            OutputOption::new("QUALITY_720P", "1280x720"),
            OutputOption::new("QUALITY_1080P", "1920x1080"),
            OutputOption::new("QUALITY_QVGA", "320x240"),
        ]
    }

    fn output_formats(&self) -> Vec<OutputOption> {
        vec![OutputOption::new("3gpp", "3gp"), OutputOption::new("mp4", "mp4")]
    }

    fn open_camera(&self, id: CameraId) -> RecordingResult<Box<dyn CameraDevice>> {
        Ok(Box::new(FfmpegCamera::open(id, &self.config.camera_devices)?))
    }

    fn configure_encoder(
        &self,
        camera: &mut dyn CameraDevice,
        config: &EncoderConfig,
    ) -> RecordingResult<Box<dyn EncoderPipeline>> {
        Ok(Box::new(FfmpegEncoder::configure(&self.config, camera, config)?))
    }

    fn open_decoder(&self, path: &Path) -> RecordingResult<Box<dyn FrameDecoder>> {
        Ok(Box::new(FfmpegDecoder::open(&self.config, path)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::ffmpeg::encoder::parse_profile;

    #[test]
    fn test_profiles_are_encodable() {
        let backend = FfmpegBackend::default();
        for profile in backend.output_profiles() {
            assert!(parse_profile(&profile.value).is_some(), "{}", profile.name);
        }
    }

    #[test]
    fn test_cameras_follow_configured_devices() {
        let backend = FfmpegBackend::new(BackendConfig {
            camera_devices: vec!["/dev/video0".to_string()],
            ..BackendConfig::default()
        });
        let cameras = backend.cameras();
        assert_eq!(cameras.len(), 1);
        assert_eq!(cameras[0].id, CameraId::Back);

        let backend = FfmpegBackend::new(BackendConfig {
            camera_devices: Vec::new(),
            ..BackendConfig::default()
        });
        assert!(backend.cameras().is_empty());
        assert!(backend.open_camera(CameraId::Back).is_err());
    }

    #[test]
    fn test_capabilities() {
        let caps = FfmpegBackend::default().capabilities();
        assert!(!caps.supports_pause);
        assert!(caps.supports_output_formats);
        assert!(!caps.shared_pipeline);
    }
}
