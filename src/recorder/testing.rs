//! Resource-tracking backend double for tests

use crate::capture::traits::{
    BackendCapabilities, CameraDevice, CameraId, CameraInfo, EncoderConfig, EncoderPipeline,
    FrameDecoder, MediaBackend, OutputOption, PreviewSurface, VideoFrame,
};
use crate::recorder::error::{RecordingError, RecordingResult};
use parking_lot::Mutex;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    OpenCamera(CameraId),
    StartPreview(CameraId),
    StopPreview(CameraId),
    UnlockCamera,
    LockCamera,
    ReleaseCamera(CameraId),
    ConfigureEncoder,
    StartEncoder,
    PauseEncoder,
    ResumeEncoder,
    FinishEncoder,
    ReleaseEncoder,
    OpenDecoder,
    DecodeFrame(u64),
    ReleaseDecoder,
}

#[derive(Default)]
struct Knobs {
    capabilities: BackendCapabilities,
    unavailable: HashSet<CameraId>,
    reject_config: bool,
    fail_encoder_start: bool,
    fail_finish: bool,
    decoder_unavailable: bool,
    duration_ms: u64,
    failing_frames: HashSet<u64>,
}

/// Backend double recording every call in order
#[derive(Clone, Default)]
pub struct FakeBackend {
    calls: Arc<Mutex<Vec<Call>>>,
    knobs: Arc<Mutex<Knobs>>,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_pause(self) -> Self {
        self.knobs.lock().capabilities.supports_pause = true;
        self
    }

    pub fn with_shared_pipeline(self) -> Self {
        self.knobs.lock().capabilities.shared_pipeline = true;
        self
    }

    pub fn with_unavailable(self, id: CameraId) -> Self {
        self.knobs.lock().unavailable.insert(id);
        self
    }

    pub fn with_rejected_config(self) -> Self {
        self.knobs.lock().reject_config = true;
        self
    }

    pub fn with_failing_encoder_start(self) -> Self {
        self.knobs.lock().fail_encoder_start = true;
        self
    }

    pub fn with_failing_finish(self) -> Self {
        self.knobs.lock().fail_finish = true;
        self
    }

    pub fn with_decoder_unavailable(self) -> Self {
        self.knobs.lock().decoder_unavailable = true;
        self
    }

    pub fn with_duration_ms(self, duration_ms: u64) -> Self {
        self.knobs.lock().duration_ms = duration_ms;
        self
    }

    pub fn with_failing_frame(self, timestamp_ms: u64) -> Self {
        self.knobs.lock().failing_frames.insert(timestamp_ms);
        self
    }

    /// Make a camera (un)available after construction
    pub fn set_unavailable(&self, id: CameraId, unavailable: bool) {
        let mut knobs = self.knobs.lock();
        if unavailable {
            knobs.unavailable.insert(id);
        } else {
            knobs.unavailable.remove(&id);
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    pub fn count(&self, call: &Call) -> usize {
        self.calls.lock().iter().filter(|c| *c == call).count()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().clear();
    }

    fn record(&self, call: Call) {
        self.calls.lock().push(call);
    }
}

impl MediaBackend for FakeBackend {
    fn capabilities(&self) -> BackendCapabilities {
        self.knobs.lock().capabilities
    }

    fn cameras(&self) -> Vec<CameraInfo> {
        vec![
            CameraInfo {
                id: CameraId::Back,
                name: "Back".to_string(),
            },
            CameraInfo {
                id: CameraId::Front,
                name: "Front".to_string(),
            },
        ]
    }

    fn output_profiles(&self) -> Vec<OutputOption> {
        vec![OutputOption::new("QUALITY_720P", "720p")]
    }

    fn output_formats(&self) -> Vec<OutputOption> {
        vec![OutputOption::new("mp4", "mp4")]
    }

    fn open_camera(&self, id: CameraId) -> RecordingResult<Box<dyn CameraDevice>> {
        self.record(Call::OpenCamera(id));
        if self.knobs.lock().unavailable.contains(&id) {
            return Err(RecordingError::CameraUnavailable(format!("{id} camera not found")));
        }
        Ok(Box::new(FakeCamera {
            id,
            backend: self.clone(),
        }))
    }

    fn configure_encoder(
        &self,
        _camera: &mut dyn CameraDevice,
        config: &EncoderConfig,
    ) -> RecordingResult<Box<dyn EncoderPipeline>> {
        self.record(Call::ConfigureEncoder);
        if self.knobs.lock().reject_config {
            return Err(RecordingError::ConfigurationRejected(format!(
                "profile {} not supported",
                config.profile
            )));
        }
        Ok(Box::new(FakeEncoder {
            output_path: config.output_path.clone(),
            backend: self.clone(),
        }))
    }

    fn open_decoder(&self, _path: &Path) -> RecordingResult<Box<dyn FrameDecoder>> {
        if self.knobs.lock().decoder_unavailable {
            return Err(RecordingError::Encoding("no decoder".to_string()));
        }
        self.record(Call::OpenDecoder);
        Ok(Box::new(FakeDecoder {
            backend: self.clone(),
        }))
    }
}

struct FakeCamera {
    id: CameraId,
    backend: FakeBackend,
}

impl CameraDevice for FakeCamera {
    fn id(&self) -> CameraId {
        self.id
    }

    fn device_name(&self) -> &str {
        match self.id {
            CameraId::Back => "fake0",
            CameraId::Front => "fake1",
        }
    }

    fn start_preview(&mut self, surface: &dyn PreviewSurface) -> RecordingResult<()> {
        if !surface.is_ready() {
            return Err(RecordingError::PreviewSurfaceUnusable(surface.label().to_string()));
        }
        self.backend.record(Call::StartPreview(self.id));
        Ok(())
    }

    fn stop_preview(&mut self) {
        self.backend.record(Call::StopPreview(self.id));
    }

    fn unlock(&mut self) -> RecordingResult<()> {
        self.backend.record(Call::UnlockCamera);
        Ok(())
    }

    fn lock(&mut self) -> RecordingResult<()> {
        self.backend.record(Call::LockCamera);
        Ok(())
    }

    fn release(&mut self) {
        self.backend.record(Call::ReleaseCamera(self.id));
    }
}

struct FakeEncoder {
    output_path: PathBuf,
    backend: FakeBackend,
}

impl EncoderPipeline for FakeEncoder {
    fn start(&mut self) -> RecordingResult<()> {
        self.backend.record(Call::StartEncoder);
        if self.backend.knobs.lock().fail_encoder_start {
            return Err(RecordingError::Encoding("encoder refused to start".to_string()));
        }
        Ok(())
    }

    fn pause(&mut self) -> RecordingResult<()> {
        self.backend.record(Call::PauseEncoder);
        Ok(())
    }

    fn resume(&mut self) -> RecordingResult<()> {
        self.backend.record(Call::ResumeEncoder);
        Ok(())
    }

    fn finish(&mut self) -> RecordingResult<()> {
        self.backend.record(Call::FinishEncoder);
        if self.backend.knobs.lock().fail_finish {
            return Err(RecordingError::Encoding("muxer failed".to_string()));
        }
        std::fs::write(&self.output_path, b"fake media")?;
        Ok(())
    }

    fn release(&mut self) {
        self.backend.record(Call::ReleaseEncoder);
    }
}

struct FakeDecoder {
    backend: FakeBackend,
}

impl FrameDecoder for FakeDecoder {
    fn duration_ms(&self) -> u64 {
        self.backend.knobs.lock().duration_ms
    }

    fn frame_at(&mut self, timestamp_ms: u64) -> RecordingResult<VideoFrame> {
        self.backend.record(Call::DecodeFrame(timestamp_ms));
        if self.backend.knobs.lock().failing_frames.contains(&timestamp_ms) {
            return Err(RecordingError::Encoding(format!("no frame at {timestamp_ms}ms")));
        }
        Ok(VideoFrame {
            width: 2,
            height: 2,
            data: vec![128; 16],
        })
    }

    fn release(&mut self) {
        self.backend.record(Call::ReleaseDecoder);
    }
}

/// Preview surface whose readiness can be flipped
pub struct FakeSurface {
    ready: AtomicBool,
}

impl FakeSurface {
    pub fn ready() -> Self {
        Self {
            ready: AtomicBool::new(true),
        }
    }

    pub fn not_ready() -> Self {
        Self {
            ready: AtomicBool::new(false),
        }
    }

    pub fn set_ready(&self, ready: bool) {
        self.ready.store(ready, Ordering::SeqCst);
    }
}

impl PreviewSurface for FakeSurface {
    fn label(&self) -> &str {
        "test-surface"
    }

    fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }
}
