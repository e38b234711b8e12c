//! Recording session
//!
//! Owns one camera and, while recording, one encoder pipeline. Drives the
//! recording state machine and enforces the release order: encoder first,
//! then camera.

use super::error::{RecordingError, RecordingResult};
use super::handles::{CameraHandle, EncoderHandle};
use super::state::{RecordingOptions, RecordingState, RecordingSummary};
use super::thumbnail::extract_thumbnails;
use crate::capture::traits::{
    BackendCapabilities, CameraId, EncoderConfig, MediaBackend, PreviewSurface,
};
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::broadcast;
use uuid::Uuid;

/// Events emitted by a session
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "camelCase")]
pub enum RecordingEvent {
    /// Encoder started writing
    Started,
    /// Encoder finalized
    Stopped,
    Paused,
    Resumed,
    /// Preview moved to another camera
    CameraSwitched(CameraId),
    /// Thumbnail extraction finished with these files
    ThumbnailsReady(Vec<PathBuf>),
    /// All resources released
    Released,
    /// A failure reported to the caller
    Error(String),
}

/// One camera preview plus an optional active recording
pub struct RecordingSession {
    /// Identifier used in logs and events
    id: Uuid,

    backend: Arc<dyn MediaBackend>,

    /// Display target the preview is bound to
    surface: Arc<dyn PreviewSurface>,

    capabilities: BackendCapabilities,

    camera_id: CameraId,

    /// Held from construction until release
    camera: Option<CameraHandle>,

    /// Held only while recording or paused
    encoder: Option<EncoderHandle>,

    output_path: PathBuf,
    profile: String,
    output_format: Option<String>,
    thumbnail_count: u32,
    thumbnails: Vec<PathBuf>,

    /// Shared so observers can read it while an operation is in flight
    state: Arc<RwLock<RecordingState>>,

    started_at: Option<DateTime<Utc>>,
    released: bool,
    event_tx: broadcast::Sender<RecordingEvent>,
}

impl RecordingSession {
    /// Acquire the camera and start previewing on `surface`
    ///
    /// Nothing stays acquired when this fails.
    pub fn create(
        backend: Arc<dyn MediaBackend>,
        surface: Arc<dyn PreviewSurface>,
        options: RecordingOptions,
    ) -> RecordingResult<Self> {
        let id = Uuid::new_v4();
        let capabilities = backend.capabilities();

        if options.output_format.is_some() && !capabilities.supports_output_formats {
            tracing::debug!("Backend ignores the requested output format");
        }

        let camera = Self::open_with_preview(backend.as_ref(), surface.as_ref(), options.camera_id)
            .map_err(|e| {
                tracing::error!("Failed to create recording session: {}", e);
                e
            })?;

        tracing::info!(
            "Created recording session {} on {} camera -> {:?}",
            id,
            options.camera_id,
            options.output_path
        );

        let (event_tx, _) = broadcast::channel(32);
        Ok(Self {
            id,
            backend,
            surface,
            capabilities,
            camera_id: options.camera_id,
            camera: Some(camera),
            encoder: None,
            output_path: options.output_path,
            profile: options.profile,
            output_format: options.output_format,
            thumbnail_count: options.thumbnail_count,
            thumbnails: Vec::new(),
            state: Arc::new(RwLock::new(RecordingState::NotRecording)),
            started_at: None,
            released: false,
            event_tx,
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Get the current recording state
    pub fn state(&self) -> RecordingState {
        *self.state.read()
    }

    /// Shared view of the state for readers outside the session's owner
    pub fn state_handle(&self) -> Arc<RwLock<RecordingState>> {
        Arc::clone(&self.state)
    }

    pub fn camera_id(&self) -> CameraId {
        self.camera_id
    }

    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    pub fn profile(&self) -> &str {
        &self.profile
    }

    pub fn output_format(&self) -> Option<&str> {
        self.output_format.as_deref()
    }

    pub fn thumbnail_count(&self) -> u32 {
        self.thumbnail_count
    }

    /// Thumbnails from the last successful stop
    pub fn thumbnails(&self) -> &[PathBuf] {
        &self.thumbnails
    }

    pub fn capabilities(&self) -> BackendCapabilities {
        self.capabilities
    }

    pub fn is_released(&self) -> bool {
        self.released
    }

    /// Subscribe to session events
    pub fn subscribe(&self) -> broadcast::Receiver<RecordingEvent> {
        self.event_tx.subscribe()
    }

    /// Start recording
    ///
    /// Rejected with `AlreadyRecording` while recording or paused. On
    /// failure the camera goes back to preview and the state is unchanged.
    pub fn start(&mut self) -> RecordingResult<()> {
        self.ensure_live()?;
        if self.state().is_active() {
            return Err(RecordingError::AlreadyRecording);
        }

        let camera = self
            .camera
            .as_mut()
            .filter(|camera| camera.is_previewing())
            .ok_or_else(|| {
                RecordingError::CameraUnavailable("camera preview is not active".to_string())
            })?;

        tracing::info!("Starting recording to {:?}", self.output_path);

        camera.unlock()?;

        let config = EncoderConfig {
            output_path: self.output_path.clone(),
            profile: self.profile.clone(),
            container_format: self.output_format.clone(),
        };
        let configured = match camera.device_mut() {
            Some(device) => self.backend.configure_encoder(device, &config),
            None => Err(RecordingError::CameraUnavailable(
                "camera already released".to_string(),
            )),
        };

        let mut encoder = match configured {
            Ok(pipeline) => EncoderHandle::new(pipeline),
            Err(e) => {
                tracing::error!("Encoder configuration failed: {}", e);
                relock(camera);
                self.emit(RecordingEvent::Error(e.to_string()));
                return Err(e);
            }
        };

        if let Err(e) = encoder.start() {
            tracing::error!("Encoder failed to start: {}", e);
            encoder.release();
            relock(camera);
            self.emit(RecordingEvent::Error(e.to_string()));
            return Err(e);
        }

        self.encoder = Some(encoder);
        self.started_at = Some(Utc::now());
        self.set_state(RecordingState::Recording);
        self.emit(RecordingEvent::Started);

        tracing::info!("Recording started");
        Ok(())
    }

    /// Stop recording
    ///
    /// A no-op returning an empty summary when nothing is recording. The
    /// transition always completes; a finalization failure is reported after
    /// the encoder is released and preview restored.
    pub fn stop(&mut self) -> RecordingResult<RecordingSummary> {
        let Some(mut encoder) = self.encoder.take() else {
            tracing::debug!("Stop requested with no active encoder");
            return Ok(RecordingSummary::default());
        };

        tracing::info!("Stopping recording");

        let finished = encoder.finish();
        drop(encoder);

        if let Some(camera) = self.camera.as_mut() {
            relock(camera);
        }

        let stopped_at = Utc::now();
        let started_at = self.started_at.take();
        self.set_state(RecordingState::NotRecording);
        self.emit(RecordingEvent::Stopped);

        if let Err(e) = finished {
            tracing::error!("Failed to finalize {:?}: {}", self.output_path, e);
            self.emit(RecordingEvent::Error(e.to_string()));
            self.release_shared_pipeline();
            return Err(e);
        }

        let mut summary = RecordingSummary::new(self.output_path.clone(), started_at, stopped_at);

        if self.thumbnail_count > 0 {
            self.thumbnails =
                extract_thumbnails(self.backend.as_ref(), &self.output_path, self.thumbnail_count);
            summary.thumbnails = self.thumbnails.clone();
            self.emit(RecordingEvent::ThumbnailsReady(self.thumbnails.clone()));
        }

        tracing::info!("Recording stopped. Duration: {}ms", summary.duration_ms);
        self.release_shared_pipeline();
        Ok(summary)
    }

    /// Pause recording
    ///
    /// Logged no-op when the backend cannot pause.
    pub fn pause(&mut self) -> RecordingResult<()> {
        self.ensure_live()?;
        if !self.capabilities.supports_pause {
            tracing::info!("Pause not supported by this backend");
            return Ok(());
        }

        match self.state() {
            RecordingState::Paused => Ok(()),
            RecordingState::NotRecording => Err(RecordingError::NotRecording),
            RecordingState::Recording => {
                if let Some(encoder) = self.encoder.as_mut() {
                    encoder.pause()?;
                }
                self.set_state(RecordingState::Paused);
                self.emit(RecordingEvent::Paused);
                Ok(())
            }
        }
    }

    /// Resume a paused recording
    ///
    /// Logged no-op when the backend cannot pause.
    pub fn resume(&mut self) -> RecordingResult<()> {
        self.ensure_live()?;
        if !self.capabilities.supports_pause {
            tracing::info!("Resume not supported by this backend");
            return Ok(());
        }

        match self.state() {
            RecordingState::Recording => Ok(()),
            RecordingState::NotRecording => Err(RecordingError::NotRecording),
            RecordingState::Paused => {
                if let Some(encoder) = self.encoder.as_mut() {
                    encoder.resume()?;
                }
                self.set_state(RecordingState::Recording);
                self.emit(RecordingEvent::Resumed);
                Ok(())
            }
        }
    }

    /// Move the preview to the other camera
    ///
    /// The current camera is released before the other one is opened. If the
    /// other camera cannot be used, the previous one is reopened so preview
    /// survives, and the failure is returned.
    pub fn switch_camera(&mut self) -> RecordingResult<()> {
        self.ensure_live()?;
        if self.state().is_active() {
            return Err(RecordingError::AlreadyRecording);
        }

        let previous = self.camera_id;
        let next = previous.other();

        if let Some(mut camera) = self.camera.take() {
            camera.release();
        }

        match Self::open_with_preview(self.backend.as_ref(), self.surface.as_ref(), next) {
            Ok(camera) => {
                self.camera = Some(camera);
                self.camera_id = next;
                self.emit(RecordingEvent::CameraSwitched(next));
                tracing::info!("Switched from {} to {} camera", previous, next);
                Ok(())
            }
            Err(e) => {
                tracing::warn!("Cannot switch to {} camera: {}", next, e);
                match Self::open_with_preview(self.backend.as_ref(), self.surface.as_ref(), previous)
                {
                    Ok(camera) => self.camera = Some(camera),
                    Err(restore) => {
                        tracing::error!("Failed to reopen {} camera: {}", previous, restore)
                    }
                }
                self.emit(RecordingEvent::Error(e.to_string()));
                Err(e)
            }
        }
    }

    /// Release all resources: encoder first, then camera
    ///
    /// Safe to call any number of times.
    pub fn release(&mut self) {
        if let Some(mut encoder) = self.encoder.take() {
            if let Err(e) = encoder.finish() {
                tracing::warn!("Encoder did not finalize cleanly on release: {}", e);
            }
        }

        if let Some(mut camera) = self.camera.take() {
            camera.release();
        }

        if self.released {
            return;
        }

        self.released = true;
        self.started_at = None;
        self.set_state(RecordingState::NotRecording);
        self.emit(RecordingEvent::Released);
        tracing::info!("Released recording session {}", self.id);
    }

    /// Preview and recording share one pipeline on some backends, so the
    /// session ends with the recording
    fn release_shared_pipeline(&mut self) {
        if self.capabilities.shared_pipeline {
            self.release();
        }
    }

    fn open_with_preview(
        backend: &dyn MediaBackend,
        surface: &dyn PreviewSurface,
        id: CameraId,
    ) -> RecordingResult<CameraHandle> {
        let mut camera = CameraHandle::new(backend.open_camera(id)?);
        if let Err(e) = camera.start_preview(surface) {
            camera.release();
            return Err(e);
        }
        Ok(camera)
    }

    fn ensure_live(&self) -> RecordingResult<()> {
        if self.released {
            return Err(RecordingError::Released);
        }
        Ok(())
    }

    fn set_state(&self, state: RecordingState) {
        let mut current = self.state.write();
        if *current != state {
            tracing::debug!("Session {}: {:?} -> {:?}", self.id, *current, state);
            *current = state;
        }
    }

    fn emit(&self, event: RecordingEvent) {
        let _ = self.event_tx.send(event);
    }
}

impl Drop for RecordingSession {
    fn drop(&mut self) {
        self.release();
    }
}

fn relock(camera: &mut CameraHandle) {
    if let Err(e) = camera.lock() {
        tracing::warn!("Failed to take the camera back for preview: {}", e);
    }
}
