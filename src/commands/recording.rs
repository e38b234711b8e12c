//! Recording-related Tauri commands
//!
//! Mirrors the recorder API for the webview: enumeration of cameras, profiles
//! and formats, plus the lifecycle of the single active recording session.
//! Session operations block on native calls, so each one runs on the
//! blocking pool while the session mutex keeps them serialized.

use crate::capture::ffmpeg::{BackendConfig, FfmpegBackend};
use crate::capture::surface::SurfaceHandle;
use crate::capture::traits::{BackendCapabilities, CameraInfo, MediaBackend, OutputOption};
use crate::recorder::error::RecordingResult;
use crate::recorder::relay::EventRelay;
use crate::recorder::session::RecordingSession;
use crate::recorder::state::{RecordingOptions, RecordingState, RecordingSummary};
use crate::utils::error::{AppError, ErrorResponse};
use parking_lot::{Mutex, RwLock};
use std::path::PathBuf;
use std::sync::Arc;
use tauri::{AppHandle, Emitter, State};

/// Event name session events are forwarded under
pub const RECORDING_EVENT: &str = "recording-event";

/// Application state for recording
pub struct RecorderState {
    pub backend: Arc<dyn MediaBackend>,
    pub surface: Arc<SurfaceHandle>,
    pub session: Arc<Mutex<Option<RecordingSession>>>,
    /// State of the active session, readable while an operation holds the session
    pub session_state: Arc<Mutex<Option<Arc<RwLock<RecordingState>>>>>,
    /// Forwards the active session's events to the webview
    pub relay: Mutex<Option<EventRelay>>,
}

impl RecorderState {
    pub fn new(backend: Arc<dyn MediaBackend>) -> Self {
        Self {
            backend,
            surface: Arc::new(SurfaceHandle::new("preview")),
            session: Arc::new(Mutex::new(None)),
            session_state: Arc::new(Mutex::new(None)),
            relay: Mutex::new(None),
        }
    }
}

impl Default for RecorderState {
    fn default() -> Self {
        Self::new(Arc::new(FfmpegBackend::new(BackendConfig::from_env())))
    }
}

/// Run a session operation on the blocking pool
async fn with_session<T, F>(state: &RecorderState, op: F) -> Result<T, ErrorResponse>
where
    T: Send + 'static,
    F: FnOnce(&mut RecordingSession) -> RecordingResult<T> + Send + 'static,
{
    let session = Arc::clone(&state.session);
    tokio::task::spawn_blocking(move || {
        let mut guard = session.lock();
        let session = guard.as_mut().ok_or(AppError::NoSession)?;
        op(session).map_err(AppError::from)
    })
    .await
    .map_err(|e| AppError::Task(e.to_string()))?
    .map_err(ErrorResponse::from)
}

/// Get list of available cameras
#[tauri::command]
pub async fn get_cameras(state: State<'_, RecorderState>) -> Result<Vec<CameraInfo>, ErrorResponse> {
    Ok(state.backend.cameras())
}

/// Get quality profiles. Pass `value` back when creating a recording.
#[tauri::command]
pub async fn get_output_profiles(
    state: State<'_, RecorderState>,
) -> Result<Vec<OutputOption>, ErrorResponse> {
    Ok(state.backend.output_profiles())
}

/// Get container formats. Empty when the backend picks the container itself.
#[tauri::command]
pub async fn get_output_formats(
    state: State<'_, RecorderState>,
) -> Result<Vec<OutputOption>, ErrorResponse> {
    Ok(state.backend.output_formats())
}

/// Get backend capability flags (pause support etc.)
#[tauri::command]
pub async fn get_capabilities(
    state: State<'_, RecorderState>,
) -> Result<BackendCapabilities, ErrorResponse> {
    Ok(state.backend.capabilities())
}

/// Called by the preview view once it is laid out (or torn down)
#[tauri::command]
pub async fn surface_available(
    state: State<'_, RecorderState>,
    ready: bool,
) -> Result<(), ErrorResponse> {
    tracing::debug!("Preview surface ready: {}", ready);
    state.surface.set_ready(ready);
    Ok(())
}

/// Create a recording session and start its preview
///
/// Any previous session is released first, without its events reaching the
/// webview. Returns the session id.
#[tauri::command]
pub async fn create_recording(
    app: AppHandle,
    state: State<'_, RecorderState>,
    options: RecordingOptions,
) -> Result<String, ErrorResponse> {
    let backend = Arc::clone(&state.backend);
    let surface = Arc::clone(&state.surface);
    let slot = Arc::clone(&state.session);
    let state_slot = Arc::clone(&state.session_state);

    let previous_relay = state.relay.lock().take();
    if let Some(mut relay) = previous_relay {
        relay.stop();
    }

    let (id, events) = tokio::task::spawn_blocking(move || {
        let mut guard = slot.lock();
        if let Some(mut previous) = guard.take() {
            tracing::info!("Releasing previous session {}", previous.id());
            previous.release();
        }
        *state_slot.lock() = None;

        let session = RecordingSession::create(backend, surface, options)?;
        let id = session.id();
        let events = session.subscribe();
        *state_slot.lock() = Some(session.state_handle());
        *guard = Some(session);
        Ok::<_, AppError>((id, events))
    })
    .await
    .map_err(|e| AppError::Task(e.to_string()))?
    .map_err(ErrorResponse::from)?;

    let relay = EventRelay::spawn(events, move |event| {
        if let Err(e) = app.emit(RECORDING_EVENT, event) {
            tracing::warn!("Failed to emit recording event: {}", e);
        }
    });
    *state.relay.lock() = Some(relay);

    Ok(id.to_string())
}

/// Start recording
#[tauri::command]
pub async fn start_recording(state: State<'_, RecorderState>) -> Result<(), ErrorResponse> {
    with_session(&state, |session| session.start()).await
}

/// Stop recording
#[tauri::command]
pub async fn stop_recording(
    state: State<'_, RecorderState>,
) -> Result<RecordingSummary, ErrorResponse> {
    with_session(&state, |session| session.stop()).await
}

/// Pause recording
#[tauri::command]
pub async fn pause_recording(state: State<'_, RecorderState>) -> Result<(), ErrorResponse> {
    with_session(&state, |session| session.pause()).await
}

/// Resume recording
#[tauri::command]
pub async fn resume_recording(state: State<'_, RecorderState>) -> Result<(), ErrorResponse> {
    with_session(&state, |session| session.resume()).await
}

/// Switch between back and front camera
#[tauri::command]
pub async fn switch_camera(state: State<'_, RecorderState>) -> Result<(), ErrorResponse> {
    with_session(&state, |session| session.switch_camera()).await
}

/// Release the active session, if any
#[tauri::command]
pub async fn release_recording(state: State<'_, RecorderState>) -> Result<(), ErrorResponse> {
    let slot = Arc::clone(&state.session);
    let state_slot = Arc::clone(&state.session_state);
    tokio::task::spawn_blocking(move || {
        if let Some(mut session) = slot.lock().take() {
            session.release();
        }
        *state_slot.lock() = None;
    })
    .await
    .map_err(|e| ErrorResponse::from(AppError::Task(e.to_string())))
}

/// Get current recording state
#[tauri::command]
pub async fn get_recording_state(
    state: State<'_, RecorderState>,
) -> Result<RecordingState, ErrorResponse> {
    Ok(state
        .session_state
        .lock()
        .as_ref()
        .map(|s| *s.read())
        .unwrap_or_default())
}

/// Get thumbnails of the last stopped recording
#[tauri::command]
pub async fn get_thumbnails(state: State<'_, RecorderState>) -> Result<Vec<PathBuf>, ErrorResponse> {
    with_session(&state, |session| Ok(session.thumbnails().to_vec())).await
}
