//! Video Recorder - camera preview and recording sessions.
//!
//! The core library drives a single recording session against a pluggable
//! media backend: camera preview, encoding to a file, pause/resume, camera
//! switching and thumbnail extraction after stop. The `app` feature adds the
//! Tauri desktop shell that exposes the session to the demo UI.

pub mod capture;
#[cfg(feature = "app")]
pub mod commands;
pub mod recorder;
pub mod utils;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Default filter when `RUST_LOG` is not set
const DEFAULT_LOG_FILTER: &str = "video_recorder_lib=debug,tauri=info";

/// Initialize tracing/logging. Safe to call more than once.
pub fn init_tracing() {
    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}

/// Initialize the application
#[cfg(feature = "app")]
#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    use commands::recording::RecorderState;

    init_tracing();

    tracing::info!("Starting Video Recorder v{}", env!("CARGO_PKG_VERSION"));

    let result = tauri::Builder::default()
        .manage(RecorderState::default())
        .invoke_handler(tauri::generate_handler![
            // Enumeration
            commands::recording::get_cameras,
            commands::recording::get_output_profiles,
            commands::recording::get_output_formats,
            commands::recording::get_capabilities,
            commands::recording::surface_available,
            // Session lifecycle
            commands::recording::create_recording,
            commands::recording::start_recording,
            commands::recording::stop_recording,
            commands::recording::pause_recording,
            commands::recording::resume_recording,
            commands::recording::switch_camera,
            commands::recording::release_recording,
            commands::recording::get_recording_state,
            commands::recording::get_thumbnails,
        ])
        .run(tauri::generate_context!());

    if let Err(e) = result {
        tracing::error!("Error while running tauri application: {}", e);
        std::process::exit(1);
    }
}
