//! Tauri command handlers
//!
//! IPC commands the demo webview calls through Tauri's invoke system.

pub mod recording;
