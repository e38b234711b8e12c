//! Preview surfaces provided by the UI layer

use crate::capture::traits::PreviewSurface;
use std::sync::atomic::{AtomicBool, Ordering};

/// A surface the frontend reports as available once its view is laid out
#[derive(Debug)]
pub struct SurfaceHandle {
    label: String,
    ready: AtomicBool,
}

impl SurfaceHandle {
    /// New surface, not ready until the frontend says so
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            ready: AtomicBool::new(false),
        }
    }

    pub fn set_ready(&self, ready: bool) {
        self.ready.store(ready, Ordering::SeqCst);
    }
}

impl PreviewSurface for SurfaceHandle {
    fn label(&self) -> &str {
        &self.label
    }

    fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }
}
