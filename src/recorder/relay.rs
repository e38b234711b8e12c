//! Forwarding of session events to an outside sink

use super::session::RecordingEvent;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;

/// Background task passing session events to a sink until the session is
/// released or the relay is stopped
///
/// Once `stop` returns the sink sees no further events, so a session released
/// afterwards stays silent.
pub struct EventRelay {
    stopped: Arc<AtomicBool>,
    task: Option<JoinHandle<()>>,
}

impl EventRelay {
    /// Spawn on the current tokio runtime
    pub fn spawn<F>(mut events: broadcast::Receiver<RecordingEvent>, mut sink: F) -> Self
    where
        F: FnMut(&RecordingEvent) + Send + 'static,
    {
        let stopped = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&stopped);

        let task = tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(event) => {
                        if flag.load(Ordering::SeqCst) {
                            break;
                        }
                        sink(&event);
                        if event == RecordingEvent::Released {
                            break;
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!("Dropped {} recording events", skipped);
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        });

        Self {
            stopped,
            task: Some(task),
        }
    }

    pub fn stop(&mut self) {
        self.stopped.store(true, Ordering::SeqCst);
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl Drop for EventRelay {
    fn drop(&mut self) {
        self.stop();
    }
}
