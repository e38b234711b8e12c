//! Recording system module
//!
//! This module implements the recording session:
//! - RecordingSession state machine over one camera and one encoder
//! - Scoped handles that release backend resources in order
//! - Best-effort thumbnail extraction after a recording stops
//! - Event relay to observers outside the session's owner

pub mod error;
pub mod handles;
pub mod relay;
pub mod session;
pub mod state;
pub mod thumbnail;

#[cfg(test)]
pub(crate) mod testing;

pub use error::{RecordingError, RecordingResult};
pub use relay::EventRelay;
pub use session::{RecordingEvent, RecordingSession};
pub use state::{RecordingOptions, RecordingState, RecordingSummary};
