//! Recording listeners and observers for tests.
//!
//! Enable with the `test-utils` feature.

mod recording_listener;
mod recording_observer;

pub use recording_listener::{ListenerEvent, RecordingListener};
pub use recording_observer::RecordingObserver;
