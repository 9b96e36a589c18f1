//! Configuration for chat sessions.

use std::time::Duration;

/// Static configuration shared by every session a [`ChatClient`](crate::ChatClient) runs.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Fail a stream that goes silent for this long. `None` waits forever.
    pub idle_timeout: Option<Duration>,

    /// Text that replaces the assistant entry when a stream fails.
    pub failure_message: String,

    /// Suffix appended to the message id for the user entry.
    pub question_suffix: String,

    /// Suffix appended to the message id for the assistant entry.
    pub answer_suffix: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            idle_timeout: Some(Duration::from_secs(60)),
            failure_message: "Sorry, something went wrong while generating a response.".into(),
            question_suffix: "-question".into(),
            answer_suffix: "-answer".into(),
        }
    }
}
