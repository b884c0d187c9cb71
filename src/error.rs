use thiserror::Error;

use crate::speaker::{DeviceError, SpeakerType};

/// Main error type for the speaker manager
#[derive(Error, Debug)]
pub enum SpeakerError {
    // Group-level errors
    #[error("No speakers registered for group {0}")]
    EmptyGroup(SpeakerType),

    #[error("Speaker {index} in group {group} failed to {operation}: {source}")]
    DeviceCall {
        group: SpeakerType,
        index: usize,
        operation: &'static str,
        #[source]
        source: DeviceError,
    },

    #[error("Speakers in group {0} report inconsistent settings")]
    InconsistentGroup(SpeakerType),

    // Inbound directive errors (adapter only, never raised by the engine)
    #[error("Malformed directive: {0}")]
    MalformedInput(String),

    // Executor lifecycle errors
    #[error("Speaker manager is shut down")]
    ShutDown,

    #[error("Speaker manager worker exited before replying")]
    WorkerGone,

    // Collaborator errors
    #[error("Context store error: {0}")]
    ContextStore(String),

    #[error("Event channel error: {0}")]
    EventChannel(String),

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Validation failed: {0}")]
    Validation(String),

    // Serialization errors
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    // Generic errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl SpeakerError {
    /// True for the failures that describe group state rather than plumbing.
    pub fn is_group_failure(&self) -> bool {
        matches!(
            self,
            SpeakerError::EmptyGroup(_)
                | SpeakerError::DeviceCall { .. }
                | SpeakerError::InconsistentGroup(_)
        )
    }
}

/// Result type alias for SpeakerError
pub type Result<T> = std::result::Result<T, SpeakerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_call_message_names_speaker() {
        let err = SpeakerError::DeviceCall {
            group: SpeakerType::Speaker,
            index: 1,
            operation: "set volume",
            source: DeviceError::Unavailable("usb unplugged".into()),
        };
        let msg = err.to_string();
        assert!(msg.contains("Speaker 1"), "got: {msg}");
        assert!(msg.contains("SPEAKER"), "got: {msg}");
        assert!(msg.contains("usb unplugged"), "got: {msg}");
        assert!(err.is_group_failure());
    }

    #[test]
    fn test_lifecycle_errors_are_not_group_failures() {
        assert!(!SpeakerError::ShutDown.is_group_failure());
        assert!(!SpeakerError::MalformedInput("x".into()).is_group_failure());
    }
}
