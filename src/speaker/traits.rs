//! Capability contract every controllable audio output implements

use thiserror::Error;

use super::types::{SpeakerSettings, SpeakerType};

/// Failure reported by a single speaker call
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DeviceError {
    #[error("device unavailable: {0}")]
    Unavailable(String),

    #[error("device rejected value: {0}")]
    Rejected(String),
}

/// A single controllable audio sink.
///
/// Calls are synchronous and each may fail on its own; a speaker gives no
/// guarantees about any other speaker. The manager only ever holds shared
/// references, so implementations use interior mutability.
#[cfg_attr(test, mockall::automock)]
pub trait Speaker: Send + Sync {
    /// Group this speaker belongs to
    fn speaker_type(&self) -> SpeakerType;

    /// Current volume and mute state as reported by the device
    fn settings(&self) -> Result<SpeakerSettings, DeviceError>;

    /// Set the absolute volume, already clamped to the valid range
    fn set_volume(&self, volume: u8) -> Result<(), DeviceError>;

    fn set_mute(&self, mute: bool) -> Result<(), DeviceError>;
}
