//! Speakers - controllable audio output endpoints
//!
//! Types shared across the crate plus the capability contract a device
//! driver implements to be managed.

mod simulated;
mod traits;
mod types;

pub use simulated::SimulatedSpeaker;
pub use traits::{DeviceError, Speaker};
pub use types::{
    adjusted_volume, clamp_volume, Source, SpeakerSettings, SpeakerType, ADJUST_VOLUME_MAX,
    ADJUST_VOLUME_MIN, VOLUME_MAX, VOLUME_MIN,
};

#[cfg(test)]
pub use traits::MockSpeaker;
