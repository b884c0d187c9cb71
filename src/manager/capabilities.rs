//! Static description of the commands the speaker manager handles

use serde::Serialize;
use std::sync::OnceLock;

use crate::notify::SpeakerEventName;

pub const SPEAKER_INTERFACE_NAME: &str = "Speaker";
pub const SPEAKER_INTERFACE_VERSION: &str = "1.0";

/// Capability advertisement consumed by the directive adapter at discovery time
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CapabilityConfiguration {
    pub interface_name: &'static str,
    pub interface_version: &'static str,
    pub directives: Vec<&'static str>,
    pub events: Vec<&'static str>,
}

impl CapabilityConfiguration {
    pub fn supports_directive(&self, name: &str) -> bool {
        self.directives.iter().any(|d| *d == name)
    }
}

/// Built once on first use
pub fn capabilities() -> &'static CapabilityConfiguration {
    static CAPABILITIES: OnceLock<CapabilityConfiguration> = OnceLock::new();
    CAPABILITIES.get_or_init(|| CapabilityConfiguration {
        interface_name: SPEAKER_INTERFACE_NAME,
        interface_version: SPEAKER_INTERFACE_VERSION,
        directives: vec!["SetVolume", "AdjustVolume", "SetMute"],
        events: vec![
            SpeakerEventName::VolumeChanged.as_str(),
            SpeakerEventName::MuteChanged.as_str(),
        ],
    })
}
