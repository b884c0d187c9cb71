//! Core types shared by speakers, the manager and its observers

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Lowest absolute volume a speaker accepts
pub const VOLUME_MIN: u8 = 0;
/// Highest absolute volume a speaker accepts
pub const VOLUME_MAX: u8 = 100;
/// Most negative delta accepted by an adjust request
pub const ADJUST_VOLUME_MIN: i32 = -100;
/// Most positive delta accepted by an adjust request
pub const ADJUST_VOLUME_MAX: i32 = 100;

/// Clamp a requested absolute volume into `[VOLUME_MIN, VOLUME_MAX]`.
pub fn clamp_volume(volume: i32) -> u8 {
    volume.clamp(VOLUME_MIN as i32, VOLUME_MAX as i32) as u8
}

/// Apply a delta to a current volume, saturating at the bounds.
pub fn adjusted_volume(current: u8, delta: i32) -> u8 {
    let delta = delta.clamp(ADJUST_VOLUME_MIN, ADJUST_VOLUME_MAX);
    clamp_volume((current as i32).saturating_add(delta))
}

/// Group of speakers whose volume and mute state move together
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SpeakerType {
    /// Speaker volume mirrored to the cloud
    Speaker,
    /// Alerts, alarms and timers
    Alerts,
    /// Application-defined group
    Custom(u32),
}

impl SpeakerType {
    /// Only the speaker group is mirrored to the context store and reported
    /// as outbound events; other groups are local.
    pub fn is_cloud_synced(&self) -> bool {
        matches!(self, SpeakerType::Speaker)
    }
}

impl std::fmt::Display for SpeakerType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SpeakerType::Speaker => write!(f, "SPEAKER"),
            SpeakerType::Alerts => write!(f, "ALERTS"),
            SpeakerType::Custom(id) => write!(f, "CUSTOM({})", id),
        }
    }
}

impl FromStr for SpeakerType {
    type Err = &'static str;

    fn from_str(raw: &str) -> std::result::Result<Self, Self::Err> {
        let normalized = raw.trim().to_ascii_lowercase();
        if normalized.is_empty() {
            return Err("speaker type is empty");
        }

        if let Some(custom) = normalized.strip_prefix("custom:") {
            let id = custom
                .trim()
                .parse::<u32>()
                .map_err(|_| "custom speaker type id must be a non-negative integer")?;
            return Ok(SpeakerType::Custom(id));
        }

        match normalized.as_str() {
            "speaker" => Ok(SpeakerType::Speaker),
            "alerts" => Ok(SpeakerType::Alerts),
            _ => Err("invalid speaker type; expected speaker|alerts|custom:<id>"),
        }
    }
}

/// Volume and mute state of one speaker or of a whole group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct SpeakerSettings {
    pub volume: u8,
    pub mute: bool,
}

impl SpeakerSettings {
    pub fn new(volume: u8, mute: bool) -> Self {
        Self { volume, mute }
    }
}

impl std::fmt::Display for SpeakerSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "volume={} {}",
            self.volume,
            if self.mute { "muted" } else { "unmuted" }
        )
    }
}

/// Origin of a settings change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Source {
    /// Change requested by a cloud directive
    Directive,
    /// Change requested through the local API
    LocalApi,
}

impl std::fmt::Display for Source {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Source::Directive => write!(f, "directive"),
            Source::LocalApi => write!(f, "local_api"),
        }
    }
}
