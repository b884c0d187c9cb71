//! Outbound settings-changed events

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::error::{Result, SpeakerError};
use crate::speaker::{Source, SpeakerSettings, SpeakerType};

/// Name of an outbound event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SpeakerEventName {
    VolumeChanged,
    MuteChanged,
}

impl SpeakerEventName {
    pub fn as_str(&self) -> &'static str {
        match self {
            SpeakerEventName::VolumeChanged => "VolumeChanged",
            SpeakerEventName::MuteChanged => "MuteChanged",
        }
    }
}

impl std::fmt::Display for SpeakerEventName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Event describing a settings change that is visible outside the device
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeakerEvent {
    pub name: SpeakerEventName,
    pub speaker_type: SpeakerType,
    pub source: Source,
    pub settings: SpeakerSettings,
    pub timestamp: DateTime<Utc>,
}

impl SpeakerEvent {
    pub fn new(
        name: SpeakerEventName,
        speaker_type: SpeakerType,
        source: Source,
        settings: SpeakerSettings,
    ) -> Self {
        Self {
            name,
            speaker_type,
            source,
            settings,
            timestamp: Utc::now(),
        }
    }

    /// Wire payload; identical for both event names
    pub fn payload(&self) -> serde_json::Value {
        serde_json::json!({
            "volume": self.settings.volume,
            "muted": self.settings.mute,
        })
    }
}

/// Outbound event channel
#[async_trait]
pub trait EventSender: Send + Sync {
    async fn emit(&self, event: SpeakerEvent) -> Result<()>;
}

/// Event sender forwarding to a tokio channel
#[derive(Debug, Clone)]
pub struct ChannelEventSender {
    tx: mpsc::UnboundedSender<SpeakerEvent>,
}

impl ChannelEventSender {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<SpeakerEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

#[async_trait]
impl EventSender for ChannelEventSender {
    async fn emit(&self, event: SpeakerEvent) -> Result<()> {
        self.tx
            .send(event)
            .map_err(|_| SpeakerError::EventChannel("event receiver dropped".into()))
    }
}
