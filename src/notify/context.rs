//! Context store seam: best-effort mirror of the current group settings

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tokio::sync::RwLock;
use tracing::debug;

use crate::error::{Result, SpeakerError};
use crate::speaker::{SpeakerSettings, SpeakerType};

/// Snapshot published to the context store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VolumeState {
    pub volume: u8,
    pub muted: bool,
}

impl From<SpeakerSettings> for VolumeState {
    fn from(settings: SpeakerSettings) -> Self {
        Self {
            volume: settings.volume,
            muted: settings.mute,
        }
    }
}

impl From<VolumeState> for SpeakerSettings {
    fn from(state: VolumeState) -> Self {
        SpeakerSettings::new(state.volume, state.muted)
    }
}

/// Receives serialized settings snapshots.
///
/// A failed publish is reported but never undoes the device change; the
/// speakers remain the source of truth.
#[async_trait]
pub trait ContextStore: Send + Sync {
    async fn publish(&self, speaker_type: SpeakerType, state: &VolumeState) -> Result<()>;
}

/// Context store keeping the latest JSON snapshot per group
#[derive(Debug, Default)]
pub struct InMemoryContextStore {
    states: RwLock<HashMap<SpeakerType, String>>,
    publications: AtomicU64,
    failing: AtomicBool,
}

impl InMemoryContextStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Latest snapshot for a group, decoded from its stored JSON
    pub async fn get(&self, speaker_type: SpeakerType) -> Result<Option<VolumeState>> {
        let states = self.states.read().await;
        match states.get(&speaker_type) {
            Some(raw) => Ok(Some(serde_json::from_str(raw)?)),
            None => Ok(None),
        }
    }

    /// Raw JSON as it was published
    pub async fn raw(&self, speaker_type: SpeakerType) -> Option<String> {
        self.states.read().await.get(&speaker_type).cloned()
    }

    /// Number of successful publications
    pub fn publications(&self) -> u64 {
        self.publications.load(Ordering::SeqCst)
    }

    /// Make every later publish fail until switched back
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

#[async_trait]
impl ContextStore for InMemoryContextStore {
    async fn publish(&self, speaker_type: SpeakerType, state: &VolumeState) -> Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(SpeakerError::ContextStore(format!(
                "store rejected state for {}",
                speaker_type
            )));
        }

        let raw = serde_json::to_string(state)?;
        debug!(group = %speaker_type, state = %raw, "context state stored");
        self.states.write().await.insert(speaker_type, raw);
        self.publications.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
