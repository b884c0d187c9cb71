//! Synchronization engine: applies group-wide changes and decides what to announce
//!
//! Every method runs to completion on the manager worker before the next
//! command is taken, so a group's speakers are never written by two commands
//! at once. Failures are reported, never repaired: a partially applied change
//! stays partially applied and the next validation reports it.

use std::sync::Arc;
use tracing::{debug, info, warn};

use super::config::EngineConfig;
use super::registry::SpeakerRegistry;
use super::validator::validate_group;
use crate::error::{Result, SpeakerError};
use crate::notify::{NotificationFanout, ObserverId, SpeakerEventName, SpeakerObserver};
use crate::speaker::{
    adjusted_volume, clamp_volume, Source, Speaker, SpeakerSettings, SpeakerType,
};

/// Worker-owned state of the speaker manager
pub struct SyncEngine {
    config: EngineConfig,
    registry: SpeakerRegistry,
    fanout: NotificationFanout,
}

impl SyncEngine {
    pub fn new(config: EngineConfig, registry: SpeakerRegistry, fanout: NotificationFanout) -> Self {
        Self {
            config,
            registry,
            fanout,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn registry(&self) -> &SpeakerRegistry {
        &self.registry
    }

    /// Set every speaker of a group to the same absolute volume
    pub async fn set_volume(
        &mut self,
        speaker_type: SpeakerType,
        volume: i32,
        force_no_notifications: bool,
        source: Source,
    ) -> Result<SpeakerSettings> {
        let target = clamp_volume(volume);
        info!(group = %speaker_type, requested = volume, target, %source, "set volume");

        let settings = self.apply_volume(speaker_type, target)?;
        if !force_no_notifications {
            self.fanout
                .notify(SpeakerEventName::VolumeChanged, source, speaker_type, settings)
                .await;
        }
        Ok(settings)
    }

    /// Move a group's volume by `delta`, saturating at the bounds
    pub async fn adjust_volume(
        &mut self,
        speaker_type: SpeakerType,
        delta: i32,
        force_no_notifications: bool,
        source: Source,
    ) -> Result<SpeakerSettings> {
        let current = self.get_settings(speaker_type)?;
        let target = adjusted_volume(current.volume, delta);
        info!(
            group = %speaker_type,
            delta,
            from = current.volume,
            to = target,
            %source,
            "adjust volume"
        );

        let settings = self.apply_volume(speaker_type, target)?;
        if !force_no_notifications {
            self.fanout
                .notify(SpeakerEventName::VolumeChanged, source, speaker_type, settings)
                .await;
        }
        Ok(settings)
    }

    /// Mute or unmute a group.
    ///
    /// Unmuting a group that sits at volume zero first raises it to the
    /// configured minimum unmute volume. That restoration is silent: only the
    /// final unmuted settings are announced, and only if notifications are
    /// not suppressed.
    pub async fn set_mute(
        &mut self,
        speaker_type: SpeakerType,
        mute: bool,
        force_no_notifications: bool,
        source: Source,
    ) -> Result<SpeakerSettings> {
        info!(group = %speaker_type, mute, %source, "set mute");

        if !mute {
            let current = self.get_settings(speaker_type)?;
            if current.volume == 0 {
                self.restore_volume(speaker_type)?;
            }
        }

        let settings = self.apply_mute(speaker_type, mute)?;
        if !force_no_notifications {
            self.fanout
                .notify(SpeakerEventName::MuteChanged, source, speaker_type, settings)
                .await;
        }
        Ok(settings)
    }

    /// Validated settings of a group; never notifies
    pub fn get_settings(&self, speaker_type: SpeakerType) -> Result<SpeakerSettings> {
        validate_group(speaker_type, self.registry.speakers(speaker_type))
    }

    pub fn add_speaker(&mut self, speaker: Arc<dyn Speaker>) -> SpeakerType {
        let speaker_type = speaker.speaker_type();
        self.registry.add(speaker_type, speaker);
        info!(
            group = %speaker_type,
            speakers = self.registry.group_len(speaker_type),
            "speaker added"
        );
        speaker_type
    }

    pub fn add_observer(&mut self, observer: Arc<dyn SpeakerObserver>) -> ObserverId {
        self.fanout.add_observer(observer)
    }

    pub fn remove_observer(&mut self, id: ObserverId) -> bool {
        self.fanout.remove_observer(id)
    }

    /// Mirror every consistent cloud-synced group into the context store
    pub async fn publish_initial_state(&self) {
        for speaker_type in self.registry.types().filter(SpeakerType::is_cloud_synced) {
            match self.get_settings(speaker_type) {
                Ok(settings) => {
                    self.fanout.publish_context(speaker_type, settings).await;
                }
                Err(e) => {
                    warn!(group = %speaker_type, "skipping initial context state: {}", e);
                }
            }
        }
    }

    /// Release speakers and observers
    pub fn release(&mut self) {
        info!(
            speakers = self.registry.len(),
            observers = self.fanout.observer_count(),
            "releasing speakers and observers"
        );
        self.registry.clear();
        self.fanout.clear_observers();
    }

    /// Silent volume bump used before unmuting from zero
    fn restore_volume(&self, speaker_type: SpeakerType) -> Result<SpeakerSettings> {
        let volume = self.config.min_unmute_volume;
        debug!(group = %speaker_type, volume, "restoring volume before unmute");
        self.apply_volume(speaker_type, volume)
    }

    fn apply_volume(&self, speaker_type: SpeakerType, volume: u8) -> Result<SpeakerSettings> {
        self.for_each_speaker(speaker_type, "set volume", |speaker| {
            speaker.set_volume(volume)
        })?;
        self.get_settings(speaker_type)
    }

    fn apply_mute(&self, speaker_type: SpeakerType, mute: bool) -> Result<SpeakerSettings> {
        self.for_each_speaker(speaker_type, "set mute", |speaker| speaker.set_mute(mute))?;
        self.get_settings(speaker_type)
    }

    /// Run a device call on every speaker of a group, stopping at the first
    /// failure. Speakers already changed are left as they are.
    fn for_each_speaker<F>(
        &self,
        speaker_type: SpeakerType,
        operation: &'static str,
        mut call: F,
    ) -> Result<()>
    where
        F: FnMut(&dyn Speaker) -> std::result::Result<(), crate::speaker::DeviceError>,
    {
        let speakers = self.registry.speakers(speaker_type);
        if speakers.is_empty() {
            warn!(group = %speaker_type, operation, "no speakers registered");
            return Err(SpeakerError::EmptyGroup(speaker_type));
        }

        for (index, speaker) in speakers.iter().enumerate() {
            if let Err(source) = call(speaker.as_ref()) {
                warn!(
                    group = %speaker_type,
                    index,
                    applied = index,
                    operation,
                    "speaker call failed: {}",
                    source
                );
                return Err(SpeakerError::DeviceCall {
                    group: speaker_type,
                    index,
                    operation,
                    source,
                });
            }
        }
        Ok(())
    }
}
