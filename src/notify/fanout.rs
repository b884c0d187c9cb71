//! Notification fan-out: context store, outbound event, then observers

use std::sync::Arc;
use tracing::{debug, warn};

use super::context::{ContextStore, VolumeState};
use super::events::{EventSender, SpeakerEvent, SpeakerEventName};
use super::observer::{ObserverId, ObserverSet, SpeakerObserver};
use crate::speaker::{Source, SpeakerSettings, SpeakerType};

/// Outcome of one fan-out round, mostly useful for logging and tests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FanoutReport {
    pub context_published: bool,
    pub event_emitted: bool,
    pub observers_notified: usize,
    pub observer_failures: usize,
}

/// Owns the notification collaborators; lives on the manager worker
pub struct NotificationFanout {
    context_store: Arc<dyn ContextStore>,
    event_sender: Arc<dyn EventSender>,
    observers: ObserverSet,
}

impl NotificationFanout {
    pub fn new(context_store: Arc<dyn ContextStore>, event_sender: Arc<dyn EventSender>) -> Self {
        Self {
            context_store,
            event_sender,
            observers: ObserverSet::new(),
        }
    }

    pub fn add_observer(&mut self, observer: Arc<dyn SpeakerObserver>) -> ObserverId {
        self.observers.add(observer)
    }

    pub fn remove_observer(&mut self, id: ObserverId) -> bool {
        self.observers.remove(id)
    }

    pub fn observer_count(&self) -> usize {
        self.observers.len()
    }

    /// Mirror settings into the context store without events or observers.
    /// Groups that are not cloud-synced are skipped.
    pub async fn publish_context(&self, speaker_type: SpeakerType, settings: SpeakerSettings) -> bool {
        if !speaker_type.is_cloud_synced() {
            debug!(group = %speaker_type, "local group, context store untouched");
            return false;
        }

        let state = VolumeState::from(settings);
        match self.context_store.publish(speaker_type, &state).await {
            Ok(()) => true,
            Err(e) => {
                warn!(group = %speaker_type, "context store update failed: {}", e);
                false
            }
        }
    }

    /// Announce an accepted change. Each step is best-effort; a failure is
    /// logged and the remaining steps still run. Local groups only reach the
    /// observers.
    pub async fn notify(
        &self,
        event_name: SpeakerEventName,
        source: Source,
        speaker_type: SpeakerType,
        settings: SpeakerSettings,
    ) -> FanoutReport {
        let context_published = self.publish_context(speaker_type, settings).await;

        let event_emitted = speaker_type.is_cloud_synced()
            && self.emit(event_name, source, speaker_type, settings).await;

        let observer_failures = self.observers.notify(source, speaker_type, settings);

        let report = FanoutReport {
            context_published,
            event_emitted,
            observers_notified: self.observers.len(),
            observer_failures,
        };
        debug!(
            group = %speaker_type,
            event = %event_name,
            source = %source,
            %settings,
            ?report,
            "settings change announced"
        );
        report
    }

    async fn emit(
        &self,
        event_name: SpeakerEventName,
        source: Source,
        speaker_type: SpeakerType,
        settings: SpeakerSettings,
    ) -> bool {
        let event = SpeakerEvent::new(event_name, speaker_type, source, settings);
        match self.event_sender.emit(event).await {
            Ok(()) => true,
            Err(e) => {
                warn!(group = %speaker_type, event = %event_name, "event emission failed: {}", e);
                false
            }
        }
    }

    /// Drop every registered observer
    pub fn clear_observers(&mut self) {
        self.observers.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::{ChannelEventSender, InMemoryContextStore};

    #[tokio::test]
    async fn test_notify_runs_every_step_even_if_context_fails() {
        let store = Arc::new(InMemoryContextStore::new());
        store.set_failing(true);
        let (sender, mut events) = ChannelEventSender::new();
        let mut fanout = NotificationFanout::new(store.clone(), Arc::new(sender));

        let hits = Arc::new(std::sync::atomic::AtomicUsize::new(0));
        let counter = hits.clone();
        fanout.add_observer(Arc::new(
            move |_: Source, _: SpeakerType, _: SpeakerSettings| -> anyhow::Result<()> {
                counter.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
                Ok(())
            },
        ));

        let settings = SpeakerSettings::new(12, false);
        let report = fanout
            .notify(SpeakerEventName::VolumeChanged, Source::LocalApi, SpeakerType::Speaker, settings)
            .await;

        assert!(!report.context_published);
        assert!(report.event_emitted);
        assert_eq!(report.observers_notified, 1);
        assert_eq!(hits.load(std::sync::atomic::Ordering::SeqCst), 1);

        let event = events.try_recv().unwrap();
        assert_eq!(event.name, SpeakerEventName::VolumeChanged);
        assert_eq!(event.settings, settings);
    }

    #[tokio::test]
    async fn test_publish_context_skips_events() {
        let store = Arc::new(InMemoryContextStore::new());
        let (sender, mut events) = ChannelEventSender::new();
        let fanout = NotificationFanout::new(store.clone(), Arc::new(sender));

        assert!(fanout.publish_context(SpeakerType::Speaker, SpeakerSettings::new(3, true)).await);
        assert_eq!(store.publications(), 1);
        assert!(events.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_local_group_only_reaches_observers() {
        let store = Arc::new(InMemoryContextStore::new());
        let (sender, mut events) = ChannelEventSender::new();
        let mut fanout = NotificationFanout::new(store.clone(), Arc::new(sender));

        let seen = Arc::new(std::sync::Mutex::new(Vec::new()));
        let sink = seen.clone();
        let id = fanout.add_observer(Arc::new(
            move |_: Source, t: SpeakerType, s: SpeakerSettings| -> anyhow::Result<()> {
                sink.lock().unwrap().push((t, s));
                Ok(())
            },
        ));
        assert_eq!(fanout.observer_count(), 1);

        let settings = SpeakerSettings::new(70, false);
        let report = fanout
            .notify(SpeakerEventName::VolumeChanged, Source::LocalApi, SpeakerType::Alerts, settings)
            .await;

        assert!(!report.context_published);
        assert!(!report.event_emitted);
        assert_eq!(report.observers_notified, 1);
        assert_eq!(store.publications(), 0);
        assert!(events.try_recv().is_err());
        assert_eq!(*seen.lock().unwrap(), vec![(SpeakerType::Alerts, settings)]);

        assert!(!fanout.publish_context(SpeakerType::Custom(2), settings).await);
        assert_eq!(store.publications(), 0);

        assert!(fanout.remove_observer(id));
        assert_eq!(fanout.observer_count(), 0);
    }
}
