//! Observer registration and isolated fan-out

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::speaker::{Source, SpeakerSettings, SpeakerType};

/// Receives every accepted, non-suppressed settings change
pub trait SpeakerObserver: Send + Sync {
    /// Called on the manager worker after the change has been applied to
    /// every speaker in the group. Returning an error only logs it.
    fn on_speaker_settings_changed(
        &self,
        source: Source,
        speaker_type: SpeakerType,
        settings: SpeakerSettings,
    ) -> anyhow::Result<()>;
}

impl<F> SpeakerObserver for F
where
    F: Fn(Source, SpeakerType, SpeakerSettings) -> anyhow::Result<()> + Send + Sync,
{
    fn on_speaker_settings_changed(
        &self,
        source: Source,
        speaker_type: SpeakerType,
        settings: SpeakerSettings,
    ) -> anyhow::Result<()> {
        self(source, speaker_type, settings)
    }
}

/// Stable token handed out when an observer is registered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObserverId(Uuid);

impl ObserverId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl std::fmt::Display for ObserverId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Observers in registration order
#[derive(Default)]
pub struct ObserverSet {
    entries: Vec<(ObserverId, Arc<dyn SpeakerObserver>)>,
}

impl ObserverSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an observer. Registering the same `Arc` again returns the
    /// id it already has.
    pub fn add(&mut self, observer: Arc<dyn SpeakerObserver>) -> ObserverId {
        if let Some((id, _)) = self
            .entries
            .iter()
            .find(|(_, existing)| same_observer(existing, &observer))
        {
            debug!(observer_id = %id, "observer already registered");
            return *id;
        }

        let id = ObserverId::new();
        self.entries.push((id, observer));
        debug!(observer_id = %id, total = self.entries.len(), "observer registered");
        id
    }

    /// Remove an observer; unknown ids are ignored.
    pub fn remove(&mut self, id: ObserverId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(existing, _)| *existing != id);
        let removed = self.entries.len() != before;
        if removed {
            debug!(observer_id = %id, "observer removed");
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Invoke every observer in registration order. A failing or panicking
    /// observer never prevents the next one from running.
    ///
    /// Returns the number of observers that failed.
    pub fn notify(
        &self,
        source: Source,
        speaker_type: SpeakerType,
        settings: SpeakerSettings,
    ) -> usize {
        let mut failures = 0;
        for (id, observer) in &self.entries {
            let outcome = catch_unwind(AssertUnwindSafe(|| {
                observer.on_speaker_settings_changed(source, speaker_type, settings)
            }));
            match outcome {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    failures += 1;
                    warn!(observer_id = %id, group = %speaker_type, "observer failed: {}", e);
                }
                Err(_) => {
                    failures += 1;
                    warn!(observer_id = %id, group = %speaker_type, "observer panicked");
                }
            }
        }
        failures
    }
}

fn same_observer(a: &Arc<dyn SpeakerObserver>, b: &Arc<dyn SpeakerObserver>) -> bool {
    // Compare data pointers only; vtables for one type may differ across codegen units.
    std::ptr::eq(
        Arc::as_ptr(a) as *const (),
        Arc::as_ptr(b) as *const (),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        seen: Mutex<Vec<(Source, SpeakerType, SpeakerSettings)>>,
    }

    impl SpeakerObserver for Recorder {
        fn on_speaker_settings_changed(
            &self,
            source: Source,
            speaker_type: SpeakerType,
            settings: SpeakerSettings,
        ) -> anyhow::Result<()> {
            self.seen.lock().unwrap().push((source, speaker_type, settings));
            Ok(())
        }
    }

    #[test]
    fn test_add_same_observer_twice_is_idempotent() {
        let mut set = ObserverSet::new();
        let recorder: Arc<dyn SpeakerObserver> = Arc::new(Recorder::default());
        let first = set.add(recorder.clone());
        let second = set.add(recorder);
        assert_eq!(first, second);
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_remove_unknown_is_noop() {
        let mut set = ObserverSet::new();
        set.add(Arc::new(Recorder::default()));
        assert!(!set.remove(ObserverId::new()));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_failing_observers_do_not_block_later_ones() {
        let mut set = ObserverSet::new();
        let erroring = |_: Source, _: SpeakerType, _: SpeakerSettings| -> anyhow::Result<()> {
            anyhow::bail!("observer is broken")
        };
        let panicking = |_: Source, _: SpeakerType, _: SpeakerSettings| -> anyhow::Result<()> {
            panic!("observer exploded")
        };
        let recorder = Arc::new(Recorder::default());
        set.add(Arc::new(erroring));
        set.add(Arc::new(panicking));
        set.add(recorder.clone());

        let settings = SpeakerSettings::new(30, false);
        let failures = set.notify(Source::Directive, SpeakerType::Speaker, settings);

        assert_eq!(failures, 2);
        let seen = recorder.seen.lock().unwrap();
        assert_eq!(seen.as_slice(), &[(Source::Directive, SpeakerType::Speaker, settings)]);
    }

    #[test]
    fn test_notify_in_registration_order() {
        let order = Arc::new(Mutex::new(Vec::new()));
        let mut set = ObserverSet::new();
        for tag in 0..3 {
            let order = order.clone();
            set.add(Arc::new(
                move |_: Source, _: SpeakerType, _: SpeakerSettings| -> anyhow::Result<()> {
                    order.lock().unwrap().push(tag);
                    Ok(())
                },
            ));
        }
        set.notify(Source::LocalApi, SpeakerType::Alerts, SpeakerSettings::default());
        assert_eq!(*order.lock().unwrap(), vec![0, 1, 2]);
    }
}
