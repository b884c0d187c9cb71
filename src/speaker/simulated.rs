//! In-memory speaker used by the CLI and integration tests

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};

use super::traits::{DeviceError, Speaker};
use super::types::{SpeakerSettings, SpeakerType};

/// Speaker backed by plain memory, with switchable failure injection
#[derive(Debug)]
pub struct SimulatedSpeaker {
    name: String,
    speaker_type: SpeakerType,
    state: Mutex<SpeakerSettings>,
    fail_get: AtomicBool,
    fail_set_volume: AtomicBool,
    fail_set_mute: AtomicBool,
    set_calls: AtomicU64,
}

impl SimulatedSpeaker {
    pub fn new(name: impl Into<String>, speaker_type: SpeakerType, initial: SpeakerSettings) -> Self {
        Self {
            name: name.into(),
            speaker_type,
            state: Mutex::new(initial),
            fail_get: AtomicBool::new(false),
            fail_set_volume: AtomicBool::new(false),
            fail_set_mute: AtomicBool::new(false),
            set_calls: AtomicU64::new(0),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Raw device state, bypassing failure injection
    pub fn raw_settings(&self) -> SpeakerSettings {
        *self.lock()
    }

    /// Overwrite the device state as if changed out-of-band
    pub fn force_settings(&self, settings: SpeakerSettings) {
        *self.lock() = settings;
    }

    pub fn fail_get(&self, fail: bool) {
        self.fail_get.store(fail, Ordering::SeqCst);
    }

    pub fn fail_set_volume(&self, fail: bool) {
        self.fail_set_volume.store(fail, Ordering::SeqCst);
    }

    pub fn fail_set_mute(&self, fail: bool) {
        self.fail_set_mute.store(fail, Ordering::SeqCst);
    }

    /// Number of successful set calls (volume or mute)
    pub fn set_calls(&self) -> u64 {
        self.set_calls.load(Ordering::SeqCst)
    }

    fn lock(&self) -> MutexGuard<'_, SpeakerSettings> {
        // State is a plain Copy value, so a poisoned lock still holds valid data.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Speaker for SimulatedSpeaker {
    fn speaker_type(&self) -> SpeakerType {
        self.speaker_type
    }

    fn settings(&self) -> Result<SpeakerSettings, DeviceError> {
        if self.fail_get.load(Ordering::SeqCst) {
            return Err(DeviceError::Unavailable(format!("{} did not answer", self.name)));
        }
        Ok(*self.lock())
    }

    fn set_volume(&self, volume: u8) -> Result<(), DeviceError> {
        if self.fail_set_volume.load(Ordering::SeqCst) {
            return Err(DeviceError::Rejected(format!(
                "{} refused volume {}",
                self.name, volume
            )));
        }
        self.lock().volume = volume;
        self.set_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn set_mute(&self, mute: bool) -> Result<(), DeviceError> {
        if self.fail_set_mute.load(Ordering::SeqCst) {
            return Err(DeviceError::Rejected(format!(
                "{} refused mute={}",
                self.name, mute
            )));
        }
        self.lock().mute = mute;
        self.set_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_injection_leaves_state_untouched() {
        let speaker = SimulatedSpeaker::new("den", SpeakerType::Speaker, SpeakerSettings::new(10, false));
        speaker.fail_set_volume(true);
        assert!(speaker.set_volume(50).is_err());
        assert_eq!(speaker.raw_settings().volume, 10);
        assert_eq!(speaker.set_calls(), 0);

        speaker.fail_set_volume(false);
        speaker.set_volume(50).unwrap();
        assert_eq!(speaker.settings().unwrap(), SpeakerSettings::new(50, false));
        assert_eq!(speaker.set_calls(), 1);
    }

    #[test]
    fn test_failed_get_reports_unavailable() {
        let speaker = SimulatedSpeaker::new("den", SpeakerType::Alerts, SpeakerSettings::default());
        speaker.fail_get(true);
        assert!(matches!(speaker.settings(), Err(DeviceError::Unavailable(_))));
    }
}
