//! Speakers grouped by type

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::speaker::{Speaker, SpeakerType};

/// Multi-valued map from group to the speakers in it, in insertion order.
///
/// Groups appear with their first speaker and never shrink. The same
/// speaker may be added more than once; nothing here de-duplicates.
#[derive(Default)]
pub struct SpeakerRegistry {
    groups: BTreeMap<SpeakerType, Vec<Arc<dyn Speaker>>>,
}

impl SpeakerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry grouping each speaker by its own type
    pub fn from_speakers(speakers: impl IntoIterator<Item = Arc<dyn Speaker>>) -> Self {
        let mut registry = Self::new();
        for speaker in speakers {
            registry.add(speaker.speaker_type(), speaker);
        }
        registry
    }

    pub fn add(&mut self, speaker_type: SpeakerType, speaker: Arc<dyn Speaker>) {
        self.groups.entry(speaker_type).or_default().push(speaker);
    }

    /// Speakers of a group; empty for an unknown group
    pub fn speakers(&self, speaker_type: SpeakerType) -> &[Arc<dyn Speaker>] {
        self.groups
            .get(&speaker_type)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn types(&self) -> impl Iterator<Item = SpeakerType> + '_ {
        self.groups.keys().copied()
    }

    pub fn group_len(&self, speaker_type: SpeakerType) -> usize {
        self.speakers(speaker_type).len()
    }

    /// Total number of registrations across all groups
    pub fn len(&self) -> usize {
        self.groups.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn clear(&mut self) {
        self.groups.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::speaker::{SimulatedSpeaker, SpeakerSettings};

    fn speaker(name: &str, speaker_type: SpeakerType) -> Arc<dyn Speaker> {
        Arc::new(SimulatedSpeaker::new(name, speaker_type, SpeakerSettings::default()))
    }

    #[test]
    fn test_groups_by_speaker_type() {
        let registry = SpeakerRegistry::from_speakers(vec![
            speaker("a", SpeakerType::Speaker),
            speaker("b", SpeakerType::Alerts),
            speaker("c", SpeakerType::Speaker),
        ]);

        assert_eq!(registry.group_len(SpeakerType::Speaker), 2);
        assert_eq!(registry.group_len(SpeakerType::Alerts), 1);
        assert_eq!(registry.len(), 3);
        assert_eq!(
            registry.types().collect::<Vec<_>>(),
            vec![SpeakerType::Speaker, SpeakerType::Alerts]
        );
    }

    #[test]
    fn test_unknown_group_is_empty() {
        let registry = SpeakerRegistry::new();
        assert!(registry.speakers(SpeakerType::Custom(4)).is_empty());
    }

    #[test]
    fn test_duplicate_registration_grows_group() {
        let mut registry = SpeakerRegistry::new();
        let shared = speaker("a", SpeakerType::Speaker);
        registry.add(SpeakerType::Speaker, shared.clone());
        registry.add(SpeakerType::Speaker, shared);
        assert_eq!(registry.group_len(SpeakerType::Speaker), 2);
    }
}
