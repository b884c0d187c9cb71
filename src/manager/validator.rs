//! Consistency check across every speaker of a group

use std::sync::Arc;
use tracing::{debug, warn};

use crate::error::{Result, SpeakerError};
use crate::speaker::{Speaker, SpeakerSettings, SpeakerType};

/// Read every speaker of a group and return the settings they all agree on.
///
/// Fails with `EmptyGroup` when there is nothing to read, `DeviceCall` when
/// a read fails and `InconsistentGroup` when any two speakers disagree. A
/// group-level value is only ever returned if it holds for every member.
pub fn validate_group(
    speaker_type: SpeakerType,
    speakers: &[Arc<dyn Speaker>],
) -> Result<SpeakerSettings> {
    let mut agreed: Option<SpeakerSettings> = None;

    for (index, speaker) in speakers.iter().enumerate() {
        let settings = speaker.settings().map_err(|source| {
            warn!(group = %speaker_type, index, "failed to read speaker settings: {}", source);
            SpeakerError::DeviceCall {
                group: speaker_type,
                index,
                operation: "read settings",
                source,
            }
        })?;

        match agreed {
            None => agreed = Some(settings),
            Some(expected) if expected == settings => {}
            Some(expected) => {
                warn!(
                    group = %speaker_type,
                    index,
                    expected = %expected,
                    actual = %settings,
                    "speaker settings inconsistent"
                );
                return Err(SpeakerError::InconsistentGroup(speaker_type));
            }
        }
    }

    let settings = agreed.ok_or(SpeakerError::EmptyGroup(speaker_type))?;
    debug!(group = %speaker_type, speakers = speakers.len(), %settings, "group settings consistent");
    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::speaker::{DeviceError, MockSpeaker};

    fn mock_with(settings: std::result::Result<SpeakerSettings, DeviceError>) -> Arc<dyn Speaker> {
        let mut speaker = MockSpeaker::new();
        speaker.expect_settings().return_const(settings);
        Arc::new(speaker)
    }

    #[test]
    fn test_empty_group_fails() {
        let result = validate_group(SpeakerType::Speaker, &[]);
        assert!(matches!(result, Err(SpeakerError::EmptyGroup(SpeakerType::Speaker))));
    }

    #[test]
    fn test_agreeing_speakers_return_common_settings() {
        let settings = SpeakerSettings::new(10, false);
        let speakers = vec![mock_with(Ok(settings)), mock_with(Ok(settings))];
        assert_eq!(validate_group(SpeakerType::Speaker, &speakers).unwrap(), settings);
    }

    #[test]
    fn test_disagreement_is_inconsistent() {
        let speakers = vec![
            mock_with(Ok(SpeakerSettings::new(10, false))),
            mock_with(Ok(SpeakerSettings::new(10, true))),
        ];
        assert!(matches!(
            validate_group(SpeakerType::Alerts, &speakers),
            Err(SpeakerError::InconsistentGroup(SpeakerType::Alerts))
        ));
    }

    #[test]
    fn test_read_failure_is_reported_with_index() {
        let speakers = vec![
            mock_with(Ok(SpeakerSettings::new(10, false))),
            mock_with(Err(DeviceError::Unavailable("gone".into()))),
        ];
        match validate_group(SpeakerType::Speaker, &speakers) {
            Err(SpeakerError::DeviceCall { index, operation, .. }) => {
                assert_eq!(index, 1);
                assert_eq!(operation, "read settings");
            }
            other => panic!("expected DeviceCall, got {:?}", other),
        }
    }
}
