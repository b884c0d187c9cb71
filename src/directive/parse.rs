//! Structural decoding of inbound speaker directives

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Result, SpeakerError};
use crate::manager::capabilities::capabilities;

const VOLUME_KEY: &str = "volume";
const MUTE_KEY: &str = "mute";

/// Raw directive as delivered by the cloud connection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Directive {
    pub message_id: String,
    pub name: String,
    pub payload: String,
}

impl Directive {
    pub fn new(message_id: impl Into<String>, name: impl Into<String>, payload: impl Into<String>) -> Self {
        Self {
            message_id: message_id.into(),
            name: name.into(),
            payload: payload.into(),
        }
    }
}

/// Typed speaker directive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpeakerDirective {
    SetVolume { volume: i32 },
    AdjustVolume { delta: i32 },
    SetMute { mute: bool },
}

/// Decode a directive. Only structure is checked; out-of-range numbers are
/// left for the engine to clamp.
pub fn parse_directive(directive: &Directive) -> Result<SpeakerDirective> {
    if !capabilities().supports_directive(&directive.name) {
        return Err(SpeakerError::MalformedInput(format!(
            "unsupported directive {}",
            directive.name
        )));
    }

    let payload: Value = serde_json::from_str(&directive.payload).map_err(|e| {
        SpeakerError::MalformedInput(format!("{} payload is not JSON: {}", directive.name, e))
    })?;

    match directive.name.as_str() {
        "SetVolume" => Ok(SpeakerDirective::SetVolume {
            volume: integer_field(&payload, VOLUME_KEY)?,
        }),
        "AdjustVolume" => Ok(SpeakerDirective::AdjustVolume {
            delta: integer_field(&payload, VOLUME_KEY)?,
        }),
        "SetMute" => Ok(SpeakerDirective::SetMute {
            mute: payload
                .get(MUTE_KEY)
                .and_then(Value::as_bool)
                .ok_or_else(|| missing(MUTE_KEY, "boolean"))?,
        }),
        other => Err(SpeakerError::MalformedInput(format!(
            "unsupported directive {}",
            other
        ))),
    }
}

fn integer_field(payload: &Value, key: &str) -> Result<i32> {
    let raw = payload
        .get(key)
        .and_then(Value::as_i64)
        .ok_or_else(|| missing(key, "integer"))?;
    Ok(raw.clamp(i32::MIN as i64, i32::MAX as i64) as i32)
}

fn missing(key: &str, kind: &str) -> SpeakerError {
    SpeakerError::MalformedInput(format!("payload needs {} field {:?}", kind, key))
}
