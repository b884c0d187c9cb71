//! Applies decoded directives to the speaker group and reports failures upstream

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

use super::parse::{parse_directive, Directive, SpeakerDirective};
use crate::error::{Result, SpeakerError};
use crate::manager::SpeakerManager;
use crate::speaker::{Source, SpeakerSettings, SpeakerType};

/// Why a directive could not be honoured
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExceptionKind {
    /// Payload was structurally invalid or named an unknown directive
    UnexpectedInformationReceived,
    /// Directive was valid but applying it failed
    InternalError,
}

impl std::fmt::Display for ExceptionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExceptionKind::UnexpectedInformationReceived => {
                write!(f, "UNEXPECTED_INFORMATION_RECEIVED")
            }
            ExceptionKind::InternalError => write!(f, "INTERNAL_ERROR"),
        }
    }
}

/// Reports failed directives back to their origin
#[async_trait]
pub trait ExceptionSender: Send + Sync {
    async fn send_exception(&self, directive: &Directive, kind: ExceptionKind, message: &str);
}

/// Exception sender that only logs
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingExceptionSender;

#[async_trait]
impl ExceptionSender for LoggingExceptionSender {
    async fn send_exception(&self, directive: &Directive, kind: ExceptionKind, message: &str) {
        warn!(
            message_id = %directive.message_id,
            directive = %directive.name,
            %kind,
            "directive exception: {}",
            message
        );
    }
}

/// Routes speaker directives into the manager as directive-originated changes
#[derive(Clone)]
pub struct DirectiveHandler {
    manager: SpeakerManager,
    exceptions: Arc<dyn ExceptionSender>,
    speaker_type: SpeakerType,
}

impl DirectiveHandler {
    /// Directives always target the cloud-synced speaker group
    pub fn new(manager: SpeakerManager, exceptions: Arc<dyn ExceptionSender>) -> Self {
        Self {
            manager,
            exceptions,
            speaker_type: SpeakerType::Speaker,
        }
    }

    /// Decode and apply a directive, waiting for the manager to finish.
    ///
    /// Every failure is also reported through the exception sender.
    pub async fn handle(&self, directive: &Directive) -> Result<SpeakerSettings> {
        let parsed = match parse_directive(directive) {
            Ok(parsed) => parsed,
            Err(e) => {
                self.exceptions
                    .send_exception(directive, ExceptionKind::UnexpectedInformationReceived, &e.to_string())
                    .await;
                return Err(e);
            }
        };

        info!(
            message_id = %directive.message_id,
            directive = %directive.name,
            ?parsed,
            "handling speaker directive"
        );

        let result = self.apply(parsed).await;
        if let Err(e) = &result {
            self.exceptions
                .send_exception(directive, exception_kind(e), &e.to_string())
                .await;
        }
        result
    }

    async fn apply(&self, directive: SpeakerDirective) -> Result<SpeakerSettings> {
        let group = self.speaker_type;
        match directive {
            SpeakerDirective::SetVolume { volume } => {
                self.manager
                    .set_volume(group, volume, false, Source::Directive)
                    .await
            }
            SpeakerDirective::AdjustVolume { delta } => {
                self.manager
                    .adjust_volume(group, delta, false, Source::Directive)
                    .await
            }
            SpeakerDirective::SetMute { mute } => {
                self.manager
                    .set_mute(group, mute, false, Source::Directive)
                    .await
            }
        }
    }
}

fn exception_kind(error: &SpeakerError) -> ExceptionKind {
    match error {
        SpeakerError::MalformedInput(_) => ExceptionKind::UnexpectedInformationReceived,
        _ => ExceptionKind::InternalError,
    }
}
