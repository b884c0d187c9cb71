//! Inbound speaker directives
//!
//! Thin adapter between the cloud connection and the speaker manager:
//! structural payload decoding, dispatch as `Source::Directive`, and
//! exception reporting when a directive cannot be applied.

mod handler;
mod parse;

pub use handler::{DirectiveHandler, ExceptionKind, ExceptionSender, LoggingExceptionSender};
pub use parse::{parse_directive, Directive, SpeakerDirective};
