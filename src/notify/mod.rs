//! Notification fan-out for accepted settings changes
//!
//! - `context` - best-effort mirror of current settings per group
//! - `events` - outbound VolumeChanged / MuteChanged events
//! - `observer` - in-process observers keyed by registration token
//! - `fanout` - runs the three in order with per-step fault isolation

mod context;
mod events;
mod fanout;
mod observer;

pub use context::{ContextStore, InMemoryContextStore, VolumeState};
pub use events::{ChannelEventSender, EventSender, SpeakerEvent, SpeakerEventName};
pub use fanout::{FanoutReport, NotificationFanout};
pub use observer::{ObserverId, ObserverSet, SpeakerObserver};
