pub mod config;
pub mod directive;
pub mod error;
pub mod logging;
pub mod manager;
pub mod notify;
pub mod speaker;

pub use config::{AppConfig, LoggingConfig, SimulatedSpeakerConfig};
pub use directive::{
    parse_directive, Directive, DirectiveHandler, ExceptionKind, ExceptionSender,
    LoggingExceptionSender, SpeakerDirective,
};
pub use error::{Result, SpeakerError};
pub use manager::{
    capabilities, validate_group, CapabilityConfiguration, EngineConfig, Pending,
    SpeakerManager, SpeakerRegistry, SyncEngine,
};
pub use notify::{
    ChannelEventSender, ContextStore, EventSender, FanoutReport, InMemoryContextStore,
    NotificationFanout, ObserverId, ObserverSet, SpeakerEvent, SpeakerEventName, SpeakerObserver,
    VolumeState,
};
pub use speaker::{
    DeviceError, SimulatedSpeaker, Source, Speaker, SpeakerSettings, SpeakerType, VOLUME_MAX,
    VOLUME_MIN,
};
