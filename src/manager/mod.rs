//! Speaker Manager
//!
//! Keeps every speaker of a group at identical volume and mute settings.
//! All work funnels through one worker so group-wide changes are applied,
//! validated and announced without interleaving.

pub mod capabilities;
pub mod command;
pub mod config;
pub mod engine;
pub mod manager;
pub mod registry;
pub mod validator;

pub use capabilities::{capabilities, CapabilityConfiguration};
pub use command::Pending;
pub use config::EngineConfig;
pub use engine::SyncEngine;
pub use manager::SpeakerManager;
pub use registry::SpeakerRegistry;
pub use validator::validate_group;
