use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;

use crate::manager::EngineConfig;
use crate::speaker::{SpeakerSettings, SpeakerType, VOLUME_MAX};

/// Main configuration structure
#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Simulated speakers driven by the CLI
    #[serde(default = "default_speakers")]
    pub speakers: Vec<SimulatedSpeakerConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Enable JSON formatted logs
    #[serde(default)]
    pub json: bool,
    /// Directory for daily rolling log files; console only when unset
    #[serde(default)]
    pub dir: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
            dir: None,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct SimulatedSpeakerConfig {
    pub name: String,
    /// Group, e.g. "speaker", "alerts" or "custom:3"
    #[serde(rename = "type")]
    pub speaker_type: String,
    #[serde(default)]
    pub volume: u8,
    #[serde(default)]
    pub muted: bool,
}

impl SimulatedSpeakerConfig {
    pub fn speaker_type(&self) -> Result<SpeakerType, String> {
        self.speaker_type
            .parse()
            .map_err(|e: &str| format!("speaker {}: {}", self.name, e))
    }

    pub fn initial_settings(&self) -> SpeakerSettings {
        SpeakerSettings::new(self.volume, self.muted)
    }
}

fn default_speakers() -> Vec<SimulatedSpeakerConfig> {
    let speaker = |name: &str, speaker_type: &str, volume: u8| SimulatedSpeakerConfig {
        name: name.to_string(),
        speaker_type: speaker_type.to_string(),
        volume,
        muted: false,
    };
    vec![
        speaker("living-room", "speaker", 30),
        speaker("kitchen", "speaker", 30),
        speaker("alarm-chime", "alerts", 50),
    ]
}

impl AppConfig {
    /// Load configuration from files and environment
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from("config")
    }

    /// Load configuration from a specific directory
    pub fn load_from<P: AsRef<Path>>(config_dir: P) -> Result<Self, ConfigError> {
        let config_dir = config_dir.as_ref();

        let builder = Config::builder()
            // Start with default values
            .set_default("engine.min_unmute_volume", 10)?
            .set_default("engine.publish_initial_state", true)?
            .set_default("logging.level", "info")?
            .set_default("logging.json", false)?
            // Load default config file
            .add_source(File::from(config_dir.join("default.toml")).required(false))
            // Load environment-specific config (e.g., config/production.toml)
            .add_source(
                File::from(config_dir.join(
                    std::env::var("SPEAKERSYNC_ENV").unwrap_or_else(|_| "development".to_string()),
                ))
                .required(false),
            )
            // Override with environment variables (SPEAKERSYNC_ENGINE__MIN_UNMUTE_VOLUME, etc.)
            .add_source(
                Environment::with_prefix("SPEAKERSYNC")
                    .separator("__")
                    .try_parsing(true),
            );

        builder.build()?.try_deserialize()
    }

    /// Load a single configuration file, then apply environment overrides
    pub fn load_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        Config::builder()
            .set_default("engine.min_unmute_volume", 10)?
            .set_default("engine.publish_initial_state", true)?
            .add_source(File::from(path.as_ref()).required(false))
            .add_source(
                Environment::with_prefix("SPEAKERSYNC")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = match self.engine.validate() {
            Ok(()) => Vec::new(),
            Err(errors) => errors,
        };

        for speaker in &self.speakers {
            if let Err(e) = speaker.speaker_type() {
                errors.push(e);
            }
            if speaker.volume > VOLUME_MAX {
                errors.push(format!(
                    "speaker {}: volume {} exceeds {}",
                    speaker.name, speaker.volume, VOLUME_MAX
                ));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
