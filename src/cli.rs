use clap::{Parser, Subcommand};

use speakersync::SpeakerType;

#[derive(Parser)]
#[command(name = "speakersync")]
#[command(version = "0.1.0")]
#[command(about = "Grouped speaker volume/mute synchronization", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file path (defaults to config/default.toml plus SPEAKERSYNC_ENV overlay)
    #[arg(short, long, env = "SPEAKERSYNC_CONFIG")]
    pub config: Option<String>,

    /// Apply the change without notifying observers, the context store or the event channel
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show every group and speaker
    Status,
    /// Set the absolute volume of a group
    SetVolume {
        /// Group: speaker, alerts or custom:<id>
        speaker_type: SpeakerType,
        #[arg(allow_negative_numbers = true)]
        volume: i32,
    },
    /// Change the volume of a group by a delta
    Adjust {
        speaker_type: SpeakerType,
        #[arg(allow_negative_numbers = true)]
        delta: i32,
    },
    /// Mute a group
    Mute { speaker_type: SpeakerType },
    /// Unmute a group, restoring a minimum volume if it sits at zero
    Unmute { speaker_type: SpeakerType },
    /// Feed a raw directive through the directive handler
    Directive {
        /// SetVolume, AdjustVolume or SetMute
        name: String,
        /// JSON payload, e.g. '{"volume": 40}'
        payload: String,
    },
    /// Print the capability advertisement
    Capabilities,
}
