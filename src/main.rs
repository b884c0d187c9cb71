use std::sync::Arc;

use clap::Parser;
use tracing::{error, info};

use speakersync::logging::{init_logging, init_logging_simple};
use speakersync::{
    capabilities, AppConfig, ChannelEventSender, Directive, DirectiveHandler, InMemoryContextStore,
    LoggingExceptionSender, Result, SimulatedSpeaker, Source, Speaker, SpeakerError,
    SpeakerManager, SpeakerSettings, SpeakerType,
};

mod cli;

use cli::{Cli, Commands};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => AppConfig::load_file(path),
        None => AppConfig::load(),
    };
    let config = match config {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(2);
        }
    };

    let _log_guard = if cli.verbose {
        init_logging(&config.logging)
    } else {
        init_logging_simple();
        None
    };

    if let Err(errors) = config.validate() {
        for e in &errors {
            eprintln!("config: {}", e);
        }
        std::process::exit(2);
    }

    if let Err(e) = run(cli, config).await {
        error!("command failed: {}", e);
        eprintln!("\x1b[31m✗ {}\x1b[0m", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli, config: AppConfig) -> Result<()> {
    if let Commands::Capabilities = cli.command {
        println!("{}", serde_json::to_string_pretty(capabilities())?);
        return Ok(());
    }

    let mut speakers: Vec<(String, Arc<SimulatedSpeaker>)> = Vec::new();
    for entry in &config.speakers {
        let speaker_type = entry.speaker_type().map_err(SpeakerError::Validation)?;
        speakers.push((
            entry.name.clone(),
            Arc::new(SimulatedSpeaker::new(
                entry.name.clone(),
                speaker_type,
                entry.initial_settings(),
            )),
        ));
    }

    let store = Arc::new(InMemoryContextStore::new());
    let (event_sender, mut events) = ChannelEventSender::new();
    let manager = SpeakerManager::spawn(
        speakers
            .iter()
            .map(|(_, s)| s.clone() as Arc<dyn Speaker>)
            .collect(),
        config.engine.clone(),
        store.clone(),
        Arc::new(event_sender),
    )?;

    manager
        .add_observer(Arc::new(
            |source: Source, speaker_type: SpeakerType, settings: SpeakerSettings| -> anyhow::Result<()> {
                println!("observer: {} changed {} -> {}", source, speaker_type, settings);
                Ok(())
            },
        ))
        .await?;

    let quiet = cli.quiet;
    let outcome = match cli.command {
        Commands::Status => Ok(None),
        Commands::SetVolume {
            speaker_type,
            volume,
        } => manager
            .set_volume(speaker_type, volume, quiet, Source::LocalApi)
            .await
            .map(|s| Some((speaker_type, s))),
        Commands::Adjust {
            speaker_type,
            delta,
        } => manager
            .adjust_volume(speaker_type, delta, quiet, Source::LocalApi)
            .await
            .map(|s| Some((speaker_type, s))),
        Commands::Mute { speaker_type } => manager
            .set_mute(speaker_type, true, quiet, Source::LocalApi)
            .await
            .map(|s| Some((speaker_type, s))),
        Commands::Unmute { speaker_type } => manager
            .set_mute(speaker_type, false, quiet, Source::LocalApi)
            .await
            .map(|s| Some((speaker_type, s))),
        Commands::Directive { name, payload } => {
            let handler = DirectiveHandler::new(manager.clone(), Arc::new(LoggingExceptionSender));
            handler
                .handle(&Directive::new("cli", name, payload))
                .await
                .map(|s| Some((SpeakerType::Speaker, s)))
        }
        Commands::Capabilities => Ok(None),
    };

    manager.flush().await?;

    match &outcome {
        Ok(Some((speaker_type, settings))) => {
            println!("\x1b[32m✓ {} is now {}\x1b[0m", speaker_type, settings)
        }
        Ok(None) => {}
        Err(e) => println!("\x1b[31m✗ {}\x1b[0m", e),
    }

    while let Ok(event) = events.try_recv() {
        println!("event: {} {}", event.name, event.payload());
    }

    println!();
    let mut groups: Vec<SpeakerType> = speakers.iter().map(|(_, s)| s.speaker_type()).collect();
    groups.sort();
    groups.dedup();
    for speaker_type in groups {
        match manager.get_settings(speaker_type).await {
            Ok(settings) => println!("{:<12} {}", speaker_type.to_string(), settings),
            Err(e) => println!("{:<12} {}", speaker_type.to_string(), e),
        }
        for (name, speaker) in speakers.iter().filter(|(_, s)| s.speaker_type() == speaker_type) {
            println!("  {:<16} {}", name, speaker.raw_settings());
        }
    }

    manager.shutdown().await?;
    info!("done");
    outcome.map(|_| ())
}
