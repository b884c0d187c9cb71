//! Speaker manager, the serialized front door to the synchronization engine
//!
//! `SpeakerManager` is a clonable handle. Every call enqueues a command on a
//! FIFO channel and returns a [`Pending`] immediately. One spawned worker owns
//! the engine and drains the channel, so no two group-wide changes ever
//! interleave their device calls and reads only see fully applied writes.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::command::{ManagerCommand, Pending, Reply};
use super::config::EngineConfig;
use super::engine::SyncEngine;
use super::registry::SpeakerRegistry;
use crate::error::{Result, SpeakerError};
use crate::notify::{ContextStore, EventSender, NotificationFanout, ObserverId, SpeakerObserver};
use crate::speaker::{Source, Speaker, SpeakerSettings, SpeakerType};

/// Clonable handle to a running speaker manager
#[derive(Clone)]
pub struct SpeakerManager {
    command_tx: mpsc::UnboundedSender<ManagerCommand>,
    accepting: Arc<AtomicBool>,
    worker: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl SpeakerManager {
    /// Validate the configuration, group the speakers by type and start the
    /// worker on the current tokio runtime.
    pub fn spawn(
        speakers: Vec<Arc<dyn Speaker>>,
        config: EngineConfig,
        context_store: Arc<dyn ContextStore>,
        event_sender: Arc<dyn EventSender>,
    ) -> Result<Self> {
        config
            .validate()
            .map_err(|errors| SpeakerError::Validation(errors.join("; ")))?;

        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| SpeakerError::Internal(format!("no tokio runtime: {}", e)))?;

        let registry = SpeakerRegistry::from_speakers(speakers);
        let fanout = NotificationFanout::new(context_store, event_sender);
        let engine = SyncEngine::new(config, registry, fanout);

        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let accepting = Arc::new(AtomicBool::new(true));
        let worker = runtime.spawn(run(engine, command_rx, accepting.clone()));

        Ok(Self {
            command_tx,
            accepting,
            worker: Arc::new(Mutex::new(Some(worker))),
        })
    }

    /// Set the absolute volume of every speaker in a group
    pub fn set_volume(
        &self,
        speaker_type: SpeakerType,
        volume: i32,
        force_no_notifications: bool,
        source: Source,
    ) -> Pending<SpeakerSettings> {
        self.submit(|reply| ManagerCommand::SetVolume {
            speaker_type,
            volume,
            force_no_notifications,
            source,
            reply,
        })
    }

    /// Change the volume of every speaker in a group by `delta`
    pub fn adjust_volume(
        &self,
        speaker_type: SpeakerType,
        delta: i32,
        force_no_notifications: bool,
        source: Source,
    ) -> Pending<SpeakerSettings> {
        self.submit(|reply| ManagerCommand::AdjustVolume {
            speaker_type,
            delta,
            force_no_notifications,
            source,
            reply,
        })
    }

    /// Mute or unmute every speaker in a group
    pub fn set_mute(
        &self,
        speaker_type: SpeakerType,
        mute: bool,
        force_no_notifications: bool,
        source: Source,
    ) -> Pending<SpeakerSettings> {
        self.submit(|reply| ManagerCommand::SetMute {
            speaker_type,
            mute,
            force_no_notifications,
            source,
            reply,
        })
    }

    /// Settings every speaker in the group agrees on
    pub fn get_settings(&self, speaker_type: SpeakerType) -> Pending<SpeakerSettings> {
        self.submit(|reply| ManagerCommand::GetSettings {
            speaker_type,
            reply,
        })
    }

    /// Register another speaker under its own type
    pub fn add_speaker(&self, speaker: Arc<dyn Speaker>) -> Pending<()> {
        self.submit(|reply| ManagerCommand::AddSpeaker { speaker, reply })
    }

    pub fn add_observer(&self, observer: Arc<dyn SpeakerObserver>) -> Pending<ObserverId> {
        self.submit(|reply| ManagerCommand::AddObserver { observer, reply })
    }

    /// Resolves to false when the id was not registered
    pub fn remove_observer(&self, id: ObserverId) -> Pending<bool> {
        self.submit(|reply| ManagerCommand::RemoveObserver { id, reply })
    }

    /// Resolves once every command submitted before it has completed
    pub fn flush(&self) -> Pending<()> {
        self.submit(|reply| ManagerCommand::Flush { reply })
    }

    pub fn is_accepting(&self) -> bool {
        self.accepting.load(Ordering::SeqCst)
    }

    /// Stop accepting commands, let the worker finish the command it is
    /// running, refuse everything still queued, then release speakers and
    /// observers.
    ///
    /// Safe to call more than once and from any clone.
    pub async fn shutdown(&self) -> Result<()> {
        if self.accepting.swap(false, Ordering::SeqCst) {
            info!("speaker manager shutdown requested");
            let _ = self.command_tx.send(ManagerCommand::Shutdown);
        }

        let worker = self.worker.lock().await.take();
        if let Some(worker) = worker {
            worker
                .await
                .map_err(|e| SpeakerError::Internal(format!("speaker manager worker failed: {}", e)))?;
            info!("speaker manager shut down");
        }
        Ok(())
    }

    fn submit<T>(&self, build: impl FnOnce(Reply<T>) -> ManagerCommand) -> Pending<T> {
        if !self.is_accepting() {
            return Pending::ready(Err(SpeakerError::ShutDown));
        }

        let (reply, pending) = Pending::channel();
        if let Err(mpsc::error::SendError(command)) = self.command_tx.send(build(reply)) {
            refuse(command);
        }
        pending
    }
}

/// Worker loop; owns the engine until shutdown or until every handle is gone
async fn run(
    mut engine: SyncEngine,
    mut command_rx: mpsc::UnboundedReceiver<ManagerCommand>,
    accepting: Arc<AtomicBool>,
) {
    info!(
        groups = engine.registry().types().count(),
        speakers = engine.registry().len(),
        "speaker manager worker starting"
    );

    if engine.config().publish_initial_state {
        engine.publish_initial_state().await;
    }

    while let Some(command) = command_rx.recv().await {
        debug!(command = command.name(), "command dequeued");
        if let ManagerCommand::Shutdown = command {
            break;
        }
        // Queued work is not started once shutdown has begun.
        if !accepting.load(Ordering::SeqCst) {
            refuse(command);
            continue;
        }
        execute(&mut engine, command).await;
    }

    command_rx.close();
    while let Ok(command) = command_rx.try_recv() {
        refuse(command);
    }

    engine.release();
    info!("speaker manager worker exited");
}

async fn execute(engine: &mut SyncEngine, command: ManagerCommand) {
    let name = command.name();
    match command {
        ManagerCommand::SetVolume {
            speaker_type,
            volume,
            force_no_notifications,
            source,
            reply,
        } => {
            let result = engine
                .set_volume(speaker_type, volume, force_no_notifications, source)
                .await;
            finish(name, reply, result);
        }
        ManagerCommand::AdjustVolume {
            speaker_type,
            delta,
            force_no_notifications,
            source,
            reply,
        } => {
            let result = engine
                .adjust_volume(speaker_type, delta, force_no_notifications, source)
                .await;
            finish(name, reply, result);
        }
        ManagerCommand::SetMute {
            speaker_type,
            mute,
            force_no_notifications,
            source,
            reply,
        } => {
            let result = engine
                .set_mute(speaker_type, mute, force_no_notifications, source)
                .await;
            finish(name, reply, result);
        }
        ManagerCommand::GetSettings {
            speaker_type,
            reply,
        } => finish(name, reply, engine.get_settings(speaker_type)),
        ManagerCommand::AddSpeaker { speaker, reply } => {
            engine.add_speaker(speaker);
            finish(name, reply, Ok(()));
        }
        ManagerCommand::AddObserver { observer, reply } => {
            finish(name, reply, Ok(engine.add_observer(observer)));
        }
        ManagerCommand::RemoveObserver { id, reply } => {
            finish(name, reply, Ok(engine.remove_observer(id)));
        }
        ManagerCommand::Flush { reply } => finish(name, reply, Ok(())),
        ManagerCommand::Shutdown => {}
    }
}

fn finish<T>(name: &'static str, reply: Reply<T>, result: Result<T>) {
    if let Err(e) = &result {
        warn!(command = name, "command failed: {}", e);
    }
    if reply.send(result).is_err() {
        debug!(command = name, "caller dropped result handle");
    }
}

fn refuse(command: ManagerCommand) {
    debug!(command = command.name(), "command refused after shutdown");
    match command {
        ManagerCommand::SetVolume { reply, .. }
        | ManagerCommand::AdjustVolume { reply, .. }
        | ManagerCommand::SetMute { reply, .. }
        | ManagerCommand::GetSettings { reply, .. } => {
            let _ = reply.send(Err(SpeakerError::ShutDown));
        }
        ManagerCommand::AddSpeaker { reply, .. } | ManagerCommand::Flush { reply } => {
            let _ = reply.send(Err(SpeakerError::ShutDown));
        }
        ManagerCommand::AddObserver { reply, .. } => {
            let _ = reply.send(Err(SpeakerError::ShutDown));
        }
        ManagerCommand::RemoveObserver { reply, .. } => {
            let _ = reply.send(Err(SpeakerError::ShutDown));
        }
        ManagerCommand::Shutdown => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::{ChannelEventSender, InMemoryContextStore};
    use crate::speaker::{DeviceError, SimulatedSpeaker};
    use std::time::Duration;

    fn spawn_with(speakers: Vec<Arc<dyn Speaker>>) -> (SpeakerManager, Arc<InMemoryContextStore>) {
        let store = Arc::new(InMemoryContextStore::new());
        let (sender, _events) = ChannelEventSender::new();
        let manager = SpeakerManager::spawn(
            speakers,
            EngineConfig::default(),
            store.clone(),
            Arc::new(sender),
        )
        .unwrap();
        (manager, store)
    }

    fn simulated(volume: u8) -> Arc<SimulatedSpeaker> {
        Arc::new(SimulatedSpeaker::new(
            "s",
            SpeakerType::Speaker,
            SpeakerSettings::new(volume, false),
        ))
    }

    #[tokio::test]
    async fn test_commands_resolve_in_submission_order() {
        let speaker = simulated(10);
        let (manager, _store) = spawn_with(vec![speaker.clone()]);

        let first = manager.set_volume(SpeakerType::Speaker, 20, false, Source::LocalApi);
        let second = manager.adjust_volume(SpeakerType::Speaker, 5, false, Source::LocalApi);
        let read = manager.get_settings(SpeakerType::Speaker);

        assert_eq!(first.await.unwrap().volume, 20);
        assert_eq!(second.await.unwrap().volume, 25);
        assert_eq!(read.await.unwrap(), SpeakerSettings::new(25, false));
    }

    #[tokio::test]
    async fn test_fire_and_forget_still_runs() {
        let speaker = simulated(10);
        let (manager, _store) = spawn_with(vec![speaker.clone()]);

        drop(manager.set_mute(SpeakerType::Speaker, true, false, Source::LocalApi));
        manager.flush().await.unwrap();

        assert!(speaker.raw_settings().mute);
    }

    #[tokio::test]
    async fn test_failure_does_not_stall_queue() {
        let (manager, _store) = spawn_with(vec![simulated(10)]);

        let failed = manager.set_volume(SpeakerType::Alerts, 10, false, Source::LocalApi);
        let next = manager.get_settings(SpeakerType::Speaker);

        assert!(matches!(failed.await, Err(SpeakerError::EmptyGroup(_))));
        assert_eq!(next.await.unwrap().volume, 10);
    }

    #[tokio::test]
    async fn test_add_speaker_creates_group() {
        let (manager, _store) = spawn_with(Vec::new());
        let alerts = Arc::new(SimulatedSpeaker::new(
            "chime",
            SpeakerType::Alerts,
            SpeakerSettings::new(5, false),
        ));

        assert!(matches!(
            manager.get_settings(SpeakerType::Alerts).await,
            Err(SpeakerError::EmptyGroup(_))
        ));
        manager.add_speaker(alerts).await.unwrap();
        assert_eq!(
            manager.get_settings(SpeakerType::Alerts).await.unwrap(),
            SpeakerSettings::new(5, false)
        );
    }

    #[tokio::test]
    async fn test_initial_state_published_on_start() {
        let (manager, store) = spawn_with(vec![simulated(33)]);
        manager.flush().await.unwrap();
        assert_eq!(store.publications(), 1);
        assert_eq!(store.get(SpeakerType::Speaker).await.unwrap().map(|s| s.volume), Some(33));
    }

    #[tokio::test]
    async fn test_shutdown_refuses_queued_commands() {
        let speaker = simulated(10);
        let (manager, _store) = spawn_with(vec![speaker.clone()]);

        let queued = manager.set_volume(SpeakerType::Speaker, 60, false, Source::LocalApi);
        manager.shutdown().await.unwrap();

        assert!(matches!(queued.await, Err(SpeakerError::ShutDown)));
        assert_eq!(speaker.raw_settings().volume, 10);
        assert!(!manager.is_accepting());
        assert!(matches!(
            manager.get_settings(SpeakerType::Speaker).await,
            Err(SpeakerError::ShutDown)
        ));

        // Second shutdown is a no-op.
        tokio::time::timeout(Duration::from_secs(1), manager.shutdown())
            .await
            .unwrap()
            .unwrap();
    }

    /// Blocks inside its first `set_volume` until released
    struct GatedSpeaker {
        inner: SimulatedSpeaker,
        entered: std::sync::Mutex<Option<std::sync::mpsc::Sender<()>>>,
        release: std::sync::Mutex<std::sync::mpsc::Receiver<()>>,
    }

    impl Speaker for GatedSpeaker {
        fn speaker_type(&self) -> SpeakerType {
            self.inner.speaker_type()
        }

        fn settings(&self) -> std::result::Result<SpeakerSettings, DeviceError> {
            self.inner.settings()
        }

        fn set_volume(&self, volume: u8) -> std::result::Result<(), DeviceError> {
            let entered = self.entered.lock().unwrap().take();
            if let Some(entered) = entered {
                let _ = entered.send(());
                let _ = self.release.lock().unwrap().recv();
            }
            self.inner.set_volume(volume)
        }

        fn set_mute(&self, mute: bool) -> std::result::Result<(), DeviceError> {
            self.inner.set_mute(mute)
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_shutdown_lets_in_flight_command_finish() {
        let (entered_tx, entered_rx) = std::sync::mpsc::channel();
        let (release_tx, release_rx) = std::sync::mpsc::channel();
        let gated = Arc::new(GatedSpeaker {
            inner: SimulatedSpeaker::new("gated", SpeakerType::Speaker, SpeakerSettings::new(10, false)),
            entered: std::sync::Mutex::new(Some(entered_tx)),
            release: std::sync::Mutex::new(release_rx),
        });
        let (manager, _store) = spawn_with(vec![gated.clone()]);

        let in_flight = manager.set_volume(SpeakerType::Speaker, 20, false, Source::LocalApi);
        tokio::task::spawn_blocking(move || entered_rx.recv())
            .await
            .unwrap()
            .unwrap();

        let queued: Vec<_> = (0..10)
            .map(|i| manager.set_volume(SpeakerType::Speaker, 30 + i, false, Source::LocalApi))
            .collect();

        let stopper = manager.clone();
        let shutdown = tokio::spawn(async move { stopper.shutdown().await });
        while manager.is_accepting() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        release_tx.send(()).unwrap();

        shutdown.await.unwrap().unwrap();
        assert_eq!(in_flight.await.unwrap().volume, 20);
        for pending in queued {
            assert!(matches!(pending.await, Err(SpeakerError::ShutDown)));
        }
        assert_eq!(gated.inner.raw_settings().volume, 20);
    }

    #[tokio::test]
    async fn test_invalid_config_rejected() {
        let (sender, _events) = ChannelEventSender::new();
        let result = SpeakerManager::spawn(
            Vec::new(),
            EngineConfig::default().with_min_unmute_volume(0),
            Arc::new(InMemoryContextStore::new()),
            Arc::new(sender),
        );
        assert!(matches!(result, Err(SpeakerError::Validation(_))));
    }

    #[test]
    fn test_blocking_wait_from_plain_thread() {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        let speaker = simulated(10);
        let manager = {
            let _guard = runtime.enter();
            spawn_with(vec![speaker.clone()]).0
        };

        let settings = manager
            .set_volume(SpeakerType::Speaker, 44, false, Source::LocalApi)
            .blocking_wait()
            .unwrap();
        assert_eq!(settings.volume, 44);
        assert_eq!(speaker.raw_settings().volume, 44);
    }
}
