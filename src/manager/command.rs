//! Manager commands: work items queued for the single manager worker

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::sync::oneshot;

use crate::error::{Result, SpeakerError};
use crate::notify::{ObserverId, SpeakerObserver};
use crate::speaker::{Source, Speaker, SpeakerSettings, SpeakerType};

pub(crate) type Reply<T> = oneshot::Sender<Result<T>>;

/// Commands drained in FIFO order by the manager worker
pub(crate) enum ManagerCommand {
    SetVolume {
        speaker_type: SpeakerType,
        volume: i32,
        force_no_notifications: bool,
        source: Source,
        reply: Reply<SpeakerSettings>,
    },
    AdjustVolume {
        speaker_type: SpeakerType,
        delta: i32,
        force_no_notifications: bool,
        source: Source,
        reply: Reply<SpeakerSettings>,
    },
    SetMute {
        speaker_type: SpeakerType,
        mute: bool,
        force_no_notifications: bool,
        source: Source,
        reply: Reply<SpeakerSettings>,
    },
    GetSettings {
        speaker_type: SpeakerType,
        reply: Reply<SpeakerSettings>,
    },
    AddSpeaker {
        speaker: Arc<dyn Speaker>,
        reply: Reply<()>,
    },
    AddObserver {
        observer: Arc<dyn SpeakerObserver>,
        reply: Reply<ObserverId>,
    },
    RemoveObserver {
        id: ObserverId,
        reply: Reply<bool>,
    },
    /// Resolves once every earlier command has completed
    Flush { reply: Reply<()> },
    /// Stop after every earlier command has completed
    Shutdown,
}

impl ManagerCommand {
    pub(crate) fn name(&self) -> &'static str {
        match self {
            ManagerCommand::SetVolume { .. } => "set_volume",
            ManagerCommand::AdjustVolume { .. } => "adjust_volume",
            ManagerCommand::SetMute { .. } => "set_mute",
            ManagerCommand::GetSettings { .. } => "get_settings",
            ManagerCommand::AddSpeaker { .. } => "add_speaker",
            ManagerCommand::AddObserver { .. } => "add_observer",
            ManagerCommand::RemoveObserver { .. } => "remove_observer",
            ManagerCommand::Flush { .. } => "flush",
            ManagerCommand::Shutdown => "shutdown",
        }
    }
}

/// Deferred result of a queued command.
///
/// Await it, block on it with [`Pending::blocking_wait`], or drop it; the
/// command runs either way.
#[must_use = "the command runs regardless, but its result is lost if the handle is dropped"]
#[derive(Debug)]
pub struct Pending<T> {
    rx: oneshot::Receiver<Result<T>>,
}

impl<T> Pending<T> {
    pub(crate) fn channel() -> (Reply<T>, Self) {
        let (tx, rx) = oneshot::channel();
        (tx, Self { rx })
    }

    /// A handle that is already resolved, used when a command is refused
    pub(crate) fn ready(result: Result<T>) -> Self {
        let (tx, pending) = Self::channel();
        let _ = tx.send(result);
        pending
    }

    /// Block the current thread until the command completes.
    ///
    /// Must not be called from inside an async runtime worker.
    pub fn blocking_wait(self) -> Result<T> {
        self.rx
            .blocking_recv()
            .unwrap_or(Err(SpeakerError::WorkerGone))
    }
}

impl<T> Future for Pending<T> {
    type Output = Result<T>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.rx)
            .poll(cx)
            .map(|received| received.unwrap_or(Err(SpeakerError::WorkerGone)))
    }
}
