use std::process::{ExitStatus, Stdio};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::process::{Child, Command};
use tokio::sync::oneshot;

use super::{EndedObserver, FailureObserver, PlaybackResource, ResourceProvider};
use crate::{config::PlayerConfig, DashError, Result};

/// Plays clips by launching a command line player with the clip locator as
/// its final argument.
#[derive(Debug, Clone)]
pub struct ExternalPlayer {
    program: String,
    args: Vec<String>,
    startup_grace: Duration,
}

impl ExternalPlayer {
    pub fn new(command: &[String], startup_grace: Duration) -> Result<Self> {
        let (program, args) = command
            .split_first()
            .filter(|(program, _)| !program.trim().is_empty())
            .ok_or_else(|| DashError::Config("player command is empty".into()))?;

        Ok(Self {
            program: program.clone(),
            args: args.to_vec(),
            startup_grace,
        })
    }

    pub fn from_config(config: &PlayerConfig) -> Result<Self> {
        Self::new(
            &config.command,
            Duration::from_millis(config.startup_grace_ms),
        )
    }

    pub fn program(&self) -> &str {
        &self.program
    }
}

impl ResourceProvider for ExternalPlayer {
    fn acquire(&self, locator: &str) -> Result<Arc<dyn PlaybackResource>> {
        Ok(Arc::new(ExternalPlayerResource {
            player: self.clone(),
            locator: locator.to_string(),
            inner: Arc::new(Mutex::new(Inner::default())),
        }))
    }
}

#[derive(Default)]
struct Inner {
    ended: Option<EndedObserver>,
    failure: Option<FailureObserver>,
    kill: Option<oneshot::Sender<()>>,
    started: bool,
    stopped: bool,
}

/// One player process. Pausing terminates the process; it cannot resume.
pub struct ExternalPlayerResource {
    player: ExternalPlayer,
    locator: String,
    inner: Arc<Mutex<Inner>>,
}

enum Startup {
    Running,
    Exited(std::io::Result<ExitStatus>),
    Interrupted,
}

impl ExternalPlayerResource {
    pub fn locator(&self) -> &str {
        &self.locator
    }

    fn spawn(&self) -> Result<Child> {
        Command::new(&self.player.program)
            .args(&self.player.args)
            .arg(&self.locator)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|err| {
                DashError::playback(format!("failed to launch `{}`: {err}", self.player.program))
            })
    }
}

#[async_trait]
impl PlaybackResource for ExternalPlayerResource {
    async fn start(&self) -> Result<()> {
        let (kill_tx, mut kill_rx) = oneshot::channel();
        {
            let mut inner = self.inner.lock();
            if inner.stopped {
                return Err(DashError::playback("playback interrupted"));
            }
            if inner.started {
                return Err(DashError::playback("player already started"));
            }
            inner.started = true;
            inner.kill = Some(kill_tx);
        }

        let mut child = self.spawn()?;
        tracing::debug!(program = %self.player.program, locator = %self.locator, "player launched");

        let startup = tokio::select! {
            status = child.wait() => Startup::Exited(status),
            _ = &mut kill_rx => Startup::Interrupted,
            _ = tokio::time::sleep(self.player.startup_grace) => Startup::Running,
        };

        match startup {
            Startup::Running => {
                tokio::spawn(supervise(child, kill_rx, self.inner.clone()));
                Ok(())
            }
            Startup::Interrupted => {
                let _ = child.kill().await;
                Err(DashError::playback("playback interrupted"))
            }
            Startup::Exited(Ok(status)) if status.success() => {
                // Clip shorter than the grace period: report the start, then
                // the end, in that order.
                let inner = self.inner.clone();
                tokio::spawn(async move {
                    let ended = inner.lock().take_ended();
                    if let Some(observer) = ended {
                        observer();
                    }
                });
                Ok(())
            }
            Startup::Exited(Ok(status)) => Err(DashError::playback(exit_message(status))),
            Startup::Exited(Err(err)) => Err(DashError::Io(err)),
        }
    }

    fn pause(&self) -> Result<()> {
        let mut inner = self.inner.lock();
        inner.stopped = true;
        if let Some(kill) = inner.kill.take() {
            let _ = kill.send(());
        }
        Ok(())
    }

    fn detach_source(&self) -> Result<()> {
        let mut inner = self.inner.lock();
        inner.stopped = true;
        inner.ended = None;
        inner.failure = None;
        Ok(())
    }

    fn on_ended(&self, observer: EndedObserver) {
        self.inner.lock().ended = Some(observer);
    }

    fn on_failure(&self, observer: FailureObserver) {
        self.inner.lock().failure = Some(observer);
    }
}

impl Inner {
    /// Observers are one-shot: firing either discards both.
    fn take_ended(&mut self) -> Option<EndedObserver> {
        self.failure = None;
        self.ended.take()
    }

    fn take_failure(&mut self) -> Option<FailureObserver> {
        self.ended = None;
        self.failure.take()
    }
}

/// Waits for the player to exit (or to be told to stop) and notifies the
/// registered observer. Observers run without the lock held.
async fn supervise(mut child: Child, kill_rx: oneshot::Receiver<()>, inner: Arc<Mutex<Inner>>) {
    let status = tokio::select! {
        status = child.wait() => status,
        _ = kill_rx => {
            if let Err(err) = child.kill().await {
                tracing::warn!(error = %err, "failed to terminate player process");
            }
            return;
        }
    };

    match status {
        Ok(status) if status.success() => {
            let observer = inner.lock().take_ended();
            if let Some(observer) = observer {
                observer();
            }
        }
        Ok(status) => {
            let observer = inner.lock().take_failure();
            if let Some(observer) = observer {
                observer(exit_message(status));
            }
        }
        Err(err) => {
            let observer = inner.lock().take_failure();
            if let Some(observer) = observer {
                observer(format!("lost track of player process: {err}"));
            }
        }
    }
}

fn exit_message(status: ExitStatus) -> String {
    match status.code() {
        Some(code) => format!("player exited with status {code}"),
        None => "player was terminated by a signal".to_string(),
    }
}
