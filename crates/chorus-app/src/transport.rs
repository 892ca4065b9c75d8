//! Transport that plays local files through an external player process.

use std::path::Path;
use std::process::Stdio;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chorus_core::{Error, Result};
use chorus_player::{OwnerId, Transport, TransportEvent};
use parking_lot::Mutex;
use tokio::process::Command;
use tokio::sync::{broadcast, oneshot};
use tracing::{debug, info, warn};

/// The player process currently running, if any.
struct Running {
    generation: u64,
    kill: oneshot::Sender<()>,
}

struct Shared {
    current: Mutex<Option<Running>>,
    events: broadcast::Sender<TransportEvent>,
}

impl Shared {
    /// Kill the running player, if any, without reporting it as finished.
    fn halt(&self) -> bool {
        match self.current.lock().take() {
            Some(running) => {
                let _ = running.kill.send(());
                true
            }
            None => false,
        }
    }
}

pub struct ProcessTransport {
    owner: OwnerId,
    command: Vec<String>,
    connected: AtomicBool,
    generation: AtomicU64,
    shared: Arc<Shared>,
}

impl ProcessTransport {
    pub fn new(owner: impl Into<OwnerId>, command: Vec<String>) -> Self {
        let (events, _) = broadcast::channel(16);
        Self {
            owner: owner.into(),
            command,
            connected: AtomicBool::new(false),
            generation: AtomicU64::new(0),
            shared: Arc::new(Shared {
                current: Mutex::new(None),
                events,
            }),
        }
    }

    /// Drop the connection, halting playback and notifying subscribers.
    pub fn disconnect(&self) {
        if !self.connected.swap(false, Ordering::SeqCst) {
            return;
        }
        self.shared.halt();
        info!(owner = %self.owner, "Transport disconnected");
        let _ = self.shared.events.send(TransportEvent::Disconnect);
    }
}

#[async_trait]
impl Transport for ProcessTransport {
    fn owner_id(&self) -> OwnerId {
        self.owner.clone()
    }

    async fn connect(&self) -> Result<()> {
        let Some(program) = self.command.first() else {
            return Err(Error::Configuration("player command is empty".to_string()));
        };
        self.connected.store(true, Ordering::SeqCst);
        debug!(owner = %self.owner, %program, "Transport connected");
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    async fn play(&self, path: &Path) -> Result<()> {
        if !self.is_connected() {
            return Err(Error::Transport("not connected".to_string()));
        }
        let (program, args) = self
            .command
            .split_first()
            .ok_or_else(|| Error::Configuration("player command is empty".to_string()))?;

        if self.shared.halt() {
            debug!(owner = %self.owner, "Replacing running player");
        }

        let mut child = Command::new(program)
            .args(args)
            .arg(path)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| Error::Transport(format!("failed to start {program}: {e}")))?;

        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let (kill, killed) = oneshot::channel();
        *self.shared.current.lock() = Some(Running { generation, kill });

        let shared = Arc::clone(&self.shared);
        let owner = self.owner.clone();
        tokio::spawn(async move {
            tokio::select! {
                status = child.wait() => {
                    let mut current = shared.current.lock();
                    // A newer play or a stop already took over.
                    if current.as_ref().is_some_and(|r| r.generation == generation) {
                        *current = None;
                        drop(current);
                        match status {
                            Ok(status) => debug!(%owner, %status, "Player exited"),
                            Err(e) => warn!(%owner, "Waiting on player failed: {e}"),
                        }
                        let _ = shared.events.send(TransportEvent::PlaybackFinished);
                    }
                }
                _ = killed => {
                    if let Err(e) = child.kill().await {
                        debug!(%owner, "Player already gone: {e}");
                    }
                }
            }
        });

        info!(owner = %self.owner, "Playing {}", path.display());
        Ok(())
    }

    async fn stop(&self) -> Result<()> {
        if self.shared.halt() {
            debug!(owner = %self.owner, "Player stopped");
        }
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<TransportEvent> {
        self.shared.events.subscribe()
    }
}
