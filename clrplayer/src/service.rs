//! Player service
//!
//! Runs a [`PlaybackEngine`] as the single task owning all playback state.
//! Callers talk to it through a cloneable [`PlayerHandle`]; every request
//! resolves once the engine has applied it, with the resulting snapshot.

use crate::engine::{EngineInputs, PlaybackEngine, PlayerCommand};
use crate::errors::{PlayerError, Result};
use crate::events::PlayerEventBus;
use crate::model::{PlayerEvent, PlayerSnapshot, StreamId};
use std::time::Duration;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

struct Request {
    command: PlayerCommand,
    reply: oneshot::Sender<PlayerSnapshot>,
}

#[derive(Clone)]
pub struct PlayerHandle {
    commands: mpsc::Sender<Request>,
    snapshots: watch::Receiver<PlayerSnapshot>,
    events: PlayerEventBus,
}

impl PlayerHandle {
    pub async fn send(&self, command: PlayerCommand) -> Result<PlayerSnapshot> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(Request { command, reply })
            .await
            .map_err(|_| PlayerError::ServiceStopped)?;
        response.await.map_err(|_| PlayerError::ServiceStopped)
    }

    pub async fn play_live(&self) -> Result<PlayerSnapshot> {
        self.send(PlayerCommand::PlayLive).await
    }

    pub async fn pause(&self) -> Result<PlayerSnapshot> {
        self.send(PlayerCommand::Pause).await
    }

    pub async fn stop(&self) -> Result<PlayerSnapshot> {
        self.send(PlayerCommand::Stop).await
    }

    pub async fn toggle(&self) -> Result<PlayerSnapshot> {
        self.send(PlayerCommand::Toggle).await
    }

    pub async fn play_stream(&self, id: StreamId) -> Result<PlayerSnapshot> {
        self.send(PlayerCommand::PlayStream(id)).await
    }

    pub async fn toggle_stream(&self, id: StreamId) -> Result<PlayerSnapshot> {
        self.send(PlayerCommand::ToggleStream(id)).await
    }

    pub async fn restore_live(&self) -> Result<PlayerSnapshot> {
        self.send(PlayerCommand::RestoreLive).await
    }

    pub async fn seek_by(&self, delta_seconds: f64) -> Result<PlayerSnapshot> {
        self.send(PlayerCommand::SeekBy(delta_seconds)).await
    }

    pub async fn seek_forward(&self) -> Result<PlayerSnapshot> {
        self.send(PlayerCommand::SeekForward).await
    }

    pub async fn seek_backward(&self) -> Result<PlayerSnapshot> {
        self.send(PlayerCommand::SeekBackward).await
    }

    /// Stop playback and end the service task.
    pub async fn shutdown(&self) -> Result<PlayerSnapshot> {
        self.send(PlayerCommand::Shutdown).await
    }

    /// Latest published snapshot.
    pub fn snapshot(&self) -> PlayerSnapshot {
        self.snapshots.borrow().clone()
    }

    pub fn watch(&self) -> watch::Receiver<PlayerSnapshot> {
        self.snapshots.clone()
    }

    pub fn subscribe_events(&self) -> crossbeam_channel::Receiver<PlayerEvent> {
        self.events.subscribe()
    }
}

/// Next value of an optional broadcast subscription.
///
/// Lag is logged and skipped. A closed channel empties the slot.
async fn next_broadcast<T: Clone>(slot: &mut Option<broadcast::Receiver<T>>) -> Option<T> {
    loop {
        let result = match slot.as_mut() {
            Some(receiver) => receiver.recv().await,
            None => return None,
        };
        match result {
            Ok(value) => return Some(value),
            Err(RecvError::Lagged(skipped)) => {
                warn!(skipped, "Collaborator events lagged");
            }
            Err(RecvError::Closed) => {
                *slot = None;
                return None;
            }
        }
    }
}

impl PlaybackEngine {
    /// Build an engine and run it on its own task.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn spawn(inputs: EngineInputs) -> (PlayerHandle, JoinHandle<()>) {
        let (tx, mut rx) = mpsc::channel::<Request>(32);
        let mut engine = PlaybackEngine::new(inputs);

        let handle = PlayerHandle {
            commands: tx,
            snapshots: engine.watch(),
            events: engine.events().clone(),
        };

        let join_handle = tokio::spawn(async move {
            info!("Starting player service");

            let mut session_events = Some(engine.subscribe_session_events());
            let mut remote_commands = Some(engine.subscribe_remote_commands());
            let period = engine.settings().position_refresh.max(Duration::from_millis(10));
            let mut refresh = tokio::time::interval(period);
            refresh.set_missed_tick_behavior(MissedTickBehavior::Skip);

            if engine.settings().prepare_live_on_start {
                engine.restore_live();
            }

            loop {
                let session_open = session_events.is_some();
                let remote_open = remote_commands.is_some();

                tokio::select! {
                    request = rx.recv() => {
                        let Some(Request { command, reply }) = request else {
                            debug!("All player handles dropped");
                            break;
                        };
                        let shutdown = command == PlayerCommand::Shutdown;
                        engine.apply(command);
                        let _ = reply.send(engine.snapshot());
                        if shutdown {
                            break;
                        }
                    }
                    Some(message) = engine.next_message() => {
                        engine.handle_message(message);
                    }
                    Some(event) = next_broadcast(&mut session_events), if session_open => {
                        engine.handle_session_event(event);
                    }
                    Some(command) = next_broadcast(&mut remote_commands), if remote_open => {
                        engine.handle_remote_command(command);
                    }
                    _ = refresh.tick() => {
                        engine.refresh_position();
                    }
                }
            }

            engine.stop();
            drop(session_events);
            info!("Player service stopped");
        });

        (handle, join_handle)
    }
}
