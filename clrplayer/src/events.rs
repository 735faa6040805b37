//! Player event bus and snapshot diffing

use std::sync::{Arc, Mutex};

use crossbeam_channel::{unbounded, Receiver, Sender};

use crate::model::{PlayerEvent, PlayerSnapshot};

#[derive(Clone, Default)]
pub struct PlayerEventBus {
    subscribers: Arc<Mutex<Vec<Sender<PlayerEvent>>>>,
}

impl PlayerEventBus {
    pub fn new() -> Self {
        Self {
            subscribers: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn subscribe(&self) -> Receiver<PlayerEvent> {
        let (tx, rx) = unbounded::<PlayerEvent>();
        if let Ok(mut subscribers) = self.subscribers.lock() {
            subscribers.push(tx);
        }
        rx
    }

    pub fn broadcast(&self, event: PlayerEvent) {
        if let Ok(mut subscribers) = self.subscribers.lock() {
            subscribers.retain(|tx| tx.send(event.clone()).is_ok());
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().map(|s| s.len()).unwrap_or(0)
    }
}

/// Events describing how `next` differs from `previous`, in a fixed order.
pub fn diff_snapshots(previous: &PlayerSnapshot, next: &PlayerSnapshot) -> Vec<PlayerEvent> {
    let mut events = Vec::new();

    if previous.state != next.state || previous.is_playing != next.is_playing {
        events.push(PlayerEvent::StateChanged {
            state: next.state.clone(),
            is_playing: next.is_playing,
        });
    }
    if previous.track != next.track {
        events.push(PlayerEvent::TrackChanged {
            track: next.track.clone(),
        });
    }
    if previous.artwork != next.artwork {
        events.push(PlayerEvent::ArtworkChanged {
            artwork: next.artwork.clone(),
        });
    }
    if previous.seek != next.seek {
        events.push(PlayerEvent::SeekReadout {
            position: next.seek.current_position_seconds,
        });
    }

    events
}
