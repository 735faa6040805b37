//! "Now playing" OS integration
//!
//! Outbound: fire-and-forget updates describing the current stream.
//! Inbound: remote transport commands, handled like local ones.

use crate::model::PlayerSnapshot;
use clrartwork::Artwork;
use tokio::sync::broadcast;

#[derive(Debug, Clone, PartialEq)]
pub struct NowPlayingInfo {
    /// Track label, or the stream identifier when nothing is known yet.
    pub title: String,
    pub artwork: Option<Artwork>,
    /// 1.0 while playing, 0.0 otherwise.
    pub playback_rate: f32,
    pub elapsed: f64,
    pub duration: Option<f64>,
}

impl NowPlayingInfo {
    /// `None` when no stream is active.
    pub fn from_snapshot(snapshot: &PlayerSnapshot) -> Option<Self> {
        let stream = snapshot.current_stream.as_ref()?;
        Some(Self {
            title: snapshot
                .track_label()
                .map(str::to_string)
                .unwrap_or_else(|| stream.to_string()),
            artwork: snapshot.artwork.clone(),
            playback_rate: if snapshot.is_playing { 1.0 } else { 0.0 },
            elapsed: snapshot.current_time.unwrap_or(0.0),
            duration: snapshot.duration,
        })
    }
}

pub trait NowPlayingCenter: Send + Sync {
    fn update(&self, info: NowPlayingInfo);

    fn clear(&self);

    /// Remote play/pause/toggle requests. Dropping the receiver unsubscribes.
    fn subscribe_commands(&self) -> broadcast::Receiver<RemoteCommand>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteCommand {
    Play,
    Pause,
    Toggle,
}
