//! Observable player state

use clrartwork::Artwork;
use serde::{Deserialize, Serialize};
use std::fmt;
use url::Url;

/// Separator between artist and title in the display label.
pub const LABEL_SEPARATOR: &str = " — ";

/// Stable key of a playable stream.
///
/// On-demand shows use their access URL; the live stream uses the fixed
/// sentinel [`StreamId::LIVE`]. Only compared, never dereferenced.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StreamId(String);

impl StreamId {
    pub const LIVE: &'static str = "live";

    pub fn new(id: impl Into<String>) -> Self {
        StreamId(id.into())
    }

    pub fn live() -> Self {
        StreamId(Self::LIVE.to_string())
    }

    pub fn from_url(url: &Url) -> Self {
        StreamId(url.as_str().to_string())
    }

    pub fn is_live(&self) -> bool {
        self.0 == Self::LIVE
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StreamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for StreamId {
    fn from(value: &str) -> Self {
        StreamId::new(value)
    }
}

impl From<String> for StreamId {
    fn from(value: String) -> Self {
        StreamId(value)
    }
}

/// State of the single active stream.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PlaybackState {
    #[default]
    Idle,
    PreparingLive,
    LivePlaying,
    LivePaused,
    PreparingShow(StreamId),
    ShowPlaying(StreamId),
    ShowPaused(StreamId),
}

impl PlaybackState {
    pub fn preparing(stream: StreamId) -> Self {
        if stream.is_live() {
            PlaybackState::PreparingLive
        } else {
            PlaybackState::PreparingShow(stream)
        }
    }

    pub fn playing(stream: StreamId) -> Self {
        if stream.is_live() {
            PlaybackState::LivePlaying
        } else {
            PlaybackState::ShowPlaying(stream)
        }
    }

    pub fn paused(stream: StreamId) -> Self {
        if stream.is_live() {
            PlaybackState::LivePaused
        } else {
            PlaybackState::ShowPaused(stream)
        }
    }

    pub fn is_playing(&self) -> bool {
        matches!(
            self,
            PlaybackState::LivePlaying | PlaybackState::ShowPlaying(_)
        )
    }

    pub fn is_paused(&self) -> bool {
        matches!(self, PlaybackState::LivePaused | PlaybackState::ShowPaused(_))
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, PlaybackState::Idle)
    }

    /// Stream the state refers to, `None` only when idle.
    pub fn stream(&self) -> Option<StreamId> {
        match self {
            PlaybackState::Idle => None,
            PlaybackState::PreparingLive
            | PlaybackState::LivePlaying
            | PlaybackState::LivePaused => Some(StreamId::live()),
            PlaybackState::PreparingShow(id)
            | PlaybackState::ShowPlaying(id)
            | PlaybackState::ShowPaused(id) => Some(id.clone()),
        }
    }

    pub fn is_on(&self, stream: &StreamId) -> bool {
        self.stream().as_ref() == Some(stream)
    }
}

/// Best-effort description of what is on air.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TrackMetadata {
    pub title: Option<String>,
    pub artist: Option<String>,
    pub display_label: Option<String>,
}

impl TrackMetadata {
    pub fn new(title: Option<String>, artist: Option<String>) -> Self {
        let display_label = match (&artist, &title) {
            (Some(artist), Some(title)) => Some(format!("{}{}{}", artist, LABEL_SEPARATOR, title)),
            (Some(artist), None) => Some(artist.clone()),
            (None, Some(title)) => Some(title.clone()),
            (None, None) => None,
        };
        Self {
            title,
            artist,
            display_label,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.artist.is_none()
    }
}

/// Transient position readout after a confirmed seek.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SeekState {
    pub current_position_seconds: Option<f64>,
}

/// Everything an observer of the player can see.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PlayerSnapshot {
    pub state: PlaybackState,
    pub is_playing: bool,
    pub current_stream: Option<StreamId>,
    pub track: TrackMetadata,
    /// `None` until a lookup for the current stream has resolved.
    pub artwork: Option<Artwork>,
    pub seek: SeekState,
    pub current_time: Option<f64>,
    pub duration: Option<f64>,
}

impl PlayerSnapshot {
    pub fn track_label(&self) -> Option<&str> {
        self.track.display_label.as_deref()
    }

    /// Identifier of the on-demand show being played, prepared or paused.
    pub fn playing_show_id(&self) -> Option<&StreamId> {
        match &self.state {
            PlaybackState::PreparingShow(id)
            | PlaybackState::ShowPlaying(id)
            | PlaybackState::ShowPaused(id) => Some(id),
            _ => None,
        }
    }
}

/// Change notifications derived from consecutive snapshots.
#[derive(Debug, Clone, PartialEq)]
pub enum PlayerEvent {
    StateChanged {
        state: PlaybackState,
        is_playing: bool,
    },
    TrackChanged {
        track: TrackMetadata,
    },
    ArtworkChanged {
        artwork: Option<Artwork>,
    },
    SeekReadout {
        position: Option<f64>,
    },
}
