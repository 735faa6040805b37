//! Playback engine
//!
//! [`PlaybackEngine`] is the single owner of the playback state, the track
//! metadata, the artwork and the one active media connection. Every
//! mutation goes through its methods and ends with a call to `publish`,
//! which pushes a fresh [`PlayerSnapshot`] to watchers, broadcasts the
//! derived [`PlayerEvent`]s and notifies the now-playing centre.
//!
//! Work that completes later (metadata batches, artwork lookups, seeks,
//! readout expiry) comes back through an internal inbox. Each message
//! carries the generation of the connection it was started for; the
//! generation is bumped on every stop and every new connection, so late
//! results for a superseded stream are dropped.

mod seek;

pub use seek::clamp_seek_target;

use crate::artwork::ArtworkSource;
use crate::config_ext::{
    PlayerConfigExt, DEFAULT_POSITION_REFRESH_MILLIS, DEFAULT_SEEK_HUD_MILLIS,
    DEFAULT_SEEK_STEP_SECONDS,
};
use crate::errors::{PlayerError, Result};
use crate::events::{diff_snapshots, PlayerEventBus};
use crate::media::{MediaBackend, MediaHandle, MetadataBatch};
use crate::metadata;
use crate::model::{PlaybackState, PlayerSnapshot, SeekState, StreamId, TrackMetadata};
use crate::now_playing::{NowPlayingCenter, NowPlayingInfo, RemoteCommand};
use crate::session::{AudioSession, RouteChangeReason, SessionCategory, SessionEvent};
use clrartwork::{Artwork, ArtworkClient, ArtworkConfigExt};
use clrconfig::Config;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use url::Url;

/// Tunables of the engine and its service loop.
#[derive(Debug, Clone)]
pub struct PlayerSettings {
    pub live_stream_url: Url,
    pub seek_step_seconds: f64,
    pub seek_hud: Duration,
    pub position_refresh: Duration,
    pub prepare_live_on_start: bool,
}

impl PlayerSettings {
    pub fn new(live_stream_url: Url) -> Self {
        Self {
            live_stream_url,
            seek_step_seconds: DEFAULT_SEEK_STEP_SECONDS as f64,
            seek_hud: Duration::from_millis(DEFAULT_SEEK_HUD_MILLIS),
            position_refresh: Duration::from_millis(DEFAULT_POSITION_REFRESH_MILLIS),
            prepare_live_on_start: false,
        }
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        let live = config.get_live_stream_url()?;
        let live_stream_url =
            Url::parse(&live).map_err(|e| PlayerError::InvalidStream(live.clone(), e))?;

        Ok(Self {
            live_stream_url,
            seek_step_seconds: config.get_seek_step_seconds()? as f64,
            seek_hud: Duration::from_millis(config.get_seek_hud_millis()?),
            position_refresh: Duration::from_millis(config.get_position_refresh_millis()?),
            prepare_live_on_start: config.get_prepare_live_on_start()?,
        })
    }
}

/// Collaborators and settings the engine is built from.
#[derive(Clone)]
pub struct EngineInputs {
    pub backend: Arc<dyn MediaBackend>,
    pub session: Arc<dyn AudioSession>,
    pub now_playing: Arc<dyn NowPlayingCenter>,
    /// `None` disables artwork lookups; artwork then stays absent.
    pub artwork: Option<Arc<dyn ArtworkSource>>,
    pub settings: PlayerSettings,
}

impl EngineInputs {
    /// Settings and artwork client from configuration, collaborators from the caller.
    pub fn from_config(
        config: &Config,
        backend: Arc<dyn MediaBackend>,
        session: Arc<dyn AudioSession>,
        now_playing: Arc<dyn NowPlayingCenter>,
    ) -> Result<Self> {
        let artwork: Option<Arc<dyn ArtworkSource>> = if config.get_artwork_enabled()? {
            Some(Arc::new(ArtworkClient::from_config(config)?))
        } else {
            info!("Artwork lookup disabled by configuration");
            None
        };

        Ok(Self {
            backend,
            session,
            now_playing,
            artwork,
            settings: PlayerSettings::from_config(config)?,
        })
    }
}

/// Operations accepted by the engine, from the UI or the service handle.
#[derive(Debug, Clone, PartialEq)]
pub enum PlayerCommand {
    PlayLive,
    Pause,
    Stop,
    Toggle,
    PlayStream(StreamId),
    ToggleStream(StreamId),
    RestoreLive,
    SeekBy(f64),
    SeekForward,
    SeekBackward,
    Shutdown,
}

/// Results posted back to the engine by its background tasks.
#[derive(Debug)]
pub(crate) enum EngineMessage {
    Metadata {
        generation: u64,
        batch: MetadataBatch,
    },
    Artwork {
        generation: u64,
        artwork: Artwork,
    },
    SeekCompleted {
        generation: u64,
        token: u64,
        target: f64,
        finished: bool,
    },
    SeekHudExpired {
        token: u64,
    },
}

struct Connection {
    stream: StreamId,
    handle: Arc<dyn MediaHandle>,
    metadata_task: JoinHandle<()>,
}

/// What the now-playing centre has last been told about.
#[derive(Debug, Clone, PartialEq)]
struct NowPlayingKey {
    is_playing: bool,
    label: Option<String>,
    stream: Option<StreamId>,
    artwork: Option<Artwork>,
}

impl NowPlayingKey {
    fn of(snapshot: &PlayerSnapshot) -> Self {
        Self {
            is_playing: snapshot.is_playing,
            label: snapshot.track.display_label.clone(),
            stream: snapshot.current_stream.clone(),
            artwork: snapshot.artwork.clone(),
        }
    }
}

pub struct PlaybackEngine {
    backend: Arc<dyn MediaBackend>,
    session: Arc<dyn AudioSession>,
    now_playing: Arc<dyn NowPlayingCenter>,
    artwork_source: Option<Arc<dyn ArtworkSource>>,
    settings: PlayerSettings,

    state: PlaybackState,
    track: TrackMetadata,
    artwork: Option<Artwork>,
    seek: SeekState,
    connection: Option<Connection>,

    generation: u64,
    seek_token: u64,
    readout_token: u64,
    resume_after_interruption: bool,
    last_now_playing: NowPlayingKey,

    inbox_tx: mpsc::UnboundedSender<EngineMessage>,
    inbox_rx: mpsc::UnboundedReceiver<EngineMessage>,
    snapshot_tx: watch::Sender<PlayerSnapshot>,
    events: PlayerEventBus,
}

impl PlaybackEngine {
    pub fn new(inputs: EngineInputs) -> Self {
        if let Err(e) = inputs.session.configure(SessionCategory::Playback) {
            warn!("Audio session configuration failed: {}", e);
        }

        let (inbox_tx, inbox_rx) = mpsc::unbounded_channel();
        let initial = PlayerSnapshot::default();
        let last_now_playing = NowPlayingKey::of(&initial);
        let (snapshot_tx, _) = watch::channel(initial);

        Self {
            backend: inputs.backend,
            session: inputs.session,
            now_playing: inputs.now_playing,
            artwork_source: inputs.artwork,
            settings: inputs.settings,
            state: PlaybackState::Idle,
            track: TrackMetadata::default(),
            artwork: None,
            seek: SeekState::default(),
            connection: None,
            generation: 0,
            seek_token: 0,
            readout_token: 0,
            resume_after_interruption: false,
            last_now_playing,
            inbox_tx,
            inbox_rx,
            snapshot_tx,
            events: PlayerEventBus::new(),
        }
    }

    // ========================================================================
    // Observation
    // ========================================================================

    pub fn state(&self) -> &PlaybackState {
        &self.state
    }

    pub fn is_playing(&self) -> bool {
        self.state.is_playing()
    }

    pub fn current_stream(&self) -> Option<StreamId> {
        self.state.stream()
    }

    pub fn settings(&self) -> &PlayerSettings {
        &self.settings
    }

    pub fn snapshot(&self) -> PlayerSnapshot {
        self.snapshot_tx.borrow().clone()
    }

    pub fn watch(&self) -> watch::Receiver<PlayerSnapshot> {
        self.snapshot_tx.subscribe()
    }

    pub fn events(&self) -> &PlayerEventBus {
        &self.events
    }

    pub(crate) fn subscribe_session_events(&self) -> broadcast::Receiver<SessionEvent> {
        self.session.subscribe_events()
    }

    pub(crate) fn subscribe_remote_commands(&self) -> broadcast::Receiver<RemoteCommand> {
        self.now_playing.subscribe_commands()
    }

    // ========================================================================
    // Transport operations
    // ========================================================================

    pub fn apply(&mut self, command: PlayerCommand) {
        debug!(?command, "Applying player command");
        match command {
            PlayerCommand::PlayLive => self.play_live(),
            PlayerCommand::Pause => self.pause(),
            PlayerCommand::Stop | PlayerCommand::Shutdown => self.stop(),
            PlayerCommand::Toggle => self.toggle(),
            PlayerCommand::PlayStream(id) => self.play_stream(id),
            PlayerCommand::ToggleStream(id) => self.toggle_stream(id),
            PlayerCommand::RestoreLive => self.restore_live(),
            PlayerCommand::SeekBy(delta) => self.seek_by(delta),
            PlayerCommand::SeekForward => self.seek_forward(),
            PlayerCommand::SeekBackward => self.seek_backward(),
        }
    }

    /// Start the live stream, or resume whatever connection is open.
    pub fn play_live(&mut self) {
        self.resume_after_interruption = false;

        let existing = self
            .connection
            .as_ref()
            .map(|c| (c.stream.clone(), c.handle.clone()));

        match existing {
            None => self.connect(StreamId::live(), true),
            Some((stream, handle)) => {
                self.activate_session();
                handle.play();
                self.state = PlaybackState::playing(stream);
                info!(stream = %self.state_stream(), "Playback resumed");
            }
        }

        self.publish();
    }

    pub fn pause(&mut self) {
        self.resume_after_interruption = false;
        self.pause_connection();
    }

    /// Release the connection and forget everything about the stream.
    pub fn stop(&mut self) {
        self.resume_after_interruption = false;
        self.disconnect();
        self.generation += 1;
        self.state = PlaybackState::Idle;
        self.track = TrackMetadata::default();
        self.artwork = None;
        self.seek = SeekState::default();
        self.publish();
    }

    pub fn toggle(&mut self) {
        if self.state.is_playing() {
            self.pause();
        } else {
            self.play_live();
        }
    }

    /// Switch to `id`.
    ///
    /// No-op if `id` is already playing, resumes if it is paused, and
    /// otherwise stops before opening a fresh connection.
    pub fn play_stream(&mut self, id: StreamId) {
        if self.state.is_on(&id) {
            if self.state.is_playing() {
                debug!(stream = %id, "Already playing");
                return;
            }
            if self.state.is_paused() && self.connection.is_some() {
                self.play_live();
                return;
            }
        }

        self.stop();
        self.connect(id, true);
        self.publish();
    }

    /// Stop `id` if it is what is playing, otherwise play it.
    pub fn toggle_stream(&mut self, id: StreamId) {
        if self.state.is_on(&id) && self.state.is_playing() {
            self.stop();
        } else {
            self.play_stream(id);
        }
    }

    /// Leave the live stream armed but silent.
    pub fn restore_live(&mut self) {
        if self.state.is_on(&StreamId::live()) {
            self.pause();
            return;
        }

        self.stop();
        self.connect(StreamId::live(), false);
        self.publish();
    }

    // ========================================================================
    // Collaborator events
    // ========================================================================

    pub fn handle_session_event(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::InterruptionBegan => {
                if self.state.is_playing() {
                    info!("Audio interrupted, pausing");
                    self.pause_connection();
                    self.resume_after_interruption = true;
                }
            }
            SessionEvent::InterruptionEnded { should_resume } => {
                let interrupted = std::mem::take(&mut self.resume_after_interruption);
                if interrupted && should_resume {
                    info!("Interruption ended, resuming");
                    self.play_live();
                } else {
                    debug!(interrupted, should_resume, "Interruption ended");
                }
            }
            SessionEvent::RouteChanged(RouteChangeReason::OldDeviceUnavailable) => {
                if self.state.is_playing() {
                    info!("Audio output lost, pausing");
                    self.pause();
                }
            }
            SessionEvent::RouteChanged(reason) => {
                debug!(?reason, "Audio route changed");
            }
            SessionEvent::EnteredBackground => {
                debug!("Entered background");
            }
            SessionEvent::EnteredForeground => {
                debug!("Entered foreground");
                let snapshot = self.build_snapshot();
                self.notify_now_playing(&snapshot, true);
            }
        }
    }

    pub fn handle_remote_command(&mut self, command: RemoteCommand) {
        debug!(?command, "Remote command");
        match command {
            RemoteCommand::Play => self.play_live(),
            RemoteCommand::Pause => self.pause(),
            RemoteCommand::Toggle => self.toggle(),
        }
    }

    /// Re-sample the position of the active connection.
    pub fn refresh_position(&mut self) {
        if self.connection.is_some() {
            self.publish();
        }
    }

    pub(crate) async fn next_message(&mut self) -> Option<EngineMessage> {
        self.inbox_rx.recv().await
    }

    pub(crate) fn handle_message(&mut self, message: EngineMessage) {
        match message {
            EngineMessage::Metadata { generation, batch } => self.on_metadata(generation, batch),
            EngineMessage::Artwork {
                generation,
                artwork,
            } => self.on_artwork(generation, artwork),
            EngineMessage::SeekCompleted {
                generation,
                token,
                target,
                finished,
            } => self.on_seek_completed(generation, token, target, finished),
            EngineMessage::SeekHudExpired { token } => self.on_seek_hud_expired(token),
        }
    }

    // ========================================================================
    // Internals
    // ========================================================================

    fn state_stream(&self) -> String {
        self.state
            .stream()
            .map(|s| s.to_string())
            .unwrap_or_default()
    }

    fn is_current(&self, generation: u64) -> bool {
        generation == self.generation
    }

    fn activate_session(&self) {
        if let Err(e) = self.session.activate() {
            warn!("Audio session activation failed: {}", e);
        }
    }

    fn stream_url(&self, stream: &StreamId) -> Result<Url> {
        if stream.is_live() {
            return Ok(self.settings.live_stream_url.clone());
        }
        Url::parse(stream.as_str()).map_err(|e| PlayerError::InvalidStream(stream.to_string(), e))
    }

    fn pause_connection(&mut self) {
        if !self.state.is_playing() {
            debug!(state = ?self.state, "Nothing to pause");
            return;
        }

        if let Some(connection) = &self.connection {
            connection.handle.pause();
        }
        if let Some(stream) = self.state.stream() {
            self.state = PlaybackState::paused(stream);
        }
        info!(stream = %self.state_stream(), "Playback paused");
        self.publish();
    }

    /// Open `stream`. The caller publishes.
    ///
    /// A stream that cannot be opened stays in its preparing state.
    fn connect(&mut self, stream: StreamId, auto_start: bool) {
        self.generation += 1;
        let generation = self.generation;
        self.state = PlaybackState::preparing(stream.clone());
        self.artwork = None;

        let url = match self.stream_url(&stream) {
            Ok(url) => url,
            Err(e) => {
                error!(stream = %stream, "Cannot play stream: {}", e);
                return;
            }
        };

        if auto_start {
            self.activate_session();
        }

        let handle = match self.backend.open(&url) {
            Ok(handle) => handle,
            Err(e) => {
                error!(stream = %stream, %url, "Unable to open stream: {}", e);
                return;
            }
        };

        let metadata_task = self.forward_metadata(&handle, generation);
        if auto_start {
            handle.play();
            self.state = PlaybackState::playing(stream.clone());
        }

        info!(stream = %stream, generation, auto_start, "Stream connected");
        self.connection = Some(Connection {
            stream,
            handle,
            metadata_task,
        });
    }

    fn disconnect(&mut self) {
        if let Some(connection) = self.connection.take() {
            connection.metadata_task.abort();
            connection.handle.pause();
            connection.handle.dispose();
            debug!(stream = %connection.stream, "Connection released");
        }
    }

    fn forward_metadata(&self, handle: &Arc<dyn MediaHandle>, generation: u64) -> JoinHandle<()> {
        let mut batches = handle.subscribe_metadata();
        let inbox = self.inbox_tx.clone();

        tokio::spawn(async move {
            while let Some(batch) = batches.recv().await {
                if inbox
                    .send(EngineMessage::Metadata { generation, batch })
                    .is_err()
                {
                    break;
                }
            }
        })
    }

    fn on_metadata(&mut self, generation: u64, batch: MetadataBatch) {
        if !self.is_current(generation) {
            debug!(generation, current = self.generation, "Dropping stale metadata");
            return;
        }

        let track = metadata::resolve(&batch);
        debug!(label = ?track.display_label, "Timed metadata");

        if let Some(title) = &track.title {
            self.fetch_artwork(generation, track.artist.clone(), title.clone());
        }

        self.track = track;
        self.publish();
    }

    fn fetch_artwork(&self, generation: u64, artist: Option<String>, title: String) {
        let Some(source) = self.artwork_source.clone() else {
            return;
        };
        let inbox = self.inbox_tx.clone();

        tokio::spawn(async move {
            let artwork = source.resolve(artist.as_deref(), &title).await;
            let _ = inbox.send(EngineMessage::Artwork {
                generation,
                artwork,
            });
        });
    }

    fn on_artwork(&mut self, generation: u64, artwork: Artwork) {
        if !self.is_current(generation) {
            debug!(generation, current = self.generation, "Dropping stale artwork");
            return;
        }

        debug!(?artwork, "Artwork resolved");
        self.artwork = Some(artwork);
        self.publish();
    }

    fn build_snapshot(&self) -> PlayerSnapshot {
        let (current_time, duration) = match &self.connection {
            Some(connection) => (
                Some(connection.handle.current_position()).filter(|t| t.is_finite()),
                connection
                    .handle
                    .duration()
                    .filter(|d| d.is_finite() && *d > 0.0),
            ),
            None => (None, None),
        };

        PlayerSnapshot {
            state: self.state.clone(),
            is_playing: self.state.is_playing(),
            current_stream: self.state.stream(),
            track: self.track.clone(),
            artwork: self.artwork.clone(),
            seek: self.seek,
            current_time,
            duration,
        }
    }

    fn publish(&mut self) {
        let next = self.build_snapshot();

        let mut events = Vec::new();
        self.snapshot_tx.send_if_modified(|current| {
            if *current == next {
                return false;
            }
            events = diff_snapshots(current, &next);
            *current = next.clone();
            true
        });

        for event in events {
            self.events.broadcast(event);
        }

        self.notify_now_playing(&next, false);
    }

    fn notify_now_playing(&mut self, snapshot: &PlayerSnapshot, force: bool) {
        let key = NowPlayingKey::of(snapshot);
        if !force && key == self.last_now_playing {
            return;
        }
        self.last_now_playing = key;

        match NowPlayingInfo::from_snapshot(snapshot) {
            Some(info) => self.now_playing.update(info),
            None => self.now_playing.clear(),
        }
    }
}

impl Drop for PlaybackEngine {
    fn drop(&mut self) {
        self.disconnect();
    }
}
