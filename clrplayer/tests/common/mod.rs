//! In-memory collaborators for player integration tests
#![allow(dead_code)]

use async_trait::async_trait;
use clrplayer::{
    Artwork, ArtworkSource, AudioSession, EngineInputs, MediaBackend, MediaHandle, MetadataBatch,
    NowPlayingCenter, NowPlayingInfo, PlaybackEngine, PlayerError, PlayerHandle, PlayerSettings,
    PlayerSnapshot, RemoteCommand, SeekableRange, SessionCategory, SessionEvent,
};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, Semaphore};
use tokio::task::JoinHandle;
use url::Url;

pub const LIVE_URL: &str = "https://live.example.com/stream";
pub const SHOW_A: &str = "https://shows.example.com/a.mp3";
pub const SHOW_B: &str = "https://shows.example.com/b.mp3";
pub const SHOW_DURATION: f64 = 200.0;

// ============================================================================
// Media
// ============================================================================

#[derive(Debug, Default)]
pub struct HandleState {
    pub playing: bool,
    pub disposed: bool,
    pub position: f64,
    pub seeks: Vec<(f64, bool)>,
    pub refuse_seeks: bool,
}

pub struct MockMediaHandle {
    pub url: Url,
    pub seekable: bool,
    pub state: Mutex<HandleState>,
    subscribers: Mutex<Vec<mpsc::UnboundedSender<MetadataBatch>>>,
}

impl MockMediaHandle {
    fn new(url: &Url) -> Self {
        Self {
            url: url.clone(),
            seekable: url.host_str() != Url::parse(LIVE_URL).unwrap().host_str(),
            state: Mutex::new(HandleState::default()),
            subscribers: Mutex::new(Vec::new()),
        }
    }

    /// Deliver a metadata batch to every subscriber still listening.
    pub fn emit(&self, batch: MetadataBatch) {
        self.subscribers
            .lock()
            .unwrap()
            .retain(|tx| tx.send(batch.clone()).is_ok());
    }

    pub fn set_position(&self, seconds: f64) {
        self.state.lock().unwrap().position = seconds;
    }

    pub fn is_playing(&self) -> bool {
        self.state.lock().unwrap().playing
    }

    pub fn is_disposed(&self) -> bool {
        self.state.lock().unwrap().disposed
    }
}

#[async_trait]
impl MediaHandle for MockMediaHandle {
    fn play(&self) {
        self.state.lock().unwrap().playing = true;
    }

    fn pause(&self) {
        self.state.lock().unwrap().playing = false;
    }

    fn dispose(&self) {
        let mut state = self.state.lock().unwrap();
        state.playing = false;
        state.disposed = true;
    }

    fn current_position(&self) -> f64 {
        self.state.lock().unwrap().position
    }

    fn duration(&self) -> Option<f64> {
        self.seekable.then_some(SHOW_DURATION)
    }

    fn seekable_range(&self) -> Option<SeekableRange> {
        self.seekable
            .then(|| SeekableRange::new(0.0, SHOW_DURATION))
    }

    async fn seek(&self, to: f64, exact: bool) -> bool {
        let mut state = self.state.lock().unwrap();
        state.seeks.push((to, exact));
        if state.refuse_seeks {
            return false;
        }
        state.position = to;
        true
    }

    fn subscribe_metadata(&self) -> mpsc::UnboundedReceiver<MetadataBatch> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers.lock().unwrap().push(tx);
        rx
    }
}

#[derive(Default)]
pub struct MockBackend {
    pub opened: Mutex<Vec<Arc<MockMediaHandle>>>,
    pub fail_open: AtomicBool,
}

impl MockBackend {
    pub fn open_count(&self) -> usize {
        self.opened.lock().unwrap().len()
    }

    pub fn last(&self) -> Arc<MockMediaHandle> {
        self.opened
            .lock()
            .unwrap()
            .last()
            .cloned()
            .expect("no stream opened")
    }
}

impl MediaBackend for MockBackend {
    fn open(&self, url: &Url) -> clrplayer::Result<Arc<dyn MediaHandle>> {
        if self.fail_open.load(Ordering::SeqCst) {
            return Err(PlayerError::backend(format!("cannot open {}", url)));
        }
        let handle = Arc::new(MockMediaHandle::new(url));
        self.opened.lock().unwrap().push(handle.clone());
        Ok(handle)
    }
}

// ============================================================================
// Audio session
// ============================================================================

pub struct MockSession {
    pub configured: Mutex<Vec<SessionCategory>>,
    pub activations: AtomicUsize,
    pub fail: AtomicBool,
    events: broadcast::Sender<SessionEvent>,
}

impl MockSession {
    pub fn new() -> Self {
        Self {
            configured: Mutex::new(Vec::new()),
            activations: AtomicUsize::new(0),
            fail: AtomicBool::new(false),
            events: broadcast::channel(16).0,
        }
    }

    pub fn emit(&self, event: SessionEvent) {
        let _ = self.events.send(event);
    }

    pub fn subscriber_count(&self) -> usize {
        self.events.receiver_count()
    }
}

impl AudioSession for MockSession {
    fn configure(&self, category: SessionCategory) -> clrplayer::Result<()> {
        self.configured.lock().unwrap().push(category);
        Ok(())
    }

    fn activate(&self) -> clrplayer::Result<()> {
        self.activations.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(PlayerError::session("activation refused"));
        }
        Ok(())
    }

    fn subscribe_events(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }
}

// ============================================================================
// Now playing
// ============================================================================

pub struct MockNowPlaying {
    pub updates: Mutex<Vec<NowPlayingInfo>>,
    pub clears: AtomicUsize,
    commands: broadcast::Sender<RemoteCommand>,
}

impl MockNowPlaying {
    pub fn new() -> Self {
        Self {
            updates: Mutex::new(Vec::new()),
            clears: AtomicUsize::new(0),
            commands: broadcast::channel(16).0,
        }
    }

    pub fn remote(&self, command: RemoteCommand) {
        let _ = self.commands.send(command);
    }

    pub fn last(&self) -> Option<NowPlayingInfo> {
        self.updates.lock().unwrap().last().cloned()
    }

    pub fn update_count(&self) -> usize {
        self.updates.lock().unwrap().len()
    }
}

impl NowPlayingCenter for MockNowPlaying {
    fn update(&self, info: NowPlayingInfo) {
        self.updates.lock().unwrap().push(info);
    }

    fn clear(&self) {
        self.clears.fetch_add(1, Ordering::SeqCst);
    }

    fn subscribe_commands(&self) -> broadcast::Receiver<RemoteCommand> {
        self.commands.subscribe()
    }
}

// ============================================================================
// Artwork
// ============================================================================

/// Answers with a fixed artwork, optionally held back until released.
pub struct MockArtwork {
    pub calls: Mutex<Vec<(Option<String>, String)>>,
    pub artwork: Artwork,
    gate: Option<Semaphore>,
}

impl MockArtwork {
    pub fn immediate(artwork: Artwork) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            artwork,
            gate: None,
        }
    }

    pub fn gated(artwork: Artwork) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            artwork,
            gate: Some(Semaphore::new(0)),
        }
    }

    /// Let `n` pending lookups complete.
    pub fn release(&self, n: usize) {
        if let Some(gate) = &self.gate {
            gate.add_permits(n);
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl ArtworkSource for MockArtwork {
    async fn resolve(&self, artist: Option<&str>, title: &str) -> Artwork {
        self.calls
            .lock()
            .unwrap()
            .push((artist.map(str::to_string), title.to_string()));
        if let Some(gate) = &self.gate {
            if let Ok(permit) = gate.acquire().await {
                permit.forget();
            }
        }
        self.artwork.clone()
    }
}

// ============================================================================
// Harness
// ============================================================================

pub fn test_artwork() -> Artwork {
    Artwork::from_image(image::DynamicImage::new_rgb8(8, 8))
}

pub fn settings() -> PlayerSettings {
    let mut settings = PlayerSettings::new(Url::parse(LIVE_URL).unwrap());
    settings.seek_hud = Duration::from_millis(150);
    settings.position_refresh = Duration::from_millis(50);
    settings
}

pub struct Harness {
    pub backend: Arc<MockBackend>,
    pub session: Arc<MockSession>,
    pub now_playing: Arc<MockNowPlaying>,
    pub artwork: Arc<MockArtwork>,
    pub settings: PlayerSettings,
}

impl Harness {
    pub fn new(artwork: MockArtwork) -> Self {
        Self {
            backend: Arc::new(MockBackend::default()),
            session: Arc::new(MockSession::new()),
            now_playing: Arc::new(MockNowPlaying::new()),
            artwork: Arc::new(artwork),
            settings: settings(),
        }
    }

    pub fn inputs(&self) -> EngineInputs {
        EngineInputs {
            backend: self.backend.clone(),
            session: self.session.clone(),
            now_playing: self.now_playing.clone(),
            artwork: Some(self.artwork.clone()),
            settings: self.settings.clone(),
        }
    }

    pub fn spawn(&self) -> (PlayerHandle, JoinHandle<()>) {
        PlaybackEngine::spawn(self.inputs())
    }
}

/// Wait (bounded) until a published snapshot satisfies `predicate`.
pub async fn wait_for(
    player: &PlayerHandle,
    predicate: impl FnMut(&PlayerSnapshot) -> bool,
) -> PlayerSnapshot {
    let mut rx = player.watch();
    let snapshot = tokio::time::timeout(Duration::from_secs(2), rx.wait_for(predicate))
        .await
        .expect("timed out waiting for snapshot")
        .expect("player service stopped")
        .clone();
    snapshot
}

/// Poll `condition` until it holds, for at most two seconds.
pub async fn eventually(mut condition: impl FnMut() -> bool) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    while !condition() {
        assert!(
            tokio::time::Instant::now() < deadline,
            "condition not reached in time"
        );
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}
