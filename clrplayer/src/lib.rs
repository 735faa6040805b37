//! Playback core of the City Live Radio player
//!
//! One stream at a time: the live broadcast or an on-demand show from the
//! catalog. The crate owns the playback state machine, turns timed metadata
//! into a track label, looks up artwork for it and republishes everything
//! as [`PlayerSnapshot`]s.
//!
//! Decoding, the platform audio session and the OS "now playing" surface
//! are collaborators behind traits ([`MediaBackend`], [`AudioSession`],
//! [`NowPlayingCenter`]).
//!
//! # Example
//!
//! ```no_run
//! use clrconfig::get_config;
//! use clrplayer::{EngineInputs, PlaybackEngine, StreamId};
//! # use std::sync::Arc;
//! # fn collaborators() -> (
//! #     Arc<dyn clrplayer::MediaBackend>,
//! #     Arc<dyn clrplayer::AudioSession>,
//! #     Arc<dyn clrplayer::NowPlayingCenter>,
//! # ) { unimplemented!() }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = get_config();
//!     clrplayer::logging::init_logging(&config);
//!
//!     let (backend, session, now_playing) = collaborators();
//!     let inputs = EngineInputs::from_config(&config, backend, session, now_playing)?;
//!     let (player, _task) = PlaybackEngine::spawn(inputs);
//!
//!     let snapshot = player.play_live().await?;
//!     println!("playing: {}", snapshot.is_playing);
//!
//!     let show = StreamId::new("https://cityliveradiouk.co.uk/Streaming/ListenAgain/CM.mp3");
//!     player.play_stream(show).await?;
//!     player.seek_forward().await?;
//!
//!     player.shutdown().await?;
//!     Ok(())
//! }
//! ```

pub mod artwork;
pub mod catalog;
pub mod config_ext;
pub mod engine;
pub mod errors;
pub mod events;
pub mod logging;
pub mod media;
pub mod metadata;
pub mod model;
pub mod now_playing;
pub mod service;
pub mod session;

// Re-exports
pub use artwork::ArtworkSource;
pub use catalog::{Show, ShowCatalog};
pub use config_ext::PlayerConfigExt;
pub use engine::{clamp_seek_target, EngineInputs, PlaybackEngine, PlayerCommand, PlayerSettings};
pub use errors::{PlayerError, Result};
pub use events::PlayerEventBus;
pub use media::{MediaBackend, MediaHandle, MetadataBatch, SeekableRange};
pub use metadata::{MetadataKey, MetadataRecord};
pub use model::{PlaybackState, PlayerEvent, PlayerSnapshot, SeekState, StreamId, TrackMetadata};
pub use now_playing::{NowPlayingCenter, NowPlayingInfo, RemoteCommand};
pub use service::PlayerHandle;
pub use session::{AudioSession, RouteChangeReason, SessionCategory, SessionEvent};

pub use clrartwork::Artwork;
