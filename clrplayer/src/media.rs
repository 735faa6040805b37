//! Media playback collaborator
//!
//! Decoding and transport live outside this crate. The engine opens one
//! [`MediaHandle`] per active stream through a [`MediaBackend`] and is the
//! only owner allowed to start, pause or dispose it.

use crate::errors::Result;
use crate::metadata::MetadataRecord;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::mpsc;
use url::Url;

/// Seekable window of the current item, in seconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeekableRange {
    pub start: f64,
    pub end: f64,
}

impl SeekableRange {
    pub fn new(start: f64, end: f64) -> Self {
        Self { start, end }
    }

    /// Live streams typically report a zero-width window.
    pub fn is_empty(&self) -> bool {
        !(self.end > self.start)
    }
}

/// A batch of records delivered together by the backend.
pub type MetadataBatch = Vec<MetadataRecord>;

#[async_trait]
pub trait MediaHandle: Send + Sync {
    fn play(&self);

    fn pause(&self);

    /// Release the underlying resources. The handle is not used afterwards.
    fn dispose(&self);

    fn current_position(&self) -> f64;

    /// Known duration, `None` for indefinite items.
    fn duration(&self) -> Option<f64>;

    /// `None` when the item cannot be seeked (live).
    fn seekable_range(&self) -> Option<SeekableRange>;

    /// Seek to `to` seconds. Resolves to `true` once the seek completed,
    /// `false` if it was interrupted.
    async fn seek(&self, to: f64, exact: bool) -> bool;

    /// Timed-metadata batches for as long as the handle is alive.
    fn subscribe_metadata(&self) -> mpsc::UnboundedReceiver<MetadataBatch>;
}

pub trait MediaBackend: Send + Sync {
    fn open(&self, url: &Url) -> Result<Arc<dyn MediaHandle>>;
}
