//! Fixed list of on-demand shows
//!
//! Plain configuration: the engine only ever sees a show's stream URL, in
//! the form of its [`StreamId`].

use crate::config_ext::PlayerConfigExt;
use crate::model::StreamId;
use anyhow::Result;
use clrconfig::Config;
use serde::{Deserialize, Serialize};
use url::Url;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Show {
    pub title: String,
    pub stream_url: String,
    /// Name of the bundled artwork asset.
    pub artwork: String,
}

impl Show {
    pub fn url(&self) -> std::result::Result<Url, url::ParseError> {
        Url::parse(&self.stream_url)
    }

    pub fn id(&self) -> StreamId {
        match self.url() {
            Ok(url) => StreamId::from_url(&url),
            Err(_) => StreamId::new(self.stream_url.clone()),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ShowCatalog {
    shows: Vec<Show>,
}

impl ShowCatalog {
    pub fn new(shows: Vec<Show>) -> Self {
        Self { shows }
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self::new(config.get_catalog_shows()?))
    }

    pub fn shows(&self) -> &[Show] {
        &self.shows
    }

    pub fn len(&self) -> usize {
        self.shows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shows.is_empty()
    }

    pub fn find(&self, id: &StreamId) -> Option<&Show> {
        self.shows.iter().find(|show| &show.id() == id)
    }

    /// Artwork asset for a stream.
    ///
    /// Tries an exact match first, then either identifier containing the
    /// other, so that query strings or redirects on the stream URL still
    /// resolve to the right show.
    pub fn artwork_for(&self, id: &StreamId) -> Option<&str> {
        if let Some(show) = self.find(id) {
            return Some(&show.artwork);
        }

        let id = id.as_str();
        self.shows
            .iter()
            .find(|show| id.contains(show.id().as_str()))
            .or_else(|| {
                self.shows
                    .iter()
                    .find(|show| !id.is_empty() && show.id().as_str().contains(id))
            })
            .map(|show| show.artwork.as_str())
    }
}
