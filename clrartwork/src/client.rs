//! HTTP client for the song search API
//!
//! Artwork resolution is a two-step protocol: a search request returns a
//! small thumbnail URL for the best matching song, which is rewritten to a
//! larger variant and downloaded. Any failure along the way resolves to
//! [`Artwork::Placeholder`].
//!
//! # Example
//!
//! ```no_run
//! use clrartwork::ArtworkClient;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = ArtworkClient::new()?;
//!     let artwork = client.resolve(Some("Daft Punk"), "One More Time").await;
//!     println!("placeholder: {}", artwork.is_placeholder());
//!     Ok(())
//! }
//! ```

use crate::config_ext::ArtworkConfigExt;
use crate::error::{Error, Result};
use crate::models::{Artwork, SearchResponse};
use clrconfig::Config;
use image::DynamicImage;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

/// Default song search endpoint
pub const DEFAULT_SEARCH_URL: &str = "https://itunes.apple.com/search";

/// Default timeout applied to each of the two requests (6 seconds)
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 6;

/// Default User-Agent
pub const DEFAULT_USER_AGENT: &str = "CityLiveRadio/0.1 (clrartwork)";

/// Edge length requested when upgrading a thumbnail URL
pub const DEFAULT_ARTWORK_SIZE: u32 = 600;

/// Edge length of the thumbnails returned by the search API
const THUMBNAIL_SIZE: u32 = 100;

/// Artwork lookup client
///
/// Stateless apart from the pooled `reqwest::Client`; cheap to clone and
/// safe to share across tasks.
#[derive(Debug, Clone)]
pub struct ArtworkClient {
    client: Client,
    search_url: String,
    timeout: Duration,
    artwork_size: u32,
}

impl ArtworkClient {
    /// Create a new client with default settings
    pub fn new() -> Result<Self> {
        Self::builder().build()
    }

    /// Create a builder for configuring the client
    pub fn builder() -> ClientBuilder {
        ClientBuilder::default()
    }

    /// Create a client from the `artwork` section of the configuration
    pub fn from_config(config: &Config) -> Result<Self> {
        Self::builder()
            .search_url(config.get_artwork_search_url()?)
            .timeout(Duration::from_secs(config.get_artwork_timeout_secs()?))
            .artwork_size(config.get_artwork_size()?)
            .build()
    }

    /// Create a client with a custom reqwest::Client
    pub fn with_client(client: Client) -> Self {
        Self {
            client,
            search_url: DEFAULT_SEARCH_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            artwork_size: DEFAULT_ARTWORK_SIZE,
        }
    }

    pub fn search_url(&self) -> &str {
        &self.search_url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn artwork_size(&self) -> u32 {
        self.artwork_size
    }

    // ========================================================================
    // Query helpers
    // ========================================================================

    /// Build the free-text search term for a track
    ///
    /// `"artist title"` (both trimmed) when an artist is known, the trimmed
    /// title alone otherwise. A blank artist counts as absent. The pair is
    /// joined even when the title is blank.
    pub fn search_term(artist: Option<&str>, title: &str) -> String {
        let title = title.trim();
        match artist.map(str::trim).filter(|a| !a.is_empty()) {
            Some(artist) => format!("{} {}", artist, title),
            None => title.to_string(),
        }
    }

    /// Rewrite a thumbnail URL so it asks for a `size`x`size` rendition
    ///
    /// Plain string substitution: `100x100` becomes `600x600`, or failing
    /// that a `/100x` path segment becomes `/600x`. URLs without a size token
    /// are returned unchanged.
    pub fn upgrade_artwork_url(url: &str, size: u32) -> String {
        let square = format!("{0}x{0}", THUMBNAIL_SIZE);
        if url.contains(&square) {
            return url.replace(&square, &format!("{0}x{0}", size));
        }

        let segment = format!("/{}x", THUMBNAIL_SIZE);
        if url.contains(&segment) {
            return url.replace(&segment, &format!("/{}x", size));
        }

        url.to_string()
    }

    /// Build the search request URL (`term`, `entity=song`, `limit=1`)
    pub fn build_search_url(&self, term: &str) -> Result<Url> {
        let mut url = Url::parse(&self.search_url)?;
        url.query_pairs_mut()
            .append_pair("term", term)
            .append_pair("entity", "song")
            .append_pair("limit", "1");
        Ok(url)
    }

    // ========================================================================
    // Network calls
    // ========================================================================

    /// Run a song search
    pub async fn search(&self, term: &str) -> Result<SearchResponse> {
        let url = self.build_search_url(term)?;
        debug!(%url, "Searching artwork");

        let response = self.client.get(url).timeout(self.timeout).send().await?;

        if !response.status().is_success() {
            return Err(Error::api_error(format!(
                "Search API returned status: {}",
                response.status()
            )));
        }

        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }

    /// Find the (upgraded) artwork URL for a track
    pub async fn lookup_artwork_url(&self, artist: Option<&str>, title: &str) -> Result<Url> {
        let term = Self::search_term(artist, title);
        if term.is_empty() {
            return Err(Error::EmptyQuery);
        }

        let response = self.search(&term).await?;
        let thumbnail = response
            .first_artwork_url()
            .ok_or_else(|| Error::NoArtwork(term.clone()))?;

        let upgraded = Self::upgrade_artwork_url(thumbnail, self.artwork_size);
        debug!(thumbnail, upgraded = %upgraded, "Artwork URL found");

        Ok(Url::parse(&upgraded)?)
    }

    /// Download and decode an image
    ///
    /// Decoding runs on the blocking pool.
    pub async fn download_image(&self, url: Url) -> Result<DynamicImage> {
        let response = self.client.get(url).timeout(self.timeout).send().await?;

        if !response.status().is_success() {
            return Err(Error::api_error(format!(
                "Image download returned status: {}",
                response.status()
            )));
        }

        let bytes = response.bytes().await?;
        let image = tokio::task::spawn_blocking(move || image::load_from_memory(&bytes)).await??;
        Ok(image)
    }

    /// Search then download, surfacing the first error
    pub async fn fetch(&self, artist: Option<&str>, title: &str) -> Result<DynamicImage> {
        let url = self.lookup_artwork_url(artist, title).await?;
        self.download_image(url).await
    }

    /// Resolve artwork for a track, never failing
    ///
    /// Single attempt, no retries.
    ///
    /// ```
    /// use clrartwork::{Artwork, ArtworkClient};
    ///
    /// let client = ArtworkClient::new().unwrap();
    /// // Nothing to search for: no request is made
    /// let artwork = tokio_test::block_on(client.resolve(None, "  "));
    /// assert_eq!(artwork, Artwork::Placeholder);
    /// ```
    pub async fn resolve(&self, artist: Option<&str>, title: &str) -> Artwork {
        match self.fetch(artist, title).await {
            Ok(image) => {
                debug!(
                    width = image.width(),
                    height = image.height(),
                    title,
                    "Artwork resolved"
                );
                Artwork::from_image(image)
            }
            Err(err) => {
                if err.is_transport() {
                    warn!(title, "Artwork lookup failed: {}", err);
                } else {
                    debug!(title, "No artwork: {}", err);
                }
                Artwork::Placeholder
            }
        }
    }
}

/// Builder for configuring an ArtworkClient
#[derive(Debug)]
pub struct ClientBuilder {
    client: Option<Client>,
    search_url: String,
    timeout: Duration,
    user_agent: String,
    artwork_size: u32,
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self {
            client: None,
            search_url: DEFAULT_SEARCH_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            artwork_size: DEFAULT_ARTWORK_SIZE,
        }
    }
}

impl ClientBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a custom HTTP client
    pub fn client(mut self, client: Client) -> Self {
        self.client = Some(client);
        self
    }

    /// Set the search endpoint
    pub fn search_url(mut self, url: impl Into<String>) -> Self {
        self.search_url = url.into();
        self
    }

    /// Set the per-request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set a custom User-Agent header
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Set the edge length requested for artwork
    pub fn artwork_size(mut self, size: u32) -> Self {
        self.artwork_size = size;
        self
    }

    /// Build the client
    pub fn build(self) -> Result<ArtworkClient> {
        let client = match self.client {
            Some(client) => client,
            None => Client::builder()
                .user_agent(&self.user_agent)
                .timeout(self.timeout)
                .build()?,
        };

        Ok(ArtworkClient {
            client,
            search_url: self.search_url,
            timeout: self.timeout,
            artwork_size: self.artwork_size,
        })
    }
}
