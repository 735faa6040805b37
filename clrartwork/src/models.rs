//! Wire models for the song search API and the resolved artwork value

use image::DynamicImage;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Top-level search response
///
/// Only `results` is consumed; every other field is ignored.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchResponse {
    #[serde(default, rename = "resultCount")]
    pub result_count: Option<u64>,

    #[serde(default)]
    pub results: Option<Vec<SearchResult>>,
}

impl SearchResponse {
    /// Thumbnail URL of the first result, if any
    pub fn first_artwork_url(&self) -> Option<&str> {
        self.results
            .as_ref()
            .and_then(|results| results.first())
            .and_then(|result| result.artwork_url_100.as_deref())
            .filter(|url| !url.trim().is_empty())
    }
}

/// A single search hit
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchResult {
    #[serde(default, rename = "artistName")]
    pub artist_name: Option<String>,

    #[serde(default, rename = "trackName")]
    pub track_name: Option<String>,

    #[serde(default, rename = "artworkUrl100")]
    pub artwork_url_100: Option<String>,
}

/// Outcome of an artwork lookup
///
/// Either a decoded image, shared behind an `Arc` so snapshots stay cheap to
/// clone, or the fixed placeholder marker.
#[derive(Clone)]
pub enum Artwork {
    Image(Arc<DynamicImage>),
    Placeholder,
}

impl Artwork {
    pub fn from_image(image: DynamicImage) -> Self {
        Self::Image(Arc::new(image))
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self, Self::Placeholder)
    }

    pub fn image(&self) -> Option<&DynamicImage> {
        match self {
            Self::Image(image) => Some(image),
            Self::Placeholder => None,
        }
    }
}

/// Two images are equal only if they are the same decoded buffer.
impl PartialEq for Artwork {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Image(a), Self::Image(b)) => Arc::ptr_eq(a, b),
            (Self::Placeholder, Self::Placeholder) => true,
            _ => false,
        }
    }
}

impl fmt::Debug for Artwork {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Image(image) => write!(f, "Artwork::Image({}x{})", image.width(), image.height()),
            Self::Placeholder => write!(f, "Artwork::Placeholder"),
        }
    }
}
