//! Timed-metadata resolution
//!
//! Turns a batch of raw records delivered by the media backend into a
//! [`TrackMetadata`]. Within a batch the first value wins.
//!
//! ```
//! use clrplayer::metadata::{resolve, MetadataRecord};
//!
//! let track = resolve(&[
//!     MetadataRecord::artist("Artist Name"),
//!     MetadataRecord::title("Song Title"),
//!     MetadataRecord::title("Ignored"),
//! ]);
//! assert_eq!(track.display_label.as_deref(), Some("Artist Name — Song Title"));
//! ```

use crate::model::TrackMetadata;

/// Common key a record is tagged with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetadataKey {
    Title,
    Artist,
    Other(String),
}

impl MetadataKey {
    pub fn parse(key: &str) -> Self {
        match key.trim().to_ascii_lowercase().as_str() {
            "title" => MetadataKey::Title,
            "artist" => MetadataKey::Artist,
            other => MetadataKey::Other(other.to_string()),
        }
    }
}

/// One raw timed-metadata record.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MetadataRecord {
    pub key: Option<MetadataKey>,
    pub value: Option<String>,
}

impl MetadataRecord {
    pub fn title(value: impl Into<String>) -> Self {
        Self {
            key: Some(MetadataKey::Title),
            value: Some(value.into()),
        }
    }

    pub fn artist(value: impl Into<String>) -> Self {
        Self {
            key: Some(MetadataKey::Artist),
            value: Some(value.into()),
        }
    }

    pub fn untagged(value: impl Into<String>) -> Self {
        Self {
            key: None,
            value: Some(value.into()),
        }
    }

    pub fn tagged(key: &str, value: impl Into<String>) -> Self {
        Self {
            key: Some(MetadataKey::parse(key)),
            value: Some(value.into()),
        }
    }

    fn text(&self) -> Option<&str> {
        self.value
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty())
    }
}

/// Resolve a batch of records into track metadata.
///
/// Untagged values only ever fill an unset title. Blank values are ignored.
pub fn resolve(records: &[MetadataRecord]) -> TrackMetadata {
    let mut title: Option<String> = None;
    let mut artist: Option<String> = None;

    for record in records {
        let Some(text) = record.text() else {
            continue;
        };
        match &record.key {
            Some(MetadataKey::Title) | None if title.is_none() => {
                title = Some(text.to_string());
            }
            Some(MetadataKey::Artist) if artist.is_none() => {
                artist = Some(text.to_string());
            }
            _ => {}
        }
    }

    TrackMetadata::new(title, artist)
}
