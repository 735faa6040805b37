//! Track artwork lookup for City Live Radio
//!
//! Resolves cover art for the track currently on air. A free-text song
//! search returns a small thumbnail URL, which is upgraded to a larger
//! rendition, downloaded and decoded.
//!
//! # Features
//!
//! - **Song search**: `term`, `entity=song`, `limit=1` against a configurable endpoint
//! - **URL upgrade**: `100x100` thumbnails rewritten to `600x600`
//! - **Bounded latency**: each request carries its own timeout (6s by default)
//! - **Never fails**: [`ArtworkClient::resolve`] folds every error into
//!   [`Artwork::Placeholder`]
//! - **Configuration Extension**: the `artwork` section of `clrconfig`
//!
//! # Example
//!
//! ```no_run
//! use clrartwork::{Artwork, ArtworkClient};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = ArtworkClient::new()?;
//!
//!     match client.resolve(Some("Daft Punk"), "Digital Love").await {
//!         Artwork::Image(image) => println!("{}x{}", image.width(), image.height()),
//!         Artwork::Placeholder => println!("no artwork"),
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod config_ext;
pub mod error;
pub mod models;

// Re-exports
pub use client::{ArtworkClient, ClientBuilder};
pub use config_ext::ArtworkConfigExt;
pub use error::{Error, Result};
pub use models::{Artwork, SearchResponse, SearchResult};
