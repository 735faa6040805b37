//! Example: Resolve artwork for a track
//!
//! Run with: cargo run -p clrartwork --example lookup_artwork -- "Daft Punk" "One More Time"
//! Title only: cargo run -p clrartwork --example lookup_artwork -- "" "Blue Monday"

use clrartwork::{Artwork, ArtworkClient};
use std::env;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    let mut args = env::args().skip(1);
    let artist = args.next().unwrap_or_else(|| "Daft Punk".to_string());
    let title = args.next().unwrap_or_else(|| "One More Time".to_string());
    let artist = Some(artist.as_str()).filter(|a| !a.trim().is_empty());

    let client = ArtworkClient::new()?;

    let term = ArtworkClient::search_term(artist, &title);
    println!("Searching '{}' on {}...\n", term, client.search_url());

    match client.lookup_artwork_url(artist, &title).await {
        Ok(url) => println!("Artwork URL: {}", url),
        Err(e) => println!("No artwork URL: {}", e),
    }

    match client.resolve(artist, &title).await {
        Artwork::Image(image) => println!("Decoded {}x{} image", image.width(), image.height()),
        Artwork::Placeholder => println!("Using placeholder artwork"),
    }

    Ok(())
}
