use async_trait::async_trait;
use clrartwork::{Artwork, ArtworkClient};

/// Resolves artwork for a track. Implementations never fail: any problem
/// becomes [`Artwork::Placeholder`].
#[async_trait]
pub trait ArtworkSource: Send + Sync {
    async fn resolve(&self, artist: Option<&str>, title: &str) -> Artwork;
}

#[async_trait]
impl ArtworkSource for ArtworkClient {
    async fn resolve(&self, artist: Option<&str>, title: &str) -> Artwork {
        ArtworkClient::resolve(self, artist, title).await
    }
}
