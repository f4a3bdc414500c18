use async_trait::async_trait;

use crate::Result;

/// Maps a channel handle (no leading `@`) to its stable numeric identity.
///
/// Any failure, including a transport error, is reported as
/// [`Error::NotFound`](crate::Error::NotFound): the caller only needs to know
/// the channel cannot be collected on this pass.
#[async_trait]
pub trait IdentityResolver: Send + Sync {
    async fn resolve(&self, handle: &str) -> Result<i64>;
}

/// Lists the post ids currently visible on a channel's public listing.
///
/// The result may contain duplicates and is in no particular order.
#[async_trait]
pub trait ListingFetcher: Send + Sync {
    async fn list_recent_item_ids(&self, handle: &str) -> Result<Vec<i64>>;
}
