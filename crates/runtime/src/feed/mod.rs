pub mod dexscreener;
pub mod scripted;

use std::time::Duration;

use async_trait::async_trait;
use strategy::RawRecord;

pub use dexscreener::parse_dexscreener_pairs;
pub use scripted::ScriptedFeed;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FeedError {
    #[error("feed request timed out after {0:?}")]
    Timeout(Duration),
    #[error("feed transport error: {0}")]
    Transport(String),
    #[error("feed returned HTTP status {0}")]
    Status(u16),
    #[error("feed payload could not be decoded: {0}")]
    Decode(String),
}

/// Source of raw market records for one cycle. Any error degrades the cycle
/// to zero candidates.
#[async_trait]
pub trait MarketFeed: Send {
    async fn fetch(&mut self) -> Result<Vec<RawRecord>, FeedError>;
}
