use std::collections::VecDeque;

use async_trait::async_trait;
use strategy::RawRecord;

use crate::feed::{FeedError, MarketFeed};

/// Replays queued fetch results in order, then returns empty batches.
#[derive(Debug, Clone, Default)]
pub struct ScriptedFeed {
    responses: VecDeque<Result<Vec<RawRecord>, FeedError>>,
}

impl ScriptedFeed {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_batch(mut self, records: Vec<RawRecord>) -> Self {
        self.responses.push_back(Ok(records));
        self
    }

    pub fn with_error(mut self, error: FeedError) -> Self {
        self.responses.push_back(Err(error));
        self
    }
}

#[async_trait]
impl MarketFeed for ScriptedFeed {
    async fn fetch(&mut self) -> Result<Vec<RawRecord>, FeedError> {
        self.responses.pop_front().unwrap_or_else(|| Ok(Vec::new()))
    }
}
