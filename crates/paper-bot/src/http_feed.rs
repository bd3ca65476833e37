use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, InvalidHeaderName, InvalidHeaderValue};
use reqwest::Client;
use runtime::feed::parse_dexscreener_pairs;
use runtime::{FeedError, MarketFeed};
use strategy::RawRecord;
use tracing::debug;

use crate::config::FeedConfig;

#[derive(Debug, thiserror::Error)]
pub enum HttpFeedError {
    #[error("invalid feed header name {name:?}: {source}")]
    HeaderName {
        name: String,
        #[source]
        source: InvalidHeaderName,
    },
    #[error("invalid value for feed header {name:?}: {source}")]
    HeaderValue {
        name: String,
        #[source]
        source: InvalidHeaderValue,
    },
    #[error("failed to build feed http client: {0}")]
    Client(#[from] reqwest::Error),
}

/// Pulls DexScreener-shaped pair listings over HTTP.
#[derive(Debug, Clone)]
pub struct HttpFeed {
    client: Client,
    url: String,
    timeout: Duration,
}

impl HttpFeed {
    pub fn new(config: &FeedConfig) -> Result<Self, HttpFeedError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .default_headers(build_headers(&config.headers)?)
            .build()?;

        Ok(Self {
            client,
            url: config.url.clone(),
            timeout: config.timeout,
        })
    }

    fn map_request_error(&self, err: reqwest::Error) -> FeedError {
        if err.is_timeout() {
            FeedError::Timeout(self.timeout)
        } else if err.is_decode() || err.is_body() {
            FeedError::Decode(err.to_string())
        } else {
            FeedError::Transport(err.to_string())
        }
    }
}

#[async_trait]
impl MarketFeed for HttpFeed {
    async fn fetch(&mut self) -> Result<Vec<RawRecord>, FeedError> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|err| self.map_request_error(err))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FeedError::Status(status.as_u16()));
        }

        let body = response
            .text()
            .await
            .map_err(|err| self.map_request_error(err))?;
        let records = parse_dexscreener_pairs(&body)?;
        debug!(url = %self.url, records = records.len(), "feed fetched");
        Ok(records)
    }
}

fn build_headers(headers: &[(String, String)]) -> Result<HeaderMap, HttpFeedError> {
    let mut map = HeaderMap::with_capacity(headers.len());
    for (name, value) in headers {
        let header_name =
            HeaderName::from_bytes(name.as_bytes()).map_err(|source| HttpFeedError::HeaderName {
                name: name.clone(),
                source,
            })?;
        let header_value =
            HeaderValue::from_str(value).map_err(|source| HttpFeedError::HeaderValue {
                name: name.clone(),
                source,
            })?;
        map.insert(header_name, header_value);
    }
    Ok(map)
}
