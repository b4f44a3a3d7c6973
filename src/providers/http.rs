use async_trait::async_trait;
use log::{debug, error};
use reqwest::Client;
use std::time::Duration;
use url::Url;

use crate::errors::FetchError;
use crate::event_model::{decode_events, Event};
use crate::providers::EventSource;
use crate::temporal_range::TemporalRange;

/// Path of the backend's event query endpoint
pub const EVENTS_PATH: &str = "/api/events";

/// Event repository backed by the HTTP events endpoint
#[derive(Debug, Clone)]
pub struct HttpEventRepository {
    /// Base address of the backend
    base_url: Url,
    /// HTTP client for making requests
    client: Client,
}

impl HttpEventRepository {
    /// Create a repository for the given backend base address
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, FetchError> {
        let base_url = Url::parse(base_url)
            .map_err(|e| FetchError::InvalidUrl(format!("{}: {}", base_url, e)))?;

        Ok(Self {
            base_url,
            client: Client::builder()
                .timeout(timeout)
                .build()
                .unwrap_or_default(),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Build the query URL for a range, parameters in `year_from`, `year_to`, `limit` order
    pub fn query_url(&self, range: TemporalRange, limit: u32) -> Result<Url, FetchError> {
        let mut url = self
            .base_url
            .join(EVENTS_PATH)
            .map_err(|e| FetchError::InvalidUrl(e.to_string()))?;

        url.query_pairs_mut()
            .clear()
            .append_pair("year_from", &range.from.to_string())
            .append_pair("year_to", &range.to.to_string())
            .append_pair("limit", &limit.to_string());

        Ok(url)
    }
}

#[async_trait]
impl EventSource for HttpEventRepository {
    async fn fetch_events(&self, range: TemporalRange, limit: u32) -> Result<Vec<Event>, FetchError> {
        let url = self.query_url(range, limit)?;
        debug!("Querying events: {}", url);

        let response = self.client.get(url).send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(FetchError::Status {
                status_code: status.as_u16(),
                message: truncate_for_log(&body),
            });
        }

        decode_events(&body).inspect_err(|e| {
            error!("Failed to decode events payload: {}. Raw response (first 500 chars): {}",
                e, truncate_for_log(&body));
        })
    }
}

fn truncate_for_log(body: &str) -> String {
    if body.chars().count() > 500 {
        body.chars().take(500).collect()
    } else {
        body.to_string()
    }
}
