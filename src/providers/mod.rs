/*!
 * Event sources.
 *
 * This module defines the contract used to query events for a year range:
 * - `EventSource`: range-bounded event query
 * - `http`: reqwest client for the backend's `/api/events` endpoint
 */

use async_trait::async_trait;
use std::fmt::Debug;

use crate::errors::FetchError;
use crate::event_model::Event;
use crate::temporal_range::TemporalRange;

/// Common trait for everything able to serve events for a year range
///
/// Implementations must not return partial data: a failed query yields an
/// error and nothing else. Queries are not cancelable.
#[async_trait]
pub trait EventSource: Send + Sync + Debug {
    /// Fetch at most `limit` events whose year falls in `range`
    ///
    /// # Arguments
    /// * `range` - The year window to query
    /// * `limit` - Maximum number of events returned by the backend
    ///
    /// # Returns
    /// * `Result<Vec<Event>, FetchError>` - The decoded events or an error
    async fn fetch_events(&self, range: TemporalRange, limit: u32) -> Result<Vec<Event>, FetchError>;
}

pub mod http;
