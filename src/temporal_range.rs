/*!
 * Year range selection and race-free application of query results.
 *
 * Every change to either bound issues a new event query tagged with a
 * monotonically increasing sequence number. Queries cannot be cancelled and
 * may complete in any order, so a response is applied to the displayed
 * event list only when its sequence number is the most recently issued one.
 * Anything older is dropped without a trace beyond a debug log line.
 */

use chrono::Datelike;
use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::mpsc;

use crate::errors::FetchError;
use crate::event_model::Event;
use crate::providers::EventSource;

/// Earliest selectable year
pub const MIN_YEAR: i32 = -300;

/// Inclusive `[from, to]` year window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TemporalRange {
    pub from: i32,
    pub to: i32,
}

impl TemporalRange {
    pub fn new(from: i32, to: i32) -> Self {
        Self { from, to }
    }

    /// Full selectable window for the given bounds
    pub fn full(bounds: YearBounds) -> Self {
        Self::new(bounds.min, bounds.max)
    }

    /// True when the bounds were moved past each other
    pub fn is_inverted(&self) -> bool {
        self.from > self.to
    }

    pub fn contains(&self, year: i32) -> bool {
        self.from <= year && year <= self.to
    }
}

/// Clamping bounds applied to both ends of a range
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct YearBounds {
    pub min: i32,
    pub max: i32,
}

impl YearBounds {
    /// `[-300, current year]`
    pub fn current() -> Self {
        Self {
            min: MIN_YEAR,
            max: chrono::Local::now().year(),
        }
    }

    pub fn clamp(&self, year: i32) -> i32 {
        year.clamp(self.min, self.max)
    }
}

impl Default for YearBounds {
    fn default() -> Self {
        Self::current()
    }
}

/// Result of one query, tagged with the sequence number it was issued under
#[derive(Debug)]
pub struct RangeResponse {
    pub seq: u64,
    pub range: TemporalRange,
    pub result: Result<Vec<Event>, FetchError>,
}

/// What happened to a response handed to [`TemporalRangeController::handle_response`]
#[derive(Debug)]
pub enum ResponseOutcome {
    /// The displayed list was replaced
    Applied { count: usize },
    /// A newer query was issued since; the response was dropped
    Stale,
    /// The current query failed; the displayed list is kept as is
    Failed(FetchError),
}

/// Owns the selected year range and the displayed event list
pub struct TemporalRangeController {
    range: TemporalRange,
    bounds: YearBounds,
    limit: u32,
    source: Arc<dyn EventSource>,
    responses: mpsc::UnboundedSender<RangeResponse>,
    /// Runtime queries are spawned on, captured at construction
    runtime: Option<Handle>,
    /// Last sequence number handed out, 0 before the first query
    latest_seq: u64,
    applied_seq: Option<u64>,
    events: Arc<Vec<Event>>,
}

impl TemporalRangeController {
    /// Create a controller and the receiving end its query responses arrive on
    ///
    /// No query is issued until a setter or [`refresh`](Self::refresh) is called.
    /// Queries run on the tokio runtime current at construction, or the one
    /// current when they are issued. Without any runtime a query fails
    /// immediately with a transport error instead of running.
    pub fn new(
        source: Arc<dyn EventSource>,
        limit: u32,
        bounds: YearBounds,
        initial: TemporalRange,
    ) -> (Self, mpsc::UnboundedReceiver<RangeResponse>) {
        let (responses, receiver) = mpsc::unbounded_channel();
        let range = TemporalRange::new(bounds.clamp(initial.from), bounds.clamp(initial.to));

        let controller = Self {
            range,
            bounds,
            limit,
            source,
            responses,
            runtime: Handle::try_current().ok(),
            latest_seq: 0,
            applied_seq: None,
            events: Arc::new(Vec::new()),
        };
        (controller, receiver)
    }

    pub fn range(&self) -> TemporalRange {
        self.range
    }

    pub fn bounds(&self) -> YearBounds {
        self.bounds
    }

    /// Currently displayed events
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// Shared handle on the displayed list, stable across later updates
    pub fn snapshot(&self) -> Arc<Vec<Event>> {
        Arc::clone(&self.events)
    }

    pub fn latest_seq(&self) -> u64 {
        self.latest_seq
    }

    pub fn applied_seq(&self) -> Option<u64> {
        self.applied_seq
    }

    /// Set the lower bound (clamped) and issue a query; returns its sequence number
    pub fn set_from(&mut self, year: i32) -> u64 {
        self.range.from = self.bounds.clamp(year);
        self.issue()
    }

    /// Set the upper bound (clamped) and issue a query; returns its sequence number
    pub fn set_to(&mut self, year: i32) -> u64 {
        self.range.to = self.bounds.clamp(year);
        self.issue()
    }

    /// Re-issue the query for the current range
    pub fn refresh(&mut self) -> u64 {
        self.issue()
    }

    fn issue(&mut self) -> u64 {
        self.latest_seq += 1;
        let seq = self.latest_seq;
        let range = self.range;
        let limit = self.limit;

        if range.is_inverted() {
            // Queried as-is, the backend decides what an inverted window means
            warn!("Year range is inverted: {} > {}", range.from, range.to);
        }
        debug!("Issuing query #{} for {}..={}", seq, range.from, range.to);

        let Some(runtime) = self.runtime.clone().or_else(|| Handle::try_current().ok()) else {
            error!("No async runtime to run query #{}", seq);
            // The receiver is gone once the viewer shuts down
            let _ = self.responses.send(RangeResponse {
                seq,
                range,
                result: Err(FetchError::Transport("no async runtime available".to_string())),
            });
            return seq;
        };

        let source = Arc::clone(&self.source);
        let responses = self.responses.clone();
        runtime.spawn(async move {
            let result = source.fetch_events(range, limit).await;
            // The receiver is gone once the viewer shuts down
            let _ = responses.send(RangeResponse { seq, range, result });
        });

        seq
    }

    /// Apply a response if it belongs to the most recent query
    pub fn handle_response(&mut self, response: RangeResponse) -> ResponseOutcome {
        if response.seq != self.latest_seq {
            debug!(
                "Discarding stale response #{} (latest is #{})",
                response.seq, self.latest_seq
            );
            return ResponseOutcome::Stale;
        }

        match response.result {
            Ok(events) => {
                let count = events.len();
                info!(
                    "Loaded {} events for {}..={}",
                    count, response.range.from, response.range.to
                );
                self.events = Arc::new(events);
                self.applied_seq = Some(response.seq);
                ResponseOutcome::Applied { count }
            }
            Err(e) => {
                error!("Failed to load events: {}", e);
                ResponseOutcome::Failed(e)
            }
        }
    }
}
