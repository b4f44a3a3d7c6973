/*!
 * Native media boundary.
 *
 * Playback goes through two traits so that sessions never depend on a
 * concrete audio stack:
 * - `MediaBackend`: opens a media resource for a narration URL
 * - `MediaHandle`: the exclusively owned resource (play, pause, stop and
 *   timestamp listeners)
 *
 * `clock` provides a headless implementation driven by a tokio interval.
 */

use std::fmt::Debug;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::errors::PlaybackError;

/// Identifies one open detail view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ViewId(Uuid);

impl ViewId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ViewId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ViewId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A playback position reported by a media resource
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeTick {
    pub view: ViewId,
    pub time: f64,
    /// Set on the last tick, sent when the media reached its end
    pub ended: bool,
}

/// Handle returned when a timestamp listener is registered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(pub u64);

/// Timestamp-update subscription, forwards positions for one view
#[derive(Debug, Clone)]
pub struct TimeListener {
    view: ViewId,
    sender: mpsc::UnboundedSender<TimeTick>,
}

impl TimeListener {
    pub fn new(view: ViewId, sender: mpsc::UnboundedSender<TimeTick>) -> Self {
        Self { view, sender }
    }

    pub fn view(&self) -> ViewId {
        self.view
    }

    /// Forward a position; false once the receiving side is gone
    pub fn notify(&self, time: f64) -> bool {
        self.send(time, false)
    }

    /// Report that playback ran to the end at `time`
    pub fn notify_end(&self, time: f64) -> bool {
        self.send(time, true)
    }

    fn send(&self, time: f64, ended: bool) -> bool {
        self.sender
            .send(TimeTick {
                view: self.view,
                time,
                ended,
            })
            .is_ok()
    }
}

/// One native media resource bound to a single narration
pub trait MediaHandle: Send + Debug {
    /// Start or resume playback; a resource that reached its end starts over
    fn play(&mut self) -> Result<(), PlaybackError>;

    /// Pause at the current position
    fn pause(&mut self);

    /// Stop playback and rewind
    fn stop(&mut self);

    /// Current position in seconds
    fn current_time(&self) -> f64;

    /// Register a timestamp listener
    fn add_time_listener(&mut self, listener: TimeListener) -> ListenerId;

    /// Remove a listener; returns false if it was not registered
    fn remove_time_listener(&mut self, id: ListenerId) -> bool;
}

/// Factory for media resources
pub trait MediaBackend: Send + Sync + Debug {
    /// Open the resource behind a narration URL
    fn open(&self, url: &str) -> Result<Box<dyn MediaHandle>, PlaybackError>;
}

pub mod clock;
