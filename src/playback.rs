/*!
 * Narration playback.
 *
 * A `PlaybackSession` exists for each open detail view whose event has a
 * narration. It exclusively owns one media handle and one timestamp
 * listener, both released exactly once when the session is closed (or
 * dropped on an error path). `PlaybackController` keeps the sessions of all
 * open views; nothing prevents two of them from playing at the same time.
 *
 * State machine:
 * - `Idle` / `Paused` --toggle--> `Playing`
 * - `Playing` --toggle--> `Paused`
 * - `Playing` --media ended--> `Paused`
 * - any state --close--> released
 */

use log::{debug, info, warn};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::cue_sync::{active_cue, active_cue_index};
use crate::errors::PlaybackError;
use crate::event_model::{Cue, Event};
use crate::media::{ListenerId, MediaBackend, MediaHandle, TimeListener, TimeTick, ViewId};

/// Playback state of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackState {
    #[default]
    Idle,
    Playing,
    Paused,
}

impl PlaybackState {
    pub fn is_playing(&self) -> bool {
        matches!(self, Self::Playing)
    }

    /// Label of the narration toggle button in this state
    pub fn toggle_label(&self) -> &'static str {
        match self {
            Self::Playing => "Pause narration",
            Self::Idle | Self::Paused => "Play narration",
        }
    }
}

/// Effect of a timestamp tick on a session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Session not playing, or no such session
    Ignored,
    /// Position moved, same cue visible
    Advanced,
    /// Position moved and the visible cue changed
    CueChanged,
    /// Media ran to its end; the session is now paused
    Ended,
}

/// Live playback state for one open event
#[derive(Debug)]
pub struct PlaybackSession {
    view: ViewId,
    event: Arc<Event>,
    media: Box<dyn MediaHandle>,
    listener: ListenerId,
    state: PlaybackState,
    current_time: f64,
    /// The media reported its end since the last play
    ended: bool,
    released: bool,
}

impl PlaybackSession {
    /// Bind a media handle to a view and subscribe to its timestamp updates
    pub fn open(
        view: ViewId,
        event: Arc<Event>,
        mut media: Box<dyn MediaHandle>,
        ticks: mpsc::UnboundedSender<TimeTick>,
    ) -> Self {
        let listener = media.add_time_listener(TimeListener::new(view, ticks));
        debug!("Opened playback session {} for \"{}\"", view, event.title);

        Self {
            view,
            event,
            media,
            listener,
            state: PlaybackState::Idle,
            current_time: 0.0,
            ended: false,
            released: false,
        }
    }

    pub fn view(&self) -> ViewId {
        self.view
    }

    pub fn event(&self) -> &Event {
        &self.event
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn is_playing(&self) -> bool {
        self.state.is_playing()
    }

    pub fn current_time(&self) -> f64 {
        self.current_time
    }

    /// Cue visible at the current position, derived on every call
    pub fn active_cue(&self) -> Option<&Cue> {
        active_cue(self.event.cues(), self.current_time)
    }

    /// Start or pause playback
    ///
    /// A rejected play request leaves the state where it was (`Idle` or
    /// `Paused`) and is returned to the caller.
    pub fn toggle(&mut self) -> Result<PlaybackState, PlaybackError> {
        match self.state {
            PlaybackState::Playing => {
                self.media.pause();
                self.state = PlaybackState::Paused;
            }
            PlaybackState::Idle | PlaybackState::Paused => {
                if let Err(e) = self.media.play() {
                    warn!("Narration for \"{}\" could not start: {}", self.event.title, e);
                    return Err(e);
                }
                if self.ended {
                    // Media restarted from the beginning
                    self.ended = false;
                    self.current_time = self.media.current_time();
                }
                self.state = PlaybackState::Playing;
            }
        }
        Ok(self.state)
    }

    /// Apply a timestamp update; only effective while playing
    pub fn on_tick(&mut self, time: f64) -> TickOutcome {
        if self.released || !self.is_playing() {
            return TickOutcome::Ignored;
        }

        let cues = self.event.cues();
        let previous = active_cue_index(cues, self.current_time);
        self.current_time = time;

        if active_cue_index(cues, time) != previous {
            TickOutcome::CueChanged
        } else {
            TickOutcome::Advanced
        }
    }

    /// Apply the last tick of a media that ran to its end
    ///
    /// The session leaves `Playing`; toggling again replays from the start.
    pub fn on_end(&mut self, time: f64) -> TickOutcome {
        if self.released || !self.is_playing() {
            return TickOutcome::Ignored;
        }
        self.current_time = time;
        self.state = PlaybackState::Paused;
        self.ended = true;
        info!("Narration for \"{}\" ended", self.event.title);
        TickOutcome::Ended
    }

    /// Stop playback and drop the timestamp listener
    pub fn close(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        self.media.remove_time_listener(self.listener);
        self.media.stop();
        debug!("Released playback session {} ({:?})", self.view, self.state);
    }
}

impl Drop for PlaybackSession {
    fn drop(&mut self) {
        self.release();
    }
}

/// Owns one playback session per open detail view
#[derive(Debug)]
pub struct PlaybackController {
    backend: Arc<dyn MediaBackend>,
    sessions: HashMap<ViewId, PlaybackSession>,
    ticks: mpsc::UnboundedSender<TimeTick>,
}

impl PlaybackController {
    /// Create a controller and the receiving end of all session timestamp ticks
    pub fn new(backend: Arc<dyn MediaBackend>) -> (Self, mpsc::UnboundedReceiver<TimeTick>) {
        let (ticks, receiver) = mpsc::unbounded_channel();
        let controller = Self {
            backend,
            sessions: HashMap::new(),
            ticks,
        };
        (controller, receiver)
    }

    /// Create the session for a newly opened view
    ///
    /// Returns `Ok(None)` when the event has no narration. Re-opening a view
    /// releases its previous session first.
    pub fn open(
        &mut self,
        view: ViewId,
        event: Arc<Event>,
    ) -> Result<Option<&PlaybackSession>, PlaybackError> {
        self.close(view);

        let Some(url) = event.narration_url() else {
            return Ok(None);
        };
        let media = self.backend.open(url)?;
        let session = PlaybackSession::open(view, event, media, self.ticks.clone());

        Ok(Some(self.sessions.entry(view).or_insert(session)))
    }

    pub fn session(&self, view: ViewId) -> Option<&PlaybackSession> {
        self.sessions.get(&view)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn toggle(&mut self, view: ViewId) -> Result<PlaybackState, PlaybackError> {
        self.sessions
            .get_mut(&view)
            .ok_or_else(|| PlaybackError::SessionNotFound(view.to_string()))?
            .toggle()
    }

    /// Route a tick to its session; ticks for closed views are dropped
    pub fn handle_tick(&mut self, tick: TimeTick) -> TickOutcome {
        match self.sessions.get_mut(&tick.view) {
            Some(session) if tick.ended => session.on_end(tick.time),
            Some(session) => session.on_tick(tick.time),
            None => TickOutcome::Ignored,
        }
    }

    /// Destroy the session of a closed view; false if it had none
    pub fn close(&mut self, view: ViewId) -> bool {
        match self.sessions.remove(&view) {
            Some(session) => {
                session.close();
                true
            }
            None => false,
        }
    }

    pub fn close_all(&mut self) {
        let count = self.sessions.len();
        for (_, session) in self.sessions.drain() {
            session.close();
        }
        if count > 0 {
            info!("Closed {} playback sessions", count);
        }
    }
}
