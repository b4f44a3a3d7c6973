use log::debug;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

use crate::errors::PlaybackError;
use crate::media::{ListenerId, MediaBackend, MediaHandle, TimeListener};

/// Opens [`ClockMedia`] resources with a shared tick period
#[derive(Debug, Clone)]
pub struct ClockMediaBackend {
    tick_interval: Duration,
    duration: Option<Duration>,
}

impl ClockMediaBackend {
    pub fn new(tick_interval: Duration) -> Self {
        Self {
            tick_interval,
            duration: None,
        }
    }

    /// Stop advancing once this much narration has been played
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = Some(duration);
        self
    }
}

impl MediaBackend for ClockMediaBackend {
    fn open(&self, url: &str) -> Result<Box<dyn MediaHandle>, PlaybackError> {
        if url.trim().is_empty() {
            return Err(PlaybackError::MediaUnavailable("empty narration URL".to_string()));
        }
        debug!("Opening headless media for {}", url);
        Ok(Box::new(ClockMedia::new(url, self.tick_interval, self.duration)))
    }
}

#[derive(Debug, Default)]
struct ClockState {
    position: f64,
    playing: bool,
    listeners: Vec<(ListenerId, TimeListener)>,
    next_listener: u64,
}

impl ClockState {
    fn notify_all(&self) {
        for (_, listener) in &self.listeners {
            listener.notify(self.position);
        }
    }

    fn notify_end(&self) {
        for (_, listener) in &self.listeners {
            listener.notify_end(self.position);
        }
    }
}

/// Headless media resource
///
/// While playing, a tokio task advances the position by one tick period per
/// tick and reports it to every listener. With a duration, the last tick is
/// reported as the end and a later `play` starts over from zero. Playing
/// requires a running tokio runtime.
#[derive(Debug)]
pub struct ClockMedia {
    url: String,
    tick_interval: Duration,
    duration: Option<Duration>,
    state: Arc<Mutex<ClockState>>,
    ticker: Option<JoinHandle<()>>,
}

impl ClockMedia {
    pub fn new(url: impl Into<String>, tick_interval: Duration, duration: Option<Duration>) -> Self {
        Self {
            url: url.into(),
            tick_interval,
            duration,
            state: Arc::new(Mutex::new(ClockState::default())),
            ticker: None,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn is_playing(&self) -> bool {
        self.state.lock().playing
    }

    pub fn listener_count(&self) -> usize {
        self.state.lock().listeners.len()
    }

    fn stop_ticker(&mut self) {
        if let Some(ticker) = self.ticker.take() {
            ticker.abort();
        }
    }
}

impl MediaHandle for ClockMedia {
    fn play(&mut self) -> Result<(), PlaybackError> {
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| PlaybackError::PlayRejected(format!("no runtime to drive playback: {}", e)))?;

        {
            let mut state = self.state.lock();
            if let Some(duration) = self.duration {
                if state.position >= duration.as_secs_f64() {
                    debug!("Restarting {} from the beginning", self.url);
                    state.position = 0.0;
                }
            }
            state.playing = true;
        }

        self.stop_ticker();
        let state = Arc::clone(&self.state);
        let period = self.tick_interval;
        let end = self.duration.map(|d| d.as_secs_f64());
        self.ticker = Some(runtime.spawn(async move {
            let mut interval = tokio::time::interval(period);
            // First tick completes immediately
            interval.tick().await;
            loop {
                interval.tick().await;
                let mut state = state.lock();
                if !state.playing {
                    break;
                }
                state.position += period.as_secs_f64();
                if let Some(end) = end {
                    if state.position >= end {
                        state.position = end;
                        state.playing = false;
                        state.notify_end();
                        break;
                    }
                }
                state.notify_all();
            }
        }));

        Ok(())
    }

    fn pause(&mut self) {
        self.state.lock().playing = false;
        self.stop_ticker();
    }

    fn stop(&mut self) {
        {
            let mut state = self.state.lock();
            state.playing = false;
            state.position = 0.0;
        }
        self.stop_ticker();
    }

    fn current_time(&self) -> f64 {
        self.state.lock().position
    }

    fn add_time_listener(&mut self, listener: TimeListener) -> ListenerId {
        let mut state = self.state.lock();
        state.next_listener += 1;
        let id = ListenerId(state.next_listener);
        state.listeners.push((id, listener));
        id
    }

    fn remove_time_listener(&mut self, id: ListenerId) -> bool {
        let mut state = self.state.lock();
        let before = state.listeners.len();
        state.listeners.retain(|(listener_id, _)| *listener_id != id);
        state.listeners.len() != before
    }
}

impl Drop for ClockMedia {
    fn drop(&mut self) {
        self.stop_ticker();
    }
}
