use anyhow::{anyhow, Result};
use log::{debug, error, info, warn};
use std::io::Write;
use std::str::FromStr;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::mpsc;

use crate::app_config::Config;
use crate::errors::AppError;
use crate::media::clock::ClockMediaBackend;
use crate::media::{MediaBackend, TimeTick, ViewId};
use crate::playback::PlaybackController;
use crate::presenter::{
    EventDetail, MapPresenter, MapSurface, Marker, CLOSE_LABEL, TILE_ATTRIBUTION, TILE_URL_TEMPLATE, TITLE,
};
use crate::providers::http::HttpEventRepository;
use crate::providers::EventSource;
use crate::temporal_range::{
    RangeResponse, ResponseOutcome, TemporalRange, TemporalRangeController, YearBounds,
};
use crate::year_format::format_year;

// @module: Viewer controller, single-threaded event loop

/// A line command typed into the viewer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewerCommand {
    From(i32),
    To(i32),
    List,
    Open(usize),
    Toggle(usize),
    Close(usize),
    /// Close every open detail view, including those detached from markers
    CloseAll,
    Quit,
}

impl FromStr for ViewerCommand {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let mut parts = s.split_whitespace();
        let name = parts.next().ok_or_else(|| anyhow!("Empty command"))?.to_lowercase();
        let arg = parts.next();
        if parts.next().is_some() {
            return Err(anyhow!("Too many arguments: {}", s));
        }

        let year = || -> Result<i32> {
            arg.ok_or_else(|| anyhow!("'{}' expects a year", name))?
                .parse()
                .map_err(|e| anyhow!("Invalid year: {}", e))
        };
        let marker = || -> Result<usize> {
            arg.ok_or_else(|| anyhow!("'{}' expects a marker index", name))?
                .parse()
                .map_err(|e| anyhow!("Invalid marker index: {}", e))
        };

        match name.as_str() {
            "from" => Ok(Self::From(year()?)),
            "to" => Ok(Self::To(year()?)),
            "list" => Ok(Self::List),
            "open" => Ok(Self::Open(marker()?)),
            "toggle" => Ok(Self::Toggle(marker()?)),
            "close" if arg.is_some_and(|a| a.eq_ignore_ascii_case("all")) => Ok(Self::CloseAll),
            "close" => Ok(Self::Close(marker()?)),
            "quit" | "exit" => Ok(Self::Quit),
            _ => Err(anyhow!("Unknown command: {}", name)),
        }
    }
}

/// Whether the event loop keeps running after a command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

enum Signal {
    Input(std::io::Result<Option<String>>),
    Response(RangeResponse),
    Tick(TimeTick),
}

/// Main viewer controller
///
/// Owns the range controller, the playback sessions and the presenter, and
/// multiplexes user commands, query responses and media ticks on one task.
pub struct Controller<S: MapSurface> {
    // @field: App configuration
    config: Config,
    range: TemporalRangeController,
    responses: mpsc::UnboundedReceiver<RangeResponse>,
    playback: PlaybackController,
    ticks: mpsc::UnboundedReceiver<TimeTick>,
    presenter: MapPresenter<S>,
}

impl<S: MapSurface> Controller<S> {
    /// Create a controller over the HTTP backend and headless media
    pub fn with_config(config: Config, surface: S) -> Result<Self, AppError> {
        config.validate()?;
        let source = HttpEventRepository::new(&config.backend_url, config.timeout())?;
        let mut media = ClockMediaBackend::new(config.tick_interval());
        if let Some(length) = config.narration_length() {
            media = media.with_duration(length);
        }
        Self::with_parts(config, Arc::new(source), Arc::new(media), YearBounds::current(), surface)
    }

    /// Create a controller from explicit collaborators
    pub fn with_parts(
        config: Config,
        source: Arc<dyn EventSource>,
        media: Arc<dyn MediaBackend>,
        bounds: YearBounds,
        surface: S,
    ) -> Result<Self, AppError> {
        config.validate()?;
        let initial = TemporalRange::full(bounds);
        let (range, responses) =
            TemporalRangeController::new(source, config.query_limit, bounds, initial);
        let (playback, ticks) = PlaybackController::new(media);
        let mut presenter = MapPresenter::new(surface);
        presenter.center(config.map.center_latitude, config.map.center_longitude, config.map.zoom);

        Ok(Self {
            config,
            range,
            responses,
            playback,
            ticks,
            presenter,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn range(&self) -> &TemporalRangeController {
        &self.range
    }

    pub fn playback(&self) -> &PlaybackController {
        &self.playback
    }

    pub fn presenter(&self) -> &MapPresenter<S> {
        &self.presenter
    }

    /// Issue the query for the current range
    pub fn start(&mut self) -> u64 {
        info!(
            "Showing events from {} to {}",
            format_year(self.range.range().from),
            format_year(self.range.range().to)
        );
        self.range.refresh()
    }

    /// Execute one command
    pub fn execute(&mut self, command: ViewerCommand) -> Flow {
        match command {
            ViewerCommand::From(year) => {
                self.range.set_from(year);
            }
            ViewerCommand::To(year) => {
                self.range.set_to(year);
            }
            ViewerCommand::List => {
                for (index, event) in self.range.events().iter().enumerate() {
                    info!("[{}] {} {}", index, event.year_label(), event.title);
                }
            }
            ViewerCommand::Open(marker) => {
                if self.presenter.open_detail(marker, &mut self.playback).is_none() {
                    warn!("No marker #{}", marker);
                }
            }
            ViewerCommand::Toggle(marker) => match self.presenter.view_for_marker(marker) {
                Some(view) => {
                    if let Err(e) = self.presenter.toggle(view, &mut self.playback) {
                        warn!("Toggle failed: {}", e);
                    }
                }
                None => warn!("Marker #{} has no open detail view", marker),
            },
            ViewerCommand::Close(marker) => match self.presenter.view_for_marker(marker) {
                Some(view) => {
                    self.presenter.close_detail(view, &mut self.playback);
                }
                None => warn!("Marker #{} has no open detail view", marker),
            },
            ViewerCommand::CloseAll => {
                self.presenter.close_all(&mut self.playback);
            }
            ViewerCommand::Quit => return Flow::Quit,
        }
        Flow::Continue
    }

    /// Apply a query response and redraw markers when it was applied
    pub fn handle_response(&mut self, response: RangeResponse) -> ResponseOutcome {
        let outcome = self.range.handle_response(response);
        if let ResponseOutcome::Applied { .. } = outcome {
            self.presenter.render(self.range.snapshot());
        }
        outcome
    }

    /// Consume responses until the one for the latest query arrives
    pub async fn settle(&mut self) -> Option<ResponseOutcome> {
        while let Some(response) = self.responses.recv().await {
            let current = response.seq == self.range.latest_seq();
            let outcome = self.handle_response(response);
            if current {
                return Some(outcome);
            }
        }
        None
    }

    /// Process every tick already delivered
    pub fn drain_ticks(&mut self) -> usize {
        let mut count = 0;
        while let Ok(tick) = self.ticks.try_recv() {
            self.presenter.on_tick(tick, &mut self.playback);
            count += 1;
        }
        count
    }

    /// Detail view open for a marker
    pub fn view_for_marker(&self, marker: usize) -> Option<ViewId> {
        self.presenter.view_for_marker(marker)
    }

    /// Run until `quit`, end of input or an input error, then release every session
    pub async fn run<R: AsyncBufRead + Unpin>(&mut self, input: R) -> Result<(), AppError> {
        let mut lines = input.lines();
        let mut failure = None;
        self.start();

        loop {
            let signal = tokio::select! {
                line = lines.next_line() => Signal::Input(line),
                Some(response) = self.responses.recv() => Signal::Response(response),
                Some(tick) = self.ticks.recv() => Signal::Tick(tick),
            };

            match signal {
                Signal::Input(Err(e)) => {
                    error!("Failed to read command: {}", e);
                    failure = Some(e);
                    break;
                }
                Signal::Input(Ok(None)) => break,
                Signal::Input(Ok(Some(line))) => {
                    if line.trim().is_empty() {
                        continue;
                    }
                    match line.parse::<ViewerCommand>() {
                        Ok(command) => {
                            debug!("Command: {:?}", command);
                            if self.execute(command) == Flow::Quit {
                                break;
                            }
                        }
                        Err(e) => warn!("{}", e),
                    }
                }
                Signal::Response(response) => {
                    self.handle_response(response);
                }
                Signal::Tick(tick) => {
                    self.presenter.on_tick(tick, &mut self.playback);
                }
            }
        }

        self.shutdown();
        match failure {
            Some(e) => Err(e.into()),
            None => Ok(()),
        }
    }

    /// Close every detail view and its playback session
    pub fn shutdown(&mut self) {
        self.presenter.close_all(&mut self.playback);
        self.playback.close_all();
    }
}

/// Map surface that prints to a writer
pub struct ConsoleSurface<W: Write> {
    out: W,
    markers: usize,
}

impl<W: Write> ConsoleSurface<W> {
    pub fn new(mut out: W) -> Self {
        let _ = writeln!(out, "{}", TITLE);
        let _ = writeln!(out, "Tiles {} {}", TILE_URL_TEMPLATE, TILE_ATTRIBUTION);
        Self { out, markers: 0 }
    }

    pub fn marker_count(&self) -> usize {
        self.markers
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> MapSurface for ConsoleSurface<W> {
    fn set_view(&mut self, latitude: f64, longitude: f64, zoom: u8) {
        let _ = writeln!(self.out, "Centered on ({:.4}, {:.4}) at zoom {}", latitude, longitude, zoom);
    }

    fn clear_markers(&mut self) {
        self.markers = 0;
    }

    fn add_marker(&mut self, marker: &Marker) {
        self.markers += 1;
        let _ = writeln!(
            self.out,
            "[{}] ({:.4}, {:.4}) {}",
            marker.index, marker.latitude, marker.longitude, marker.title
        );
    }

    fn show_detail(&mut self, detail: &EventDetail) {
        let _ = writeln!(self.out, "== {} ({})", detail.title, detail.year_label);
        if !detail.description.is_empty() {
            let _ = writeln!(self.out, "   {}", detail.description);
        }
        if let Some(thumbnail) = &detail.thumbnail {
            let _ = writeln!(self.out, "   image: {}", thumbnail);
        }
        if let Some(narration) = &detail.narration {
            let _ = writeln!(self.out, "   [{}]", narration.button_label);
        }
        if let Some(cue) = &detail.cue_text {
            let _ = writeln!(self.out, "   > {}", cue);
        }
        let _ = self.out.flush();
    }

    fn hide_detail(&mut self, _view: ViewId) {
        let _ = writeln!(self.out, "   [{}]", CLOSE_LABEL);
    }
}
