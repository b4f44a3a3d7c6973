/*!
 * Map presentation glue.
 *
 * The map itself (tiles, panning, zoom) belongs to an external mapping
 * library reached through `MapSurface`. The presenter places one marker per
 * displayed event and turns detail-view open/close into playback session
 * creation and destruction.
 */

use log::{debug, info, warn};
use std::collections::HashMap;
use std::sync::Arc;

use crate::errors::PlaybackError;
use crate::event_model::Event;
use crate::media::{TimeTick, ViewId};
use crate::playback::{PlaybackController, PlaybackSession, PlaybackState, TickOutcome};

/// Header shown above the map
pub const TITLE: &str = "Paris • 23 siècles d'histoires";

/// OpenStreetMap tile template
pub const TILE_URL_TEMPLATE: &str = "https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png";

/// Fixed attribution of the tile layer
pub const TILE_ATTRIBUTION: &str = "© OpenStreetMap contributors";

/// Label of the detail view's close control
pub const CLOSE_LABEL: &str = "Fermer";

/// Marker placed for one event
#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    /// Position in the displayed event list
    pub index: usize,
    pub latitude: f64,
    pub longitude: f64,
    pub title: String,
}

/// Narration controls of a detail view
#[derive(Debug, Clone, PartialEq)]
pub struct NarrationControls {
    pub state: PlaybackState,
    pub button_label: &'static str,
}

/// Everything a detail view displays for one event
#[derive(Debug, Clone, PartialEq)]
pub struct EventDetail {
    pub view: ViewId,
    pub title: String,
    pub year_label: String,
    pub description: String,
    pub thumbnail: Option<String>,
    /// Absent when the event has no narration
    pub narration: Option<NarrationControls>,
    pub cue_text: Option<String>,
    pub close_label: &'static str,
}

impl EventDetail {
    pub fn build(view: ViewId, event: &Event, session: Option<&PlaybackSession>) -> Self {
        Self {
            view,
            title: event.title.clone(),
            year_label: event.year_label(),
            description: event.description.clone(),
            thumbnail: event.thumbnail().map(str::to_string),
            narration: session.map(|s| NarrationControls {
                state: s.state(),
                button_label: s.state().toggle_label(),
            }),
            cue_text: session.and_then(|s| s.active_cue()).map(|cue| cue.text.clone()),
            close_label: CLOSE_LABEL,
        }
    }
}

/// Rendering surface provided by the mapping library
pub trait MapSurface {
    /// Center the map
    fn set_view(&mut self, latitude: f64, longitude: f64, zoom: u8);

    /// Remove every marker
    fn clear_markers(&mut self);

    /// Place a marker
    fn add_marker(&mut self, marker: &Marker);

    /// Show or refresh a detail view
    fn show_detail(&mut self, detail: &EventDetail);

    /// Hide a detail view
    fn hide_detail(&mut self, view: ViewId);
}

struct OpenView {
    /// Marker the view was opened from, cleared when the markers are replaced
    marker: Option<usize>,
    event: Arc<Event>,
}

/// Places markers and manages detail views over a [`MapSurface`]
pub struct MapPresenter<S: MapSurface> {
    surface: S,
    events: Arc<Vec<Event>>,
    views: HashMap<ViewId, OpenView>,
}

impl<S: MapSurface> MapPresenter<S> {
    pub fn new(surface: S) -> Self {
        Self {
            surface,
            events: Arc::new(Vec::new()),
            views: HashMap::new(),
        }
    }

    /// Initial viewport of the underlying map
    pub fn center(&mut self, latitude: f64, longitude: f64, zoom: u8) {
        self.surface.set_view(latitude, longitude, zoom);
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn open_views(&self) -> usize {
        self.views.len()
    }

    /// Replace all markers with one per event
    ///
    /// Open detail views keep their own copy of the event and stay open, but
    /// no longer belong to any marker: indices now refer to the new list.
    pub fn render(&mut self, events: Arc<Vec<Event>>) {
        let mut detached = 0;
        for open in self.views.values_mut() {
            if open.marker.take().is_some() {
                detached += 1;
            }
        }
        if detached > 0 {
            debug!("{} open detail views detached from their markers", detached);
        }

        self.surface.clear_markers();
        for (index, event) in events.iter().enumerate() {
            self.surface.add_marker(&Marker {
                index,
                latitude: event.latitude,
                longitude: event.longitude,
                title: event.title.clone(),
            });
        }
        self.events = events;
    }

    /// Detail view currently open for a marker
    pub fn view_for_marker(&self, marker: usize) -> Option<ViewId> {
        self.views
            .iter()
            .find(|(_, open)| open.marker == Some(marker))
            .map(|(view, _)| *view)
    }

    /// Open the detail view of a marker, creating its playback session
    ///
    /// Returns `None` for an unknown marker. A marker whose view is already
    /// open returns that view. When the narration cannot be opened the view
    /// is shown without narration controls.
    pub fn open_detail(&mut self, marker: usize, playback: &mut PlaybackController) -> Option<ViewId> {
        if let Some(view) = self.view_for_marker(marker) {
            return Some(view);
        }
        let event = Arc::new(self.events.get(marker)?.clone());
        let view = ViewId::new();

        if let Err(e) = playback.open(view, Arc::clone(&event)) {
            warn!("Narration unavailable for \"{}\": {}", event.title, e);
        }
        info!("Opened detail view for \"{}\"", event.title);

        self.surface
            .show_detail(&EventDetail::build(view, &event, playback.session(view)));
        self.views.insert(
            view,
            OpenView {
                marker: Some(marker),
                event,
            },
        );
        Some(view)
    }

    /// Close a detail view and destroy its playback session
    pub fn close_detail(&mut self, view: ViewId, playback: &mut PlaybackController) -> bool {
        if self.views.remove(&view).is_none() {
            return false;
        }
        playback.close(view);
        self.surface.hide_detail(view);
        true
    }

    /// Toggle narration of an open view and refresh it
    pub fn toggle(
        &mut self,
        view: ViewId,
        playback: &mut PlaybackController,
    ) -> Result<PlaybackState, PlaybackError> {
        let result = playback.toggle(view);
        self.refresh(view, playback);
        result
    }

    /// Route a timestamp tick, refreshing the view when its cue or state changed
    pub fn on_tick(&mut self, tick: TimeTick, playback: &mut PlaybackController) -> TickOutcome {
        let outcome = playback.handle_tick(tick);
        if matches!(outcome, TickOutcome::CueChanged | TickOutcome::Ended) {
            self.refresh(tick.view, playback);
        }
        outcome
    }

    /// Close every open view
    pub fn close_all(&mut self, playback: &mut PlaybackController) {
        let views: Vec<ViewId> = self.views.keys().copied().collect();
        for view in views {
            self.close_detail(view, playback);
        }
    }

    fn refresh(&mut self, view: ViewId, playback: &PlaybackController) {
        if let Some(open) = self.views.get(&view) {
            let detail = EventDetail::build(view, &open.event, playback.session(view));
            self.surface.show_detail(&detail);
        }
    }
}
