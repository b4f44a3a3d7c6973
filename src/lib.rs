/*!
 * # histomap - historical events on a map, with narrated subtitles
 *
 * A Rust library for browsing a geographically and temporally indexed
 * corpus of historical events.
 *
 * ## Features
 *
 * - Query events for a year window from an HTTP backend
 * - Discard out-of-order query responses so stale results never overwrite newer ones
 * - One marker per event, detail views with thumbnail and year label
 * - Play/pause narration and show the subtitle cue matching the playback position
 * - Guaranteed release of media resources when a detail view closes
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `app_config`: Configuration management
 * - `event_model`: Event and cue entities
 * - `year_format`: Year display rule
 * - `providers`: Event sources:
 *   - `providers::http`: Backend events endpoint client
 * - `temporal_range`: Year range selection and race-free result application
 * - `cue_sync`: Active cue lookup
 * - `media`: Native media boundary:
 *   - `media::clock`: Headless clock-driven media
 * - `playback`: Playback sessions and their state machine
 * - `presenter`: Markers and detail views over a map surface
 * - `app_controller`: Single-threaded viewer event loop
 * - `errors`: Custom error types for the application
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
#![allow(clippy::uninlined_format_args)]

// Public modules
pub mod app_config;
pub mod app_controller;
pub mod cue_sync;
pub mod errors;
pub mod event_model;
pub mod media;
pub mod playback;
pub mod presenter;
pub mod providers;
pub mod temporal_range;
pub mod year_format;

// Re-export main types for easier usage
pub use app_config::Config;
pub use cue_sync::active_cue;
pub use errors::{AppError, FetchError, PlaybackError};
pub use event_model::{Cue, Event};
pub use playback::{PlaybackController, PlaybackSession, PlaybackState};
pub use temporal_range::{TemporalRange, TemporalRangeController};
pub use year_format::format_year;
