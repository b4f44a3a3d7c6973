use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

use crate::errors::FetchError;
use crate::year_format::format_year;

// @module: Event and cue entities as served by the backend

/// Identifier of an event, numeric or textual depending on the backend
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EventId {
    Number(i64),
    Text(String),
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{}", n),
            Self::Text(s) => write!(f, "{}", s),
        }
    }
}

// @struct: Time-bounded subtitle fragment of a narration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cue {
    // @field: Start in seconds
    pub start: f64,

    // @field: End in seconds, expected >= start
    pub end: f64,

    // @field: Subtitle text
    pub text: String,
}

impl Cue {
    pub fn new(start: f64, end: f64, text: impl Into<String>) -> Self {
        Self {
            start,
            end,
            text: text.into(),
        }
    }

    /// Inclusive on both ends
    pub fn contains(&self, t: f64) -> bool {
        self.start <= t && t <= self.end
    }

    /// False for cues whose bounds are inverted or not finite; such cues never match
    pub fn is_well_formed(&self) -> bool {
        self.start.is_finite() && self.end.is_finite() && self.start <= self.end
    }
}

/// A dated, geolocated historical record
///
/// Events are immutable once decoded. Optional fields that are missing or
/// `null` in the payload decode as absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Backend identifier, absent on some legacy records
    #[serde(default)]
    pub id: Option<EventId>,

    pub title: String,

    #[serde(default)]
    pub description: String,

    /// Negative years are BCE
    pub year: i32,

    pub latitude: f64,

    pub longitude: f64,

    /// Ordered image URLs, the first one is the thumbnail
    #[serde(default, deserialize_with = "null_as_empty")]
    pub images: Vec<String>,

    #[serde(default)]
    pub audio_url: Option<String>,

    #[serde(default)]
    pub subtitles: Option<Vec<Cue>>,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}

impl Event {
    /// Narration URL, treating an empty string as no narration
    pub fn narration_url(&self) -> Option<&str> {
        self.audio_url.as_deref().filter(|url| !url.trim().is_empty())
    }

    pub fn has_narration(&self) -> bool {
        self.narration_url().is_some()
    }

    pub fn thumbnail(&self) -> Option<&str> {
        self.images
            .first()
            .map(String::as_str)
            .filter(|url| !url.is_empty())
    }

    /// Subtitle cues, empty when the event has none
    pub fn cues(&self) -> &[Cue] {
        self.subtitles.as_deref().unwrap_or(&[])
    }

    pub fn year_label(&self) -> String {
        format_year(self.year)
    }
}

/// Decode a JSON array of events
pub fn decode_events(payload: &str) -> Result<Vec<Event>, FetchError> {
    let events: Vec<Event> = serde_json::from_str(payload)?;
    Ok(events)
}
