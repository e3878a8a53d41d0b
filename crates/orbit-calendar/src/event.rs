//! Event creation input and validation.

use chrono::{DateTime, FixedOffset, Utc};
use orbit_core::validation::{optional_text, ValidationErrors};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Kind of a user-created calendar event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventType {
    Meeting,
    Call,
    Deadline,
    Block,
}

impl EventType {
    pub fn as_str(self) -> &'static str {
        match self {
            EventType::Meeting => "MEETING",
            EventType::Call => "CALL",
            EventType::Deadline => "DEADLINE",
            EventType::Block => "BLOCK",
        }
    }

    pub fn all() -> &'static [EventType] {
        &[
            EventType::Meeting,
            EventType::Call,
            EventType::Deadline,
            EventType::Block,
        ]
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EventType::all()
            .iter()
            .copied()
            .find(|t| t.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("Unknown event type: {}", s))
    }
}

/// Raw "create event" form input. Every field is optional here so that
/// missing fields turn into validation messages instead of parse errors.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateEventRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    #[serde(rename = "type")]
    pub event_type: Option<String>,
    pub project_id: Option<String>,
}

/// Validated event ready to be stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEvent {
    pub title: String,
    pub description: Option<String>,
    pub event_type: EventType,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub project_id: Option<String>,
}

impl CreateEventRequest {
    /// Validate every field, reporting all problems at once.
    ///
    /// Local times without an offset are read at `offset`.
    ///
    /// # Errors
    /// Returns the collected [`ValidationErrors`] when any field is invalid.
    pub fn validate(&self, offset: FixedOffset) -> Result<NewEvent, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let title = errors.require_text("title", self.title.as_deref(), "Title is required");
        let start_time = errors.require_datetime(
            "startTime",
            self.start_time.as_deref(),
            offset,
            "Start time is required",
        );
        let end_time = errors.require_datetime(
            "endTime",
            self.end_time.as_deref(),
            offset,
            "End time is required",
        );

        let event_type = match self.event_type.as_deref().map(str::trim) {
            None | Some("") => {
                errors.add("type", "Type is required");
                None
            }
            Some(raw) => match raw.parse::<EventType>() {
                Ok(t) => Some(t),
                Err(_) => {
                    errors.add("type", "Type must be one of MEETING, CALL, DEADLINE, BLOCK");
                    None
                }
            },
        };

        if let (Some(start), Some(end)) = (start_time, end_time) {
            if end < start {
                errors.add("endTime", "End time must be after start time");
            }
        }

        match (title, start_time, end_time, event_type) {
            (Some(title), Some(start_time), Some(end_time), Some(event_type)) => errors
                .into_result(NewEvent {
                    title,
                    description: optional_text(self.description.as_deref()),
                    event_type,
                    start_time,
                    end_time,
                    project_id: optional_text(self.project_id.as_deref()),
                }),
            _ => Err(errors),
        }
    }
}
