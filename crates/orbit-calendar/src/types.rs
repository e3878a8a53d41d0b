//! Calendar entry types and the source records they are built from.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity of the user an aggregation runs for.
///
/// Every data-access call receives this explicitly; visibility rules are
/// applied against it by the source.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UserId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Origin of a calendar entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntryKind {
    Project,
    Milestone,
    Task,
    Event,
}

impl EntryKind {
    /// Title prefix marking the origin; events keep their raw title.
    pub fn title_tag(self) -> Option<&'static str> {
        match self {
            EntryKind::Project => Some("[PROJ]"),
            EntryKind::Milestone => Some("[MILE]"),
            EntryKind::Task => Some("[TASK]"),
            EntryKind::Event => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            EntryKind::Project => "PROJECT",
            EntryKind::Milestone => "MILESTONE",
            EntryKind::Task => "TASK",
            EntryKind::Event => "EVENT",
        }
    }
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Back-reference to the project owning an entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectRef {
    pub id: String,
    pub name: String,
}

/// Unified, display-only calendar record.
///
/// `id` is only unique within one [`EntryKind`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarEntry {
    pub id: String,
    pub title: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    kind: EntryKind,
    pub category: Option<String>,
    pub project: Option<ProjectRef>,
    pub status: Option<String>,
}

impl CalendarEntry {
    /// Build an entry of `kind`, tagging the title and clamping `end` so
    /// that `start <= end` always holds.
    pub(crate) fn new(
        kind: EntryKind,
        id: String,
        title: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Self {
        let title = match kind.title_tag() {
            Some(tag) => format!("{} {}", tag, title),
            None => title.to_string(),
        };

        let end = if end < start {
            tracing::debug!(%kind, %id, "entry ends before it starts, clamping end to start");
            start
        } else {
            end
        };

        Self {
            id,
            title,
            start,
            end,
            kind,
            category: None,
            project: None,
            status: None,
        }
    }

    pub fn kind(&self) -> EntryKind {
        self.kind
    }

    /// Whether the entry covers a single instant (milestones, tasks).
    pub fn is_point_in_time(&self) -> bool {
        self.start == self.end
    }
}

/// Project row as returned by the data-access layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectRecord {
    pub id: String,
    pub title: String,
    pub status: String,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
}

/// Milestone row joined with its project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MilestoneRecord {
    pub id: String,
    pub title: String,
    pub status: String,
    pub due_date: Option<DateTime<Utc>>,
    pub project_id: String,
    pub project_title: String,
}

/// Task row joined with its project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskRecord {
    pub id: String,
    pub title: String,
    pub status: String,
    pub due_date: Option<DateTime<Utc>>,
    pub project_id: String,
    pub project_title: String,
}

/// Calendar event row, optionally joined with a project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub event_type: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub project_id: Option<String>,
    pub project_title: Option<String>,
}
