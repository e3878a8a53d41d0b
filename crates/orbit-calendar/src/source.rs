//! Data-access ports the aggregator reads from.

use async_trait::async_trait;

use crate::error::CalendarError;
use crate::event::NewEvent;
use crate::range::DateRange;
use crate::types::{EventRecord, MilestoneRecord, ProjectRecord, TaskRecord, UserId};

/// Read side of calendar data, scoped to one user.
///
/// Implementations apply the visibility rules: projects the user owns or
/// collaborates on, milestones and tasks of those projects, and the user's
/// own events. Range filtering:
///
/// * projects: `[start_date, end_date]` overlaps `range`
/// * milestones and tasks: `due_date` falls inside `range`
/// * events: `start_time` falls inside `range`
#[async_trait]
pub trait CalendarSource: Send + Sync {
    async fn fetch_projects(
        &self,
        user: &UserId,
        range: &DateRange,
    ) -> Result<Vec<ProjectRecord>, CalendarError>;

    async fn fetch_milestones(
        &self,
        user: &UserId,
        range: &DateRange,
    ) -> Result<Vec<MilestoneRecord>, CalendarError>;

    async fn fetch_tasks(
        &self,
        user: &UserId,
        range: &DateRange,
    ) -> Result<Vec<TaskRecord>, CalendarError>;

    async fn fetch_events(
        &self,
        user: &UserId,
        range: &DateRange,
    ) -> Result<Vec<EventRecord>, CalendarError>;
}

/// Write side for user-created events.
#[async_trait]
pub trait EventWriter: Send + Sync {
    /// Persist `event` as owned by `user` and return the stored row.
    async fn insert_event(
        &self,
        user: &UserId,
        event: NewEvent,
    ) -> Result<EventRecord, CalendarError>;
}
