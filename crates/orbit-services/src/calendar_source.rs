//! `CalendarSource` backed by the workspace database.
//!
//! Each query runs on the blocking pool; the four calendar fetches share
//! one connection behind a mutex.

use std::sync::Arc;

use async_trait::async_trait;
use orbit_calendar::{
    CalendarError, CalendarSource, DateRange, EventRecord, EventWriter, MilestoneRecord, NewEvent,
    ProjectRecord, TaskRecord, UserId,
};
use orbit_core::AppError;
use parking_lot::Mutex;

use crate::workspace_store::{StoreResult, WorkspaceStore};

#[derive(Clone)]
pub struct SqliteCalendarSource {
    store: Arc<Mutex<WorkspaceStore>>,
}

impl SqliteCalendarSource {
    pub fn new(store: WorkspaceStore) -> Self {
        Self::shared(Arc::new(Mutex::new(store)))
    }

    /// Use a store that other services also hold.
    pub fn shared(store: Arc<Mutex<WorkspaceStore>>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> Arc<Mutex<WorkspaceStore>> {
        self.store.clone()
    }

    #[tracing::instrument(skip(self, query), level = "debug")]
    async fn run<T, F>(&self, entity: &'static str, query: F) -> Result<T, CalendarError>
    where
        T: Send + 'static,
        F: FnOnce(&WorkspaceStore) -> StoreResult<T> + Send + 'static,
    {
        let store = self.store.clone();
        tokio::task::spawn_blocking(move || {
            let store = store.lock();
            query(&*store)
        })
        .await
        .map_err(|e| CalendarError::data_access(entity, e.to_string()))?
        .map_err(|e| into_calendar_error(entity, e))
    }
}

fn into_calendar_error(entity: &'static str, err: AppError) -> CalendarError {
    match err {
        AppError::Validation(errors) => CalendarError::Validation(errors),
        other => {
            tracing::error!("Failed to load {}: {}", entity, other);
            CalendarError::data_access(entity, other.to_string())
        }
    }
}

#[async_trait]
impl CalendarSource for SqliteCalendarSource {
    async fn fetch_projects(
        &self,
        user: &UserId,
        range: &DateRange,
    ) -> Result<Vec<ProjectRecord>, CalendarError> {
        let (user, range) = (user.clone(), *range);
        self.run("projects", move |store| store.calendar_projects(&user, &range))
            .await
    }

    async fn fetch_milestones(
        &self,
        user: &UserId,
        range: &DateRange,
    ) -> Result<Vec<MilestoneRecord>, CalendarError> {
        let (user, range) = (user.clone(), *range);
        self.run("milestones", move |store| store.calendar_milestones(&user, &range))
            .await
    }

    async fn fetch_tasks(
        &self,
        user: &UserId,
        range: &DateRange,
    ) -> Result<Vec<TaskRecord>, CalendarError> {
        let (user, range) = (user.clone(), *range);
        self.run("tasks", move |store| store.calendar_tasks(&user, &range))
            .await
    }

    async fn fetch_events(
        &self,
        user: &UserId,
        range: &DateRange,
    ) -> Result<Vec<EventRecord>, CalendarError> {
        let (user, range) = (user.clone(), *range);
        self.run("events", move |store| store.calendar_events(&user, &range))
            .await
    }
}

#[async_trait]
impl EventWriter for SqliteCalendarSource {
    async fn insert_event(
        &self,
        user: &UserId,
        event: NewEvent,
    ) -> Result<EventRecord, CalendarError> {
        let user = user.clone();
        self.run("event", move |store| store.create_event(&user, &event))
            .await
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
    use super::*;
    use chrono::{FixedOffset, NaiveDate};
    use orbit_calendar::{create_event, get_calendar_events, CreateEventRequest, EntryKind};

    fn utc() -> FixedOffset {
        FixedOffset::east_opt(0).unwrap()
    }

    #[tokio::test]
    async fn test_created_event_shows_up_in_calendar() {
        let source = SqliteCalendarSource::new(WorkspaceStore::in_memory().unwrap());
        let user = UserId::new("u1");

        let request = CreateEventRequest {
            title: Some("Standup".into()),
            start_time: Some("2024-03-04T09:00".into()),
            end_time: Some("2024-03-04T09:15".into()),
            event_type: Some("call".into()),
            ..Default::default()
        };
        let stored = create_event(&source, &user, &request, utc()).await.unwrap();
        assert_eq!(stored.event_type, "CALL");

        let focus = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let entries = get_calendar_events(&source, &user, focus, utc()).await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].kind(), EntryKind::Event);
        assert_eq!(entries[0].category.as_deref(), Some("CALL"));

        let other = get_calendar_events(&source, &UserId::new("u2"), focus, utc())
            .await
            .unwrap();
        assert!(other.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_project_is_a_validation_error() {
        let source = SqliteCalendarSource::new(WorkspaceStore::in_memory().unwrap());
        let request = CreateEventRequest {
            title: Some("Review".into()),
            start_time: Some("2024-03-04T09:00".into()),
            end_time: Some("2024-03-04T10:00".into()),
            event_type: Some("MEETING".into()),
            project_id: Some("nope".into()),
            ..Default::default()
        };

        let err = create_event(&source, &UserId::new("u1"), &request, utc())
            .await
            .unwrap_err();
        assert!(err.is_validation());
    }
}
