//! Aggregation tests against an in-memory source.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, NaiveDate, TimeZone, Utc, Weekday};
use orbit_calendar::{
    create_event, get_calendar_events, month_view, CalendarError, CalendarSource,
    CreateEventRequest, DateRange, EntryKind, EventRecord, EventWriter, GridOptions,
    MilestoneRecord, NewEvent, ProjectRecord, TaskRecord, UserId,
};
use std::sync::Mutex;

fn ts(m: u32, d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, m, d, 0, 0, 0).unwrap()
}

fn date(m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, m, d).unwrap()
}

fn utc() -> FixedOffset {
    FixedOffset::east_opt(0).unwrap()
}

/// Fixed data filtered the way a real store would filter it.
#[derive(Default)]
struct FakeSource {
    projects: Vec<ProjectRecord>,
    milestones: Vec<MilestoneRecord>,
    tasks: Vec<TaskRecord>,
    events: Vec<EventRecord>,
    fail_tasks: bool,
    seen_ranges: Mutex<Vec<DateRange>>,
}

#[async_trait]
impl CalendarSource for FakeSource {
    async fn fetch_projects(
        &self,
        _user: &UserId,
        range: &DateRange,
    ) -> Result<Vec<ProjectRecord>, CalendarError> {
        self.seen_ranges.lock().unwrap().push(*range);
        Ok(self
            .projects
            .iter()
            .filter(|p| match (p.start_date, p.end_date) {
                (Some(start), Some(end)) => range.overlaps(start, end),
                _ => false,
            })
            .cloned()
            .collect())
    }

    async fn fetch_milestones(
        &self,
        _user: &UserId,
        range: &DateRange,
    ) -> Result<Vec<MilestoneRecord>, CalendarError> {
        Ok(self
            .milestones
            .iter()
            .filter(|m| m.due_date.is_some_and(|d| range.contains(d)))
            .cloned()
            .collect())
    }

    async fn fetch_tasks(
        &self,
        _user: &UserId,
        range: &DateRange,
    ) -> Result<Vec<TaskRecord>, CalendarError> {
        if self.fail_tasks {
            return Err(CalendarError::data_access("tasks", "connection reset"));
        }
        Ok(self
            .tasks
            .iter()
            .filter(|t| t.due_date.is_some_and(|d| range.contains(d)))
            .cloned()
            .collect())
    }

    async fn fetch_events(
        &self,
        _user: &UserId,
        range: &DateRange,
    ) -> Result<Vec<EventRecord>, CalendarError> {
        Ok(self
            .events
            .iter()
            .filter(|e| range.contains(e.start_time))
            .cloned()
            .collect())
    }
}

#[derive(Default)]
struct FakeWriter {
    stored: Mutex<Vec<(UserId, NewEvent)>>,
}

#[async_trait]
impl EventWriter for FakeWriter {
    async fn insert_event(
        &self,
        user: &UserId,
        event: NewEvent,
    ) -> Result<EventRecord, CalendarError> {
        let record = EventRecord {
            id: "e-new".into(),
            title: event.title.clone(),
            description: event.description.clone(),
            event_type: event.event_type.to_string(),
            start_time: event.start_time,
            end_time: event.end_time,
            project_id: event.project_id.clone(),
            project_title: None,
        };
        self.stored.lock().unwrap().push((user.clone(), event));
        Ok(record)
    }
}

fn march_source() -> FakeSource {
    FakeSource {
        projects: vec![ProjectRecord {
            id: "p1".into(),
            title: "Acme Site".into(),
            status: "ACTIVE".into(),
            start_date: Some(ts(3, 10)),
            end_date: Some(ts(3, 14)),
        }],
        milestones: vec![MilestoneRecord {
            id: "m1".into(),
            title: "Design sign-off".into(),
            status: "PENDING".into(),
            due_date: Some(ts(3, 15)),
            project_id: "p1".into(),
            project_title: "Acme Site".into(),
        }],
        tasks: vec![
            TaskRecord {
                id: "t1".into(),
                title: "Wireframes".into(),
                status: "TODO".into(),
                due_date: None,
                project_id: "p1".into(),
                project_title: "Acme Site".into(),
            },
            TaskRecord {
                id: "t2".into(),
                title: "Old audit".into(),
                status: "DONE".into(),
                due_date: Some(ts(1, 5)),
                project_id: "p1".into(),
                project_title: "Acme Site".into(),
            },
        ],
        events: vec![EventRecord {
            id: "e1".into(),
            title: "Call with client".into(),
            description: None,
            event_type: "CALL".into(),
            start_time: Utc.with_ymd_and_hms(2024, 4, 2, 9, 0, 0).unwrap(),
            end_time: Utc.with_ymd_and_hms(2024, 4, 2, 10, 0, 0).unwrap(),
            project_id: None,
            project_title: None,
        }],
        ..FakeSource::default()
    }
}

#[tokio::test]
async fn test_march_2024_aggregation() {
    let source = march_source();
    let user = UserId::new("u1");

    let entries = get_calendar_events(&source, &user, date(3, 1), utc())
        .await
        .unwrap();

    let summary: Vec<(&str, EntryKind, &str)> = entries
        .iter()
        .map(|e| (e.id.as_str(), e.kind(), e.title.as_str()))
        .collect();
    assert_eq!(
        summary,
        vec![
            ("p1", EntryKind::Project, "[PROJ] Acme Site"),
            ("m1", EntryKind::Milestone, "[MILE] Design sign-off"),
            ("e1", EntryKind::Event, "Call with client"),
        ]
    );

    let ranges = source.seen_ranges.lock().unwrap();
    assert_eq!(ranges[0].start, ts(2, 23));
    assert_eq!(ranges[0].end, Utc.with_ymd_and_hms(2024, 4, 7, 23, 59, 59).unwrap());
}

#[tokio::test]
async fn test_month_view_buckets_entries() {
    let source = march_source();
    let options = GridOptions::new(Weekday::Sun, utc(), date(3, 20));

    let grid = month_view(&source, &UserId::new("u1"), date(3, 1), &options)
        .await
        .unwrap();

    assert_eq!(grid.days.len(), 42);
    for d in 10..=14 {
        let cell = grid.day(date(3, d)).unwrap();
        assert!(cell.entries.iter().any(|e| e.id == "p1"), "day {}", d);
    }
    assert!(grid.day(date(3, 9)).unwrap().entries.is_empty());

    let with_milestone: Vec<NaiveDate> = grid
        .days
        .iter()
        .filter(|c| c.entries.iter().any(|e| e.id == "m1"))
        .map(|c| c.date)
        .collect();
    assert_eq!(with_milestone, vec![date(3, 15)]);

    // Adjacent-month cells are populated from the padded range.
    let april = grid.day(date(4, 2)).unwrap();
    assert!(!april.in_focus_month);
    assert_eq!(april.entries.len(), 1);
    assert_eq!(april.entries[0].id, "e1");
}

#[tokio::test]
async fn test_failed_fetch_fails_whole_call() {
    let source = FakeSource {
        fail_tasks: true,
        ..march_source()
    };

    let err = get_calendar_events(&source, &UserId::new("u1"), date(3, 1), utc())
        .await
        .unwrap_err();

    assert!(matches!(err, CalendarError::DataAccess { entity: "tasks", .. }));
}

#[tokio::test]
async fn test_empty_sources() {
    let source = FakeSource::default();
    let entries = get_calendar_events(&source, &UserId::new("u1"), date(3, 1), utc())
        .await
        .unwrap();
    assert!(entries.is_empty());
}

#[tokio::test]
async fn test_create_event_validates_before_writing() {
    let writer = FakeWriter::default();
    let user = UserId::new("u1");

    let err = create_event(&writer, &user, &CreateEventRequest::default(), utc())
        .await
        .unwrap_err();
    assert!(err.is_validation());
    assert!(writer.stored.lock().unwrap().is_empty());

    let request = CreateEventRequest {
        title: Some("Kickoff".into()),
        start_time: Some("2024-03-15T09:00".into()),
        end_time: Some("2024-03-15T10:00".into()),
        event_type: Some("MEETING".into()),
        ..CreateEventRequest::default()
    };
    let stored = create_event(&writer, &user, &request, utc()).await.unwrap();

    assert_eq!(stored.event_type, "MEETING");
    let writes = writer.stored.lock().unwrap();
    assert_eq!(writes.len(), 1);
    assert_eq!(writes[0].0, user);
}
