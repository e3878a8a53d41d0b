// crates/orbit-services/src/time_log.rs

use chrono::{DateTime, FixedOffset, Utc};
use orbit_core::validation::{optional_text, ValidationErrors};
use serde::{Deserialize, Serialize};

/// Logged work session on a project
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeLog {
    pub id: String,
    pub user_id: String,
    pub project_id: String,
    pub project_title: Option<String>,
    pub description: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub duration_minutes: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CreateTimeLogRequest {
    pub project_id: Option<String>,
    pub description: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTimeLog {
    pub project_id: String,
    pub description: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub duration_minutes: i64,
}

impl CreateTimeLogRequest {
    pub fn validate(&self, offset: FixedOffset) -> Result<NewTimeLog, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let project_id =
            errors.require_text("projectId", self.project_id.as_deref(), "Project is required");
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

        if let (Some(start), Some(end)) = (start_time, end_time) {
            if end < start {
                errors.add("endTime", "End time must be after start time");
            }
        }

        match (project_id, start_time, end_time) {
            (Some(project_id), Some(start_time), Some(end_time)) => errors.into_result(NewTimeLog {
                project_id,
                description: optional_text(self.description.as_deref()),
                start_time,
                end_time,
                duration_minutes: duration_minutes(start_time, end_time),
            }),
            _ => Err(errors),
        }
    }
}

/// Whole minutes between `start` and `end`, rounded half up.
pub fn duration_minutes(start: DateTime<Utc>, end: DateTime<Utc>) -> i64 {
    let seconds = (end - start).num_seconds().max(0);
    (seconds + 30) / 60
}

/// `"{h}h {m}m"` for a minute count.
pub fn format_duration(minutes: i64) -> String {
    let minutes = minutes.max(0);
    format!("{}h {}m", minutes / 60, minutes % 60)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
    use super::*;
    use chrono::TimeZone;

    fn utc() -> FixedOffset {
        FixedOffset::east_opt(0).unwrap()
    }

    fn at(h: u32, m: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 15, h, m, s).unwrap()
    }

    #[test]
    fn test_duration_rounds_to_nearest_minute() {
        assert_eq!(duration_minutes(at(9, 0, 0), at(10, 30, 0)), 90);
        assert_eq!(duration_minutes(at(9, 0, 0), at(9, 0, 29)), 0);
        assert_eq!(duration_minutes(at(9, 0, 0), at(9, 0, 30)), 1);
        assert_eq!(duration_minutes(at(9, 0, 0), at(9, 0, 0)), 0);
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(0), "0h 0m");
        assert_eq!(format_duration(135), "2h 15m");
        assert_eq!(format_duration(60), "1h 0m");
    }

    #[test]
    fn test_valid_log() {
        let request = CreateTimeLogRequest {
            project_id: Some("p1".into()),
            description: Some("Homepage layout".into()),
            start_time: Some("2024-03-15T09:00".into()),
            end_time: Some("2024-03-15T11:15".into()),
        };
        let log = request.validate(utc()).unwrap();
        assert_eq!(log.duration_minutes, 135);
        assert_eq!(log.project_id, "p1");
    }

    #[test]
    fn test_end_before_start() {
        let request = CreateTimeLogRequest {
            project_id: Some("p1".into()),
            start_time: Some("2024-03-15T11:00".into()),
            end_time: Some("2024-03-15T09:00".into()),
            ..Default::default()
        };
        let errors = request.validate(utc()).unwrap_err();
        assert_eq!(errors.for_field("endTime"), vec!["End time must be after start time"]);
    }

    #[test]
    fn test_missing_fields() {
        let errors = CreateTimeLogRequest::default().validate(utc()).unwrap_err();
        assert!(errors.has_field("projectId"));
        assert!(errors.has_field("startTime"));
        assert!(errors.has_field("endTime"));
    }
}
