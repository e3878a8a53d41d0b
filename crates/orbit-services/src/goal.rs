// crates/orbit-services/src/goal.rs

use chrono::{DateTime, FixedOffset, Utc};
use orbit_core::validation::{optional_text, ValidationErrors};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GoalStatus {
    #[default]
    InProgress,
    Achieved,
}

impl GoalStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            GoalStatus::InProgress => "IN_PROGRESS",
            GoalStatus::Achieved => "ACHIEVED",
        }
    }

    /// ACHIEVED goes back to IN_PROGRESS, anything else becomes ACHIEVED.
    pub fn toggled(self) -> Self {
        match self {
            GoalStatus::Achieved => GoalStatus::InProgress,
            GoalStatus::InProgress => GoalStatus::Achieved,
        }
    }
}

impl fmt::Display for GoalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GoalStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "IN_PROGRESS" => Ok(GoalStatus::InProgress),
            "ACHIEVED" => Ok(GoalStatus::Achieved),
            _ => Err(format!("Unknown goal status: {}", s)),
        }
    }
}

/// Personal goal, visible to its owner only
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Goal {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub description: Option<String>,
    pub status: GoalStatus,
    pub target_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CreateGoalRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub target_date: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewGoal {
    pub title: String,
    pub description: Option<String>,
    pub target_date: Option<DateTime<Utc>>,
}

impl CreateGoalRequest {
    pub fn validate(&self, offset: FixedOffset) -> Result<NewGoal, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let title = errors.require_text("title", self.title.as_deref(), "Title is required");
        let target_date = errors.optional_datetime("targetDate", self.target_date.as_deref(), offset);

        let Some(title) = title else {
            return Err(errors);
        };
        errors.into_result(NewGoal {
            title,
            description: optional_text(self.description.as_deref()),
            target_date,
        })
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
    use super::*;

    #[test]
    fn test_toggle_flips_both_ways() {
        assert_eq!(GoalStatus::InProgress.toggled(), GoalStatus::Achieved);
        assert_eq!(GoalStatus::Achieved.toggled(), GoalStatus::InProgress);
        assert_eq!(GoalStatus::default(), GoalStatus::InProgress);
    }

    #[test]
    fn test_parse() {
        assert_eq!("achieved".parse::<GoalStatus>().unwrap(), GoalStatus::Achieved);
        assert!("DONE".parse::<GoalStatus>().is_err());
    }

    #[test]
    fn test_goal_requires_title() {
        let utc = FixedOffset::east_opt(0).unwrap();
        let errors = CreateGoalRequest::default().validate(utc).unwrap_err();
        assert_eq!(errors.for_field("title"), vec!["Title is required"]);

        let goal = CreateGoalRequest {
            title: Some("Ship v1".into()),
            target_date: Some("2024-06-30".into()),
            ..Default::default()
        }
        .validate(utc)
        .unwrap();
        assert_eq!(goal.title, "Ship v1");
        assert!(goal.target_date.is_some());
    }
}
