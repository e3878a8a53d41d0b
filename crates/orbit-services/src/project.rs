// crates/orbit-services/src/project.rs

use chrono::{DateTime, FixedOffset, Utc};
use orbit_core::validation::{optional_text, ValidationErrors};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::finance::{amount_from_percentage, percentage_from_amount, MAX_TOTAL_SPLIT};

/// Project lifecycle state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProjectStatus {
    #[default]
    Active,
    Completed,
    Archived,
}

impl ProjectStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ProjectStatus::Active => "ACTIVE",
            ProjectStatus::Completed => "COMPLETED",
            ProjectStatus::Archived => "ARCHIVED",
        }
    }

    pub fn all() -> &'static [ProjectStatus] {
        &[
            ProjectStatus::Active,
            ProjectStatus::Completed,
            ProjectStatus::Archived,
        ]
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Priority {
    High,
    #[default]
    Medium,
    Low,
}

impl Priority {
    pub fn as_str(self) -> &'static str {
        match self {
            Priority::High => "HIGH",
            Priority::Medium => "MEDIUM",
            Priority::Low => "LOW",
        }
    }

    pub fn all() -> &'static [Priority] {
        &[Priority::High, Priority::Medium, Priority::Low]
    }
}

/// Payment state of a milestone
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MilestoneStatus {
    #[default]
    Pending,
    Paid,
    Overdue,
}

impl MilestoneStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            MilestoneStatus::Pending => "PENDING",
            MilestoneStatus::Paid => "PAID",
            MilestoneStatus::Overdue => "OVERDUE",
        }
    }

    pub fn all() -> &'static [MilestoneStatus] {
        &[
            MilestoneStatus::Pending,
            MilestoneStatus::Paid,
            MilestoneStatus::Overdue,
        ]
    }
}

/// Task status on the project board
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    #[default]
    Todo,
    InProgress,
    Done,
}

impl TaskStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            TaskStatus::Todo => "TODO",
            TaskStatus::InProgress => "IN_PROGRESS",
            TaskStatus::Done => "DONE",
        }
    }

    pub fn all() -> &'static [TaskStatus] {
        &[TaskStatus::Todo, TaskStatus::InProgress, TaskStatus::Done]
    }
}

macro_rules! impl_status_text {
    ($($ty:ident => $label:literal),* $(,)?) => {
        $(
            impl fmt::Display for $ty {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    f.write_str(self.as_str())
                }
            }

            impl FromStr for $ty {
                type Err = String;

                fn from_str(s: &str) -> Result<Self, Self::Err> {
                    $ty::all()
                        .iter()
                        .copied()
                        .find(|v| v.as_str().eq_ignore_ascii_case(s.trim()))
                        .ok_or_else(|| format!("Unknown {}: {}", $label, s))
                }
            }
        )*
    };
}

impl_status_text!(
    ProjectStatus => "project status",
    Priority => "priority",
    MilestoneStatus => "milestone status",
    TaskStatus => "task status",
);

/// Client project owned by one user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: String,
    pub owner_id: String,
    pub title: String,
    pub description: Option<String>,
    pub client_name: Option<String>,
    pub status: ProjectStatus,
    pub priority: Priority,
    pub total_budget: f64,
    pub currency: String,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Person working on a project; `user_id` is set once the email matches
/// a known user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Collaborator {
    pub id: String,
    pub project_id: String,
    pub user_id: Option<String>,
    pub email: String,
    pub role: String,
    pub color: Option<String>,
    pub split_percentage: f64,
}

/// Billable phase of a project
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Milestone {
    pub id: String,
    pub project_id: String,
    pub title: String,
    pub amount: f64,
    pub percentage: Option<f64>,
    pub status: MilestoneStatus,
    pub due_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub project_id: String,
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub due_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Raw "new project" form, optionally with milestones and collaborators
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CreateProjectRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub client_name: Option<String>,
    pub total_budget: Option<f64>,
    pub currency: Option<String>,
    pub priority: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub milestones: Vec<CreateMilestoneRequest>,
    pub collaborators: Vec<CreateCollaboratorRequest>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewProject {
    pub title: String,
    pub description: Option<String>,
    pub client_name: Option<String>,
    pub priority: Priority,
    pub total_budget: f64,
    pub currency: String,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub milestones: Vec<NewMilestone>,
    pub collaborators: Vec<NewCollaborator>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CreateMilestoneRequest {
    pub title: Option<String>,
    pub amount: Option<f64>,
    pub percentage: Option<f64>,
    pub due_date: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewMilestone {
    pub title: String,
    pub amount: f64,
    pub percentage: Option<f64>,
    pub due_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CreateCollaboratorRequest {
    pub email: Option<String>,
    pub role: Option<String>,
    pub color: Option<String>,
    pub split_percentage: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewCollaborator {
    pub email: String,
    pub role: String,
    pub color: Option<String>,
    pub split_percentage: f64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CreateTaskRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<String>,
    pub due_date: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTask {
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub due_date: Option<DateTime<Utc>>,
}

impl CreateProjectRequest {
    /// Validate the project and every nested milestone and collaborator.
    ///
    /// Nested fields are reported as `milestones[i].field` and
    /// `collaborators[i].field`.
    pub fn validate(
        &self,
        offset: FixedOffset,
        default_currency: &str,
    ) -> Result<NewProject, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let title = errors.require_text("title", self.title.as_deref(), "Title is required");

        let total_budget = self.total_budget.unwrap_or(0.0);
        if total_budget < 0.0 || !total_budget.is_finite() {
            errors.add("totalBudget", "Budget cannot be negative");
        }

        let priority = match optional_text(self.priority.as_deref()) {
            None => Priority::default(),
            Some(raw) => raw.parse().unwrap_or_else(|_| {
                errors.add("priority", "Priority must be one of HIGH, MEDIUM, LOW");
                Priority::default()
            }),
        };

        let start_date = errors.optional_datetime("startDate", self.start_date.as_deref(), offset);
        let end_date = errors.optional_datetime("endDate", self.end_date.as_deref(), offset);
        if let (Some(start), Some(end)) = (start_date, end_date) {
            if end < start {
                errors.add("endDate", "End date must be after start date");
            }
        }

        let milestones: Vec<NewMilestone> = self
            .milestones
            .iter()
            .enumerate()
            .filter_map(|(i, m)| {
                m.collect(&format!("milestones[{}].", i), total_budget, offset, &mut errors)
            })
            .collect();

        let collaborators: Vec<NewCollaborator> = self
            .collaborators
            .iter()
            .enumerate()
            .filter_map(|(i, c)| c.collect(&format!("collaborators[{}].", i), &mut errors))
            .collect();
        check_total_split(
            collaborators.iter().map(|c| c.split_percentage),
            "collaborators",
            &mut errors,
        );

        let Some(title) = title else {
            return Err(errors);
        };

        errors.into_result(NewProject {
            title,
            description: optional_text(self.description.as_deref()),
            client_name: optional_text(self.client_name.as_deref()),
            priority,
            total_budget,
            currency: optional_text(self.currency.as_deref())
                .map(|c| c.to_ascii_uppercase())
                .unwrap_or_else(|| default_currency.to_string()),
            start_date,
            end_date,
            milestones,
            collaborators,
        })
    }
}

impl CreateMilestoneRequest {
    /// Validate against the owning project's budget.
    ///
    /// A missing amount is derived from the percentage and vice versa when
    /// the budget is positive.
    pub fn validate(
        &self,
        budget: f64,
        offset: FixedOffset,
    ) -> Result<NewMilestone, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        match self.collect("", budget, offset, &mut errors) {
            Some(milestone) => errors.into_result(milestone),
            None => Err(errors),
        }
    }

    fn collect(
        &self,
        prefix: &str,
        budget: f64,
        offset: FixedOffset,
        errors: &mut ValidationErrors,
    ) -> Option<NewMilestone> {
        let title = errors.require_text(
            &format!("{}title", prefix),
            self.title.as_deref(),
            "Title is required",
        );

        if let Some(pct) = self.percentage {
            if !(0.0..=100.0).contains(&pct) {
                errors.add(format!("{}percentage", prefix), "Percentage must be between 0 and 100");
            }
        }

        let amount = self
            .amount
            .or_else(|| self.percentage.and_then(|pct| amount_from_percentage(budget, pct)));
        let percentage = self
            .percentage
            .or_else(|| amount.and_then(|amount| percentage_from_amount(budget, amount)));

        let amount = match amount {
            Some(a) if a > 0.0 && a.is_finite() => Some(a),
            _ => {
                errors.add(format!("{}amount", prefix), "Amount must be greater than 0");
                None
            }
        };

        let due_date =
            errors.optional_datetime(&format!("{}dueDate", prefix), self.due_date.as_deref(), offset);

        Some(NewMilestone {
            title: title?,
            amount: amount?,
            percentage,
            due_date,
        })
    }
}

impl CreateCollaboratorRequest {
    pub fn validate(&self) -> Result<NewCollaborator, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        match self.collect("", &mut errors) {
            Some(collaborator) => errors.into_result(collaborator),
            None => Err(errors),
        }
    }

    fn collect(&self, prefix: &str, errors: &mut ValidationErrors) -> Option<NewCollaborator> {
        let email = errors.require_text(
            &format!("{}email", prefix),
            self.email.as_deref(),
            "Email is required",
        );
        if let Some(email) = &email {
            if !email.contains('@') {
                errors.add(format!("{}email", prefix), "Invalid email address");
            }
        }

        let split_percentage = self.split_percentage.unwrap_or(0.0);
        if !(0.0..=MAX_TOTAL_SPLIT).contains(&split_percentage) {
            errors.add(
                format!("{}splitPercentage", prefix),
                "Split must be between 0 and 100",
            );
        }

        Some(NewCollaborator {
            email: email?.to_ascii_lowercase(),
            role: optional_text(self.role.as_deref()).unwrap_or_else(|| "Collaborator".to_string()),
            color: optional_text(self.color.as_deref()),
            split_percentage,
        })
    }
}

impl CreateTaskRequest {
    pub fn validate(&self, offset: FixedOffset) -> Result<NewTask, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let title = errors.require_text("title", self.title.as_deref(), "Title is required");
        let status = match optional_text(self.status.as_deref()) {
            None => TaskStatus::default(),
            Some(raw) => raw.parse().unwrap_or_else(|_| {
                errors.add("status", "Status must be one of TODO, IN_PROGRESS, DONE");
                TaskStatus::default()
            }),
        };
        let due_date = errors.optional_datetime("dueDate", self.due_date.as_deref(), offset);

        let Some(title) = title else {
            return Err(errors);
        };

        errors.into_result(NewTask {
            title,
            description: optional_text(self.description.as_deref()),
            status,
            due_date,
        })
    }
}

/// Record an error on `field` when the splits add up to more than 100.
pub(crate) fn check_total_split(
    splits: impl IntoIterator<Item = f64>,
    field: &str,
    errors: &mut ValidationErrors,
) {
    let total: f64 = splits.into_iter().sum();
    if total > MAX_TOTAL_SPLIT {
        errors.add(field, format!("Total split cannot exceed 100% (got {}%)", total));
    }
}
