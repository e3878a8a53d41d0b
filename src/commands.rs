//! Store-backed subcommands: projects, collaborators, milestones, tasks,
//! goals and time logs.
//!
//! Each `run` returns the text to print so the commands can be exercised
//! against a scratch database.

use anyhow::{Context, Result};
use chrono::FixedOffset;
use clap::Subcommand;
use orbit_calendar::UserId;
use orbit_core::AppError;
use orbit_services::{
    CreateCollaboratorRequest, CreateGoalRequest, CreateMilestoneRequest, CreateProjectRequest,
    CreateTaskRequest, CreateTimeLogRequest, MilestoneStatus, ProjectStatus, TaskStatus,
    WorkspaceStore,
};

use crate::render;

/// Settings shared by every store command.
pub struct CommandContext {
    pub offset: FixedOffset,
    pub currency: String,
}

#[derive(Subcommand)]
pub enum ProjectCommand {
    /// Create a project and print its id
    Add {
        user_id: String,
        title: String,
        #[arg(long)]
        client: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(short, long)]
        budget: Option<f64>,
        #[arg(long)]
        currency: Option<String>,
        /// HIGH, MEDIUM or LOW
        #[arg(short, long)]
        priority: Option<String>,
        /// Start date (YYYY-MM-DD)
        #[arg(short, long)]
        start: Option<String>,
        /// End date (YYYY-MM-DD)
        #[arg(short, long)]
        end: Option<String>,
    },
    /// Projects owned by or shared with the user
    List { user_id: String },
    /// ACTIVE, COMPLETED or ARCHIVED
    Status {
        user_id: String,
        project_id: String,
        status: ProjectStatus,
    },
    /// Delete a project with its milestones, tasks and time logs
    Delete { user_id: String, project_id: String },
    /// Invite a collaborator by email
    Invite {
        user_id: String,
        project_id: String,
        email: String,
        #[arg(short, long)]
        role: Option<String>,
        /// Share of milestone revenue in percent
        #[arg(long, default_value_t = 0.0)]
        split: f64,
    },
}

#[derive(Subcommand)]
pub enum MilestoneCommand {
    /// Add a milestone; give the amount or a percentage of the budget
    Add {
        user_id: String,
        project_id: String,
        title: String,
        #[arg(short, long)]
        amount: Option<f64>,
        #[arg(short, long)]
        percentage: Option<f64>,
        #[arg(short, long)]
        due: Option<String>,
    },
    /// PENDING, PAID or OVERDUE
    Status {
        user_id: String,
        milestone_id: String,
        status: MilestoneStatus,
    },
    /// Show how a milestone's amount is split between collaborators
    Split {
        user_id: String,
        milestone_id: String,
    },
}

#[derive(Subcommand)]
pub enum TaskCommand {
    Add {
        user_id: String,
        project_id: String,
        title: String,
        #[arg(short, long)]
        due: Option<String>,
        #[arg(long)]
        description: Option<String>,
    },
    /// TODO, IN_PROGRESS or DONE
    Status {
        user_id: String,
        task_id: String,
        status: TaskStatus,
    },
}

#[derive(Subcommand)]
pub enum GoalCommand {
    Add {
        user_id: String,
        title: String,
        #[arg(short, long)]
        target: Option<String>,
    },
    List { user_id: String },
    /// Flip between IN_PROGRESS and ACHIEVED
    Toggle { user_id: String, goal_id: String },
    Delete { user_id: String, goal_id: String },
}

#[derive(Subcommand)]
pub enum TimeCommand {
    /// Record time spent on a project
    Log {
        user_id: String,
        project_id: String,
        #[arg(short, long)]
        start: String,
        #[arg(short, long)]
        end: String,
        #[arg(short, long)]
        description: Option<String>,
    },
    /// Latest time entries, newest first
    Recent {
        user_id: String,
        #[arg(short, long, default_value_t = 10)]
        limit: u32,
    },
}

impl ProjectCommand {
    pub fn run(self, store: &WorkspaceStore, ctx: &CommandContext) -> Result<String> {
        match self {
            ProjectCommand::Add {
                user_id,
                title,
                client,
                description,
                budget,
                currency,
                priority,
                start,
                end,
            } => {
                let request = CreateProjectRequest {
                    title: Some(title),
                    description,
                    client_name: client,
                    total_budget: budget,
                    currency,
                    priority,
                    start_date: start,
                    end_date: end,
                    ..Default::default()
                };
                let project = request.validate(ctx.offset, &ctx.currency)?;
                let created = store.create_project(&UserId::new(user_id), &project)?;
                Ok(created.id)
            }
            ProjectCommand::List { user_id } => {
                let projects = store.list_projects(&UserId::new(user_id))?;
                Ok(render::project_list(&projects))
            }
            ProjectCommand::Status {
                user_id,
                project_id,
                status,
            } => {
                let updated =
                    store.update_project_status(&UserId::new(user_id), &project_id, status)?;
                Ok(format!("{} is now {}", updated.title, updated.status))
            }
            ProjectCommand::Delete {
                user_id,
                project_id,
            } => {
                store.delete_project(&UserId::new(user_id), &project_id)?;
                Ok(format!("Deleted {}", project_id))
            }
            ProjectCommand::Invite {
                user_id,
                project_id,
                email,
                role,
                split,
            } => {
                let request = CreateCollaboratorRequest {
                    email: Some(email),
                    role,
                    color: None,
                    split_percentage: Some(split),
                };
                let collaborator = request.validate()?;
                let added =
                    store.add_collaborator(&UserId::new(user_id), &project_id, &collaborator)?;
                Ok(added.id)
            }
        }
    }
}

impl MilestoneCommand {
    pub fn run(self, store: &WorkspaceStore, ctx: &CommandContext) -> Result<String> {
        match self {
            MilestoneCommand::Add {
                user_id,
                project_id,
                title,
                amount,
                percentage,
                due,
            } => {
                let user = UserId::new(user_id);
                let project = store
                    .get_project(&user, &project_id)?
                    .ok_or_else(|| AppError::not_found("Project", project_id.as_str()))?;

                let request = CreateMilestoneRequest {
                    title: Some(title),
                    amount,
                    percentage,
                    due_date: due,
                };
                let milestone = request.validate(project.total_budget, ctx.offset)?;
                let created = store.create_milestone(&user, &project.id, &milestone)?;
                Ok(created.id)
            }
            MilestoneCommand::Status {
                user_id,
                milestone_id,
                status,
            } => {
                let updated =
                    store.update_milestone_status(&UserId::new(user_id), &milestone_id, status)?;
                Ok(format!("{} is now {}", updated.title, updated.status))
            }
            MilestoneCommand::Split {
                user_id,
                milestone_id,
            } => {
                let split = store.milestone_split(&UserId::new(user_id), &milestone_id)?;
                Ok(render::revenue_split(&split, &ctx.currency))
            }
        }
    }
}

impl TaskCommand {
    pub fn run(self, store: &WorkspaceStore, ctx: &CommandContext) -> Result<String> {
        match self {
            TaskCommand::Add {
                user_id,
                project_id,
                title,
                due,
                description,
            } => {
                let request = CreateTaskRequest {
                    title: Some(title),
                    description,
                    status: None,
                    due_date: due,
                };
                let task = request.validate(ctx.offset)?;
                let created = store.create_task(&UserId::new(user_id), &project_id, &task)?;
                Ok(created.id)
            }
            TaskCommand::Status {
                user_id,
                task_id,
                status,
            } => {
                let updated = store.update_task_status(&UserId::new(user_id), &task_id, status)?;
                Ok(format!("{} is now {}", updated.title, updated.status))
            }
        }
    }
}

impl GoalCommand {
    pub fn run(self, store: &WorkspaceStore, ctx: &CommandContext) -> Result<String> {
        match self {
            GoalCommand::Add {
                user_id,
                title,
                target,
            } => {
                let request = CreateGoalRequest {
                    title: Some(title),
                    description: None,
                    target_date: target,
                };
                let goal = request.validate(ctx.offset)?;
                let created = store.create_goal(&UserId::new(user_id), &goal)?;
                Ok(created.id)
            }
            GoalCommand::List { user_id } => {
                let goals = store.list_goals(&UserId::new(user_id))?;
                Ok(render::goal_list(&goals))
            }
            GoalCommand::Toggle { user_id, goal_id } => {
                let goal = store.toggle_goal_status(&UserId::new(user_id), &goal_id)?;
                Ok(format!("{} is now {}", goal.title, goal.status))
            }
            GoalCommand::Delete { user_id, goal_id } => {
                store.delete_goal(&UserId::new(user_id), &goal_id)?;
                Ok(format!("Deleted {}", goal_id))
            }
        }
    }
}

impl TimeCommand {
    pub fn run(self, store: &WorkspaceStore, ctx: &CommandContext) -> Result<String> {
        match self {
            TimeCommand::Log {
                user_id,
                project_id,
                start,
                end,
                description,
            } => {
                let request = CreateTimeLogRequest {
                    project_id: Some(project_id),
                    description,
                    start_time: Some(start),
                    end_time: Some(end),
                };
                let log = request.validate(ctx.offset)?;
                let created = store
                    .log_time(&UserId::new(user_id), &log)
                    .context("Failed to log time")?;
                Ok(created.id)
            }
            TimeCommand::Recent { user_id, limit } => {
                let logs = store.recent_time_logs(&UserId::new(user_id), limit)?;
                Ok(render::time_log_list(&logs))
            }
        }
    }
}
