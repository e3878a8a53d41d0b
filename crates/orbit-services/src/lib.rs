pub mod calendar_source;
pub mod dashboard;
pub mod finance;
pub mod goal;
pub mod project;
pub mod time_log;
pub mod user;
pub mod workspace_store;

pub use calendar_source::SqliteCalendarSource;
pub use dashboard::DashboardStats;
pub use finance::{split_revenue, MilestoneTotals, RevenueShare, RevenueSplit};
pub use goal::{CreateGoalRequest, Goal, GoalStatus, NewGoal};
pub use project::*;
pub use time_log::{format_duration, CreateTimeLogRequest, NewTimeLog, TimeLog};
pub use user::{NewUser, User};
pub use workspace_store::{StoreResult, WorkspaceStore};
