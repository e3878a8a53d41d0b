// crates/orbit-services/src/workspace_store.rs

use anyhow::Context;
use chrono::{DateTime, SecondsFormat, Utc};
use orbit_calendar::{
    DateRange, EventRecord, MilestoneRecord, NewEvent, ProjectRecord, TaskRecord, UserId,
};
use orbit_core::{AppError, DatabaseError, RusqliteErrorExt, ValidationErrors};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use std::str::FromStr;

use crate::dashboard::DashboardStats;
use crate::finance::{split_revenue, MilestoneTotals, RevenueSplit};
use crate::goal::{Goal, GoalStatus, NewGoal};
use crate::project::{
    check_total_split, Collaborator, Milestone, MilestoneStatus, NewCollaborator, NewMilestone,
    NewProject, NewTask, Priority, Project, ProjectStatus, Task, TaskStatus,
};
use crate::time_log::{NewTimeLog, TimeLog};
use crate::user::{NewUser, User};

const SCHEMA_VERSION: i32 = 1;

pub type StoreResult<T> = Result<T, AppError>;

/// Project alias `p` is visible to the user bound as `?1`: owner or collaborator.
const VISIBLE_TO_USER: &str = "(p.owner_id = ?1 OR EXISTS (
    SELECT 1 FROM collaborators c WHERE c.project_id = p.id AND c.user_id = ?1))";

const PROJECT_COLUMNS: &str = "p.id, p.owner_id, p.title, p.description, p.client_name, p.status,
    p.priority, p.total_budget, p.currency, p.start_date, p.end_date, p.created_at";

const MILESTONE_COLUMNS: &str =
    "m.id, m.project_id, m.title, m.amount, m.percentage, m.status, m.due_date";

const TASK_COLUMNS: &str =
    "t.id, t.project_id, t.title, t.description, t.status, t.due_date, t.created_at";

const GOAL_COLUMNS: &str =
    "id, user_id, title, description, status, target_date, created_at";

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS users (
        id TEXT PRIMARY KEY,
        name TEXT NOT NULL,
        email TEXT NOT NULL UNIQUE,
        created_at TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS projects (
        id TEXT PRIMARY KEY,
        owner_id TEXT NOT NULL,
        title TEXT NOT NULL,
        description TEXT,
        client_name TEXT,
        status TEXT NOT NULL,
        priority TEXT NOT NULL,
        total_budget REAL NOT NULL DEFAULT 0,
        currency TEXT NOT NULL,
        start_date TEXT,
        end_date TEXT,
        created_at TEXT NOT NULL,
        FOREIGN KEY (owner_id) REFERENCES users(id)
    );

    CREATE TABLE IF NOT EXISTS collaborators (
        id TEXT PRIMARY KEY,
        project_id TEXT NOT NULL,
        user_id TEXT,
        email TEXT NOT NULL,
        role TEXT NOT NULL,
        color TEXT,
        split_percentage REAL NOT NULL DEFAULT 0,
        UNIQUE (project_id, email),
        FOREIGN KEY (project_id) REFERENCES projects(id)
    );

    CREATE TABLE IF NOT EXISTS milestones (
        id TEXT PRIMARY KEY,
        project_id TEXT NOT NULL,
        title TEXT NOT NULL,
        amount REAL NOT NULL,
        percentage REAL,
        status TEXT NOT NULL,
        due_date TEXT,
        created_at TEXT NOT NULL,
        FOREIGN KEY (project_id) REFERENCES projects(id)
    );

    CREATE TABLE IF NOT EXISTS tasks (
        id TEXT PRIMARY KEY,
        project_id TEXT NOT NULL,
        title TEXT NOT NULL,
        description TEXT,
        status TEXT NOT NULL,
        due_date TEXT,
        created_at TEXT NOT NULL,
        FOREIGN KEY (project_id) REFERENCES projects(id)
    );

    CREATE TABLE IF NOT EXISTS events (
        id TEXT PRIMARY KEY,
        user_id TEXT NOT NULL,
        project_id TEXT,
        title TEXT NOT NULL,
        description TEXT,
        event_type TEXT NOT NULL,
        start_time TEXT NOT NULL,
        end_time TEXT NOT NULL,
        created_at TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS goals (
        id TEXT PRIMARY KEY,
        user_id TEXT NOT NULL,
        title TEXT NOT NULL,
        description TEXT,
        status TEXT NOT NULL,
        target_date TEXT,
        created_at TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS time_logs (
        id TEXT PRIMARY KEY,
        user_id TEXT NOT NULL,
        project_id TEXT NOT NULL,
        description TEXT,
        start_time TEXT NOT NULL,
        end_time TEXT NOT NULL,
        duration_minutes INTEGER NOT NULL,
        created_at TEXT NOT NULL,
        FOREIGN KEY (project_id) REFERENCES projects(id)
    );

    CREATE INDEX IF NOT EXISTS idx_projects_owner ON projects(owner_id);
    CREATE INDEX IF NOT EXISTS idx_collaborators_project ON collaborators(project_id);
    CREATE INDEX IF NOT EXISTS idx_collaborators_user ON collaborators(user_id);
    CREATE INDEX IF NOT EXISTS idx_milestones_project ON milestones(project_id);
    CREATE INDEX IF NOT EXISTS idx_tasks_project ON tasks(project_id);
    CREATE INDEX IF NOT EXISTS idx_events_user_start ON events(user_id, start_time);
    CREATE INDEX IF NOT EXISTS idx_goals_user ON goals(user_id);
    CREATE INDEX IF NOT EXISTS idx_time_logs_user ON time_logs(user_id);";

/// Map rusqlite results into the application error type.
trait SqlResultExt<T> {
    fn db(self) -> StoreResult<T>;
}

impl<T> SqlResultExt<T> for rusqlite::Result<T> {
    fn db(self) -> StoreResult<T> {
        self.map_err(|e| AppError::Database(e.into_database_error()))
    }
}

/// Local SQLite storage for the whole workspace
pub struct WorkspaceStore {
    conn: Connection,
}

impl WorkspaceStore {
    /// Open or create the database
    pub fn open(path: &Path) -> anyhow::Result<Self> {
        let conn = Connection::open(path).context("Failed to open workspace database")?;

        let store = Self { conn };
        store.init_schema()?;

        tracing::info!("Opened workspace database at {}", path.display());
        Ok(store)
    }

    /// Create an in-memory store (for testing).
    #[cfg(test)]
    pub fn in_memory() -> anyhow::Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self { conn };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> anyhow::Result<()> {
        self.conn
            .pragma_update(None, "foreign_keys", true)
            .context("Failed to enable foreign keys")?;
        self.conn
            .execute("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL)", [])?;

        let version: i32 = self
            .conn
            .query_row("SELECT version FROM schema_version LIMIT 1", [], |row| row.get(0))
            .optional()?
            .unwrap_or(0);

        if version > SCHEMA_VERSION {
            return Err(DatabaseError::MigrationFailed(format!(
                "database schema v{} is newer than supported v{}",
                version, SCHEMA_VERSION
            ))
            .into());
        }

        self.conn.execute_batch(SCHEMA).context("Failed to initialize schema")?;

        if version < SCHEMA_VERSION {
            tracing::debug!("Migrating workspace schema v{} -> v{}", version, SCHEMA_VERSION);
            self.conn.execute("DELETE FROM schema_version", [])?;
            self.conn.execute(
                "INSERT INTO schema_version (version) VALUES (?1)",
                params![SCHEMA_VERSION],
            )?;
        }

        Ok(())
    }

    // ---- users ----

    /// Register a user and attach them to any collaborator invites sent
    /// to their email.
    pub fn create_user(&self, user: &NewUser) -> StoreResult<User> {
        let created = User {
            id: new_id(),
            name: user.name.clone(),
            email: user.email.clone(),
            created_at: now(),
        };

        let tx = self.conn.unchecked_transaction().db()?;
        let inserted = tx.execute(
            "INSERT INTO users (id, name, email, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![created.id, created.name, created.email, to_text(created.created_at)],
        );
        if let Err(rusqlite::Error::SqliteFailure(e, _)) = &inserted {
            if e.code == rusqlite::ErrorCode::ConstraintViolation {
                let mut errors = ValidationErrors::new();
                errors.add("email", "Email is already registered");
                return Err(errors.into());
            }
        }
        inserted.db()?;

        let linked = tx
            .execute(
                "UPDATE collaborators SET user_id = ?1 WHERE email = ?2 AND user_id IS NULL",
                params![created.id, created.email],
            )
            .db()?;
        tx.commit().db()?;

        if linked > 0 {
            tracing::debug!(user = %created.id, "Linked {} collaborator invites", linked);
        }
        Ok(created)
    }

    pub fn get_user(&self, id: &str) -> StoreResult<Option<User>> {
        self.conn
            .query_row(
                "SELECT id, name, email, created_at FROM users WHERE id = ?1",
                [id],
                |row| {
                    Ok(User {
                        id: row.get(0)?,
                        name: row.get(1)?,
                        email: row.get(2)?,
                        created_at: ts_column(row, 3)?,
                    })
                },
            )
            .optional()
            .db()
    }

    // ---- projects ----

    /// Insert a project with its milestones and collaborators in one
    /// transaction. Collaborators are linked to existing users by email.
    pub fn create_project(&self, owner: &UserId, project: &NewProject) -> StoreResult<Project> {
        let created = Project {
            id: new_id(),
            owner_id: owner.as_str().to_string(),
            title: project.title.clone(),
            description: project.description.clone(),
            client_name: project.client_name.clone(),
            status: ProjectStatus::Active,
            priority: project.priority,
            total_budget: project.total_budget,
            currency: project.currency.clone(),
            start_date: project.start_date,
            end_date: project.end_date,
            created_at: now(),
        };

        let tx = self.conn.unchecked_transaction().db()?;
        tx.execute(
            "INSERT INTO projects (id, owner_id, title, description, client_name, status,
                priority, total_budget, currency, start_date, end_date, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            params![
                created.id,
                created.owner_id,
                created.title,
                created.description,
                created.client_name,
                created.status.as_str(),
                created.priority.as_str(),
                created.total_budget,
                created.currency,
                opt_text(created.start_date),
                opt_text(created.end_date),
                to_text(created.created_at),
            ],
        )
        .db()?;

        for milestone in &project.milestones {
            insert_milestone(&tx, &created.id, milestone)?;
        }
        for collaborator in &project.collaborators {
            insert_collaborator(&tx, &created.id, collaborator)?;
        }
        tx.commit().db()?;

        tracing::info!(
            id = %created.id,
            milestones = project.milestones.len(),
            collaborators = project.collaborators.len(),
            "Created project"
        );
        Ok(created)
    }

    /// Projects the user owns or collaborates on, newest first
    pub fn list_projects(&self, user: &UserId) -> StoreResult<Vec<Project>> {
        let mut stmt = self
            .conn
            .prepare(&format!(
                "SELECT {} FROM projects p WHERE {} ORDER BY p.created_at DESC, p.rowid DESC",
                PROJECT_COLUMNS, VISIBLE_TO_USER
            ))
            .db()?;

        let projects = stmt
            .query_map([user.as_str()], row_to_project)
            .db()?
            .collect::<Result<Vec<_>, _>>()
            .db()?;
        Ok(projects)
    }

    pub fn get_project(&self, user: &UserId, id: &str) -> StoreResult<Option<Project>> {
        self.conn
            .query_row(
                &format!(
                    "SELECT {} FROM projects p WHERE p.id = ?2 AND {}",
                    PROJECT_COLUMNS, VISIBLE_TO_USER
                ),
                params![user.as_str(), id],
                row_to_project,
            )
            .optional()
            .db()
    }

    fn owned_project(&self, user: &UserId, id: &str) -> StoreResult<Project> {
        self.conn
            .query_row(
                &format!("SELECT {} FROM projects p WHERE p.id = ?2 AND p.owner_id = ?1", PROJECT_COLUMNS),
                params![user.as_str(), id],
                row_to_project,
            )
            .optional()
            .db()?
            .ok_or_else(|| AppError::not_found("Project", id))
    }

    fn visible_project(&self, user: &UserId, id: &str) -> StoreResult<Project> {
        self.get_project(user, id)?
            .ok_or_else(|| AppError::not_found("Project", id))
    }

    /// Only the owner may change a project's status.
    pub fn update_project_status(
        &self,
        user: &UserId,
        id: &str,
        status: ProjectStatus,
    ) -> StoreResult<Project> {
        let updated = self
            .conn
            .execute(
                "UPDATE projects SET status = ?3 WHERE id = ?2 AND owner_id = ?1",
                params![user.as_str(), id, status.as_str()],
            )
            .db()?;
        if updated == 0 {
            return Err(AppError::not_found("Project", id));
        }
        self.owned_project(user, id)
    }

    /// Delete an owned project with its milestones, tasks, collaborators
    /// and time logs. Events referencing it are kept and unlinked.
    pub fn delete_project(&self, user: &UserId, id: &str) -> StoreResult<()> {
        self.owned_project(user, id)?;

        let tx = self.conn.unchecked_transaction().db()?;
        tx.execute("DELETE FROM tasks WHERE project_id = ?1", [id]).db()?;
        tx.execute("DELETE FROM milestones WHERE project_id = ?1", [id]).db()?;
        tx.execute("DELETE FROM collaborators WHERE project_id = ?1", [id]).db()?;
        tx.execute("DELETE FROM time_logs WHERE project_id = ?1", [id]).db()?;
        tx.execute("UPDATE events SET project_id = NULL WHERE project_id = ?1", [id]).db()?;
        tx.execute("DELETE FROM projects WHERE id = ?1", [id]).db()?;
        tx.commit().db()?;

        tracing::info!(id, "Deleted project");
        Ok(())
    }

    // ---- collaborators ----

    /// Add a collaborator to an owned project, keeping the total split
    /// at or below 100%.
    pub fn add_collaborator(
        &self,
        user: &UserId,
        project_id: &str,
        collaborator: &NewCollaborator,
    ) -> StoreResult<Collaborator> {
        self.owned_project(user, project_id)?;

        let existing = self.collaborators(project_id)?;
        let mut errors = ValidationErrors::new();
        if existing.iter().any(|c| c.email == collaborator.email) {
            errors.add("email", "Already a collaborator on this project");
        }
        check_total_split(
            existing
                .iter()
                .map(|c| c.split_percentage)
                .chain([collaborator.split_percentage]),
            "splitPercentage",
            &mut errors,
        );
        if !errors.is_empty() {
            return Err(errors.into());
        }

        let id = insert_collaborator(&self.conn, project_id, collaborator)?;
        self.collaborators(project_id)?
            .into_iter()
            .find(|c| c.id == id)
            .ok_or_else(|| AppError::not_found("Collaborator", id))
    }

    pub fn list_collaborators(
        &self,
        user: &UserId,
        project_id: &str,
    ) -> StoreResult<Vec<Collaborator>> {
        self.visible_project(user, project_id)?;
        self.collaborators(project_id)
    }

    fn collaborators(&self, project_id: &str) -> StoreResult<Vec<Collaborator>> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT id, project_id, user_id, email, role, color, split_percentage
                 FROM collaborators WHERE project_id = ?1 ORDER BY rowid",
            )
            .db()?;

        let collaborators = stmt
            .query_map([project_id], |row| {
                Ok(Collaborator {
                    id: row.get(0)?,
                    project_id: row.get(1)?,
                    user_id: row.get(2)?,
                    email: row.get(3)?,
                    role: row.get(4)?,
                    color: row.get(5)?,
                    split_percentage: row.get(6)?,
                })
            })
            .db()?
            .collect::<Result<Vec<_>, _>>()
            .db()?;
        Ok(collaborators)
    }

    // ---- milestones & finance ----

    pub fn create_milestone(
        &self,
        user: &UserId,
        project_id: &str,
        milestone: &NewMilestone,
    ) -> StoreResult<Milestone> {
        self.owned_project(user, project_id)?;
        let id = insert_milestone(&self.conn, project_id, milestone)?;
        self.owned_milestone(user, &id)
    }

    /// Milestones of the user's own projects, earliest due first
    pub fn list_milestones(&self, user: &UserId) -> StoreResult<Vec<Milestone>> {
        let mut stmt = self
            .conn
            .prepare(&format!(
                "SELECT {} FROM milestones m JOIN projects p ON p.id = m.project_id
                 WHERE p.owner_id = ?1
                 ORDER BY m.due_date IS NULL, m.due_date ASC, m.rowid",
                MILESTONE_COLUMNS
            ))
            .db()?;

        let milestones = stmt
            .query_map([user.as_str()], row_to_milestone)
            .db()?
            .collect::<Result<Vec<_>, _>>()
            .db()?;
        Ok(milestones)
    }

    fn owned_milestone(&self, user: &UserId, id: &str) -> StoreResult<Milestone> {
        self.conn
            .query_row(
                &format!(
                    "SELECT {} FROM milestones m JOIN projects p ON p.id = m.project_id
                     WHERE m.id = ?2 AND p.owner_id = ?1",
                    MILESTONE_COLUMNS
                ),
                params![user.as_str(), id],
                row_to_milestone,
            )
            .optional()
            .db()?
            .ok_or_else(|| AppError::not_found("Milestone", id))
    }

    pub fn update_milestone_status(
        &self,
        user: &UserId,
        id: &str,
        status: MilestoneStatus,
    ) -> StoreResult<Milestone> {
        let updated = self
            .conn
            .execute(
                "UPDATE milestones SET status = ?3
                 WHERE id = ?2 AND project_id IN (SELECT id FROM projects WHERE owner_id = ?1)",
                params![user.as_str(), id, status.as_str()],
            )
            .db()?;
        if updated == 0 {
            return Err(AppError::not_found("Milestone", id));
        }
        tracing::info!(id, status = %status, "Updated milestone status");
        self.owned_milestone(user, id)
    }

    pub fn milestone_totals(&self, user: &UserId) -> StoreResult<MilestoneTotals> {
        Ok(MilestoneTotals::from_milestones(&self.list_milestones(user)?))
    }

    /// How a milestone's payment divides between the project's people.
    pub fn milestone_split(&self, user: &UserId, milestone_id: &str) -> StoreResult<RevenueSplit> {
        let milestone = self.owned_milestone(user, milestone_id)?;
        let collaborators = self.collaborators(&milestone.project_id)?;
        Ok(split_revenue(milestone.amount, &collaborators))
    }

    // ---- tasks ----

    pub fn create_task(&self, user: &UserId, project_id: &str, task: &NewTask) -> StoreResult<Task> {
        self.visible_project(user, project_id)?;

        let created = Task {
            id: new_id(),
            project_id: project_id.to_string(),
            title: task.title.clone(),
            description: task.description.clone(),
            status: task.status,
            due_date: task.due_date,
            created_at: now(),
        };
        self.conn
            .execute(
                "INSERT INTO tasks (id, project_id, title, description, status, due_date, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    created.id,
                    created.project_id,
                    created.title,
                    created.description,
                    created.status.as_str(),
                    opt_text(created.due_date),
                    to_text(created.created_at),
                ],
            )
            .db()?;
        Ok(created)
    }

    pub fn list_tasks(&self, user: &UserId, project_id: &str) -> StoreResult<Vec<Task>> {
        self.visible_project(user, project_id)?;

        let mut stmt = self
            .conn
            .prepare(&format!(
                "SELECT {} FROM tasks t WHERE t.project_id = ?1 ORDER BY t.created_at, t.rowid",
                TASK_COLUMNS
            ))
            .db()?;

        let tasks = stmt
            .query_map([project_id], row_to_task)
            .db()?
            .collect::<Result<Vec<_>, _>>()
            .db()?;
        Ok(tasks)
    }

    pub fn update_task_status(
        &self,
        user: &UserId,
        id: &str,
        status: TaskStatus,
    ) -> StoreResult<Task> {
        let updated = self
            .conn
            .execute(
                &format!(
                    "UPDATE tasks SET status = ?3 WHERE id = ?2
                     AND project_id IN (SELECT p.id FROM projects p WHERE {})",
                    VISIBLE_TO_USER
                ),
                params![user.as_str(), id, status.as_str()],
            )
            .db()?;
        if updated == 0 {
            return Err(AppError::not_found("Task", id));
        }

        self.conn
            .query_row(
                &format!("SELECT {} FROM tasks t WHERE t.id = ?1", TASK_COLUMNS),
                [id],
                row_to_task,
            )
            .db()
    }

    /// Earliest-due TODO task in the user's own active projects; undated
    /// tasks come last.
    pub fn next_task(&self, user: &UserId) -> StoreResult<Option<TaskRecord>> {
        self.conn
            .query_row(
                "SELECT t.id, t.title, t.status, t.due_date, p.id, p.title
                 FROM tasks t JOIN projects p ON p.id = t.project_id
                 WHERE p.owner_id = ?1 AND p.status = ?2 AND t.status = ?3
                 ORDER BY t.due_date IS NULL, t.due_date ASC, t.rowid
                 LIMIT 1",
                params![
                    user.as_str(),
                    ProjectStatus::Active.as_str(),
                    TaskStatus::Todo.as_str()
                ],
                row_to_task_record,
            )
            .optional()
            .db()
    }

    // ---- events ----

    /// Store an event owned by `user`. A linked project must be visible.
    pub fn create_event(&self, user: &UserId, event: &NewEvent) -> StoreResult<EventRecord> {
        let project_title = match &event.project_id {
            Some(project_id) => match self.get_project(user, project_id)? {
                Some(project) => Some(project.title),
                None => {
                    let mut errors = ValidationErrors::new();
                    errors.add("projectId", "Unknown project");
                    return Err(errors.into());
                }
            },
            None => None,
        };

        let id = new_id();
        self.conn
            .execute(
                "INSERT INTO events (id, user_id, project_id, title, description, event_type,
                    start_time, end_time, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    id,
                    user.as_str(),
                    event.project_id,
                    event.title,
                    event.description,
                    event.event_type.as_str(),
                    to_text(event.start_time),
                    to_text(event.end_time),
                    to_text(now()),
                ],
            )
            .db()?;

        Ok(EventRecord {
            id,
            title: event.title.clone(),
            description: event.description.clone(),
            event_type: event.event_type.as_str().to_string(),
            start_time: event.start_time,
            end_time: event.end_time,
            project_id: event.project_id.clone(),
            project_title,
        })
    }

    // ---- goals ----

    pub fn create_goal(&self, user: &UserId, goal: &NewGoal) -> StoreResult<Goal> {
        let created = Goal {
            id: new_id(),
            user_id: user.as_str().to_string(),
            title: goal.title.clone(),
            description: goal.description.clone(),
            status: GoalStatus::InProgress,
            target_date: goal.target_date,
            created_at: now(),
        };
        self.conn
            .execute(
                "INSERT INTO goals (id, user_id, title, description, status, target_date, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    created.id,
                    created.user_id,
                    created.title,
                    created.description,
                    created.status.as_str(),
                    opt_text(created.target_date),
                    to_text(created.created_at),
                ],
            )
            .db()?;
        Ok(created)
    }

    /// The user's goals, newest first
    pub fn list_goals(&self, user: &UserId) -> StoreResult<Vec<Goal>> {
        let mut stmt = self
            .conn
            .prepare(&format!(
                "SELECT {} FROM goals WHERE user_id = ?1 ORDER BY created_at DESC, rowid DESC",
                GOAL_COLUMNS
            ))
            .db()?;

        let goals = stmt
            .query_map([user.as_str()], row_to_goal)
            .db()?
            .collect::<Result<Vec<_>, _>>()
            .db()?;
        Ok(goals)
    }

    fn get_goal(&self, user: &UserId, id: &str) -> StoreResult<Option<Goal>> {
        self.conn
            .query_row(
                &format!("SELECT {} FROM goals WHERE id = ?2 AND user_id = ?1", GOAL_COLUMNS),
                params![user.as_str(), id],
                row_to_goal,
            )
            .optional()
            .db()
    }

    /// Flip ACHIEVED and IN_PROGRESS. Goals of other users are reported as
    /// not found.
    pub fn toggle_goal_status(&self, user: &UserId, id: &str) -> StoreResult<Goal> {
        let mut goal = self
            .get_goal(user, id)?
            .ok_or_else(|| AppError::not_found("Goal", id))?;

        goal.status = goal.status.toggled();
        self.conn
            .execute(
                "UPDATE goals SET status = ?3 WHERE id = ?2 AND user_id = ?1",
                params![user.as_str(), id, goal.status.as_str()],
            )
            .db()?;

        tracing::debug!(id, status = %goal.status, "Toggled goal");
        Ok(goal)
    }

    pub fn delete_goal(&self, user: &UserId, id: &str) -> StoreResult<()> {
        let deleted = self
            .conn
            .execute(
                "DELETE FROM goals WHERE id = ?2 AND user_id = ?1",
                params![user.as_str(), id],
            )
            .db()?;
        if deleted == 0 {
            return Err(AppError::not_found("Goal", id));
        }
        Ok(())
    }

    // ---- time logs ----

    pub fn log_time(&self, user: &UserId, log: &NewTimeLog) -> StoreResult<TimeLog> {
        let project = self.visible_project(user, &log.project_id)?;

        let created = TimeLog {
            id: new_id(),
            user_id: user.as_str().to_string(),
            project_id: project.id,
            project_title: Some(project.title),
            description: log.description.clone(),
            start_time: log.start_time,
            end_time: log.end_time,
            duration_minutes: log.duration_minutes,
        };
        self.conn
            .execute(
                "INSERT INTO time_logs (id, user_id, project_id, description, start_time,
                    end_time, duration_minutes, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    created.id,
                    created.user_id,
                    created.project_id,
                    created.description,
                    to_text(created.start_time),
                    to_text(created.end_time),
                    created.duration_minutes,
                    to_text(now()),
                ],
            )
            .db()?;
        Ok(created)
    }

    /// Most recent logs first
    pub fn recent_time_logs(&self, user: &UserId, limit: u32) -> StoreResult<Vec<TimeLog>> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT l.id, l.user_id, l.project_id, p.title, l.description, l.start_time,
                        l.end_time, l.duration_minutes
                 FROM time_logs l LEFT JOIN projects p ON p.id = l.project_id
                 WHERE l.user_id = ?1
                 ORDER BY l.start_time DESC, l.rowid DESC
                 LIMIT ?2",
            )
            .db()?;

        let logs = stmt
            .query_map(params![user.as_str(), limit], |row| {
                Ok(TimeLog {
                    id: row.get(0)?,
                    user_id: row.get(1)?,
                    project_id: row.get(2)?,
                    project_title: row.get(3)?,
                    description: row.get(4)?,
                    start_time: ts_column(row, 5)?,
                    end_time: ts_column(row, 6)?,
                    duration_minutes: row.get(7)?,
                })
            })
            .db()?
            .collect::<Result<Vec<_>, _>>()
            .db()?;
        Ok(logs)
    }

    pub fn total_minutes(&self, user: &UserId) -> StoreResult<i64> {
        self.conn
            .query_row(
                "SELECT COALESCE(SUM(duration_minutes), 0) FROM time_logs WHERE user_id = ?1",
                [user.as_str()],
                |row| row.get(0),
            )
            .db()
    }

    // ---- dashboard ----

    pub fn dashboard_stats(&self, user: &UserId) -> StoreResult<DashboardStats> {
        let totals = self.milestone_totals(user)?;
        let active_projects: i64 = self
            .conn
            .query_row(
                "SELECT COUNT(*) FROM projects WHERE owner_id = ?1 AND status = ?2",
                params![user.as_str(), ProjectStatus::Active.as_str()],
                |row| row.get(0),
            )
            .db()?;
        let total_minutes = self.total_minutes(user)?;

        Ok(DashboardStats::new(&totals, active_projects, total_minutes))
    }

    // ---- calendar queries ----

    /// Visible projects whose `[start_date, end_date]` overlaps `range`
    pub fn calendar_projects(
        &self,
        user: &UserId,
        range: &DateRange,
    ) -> StoreResult<Vec<ProjectRecord>> {
        let mut stmt = self
            .conn
            .prepare(&format!(
                "SELECT p.id, p.title, p.status, p.start_date, p.end_date
                 FROM projects p
                 WHERE {} AND p.start_date <= ?3 AND p.end_date >= ?2
                 ORDER BY p.start_date, p.rowid",
                VISIBLE_TO_USER
            ))
            .db()?;

        let projects = stmt
            .query_map(range_params(user, range), |row| {
                Ok(ProjectRecord {
                    id: row.get(0)?,
                    title: row.get(1)?,
                    status: row.get(2)?,
                    start_date: opt_ts_column(row, 3)?,
                    end_date: opt_ts_column(row, 4)?,
                })
            })
            .db()?
            .collect::<Result<Vec<_>, _>>()
            .db()?;
        Ok(projects)
    }

    /// Milestones of visible projects due inside `range`
    pub fn calendar_milestones(
        &self,
        user: &UserId,
        range: &DateRange,
    ) -> StoreResult<Vec<MilestoneRecord>> {
        let mut stmt = self
            .conn
            .prepare(&format!(
                "SELECT m.id, m.title, m.status, m.due_date, p.id, p.title
                 FROM milestones m JOIN projects p ON p.id = m.project_id
                 WHERE {} AND m.due_date BETWEEN ?2 AND ?3
                 ORDER BY m.due_date, m.rowid",
                VISIBLE_TO_USER
            ))
            .db()?;

        let milestones = stmt
            .query_map(range_params(user, range), |row| {
                Ok(MilestoneRecord {
                    id: row.get(0)?,
                    title: row.get(1)?,
                    status: row.get(2)?,
                    due_date: opt_ts_column(row, 3)?,
                    project_id: row.get(4)?,
                    project_title: row.get(5)?,
                })
            })
            .db()?
            .collect::<Result<Vec<_>, _>>()
            .db()?;
        Ok(milestones)
    }

    /// Tasks of visible projects due inside `range`
    pub fn calendar_tasks(&self, user: &UserId, range: &DateRange) -> StoreResult<Vec<TaskRecord>> {
        let mut stmt = self
            .conn
            .prepare(&format!(
                "SELECT t.id, t.title, t.status, t.due_date, p.id, p.title
                 FROM tasks t JOIN projects p ON p.id = t.project_id
                 WHERE {} AND t.due_date BETWEEN ?2 AND ?3
                 ORDER BY t.due_date, t.rowid",
                VISIBLE_TO_USER
            ))
            .db()?;

        let tasks = stmt
            .query_map(range_params(user, range), row_to_task_record)
            .db()?
            .collect::<Result<Vec<_>, _>>()
            .db()?;
        Ok(tasks)
    }

    /// The user's own events starting inside `range`
    pub fn calendar_events(
        &self,
        user: &UserId,
        range: &DateRange,
    ) -> StoreResult<Vec<EventRecord>> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT e.id, e.title, e.description, e.event_type, e.start_time, e.end_time,
                        e.project_id, p.title
                 FROM events e LEFT JOIN projects p ON p.id = e.project_id
                 WHERE e.user_id = ?1 AND e.start_time BETWEEN ?2 AND ?3
                 ORDER BY e.start_time, e.rowid",
            )
            .db()?;

        let events = stmt
            .query_map(range_params(user, range), |row| {
                Ok(EventRecord {
                    id: row.get(0)?,
                    title: row.get(1)?,
                    description: row.get(2)?,
                    event_type: row.get(3)?,
                    start_time: ts_column(row, 4)?,
                    end_time: ts_column(row, 5)?,
                    project_id: row.get(6)?,
                    project_title: row.get(7)?,
                })
            })
            .db()?
            .collect::<Result<Vec<_>, _>>()
            .db()?;
        Ok(events)
    }
}

fn insert_milestone(
    conn: &Connection,
    project_id: &str,
    milestone: &NewMilestone,
) -> StoreResult<String> {
    let id = new_id();
    conn.execute(
        "INSERT INTO milestones (id, project_id, title, amount, percentage, status, due_date, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            id,
            project_id,
            milestone.title,
            milestone.amount,
            milestone.percentage,
            MilestoneStatus::Pending.as_str(),
            opt_text(milestone.due_date),
            to_text(now()),
        ],
    )
    .db()?;
    Ok(id)
}

fn insert_collaborator(
    conn: &Connection,
    project_id: &str,
    collaborator: &NewCollaborator,
) -> StoreResult<String> {
    let id = new_id();
    conn.execute(
        "INSERT INTO collaborators (id, project_id, user_id, email, role, color, split_percentage)
         VALUES (?1, ?2, (SELECT id FROM users WHERE email = ?3), ?3, ?4, ?5, ?6)",
        params![
            id,
            project_id,
            collaborator.email,
            collaborator.role,
            collaborator.color,
            collaborator.split_percentage,
        ],
    )
    .db()?;
    Ok(id)
}

fn range_params(user: &UserId, range: &DateRange) -> [String; 3] {
    [
        user.as_str().to_string(),
        to_text(range.start),
        to_text(range.end),
    ]
}

fn row_to_project(row: &Row) -> rusqlite::Result<Project> {
    Ok(Project {
        id: row.get(0)?,
        owner_id: row.get(1)?,
        title: row.get(2)?,
        description: row.get(3)?,
        client_name: row.get(4)?,
        status: enum_column(row, 5)?,
        priority: enum_column::<Priority>(row, 6)?,
        total_budget: row.get(7)?,
        currency: row.get(8)?,
        start_date: opt_ts_column(row, 9)?,
        end_date: opt_ts_column(row, 10)?,
        created_at: ts_column(row, 11)?,
    })
}

fn row_to_milestone(row: &Row) -> rusqlite::Result<Milestone> {
    Ok(Milestone {
        id: row.get(0)?,
        project_id: row.get(1)?,
        title: row.get(2)?,
        amount: row.get(3)?,
        percentage: row.get(4)?,
        status: enum_column(row, 5)?,
        due_date: opt_ts_column(row, 6)?,
    })
}

fn row_to_task(row: &Row) -> rusqlite::Result<Task> {
    Ok(Task {
        id: row.get(0)?,
        project_id: row.get(1)?,
        title: row.get(2)?,
        description: row.get(3)?,
        status: enum_column(row, 4)?,
        due_date: opt_ts_column(row, 5)?,
        created_at: ts_column(row, 6)?,
    })
}

fn row_to_task_record(row: &Row) -> rusqlite::Result<TaskRecord> {
    Ok(TaskRecord {
        id: row.get(0)?,
        title: row.get(1)?,
        status: row.get(2)?,
        due_date: opt_ts_column(row, 3)?,
        project_id: row.get(4)?,
        project_title: row.get(5)?,
    })
}

fn row_to_goal(row: &Row) -> rusqlite::Result<Goal> {
    Ok(Goal {
        id: row.get(0)?,
        user_id: row.get(1)?,
        title: row.get(2)?,
        description: row.get(3)?,
        status: enum_column(row, 4)?,
        target_date: opt_ts_column(row, 5)?,
        created_at: ts_column(row, 6)?,
    })
}

fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

fn now() -> DateTime<Utc> {
    to_second(Utc::now())
}

/// Stored timestamps have second precision.
fn to_second(ts: DateTime<Utc>) -> DateTime<Utc> {
    DateTime::from_timestamp(ts.timestamp(), 0).unwrap_or(ts)
}

fn to_text(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn opt_text(ts: Option<DateTime<Utc>>) -> Option<String> {
    ts.map(to_text)
}

fn parse_ts(idx: usize, raw: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn ts_column(row: &Row, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    parse_ts(idx, &raw)
}

fn opt_ts_column(row: &Row, idx: usize) -> rusqlite::Result<Option<DateTime<Utc>>> {
    let raw: Option<String> = row.get(idx)?;
    raw.map(|raw| parse_ts(idx, &raw)).transpose()
}

fn enum_column<T: FromStr<Err = String>>(row: &Row, idx: usize) -> rusqlite::Result<T> {
    let raw: String = row.get(idx)?;
    raw.parse()
        .map_err(|e: String| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, e.into()))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
    use super::*;
    use chrono::TimeZone;
    use orbit_calendar::{EventType, PaddedRange};

    fn ts(m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, m, d, 0, 0, 0).unwrap()
    }

    fn owner(store: &WorkspaceStore) -> UserId {
        let user = store
            .create_user(&NewUser::parse("Owner", "owner@studio.io").unwrap())
            .unwrap();
        UserId::new(user.id)
    }

    fn project(title: &str) -> NewProject {
        NewProject {
            title: title.to_string(),
            description: None,
            client_name: Some("Acme".to_string()),
            priority: Priority::High,
            total_budget: 10_000.0,
            currency: "INR".to_string(),
            start_date: Some(ts(3, 10)),
            end_date: Some(ts(3, 14)),
            milestones: vec![],
            collaborators: vec![],
        }
    }

    fn milestone(title: &str, amount: f64, due: Option<DateTime<Utc>>) -> NewMilestone {
        NewMilestone {
            title: title.to_string(),
            amount,
            percentage: None,
            due_date: due,
        }
    }

    fn collaborator(email: &str, pct: f64) -> NewCollaborator {
        NewCollaborator {
            email: email.to_string(),
            role: "Developer".to_string(),
            color: None,
            split_percentage: pct,
        }
    }

    fn march() -> DateRange {
        PaddedRange {
            start: chrono::NaiveDate::from_ymd_opt(2024, 2, 23).unwrap(),
            end: chrono::NaiveDate::from_ymd_opt(2024, 4, 7).unwrap(),
        }
        .to_utc(chrono::FixedOffset::east_opt(0).unwrap())
    }

    #[test]
    fn test_reopen_keeps_schema_version() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("orbit.db");
        drop(WorkspaceStore::open(&path).unwrap());
        let store = WorkspaceStore::open(&path).unwrap();

        let version: i32 = store
            .conn
            .query_row("SELECT version FROM schema_version", [], |row| row.get(0))
            .unwrap();
        assert_eq!(version, SCHEMA_VERSION);
    }

    #[test]
    fn test_project_requires_existing_owner() {
        let store = WorkspaceStore::in_memory().unwrap();
        let err = store
            .create_project(&UserId::new("ghost"), &project("Acme Site"))
            .unwrap_err();
        assert!(matches!(err, AppError::Database(_)));

        let owner = owner(&store);
        assert!(store.list_projects(&owner).unwrap().is_empty());
    }

    #[test]
    fn test_project_roundtrip() {
        let store = WorkspaceStore::in_memory().unwrap();
        let owner = owner(&store);

        let created = store.create_project(&owner, &project("Acme Site")).unwrap();
        let loaded = store.get_project(&owner, &created.id).unwrap().unwrap();

        assert_eq!(loaded, created);
        assert_eq!(loaded.status, ProjectStatus::Active);
        assert_eq!(loaded.priority, Priority::High);
    }

    #[test]
    fn test_update_status_is_owner_only() {
        let store = WorkspaceStore::in_memory().unwrap();
        let owner = owner(&store);
        let created = store.create_project(&owner, &project("Acme Site")).unwrap();

        let err = store
            .update_project_status(&UserId::new("u2"), &created.id, ProjectStatus::Archived)
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound { entity: "Project", .. }));

        let updated = store
            .update_project_status(&owner, &created.id, ProjectStatus::Completed)
            .unwrap();
        assert_eq!(updated.status, ProjectStatus::Completed);
    }

    #[test]
    fn test_delete_project_cascades() {
        let store = WorkspaceStore::in_memory().unwrap();
        let owner = owner(&store);
        let mut new = project("Acme Site");
        new.milestones = vec![milestone("Phase 1", 500.0, Some(ts(3, 15)))];
        let created = store.create_project(&owner, &new).unwrap();
        store
            .create_task(
                &owner,
                &created.id,
                &NewTask {
                    title: "Wireframes".into(),
                    description: None,
                    status: TaskStatus::Todo,
                    due_date: None,
                },
            )
            .unwrap();

        store.delete_project(&owner, &created.id).unwrap();

        assert!(store.list_projects(&owner).unwrap().is_empty());
        assert!(store.list_milestones(&owner).unwrap().is_empty());
        let tasks: i64 = store
            .conn
            .query_row("SELECT COUNT(*) FROM tasks", [], |row| row.get(0))
            .unwrap();
        assert_eq!(tasks, 0);
    }

    #[test]
    fn test_collaborator_split_limit() {
        let store = WorkspaceStore::in_memory().unwrap();
        let owner = owner(&store);
        let created = store.create_project(&owner, &project("Acme Site")).unwrap();

        store.add_collaborator(&owner, &created.id, &collaborator("a@x.io", 60.0)).unwrap();
        let err = store
            .add_collaborator(&owner, &created.id, &collaborator("b@x.io", 50.0))
            .unwrap_err();

        match err {
            AppError::Validation(errors) => assert!(errors.has_field("splitPercentage")),
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_milestone_status_and_totals() {
        let store = WorkspaceStore::in_memory().unwrap();
        let owner = owner(&store);
        let created = store.create_project(&owner, &project("Acme Site")).unwrap();

        let m1 = store
            .create_milestone(&owner, &created.id, &milestone("Phase 1", 4000.0, Some(ts(3, 15))))
            .unwrap();
        store
            .create_milestone(&owner, &created.id, &milestone("Phase 2", 6000.0, None))
            .unwrap();
        assert_eq!(m1.status, MilestoneStatus::Pending);

        store.update_milestone_status(&owner, &m1.id, MilestoneStatus::Paid).unwrap();
        let totals = store.milestone_totals(&owner).unwrap();
        assert_eq!(totals.revenue, 4000.0);
        assert_eq!(totals.pending_revenue, 6000.0);

        let listed = store.list_milestones(&owner).unwrap();
        assert_eq!(listed[0].title, "Phase 1");
    }

    #[test]
    fn test_milestone_split() {
        let store = WorkspaceStore::in_memory().unwrap();
        let owner = owner(&store);
        let created = store.create_project(&owner, &project("Acme Site")).unwrap();
        store.add_collaborator(&owner, &created.id, &collaborator("a@x.io", 25.0)).unwrap();
        let m = store
            .create_milestone(&owner, &created.id, &milestone("Phase 1", 2000.0, None))
            .unwrap();

        let split = store.milestone_split(&owner, &m.id).unwrap();
        assert_eq!(split.shares[0].amount, 500.0);
        assert_eq!(split.owner_amount, 1500.0);
    }

    #[test]
    fn test_create_user_links_invites_and_rejects_duplicates() {
        let store = WorkspaceStore::in_memory().unwrap();
        let owner = owner(&store);
        let mut new = project("Acme Site");
        new.collaborators = vec![collaborator("asha@studio.io", 20.0)];
        let created = store.create_project(&owner, &new).unwrap();

        let asha = store
            .create_user(&NewUser::parse("Asha", "asha@studio.io").unwrap())
            .unwrap();
        let collaborators = store.list_collaborators(&owner, &created.id).unwrap();
        assert_eq!(collaborators[0].user_id.as_deref(), Some(asha.id.as_str()));

        let err = store
            .create_user(&NewUser::parse("Asha 2", "asha@studio.io").unwrap())
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(store.get_user(&asha.id).unwrap().unwrap(), asha);
    }

    #[test]
    fn test_event_with_unknown_project_rejected() {
        let store = WorkspaceStore::in_memory().unwrap();
        let event = NewEvent {
            title: "Call".into(),
            description: None,
            event_type: EventType::Call,
            start_time: ts(3, 5),
            end_time: ts(3, 5),
            project_id: Some("missing".into()),
        };
        let err = store.create_event(&UserId::new("u1"), &event).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn test_calendar_project_overlap() {
        let store = WorkspaceStore::in_memory().unwrap();
        let owner = owner(&store);

        let mut spanning = project("Long haul");
        spanning.start_date = Some(ts(1, 1));
        spanning.end_date = Some(ts(12, 31));
        let mut before = project("Done already");
        before.start_date = Some(ts(1, 1));
        before.end_date = Some(ts(1, 31));
        let mut undated = project("Someday");
        undated.start_date = None;
        undated.end_date = None;

        store.create_project(&owner, &spanning).unwrap();
        store.create_project(&owner, &before).unwrap();
        store.create_project(&owner, &undated).unwrap();

        let found = store.calendar_projects(&owner, &march()).unwrap();
        let titles: Vec<&str> = found.iter().map(|p| p.title.as_str()).collect();
        assert_eq!(titles, vec!["Long haul"]);
    }

    #[test]
    fn test_next_task_prefers_earliest_due() {
        let store = WorkspaceStore::in_memory().unwrap();
        let owner = owner(&store);
        let created = store.create_project(&owner, &project("Acme Site")).unwrap();

        for (title, due, status) in [
            ("Undated", None, TaskStatus::Todo),
            ("Later", Some(ts(3, 20)), TaskStatus::Todo),
            ("Sooner", Some(ts(3, 12)), TaskStatus::Todo),
            ("Finished", Some(ts(3, 1)), TaskStatus::Done),
        ] {
            store
                .create_task(
                    &owner,
                    &created.id,
                    &NewTask {
                        title: title.into(),
                        description: None,
                        status,
                        due_date: due,
                    },
                )
                .unwrap();
        }

        let next = store.next_task(&owner).unwrap().unwrap();
        assert_eq!(next.title, "Sooner");
        assert_eq!(next.project_title, "Acme Site");

        store
            .update_project_status(&owner, &created.id, ProjectStatus::Archived)
            .unwrap();
        assert!(store.next_task(&owner).unwrap().is_none());
    }
}
