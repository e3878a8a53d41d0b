mod commands;
mod render;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use orbit_calendar::{create_event, month_view, CreateEventRequest, GridOptions, UserId};
use commands::{
    CommandContext, GoalCommand, MilestoneCommand, ProjectCommand, TaskCommand, TimeCommand,
};
use orbit_core::{App, Config, ConfigError};
use orbit_services::{NewUser, SqliteCalendarSource, WorkspaceStore};

#[derive(Parser)]
#[command(name = "orbit")]
#[command(about = "Freelancer workspace: projects, revenue and a unified calendar")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Register a user and print their id
    Signup { name: String, email: String },
    /// Show the month grid and agenda
    Calendar {
        user_id: String,

        /// Any day of the month to show (YYYY-MM-DD), defaults to today
        #[arg(short, long)]
        date: Option<NaiveDate>,
    },
    /// Add a calendar event
    NewEvent {
        user_id: String,
        title: String,

        /// Start date/time (e.g., "2024-03-20T15:00")
        #[arg(short, long)]
        start: String,

        /// End date/time
        #[arg(short, long)]
        end: String,

        /// MEETING, CALL, DEADLINE or BLOCK
        #[arg(short = 't', long = "type", default_value = "MEETING")]
        event_type: String,

        #[arg(short, long)]
        project: Option<String>,
    },
    /// Revenue, time and next task summary
    Dashboard { user_id: String },
    /// Projects and their collaborators
    #[command(subcommand)]
    Project(ProjectCommand),
    /// Payment milestones and revenue splits
    #[command(subcommand)]
    Milestone(MilestoneCommand),
    #[command(subcommand)]
    Task(TaskCommand),
    #[command(subcommand)]
    Goal(GoalCommand),
    /// Time tracking
    #[command(subcommand)]
    Time(TimeCommand),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let (config, report) = Config::load_validated().map_err(|e| {
        if let Some(config_err) = e.downcast_ref::<ConfigError>() {
            eprintln!("{}", config_err.user_message());
        }
        e
    })?;

    // Config warnings are logged once the subscriber exists.
    orbit_core::init(Some(&config.logging.filter))?;
    for warning in &report.warnings {
        tracing::warn!("Config: {}", warning);
    }

    let app = App::with_config(config);
    let db_path = app.initialize()?;
    let store = WorkspaceStore::open(&db_path)?;
    let source = SqliteCalendarSource::new(store);

    let result = run(cli.command, app.config(), &source).await;
    app.shutdown()?;
    result
}

async fn run(command: Commands, config: &Config, source: &SqliteCalendarSource) -> Result<()> {
    let options = GridOptions::from_config(&config.calendar);
    let ctx = CommandContext {
        offset: options.offset,
        currency: config.finance.default_currency.clone(),
    };

    match command {
        Commands::Signup { name, email } => {
            let new_user = NewUser::parse(&name, &email)?;
            let user = source.store().lock().create_user(&new_user)?;
            println!("{}", user.id);
        }
        Commands::Calendar { user_id, date } => {
            let focus = date.unwrap_or(options.today);
            let grid = month_view(source, &UserId::new(user_id), focus, &options)
                .await
                .map_err(|e| {
                    eprintln!("{}", e.user_message());
                    e
                })
                .context("Failed to build month view")?;

            println!("{}\n", render::month_grid(&grid));
            println!("{}", render::agenda(&grid, options.offset));
        }
        Commands::NewEvent {
            user_id,
            title,
            start,
            end,
            event_type,
            project,
        } => {
            let request = CreateEventRequest {
                title: Some(title),
                description: None,
                start_time: Some(start),
                end_time: Some(end),
                event_type: Some(event_type),
                project_id: project,
            };
            let event = create_event(source, &UserId::new(user_id), &request, options.offset)
                .await
                .map_err(|e| {
                    eprintln!("{}", e.user_message());
                    e
                })
                .context("Failed to create event")?;
            println!("{}", event.id);
        }
        Commands::Dashboard { user_id } => {
            let user = UserId::new(user_id);
            let store = source.store();
            let store = store.lock();
            let stats = store.dashboard_stats(&user)?;
            let next = store.next_task(&user)?;
            println!(
                "{}",
                render::dashboard(&stats, next.as_ref(), &config.finance.default_currency)
            );
        }
        Commands::Project(cmd) => println!("{}", cmd.run(&source.store().lock(), &ctx)?),
        Commands::Milestone(cmd) => println!("{}", cmd.run(&source.store().lock(), &ctx)?),
        Commands::Task(cmd) => println!("{}", cmd.run(&source.store().lock(), &ctx)?),
        Commands::Goal(cmd) => println!("{}", cmd.run(&source.store().lock(), &ctx)?),
        Commands::Time(cmd) => println!("{}", cmd.run(&source.store().lock(), &ctx)?),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parses_nested_store_commands() {
        let cli = Cli::try_parse_from([
            "orbit", "milestone", "status", "u1", "m1", "paid",
        ])
        .unwrap();
        match cli.command {
            Commands::Milestone(MilestoneCommand::Status { status, .. }) => {
                assert_eq!(status, orbit_services::MilestoneStatus::Paid)
            }
            _ => panic!("expected milestone status"),
        }

        assert!(Cli::try_parse_from(["orbit", "task", "status", "u1", "t1", "later"]).is_err());
    }
}
