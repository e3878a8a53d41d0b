//! Terminal rendering for the month view and dashboard.

use chrono::{Datelike, FixedOffset, NaiveDate};
use orbit_calendar::{CalendarEntry, DayCell, EntryKind, MonthGrid, TaskRecord};
use orbit_services::{format_duration, DashboardStats, Goal, Project, RevenueSplit, TimeLog};
use owo_colors::OwoColorize;

/// Width of one day column in the week grid.
const CELL_WIDTH: usize = 4;

pub trait Render {
    fn render(&self) -> String;
}

impl Render for EntryKind {
    fn render(&self) -> String {
        match self {
            EntryKind::Project => "project".blue().to_string(),
            EntryKind::Milestone => "milestone".magenta().to_string(),
            EntryKind::Task => "task".yellow().to_string(),
            EntryKind::Event => "event".green().to_string(),
        }
    }
}

impl Render for DayCell {
    fn render(&self) -> String {
        let day = format!("{:>2}", self.date.day());
        let marker = if self.entries.is_empty() { " " } else { "*" };
        let cell = format!("{}{}", day, marker);

        if self.is_today {
            cell.reversed().to_string()
        } else if !self.in_focus_month {
            cell.dimmed().to_string()
        } else {
            cell
        }
    }
}

/// Month title, weekday header and one row per week.
pub fn month_grid(grid: &MonthGrid) -> String {
    let mut lines = Vec::with_capacity(grid.week_count() + 2);

    let title = NaiveDate::from_ymd_opt(grid.year, grid.month, 1)
        .map(|d| d.format("%B %Y").to_string())
        .unwrap_or_else(|| format!("{}-{:02}", grid.year, grid.month));
    lines.push(title.bold().to_string());

    let mut header = String::new();
    let mut weekday = grid.week_start;
    for _ in 0..7 {
        let name: String = weekday.to_string().chars().take(2).collect();
        header.push_str(&format!("{:>width$}", name, width = CELL_WIDTH - 1));
        header.push(' ');
        weekday = weekday.succ();
    }
    lines.push(header.trim_end().dimmed().to_string());

    for week in grid.weeks() {
        let row: Vec<String> = week.iter().map(Render::render).collect();
        lines.push(row.join(" "));
    }

    lines.join("\n")
}

fn entry_line(entry: &CalendarEntry, offset: FixedOffset) -> String {
    let time = if entry.kind() == EntryKind::Event {
        entry.start.with_timezone(&offset).format("%H:%M").to_string()
    } else {
        "     ".to_string()
    };

    let mut line = format!("  {} {} [{}]", time.dimmed(), entry.title, entry.kind().render());
    if let Some(project) = &entry.project {
        if entry.kind() != EntryKind::Project {
            line.push_str(&format!(" {}", project.name.cyan()));
        }
    }
    if let Some(detail) = entry.status.as_deref().or(entry.category.as_deref()) {
        line.push_str(&format!(" {}", detail.to_lowercase().dimmed()));
    }
    line
}

/// Entries of each focus-month day, in grid order.
pub fn agenda(grid: &MonthGrid, offset: FixedOffset) -> String {
    let mut lines = Vec::new();

    for cell in grid.days.iter().filter(|c| c.in_focus_month && !c.entries.is_empty()) {
        lines.push(cell.date.format("%a %d %b").to_string().bold().to_string());
        for entry in &cell.entries {
            lines.push(entry_line(entry, offset));
        }
    }

    if lines.is_empty() {
        lines.push("Nothing scheduled this month".dimmed().to_string());
    }
    lines.join("\n")
}

/// Revenue, project and time summary plus the next task to pick up.
pub fn dashboard(stats: &DashboardStats, next: Option<&TaskRecord>, currency: &str) -> String {
    let mut lines = vec![
        format!("Revenue:         {} {:.2}", currency, stats.revenue),
        format!("Pending revenue: {} {:.2}", currency, stats.pending_revenue),
        format!("Active projects: {}", stats.active_projects),
        format!(
            "Time logged:     {} (~{}h)",
            format_duration(stats.total_minutes),
            stats.total_hours
        ),
    ];

    match next {
        Some(task) => {
            let due = task
                .due_date
                .map(|d| format!(" due {}", d.format("%Y-%m-%d")))
                .unwrap_or_default();
            lines.push(format!(
                "Next task:       {} ({}){}",
                task.title,
                task.project_title.cyan(),
                due.dimmed()
            ));
        }
        None => lines.push(format!("Next task:       {}", "none".dimmed())),
    }

    lines.join("\n")
}

pub fn project_list(projects: &[Project]) -> String {
    if projects.is_empty() {
        return "No projects yet".dimmed().to_string();
    }

    projects
        .iter()
        .map(|p| {
            let dates = match (p.start_date, p.end_date) {
                (Some(start), Some(end)) => {
                    format!(" {} .. {}", start.format("%Y-%m-%d"), end.format("%Y-%m-%d"))
                }
                _ => String::new(),
            };
            format!(
                "{} {} [{}] {} {:.2}{}",
                p.id.dimmed(),
                p.title.bold(),
                p.status.as_str().to_lowercase(),
                p.currency,
                p.total_budget,
                dates.dimmed()
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn revenue_split(split: &RevenueSplit, currency: &str) -> String {
    let mut lines: Vec<String> = split
        .shares
        .iter()
        .map(|share| {
            format!(
                "{:<28} {:>6.2}%  {} {:.2}",
                share.email, share.percentage, currency, share.amount
            )
        })
        .collect();
    lines.push(format!("{:<28} {:>7}  {} {:.2}", "owner".bold(), "", currency, split.owner_amount));
    lines.join("\n")
}

pub fn goal_list(goals: &[Goal]) -> String {
    if goals.is_empty() {
        return "No goals yet".dimmed().to_string();
    }

    goals
        .iter()
        .map(|g| {
            let target = g
                .target_date
                .map(|d| format!(" by {}", d.format("%Y-%m-%d")))
                .unwrap_or_default();
            format!("{} {} [{}]{}", g.id.dimmed(), g.title, g.status, target.dimmed())
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn time_log_list(logs: &[TimeLog]) -> String {
    if logs.is_empty() {
        return "No time logged".dimmed().to_string();
    }

    logs.iter()
        .map(|log| {
            format!(
                "{} {:>8} {}{}",
                log.start_time.format("%Y-%m-%d %H:%M"),
                format_duration(log.duration_minutes),
                log.project_title.as_deref().unwrap_or(&log.project_id).cyan(),
                log.description
                    .as_deref()
                    .map(|d| format!(" {}", d))
                    .unwrap_or_default()
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}
