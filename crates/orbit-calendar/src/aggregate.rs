//! Calendar aggregation: fetch, unify, lay out.

use chrono::{FixedOffset, NaiveDate};
use tracing::instrument;

use crate::error::CalendarError;
use crate::event::CreateEventRequest;
use crate::grid::{build_grid, GridOptions, MonthGrid};
use crate::range::expand;
use crate::source::{CalendarSource, EventWriter};
use crate::types::{CalendarEntry, EventRecord, UserId};
use crate::unify::unify;

/// All entries visible to `user` around the month containing `focus_month`.
///
/// The four fetches run concurrently over the padded range. Any failure
/// fails the whole call; partial results are never returned.
#[instrument(skip(source), level = "info")]
pub async fn get_calendar_events(
    source: &dyn CalendarSource,
    user: &UserId,
    focus_month: NaiveDate,
    offset: FixedOffset,
) -> Result<Vec<CalendarEntry>, CalendarError> {
    let range = expand(focus_month).to_utc(offset);

    let (projects, milestones, tasks, events) = tokio::try_join!(
        source.fetch_projects(user, &range),
        source.fetch_milestones(user, &range),
        source.fetch_tasks(user, &range),
        source.fetch_events(user, &range),
    )?;

    tracing::debug!(
        projects = projects.len(),
        milestones = milestones.len(),
        tasks = tasks.len(),
        events = events.len(),
        "Fetched calendar sources"
    );

    let entries = unify(projects, milestones, tasks, events);
    tracing::info!("Aggregated {} calendar entries", entries.len());
    Ok(entries)
}

/// Aggregate and bucket entries into the month grid.
#[instrument(skip(source), level = "info")]
pub async fn month_view(
    source: &dyn CalendarSource,
    user: &UserId,
    focus_month: NaiveDate,
    options: &GridOptions,
) -> Result<MonthGrid, CalendarError> {
    let entries = get_calendar_events(source, user, focus_month, options.offset).await?;
    Ok(build_grid(focus_month, &entries, options))
}

/// Validate `request` and store it as an event owned by `user`.
#[instrument(skip(writer, request), level = "info")]
pub async fn create_event(
    writer: &dyn EventWriter,
    user: &UserId,
    request: &CreateEventRequest,
    offset: FixedOffset,
) -> Result<EventRecord, CalendarError> {
    let event = request.validate(offset).map_err(|errors| {
        tracing::warn!("Rejected event: {}", errors);
        CalendarError::from(errors)
    })?;

    let stored = writer.insert_event(user, event).await?;
    tracing::info!(id = %stored.id, "Created event");
    Ok(stored)
}
