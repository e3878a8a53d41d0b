//! Month grid: week-aligned day cells with their entries.

use chrono::{Datelike, Days, FixedOffset, NaiveDate, Utc, Weekday};
use orbit_core::CalendarConfig;
use serde::Serialize;

use crate::range::{first_of_month, last_of_month, local_date, local_midnight_utc};
use crate::types::CalendarEntry;

/// How the grid is laid out and which day counts as today.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridOptions {
    pub week_start: Weekday,
    pub offset: FixedOffset,
    pub today: NaiveDate,
}

impl GridOptions {
    pub fn new(week_start: Weekday, offset: FixedOffset, today: NaiveDate) -> Self {
        Self {
            week_start,
            offset,
            today,
        }
    }

    /// Options from config with `today` taken from the clock.
    pub fn from_config(config: &CalendarConfig) -> Self {
        let offset = config.offset();
        Self::new(config.week_start.weekday(), offset, local_date(Utc::now(), offset))
    }
}

/// One cell of the month view.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayCell {
    pub date: NaiveDate,
    pub in_focus_month: bool,
    pub is_today: bool,
    pub entries: Vec<CalendarEntry>,
}

/// Day cells for a focus month, whole weeks only.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthGrid {
    pub year: i32,
    pub month: u32,
    #[serde(skip)]
    pub week_start: Weekday,
    pub days: Vec<DayCell>,
}

impl MonthGrid {
    /// Cells split into rows of seven.
    pub fn weeks(&self) -> impl Iterator<Item = &[DayCell]> {
        self.days.chunks(7)
    }

    pub fn week_count(&self) -> usize {
        self.days.len() / 7
    }

    pub fn day(&self, date: NaiveDate) -> Option<&DayCell> {
        self.days.iter().find(|cell| cell.date == date)
    }
}

/// First and last visible day for the month containing `focus_month`.
pub fn grid_bounds(focus_month: NaiveDate, week_start: Weekday) -> (NaiveDate, NaiveDate) {
    let first = first_of_month(focus_month);
    let last = last_of_month(focus_month);

    let lead = days_from_week_start(first.weekday(), week_start);
    let trail = 6 - days_from_week_start(last.weekday(), week_start);

    (
        first.checked_sub_days(Days::new(lead)).unwrap_or(first),
        last.checked_add_days(Days::new(trail)).unwrap_or(last),
    )
}

fn days_from_week_start(day: Weekday, week_start: Weekday) -> u64 {
    let day = u64::from(day.num_days_from_monday());
    let start = u64::from(week_start.num_days_from_monday());
    (7 + day - start) % 7
}

/// Whether `entry` shows on `day`: it starts that day, or the day's
/// midnight falls within `[start, end]`.
pub fn entry_on_day(entry: &CalendarEntry, day: NaiveDate, offset: FixedOffset) -> bool {
    if local_date(entry.start, offset) == day {
        return true;
    }
    let day_start = local_midnight_utc(day, offset);
    entry.start <= day_start && day_start <= entry.end
}

/// Lay out the month containing `focus_month` and bucket `entries` per day.
pub fn build_grid(
    focus_month: NaiveDate,
    entries: &[CalendarEntry],
    options: &GridOptions,
) -> MonthGrid {
    let (grid_start, grid_end) = grid_bounds(focus_month, options.week_start);

    let days = grid_start
        .iter_days()
        .take_while(|date| *date <= grid_end)
        .map(|date| DayCell {
            date,
            in_focus_month: date.year() == focus_month.year()
                && date.month() == focus_month.month(),
            is_today: date == options.today,
            entries: entries
                .iter()
                .filter(|entry| entry_on_day(entry, date, options.offset))
                .cloned()
                .collect(),
        })
        .collect();

    MonthGrid {
        year: focus_month.year(),
        month: focus_month.month(),
        week_start: options.week_start,
        days,
    }
}
