//! Unified calendar for OrbitOS.
//!
//! Merges projects, milestones, tasks and events into one entry list and
//! lays it out on a week-aligned month grid.

pub mod aggregate;
pub mod error;
pub mod event;
pub mod grid;
pub mod range;
pub mod source;
pub mod types;
pub mod unify;

pub use aggregate::{create_event, get_calendar_events, month_view};
pub use error::CalendarError;
pub use event::{CreateEventRequest, EventType, NewEvent};
pub use grid::{build_grid, DayCell, GridOptions, MonthGrid};
pub use range::{expand, DateRange, PaddedRange, BUFFER_DAYS};
pub use source::{CalendarSource, EventWriter};
pub use types::{
    CalendarEntry, EntryKind, EventRecord, MilestoneRecord, ProjectRecord, ProjectRef, TaskRecord,
    UserId,
};
pub use unify::unify;
