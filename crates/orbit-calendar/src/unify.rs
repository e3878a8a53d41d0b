//! Merge the four source streams into one entry list.

use crate::types::{
    CalendarEntry, EntryKind, EventRecord, MilestoneRecord, ProjectRecord, ProjectRef, TaskRecord,
};

/// Map projects, milestones, tasks and events to calendar entries.
///
/// Output order is all projects, then milestones, then tasks, then events,
/// each group in input order. Projects without both dates and
/// milestones/tasks without a due date are skipped. Events always appear.
pub fn unify(
    projects: Vec<ProjectRecord>,
    milestones: Vec<MilestoneRecord>,
    tasks: Vec<TaskRecord>,
    events: Vec<EventRecord>,
) -> Vec<CalendarEntry> {
    let mut entries =
        Vec::with_capacity(projects.len() + milestones.len() + tasks.len() + events.len());

    entries.extend(projects.into_iter().filter_map(project_entry));
    entries.extend(milestones.into_iter().filter_map(milestone_entry));
    entries.extend(tasks.into_iter().filter_map(task_entry));
    entries.extend(events.into_iter().map(event_entry));

    entries
}

fn project_entry(project: ProjectRecord) -> Option<CalendarEntry> {
    let (Some(start), Some(end)) = (project.start_date, project.end_date) else {
        tracing::debug!(id = %project.id, "skipping project without start/end dates");
        return None;
    };

    let mut entry = CalendarEntry::new(EntryKind::Project, project.id, &project.title, start, end);
    entry.status = Some(project.status);
    Some(entry)
}

fn milestone_entry(milestone: MilestoneRecord) -> Option<CalendarEntry> {
    let Some(due) = milestone.due_date else {
        tracing::debug!(id = %milestone.id, "skipping milestone without due date");
        return None;
    };

    let mut entry =
        CalendarEntry::new(EntryKind::Milestone, milestone.id, &milestone.title, due, due);
    entry.project = Some(ProjectRef {
        id: milestone.project_id,
        name: milestone.project_title,
    });
    entry.status = Some(milestone.status);
    Some(entry)
}

fn task_entry(task: TaskRecord) -> Option<CalendarEntry> {
    let Some(due) = task.due_date else {
        tracing::debug!(id = %task.id, "skipping task without due date");
        return None;
    };

    let mut entry = CalendarEntry::new(EntryKind::Task, task.id, &task.title, due, due);
    entry.project = Some(ProjectRef {
        id: task.project_id,
        name: task.project_title,
    });
    entry.status = Some(task.status);
    Some(entry)
}

fn event_entry(event: EventRecord) -> CalendarEntry {
    let mut entry = CalendarEntry::new(
        EntryKind::Event,
        event.id,
        &event.title,
        event.start_time,
        event.end_time,
    );
    entry.category = Some(event.event_type);
    // A joined title without an id cannot be referenced, so only the id decides.
    entry.project = event.project_id.map(|id| ProjectRef {
        name: event.project_title.unwrap_or_default(),
        id,
    });
    entry
}
