//! Mapping of entity date ranges onto the timeline's visible day columns.

use chrono::{Duration, NaiveDate};
use uuid::Uuid;

use crate::store::{Milestone, Project, Task};

/// The contiguous run of day columns currently rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimelineWindow {
    pub start: NaiveDate,
    pub days: usize,
}

impl TimelineWindow {
    pub fn new(start: NaiveDate, days: usize) -> Self {
        Self { start, days }
    }

    /// First date past the window.
    pub fn end(&self) -> NaiveDate {
        self.start + Duration::days(self.days as i64)
    }

    pub fn date_at(&self, column: usize) -> NaiveDate {
        self.start + Duration::days(column as i64)
    }

    pub fn columns(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        (0..self.days).map(|i| self.date_at(i))
    }

    pub fn shift(&mut self, days: i64) {
        self.start += Duration::days(days);
    }
}

/// A half-open column range, clipped to the window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnSpan {
    pub start_idx: usize,
    /// Exclusive.
    pub end_idx: usize,
}

impl ColumnSpan {
    pub fn len(&self) -> usize {
        self.end_idx - self.start_idx
    }

    pub fn left_percent(&self, total_columns: usize) -> f32 {
        if total_columns == 0 {
            return 0.0;
        }
        self.start_idx as f32 / total_columns as f32 * 100.0
    }

    pub fn width_percent(&self, total_columns: usize) -> f32 {
        if total_columns == 0 {
            return 0.0;
        }
        self.len() as f32 / total_columns as f32 * 100.0
    }
}

/// Clip an inclusive date range to the window's columns.
///
/// Start index is the first column on or after `start`, end index the first
/// column past `end`; both clamp to the window edges. A non-positive span
/// means the entity lies entirely outside the window and is suppressed.
pub fn map_to_columns(
    start: NaiveDate,
    end: NaiveDate,
    window: &TimelineWindow,
) -> Option<ColumnSpan> {
    let days = window.days as i64;
    let start_idx = (start - window.start).num_days().clamp(0, days);
    let end_idx = ((end - window.start).num_days() + 1).clamp(0, days);
    if end_idx <= start_idx {
        return None;
    }
    Some(ColumnSpan {
        start_idx: start_idx as usize,
        end_idx: end_idx as usize,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BarKind {
    Project,
    Milestone,
    Task,
}

/// An entity mapped onto the visible columns, ready to paint.
#[derive(Debug, Clone, PartialEq)]
pub struct TimelineBar {
    pub id: Uuid,
    pub label: String,
    pub kind: BarKind,
    pub span: ColumnSpan,
    pub completed: bool,
    pub color_index: usize,
}

/// Project bar over start..deadline. A project missing one endpoint shows
/// as a single-day marker at the other; missing both, it has no bar.
pub fn project_bar(project: &Project, window: &TimelineWindow) -> Option<TimelineBar> {
    let (start, end) = match (project.start, project.deadline) {
        (Some(s), Some(d)) => (s.date().min(d.date()), s.date().max(d.date())),
        (Some(s), None) => (s.date(), s.date()),
        (None, Some(d)) => (d.date(), d.date()),
        (None, None) => return None,
    };
    Some(TimelineBar {
        id: project.id,
        label: project.name.clone(),
        kind: BarKind::Project,
        span: map_to_columns(start, end, window)?,
        completed: false,
        color_index: project.color_index,
    })
}

/// Milestone marker on its due date.
pub fn milestone_bar(
    milestone: &Milestone,
    color_index: usize,
    window: &TimelineWindow,
) -> Option<TimelineBar> {
    let due = milestone.due?.date();
    Some(TimelineBar {
        id: milestone.id,
        label: milestone.name.clone(),
        kind: BarKind::Milestone,
        span: map_to_columns(due, due, window)?,
        completed: milestone.completed,
        color_index,
    })
}

/// Task bar: scheduled-through-due when both exist in order, otherwise a
/// single day at whichever date the task has.
pub fn task_bar(task: &Task, color_index: usize, window: &TimelineWindow) -> Option<TimelineBar> {
    let scheduled = task.scheduled_start.map(|s| s.date());
    let due = task.due.map(|d| d.date());
    let (start, end) = match (scheduled, due) {
        (Some(s), Some(d)) if s <= d => (s, d),
        (Some(s), _) => (s, s),
        (None, Some(d)) => (d, d),
        (None, None) => return None,
    };
    Some(TimelineBar {
        id: task.id,
        label: task.title.clone(),
        kind: BarKind::Task,
        span: map_to_columns(start, end, window)?,
        completed: task.completed,
        color_index,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::instant::Instant;
    use crate::schedule::Priority;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn april_window() -> TimelineWindow {
        TimelineWindow::new(date(2025, 4, 1), 30)
    }

    #[test]
    fn entity_starting_before_window_clamps_left() {
        let span = map_to_columns(date(2025, 3, 20), date(2025, 4, 5), &april_window()).unwrap();
        assert_eq!(span.start_idx, 0);
        // First column past 2025-04-05 is 2025-04-06.
        assert_eq!(span.end_idx, 5);
        assert_eq!(span.len(), 5);
    }

    #[test]
    fn entity_past_window_clamps_right() {
        let span = map_to_columns(date(2025, 4, 20), date(2025, 5, 15), &april_window()).unwrap();
        assert_eq!(span.start_idx, 19);
        assert_eq!(span.end_idx, 30);
    }

    #[test]
    fn entities_outside_window_are_suppressed() {
        let window = april_window();
        assert!(map_to_columns(date(2025, 3, 1), date(2025, 3, 20), &window).is_none());
        assert!(map_to_columns(date(2025, 5, 2), date(2025, 5, 9), &window).is_none());
    }

    #[test]
    fn inverted_range_never_yields_negative_width() {
        // End before start collapses below the window's left edge.
        assert!(map_to_columns(date(2025, 4, 10), date(2025, 3, 1), &april_window()).is_none());
    }

    #[test]
    fn single_day_spans_one_column() {
        let span = map_to_columns(date(2025, 4, 10), date(2025, 4, 10), &april_window()).unwrap();
        assert_eq!(span.len(), 1);
        assert_eq!(span.start_idx, 9);
    }

    #[test]
    fn percent_geometry_is_proportional() {
        let span = ColumnSpan {
            start_idx: 6,
            end_idx: 12,
        };
        assert_eq!(span.left_percent(30), 20.0);
        assert_eq!(span.width_percent(30), 20.0);
        assert_eq!(span.left_percent(0), 0.0);
    }

    fn bare_task(title: &str) -> Task {
        Task {
            id: Uuid::new_v4(),
            title: title.to_string(),
            notes: String::new(),
            project_id: None,
            milestone_id: None,
            due: None,
            scheduled_start: None,
            duration_minutes: None,
            completed: false,
            priority: Priority::Medium,
        }
    }

    #[test]
    fn task_bar_spans_scheduled_through_due() {
        let mut t = bare_task("Draft proposal");
        t.scheduled_start = Some(Instant::at(date(2025, 4, 3), 9, 0));
        t.due = Some(Instant::from_date(date(2025, 4, 8)));
        let bar = task_bar(&t, 0, &april_window()).unwrap();
        assert_eq!(bar.span.start_idx, 2);
        assert_eq!(bar.span.end_idx, 8);
    }

    #[test]
    fn task_bar_falls_back_to_single_day() {
        let mut due_only = bare_task("Review");
        due_only.due = Some(Instant::from_date(date(2025, 4, 10)));
        assert_eq!(task_bar(&due_only, 0, &april_window()).unwrap().span.len(), 1);

        // Scheduled after due: the scheduled day wins, one column wide.
        let mut inverted = bare_task("Slipped");
        inverted.scheduled_start = Some(Instant::at(date(2025, 4, 20), 9, 0));
        inverted.due = Some(Instant::from_date(date(2025, 4, 10)));
        let bar = task_bar(&inverted, 0, &april_window()).unwrap();
        assert_eq!(bar.span.start_idx, 19);
        assert_eq!(bar.span.len(), 1);

        assert!(task_bar(&bare_task("Dateless"), 0, &april_window()).is_none());
    }

    #[test]
    fn window_columns_enumerate_days() {
        let window = TimelineWindow::new(date(2025, 4, 28), 5);
        let columns: Vec<NaiveDate> = window.columns().collect();
        assert_eq!(columns.len(), 5);
        assert_eq!(columns[0], date(2025, 4, 28));
        assert_eq!(columns[4], date(2025, 5, 2));
        assert_eq!(window.end(), date(2025, 5, 3));
    }
}
