mod day_grid;
mod hierarchy;
mod instant;
mod item;
mod month;
mod reschedule;
mod timeline;

pub use day_grid::{build_day_grid, DayGrid, GridGeometry, PlacedBlock, Slot, Utilization};
pub use hierarchy::{build_project_groups, ExpandState, MilestoneGroup, ProjectGroup, TaskRow};
pub use instant::{
    add_months, is_weekend, month_anchor, normalize, normalize_opt, weekday_index, Absent, Instant,
    RawDate,
};
pub use item::{items_for_date, ItemKind, Priority, SchedulableItem, DEFAULT_DURATION_MINUTES};
pub use month::{build_month, DayCell};
pub use reschedule::{DragItem, DragState, RescheduleCommit, RescheduleCoordinator, SlotRef};
pub use timeline::{
    map_to_columns, milestone_bar, project_bar, task_bar, BarKind, ColumnSpan, TimelineBar,
    TimelineWindow,
};

use chrono::NaiveDate;

/// The user's working-hours window, shared by capacity math in the month
/// and day views. Hours are whole and end-exclusive (9..17 = 09:00-17:00).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkingHours {
    pub start_hour: u8,
    pub end_hour: u8,
}

impl WorkingHours {
    pub fn new(start_hour: u8, end_hour: u8) -> Self {
        Self {
            start_hour,
            end_hour,
        }
    }

    /// Minutes between work start and work end, 0 for an inverted window.
    pub fn span_minutes(&self) -> u32 {
        if self.end_hour > self.start_hour {
            (self.end_hour - self.start_hour) as u32 * 60
        } else {
            0
        }
    }

    /// Minutes available for scheduling on `date`. Weekends have none.
    pub fn available_on(&self, date: NaiveDate) -> u32 {
        if is_weekend(date) {
            0
        } else {
            self.span_minutes()
        }
    }

    pub fn contains_minute(&self, minute_of_day: u32) -> bool {
        minute_of_day >= self.start_hour as u32 * 60 && minute_of_day < self.end_hour as u32 * 60
    }
}

impl Default for WorkingHours {
    fn default() -> Self {
        Self {
            start_hour: 9,
            end_hour: 17,
        }
    }
}
