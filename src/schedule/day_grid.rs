//! Slot partitioning and block placement for the day time-block view.

use chrono::NaiveDate;

use super::item::{items_for_date, SchedulableItem};
use super::month::capacity_percent;
use super::WorkingHours;
use crate::store::{Habit, Task};

/// Pixel and slot geometry of the day grid. The grid hours bound what is
/// drawn; the working hours only affect slot flags and utilization.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridGeometry {
    pub start_hour: u8,
    pub end_hour: u8,
    pub slot_minutes: u32,
    pub slot_height_px: f32,
    pub block_gap_px: f32,
}

impl Default for GridGeometry {
    fn default() -> Self {
        Self {
            start_hour: 6,
            end_hour: 23,
            slot_minutes: 30,
            slot_height_px: 28.0,
            block_gap_px: 2.0,
        }
    }
}

impl GridGeometry {
    pub fn grid_start_minutes(&self) -> u32 {
        self.start_hour as u32 * 60
    }

    /// Total pixel height of the slot grid.
    pub fn total_height_px(&self) -> f32 {
        self.slot_count() as f32 * self.slot_height_px
    }

    pub fn slot_count(&self) -> usize {
        if self.end_hour <= self.start_hour || self.slot_minutes == 0 {
            return 0;
        }
        let span = (self.end_hour - self.start_hour) as u32 * 60;
        (span / self.slot_minutes) as usize
    }
}

/// One fixed-size slot of the day grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slot {
    pub hour: u8,
    pub minute: u8,
    pub in_working_hours: bool,
}

/// A scheduled item positioned within the slot grid.
///
/// Offsets are the raw formula output; an item starting before the grid's
/// first hour gets a negative offset and the view clips it.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedBlock {
    pub item: SchedulableItem,
    pub top_offset_px: f32,
    pub height_px: f32,
}

/// Scheduled-vs-available aggregate for the focus day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Utilization {
    pub scheduled_minutes: u32,
    pub working_minutes: u32,
    /// Uncapped, like the month view's capacity percent.
    pub percent: u32,
    pub is_overbooked: bool,
    pub is_near_capacity: bool,
}

#[derive(Debug, Clone)]
pub struct DayGrid {
    pub date: NaiveDate,
    pub slots: Vec<Slot>,
    pub blocks: Vec<PlacedBlock>,
    /// Open items with no scheduled start at all, due date or not.
    pub unscheduled: Vec<SchedulableItem>,
    pub utilization: Utilization,
}

/// Build the slot grid, placed blocks and utilization for one focus day.
pub fn build_day_grid(
    day: NaiveDate,
    tasks: &[Task],
    habits: &[Habit],
    hours: WorkingHours,
    geometry: GridGeometry,
) -> DayGrid {
    let items = items_for_date(tasks, habits, day);

    let mut slots = Vec::with_capacity(geometry.slot_count());
    for idx in 0..geometry.slot_count() {
        let minute_of_day = geometry.grid_start_minutes() + idx as u32 * geometry.slot_minutes;
        slots.push(Slot {
            hour: (minute_of_day / 60) as u8,
            minute: (minute_of_day % 60) as u8,
            in_working_hours: hours.contains_minute(minute_of_day),
        });
    }

    let mut blocks = Vec::new();
    let mut unscheduled = Vec::new();
    let mut scheduled_minutes = 0u32;

    for item in items {
        if item.scheduled_on(day) {
            scheduled_minutes += item.duration_minutes;
            blocks.push(place_block(&item, geometry));
        } else if item.scheduled_start.is_none() && !item.completed {
            unscheduled.push(item);
        }
    }
    blocks.sort_by(|a, b| {
        a.top_offset_px
            .partial_cmp(&b.top_offset_px)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let working_minutes = hours.span_minutes();
    let percent = capacity_percent(scheduled_minutes, working_minutes);

    DayGrid {
        date: day,
        slots,
        blocks,
        unscheduled,
        utilization: Utilization {
            scheduled_minutes,
            working_minutes,
            percent,
            is_overbooked: percent > 100,
            is_near_capacity: percent > 80,
        },
    }
}

fn place_block(item: &SchedulableItem, geometry: GridGeometry) -> PlacedBlock {
    let minute_of_day = item
        .scheduled_start
        .map(|s| s.minute_of_day())
        .unwrap_or(0);
    let slot_minutes = geometry.slot_minutes.max(1) as f32;
    let top_offset_px = (minute_of_day as f32 - geometry.grid_start_minutes() as f32)
        / slot_minutes
        * geometry.slot_height_px;
    let height_px =
        item.duration_minutes as f32 / slot_minutes * geometry.slot_height_px - geometry.block_gap_px;

    PlacedBlock {
        item: item.clone(),
        top_offset_px,
        height_px,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::instant::Instant;
    use crate::schedule::Priority;
    use uuid::Uuid;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn task(title: &str) -> Task {
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

    fn scheduled_task(title: &str, day: NaiveDate, h: u32, m: u32, minutes: u32) -> Task {
        let mut t = task(title);
        t.scheduled_start = Some(Instant::at(day, h, m));
        t.duration_minutes = Some(minutes);
        t
    }

    fn hours() -> WorkingHours {
        WorkingHours::new(9, 17)
    }

    #[test]
    fn slots_cover_grid_and_flag_working_hours() {
        let grid = build_day_grid(date(2025, 3, 12), &[], &[], hours(), GridGeometry::default());
        assert_eq!(grid.slots.len(), (23 - 6) * 2);
        assert_eq!(grid.slots[0].hour, 6);
        assert_eq!(grid.slots[0].minute, 0);
        assert!(!grid.slots[0].in_working_hours);

        let nine = grid.slots.iter().find(|s| s.hour == 9 && s.minute == 0).unwrap();
        assert!(nine.in_working_hours);
        let half_past_sixteen = grid.slots.iter().find(|s| s.hour == 16 && s.minute == 30).unwrap();
        assert!(half_past_sixteen.in_working_hours);
        let seventeen = grid.slots.iter().find(|s| s.hour == 17 && s.minute == 0).unwrap();
        assert!(!seventeen.in_working_hours);
    }

    #[test]
    fn overbooked_day_keeps_raw_percent() {
        let day = date(2025, 3, 12);
        let tasks = [
            scheduled_task("Deep work", day, 9, 0, 200),
            scheduled_task("Review backlog", day, 13, 0, 300),
        ];
        let grid = build_day_grid(day, &tasks, &[], hours(), GridGeometry::default());
        assert_eq!(grid.utilization.scheduled_minutes, 500);
        assert_eq!(grid.utilization.working_minutes, 480);
        assert_eq!(grid.utilization.percent, 104);
        assert!(grid.utilization.is_overbooked);
        assert!(grid.utilization.is_near_capacity);
    }

    #[test]
    fn placement_follows_slot_formula() {
        let day = date(2025, 3, 12);
        let tasks = [scheduled_task("Standup", day, 9, 30, 60)];
        let geometry = GridGeometry::default();
        let grid = build_day_grid(day, &tasks, &[], hours(), geometry);
        let block = &grid.blocks[0];
        // (570 - 360) / 30 slots of 28px.
        assert_eq!(block.top_offset_px, 7.0 * geometry.slot_height_px);
        assert_eq!(
            block.height_px,
            2.0 * geometry.slot_height_px - geometry.block_gap_px
        );
    }

    #[test]
    fn missing_duration_defaults_to_thirty_minutes() {
        let day = date(2025, 3, 12);
        let mut t = task("Quick sync");
        t.scheduled_start = Some(Instant::at(day, 10, 0));
        let grid = build_day_grid(day, &[t], &[], hours(), GridGeometry::default());
        assert_eq!(grid.utilization.scheduled_minutes, 30);
        assert_eq!(
            grid.blocks[0].height_px,
            GridGeometry::default().slot_height_px - GridGeometry::default().block_gap_px
        );
    }

    #[test]
    fn unscheduled_includes_items_without_due_dates() {
        let day = date(2025, 3, 12);
        let no_due = task("Imported errand");
        let mut due_only = task("File report");
        due_only.due = Some(Instant::from_date(date(2025, 3, 20)));
        let mut done = task("Already shipped");
        done.completed = true;
        let placed = scheduled_task("Planned", day, 9, 0, 30);

        let grid = build_day_grid(
            day,
            &[no_due, due_only, done, placed],
            &[],
            hours(),
            GridGeometry::default(),
        );
        let titles: Vec<&str> = grid.unscheduled.iter().map(|i| i.title.as_str()).collect();
        assert_eq!(titles, vec!["Imported errand", "File report"]);
        assert_eq!(grid.blocks.len(), 1);
    }

    #[test]
    fn blocks_sorted_by_offset() {
        let day = date(2025, 3, 12);
        let tasks = [
            scheduled_task("Afternoon", day, 14, 0, 60),
            scheduled_task("Morning", day, 8, 0, 30),
        ];
        let grid = build_day_grid(day, &tasks, &[], hours(), GridGeometry::default());
        assert_eq!(grid.blocks[0].item.title, "Morning");
        assert_eq!(grid.blocks[1].item.title, "Afternoon");
    }
}
