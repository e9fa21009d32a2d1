//! The unified placement view over tasks and habits.
//!
//! All three time views place the same flattened item shape; building it in
//! one spot keeps the duration default and the habit-occurrence rules out of
//! the per-view code.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::instant::Instant;
use crate::store::{Habit, Task};

/// Duration assumed for items stored without one.
pub const DEFAULT_DURATION_MINUTES: u32 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    Task,
    Habit,
}

/// Ordinal task priority, lowest first.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
    Urgent,
}

/// A task or habit occurrence as the placement engine sees it.
#[derive(Debug, Clone, PartialEq)]
pub struct SchedulableItem {
    pub id: Uuid,
    pub title: String,
    pub kind: ItemKind,
    pub due_date: Option<Instant>,
    pub scheduled_start: Option<Instant>,
    pub duration_minutes: u32,
    pub completed: bool,
    pub priority: Priority,
    pub project_id: Option<Uuid>,
}

impl SchedulableItem {
    pub fn from_task(task: &Task) -> Self {
        Self {
            id: task.id,
            title: task.title.clone(),
            kind: ItemKind::Task,
            due_date: task.due,
            scheduled_start: task.scheduled_start,
            duration_minutes: task.duration_minutes.unwrap_or(DEFAULT_DURATION_MINUTES),
            completed: task.completed,
            priority: task.priority,
            project_id: task.project_id,
        }
    }

    /// The habit's occurrence on `date`, or `None` when its recurrence does
    /// not land there. Occurrences never carry a due date; a habit without a
    /// preferred time yields an unscheduled occurrence.
    pub fn habit_occurrence(habit: &Habit, date: NaiveDate) -> Option<Self> {
        if !habit.recurrence.occurs_on(date) {
            return None;
        }
        let scheduled_start = habit
            .preferred_minute
            .map(|minute| Instant::at(date, minute / 60, minute % 60));
        Some(Self {
            id: habit.id,
            title: habit.name.clone(),
            kind: ItemKind::Habit,
            due_date: None,
            scheduled_start,
            duration_minutes: habit.duration_minutes.unwrap_or(DEFAULT_DURATION_MINUTES),
            completed: habit.done_on.contains(&date),
            priority: Priority::Medium,
            project_id: None,
        })
    }

    /// True when the item's scheduled start falls on `date`.
    pub fn scheduled_on(&self, date: NaiveDate) -> bool {
        self.scheduled_start.map(|s| s.date()) == Some(date)
    }

    /// True when the item's due date falls on `date`.
    pub fn due_on(&self, date: NaiveDate) -> bool {
        self.due_date.map(|d| d.date()) == Some(date)
    }
}

/// Flatten tasks plus the habit occurrences for one date.
pub fn items_for_date(tasks: &[Task], habits: &[Habit], date: NaiveDate) -> Vec<SchedulableItem> {
    let mut items: Vec<SchedulableItem> = tasks.iter().map(SchedulableItem::from_task).collect();
    items.extend(
        habits
            .iter()
            .filter_map(|h| SchedulableItem::habit_occurrence(h, date)),
    );
    items
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Recurrence;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn habit(recurrence: Recurrence, preferred_minute: Option<u32>) -> Habit {
        Habit {
            id: Uuid::new_v4(),
            name: "Stretch".to_string(),
            recurrence,
            preferred_minute,
            duration_minutes: None,
            done_on: Vec::new(),
        }
    }

    #[test]
    fn priority_is_ordinal() {
        assert!(Priority::Low < Priority::Medium);
        assert!(Priority::Medium < Priority::High);
        assert!(Priority::High < Priority::Urgent);
    }

    #[test]
    fn daily_habit_occurs_with_preferred_time() {
        let h = habit(Recurrence::Daily, Some(7 * 60 + 15));
        let occurrence = SchedulableItem::habit_occurrence(&h, date(2025, 3, 12)).unwrap();
        let start = occurrence.scheduled_start.unwrap();
        assert_eq!(start.date(), date(2025, 3, 12));
        assert_eq!(start.minute_of_day(), 7 * 60 + 15);
        assert_eq!(occurrence.duration_minutes, DEFAULT_DURATION_MINUTES);
    }

    #[test]
    fn weekday_habit_skips_weekends() {
        let h = habit(Recurrence::Weekdays, Some(8 * 60));
        // 2025-03-15 is a Saturday.
        assert!(SchedulableItem::habit_occurrence(&h, date(2025, 3, 15)).is_none());
        assert!(SchedulableItem::habit_occurrence(&h, date(2025, 3, 14)).is_some());
    }

    #[test]
    fn habit_without_preferred_time_is_unscheduled() {
        let h = habit(Recurrence::Daily, None);
        let occurrence = SchedulableItem::habit_occurrence(&h, date(2025, 3, 12)).unwrap();
        assert!(occurrence.scheduled_start.is_none());
    }

    #[test]
    fn habit_completion_is_per_date() {
        let mut h = habit(Recurrence::Daily, Some(9 * 60));
        h.done_on.push(date(2025, 3, 12));
        let done = SchedulableItem::habit_occurrence(&h, date(2025, 3, 12)).unwrap();
        let pending = SchedulableItem::habit_occurrence(&h, date(2025, 3, 13)).unwrap();
        assert!(done.completed);
        assert!(!pending.completed);
    }
}
