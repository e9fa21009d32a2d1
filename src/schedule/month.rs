//! Month-grid aggregation for the calendar view.

use chrono::{Datelike, Duration, NaiveDate};

use super::instant::{is_weekend, weekday_index};
use super::item::{items_for_date, SchedulableItem};
use super::WorkingHours;
use crate::store::{Habit, Task};

/// One calendar cell, derived fresh on every pass.
#[derive(Debug, Clone)]
pub struct DayCell {
    pub date: NaiveDate,
    pub in_anchor_month: bool,
    pub is_today: bool,
    pub is_weekend: bool,
    /// Items whose due date falls on this cell.
    pub due: Vec<SchedulableItem>,
    /// Items whose scheduled start falls on this cell.
    pub scheduled: Vec<SchedulableItem>,
    /// Scheduled here and already completed.
    pub completed_scheduled: Vec<SchedulableItem>,
    /// Due here, open, and not scheduled anywhere.
    pub unscheduled_due: Vec<SchedulableItem>,
    /// Due here, open, and either unscheduled or scheduled on another day.
    pub needs_attention: Vec<SchedulableItem>,
    pub scheduled_minutes: u32,
    pub available_minutes: u32,
    /// Uncapped; values above 100 mean the day is overbooked.
    pub capacity_percent: u32,
}

/// Build the full calendar grid for the month containing `anchor`: the
/// month's days plus the leading/trailing days needed to complete whole
/// weeks (Sunday through Saturday).
pub fn build_month(
    anchor: NaiveDate,
    today: NaiveDate,
    tasks: &[Task],
    habits: &[Habit],
    hours: WorkingHours,
) -> Vec<DayCell> {
    let first = NaiveDate::from_ymd_opt(anchor.year(), anchor.month(), 1).unwrap_or(anchor);
    let last = last_day_of_month(first);

    let grid_start = first - Duration::days(weekday_index(first) as i64);
    let grid_end = last + Duration::days((6 - weekday_index(last)) as i64);

    let mut cells = Vec::new();
    let mut date = grid_start;
    while date <= grid_end {
        cells.push(build_cell(date, first.month(), today, tasks, habits, hours));
        date += Duration::days(1);
    }
    cells
}

fn build_cell(
    date: NaiveDate,
    anchor_month: u32,
    today: NaiveDate,
    tasks: &[Task],
    habits: &[Habit],
    hours: WorkingHours,
) -> DayCell {
    let items = items_for_date(tasks, habits, date);

    let mut due = Vec::new();
    let mut scheduled = Vec::new();
    let mut completed_scheduled = Vec::new();
    let mut unscheduled_due = Vec::new();
    let mut needs_attention = Vec::new();
    let mut scheduled_minutes = 0u32;

    for item in &items {
        let scheduled_here = item.scheduled_on(date);
        let due_here = item.due_on(date);

        if scheduled_here {
            scheduled_minutes += item.duration_minutes;
            scheduled.push(item.clone());
            if item.completed {
                completed_scheduled.push(item.clone());
            }
        }

        if due_here {
            due.push(item.clone());
            if !item.completed {
                if item.scheduled_start.is_none() {
                    unscheduled_due.push(item.clone());
                }
                // Scheduled on the due date itself is fine; anything else
                // (unscheduled, or parked on another day) needs a look.
                if item.scheduled_start.map(|s| s.date()) != Some(date) {
                    needs_attention.push(item.clone());
                }
            }
        }
    }

    let available_minutes = hours.available_on(date);
    let capacity_percent = capacity_percent(scheduled_minutes, available_minutes);

    DayCell {
        date,
        in_anchor_month: date.month() == anchor_month,
        is_today: date == today,
        is_weekend: is_weekend(date),
        due,
        scheduled,
        completed_scheduled,
        unscheduled_due,
        needs_attention,
        scheduled_minutes,
        available_minutes,
        capacity_percent,
    }
}

/// Scheduled-over-available ratio as a rounded percentage, deliberately
/// uncapped so overbooked days keep their real number.
pub fn capacity_percent(scheduled_minutes: u32, available_minutes: u32) -> u32 {
    if available_minutes == 0 {
        0
    } else {
        (scheduled_minutes as f64 / available_minutes as f64 * 100.0).round() as u32
    }
}

fn last_day_of_month(first: NaiveDate) -> NaiveDate {
    let (year, month) = if first.month() == 12 {
        (first.year() + 1, 1)
    } else {
        (first.year(), first.month() + 1)
    };
    NaiveDate::from_ymd_opt(year, month, 1)
        .map(|next| next - Duration::days(1))
        .unwrap_or(first)
}
