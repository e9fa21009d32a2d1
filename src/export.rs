use chrono::{Datelike, Duration, Local, NaiveDate};
use serde::Serialize;
use std::fs;
use std::path::PathBuf;

use crate::schedule::{items_for_date, ItemKind, SchedulableItem};
use crate::store::{Habit, Task};

#[derive(Serialize)]
pub struct WeeklyPlan {
    pub week_start: String,
    pub week_end: String,
    pub exported_at: String,
    pub total_minutes: u32,
    pub blocks: Vec<ExportBlock>,
}

#[derive(Serialize)]
pub struct ExportBlock {
    pub id: String,
    pub title: String,
    pub kind: String,
    pub date: String,
    pub start_time: String,
    pub duration_minutes: u32,
    pub completed: bool,
}

impl ExportBlock {
    fn from_item(item: &SchedulableItem, date: NaiveDate) -> Option<Self> {
        let start = item.scheduled_start?;
        Some(Self {
            id: item.id.to_string(),
            title: item.title.clone(),
            kind: match item.kind {
                ItemKind::Task => "task".to_string(),
                ItemKind::Habit => "habit".to_string(),
            },
            date: date.format("%Y-%m-%d").to_string(),
            start_time: format!("{:02}:{:02}", start.hour(), start.minute()),
            duration_minutes: item.duration_minutes,
            completed: item.completed,
        })
    }
}

/// Export one week of scheduled blocks to a JSON file
/// Returns the path of the created file on success
pub fn export_week(
    week_start: NaiveDate,
    tasks: &[Task],
    habits: &[Habit],
) -> Result<PathBuf, String> {
    // Get exe directory
    let exe_path = std::env::current_exe()
        .map_err(|e| format!("Failed to get exe path: {}", e))?;
    let exe_dir = exe_path.parent()
        .ok_or("Failed to get exe directory")?;

    // Create weekly-plans directory
    let plans_dir = exe_dir.join("weekly-plans");
    fs::create_dir_all(&plans_dir)
        .map_err(|e| format!("Failed to create weekly-plans directory: {}", e))?;

    let week_end = week_start + Duration::days(6);
    let iso_week = week_start.iso_week();
    let filename = format!("{}-W{:02}.json", iso_week.year(), iso_week.week());
    let file_path = plans_dir.join(&filename);

    // Collect every scheduled block across the week, day by day
    let mut blocks = Vec::new();
    for offset in 0..7 {
        let date = week_start + Duration::days(offset);
        for item in items_for_date(tasks, habits, date) {
            if item.scheduled_on(date) {
                blocks.extend(ExportBlock::from_item(&item, date));
            }
        }
    }

    let total_minutes: u32 = blocks.iter().map(|b| b.duration_minutes).sum();
    let plan = WeeklyPlan {
        week_start: week_start.format("%Y-%m-%d").to_string(),
        week_end: week_end.format("%Y-%m-%d").to_string(),
        exported_at: Local::now().format("%Y-%m-%dT%H:%M:%S").to_string(),
        total_minutes,
        blocks,
    };

    // Write JSON file
    let json = serde_json::to_string_pretty(&plan)
        .map_err(|e| format!("Failed to serialize: {}", e))?;
    fs::write(&file_path, json)
        .map_err(|e| format!("Failed to write file: {}", e))?;

    Ok(file_path)
}
