//! Stored document shapes and the normalized domain entities built from
//! them.
//!
//! Documents keep their date fields as [`RawDate`] so files written by older
//! builds (or imported from other tools) stay readable; every raw date is
//! resolved exactly once, here, when a document becomes a domain entity.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::schedule::{is_weekend, normalize_opt, weekday_index, Instant, Priority, RawDate};

// ---------------------------------------------------------------------------
// Documents (persisted form)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskDoc {
    pub id: Uuid,
    pub title: String,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub project_id: Option<Uuid>,
    #[serde(default)]
    pub milestone_id: Option<Uuid>,
    #[serde(default)]
    pub due: Option<RawDate>,
    #[serde(default)]
    pub scheduled_start: Option<RawDate>,
    #[serde(default)]
    pub duration_minutes: Option<u32>,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub priority: Priority,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HabitDoc {
    pub id: Uuid,
    pub name: String,
    pub recurrence: Recurrence,
    #[serde(default)]
    pub preferred_minute: Option<u32>,
    #[serde(default)]
    pub duration_minutes: Option<u32>,
    #[serde(default)]
    pub done_on: Vec<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectDoc {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub start: Option<RawDate>,
    #[serde(default)]
    pub deadline: Option<RawDate>,
    #[serde(default)]
    pub color_index: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MilestoneDoc {
    pub id: Uuid,
    pub project_id: Uuid,
    pub name: String,
    #[serde(default)]
    pub order: u32,
    #[serde(default)]
    pub due: Option<RawDate>,
    #[serde(default)]
    pub completed: bool,
}

/// When a habit recurs. Weekday indices are Sunday-based (0..6), matching
/// the calendar grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "kind")]
pub enum Recurrence {
    Daily,
    Weekdays,
    Weekly { weekday: u32 },
}

impl Recurrence {
    pub fn occurs_on(&self, date: NaiveDate) -> bool {
        match self {
            Recurrence::Daily => true,
            Recurrence::Weekdays => !is_weekend(date),
            Recurrence::Weekly { weekday } => weekday_index(date) == *weekday,
        }
    }
}

// ---------------------------------------------------------------------------
// Domain entities (normalized form)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct Task {
    pub id: Uuid,
    pub title: String,
    pub notes: String,
    pub project_id: Option<Uuid>,
    pub milestone_id: Option<Uuid>,
    pub due: Option<Instant>,
    pub scheduled_start: Option<Instant>,
    pub duration_minutes: Option<u32>,
    pub completed: bool,
    pub priority: Priority,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Habit {
    pub id: Uuid,
    pub name: String,
    pub recurrence: Recurrence,
    pub preferred_minute: Option<u32>,
    pub duration_minutes: Option<u32>,
    pub done_on: Vec<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Project {
    pub id: Uuid,
    pub name: String,
    pub start: Option<Instant>,
    pub deadline: Option<Instant>,
    pub color_index: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Milestone {
    pub id: Uuid,
    pub project_id: Uuid,
    pub name: String,
    pub order: u32,
    pub due: Option<Instant>,
    pub completed: bool,
}

/// The read-only input of every engine pass: all four entity lists as of
/// one store load.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub tasks: Vec<Task>,
    pub habits: Vec<Habit>,
    pub projects: Vec<Project>,
    pub milestones: Vec<Milestone>,
}

impl From<TaskDoc> for Task {
    fn from(doc: TaskDoc) -> Self {
        Self {
            id: doc.id,
            title: doc.title,
            notes: doc.notes,
            project_id: doc.project_id,
            milestone_id: doc.milestone_id,
            due: normalize_opt(doc.due.as_ref()),
            scheduled_start: normalize_opt(doc.scheduled_start.as_ref()),
            duration_minutes: doc.duration_minutes,
            completed: doc.completed,
            priority: doc.priority,
        }
    }
}

impl From<HabitDoc> for Habit {
    fn from(doc: HabitDoc) -> Self {
        Self {
            id: doc.id,
            name: doc.name,
            recurrence: doc.recurrence,
            preferred_minute: doc.preferred_minute,
            duration_minutes: doc.duration_minutes,
            done_on: doc.done_on,
        }
    }
}

impl From<ProjectDoc> for Project {
    fn from(doc: ProjectDoc) -> Self {
        Self {
            id: doc.id,
            name: doc.name,
            start: normalize_opt(doc.start.as_ref()),
            deadline: normalize_opt(doc.deadline.as_ref()),
            color_index: doc.color_index,
        }
    }
}

impl From<MilestoneDoc> for Milestone {
    fn from(doc: MilestoneDoc) -> Self {
        Self {
            id: doc.id,
            project_id: doc.project_id,
            name: doc.name,
            order: doc.order,
            due: normalize_opt(doc.due.as_ref()),
            completed: doc.completed,
        }
    }
}

/// Fields for a task created from the UI.
#[derive(Debug, Clone)]
pub struct NewTask {
    pub title: String,
    pub project_id: Option<Uuid>,
    pub milestone_id: Option<Uuid>,
    pub due: Option<Instant>,
    pub scheduled_start: Option<Instant>,
    pub duration_minutes: Option<u32>,
    pub priority: Priority,
}

impl NewTask {
    pub fn into_doc(self) -> TaskDoc {
        TaskDoc {
            id: Uuid::new_v4(),
            title: self.title,
            notes: String::new(),
            project_id: self.project_id,
            milestone_id: self.milestone_id,
            due: self.due.map(RawDate::from),
            scheduled_start: self.scheduled_start.map(RawDate::from),
            duration_minutes: self.duration_minutes,
            completed: false,
            priority: self.priority,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn recurrence_matching() {
        // 2025-03-09 is a Sunday, 2025-03-12 a Wednesday.
        assert!(Recurrence::Daily.occurs_on(date(2025, 3, 9)));
        assert!(!Recurrence::Weekdays.occurs_on(date(2025, 3, 9)));
        assert!(Recurrence::Weekdays.occurs_on(date(2025, 3, 12)));
        assert!(Recurrence::Weekly { weekday: 3 }.occurs_on(date(2025, 3, 12)));
        assert!(!Recurrence::Weekly { weekday: 3 }.occurs_on(date(2025, 3, 13)));
    }

    #[test]
    fn malformed_document_dates_become_absent() {
        let doc = TaskDoc {
            id: Uuid::new_v4(),
            title: "Legacy import".to_string(),
            notes: String::new(),
            project_id: None,
            milestone_id: None,
            due: Some(RawDate::Iso("definitely not a date".to_string())),
            scheduled_start: Some(RawDate::Iso("2025-03-12T09:00:00Z".to_string())),
            duration_minutes: None,
            completed: false,
            priority: Priority::Medium,
        };
        let task = Task::from(doc);
        assert!(task.due.is_none());
        assert_eq!(task.scheduled_start.unwrap().date(), date(2025, 3, 12));
    }

    #[test]
    fn task_doc_round_trips_through_json() {
        let doc = NewTask {
            title: "Write launch notes".to_string(),
            project_id: None,
            milestone_id: None,
            due: Some(Instant::from_date(date(2025, 3, 20))),
            scheduled_start: None,
            duration_minutes: Some(45),
            priority: Priority::High,
        }
        .into_doc();

        let json = serde_json::to_string(&doc).unwrap();
        let back: TaskDoc = serde_json::from_str(&json).unwrap();
        assert_eq!(back.title, "Write launch notes");
        assert_eq!(back.duration_minutes, Some(45));
        assert_eq!(Task::from(back).due, Some(Instant::from_date(date(2025, 3, 20))));
    }
}
