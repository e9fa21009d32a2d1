//! Local JSON document store.
//!
//! Each entity kind lives in one JSON array file under the platform data
//! dir. Mutations rewrite the owning file; the app follows every successful
//! mutation with a fresh [`Store::load_snapshot`], so derived view state is
//! always rebuilt from what is actually on disk.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{Duration, Local, NaiveDate};
use directories::ProjectDirs;
use thiserror::Error;
use uuid::Uuid;

use super::types::{
    HabitDoc, MilestoneDoc, NewTask, ProjectDoc, Recurrence, Snapshot, Task, TaskDoc,
};
use crate::schedule::{Instant, Priority, RawDate};

const TASKS_FILE: &str = "tasks.json";
const HABITS_FILE: &str = "habits.json";
const PROJECTS_FILE: &str = "projects.json";
const MILESTONES_FILE: &str = "milestones.json";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("could not determine a data directory for this platform")]
    NoDataDir,
    #[error("failed to access {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {path}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("no task with id {0}")]
    UnknownTask(Uuid),
    #[error("no habit with id {0}")]
    UnknownHabit(Uuid),
}

#[derive(Debug, Clone)]
pub struct Store {
    data_dir: PathBuf,
}

impl Store {
    /// Open the store in the platform data directory.
    pub fn open() -> Result<Self, StoreError> {
        let dirs = ProjectDirs::from("com", "tempo", "tempo").ok_or(StoreError::NoDataDir)?;
        Ok(Self::at(dirs.data_dir().join("documents")))
    }

    /// Open the store rooted at an explicit directory.
    pub fn at(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Read all four document files into one normalized snapshot. Seeds
    /// sample data on first run so the app never opens onto an empty grid.
    pub fn load_snapshot(&self) -> Result<Snapshot, StoreError> {
        self.seed_if_empty()?;
        Ok(Snapshot {
            tasks: self
                .read_docs::<TaskDoc>(TASKS_FILE)?
                .into_iter()
                .map(Into::into)
                .collect(),
            habits: self
                .read_docs::<HabitDoc>(HABITS_FILE)?
                .into_iter()
                .map(Into::into)
                .collect(),
            projects: self
                .read_docs::<ProjectDoc>(PROJECTS_FILE)?
                .into_iter()
                .map(Into::into)
                .collect(),
            milestones: self
                .read_docs::<MilestoneDoc>(MILESTONES_FILE)?
                .into_iter()
                .map(Into::into)
                .collect(),
        })
    }

    pub fn create_task(&self, new: NewTask) -> Result<Task, StoreError> {
        let mut docs = self.read_docs::<TaskDoc>(TASKS_FILE)?;
        let doc = new.into_doc();
        let task = Task::from(doc.clone());
        docs.push(doc);
        self.write_docs(TASKS_FILE, &docs)?;
        Ok(task)
    }

    /// Rewrite one task's scheduled start.
    pub fn reschedule_task(&self, id: Uuid, new_start: RawDate) -> Result<(), StoreError> {
        let mut docs = self.read_docs::<TaskDoc>(TASKS_FILE)?;
        let doc = docs
            .iter_mut()
            .find(|d| d.id == id)
            .ok_or(StoreError::UnknownTask(id))?;
        doc.scheduled_start = Some(new_start);
        self.write_docs(TASKS_FILE, &docs)
    }

    pub fn set_task_completed(&self, id: Uuid, completed: bool) -> Result<(), StoreError> {
        let mut docs = self.read_docs::<TaskDoc>(TASKS_FILE)?;
        let doc = docs
            .iter_mut()
            .find(|d| d.id == id)
            .ok_or(StoreError::UnknownTask(id))?;
        doc.completed = completed;
        self.write_docs(TASKS_FILE, &docs)
    }

    /// Record or clear a habit's completion for one date.
    pub fn mark_habit_done(&self, id: Uuid, date: NaiveDate, done: bool) -> Result<(), StoreError> {
        let mut docs = self.read_docs::<HabitDoc>(HABITS_FILE)?;
        let doc = docs
            .iter_mut()
            .find(|d| d.id == id)
            .ok_or(StoreError::UnknownHabit(id))?;
        if done {
            if !doc.done_on.contains(&date) {
                doc.done_on.push(date);
            }
        } else {
            doc.done_on.retain(|d| *d != date);
        }
        self.write_docs(HABITS_FILE, &docs)
    }

    fn read_docs<T: serde::de::DeserializeOwned>(&self, file: &str) -> Result<Vec<T>, StoreError> {
        let path = self.data_dir.join(file);
        if !path.exists() {
            return Ok(Vec::new());
        }
        let contents = fs::read_to_string(&path).map_err(|source| StoreError::Io {
            path: path.clone(),
            source,
        })?;
        serde_json::from_str(&contents).map_err(|source| StoreError::Parse { path, source })
    }

    fn write_docs<T: serde::Serialize>(&self, file: &str, docs: &[T]) -> Result<(), StoreError> {
        fs::create_dir_all(&self.data_dir).map_err(|source| StoreError::Io {
            path: self.data_dir.clone(),
            source,
        })?;
        let path = self.data_dir.join(file);
        let json = serde_json::to_string_pretty(docs).map_err(|source| StoreError::Parse {
            path: path.clone(),
            source,
        })?;
        fs::write(&path, json).map_err(|source| StoreError::Io { path, source })
    }

    fn seed_if_empty(&self) -> Result<(), StoreError> {
        if self.data_dir.join(TASKS_FILE).exists() {
            return Ok(());
        }
        log::info!("seeding sample documents in {}", self.data_dir.display());
        let today = Local::now().date_naive();
        let (tasks, habits, projects, milestones) = sample_documents(today);
        self.write_docs(TASKS_FILE, &tasks)?;
        self.write_docs(HABITS_FILE, &habits)?;
        self.write_docs(PROJECTS_FILE, &projects)?;
        self.write_docs(MILESTONES_FILE, &milestones)
    }
}

/// Sample documents for a first launch, laid out around `today`.
fn sample_documents(
    today: NaiveDate,
) -> (Vec<TaskDoc>, Vec<HabitDoc>, Vec<ProjectDoc>, Vec<MilestoneDoc>) {
    let project = ProjectDoc {
        id: Uuid::new_v4(),
        name: "Website refresh".to_string(),
        start: Some(RawDate::from(Instant::from_date(today - Duration::days(7)))),
        deadline: Some(RawDate::from(Instant::from_date(today + Duration::days(30)))),
        color_index: 0,
    };
    let design = MilestoneDoc {
        id: Uuid::new_v4(),
        project_id: project.id,
        name: "Design".to_string(),
        order: 1,
        due: Some(RawDate::from(Instant::from_date(today + Duration::days(7)))),
        completed: false,
    };
    let build = MilestoneDoc {
        id: Uuid::new_v4(),
        project_id: project.id,
        name: "Build".to_string(),
        order: 2,
        due: Some(RawDate::from(Instant::from_date(today + Duration::days(21)))),
        completed: false,
    };

    let task = |title: &str,
                milestone: Option<Uuid>,
                due: Option<NaiveDate>,
                scheduled: Option<Instant>,
                minutes: u32,
                priority: Priority| TaskDoc {
        id: Uuid::new_v4(),
        title: title.to_string(),
        notes: String::new(),
        project_id: Some(project.id),
        milestone_id: milestone,
        due: due.map(|d| RawDate::from(Instant::from_date(d))),
        scheduled_start: scheduled.map(RawDate::from),
        duration_minutes: Some(minutes),
        completed: false,
        priority,
    };

    let tasks = vec![
        task(
            "Sketch landing page",
            Some(design.id),
            Some(today + Duration::days(2)),
            Some(Instant::at(today, 9, 0)),
            90,
            Priority::High,
        ),
        task(
            "Collect brand assets",
            Some(design.id),
            Some(today + Duration::days(4)),
            None,
            60,
            Priority::Medium,
        ),
        task(
            "Set up staging server",
            Some(build.id),
            Some(today + Duration::days(10)),
            Some(Instant::at(today + Duration::days(1), 13, 30)),
            120,
            Priority::Medium,
        ),
        task(
            "Renew domain",
            None,
            Some(today + Duration::days(14)),
            None,
            30,
            Priority::Urgent,
        ),
    ];

    let habits = vec![
        HabitDoc {
            id: Uuid::new_v4(),
            name: "Morning stretch".to_string(),
            recurrence: Recurrence::Daily,
            preferred_minute: Some(7 * 60),
            duration_minutes: Some(15),
            done_on: Vec::new(),
        },
        HabitDoc {
            id: Uuid::new_v4(),
            name: "Weekly review".to_string(),
            // Friday, Sunday-based index.
            recurrence: Recurrence::Weekly { weekday: 5 },
            preferred_minute: Some(16 * 60),
            duration_minutes: Some(45),
            done_on: Vec::new(),
        },
    ];

    (tasks, habits, vec![project], vec![design, build])
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn temp_store() -> (TempDir, Store) {
        let dir = TempDir::new().expect("temp dir");
        let store = Store::at(dir.path());
        (dir, store)
    }

    #[test]
    fn first_load_seeds_sample_documents() {
        let (_dir, store) = temp_store();
        let snapshot = store.load_snapshot().unwrap();
        assert!(!snapshot.tasks.is_empty());
        assert!(!snapshot.habits.is_empty());
        assert_eq!(snapshot.projects.len(), 1);
        assert_eq!(snapshot.milestones.len(), 2);
        assert!(store.data_dir().join(TASKS_FILE).exists());

        // A second load must read what was written, not re-seed.
        let again = store.load_snapshot().unwrap();
        assert_eq!(again.tasks.len(), snapshot.tasks.len());
        assert_eq!(again.tasks[0].id, snapshot.tasks[0].id);
    }

    #[test]
    fn created_task_survives_reload() {
        let (_dir, store) = temp_store();
        let before = store.load_snapshot().unwrap().tasks.len();

        let created = store
            .create_task(NewTask {
                title: "Write launch notes".to_string(),
                project_id: None,
                milestone_id: None,
                due: Some(Instant::from_date(date(2025, 3, 20))),
                scheduled_start: None,
                duration_minutes: Some(45),
                priority: Priority::High,
            })
            .unwrap();

        let snapshot = store.load_snapshot().unwrap();
        assert_eq!(snapshot.tasks.len(), before + 1);
        let task = snapshot.tasks.iter().find(|t| t.id == created.id).unwrap();
        assert_eq!(task.title, "Write launch notes");
        assert_eq!(task.due, Some(Instant::from_date(date(2025, 3, 20))));
    }

    #[test]
    fn reschedule_rewrites_only_the_target_task() {
        let (_dir, store) = temp_store();
        let snapshot = store.load_snapshot().unwrap();
        let target = snapshot.tasks[0].id;
        let untouched: Vec<_> = snapshot.tasks[1..].to_vec();

        let new_start = Instant::at(date(2025, 3, 12), 14, 0);
        store.reschedule_task(target, RawDate::from(new_start)).unwrap();

        let after = store.load_snapshot().unwrap();
        let moved = after.tasks.iter().find(|t| t.id == target).unwrap();
        assert_eq!(moved.scheduled_start, Some(new_start));
        for task in untouched {
            let same = after.tasks.iter().find(|t| t.id == task.id).unwrap();
            assert_eq!(same.scheduled_start, task.scheduled_start);
        }
    }

    #[test]
    fn rescheduling_unknown_task_is_an_error() {
        let (_dir, store) = temp_store();
        store.load_snapshot().unwrap();
        let missing = Uuid::new_v4();
        let result = store.reschedule_task(
            missing,
            RawDate::from(Instant::at(date(2025, 3, 12), 9, 0)),
        );
        assert!(matches!(result, Err(StoreError::UnknownTask(id)) if id == missing));
    }

    #[test]
    fn habit_completion_toggles_per_date() {
        let (_dir, store) = temp_store();
        let snapshot = store.load_snapshot().unwrap();
        let habit = snapshot.habits[0].id;
        let day = date(2025, 3, 12);

        store.mark_habit_done(habit, day, true).unwrap();
        // Marking twice must not duplicate the entry.
        store.mark_habit_done(habit, day, true).unwrap();
        let done = store.load_snapshot().unwrap();
        let done_on = &done.habits.iter().find(|h| h.id == habit).unwrap().done_on;
        assert_eq!(done_on.iter().filter(|d| **d == day).count(), 1);

        store.mark_habit_done(habit, day, false).unwrap();
        let cleared = store.load_snapshot().unwrap();
        assert!(!cleared.habits[0].done_on.contains(&day));
    }

    #[test]
    fn stored_raw_date_forms_all_normalize() {
        let (dir, store) = temp_store();
        let id_epoch = Uuid::new_v4();
        let id_iso = Uuid::new_v4();
        let id_wrapped = Uuid::new_v4();
        let id_broken = Uuid::new_v4();
        std::fs::create_dir_all(dir.path()).unwrap();
        std::fs::write(
            dir.path().join(TASKS_FILE),
            format!(
                r#"[
                    {{"id": "{id_epoch}", "title": "Epoch millis", "scheduled_start": 1741597200000}},
                    {{"id": "{id_iso}", "title": "ISO string", "scheduled_start": "2025-03-10T09:00:00Z"}},
                    {{"id": "{id_wrapped}", "title": "Wrapped pair", "scheduled_start": {{"seconds": 1741597200, "nanos": 0}}}},
                    {{"id": "{id_broken}", "title": "Broken date", "scheduled_start": "not a date"}}
                ]"#
            ),
        )
        .unwrap();

        let snapshot = store.load_snapshot().unwrap();
        assert_eq!(snapshot.tasks.len(), 4);
        let start_of = |id| {
            snapshot
                .tasks
                .iter()
                .find(|t| t.id == id)
                .and_then(|t| t.scheduled_start)
        };
        let expected = Instant::from_millis(1_741_597_200_000).unwrap();
        assert_eq!(start_of(id_epoch), Some(expected));
        assert_eq!(start_of(id_iso), Some(expected));
        assert_eq!(start_of(id_wrapped), Some(expected));
        // The malformed date degrades to absent, never an error.
        assert_eq!(start_of(id_broken), None);
    }
}
