mod client;
mod types;

pub use client::{Store, StoreError};
pub use types::{
    Habit, HabitDoc, Milestone, MilestoneDoc, NewTask, Project, ProjectDoc, Recurrence, Snapshot,
    Task, TaskDoc,
};
