//! Project → milestone → task grouping and expand/collapse state for the
//! timeline view.

use std::collections::HashSet;

use uuid::Uuid;

use super::timeline::{milestone_bar, project_bar, task_bar, TimelineBar, TimelineWindow};
use crate::store::{Milestone, Project, Snapshot, Task};

/// One task row under a project or milestone. The bar is absent when the
/// task has no dates or lies outside the window.
#[derive(Debug, Clone)]
pub struct TaskRow {
    pub task: Task,
    pub bar: Option<TimelineBar>,
}

#[derive(Debug, Clone)]
pub struct MilestoneGroup {
    pub milestone: Milestone,
    pub bar: Option<TimelineBar>,
    pub tasks: Vec<TaskRow>,
}

#[derive(Debug, Clone)]
pub struct ProjectGroup {
    pub project: Project,
    pub bar: Option<TimelineBar>,
    pub milestones: Vec<MilestoneGroup>,
    /// Tasks belonging to the project but not linked to any of its
    /// milestones (including tasks pointing at a milestone that no longer
    /// exists).
    pub unassigned: Vec<TaskRow>,
}

/// Group the snapshot's projects, milestones and tasks for the timeline.
/// Milestones are ordered by their explicit `order` field; every task lands
/// in exactly one bucket.
pub fn build_project_groups(snapshot: &Snapshot, window: &TimelineWindow) -> Vec<ProjectGroup> {
    snapshot
        .projects
        .iter()
        .map(|project| {
            let mut milestones: Vec<&Milestone> = snapshot
                .milestones
                .iter()
                .filter(|m| m.project_id == project.id)
                .collect();
            milestones.sort_by_key(|m| m.order);
            let known: HashSet<Uuid> = milestones.iter().map(|m| m.id).collect();

            let task_row = |task: &Task| TaskRow {
                task: task.clone(),
                bar: task_bar(task, project.color_index, window),
            };

            let milestone_groups: Vec<MilestoneGroup> = milestones
                .into_iter()
                .map(|milestone| MilestoneGroup {
                    milestone: milestone.clone(),
                    bar: milestone_bar(milestone, project.color_index, window),
                    tasks: snapshot
                        .tasks
                        .iter()
                        .filter(|t| {
                            t.project_id == Some(project.id)
                                && t.milestone_id == Some(milestone.id)
                        })
                        .map(task_row)
                        .collect(),
                })
                .collect();

            let unassigned: Vec<TaskRow> = snapshot
                .tasks
                .iter()
                .filter(|t| {
                    t.project_id == Some(project.id)
                        && !t.milestone_id.map(|m| known.contains(&m)).unwrap_or(false)
                })
                .map(task_row)
                .collect();

            ProjectGroup {
                bar: project_bar(project, window),
                project: project.clone(),
                milestones: milestone_groups,
                unassigned,
            }
        })
        .collect()
}

/// Which projects and milestones are expanded. The two sets are independent:
/// collapsing a project hides its milestones but does not touch their own
/// expanded flags.
#[derive(Debug, Default)]
pub struct ExpandState {
    expanded_projects: HashSet<Uuid>,
    expanded_milestones: HashSet<Uuid>,
    did_auto_expand: bool,
}

impl ExpandState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn project_expanded(&self, id: Uuid) -> bool {
        self.expanded_projects.contains(&id)
    }

    pub fn milestone_expanded(&self, id: Uuid) -> bool {
        self.expanded_milestones.contains(&id)
    }

    pub fn toggle_project(&mut self, id: Uuid) {
        if !self.expanded_projects.remove(&id) {
            self.expanded_projects.insert(id);
        }
    }

    pub fn toggle_milestone(&mut self, id: Uuid) {
        if !self.expanded_milestones.remove(&id) {
            self.expanded_milestones.insert(id);
        }
    }

    /// Expand the first incomplete milestone across all projects, together
    /// with its owning project so it is actually visible. Runs once per
    /// launch; later calls (and all user toggles) are left alone. Waits for
    /// a non-empty snapshot so the one shot is not spent before data loads.
    pub fn auto_expand_first_incomplete(&mut self, groups: &[ProjectGroup]) {
        if self.did_auto_expand || groups.is_empty() {
            return;
        }
        self.did_auto_expand = true;
        for group in groups {
            if let Some(milestone_group) =
                group.milestones.iter().find(|m| !m.milestone.completed)
            {
                self.expanded_projects.insert(group.project.id);
                self.expanded_milestones.insert(milestone_group.milestone.id);
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::Priority;
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn window() -> TimelineWindow {
        TimelineWindow::new(date(2025, 4, 1), 30)
    }

    fn project(name: &str) -> Project {
        Project {
            id: Uuid::new_v4(),
            name: name.to_string(),
            start: None,
            deadline: None,
            color_index: 0,
        }
    }

    fn milestone(project_id: Uuid, name: &str, order: u32) -> Milestone {
        Milestone {
            id: Uuid::new_v4(),
            project_id,
            name: name.to_string(),
            order,
            due: None,
            completed: false,
        }
    }

    fn task(project_id: Option<Uuid>, milestone_id: Option<Uuid>, title: &str) -> Task {
        Task {
            id: Uuid::new_v4(),
            title: title.to_string(),
            notes: String::new(),
            project_id,
            milestone_id,
            due: None,
            scheduled_start: None,
            duration_minutes: None,
            completed: false,
            priority: Priority::Medium,
        }
    }

    fn snapshot(projects: Vec<Project>, milestones: Vec<Milestone>, tasks: Vec<Task>) -> Snapshot {
        Snapshot {
            tasks,
            habits: Vec::new(),
            projects,
            milestones,
        }
    }

    #[test]
    fn unassigned_task_appears_exactly_once() {
        let p = project("Website");
        let m1 = milestone(p.id, "Design", 1);
        let m2 = milestone(p.id, "Build", 2);
        let loose = task(Some(p.id), None, "Pick hosting");

        let snap = snapshot(vec![p], vec![m1, m2], vec![loose]);
        let groups = build_project_groups(&snap, &window());

        assert_eq!(groups[0].unassigned.len(), 1);
        assert!(groups[0].milestones.iter().all(|m| m.tasks.is_empty()));
    }

    #[test]
    fn task_with_unknown_milestone_falls_back_to_unassigned() {
        let p = project("Website");
        let m = milestone(p.id, "Design", 1);
        let orphan = task(Some(p.id), Some(Uuid::new_v4()), "Stale link");

        let snap = snapshot(vec![p], vec![m], vec![orphan]);
        let groups = build_project_groups(&snap, &window());
        assert_eq!(groups[0].unassigned.len(), 1);
        assert!(groups[0].milestones[0].tasks.is_empty());
    }

    #[test]
    fn milestones_sorted_by_order_field() {
        let p = project("Website");
        let late = milestone(p.id, "Launch", 3);
        let early = milestone(p.id, "Design", 1);
        let mid = milestone(p.id, "Build", 2);

        let snap = snapshot(vec![p], vec![late, early, mid], Vec::new());
        let groups = build_project_groups(&snap, &window());
        let names: Vec<&str> = groups[0]
            .milestones
            .iter()
            .map(|m| m.milestone.name.as_str())
            .collect();
        assert_eq!(names, vec!["Design", "Build", "Launch"]);
    }

    #[test]
    fn auto_expand_runs_once_and_opens_owning_project() {
        let p1 = project("Archive");
        let p2 = project("Website");
        let mut done = milestone(p1.id, "Wrapped", 1);
        done.completed = true;
        let open = milestone(p2.id, "Design", 1);
        let open_id = open.id;
        let p2_id = p2.id;

        let snap = snapshot(vec![p1, p2], vec![done, open], Vec::new());
        let groups = build_project_groups(&snap, &window());

        let mut expand = ExpandState::new();
        expand.auto_expand_first_incomplete(&groups);
        assert!(expand.milestone_expanded(open_id));
        assert!(expand.project_expanded(p2_id));

        // User collapses; a second pass must not reopen.
        expand.toggle_milestone(open_id);
        expand.auto_expand_first_incomplete(&groups);
        assert!(!expand.milestone_expanded(open_id));
    }

    #[test]
    fn auto_expand_waits_for_data() {
        let mut expand = ExpandState::new();
        expand.auto_expand_first_incomplete(&[]);

        let p = project("Website");
        let m = milestone(p.id, "Design", 1);
        let m_id = m.id;
        let snap = snapshot(vec![p], vec![m], Vec::new());
        expand.auto_expand_first_incomplete(&build_project_groups(&snap, &window()));
        assert!(expand.milestone_expanded(m_id));
    }

    #[test]
    fn collapsing_parent_keeps_child_membership() {
        let project_id = Uuid::new_v4();
        let milestone_id = Uuid::new_v4();
        let mut expand = ExpandState::new();
        expand.toggle_project(project_id);
        expand.toggle_milestone(milestone_id);

        expand.toggle_project(project_id);
        assert!(!expand.project_expanded(project_id));
        assert!(expand.milestone_expanded(milestone_id));
    }
}
