//! Project statistics and task filtering.

use chrono::Days;
use serde::{Deserialize, Serialize};

use crate::interval::days_between;
use crate::timeline::is_off_plan;
use crate::{Priority, Project, Task, TaskStatus};

/// Headline numbers for a project
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectSummary {
    pub total_tasks: usize,
    pub completed_tasks: usize,
    pub pending_tasks: usize,
    /// Plain mean of task progress, rounded
    pub average_progress: u8,
    /// Completed tasks as a rounded percentage of all tasks
    pub completion_percent: u8,
    /// Sum of planned durations
    pub planned_days: u64,
    /// Days from the earliest planned start to the latest planned end
    pub duration_days: i64,
    pub off_plan_tasks: usize,
}

impl ProjectSummary {
    pub fn compute(project: &Project) -> Self {
        let tasks = &project.tasks;
        let total_tasks = tasks.len();
        let completed_tasks = tasks
            .iter()
            .filter(|t| t.status == TaskStatus::Completed)
            .count();

        let progress_sum: u64 = tasks.iter().map(|t| u64::from(t.effective_progress())).sum();

        Self {
            total_tasks,
            completed_tasks,
            pending_tasks: total_tasks - completed_tasks,
            average_progress: rounded_ratio(progress_sum, total_tasks as u64),
            completion_percent: rounded_ratio(completed_tasks as u64 * 100, total_tasks as u64),
            planned_days: tasks.iter().map(|t| u64::from(t.duration_planned)).sum(),
            duration_days: planned_span_days(tasks),
            off_plan_tasks: tasks.iter().filter(|t| is_off_plan(t)).count(),
        }
    }
}

/// `round(num / den)` half up, 0 when `den` is zero
fn rounded_ratio(num: u64, den: u64) -> u8 {
    if den == 0 {
        return 0;
    }
    u8::try_from((num * 2 + den) / (den * 2)).unwrap_or(u8::MAX)
}

/// Exclusive-end span of all planned intervals
fn planned_span_days(tasks: &[Task]) -> i64 {
    let starts = tasks.iter().filter_map(|t| t.start_planned);
    let ends = tasks.iter().filter_map(|t| {
        t.start_planned?
            .checked_add_days(Days::new(u64::from(t.duration_planned)))
    });
    match (starts.min(), ends.max()) {
        (Some(first), Some(last)) => days_between(first, last).max(0),
        _ => 0,
    }
}

/// Search, status and priority filter for task lists.
///
/// Unset criteria match everything.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaskFilter {
    /// Case-insensitive substring of name or description
    pub search: Option<String>,
    pub status: Option<TaskStatus>,
    pub priority: Option<Priority>,
}

impl TaskFilter {
    pub fn search(mut self, term: impl Into<String>) -> Self {
        self.search = Some(term.into());
        self
    }

    pub fn status(mut self, status: TaskStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.search.as_deref().map_or(true, |s| s.trim().is_empty())
            && self.status.is_none()
            && self.priority.is_none()
    }

    pub fn matches(&self, task: &Task) -> bool {
        if let Some(term) = self.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            let term = term.to_lowercase();
            let hit = task.name.to_lowercase().contains(&term)
                || task.description.to_lowercase().contains(&term);
            if !hit {
                return false;
            }
        }
        self.status.map_or(true, |s| s == task.status)
            && self.priority.map_or(true, |p| p == task.priority)
    }

    /// Matching tasks, in task order
    pub fn apply<'a>(&self, tasks: &'a [Task]) -> Vec<&'a Task> {
        tasks.iter().filter(|t| self.matches(t)).collect()
    }
}
