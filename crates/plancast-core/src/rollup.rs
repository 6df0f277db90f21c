//! Parent progress rollup.
//!
//! Every root task with at least one child gets its progress, durations and
//! start dates derived from its direct children:
//!
//! - progress: `Σ(child.progress × child.duration_planned) / Σ child.duration_planned`,
//!   rounded half up; 0 when the children's durations sum to zero
//! - planned / actual duration: sums (absent actual durations count as 0)
//! - planned / actual start: earliest child date, skipping absent ones
//!
//! Computation and mutation are split: [`compute`] is pure and returns one
//! [`ParentRollup`] per parent, [`apply`] merges them into the records.
//! [`refresh`] does both and must run after every task mutation.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::hierarchy::TaskHierarchy;
use crate::{Project, Task, TaskId};

/// Derived fields for one parent task
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParentRollup {
    pub task_id: TaskId,
    pub progress: u8,
    pub inherited_duration_planned: u32,
    pub inherited_duration_actual: u32,
    pub inherited_start_planned: Option<NaiveDate>,
    pub inherited_start_actual: Option<NaiveDate>,
}

/// Duration-weighted progress of a set of children.
///
/// Returns `None` for an empty set (the task is not a parent).
pub fn weighted_progress(children: &[&Task]) -> Option<u8> {
    if children.is_empty() {
        return None;
    }

    let (weighted, total) = children.iter().fold((0u64, 0u64), |(w, t), child| {
        let days = u64::from(child.duration_planned);
        (w + u64::from(child.effective_progress()) * days, t + days)
    });

    if total == 0 {
        return Some(0);
    }

    // floor(w / t + 0.5)
    Some(((weighted * 2 + total) / (total * 2)) as u8)
}

/// Roll up a parent's children. `None` when `children` is empty.
pub fn rollup_children(task_id: &str, children: &[&Task]) -> Option<ParentRollup> {
    let progress = weighted_progress(children)?;

    let inherited_duration_planned = total_days(children.iter().map(|c| c.duration_planned));
    let inherited_duration_actual =
        total_days(children.iter().map(|c| c.duration_actual.unwrap_or(0)));
    let inherited_start_planned = children.iter().filter_map(|c| c.start_planned).min();
    let inherited_start_actual = children.iter().filter_map(|c| c.start_actual).min();

    Some(ParentRollup {
        task_id: task_id.to_string(),
        progress,
        inherited_duration_planned,
        inherited_duration_actual,
        inherited_start_planned,
        inherited_start_actual,
    })
}

/// Sum of day counts, saturating at `u32::MAX`
fn total_days(days: impl Iterator<Item = u32>) -> u32 {
    let total: u64 = days.map(u64::from).sum();
    u32::try_from(total).unwrap_or(u32::MAX)
}

/// Rollup for a single task, or `None` if it is not a parent
pub fn rollup_for(project: &Project, task_id: &str) -> Option<ParentRollup> {
    let index = TaskHierarchy::build(&project.tasks);
    let task = project.get_task(task_id)?;
    if !crate::hierarchy::is_root(task) {
        return None;
    }
    rollup_children(task_id, index.children(task_id))
}

/// Compute rollups for every root task that has children
pub fn compute(project: &Project) -> Vec<ParentRollup> {
    let index = TaskHierarchy::build(&project.tasks);
    index
        .parents()
        .filter_map(|parent| rollup_children(&parent.id, index.children(&parent.id)))
        .collect()
}

/// Merge rollups into the project's tasks.
///
/// Tasks without a rollup lose any derived fields left over from a time
/// they were parents. Returns how many tasks changed.
pub fn apply(project: &mut Project, rollups: &[ParentRollup]) -> usize {
    let mut changed = 0;
    for task in &mut project.tasks {
        let before = DerivedFields::of(task);
        match rollups.iter().find(|r| r.task_id == task.id) {
            Some(rollup) => {
                task.progress = rollup.progress;
                task.is_dynamic_progress = true;
                task.inherited_duration_planned = Some(rollup.inherited_duration_planned);
                task.inherited_duration_actual = Some(rollup.inherited_duration_actual);
                task.inherited_start_planned = rollup.inherited_start_planned;
                task.inherited_start_actual = rollup.inherited_start_actual;
            }
            None => {
                task.is_dynamic_progress = false;
                task.inherited_duration_planned = None;
                task.inherited_duration_actual = None;
                task.inherited_start_planned = None;
                task.inherited_start_actual = None;
            }
        }
        if DerivedFields::of(task) != before {
            changed += 1;
        }
    }
    changed
}

/// Recompute and apply all parent rollups
pub fn refresh(project: &mut Project) -> Vec<ParentRollup> {
    let rollups = compute(project);
    let changed = apply(project, &rollups);
    debug!(
        project = %project.id,
        parents = rollups.len(),
        changed,
        "refreshed parent rollups"
    );
    rollups
}

#[derive(PartialEq)]
struct DerivedFields {
    progress: u8,
    dynamic: bool,
    planned: Option<u32>,
    actual: Option<u32>,
    start_planned: Option<NaiveDate>,
    start_actual: Option<NaiveDate>,
}

impl DerivedFields {
    fn of(task: &Task) -> Self {
        Self {
            progress: task.progress,
            dynamic: task.is_dynamic_progress,
            planned: task.inherited_duration_planned,
            actual: task.inherited_duration_actual,
            start_planned: task.inherited_start_planned,
            start_actual: task.inherited_start_actual,
        }
    }
}
