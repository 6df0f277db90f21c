//! One-level task hierarchy.
//!
//! A task is a root when it has no `parent_id`. Only direct children are
//! ever resolved; `children_of` is never applied transitively.

use std::collections::HashMap;

use crate::Task;

/// True when the task has no parent
pub fn is_root(task: &Task) -> bool {
    task.parent_id.is_none()
}

/// Direct children of `parent_id`, in task order
pub fn children_of<'a>(tasks: &'a [Task], parent_id: &str) -> Vec<&'a Task> {
    tasks
        .iter()
        .filter(|t| t.parent_id.as_deref() == Some(parent_id))
        .collect()
}

/// True when at least one task names `task_id` as its parent
pub fn has_children(tasks: &[Task], task_id: &str) -> bool {
    tasks
        .iter()
        .any(|t| t.parent_id.as_deref() == Some(task_id))
}

/// A row in hierarchical display order
#[derive(Clone, Copy, Debug)]
pub struct DisplayRow<'a> {
    pub task: &'a Task,
    /// 0 for roots, 1 for sub-tasks
    pub depth: usize,
    pub has_children: bool,
}

/// Parent → children index built once per pass
#[derive(Debug)]
pub struct TaskHierarchy<'a> {
    roots: Vec<&'a Task>,
    children: HashMap<&'a str, Vec<&'a Task>>,
    orphans: Vec<&'a Task>,
}

impl<'a> TaskHierarchy<'a> {
    pub fn build(tasks: &'a [Task]) -> Self {
        let mut roots = Vec::new();
        let mut children: HashMap<&'a str, Vec<&'a Task>> = HashMap::new();
        for task in tasks {
            match task.parent_id.as_deref() {
                None => roots.push(task),
                Some(parent) => children.entry(parent).or_default().push(task),
            }
        }

        let orphans = tasks
            .iter()
            .filter(|t| {
                t.parent_id
                    .as_deref()
                    .is_some_and(|p| !tasks.iter().any(|candidate| candidate.id == p))
            })
            .collect();

        Self {
            roots,
            children,
            orphans,
        }
    }

    /// Tasks without a parent, in task order
    pub fn roots(&self) -> &[&'a Task] {
        &self.roots
    }

    /// Direct children of a task
    pub fn children(&self, task_id: &str) -> &[&'a Task] {
        self.children.get(task_id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn has_children(&self, task_id: &str) -> bool {
        !self.children(task_id).is_empty()
    }

    /// Root tasks that have at least one child
    pub fn parents(&self) -> impl Iterator<Item = &'a Task> + '_ {
        self.roots
            .iter()
            .copied()
            .filter(|t| self.has_children(&t.id))
    }

    /// Sub-tasks whose parent id does not resolve to a task
    pub fn orphans(&self) -> &[&'a Task] {
        &self.orphans
    }

    /// Roots followed by their children; orphans are listed last as roots.
    ///
    /// Children of a collapsed parent are skipped when `respect_collapsed`
    /// is set.
    pub fn display_order(&self, respect_collapsed: bool) -> Vec<DisplayRow<'a>> {
        let mut rows = Vec::new();
        for &root in &self.roots {
            let kids = self.children(&root.id);
            rows.push(DisplayRow {
                task: root,
                depth: 0,
                has_children: !kids.is_empty(),
            });
            if respect_collapsed && root.collapsed {
                continue;
            }
            rows.extend(kids.iter().map(|&kid| DisplayRow {
                task: kid,
                depth: 1,
                has_children: false,
            }));
        }
        rows.extend(self.orphans.iter().map(|&task| DisplayRow {
            task,
            depth: 0,
            has_children: false,
        }));
        rows
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn tasks() -> Vec<Task> {
        let d = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        vec![
            Task::new("task1", d, 3),
            Task::new("task2", d, 3).parent("task1"),
            Task::new("task3", d, 3),
            Task::new("task4", d, 3).parent("task1"),
            Task::new("task5", d, 3).parent("task2"),
            Task::new("task6", d, 3).parent("missing"),
        ]
    }

    fn ids(rows: &[DisplayRow<'_>]) -> Vec<(String, usize)> {
        rows.iter().map(|r| (r.task.id.clone(), r.depth)).collect()
    }

    #[test]
    fn root_classification() {
        let tasks = tasks();
        assert!(is_root(&tasks[0]));
        assert!(!is_root(&tasks[1]));
    }

    #[test]
    fn children_of_is_single_level() {
        let tasks = tasks();
        let kids: Vec<&str> = children_of(&tasks, "task1").iter().map(|t| t.id.as_str()).collect();
        assert_eq!(kids, ["task2", "task4"]);
        assert!(has_children(&tasks, "task1"));
        assert!(has_children(&tasks, "task2"));
        assert!(!has_children(&tasks, "task3"));
    }

    #[test]
    fn index_matches_free_functions() {
        let tasks = tasks();
        let index = TaskHierarchy::build(&tasks);
        for task in &tasks {
            assert_eq!(index.has_children(&task.id), has_children(&tasks, &task.id));
            assert_eq!(index.children(&task.id).len(), children_of(&tasks, &task.id).len());
        }
    }

    #[test]
    fn parents_are_roots_with_children() {
        let tasks = tasks();
        let index = TaskHierarchy::build(&tasks);
        let parents: Vec<&str> = index.parents().map(|t| t.id.as_str()).collect();
        // task2 has a child but is itself a sub-task
        assert_eq!(parents, ["task1"]);
    }

    #[test]
    fn display_order_lists_children_under_roots() {
        let tasks = tasks();
        let index = TaskHierarchy::build(&tasks);
        assert_eq!(
            ids(&index.display_order(false)),
            vec![
                ("task1".to_string(), 0),
                ("task2".to_string(), 1),
                ("task4".to_string(), 1),
                ("task3".to_string(), 0),
                ("task6".to_string(), 0),
            ]
        );
    }

    #[test]
    fn collapsed_parent_hides_children() {
        let mut tasks = tasks();
        tasks[0].collapsed = true;
        let index = TaskHierarchy::build(&tasks);
        let rows = index.display_order(true);
        assert_eq!(rows.len(), 3);
        assert!(rows[0].has_children);
        assert_eq!(rows[1].task.id, "task3");
    }
}
