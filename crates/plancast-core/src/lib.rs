//! # plancast-core
//!
//! Core domain model for the plancast planned-vs-actual project planner.
//!
//! This crate provides:
//! - Domain types: `Project`, `Task`, `Priority`, `TaskStatus`
//! - Calendar-day interval math (`interval`)
//! - The one-level parent/child index (`hierarchy`)
//! - Weighted progress rollup for parent tasks (`rollup`)
//! - Timeline bar geometry against the project window (`timeline`)
//! - Post-render progress repair (`consistency`)
//! - An explicit `PlannerStore` holding all projects (`store`)
//! - Error types and the `Renderer` trait
//!
//! ## Example
//!
//! ```rust
//! use chrono::NaiveDate;
//! use plancast_core::{rollup, Project, Task};
//!
//! let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
//! let mut project = Project::new("project1", "Launch", start);
//! project.tasks.push(Task::new("task1", start, 5).name("Build"));
//! project.tasks.push(Task::new("task2", start, 4).parent("task1").progress(50));
//! project.tasks.push(Task::new("task3", start, 6).parent("task1").progress(100));
//!
//! rollup::refresh(&mut project);
//!
//! let parent = project.get_task("task1").unwrap();
//! assert_eq!(parent.progress, 80);
//! assert_eq!(parent.inherited_duration_planned, Some(10));
//! ```

pub mod calendar;
pub mod consistency;
pub mod hierarchy;
pub mod interval;
pub mod keyed;
pub mod rollup;
pub mod store;
pub mod summary;
pub mod timeline;

pub use consistency::{repair_progress, ProgressPair, RepairReport};
pub use hierarchy::TaskHierarchy;
pub use interval::{DayInterval, MonthSpan, MonthWindow};
pub use rollup::ParentRollup;
pub use store::{PlannerStore, ProjectDraft, StoreError, TaskDraft};
pub use summary::{ProjectSummary, TaskFilter};
pub use timeline::{BarKind, BarSegment, ProjectWindow, TaskBars, Timeline, TimelineConfig};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ============================================================================
// Type Aliases
// ============================================================================

/// Unique identifier for a task within a project
pub type TaskId = String;

/// Unique identifier for a project within a store
pub type ProjectId = String;

// ============================================================================
// Enumerations
// ============================================================================

/// Task priority
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    pub const ALL: [Priority; 3] = [Priority::Low, Priority::Medium, Priority::High];

    /// Wire name, as stored in JSON
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        }
    }

    /// Human-readable label
    pub fn label(&self) -> &'static str {
        match self {
            Priority::Low => "Low",
            Priority::Medium => "Medium",
            Priority::High => "High",
        }
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl std::str::FromStr for Priority {
    type Err = PlanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Priority::ALL
            .into_iter()
            .find(|p| p.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| PlanError::InvalidValue {
                kind: "priority",
                value: s.to_string(),
            })
    }
}

/// Task status.
///
/// `OnHold` is accepted when loading data and has a display label, but the
/// editor only offers the values in [`TaskStatus::EDITABLE`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaskStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
    OnHold,
}

impl TaskStatus {
    pub const EDITABLE: [TaskStatus; 3] = [
        TaskStatus::Pending,
        TaskStatus::InProgress,
        TaskStatus::Completed,
    ];

    /// Wire name, as stored in JSON
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::InProgress => "in-progress",
            TaskStatus::Completed => "completed",
            TaskStatus::OnHold => "on-hold",
        }
    }

    /// Human-readable label
    pub fn label(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "Pending",
            TaskStatus::InProgress => "In Progress",
            TaskStatus::Completed => "Completed",
            TaskStatus::OnHold => "On Hold",
        }
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl std::str::FromStr for TaskStatus {
    type Err = PlanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        [
            TaskStatus::Pending,
            TaskStatus::InProgress,
            TaskStatus::Completed,
            TaskStatus::OnHold,
        ]
        .into_iter()
        .find(|st| st.as_str().eq_ignore_ascii_case(wanted))
        .ok_or_else(|| PlanError::InvalidValue {
            kind: "status",
            value: s.to_string(),
        })
    }
}

// ============================================================================
// Task
// ============================================================================

/// A unit of planned work with an optional actual execution record.
///
/// The `is_dynamic_progress` and `inherited_*` fields are derived: only the
/// rollup engine writes them (see [`rollup::refresh`]).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Unique identifier
    pub id: TaskId,
    /// Display name
    pub name: String,
    /// Free-form description
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub status: TaskStatus,
    /// Planned start. `None` only when stored data could not be parsed.
    #[serde(default, deserialize_with = "keyed::lenient_date")]
    pub start_planned: Option<NaiveDate>,
    /// Planned duration in calendar days
    #[serde(default)]
    pub duration_planned: u32,
    /// Actual start, if work has begun
    #[serde(
        default,
        deserialize_with = "keyed::lenient_date",
        skip_serializing_if = "Option::is_none"
    )]
    pub start_actual: Option<NaiveDate>,
    /// Actual duration in calendar days; zero means "not recorded"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_actual: Option<u32>,
    /// Completion percentage (0-100)
    #[serde(default)]
    pub progress: u8,
    /// Parent task (one level of nesting)
    #[serde(
        default,
        deserialize_with = "keyed::empty_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub parent_id: Option<TaskId>,

    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_dynamic_progress: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inherited_duration_planned: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inherited_duration_actual: Option<u32>,
    #[serde(
        default,
        deserialize_with = "keyed::lenient_date",
        skip_serializing_if = "Option::is_none"
    )]
    pub inherited_start_planned: Option<NaiveDate>,
    #[serde(
        default,
        deserialize_with = "keyed::lenient_date",
        skip_serializing_if = "Option::is_none"
    )]
    pub inherited_start_actual: Option<NaiveDate>,

    /// Expand/collapse state in hierarchical views
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub collapsed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Task {
    /// Create a new task planned to start on `start` and last `days` days
    pub fn new(id: impl Into<String>, start: NaiveDate, days: u32) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            description: String::new(),
            priority: Priority::default(),
            status: TaskStatus::default(),
            start_planned: Some(start),
            duration_planned: days,
            start_actual: None,
            duration_actual: None,
            progress: 0,
            parent_id: None,
            is_dynamic_progress: false,
            inherited_duration_planned: None,
            inherited_duration_actual: None,
            inherited_start_planned: None,
            inherited_start_actual: None,
            collapsed: false,
            created_at: None,
            updated_at: None,
        }
    }

    /// Set the task name
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Set the description
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn status(mut self, status: TaskStatus) -> Self {
        self.status = status;
        self
    }

    /// Set the completion percentage
    pub fn progress(mut self, pct: u8) -> Self {
        self.progress = pct;
        self
    }

    /// Make this task a sub-task of `parent`
    pub fn parent(mut self, parent: impl Into<String>) -> Self {
        self.parent_id = Some(parent.into());
        self
    }

    /// Record when work actually started
    pub fn started(mut self, date: NaiveDate) -> Self {
        self.start_actual = Some(date);
        self
    }

    /// Record how many days the work actually took
    pub fn actual_days(mut self, days: u32) -> Self {
        self.duration_actual = Some(days);
        self
    }

    /// Actual duration, treating a recorded zero as absent
    pub fn actual_duration(&self) -> Option<u32> {
        self.duration_actual.filter(|d| *d > 0)
    }

    /// Completion percentage clamped to 0-100
    pub fn effective_progress(&self) -> u8 {
        self.progress.min(100)
    }

    /// Inclusive planned interval, if the planned start is known
    pub fn planned_interval(&self) -> Option<DayInterval> {
        self.start_planned
            .map(|start| interval::interval(start, self.duration_planned))
    }

    /// Inclusive actual interval. Duration falls back to the planned one.
    pub fn actual_interval(&self) -> Option<DayInterval> {
        self.start_actual.map(|start| {
            let days = self.actual_duration().unwrap_or(self.duration_planned);
            interval::interval(start, days)
        })
    }

    /// Planned duration as shown in tables: the children's sum for parents
    pub fn shown_duration_planned(&self) -> u32 {
        self.inherited_duration_planned
            .filter(|d| *d > 0)
            .unwrap_or(self.duration_planned)
    }

    /// Actual duration as shown in tables: the children's sum for parents
    pub fn shown_duration_actual(&self) -> Option<u32> {
        self.inherited_duration_actual
            .filter(|d| *d > 0)
            .or_else(|| self.actual_duration())
    }
}

// ============================================================================
// Project
// ============================================================================

/// A project and its tasks
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    /// Unique identifier
    pub id: ProjectId,
    /// Human-readable name
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Project start date; always part of the timeline window
    pub start_date: NaiveDate,
    #[serde(default, deserialize_with = "keyed::lenient_date")]
    pub end_date: Option<NaiveDate>,
    /// Tasks keyed by id. Order is the default display order.
    #[serde(default, with = "keyed::ordered_map")]
    pub tasks: Vec<Task>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Project {
    /// Create an empty project
    pub fn new(id: impl Into<String>, name: impl Into<String>, start: NaiveDate) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            start_date: start,
            end_date: None,
            tasks: Vec::new(),
            created_at: None,
        }
    }

    /// Get a task by ID
    pub fn get_task(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    /// Get a mutable task by ID
    pub fn get_task_mut(&mut self, id: &str) -> Option<&mut Task> {
        self.tasks.iter_mut().find(|t| t.id == id)
    }

    pub fn contains_task(&self, id: &str) -> bool {
        self.tasks.iter().any(|t| t.id == id)
    }
}

impl keyed::Keyed for Task {
    fn key(&self) -> &str {
        &self.id
    }
}

impl keyed::Keyed for Project {
    fn key(&self) -> &str {
        &self.id
    }
}

// ============================================================================
// Traits
// ============================================================================

/// Output rendering
pub trait Renderer {
    type Output;

    /// Render a project with its computed timeline
    fn render(&self, project: &Project, timeline: &Timeline) -> Result<Self::Output, RenderError>;
}

// ============================================================================
// Errors
// ============================================================================

/// Planning error raised by store mutations and value parsing
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlanError {
    #[error("Project not found: {0}")]
    ProjectNotFound(ProjectId),

    #[error("Task not found: {0}")]
    TaskNotFound(TaskId),

    #[error("Parent task not found: {0}")]
    ParentNotFound(TaskId),

    #[error("Task {0} cannot be its own parent")]
    SelfParent(TaskId),

    #[error("Task {task} cannot be nested under {parent}: only one level of sub-tasks is supported")]
    NestingTooDeep { task: TaskId, parent: TaskId },

    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Planned duration must be at least one day")]
    ZeroDuration,

    #[error("Progress must be between 0 and 100, got {0}")]
    InvalidProgress(u8),

    #[error("At least one project must remain open")]
    LastProject,

    #[error("No project is selected")]
    NoCurrentProject,

    #[error("Invalid {kind}: {value}")]
    InvalidValue { kind: &'static str, value: String },
}

/// Rendering error
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Format error: {0}")]
    Format(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn task_builder() {
        let task = Task::new("task7", date(2024, 3, 1), 5)
            .name("Wiring")
            .description("Second floor")
            .priority(Priority::High)
            .status(TaskStatus::InProgress)
            .progress(40)
            .parent("task2");

        assert_eq!(task.id, "task7");
        assert_eq!(task.name, "Wiring");
        assert_eq!(task.priority, Priority::High);
        assert_eq!(task.status, TaskStatus::InProgress);
        assert_eq!(task.progress, 40);
        assert_eq!(task.parent_id.as_deref(), Some("task2"));
        assert!(!task.is_dynamic_progress);
    }

    #[test]
    fn zero_actual_duration_counts_as_absent() {
        let task = Task::new("t", date(2024, 3, 1), 5)
            .started(date(2024, 3, 2))
            .actual_days(0);
        assert_eq!(task.actual_duration(), None);
        let actual = task.actual_interval().unwrap();
        assert_eq!(actual.end, date(2024, 3, 6));
    }

    #[test]
    fn effective_progress_is_clamped() {
        let task = Task::new("t", date(2024, 3, 1), 5).progress(140);
        assert_eq!(task.effective_progress(), 100);
    }

    #[test]
    fn shown_durations_prefer_inherited() {
        let mut task = Task::new("t", date(2024, 3, 1), 5).actual_days(2);
        assert_eq!(task.shown_duration_planned(), 5);
        assert_eq!(task.shown_duration_actual(), Some(2));

        task.inherited_duration_planned = Some(12);
        task.inherited_duration_actual = Some(0);
        assert_eq!(task.shown_duration_planned(), 12);
        assert_eq!(task.shown_duration_actual(), Some(2));
    }

    #[test]
    fn priority_and_status_parse_wire_names() {
        assert_eq!("high".parse::<Priority>().unwrap(), Priority::High);
        assert_eq!(" Low ".parse::<Priority>().unwrap(), Priority::Low);
        assert_eq!(
            "in-progress".parse::<TaskStatus>().unwrap(),
            TaskStatus::InProgress
        );
        assert_eq!("on-hold".parse::<TaskStatus>().unwrap(), TaskStatus::OnHold);
        assert!(matches!(
            "urgent".parse::<Priority>(),
            Err(PlanError::InvalidValue { kind: "priority", .. })
        ));
    }

    #[test]
    fn status_labels() {
        assert_eq!(TaskStatus::InProgress.to_string(), "In Progress");
        assert_eq!(TaskStatus::OnHold.as_str(), "on-hold");
        assert!(!TaskStatus::EDITABLE.contains(&TaskStatus::OnHold));
    }

    #[test]
    fn task_serializes_camel_case_and_skips_unset_derived_fields() {
        let task = Task::new("task1", date(2024, 1, 5), 3).progress(20);
        let json = serde_json::to_value(&task).unwrap();

        assert_eq!(json["startPlanned"], "2024-01-05");
        assert_eq!(json["durationPlanned"], 3);
        assert_eq!(json["status"], "pending");
        assert!(json.get("isDynamicProgress").is_none());
        assert!(json.get("inheritedDurationPlanned").is_none());
        assert!(json.get("parentId").is_none());
    }

    #[test]
    fn task_deserializes_browser_shaped_record() {
        let raw = r#"{
            "id": "task3",
            "name": "Survey",
            "description": "",
            "priority": "low",
            "status": "in-progress",
            "startPlanned": "2024-02-01",
            "durationPlanned": 4,
            "startActual": "",
            "durationActual": 0,
            "progress": 25,
            "parentId": null,
            "createdAt": "2024-01-28T09:15:00.000Z"
        }"#;

        let task: Task = serde_json::from_str(raw).unwrap();
        assert_eq!(task.start_planned, Some(date(2024, 2, 1)));
        assert_eq!(task.start_actual, None);
        assert_eq!(task.actual_duration(), None);
        assert_eq!(task.parent_id, None);
        assert_eq!(task.status, TaskStatus::InProgress);
        assert!(task.created_at.is_some());
    }

    #[test]
    fn malformed_planned_start_is_kept_as_none() {
        let raw = r#"{"id":"t","name":"t","startPlanned":"someday","durationPlanned":2}"#;
        let task: Task = serde_json::from_str(raw).unwrap();
        assert_eq!(task.start_planned, None);
        assert_eq!(task.planned_interval(), None);
    }

    #[test]
    fn project_get_task() {
        let start = date(2024, 1, 1);
        let mut project = Project::new("project1", "Demo", start);
        project.tasks.push(Task::new("task1", start, 2).name("First"));
        project.tasks.push(Task::new("task2", start, 2).name("Second"));

        assert_eq!(project.get_task("task2").unwrap().name, "Second");
        assert!(project.get_task("task9").is_none());
        project.get_task_mut("task1").unwrap().progress = 60;
        assert_eq!(project.get_task("task1").unwrap().progress, 60);
        assert!(project.contains_task("task1"));
    }
}
