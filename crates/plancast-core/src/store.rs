//! The planner store: every project plus selection and id counters.
//!
//! All mutations go through [`PlannerStore`] methods. Each task mutation
//! validates its input, applies it, then re-runs the parent rollup for the
//! affected project so derived fields are never stale. Timestamps are
//! passed in by the caller.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::hierarchy::{has_children, is_root};
use crate::{keyed, rollup, PlanError, Priority, Project, ProjectId, Task, TaskId, TaskStatus};

/// Version tag written into export documents
pub const EXPORT_VERSION: &str = "1.0";

/// Persistence error
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Invalid store document: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Plan(#[from] PlanError),
}

// ============================================================================
// Drafts
// ============================================================================

/// User input for creating or editing a project
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ProjectDraft {
    pub name: String,
    pub description: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl ProjectDraft {
    pub fn new(name: impl Into<String>, start_date: NaiveDate) -> Self {
        Self {
            name: name.into(),
            start_date: Some(start_date),
            ..Self::default()
        }
    }

    /// Draft pre-filled from an existing project
    pub fn from_project(project: &Project) -> Self {
        Self {
            name: project.name.clone(),
            description: project.description.clone(),
            start_date: Some(project.start_date),
            end_date: project.end_date,
        }
    }

    fn validate(&self) -> Result<(String, NaiveDate), PlanError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(PlanError::MissingField("name"));
        }
        let start = self.start_date.ok_or(PlanError::MissingField("startDate"))?;
        Ok((name.to_string(), start))
    }
}

/// User input for creating or editing a task
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TaskDraft {
    pub name: String,
    pub description: String,
    pub priority: Priority,
    pub status: TaskStatus,
    pub start_planned: Option<NaiveDate>,
    pub duration_planned: u32,
    pub start_actual: Option<NaiveDate>,
    pub duration_actual: Option<u32>,
    pub progress: u8,
    pub parent_id: Option<TaskId>,
}

impl Default for TaskDraft {
    fn default() -> Self {
        Self {
            name: String::new(),
            description: String::new(),
            priority: Priority::default(),
            status: TaskStatus::default(),
            start_planned: None,
            duration_planned: 1,
            start_actual: None,
            duration_actual: None,
            progress: 0,
            parent_id: None,
        }
    }
}

impl TaskDraft {
    pub fn new(name: impl Into<String>, start_planned: NaiveDate, duration_planned: u32) -> Self {
        Self {
            name: name.into(),
            start_planned: Some(start_planned),
            duration_planned,
            ..Self::default()
        }
    }

    /// Draft pre-filled from an existing task, for edits
    pub fn from_task(task: &Task) -> Self {
        Self {
            name: task.name.clone(),
            description: task.description.clone(),
            priority: task.priority,
            status: task.status,
            start_planned: task.start_planned,
            duration_planned: task.duration_planned,
            start_actual: task.start_actual,
            duration_actual: task.duration_actual,
            progress: task.progress,
            parent_id: task.parent_id.clone(),
        }
    }

    pub fn parent(mut self, parent: impl Into<String>) -> Self {
        self.parent_id = Some(parent.into());
        self
    }

    pub fn progress(mut self, progress: u8) -> Self {
        self.progress = progress;
        self
    }

    pub fn started(mut self, date: NaiveDate) -> Self {
        self.start_actual = Some(date);
        self
    }

    pub fn actual_days(mut self, days: u32) -> Self {
        self.duration_actual = Some(days);
        self
    }

    fn validate(&self) -> Result<(), PlanError> {
        if self.name.trim().is_empty() {
            return Err(PlanError::MissingField("name"));
        }
        if self.start_planned.is_none() {
            return Err(PlanError::MissingField("startPlanned"));
        }
        if self.duration_planned == 0 {
            return Err(PlanError::ZeroDuration);
        }
        if self.progress > 100 {
            return Err(PlanError::InvalidProgress(self.progress));
        }
        Ok(())
    }

    fn parent_id(&self) -> Option<&str> {
        self.parent_id.as_deref().map(str::trim).filter(|p| !p.is_empty())
    }

    fn write_into(&self, task: &mut Task) {
        task.name = self.name.trim().to_string();
        task.description = self.description.trim().to_string();
        task.priority = self.priority;
        task.status = self.status;
        task.start_planned = self.start_planned;
        task.duration_planned = self.duration_planned;
        task.start_actual = self.start_actual;
        task.duration_actual = self.duration_actual.filter(|d| *d > 0);
        task.progress = self.progress;
        task.parent_id = self.parent_id().map(str::to_string);
    }
}

/// Reject parents that would create more than one level of nesting.
///
/// `task_id` is `None` for a task that does not exist yet.
fn validate_parent(
    project: &Project,
    task_id: Option<&str>,
    parent_id: &str,
) -> Result<(), PlanError> {
    if task_id == Some(parent_id) {
        return Err(PlanError::SelfParent(parent_id.to_string()));
    }
    let parent = project
        .get_task(parent_id)
        .ok_or_else(|| PlanError::ParentNotFound(parent_id.to_string()))?;
    let has_own_children = task_id.is_some_and(|id| has_children(&project.tasks, id));
    if !is_root(parent) || has_own_children {
        return Err(PlanError::NestingTooDeep {
            task: task_id.unwrap_or("new task").to_string(),
            parent: parent_id.to_string(),
        });
    }
    Ok(())
}

// ============================================================================
// Store
// ============================================================================

fn first_id() -> u64 {
    1
}

/// All projects, the selected one, and the id counters
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlannerStore {
    #[serde(default, with = "keyed::ordered_map")]
    pub projects: Vec<Project>,
    #[serde(default, deserialize_with = "keyed::empty_as_none")]
    pub current_project: Option<ProjectId>,
    #[serde(default = "first_id")]
    pub task_id_counter: u64,
    #[serde(default = "first_id")]
    pub project_id_counter: u64,
}

impl Default for PlannerStore {
    fn default() -> Self {
        Self {
            projects: Vec::new(),
            current_project: None,
            task_id_counter: 1,
            project_id_counter: 1,
        }
    }
}

/// The export file written by `plancast export`
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportDocument {
    #[serde(with = "keyed::ordered_map")]
    pub projects: Vec<Project>,
    pub export_date: DateTime<Utc>,
    pub version: String,
}

impl PlannerStore {
    /// Empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Store holding a single default project starting on `today`
    pub fn with_default_project(today: NaiveDate, now: DateTime<Utc>) -> Self {
        let mut store = Self::new();
        store.insert_default_project(today, now);
        store
    }

    fn insert_default_project(&mut self, today: NaiveDate, now: DateTime<Utc>) {
        let id = self.next_project_id();
        let mut project = Project::new(id.clone(), "Project 1", today);
        project.description = "Default project".to_string();
        project.created_at = Some(now);
        self.projects.push(project);
        self.current_project = Some(id);
    }

    /// Make sure a project exists and one is selected
    pub fn ensure_current(&mut self, today: NaiveDate, now: DateTime<Utc>) {
        if self.projects.is_empty() {
            info!("store has no projects, creating the default one");
            self.insert_default_project(today, now);
            return;
        }
        let valid = self
            .current_project
            .as_deref()
            .is_some_and(|id| self.project(id).is_some());
        if !valid {
            self.current_project = self.projects.first().map(|p| p.id.clone());
        }
    }

    // ------------------------------------------------------------------------
    // Lookup
    // ------------------------------------------------------------------------

    pub fn project(&self, id: &str) -> Option<&Project> {
        self.projects.iter().find(|p| p.id == id)
    }

    pub fn project_mut(&mut self, id: &str) -> Option<&mut Project> {
        self.projects.iter_mut().find(|p| p.id == id)
    }

    fn require_project_mut(&mut self, id: &str) -> Result<&mut Project, PlanError> {
        self.project_mut(id)
            .ok_or_else(|| PlanError::ProjectNotFound(id.to_string()))
    }

    /// The selected project
    pub fn current(&self) -> Result<&Project, PlanError> {
        let id = self
            .current_project
            .as_deref()
            .ok_or(PlanError::NoCurrentProject)?;
        self.project(id)
            .ok_or_else(|| PlanError::ProjectNotFound(id.to_string()))
    }

    pub fn current_id(&self) -> Result<ProjectId, PlanError> {
        self.current().map(|p| p.id.clone())
    }

    pub fn total_tasks(&self) -> usize {
        self.projects.iter().map(|p| p.tasks.len()).sum()
    }

    // ------------------------------------------------------------------------
    // Id allocation
    // ------------------------------------------------------------------------

    fn next_project_id(&mut self) -> ProjectId {
        loop {
            let id = format!("project{}", self.project_id_counter);
            self.project_id_counter += 1;
            if self.project(&id).is_none() {
                return id;
            }
        }
    }

    fn next_task_id(&mut self) -> TaskId {
        loop {
            let id = format!("task{}", self.task_id_counter);
            self.task_id_counter += 1;
            if !self.projects.iter().any(|p| p.contains_task(&id)) {
                return id;
            }
        }
    }

    // ------------------------------------------------------------------------
    // Projects
    // ------------------------------------------------------------------------

    /// Create a project and select it
    pub fn create_project(
        &mut self,
        draft: &ProjectDraft,
        now: DateTime<Utc>,
    ) -> Result<ProjectId, PlanError> {
        let (name, start) = draft.validate()?;
        let id = self.next_project_id();
        let mut project = Project::new(id.clone(), name, start);
        project.description = draft.description.trim().to_string();
        project.end_date = draft.end_date;
        project.created_at = Some(now);

        info!(project = %id, "created project");
        self.projects.push(project);
        self.current_project = Some(id.clone());
        Ok(id)
    }

    pub fn update_project(&mut self, id: &str, draft: &ProjectDraft) -> Result<(), PlanError> {
        let (name, start) = draft.validate()?;
        let project = self.require_project_mut(id)?;
        project.name = name;
        project.description = draft.description.trim().to_string();
        project.start_date = start;
        project.end_date = draft.end_date;
        debug!(project = %id, "updated project");
        Ok(())
    }

    pub fn switch_project(&mut self, id: &str) -> Result<(), PlanError> {
        if self.project(id).is_none() {
            return Err(PlanError::ProjectNotFound(id.to_string()));
        }
        self.current_project = Some(id.to_string());
        Ok(())
    }

    /// Close a project. The last remaining project cannot be removed.
    pub fn remove_project(&mut self, id: &str) -> Result<Project, PlanError> {
        let index = self
            .projects
            .iter()
            .position(|p| p.id == id)
            .ok_or_else(|| PlanError::ProjectNotFound(id.to_string()))?;
        if self.projects.len() <= 1 {
            return Err(PlanError::LastProject);
        }

        let removed = self.projects.remove(index);
        if self.current_project.as_deref() == Some(id) {
            self.current_project = self.projects.first().map(|p| p.id.clone());
        }
        info!(project = %id, tasks = removed.tasks.len(), "removed project");
        Ok(removed)
    }

    // ------------------------------------------------------------------------
    // Tasks
    // ------------------------------------------------------------------------

    /// Add a task to a project, returning its new id
    pub fn add_task(
        &mut self,
        project_id: &str,
        draft: &TaskDraft,
        now: DateTime<Utc>,
    ) -> Result<TaskId, PlanError> {
        draft.validate()?;
        let project = self
            .project(project_id)
            .ok_or_else(|| PlanError::ProjectNotFound(project_id.to_string()))?;
        if let Some(parent) = draft.parent_id() {
            validate_parent(project, None, parent)?;
        }

        let id = self.next_task_id();
        let project = self.require_project_mut(project_id)?;

        let start = draft.start_planned.unwrap_or(project.start_date);
        let mut task = Task::new(id.clone(), start, draft.duration_planned);
        draft.write_into(&mut task);
        task.created_at = Some(now);
        task.updated_at = Some(now);

        debug!(project = %project_id, task = %id, parent = ?task.parent_id, "added task");
        project.tasks.push(task);
        rollup::refresh(project);
        Ok(id)
    }

    /// Overwrite a task's editable fields
    pub fn update_task(
        &mut self,
        project_id: &str,
        task_id: &str,
        draft: &TaskDraft,
        now: DateTime<Utc>,
    ) -> Result<(), PlanError> {
        draft.validate()?;
        let project = self.require_project_mut(project_id)?;
        if !project.contains_task(task_id) {
            return Err(PlanError::TaskNotFound(task_id.to_string()));
        }
        if let Some(parent) = draft.parent_id() {
            validate_parent(project, Some(task_id), parent)?;
        }

        if let Some(task) = project.get_task_mut(task_id) {
            draft.write_into(task);
            task.updated_at = Some(now);
        }
        debug!(project = %project_id, task = %task_id, "updated task");
        rollup::refresh(project);
        Ok(())
    }

    /// Delete a task and its sub-tasks, returning what was removed
    pub fn remove_task(&mut self, project_id: &str, task_id: &str) -> Result<Vec<Task>, PlanError> {
        let project = self.require_project_mut(project_id)?;
        if !project.contains_task(task_id) {
            return Err(PlanError::TaskNotFound(task_id.to_string()));
        }

        let (removed, kept): (Vec<Task>, Vec<Task>) =
            std::mem::take(&mut project.tasks).into_iter().partition(|t| {
                t.id == task_id || t.parent_id.as_deref() == Some(task_id)
            });
        project.tasks = kept;

        info!(project = %project_id, task = %task_id, removed = removed.len(), "removed task");
        rollup::refresh(project);
        Ok(removed)
    }

    /// Flip a task's collapsed flag, returning the new value
    pub fn toggle_collapsed(&mut self, project_id: &str, task_id: &str) -> Result<bool, PlanError> {
        let project = self.require_project_mut(project_id)?;
        let task = project
            .get_task_mut(task_id)
            .ok_or_else(|| PlanError::TaskNotFound(task_id.to_string()))?;
        task.collapsed = !task.collapsed;
        Ok(task.collapsed)
    }

    /// Re-run the rollup for every project
    pub fn refresh_all(&mut self) {
        for project in &mut self.projects {
            rollup::refresh(project);
        }
    }

    // ------------------------------------------------------------------------
    // Serialization
    // ------------------------------------------------------------------------

    /// Parse a store document; derived fields are recomputed on load
    pub fn from_json(raw: &str) -> Result<Self, StoreError> {
        let mut store: PlannerStore = serde_json::from_str(raw)?;
        store.refresh_all();
        Ok(store)
    }

    pub fn to_json(&self) -> Result<String, StoreError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Snapshot of all projects for export
    pub fn export(&self, now: DateTime<Utc>) -> ExportDocument {
        ExportDocument {
            projects: self.projects.clone(),
            export_date: now,
            version: EXPORT_VERSION.to_string(),
        }
    }
}
