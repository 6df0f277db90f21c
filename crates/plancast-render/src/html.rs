//! Standalone HTML timeline page.
//!
//! Generates a single HTML file with:
//! - Project summary cards
//! - A task table in hierarchical order (sub-tasks indented, collapsed
//!   parents folded)
//! - A progress cell per task whose bar width, text and `data-progress`
//!   attribute are all written from the same declared value
//! - A timeline cell per task with absolutely positioned bar segments

use plancast_core::hierarchy::{DisplayRow, TaskHierarchy};
use plancast_core::{BarSegment, Project, ProjectSummary, RenderError, Renderer, Task, Timeline};

use crate::{format_date, html_escape};

/// Color theme for the HTML page
#[derive(Clone, Debug)]
pub struct TimelineTheme {
    pub planned_color: String,
    pub actual_color: String,
    pub completed_color: String,
    pub overrun_color: String,
    pub background_color: String,
    pub grid_color: String,
    pub text_color: String,
    pub header_bg: String,
}

impl Default for TimelineTheme {
    fn default() -> Self {
        Self::light()
    }
}

impl TimelineTheme {
    pub fn light() -> Self {
        Self {
            planned_color: "#95a5a6".into(),
            actual_color: "#3498db".into(),
            completed_color: "#27ae60".into(),
            overrun_color: "#e74c3c".into(),
            background_color: "#ffffff".into(),
            grid_color: "#ecf0f1".into(),
            text_color: "#2c3e50".into(),
            header_bg: "#f8f9fa".into(),
        }
    }

    pub fn dark() -> Self {
        Self {
            planned_color: "#7f8c8d".into(),
            actual_color: "#3498db".into(),
            completed_color: "#2ecc71".into(),
            overrun_color: "#e74c3c".into(),
            background_color: "#1a1a2e".into(),
            grid_color: "#2d2d44".into(),
            text_color: "#eaeaea".into(),
            header_bg: "#16213e".into(),
        }
    }
}

/// HTML timeline renderer configuration
#[derive(Clone, Debug)]
pub struct HtmlTimelineRenderer {
    pub theme: TimelineTheme,
    /// chrono format string for dates
    pub date_format: String,
    /// Fold the children of collapsed parents
    pub respect_collapsed: bool,
}

impl Default for HtmlTimelineRenderer {
    fn default() -> Self {
        Self {
            theme: TimelineTheme::default(),
            date_format: "%d/%m/%Y".into(),
            respect_collapsed: true,
        }
    }
}

impl HtmlTimelineRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use dark theme
    pub fn dark_theme(mut self) -> Self {
        self.theme = TimelineTheme::dark();
        self
    }

    pub fn date_format(mut self, format: impl Into<String>) -> Self {
        self.date_format = format.into();
        self
    }

    /// Show every sub-task regardless of collapsed state
    pub fn expand_all(mut self) -> Self {
        self.respect_collapsed = false;
        self
    }

    fn generate_css(&self) -> String {
        let t = &self.theme;
        format!(
            r#"        body {{ font-family: system-ui, -apple-system, sans-serif; background: {bg}; color: {text}; margin: 20px; }}
        .summary {{ display: flex; gap: 16px; margin-bottom: 16px; }}
        .stat {{ background: {header}; padding: 8px 14px; border-radius: 6px; }}
        table {{ border-collapse: collapse; width: 100%; }}
        th, td {{ border-bottom: 1px solid {grid}; padding: 6px 8px; text-align: left; font-size: 13px; }}
        th {{ background: {header}; }}
        tr.subtask td.name {{ padding-left: 28px; }}
        tr.parent td.name {{ font-weight: bold; }}
        tr.off-plan td.name::after {{ content: " ⚠"; color: {overrun}; }}
        .progress-bar {{ display: inline-block; width: 80px; height: 8px; background: {grid}; border-radius: 4px; vertical-align: middle; }}
        .progress-fill {{ height: 100%; background: {completed}; border-radius: 4px; }}
        .progress-text {{ margin-left: 6px; }}
        .timeline-container {{ position: relative; height: 20px; min-width: 300px; }}
        .timeline-bar {{ position: absolute; height: 8px; border-radius: 2px; }}
        .timeline-planned {{ top: 2px; background: repeating-linear-gradient(45deg, {planned}, {planned} 4px, transparent 4px, transparent 8px); border: 1px solid {planned}; }}
        .timeline-actual {{ top: 10px; background: {actual}; opacity: 0.5; }}
        .timeline-completed {{ top: 10px; background: {completed}; }}
        .timeline-overrun {{ top: 10px; background: {overrun}; }}"#,
            bg = t.background_color,
            text = t.text_color,
            header = t.header_bg,
            grid = t.grid_color,
            planned = t.planned_color,
            actual = t.actual_color,
            completed = t.completed_color,
            overrun = t.overrun_color,
        )
    }

    fn render_summary(&self, project: &Project) -> String {
        let summary = ProjectSummary::compute(project);
        format!(
            r#"    <div class="summary">
        <div class="stat"><span id="totalTasks">{}</span> tasks</div>
        <div class="stat"><span id="completedTasks">{}</span> completed</div>
        <div class="stat"><span id="projectProgress">{}%</span> progress</div>
        <div class="stat"><span id="projectDuration">{} days</span></div>
    </div>
"#,
            summary.total_tasks, summary.completed_tasks, summary.average_progress, summary.duration_days
        )
    }

    fn render_row(&self, out: &mut String, row: &DisplayRow<'_>, timeline: &Timeline) {
        let task = row.task;
        let fmt = self.date_format.as_str();
        let bars = timeline.bars_for(&task.id);
        let off_plan = bars.is_some_and(|b| b.off_plan);

        let mut classes = vec!["task-row"];
        if row.depth > 0 {
            classes.push("subtask");
        }
        if row.has_children {
            classes.push("parent");
        }
        if off_plan {
            classes.push("off-plan");
        }

        let parent_attr = task
            .parent_id
            .as_deref()
            .map(|p| format!(r#" data-parent-id="{}""#, html_escape(p)))
            .unwrap_or_default();

        let actual = task
            .shown_duration_actual()
            .map_or_else(|| "-".to_string(), |d| d.to_string());

        out.push_str(&format!(
            r#"            <tr class="{classes}" data-task-id="{id}"{parent_attr}>
                <td class="name">{name}</td>
                <td class="priority {priority_key}">{priority}</td>
                <td class="status {status_key}">{status}</td>
                <td>{start_planned}</td>
                <td>{duration_planned}</td>
                <td>{start_actual}</td>
                <td>{actual}</td>
                <td>{progress}</td>
                <td>{timeline}</td>
            </tr>
"#,
            classes = classes.join(" "),
            id = html_escape(&task.id),
            name = html_escape(&task.name),
            priority_key = task.priority.as_str(),
            priority = task.priority.label(),
            status_key = task.status.as_str(),
            status = task.status.label(),
            start_planned = format_date(task.inherited_start_planned.or(task.start_planned), fmt),
            duration_planned = task.shown_duration_planned(),
            start_actual = format_date(task.inherited_start_actual.or(task.start_actual), fmt),
            progress = progress_cell(task),
            timeline = timeline_cell(bars.map(|b| b.segments.as_slice()).unwrap_or_default()),
        ));
    }
}

/// Progress bar and text, both written from the declared value
pub fn progress_cell(task: &Task) -> String {
    let pct = task.effective_progress();
    format!(
        r#"<div class="progress-bar" data-task-id="{id}" data-progress="{pct}"><div class="progress-fill" style="width: {pct}%;"></div></div><span class="progress-text">{pct}%</span>"#,
        id = html_escape(&task.id),
    )
}

/// Positioned bar segments
pub fn timeline_cell(segments: &[BarSegment]) -> String {
    let mut cell = String::from(r#"<div class="timeline-container">"#);
    for segment in segments {
        cell.push_str(&format!(
            r#"<div class="timeline-bar timeline-{kind}" style="left: {left:.2}%; width: {width:.2}%;"></div>"#,
            kind = segment.kind.as_str(),
            left = segment.left_percent,
            width = segment.width_percent,
        ));
    }
    cell.push_str("</div>");
    cell
}

impl Renderer for HtmlTimelineRenderer {
    type Output = String;

    fn render(&self, project: &Project, timeline: &Timeline) -> Result<String, RenderError> {
        let hierarchy = TaskHierarchy::build(&project.tasks);
        let rows = hierarchy.display_order(self.respect_collapsed);

        let mut body = String::new();
        if rows.is_empty() {
            body.push_str(
                "            <tr><td colspan=\"9\" class=\"text-center\">No tasks in this project</td></tr>\n",
            );
        }
        for row in &rows {
            self.render_row(&mut body, row, timeline);
        }

        let window = &timeline.window;
        let fmt = self.date_format.as_str();
        Ok(format!(
            r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title} - Timeline</title>
    <style>
{css}
    </style>
</head>
<body>
    <h1>{title}</h1>
    <p class="window">{start} - {end} ({days} days)</p>
{summary}    <table class="tasks-table">
        <thead>
            <tr><th>Task</th><th>Priority</th><th>Status</th><th>Planned start</th><th>Planned days</th><th>Actual start</th><th>Actual days</th><th>Progress</th><th>Timeline</th></tr>
        </thead>
        <tbody id="tasksTableBody">
{body}        </tbody>
    </table>
</body>
</html>
"#,
            title = html_escape(&project.name),
            css = self.generate_css(),
            start = window.start.format(fmt),
            end = window.end.format(fmt),
            days = window.total_days,
            summary = self.render_summary(project),
            body = body,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use plancast_core::{BarKind, TimelineConfig};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn sample() -> (Project, Timeline) {
        let mut project = Project::new("project1", "Launch <beta>", date(2024, 1, 1));
        project.tasks.push(Task::new("task1", date(2024, 1, 1), 1).name("Parent"));
        project.tasks.push(
            Task::new("task2", date(2024, 1, 5), 3)
                .name("Child")
                .parent("task1")
                .progress(40),
        );
        project.tasks.push(
            Task::new("task3", date(2024, 1, 2), 2)
                .name("Late")
                .started(date(2024, 1, 4))
                .progress(100),
        );
        plancast_core::rollup::refresh(&mut project);
        let timeline = Timeline::compute(&project, &TimelineConfig::default());
        (project, timeline)
    }

    #[test]
    fn produces_valid_html() {
        let (project, timeline) = sample();
        let html = HtmlTimelineRenderer::new().render(&project, &timeline).unwrap();
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("</html>"));
        assert!(html.contains("Launch &lt;beta&gt;"));
        assert!(html.contains(r#"data-parent-id="task1""#));
        assert!(html.contains("task-row subtask"));
        assert!(html.contains("task-row off-plan"));
    }

    #[test]
    fn progress_cell_uses_one_value() {
        let task = Task::new("task9", date(2024, 1, 1), 1).progress(42);
        assert_eq!(
            progress_cell(&task),
            r#"<div class="progress-bar" data-task-id="task9" data-progress="42"><div class="progress-fill" style="width: 42%;"></div></div><span class="progress-text">42%</span>"#
        );
    }

    #[test]
    fn timeline_cell_positions_segments() {
        let cell = timeline_cell(&[BarSegment {
            kind: BarKind::Planned,
            left_percent: 40.0 / 3.0,
            width_percent: 10.0,
        }]);
        assert!(cell.contains(r#"class="timeline-bar timeline-planned" style="left: 13.33%; width: 10.00%;""#));
    }

    #[test]
    fn parent_row_shows_rolled_up_values() {
        let (project, timeline) = sample();
        let html = HtmlTimelineRenderer::new().render(&project, &timeline).unwrap();
        // Parent progress is the single child's progress
        assert!(html.contains(r#"data-task-id="task1" data-progress="40""#));
    }

    #[test]
    fn rendered_page_passes_audit() {
        let (project, timeline) = sample();
        let html = HtmlTimelineRenderer::new().render(&project, &timeline).unwrap();
        let outcome = crate::ProgressAudit::new().unwrap().run(&html);
        assert_eq!(outcome.cells, 3);
        assert!(outcome.report.is_clean());
        assert_eq!(outcome.html, html);
    }

    #[test]
    fn empty_project_renders_placeholder() {
        let project = Project::new("p", "Empty", date(2024, 1, 1));
        let timeline = Timeline::compute(&project, &TimelineConfig::default());
        let html = HtmlTimelineRenderer::new().dark_theme().render(&project, &timeline).unwrap();
        assert!(html.contains("No tasks in this project"));
        assert!(html.contains("#1a1a2e"));
    }
}
