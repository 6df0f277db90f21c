//! Plain text renderer for console output.
//!
//! Prints a task table in hierarchical order followed by an ASCII timeline.
//! Each timeline cell shows the strongest segment covering its midpoint:
//! `!` overrun, `#` completed, `=` actual, `-` planned.

use plancast_core::hierarchy::TaskHierarchy;
use plancast_core::{BarKind, ProjectSummary, Project, RenderError, Renderer, TaskBars, Timeline};

use crate::{format_date, truncate};

/// Text table + ASCII timeline
#[derive(Clone, Debug)]
pub struct TextRenderer {
    /// Width of the ASCII timeline in characters
    pub bar_width: usize,
    /// chrono format string for dates
    pub date_format: String,
    /// Print the summary block after the table
    pub show_summary: bool,
}

impl Default for TextRenderer {
    fn default() -> Self {
        Self {
            bar_width: 50,
            date_format: "%d/%m/%Y".into(),
            show_summary: true,
        }
    }
}

impl TextRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bar_width(mut self, width: usize) -> Self {
        self.bar_width = width.max(10);
        self
    }

    pub fn date_format(mut self, format: impl Into<String>) -> Self {
        self.date_format = format.into();
        self
    }

    pub fn hide_summary(mut self) -> Self {
        self.show_summary = false;
        self
    }

    /// One line of ASCII bar for a task
    pub fn bar_line(&self, bars: &TaskBars) -> String {
        (0..self.bar_width)
            .map(|cell| {
                let mid = (cell as f64 + 0.5) / self.bar_width as f64 * 100.0;
                strongest_at(bars, mid).map_or(' ', glyph)
            })
            .collect()
    }

    fn render_summary(&self, out: &mut String, project: &Project) {
        let summary = ProjectSummary::compute(project);
        out.push('\n');
        out.push_str(&format!(
            "Tasks: {} ({} completed, {} pending)   Progress: {}%   Duration: {} days\n",
            summary.total_tasks,
            summary.completed_tasks,
            summary.pending_tasks,
            summary.average_progress,
            summary.duration_days
        ));
        if summary.off_plan_tasks > 0 {
            out.push_str(&format!("Off plan: {} task(s) marked with *\n", summary.off_plan_tasks));
        }
    }
}

fn glyph(kind: BarKind) -> char {
    match kind {
        BarKind::Planned => '-',
        BarKind::Actual => '=',
        BarKind::Completed => '#',
        BarKind::Overrun => '!',
    }
}

fn rank(kind: BarKind) -> u8 {
    match kind {
        BarKind::Planned => 0,
        BarKind::Actual => 1,
        BarKind::Completed => 2,
        BarKind::Overrun => 3,
    }
}

/// Highest-ranked segment covering `percent`
fn strongest_at(bars: &TaskBars, percent: f64) -> Option<BarKind> {
    bars.segments
        .iter()
        .filter(|s| s.width_percent > 0.0 && s.left_percent <= percent && percent < s.right_percent())
        .map(|s| s.kind)
        .max_by_key(|kind| rank(*kind))
}

impl Renderer for TextRenderer {
    type Output = String;

    fn render(&self, project: &Project, timeline: &Timeline) -> Result<String, RenderError> {
        let mut out = String::new();
        let fmt = self.date_format.as_str();
        let window = &timeline.window;

        out.push_str(&format!("Project: {} ({})\n", project.name, project.id));
        if !project.description.is_empty() {
            out.push_str(&format!("{}\n", project.description));
        }
        out.push_str(&format!(
            "Window: {} - {} ({} days)\n",
            window.start.format(fmt),
            window.end.format(fmt),
            window.total_days
        ));
        out.push('\n');

        if project.tasks.is_empty() {
            out.push_str("No tasks.\n");
            return Ok(out);
        }

        out.push_str(&format!(
            "  {:<8} {:<24} {:<6} {:<11} {:<16} {:<16} {:>5}\n",
            "ID", "Task", "Pri", "Status", "Planned", "Actual", "Prog"
        ));

        let hierarchy = TaskHierarchy::build(&project.tasks);
        let rows = hierarchy.display_order(true);
        for row in &rows {
            let task = row.task;
            let off_plan = timeline.bars_for(&task.id).is_some_and(|b| b.off_plan);
            let marker = if off_plan { '*' } else { ' ' };
            let name = match (row.depth, row.has_children, task.collapsed) {
                (0, true, true) => format!("+ {}", task.name),
                (0, true, false) => format!("- {}", task.name),
                (0, false, _) => task.name.clone(),
                _ => format!("  └ {}", task.name),
            };
            let planned = format!(
                "{} {}d",
                format_date(task.inherited_start_planned.or(task.start_planned), fmt),
                task.shown_duration_planned()
            );
            let actual = match (task.inherited_start_actual.or(task.start_actual), task.shown_duration_actual()) {
                (None, None) => "-".to_string(),
                (start, days) => format!(
                    "{} {}",
                    format_date(start, fmt),
                    days.map_or_else(|| "-".to_string(), |d| format!("{d}d"))
                ),
            };

            out.push_str(&format!(
                "{marker} {:<8} {:<24} {:<6} {:<11} {:<16} {:<16} {:>4}%\n",
                truncate(&task.id, 8),
                truncate(&name, 24),
                task.priority.label(),
                task.status.label(),
                planned,
                actual,
                task.effective_progress()
            ));
        }

        out.push('\n');
        out.push_str(&format!("Timeline ({} = {} days)\n", self.bar_width, window.total_days));
        for row in &rows {
            let Some(bars) = timeline.bars_for(&row.task.id) else {
                continue;
            };
            let indent = if row.depth > 0 { "  " } else { "" };
            let label = truncate(&format!("{indent}{}", row.task.name), 24);
            out.push_str(&format!("  {:<24} |{}|\n", label, self.bar_line(bars)));
        }

        if self.show_summary {
            self.render_summary(&mut out, project);
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use plancast_core::{BarSegment, Task, TimelineConfig};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn bars(segments: Vec<BarSegment>) -> TaskBars {
        TaskBars {
            task_id: "t".into(),
            segments,
            off_plan: false,
        }
    }

    fn seg(kind: BarKind, left: f64, width: f64) -> BarSegment {
        BarSegment {
            kind,
            left_percent: left,
            width_percent: width,
        }
    }

    #[test]
    fn bar_line_layers_segments() {
        let renderer = TextRenderer::new().bar_width(10);
        let line = renderer.bar_line(&bars(vec![
            seg(BarKind::Planned, 0.0, 50.0),
            seg(BarKind::Completed, 0.0, 20.0),
            seg(BarKind::Overrun, 50.0, 10.0),
        ]));
        assert_eq!(line, "##---!    ");
    }

    #[test]
    fn zero_width_segments_are_invisible() {
        let renderer = TextRenderer::new().bar_width(10);
        let line = renderer.bar_line(&bars(vec![seg(BarKind::Planned, 40.0, 0.0)]));
        assert_eq!(line, " ".repeat(10));
    }

    #[test]
    fn renders_table_timeline_and_summary() {
        let mut project = Project::new("project1", "Garden", date(2024, 5, 1));
        project.tasks.push(Task::new("task1", date(2024, 5, 1), 2).name("Beds"));
        project.tasks.push(
            Task::new("task2", date(2024, 5, 1), 3)
                .name("Soil")
                .parent("task1")
                .started(date(2024, 5, 3))
                .progress(50),
        );
        plancast_core::rollup::refresh(&mut project);
        let timeline = Timeline::compute(&project, &TimelineConfig::default());

        let text = TextRenderer::new().render(&project, &timeline).unwrap();
        assert!(text.contains("Project: Garden (project1)"));
        assert!(text.contains("Window: 01/05/2024 - 05/05/2024 (30 days)"));
        assert!(text.contains("- Beds"));
        assert!(text.contains("└ Soil"));
        assert!(text.contains("* task2"));
        assert!(text.contains("Off plan: 1 task(s)"));
        assert!(text.contains("Timeline (50 = 30 days)"));
    }

    #[test]
    fn collapsed_parent_hides_children() {
        let mut project = Project::new("p", "Fold", date(2024, 5, 1));
        let mut parent = Task::new("task1", date(2024, 5, 1), 2).name("Parent");
        parent.collapsed = true;
        project.tasks.push(parent);
        project
            .tasks
            .push(Task::new("task2", date(2024, 5, 1), 2).name("Hidden").parent("task1"));
        let timeline = Timeline::compute(&project, &TimelineConfig::default());

        let text = TextRenderer::new().hide_summary().render(&project, &timeline).unwrap();
        assert!(text.contains("+ Parent"));
        assert!(!text.contains("Hidden"));
        assert!(!text.contains("Tasks:"));
    }

    #[test]
    fn empty_project() {
        let project = Project::new("p", "Empty", date(2024, 5, 1));
        let timeline = Timeline::compute(&project, &TimelineConfig::default());
        let text = TextRenderer::new().render(&project, &timeline).unwrap();
        assert!(text.contains("No tasks."));
    }
}
