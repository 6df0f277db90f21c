//! Console reports for `show`, `project list` and `calendar`.

use chrono::Datelike;
use plancast_core::calendar::{month_agenda, month_spans, SpanKind};
use plancast_core::hierarchy::TaskHierarchy;
use plancast_core::timeline::is_off_plan;
use plancast_core::{MonthWindow, PlannerStore, Project, ProjectSummary, Task, TaskFilter};

/// Summary block plus the filtered task table
pub fn show(project: &Project, filter: &TaskFilter, date_format: &str) -> String {
    let mut out = String::new();
    let summary = ProjectSummary::compute(project);

    out.push_str(&format!("Project: {} ({})\n", project.name, project.id));
    out.push_str(&format!(
        "Tasks: {}   Completed: {}   Pending: {}   Progress: {}%   Completion: {}%   Duration: {} days\n",
        summary.total_tasks,
        summary.completed_tasks,
        summary.pending_tasks,
        summary.average_progress,
        summary.completion_percent,
        summary.duration_days
    ));
    if summary.off_plan_tasks > 0 {
        out.push_str(&format!("Off plan: {}\n", summary.off_plan_tasks));
    }
    out.push('\n');

    let hierarchy = TaskHierarchy::build(&project.tasks);
    let rows: Vec<_> = hierarchy
        .display_order(false)
        .into_iter()
        .filter(|row| filter.matches(row.task))
        .collect();

    if rows.is_empty() {
        let message = if project.tasks.is_empty() {
            "No tasks."
        } else {
            "No matching tasks."
        };
        out.push_str(message);
        out.push('\n');
        return out;
    }
    if !filter.is_empty() {
        out.push_str(&format!("Showing {} of {} tasks\n", rows.len(), project.tasks.len()));
    }

    out.push_str(&format!(
        "  {:<8} {:<28} {:<7} {:<12} {:<12} {:>5} {:<12} {:>5} {:>5}\n",
        "ID", "Task", "Pri", "Status", "Planned", "Days", "Actual", "Days", "Prog"
    ));
    for row in rows {
        let task = row.task;
        let name = if row.depth > 0 {
            format!("  {}", task.name)
        } else {
            task.name.clone()
        };
        out.push_str(&format!(
            "{} {:<8} {:<28} {:<7} {:<12} {:<12} {:>5} {:<12} {:>5} {:>4}%\n",
            if is_off_plan(task) { '*' } else { ' ' },
            task.id,
            name,
            task.priority.label(),
            task.status.label(),
            format_day(task.inherited_start_planned.or(task.start_planned), date_format),
            task.shown_duration_planned(),
            format_day(task.inherited_start_actual.or(task.start_actual), date_format),
            task.shown_duration_actual().map_or_else(|| "-".to_string(), |d| d.to_string()),
            task.effective_progress()
        ));
    }
    out
}

/// One line per project, current one marked with `*`
pub fn project_list(store: &PlannerStore, date_format: &str) -> String {
    let current = store.current_project.as_deref();
    store
        .projects
        .iter()
        .map(|p| {
            let summary = ProjectSummary::compute(p);
            format!(
                "{} {:<10} {:<24} {} tasks, {}% complete, starts {}\n",
                if current == Some(p.id.as_str()) { '*' } else { ' ' },
                p.id,
                p.name,
                summary.total_tasks,
                summary.completion_percent,
                p.start_date.format(date_format)
            )
        })
        .collect()
}

/// Month spans per task, then the tasks active on each busy day
pub fn calendar(project: &Project, month: &MonthWindow) -> String {
    let mut out = String::new();
    out.push_str(&format!("Calendar {} for {} ({})\n", month, project.name, project.id));

    let spans: Vec<(&Task, _)> = project
        .tasks
        .iter()
        .flat_map(|task| month_spans(task, month).into_iter().map(move |span| (task, span)))
        .collect();
    if spans.is_empty() {
        out.push_str("No tasks this month.\n");
        return out;
    }

    out.push('\n');
    for (task, span) in &spans {
        let kind = match span.kind {
            SpanKind::Planned => "planned",
            SpanKind::Actual => "actual",
        };
        out.push_str(&format!(
            "  {:<8} {:<28} {:<7} days {:>2}-{:<2} {}\n",
            task.id,
            task.name,
            kind,
            span.span.start_day,
            span.span.end_day,
            span.priority.label()
        ));
    }

    out.push('\n');
    for day in month_agenda(project, month) {
        if day.task_ids.is_empty() {
            continue;
        }
        out.push_str(&format!(
            "  {} {:02}{}  {}\n",
            day.date.format("%a"),
            day.date.day(),
            if day.weekend { " (weekend)" } else { "" },
            day.task_ids.join(", ")
        ));
    }
    out
}

fn format_day(date: Option<chrono::NaiveDate>, format: &str) -> String {
    date.map_or_else(|| "-".to_string(), |d| d.format(format).to_string())
}
