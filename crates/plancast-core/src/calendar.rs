//! Month views: which tasks run on which day.
//!
//! A task is active on a day when the day falls inside its planned interval
//! or inside its actual interval. Both the per-day agenda and the per-task
//! month spans use that single rule.

use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use crate::interval::{MonthSpan, MonthWindow};
use crate::{Priority, Project, Task, TaskId};

/// Which interval a month span was taken from
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpanKind {
    Planned,
    Actual,
}

/// A task's interval clamped to one month
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskMonthSpan {
    pub task_id: TaskId,
    pub kind: SpanKind,
    pub priority: Priority,
    #[serde(flatten)]
    pub span: MonthSpan,
}

/// Where a day sits inside a span, for drawing continuous bars
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SpanEdge {
    Single,
    Start,
    Middle,
    End,
}

impl TaskMonthSpan {
    pub fn covers(&self, day: u32) -> bool {
        self.span.start_day <= day && day <= self.span.end_day
    }

    /// Position of `day` in the span, `None` outside it
    pub fn edge(&self, day: u32) -> Option<SpanEdge> {
        if !self.covers(day) {
            return None;
        }
        let MonthSpan { start_day, end_day } = self.span;
        Some(match (day == start_day, day == end_day) {
            (true, true) => SpanEdge::Single,
            (true, false) => SpanEdge::Start,
            (false, true) => SpanEdge::End,
            (false, false) => SpanEdge::Middle,
        })
    }
}

/// One day of a month agenda
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgendaDay {
    pub date: NaiveDate,
    pub weekend: bool,
    pub task_ids: Vec<TaskId>,
}

/// True when `date` is inside the planned or the actual interval
pub fn is_active_on(task: &Task, date: NaiveDate) -> bool {
    let planned = task.planned_interval().is_some_and(|iv| iv.contains(date));
    planned || task.actual_interval().is_some_and(|iv| iv.contains(date))
}

/// Tasks active on `date`, in task order
pub fn tasks_active_on(project: &Project, date: NaiveDate) -> Vec<&Task> {
    project
        .tasks
        .iter()
        .filter(|task| is_active_on(task, date))
        .collect()
}

/// Planned and actual spans of a task within `month`
pub fn month_spans(task: &Task, month: &MonthWindow) -> Vec<TaskMonthSpan> {
    let candidates = [
        (SpanKind::Planned, task.planned_interval()),
        (SpanKind::Actual, task.actual_interval()),
    ];
    candidates
        .into_iter()
        .filter_map(|(kind, iv)| {
            let span = iv?.clamp_to_month(month)?;
            Some(TaskMonthSpan {
                task_id: task.id.clone(),
                kind,
                priority: task.priority,
                span,
            })
        })
        .collect()
}

/// Every day of `month` with the tasks active on it
pub fn month_agenda(project: &Project, month: &MonthWindow) -> Vec<AgendaDay> {
    (1..=month.days_in_month())
        .filter_map(|day| month.day(day))
        .map(|date| AgendaDay {
            date,
            weekend: matches!(date.weekday(), Weekday::Sat | Weekday::Sun),
            task_ids: tasks_active_on(project, date)
                .into_iter()
                .map(|t| t.id.clone())
                .collect(),
        })
        .collect()
}
