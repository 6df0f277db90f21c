//! Timeline bar geometry.
//!
//! Bars are positioned as percentages of a project window that spans every
//! planned and actual interval plus the project start date. The window is
//! never shorter than [`TimelineConfig::min_window_days`], and a bar's left
//! edge plus width never passes [`TimelineConfig::max_extent_percent`].
//!
//! Every task, parent or leaf, is placed from its own planned and actual
//! fields. Tasks whose planned start could not be parsed get no segments.

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::interval::days_between;
use crate::{Project, Task, TaskId};

// ============================================================================
// Configuration
// ============================================================================

/// Window and extent limits for bar geometry
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimelineConfig {
    /// Shortest window, in days
    pub min_window_days: u32,
    /// Upper bound for `left + width` of planned and actual bars
    pub max_extent_percent: f64,
}

impl Default for TimelineConfig {
    fn default() -> Self {
        Self {
            min_window_days: 30,
            max_extent_percent: 95.0,
        }
    }
}

// ============================================================================
// Window
// ============================================================================

/// Date range the bars are laid out against
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectWindow {
    /// Earliest start
    pub start: NaiveDate,
    /// Latest end, inclusive
    pub end: NaiveDate,
    /// Days used as the 100% reference
    pub total_days: u32,
}

impl ProjectWindow {
    /// Compute the window for a project
    pub fn compute(project: &Project, config: &TimelineConfig) -> Self {
        let mut min = project.start_date;
        // Exclusive end: start + duration
        let mut max_exclusive = project.start_date;

        for task in &project.tasks {
            if let Some(start) = task.start_planned {
                min = min.min(start);
                max_exclusive = max_exclusive.max(add_days(start, task.duration_planned));
            }
            if let Some(start) = task.start_actual {
                let days = task.actual_duration().unwrap_or(task.duration_planned);
                min = min.min(start);
                max_exclusive = max_exclusive.max(add_days(start, days));
            }
        }

        let span = u32::try_from(days_between(min, max_exclusive)).unwrap_or(u32::MAX);
        let end = max_exclusive.pred_opt().unwrap_or(max_exclusive).max(min);

        Self {
            start: min,
            end,
            total_days: span.max(config.min_window_days).max(1),
        }
    }

    /// Offset of `date` from the window start, as a percentage of `total_days`
    pub fn offset_percent(&self, date: NaiveDate) -> f64 {
        self.days_percent(days_between(self.start, date))
    }

    /// Length of `days` as a percentage of `total_days`
    pub fn days_percent(&self, days: i64) -> f64 {
        days as f64 / f64::from(self.total_days) * 100.0
    }
}

fn add_days(date: NaiveDate, days: u32) -> NaiveDate {
    date.checked_add_days(Days::new(u64::from(days)))
        .unwrap_or(NaiveDate::MAX)
}

// ============================================================================
// Segments
// ============================================================================

/// Kind of bar segment
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BarKind {
    Planned,
    Actual,
    Completed,
    Overrun,
}

impl BarKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BarKind::Planned => "planned",
            BarKind::Actual => "actual",
            BarKind::Completed => "completed",
            BarKind::Overrun => "overrun",
        }
    }
}

/// One horizontal bar, in percent of the window
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BarSegment {
    pub kind: BarKind,
    pub left_percent: f64,
    pub width_percent: f64,
}

impl BarSegment {
    pub fn right_percent(&self) -> f64 {
        self.left_percent + self.width_percent
    }
}

/// All segments for one task, in drawing order
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskBars {
    pub task_id: TaskId,
    pub segments: Vec<BarSegment>,
    pub off_plan: bool,
}

impl TaskBars {
    pub fn segment(&self, kind: BarKind) -> Option<&BarSegment> {
        self.segments.iter().find(|s| s.kind == kind)
    }

    pub fn planned(&self) -> Option<&BarSegment> {
        self.segment(BarKind::Planned)
    }

    pub fn actual(&self) -> Option<&BarSegment> {
        self.segment(BarKind::Actual)
    }

    pub fn completed(&self) -> Option<&BarSegment> {
        self.segment(BarKind::Completed)
    }

    pub fn overrun(&self) -> Option<&BarSegment> {
        self.segment(BarKind::Overrun)
    }
}

/// Started, and either later than planned or running longer than planned
pub fn is_off_plan(task: &Task) -> bool {
    let Some(actual) = task.start_actual else {
        return false;
    };
    let late_start = task.start_planned.is_some_and(|planned| actual > planned);
    let long_run = task
        .actual_duration()
        .is_some_and(|days| days > task.duration_planned);
    late_start || long_run
}

/// Left and width of a bar starting at `start` lasting `days`
fn place(window: &ProjectWindow, config: &TimelineConfig, start: NaiveDate, days: u32) -> (f64, f64) {
    let left = window.offset_percent(start).max(0.0);
    let width = window
        .days_percent(i64::from(days))
        .min(config.max_extent_percent - left)
        .max(0.0);
    (left, width)
}

/// Compute the segments for one task
pub fn task_bars(task: &Task, window: &ProjectWindow, config: &TimelineConfig) -> TaskBars {
    let mut segments = Vec::with_capacity(4);
    let off_plan = is_off_plan(task);

    let Some(planned_start) = task.start_planned else {
        tracing::warn!(task = %task.id, "task has no planned start; no bars drawn");
        return TaskBars {
            task_id: task.id.clone(),
            segments,
            off_plan,
        };
    };

    let progress = f64::from(task.effective_progress());
    let (planned_left, planned_width) = place(window, config, planned_start, task.duration_planned);
    segments.push(BarSegment {
        kind: BarKind::Planned,
        left_percent: planned_left,
        width_percent: planned_width,
    });

    match task.start_actual {
        Some(actual_start) => {
            let days = task.actual_duration().unwrap_or(task.duration_planned);
            let (actual_left, actual_width) = place(window, config, actual_start, days);
            segments.push(BarSegment {
                kind: BarKind::Actual,
                left_percent: actual_left,
                width_percent: actual_width,
            });

            let completed_width = actual_width * (progress / 100.0);
            if progress > 0.0 {
                segments.push(BarSegment {
                    kind: BarKind::Completed,
                    left_percent: actual_left,
                    width_percent: completed_width,
                });
            }

            let moved = actual_left != planned_left || actual_width != planned_width;
            if progress > 0.0 && moved {
                let left = planned_left + planned_width;
                let overrun = (completed_width - planned_width).max(0.0).min(100.0 - left);
                if overrun > 0.0 {
                    segments.push(BarSegment {
                        kind: BarKind::Overrun,
                        left_percent: left,
                        width_percent: overrun,
                    });
                }
            }
        }
        None => {
            if progress > 0.0 {
                segments.push(BarSegment {
                    kind: BarKind::Completed,
                    left_percent: planned_left,
                    width_percent: planned_width * (progress / 100.0),
                });
            }
        }
    }

    TaskBars {
        task_id: task.id.clone(),
        segments,
        off_plan,
    }
}

// ============================================================================
// Timeline
// ============================================================================

/// Window plus bars for every task, in task order
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Timeline {
    pub window: ProjectWindow,
    pub bars: Vec<TaskBars>,
}

impl Timeline {
    pub fn compute(project: &Project, config: &TimelineConfig) -> Self {
        let window = ProjectWindow::compute(project, config);
        let bars = project
            .tasks
            .iter()
            .map(|task| task_bars(task, &window, config))
            .collect();
        Self { window, bars }
    }

    /// Bars for a task
    pub fn bars_for(&self, task_id: &str) -> Option<&TaskBars> {
        self.bars.iter().find(|b| b.task_id == task_id)
    }

    pub fn off_plan_count(&self) -> usize {
        self.bars.iter().filter(|b| b.off_plan).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-2
    }

    #[test]
    fn window_covers_project_start_and_all_intervals() {
        let mut project = Project::new("p", "Window", date(2024, 1, 10));
        project.tasks.push(Task::new("a", date(2024, 1, 5), 3));
        project
            .tasks
            .push(Task::new("b", date(2024, 1, 20), 5).started(date(2024, 1, 22)).actual_days(40));

        let window = ProjectWindow::compute(&project, &TimelineConfig::default());
        assert_eq!(window.start, date(2024, 1, 5));
        // 2024-01-22 + 40 days, exclusive
        assert_eq!(window.end, date(2024, 3, 1));
        assert_eq!(window.total_days, 57);
    }

    #[test]
    fn window_has_a_floor() {
        let mut project = Project::new("p", "Short", date(2024, 1, 1));
        project.tasks.push(Task::new("a", date(2024, 1, 1), 2));
        let window = ProjectWindow::compute(&project, &TimelineConfig::default());
        assert_eq!(window.total_days, 30);

        let config = TimelineConfig {
            min_window_days: 10,
            ..TimelineConfig::default()
        };
        assert_eq!(ProjectWindow::compute(&project, &config).total_days, 10);
    }

    #[test]
    fn planned_bar_in_thirty_day_window() {
        let mut project = Project::new("p", "Jan", date(2024, 1, 1));
        project.tasks.push(Task::new("t", date(2024, 1, 5), 3));
        project.tasks.push(Task::new("end", date(2024, 1, 30), 1));

        let timeline = Timeline::compute(&project, &TimelineConfig::default());
        assert_eq!(timeline.window.start, date(2024, 1, 1));
        assert_eq!(timeline.window.end, date(2024, 1, 30));
        assert_eq!(timeline.window.total_days, 30);

        let planned = *timeline.bars_for("t").unwrap().planned().unwrap();
        assert!(approx(planned.left_percent, 13.33));
        assert!((planned.width_percent - 10.0).abs() < EPS);
    }

    #[test]
    fn planned_bar_never_passes_extent_cap() {
        let mut project = Project::new("p", "Cap", date(2024, 1, 1));
        for (i, (offset, days)) in [(0, 30), (20, 30), (28, 2), (29, 1), (0, 1)].into_iter().enumerate() {
            project.tasks.push(Task::new(
                format!("t{i}"),
                date(2024, 1, 1) + chrono::Duration::days(offset),
                days,
            ));
        }

        let config = TimelineConfig::default();
        let timeline = Timeline::compute(&project, &config);
        for bars in &timeline.bars {
            let planned = bars.planned().unwrap();
            assert!(planned.width_percent >= 0.0);
            assert!(planned.width_percent <= config.max_extent_percent - planned.left_percent + EPS);
            assert!(planned.right_percent() <= 100.0 + EPS);
        }
    }

    #[test]
    fn completed_over_planned_without_actual_start() {
        let mut project = Project::new("p", "Plan", date(2024, 1, 1));
        project.tasks.push(Task::new("t", date(2024, 1, 1), 6).progress(50));
        project.tasks.push(Task::new("idle", date(2024, 1, 1), 6));

        let timeline = Timeline::compute(&project, &TimelineConfig::default());
        let bars = timeline.bars_for("t").unwrap();
        assert_eq!(bars.segments.len(), 2);
        let completed = bars.completed().unwrap();
        assert!((completed.width_percent - 10.0).abs() < EPS);
        assert_eq!(completed.left_percent, 0.0);

        let idle = timeline.bars_for("idle").unwrap();
        assert_eq!(idle.segments.len(), 1);
    }

    #[test]
    fn late_actual_start_produces_overrun() {
        let mut project = Project::new("p", "Late", date(2024, 1, 1));
        project.tasks.push(
            Task::new("t", date(2024, 1, 1), 3)
                .started(date(2024, 1, 4))
                .actual_days(9)
                .progress(100),
        );

        let timeline = Timeline::compute(&project, &TimelineConfig::default());
        let bars = timeline.bars_for("t").unwrap();
        let kinds: Vec<BarKind> = bars.segments.iter().map(|s| s.kind).collect();
        assert_eq!(
            kinds,
            [BarKind::Planned, BarKind::Actual, BarKind::Completed, BarKind::Overrun]
        );

        let planned = bars.planned().unwrap();
        let overrun = bars.overrun().unwrap();
        assert!((overrun.left_percent - planned.right_percent()).abs() < EPS);
        // completed 30% - planned 10%
        assert!((overrun.width_percent - 20.0).abs() < EPS);
        assert!(bars.off_plan);
    }

    #[test]
    fn actual_matching_plan_has_no_overrun() {
        let mut project = Project::new("p", "OnPlan", date(2024, 1, 1));
        project.tasks.push(
            Task::new("t", date(2024, 1, 2), 4)
                .started(date(2024, 1, 2))
                .progress(100),
        );
        let timeline = Timeline::compute(&project, &TimelineConfig::default());
        let bars = timeline.bars_for("t").unwrap();
        assert!(bars.overrun().is_none());
        assert!(!bars.off_plan);
        assert_eq!(bars.completed().unwrap().width_percent, bars.actual().unwrap().width_percent);
    }

    #[test]
    fn full_progress_fills_bar_exactly() {
        let mut project = Project::new("p", "Thirds", date(2024, 1, 1));
        project.tasks.push(Task::new("plan", date(2024, 1, 2), 4).progress(100));
        project.tasks.push(
            Task::new("run", date(2024, 1, 2), 4)
                .started(date(2024, 1, 5))
                .progress(100),
        );
        let timeline = Timeline::compute(&project, &TimelineConfig::default());

        let plan = timeline.bars_for("plan").unwrap();
        assert_eq!(plan.completed().unwrap().width_percent, plan.planned().unwrap().width_percent);
        let run = timeline.bars_for("run").unwrap();
        assert_eq!(run.completed().unwrap().width_percent, run.actual().unwrap().width_percent);
    }

    #[test]
    fn zero_progress_with_actual_start_has_no_completed_bar() {
        let mut project = Project::new("p", "Zero", date(2024, 1, 1));
        project
            .tasks
            .push(Task::new("t", date(2024, 1, 1), 4).started(date(2024, 1, 3)));
        let timeline = Timeline::compute(&project, &TimelineConfig::default());
        let bars = timeline.bars_for("t").unwrap();
        assert!(bars.actual().is_some());
        assert!(bars.completed().is_none());
        assert!(bars.overrun().is_none());
    }

    #[test]
    fn off_plan_rules() {
        let planned = date(2024, 2, 1);
        let late = Task::new("late", planned, 5).started(date(2024, 2, 3));
        let on_time = Task::new("on", planned, 5).started(planned).actual_days(5);
        let long = Task::new("long", planned, 5).started(planned).actual_days(6);
        let early = Task::new("early", planned, 5).started(date(2024, 1, 30));
        let not_started = Task::new("none", planned, 5);
        let long_unstarted = Task::new("unstarted", planned, 5).actual_days(9);

        assert!(is_off_plan(&late));
        assert!(!is_off_plan(&on_time));
        assert!(is_off_plan(&long));
        assert!(!is_off_plan(&early));
        assert!(!is_off_plan(&not_started));
        assert!(!is_off_plan(&long_unstarted));
    }

    #[test]
    fn task_without_planned_start_is_excluded() {
        let mut project = Project::new("p", "Broken", date(2024, 1, 1));
        let mut broken = Task::new("broken", date(2023, 1, 1), 3);
        broken.start_planned = None;
        project.tasks.push(broken);
        project.tasks.push(Task::new("ok", date(2024, 1, 2), 3));

        let timeline = Timeline::compute(&project, &TimelineConfig::default());
        assert_eq!(timeline.window.start, date(2024, 1, 1));
        assert!(timeline.bars_for("broken").unwrap().segments.is_empty());
        assert_eq!(timeline.bars.len(), 2);
    }

    #[test]
    fn segments_serialize_camel_case() {
        let segment = BarSegment {
            kind: BarKind::Overrun,
            left_percent: 12.5,
            width_percent: 3.0,
        };
        let json = serde_json::to_value(segment).unwrap();
        assert_eq!(json["kind"], "overrun");
        assert_eq!(json["leftPercent"], 12.5);
    }
}
