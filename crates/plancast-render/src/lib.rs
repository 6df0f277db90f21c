//! # plancast-render
//!
//! Rendering backends for plancast timelines.
//!
//! This crate provides:
//! - Plain text tables with ASCII timeline bars (`TextRenderer`)
//! - Standalone HTML timeline pages (`HtmlTimelineRenderer`)
//! - Pure SVG timeline charts (`SvgTimelineRenderer`)
//! - A progress audit that repairs divergent progress cells in rendered HTML
//!
//! Every renderer draws bars from the geometry in [`plancast_core::Timeline`];
//! none of them recompute positions.
//!
//! ## Example
//!
//! ```rust,ignore
//! use plancast_core::{Renderer, Timeline, TimelineConfig};
//! use plancast_render::{HtmlTimelineRenderer, SvgTimelineRenderer, TextRenderer};
//!
//! let timeline = Timeline::compute(&project, &TimelineConfig::default());
//!
//! // Console table
//! let text = TextRenderer::new().render(&project, &timeline)?;
//!
//! // Standalone HTML page
//! let html = HtmlTimelineRenderer::new().render(&project, &timeline)?;
//!
//! // Pure SVG output
//! let svg = SvgTimelineRenderer::default().render(&project, &timeline)?;
//! ```

pub mod audit;
pub mod html;
pub mod text;

pub use audit::{AuditOutcome, ProgressAudit};
pub use html::{HtmlTimelineRenderer, TimelineTheme};
pub use text::TextRenderer;

use chrono::NaiveDate;
use plancast_core::hierarchy::{DisplayRow, TaskHierarchy};
use plancast_core::{BarKind, BarSegment, Project, RenderError, Renderer, Timeline};
use svg::node::element::{Group, Line, Rectangle, Text};
use svg::Document;

/// SVG timeline renderer configuration
#[derive(Clone, Debug)]
pub struct SvgTimelineRenderer {
    /// Width of the chart area (excluding labels) in pixels
    pub chart_width: u32,
    /// Height per task row in pixels
    pub row_height: u32,
    /// Width of the label column in pixels
    pub label_width: u32,
    /// Header height in pixels
    pub header_height: u32,
    /// Padding around the chart
    pub padding: u32,
    pub planned_color: String,
    pub actual_color: String,
    pub completed_color: String,
    pub overrun_color: String,
    /// Background color
    pub background_color: String,
    /// Grid line color
    pub grid_color: String,
    /// Text color
    pub text_color: String,
    /// Font family
    pub font_family: String,
    /// Font size in pixels
    pub font_size: u32,
}

impl Default for SvgTimelineRenderer {
    fn default() -> Self {
        Self {
            chart_width: 800,
            row_height: 28,
            label_width: 200,
            header_height: 50,
            padding: 20,
            planned_color: "#95a5a6".into(),
            actual_color: "#3498db".into(),
            completed_color: "#27ae60".into(),
            overrun_color: "#e74c3c".into(),
            background_color: "#ffffff".into(),
            grid_color: "#ecf0f1".into(),
            text_color: "#2c3e50".into(),
            font_family: "system-ui, -apple-system, sans-serif".into(),
            font_size: 12,
        }
    }
}

impl SvgTimelineRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Configure chart width
    pub fn chart_width(mut self, width: u32) -> Self {
        self.chart_width = width;
        self
    }

    /// Configure row height
    pub fn row_height(mut self, height: u32) -> Self {
        self.row_height = height;
        self
    }

    fn total_width(&self) -> u32 {
        self.padding * 2 + self.label_width + self.chart_width
    }

    fn total_height(&self, rows: usize) -> u32 {
        self.padding * 2 + self.header_height + (rows as u32 * self.row_height)
    }

    /// Convert a window percentage to an x position
    fn percent_to_x(&self, percent: f64) -> f64 {
        f64::from(self.padding + self.label_width) + percent / 100.0 * f64::from(self.chart_width)
    }

    fn color_for(&self, kind: BarKind) -> &str {
        match kind {
            BarKind::Planned => &self.planned_color,
            BarKind::Actual => &self.actual_color,
            BarKind::Completed => &self.completed_color,
            BarKind::Overrun => &self.overrun_color,
        }
    }

    fn render_header(&self, timeline: &Timeline) -> Group {
        let mut group = Group::new().set("class", "header");

        let header_bg = Rectangle::new()
            .set("x", self.padding)
            .set("y", self.padding)
            .set("width", self.label_width + self.chart_width)
            .set("height", self.header_height)
            .set("fill", "#f8f9fa");
        group = group.add(header_bg);

        let window = &timeline.window;
        let interval_days = label_interval(window.total_days);
        let mut offset = 0;
        while offset <= window.total_days {
            let Some(day) = window.start.checked_add_days(chrono::Days::new(u64::from(offset))) else {
                break;
            };
            let x = self.percent_to_x(window.offset_percent(day));

            let tick = Line::new()
                .set("x1", x)
                .set("y1", self.padding + self.header_height - 10)
                .set("x2", x)
                .set("y2", self.padding + self.header_height)
                .set("stroke", self.text_color.as_str())
                .set("stroke-width", 1);
            group = group.add(tick);

            let label = Text::new(day.format("%b %d").to_string())
                .set("x", x)
                .set("y", self.padding + self.header_height - 15)
                .set("font-family", self.font_family.as_str())
                .set("font-size", self.font_size.saturating_sub(1))
                .set("fill", self.text_color.as_str())
                .set("text-anchor", "middle");
            group = group.add(label);

            offset += interval_days;
        }

        let month_text = Text::new(window.start.format("%B %Y").to_string())
            .set("x", self.padding + self.label_width + self.chart_width / 2)
            .set("y", self.padding + 18)
            .set("font-family", self.font_family.as_str())
            .set("font-size", self.font_size + 2)
            .set("font-weight", "bold")
            .set("fill", self.text_color.as_str())
            .set("text-anchor", "middle");
        group.add(month_text)
    }

    fn render_grid(&self, rows: usize) -> Group {
        let mut group = Group::new().set("class", "grid");
        let chart_top = self.padding + self.header_height;

        for i in 0..=rows {
            let y = chart_top + (i as u32 * self.row_height);
            let line = Line::new()
                .set("x1", self.padding)
                .set("y1", y)
                .set("x2", self.padding + self.label_width + self.chart_width)
                .set("y2", y)
                .set("stroke", self.grid_color.as_str())
                .set("stroke-width", 1);
            group = group.add(line);
        }
        group
    }

    fn render_row(&self, row: &DisplayRow<'_>, index: usize, timeline: &Timeline) -> Group {
        let task = row.task;
        let mut group = Group::new()
            .set("class", "task")
            .set("data-task-id", task.id.as_str());

        let y = self.padding + self.header_height + (index as u32 * self.row_height);
        let bar_height = (f64::from(self.row_height) * 0.6) as u32;
        let bar_y = y + (self.row_height - bar_height) / 2;

        let bars = timeline.bars_for(&task.id);
        let off_plan = bars.is_some_and(|b| b.off_plan);
        let indent = if row.depth > 0 { 20 } else { 8 };
        let label = Text::new(truncate(&task.name, 26))
            .set("x", self.padding + indent)
            .set("y", y + self.row_height / 2 + 4)
            .set("font-family", self.font_family.as_str())
            .set("font-size", self.font_size)
            .set("font-weight", if row.has_children { "bold" } else { "normal" })
            .set(
                "fill",
                if off_plan {
                    self.overrun_color.as_str()
                } else {
                    self.text_color.as_str()
                },
            );
        group = group.add(label);

        for segment in bars.map(|b| b.segments.as_slice()).unwrap_or_default() {
            group = group.add(self.render_segment(segment, bar_y, bar_height));
        }
        group
    }

    fn render_segment(&self, segment: &BarSegment, bar_y: u32, bar_height: u32) -> Rectangle {
        let x = self.percent_to_x(segment.left_percent);
        let width = segment.width_percent / 100.0 * f64::from(self.chart_width);
        // Actual and completed bars sit in the lower half so the planned bar stays visible
        let (y, height) = match segment.kind {
            BarKind::Planned => (bar_y, bar_height),
            _ => (bar_y + bar_height / 2, bar_height / 2),
        };
        let mut rect = Rectangle::new()
            .set("class", segment.kind.as_str())
            .set("x", x)
            .set("y", y)
            .set("width", width)
            .set("height", height)
            .set("rx", 2)
            .set("fill", self.color_for(segment.kind));
        if segment.kind == BarKind::Planned {
            rect = rect.set("fill-opacity", 0.5);
        }
        rect
    }

    fn render_legend(&self, y_offset: u32) -> Group {
        let mut group = Group::new().set("class", "legend");
        let y = f64::from(y_offset) + 15.0;
        let box_size = 12.0;
        let spacing = 110.0;

        let entries = [
            (BarKind::Planned, "Planned"),
            (BarKind::Actual, "Actual"),
            (BarKind::Completed, "Completed"),
            (BarKind::Overrun, "Off plan"),
        ];
        for (i, (kind, name)) in entries.into_iter().enumerate() {
            let x = f64::from(self.padding) + spacing * i as f64;
            let swatch = Rectangle::new()
                .set("x", x)
                .set("y", y - box_size + 2.0)
                .set("width", box_size)
                .set("height", box_size)
                .set("rx", 2)
                .set("fill", self.color_for(kind));
            let label = Text::new(name)
                .set("x", x + box_size + 5.0)
                .set("y", y)
                .set("font-family", self.font_family.as_str())
                .set("font-size", self.font_size.saturating_sub(1))
                .set("fill", self.text_color.as_str());
            group = group.add(swatch).add(label);
        }
        group
    }
}

impl Renderer for SvgTimelineRenderer {
    type Output = String;

    fn render(&self, project: &Project, timeline: &Timeline) -> Result<String, RenderError> {
        if project.tasks.is_empty() {
            return Err(RenderError::InvalidData("No tasks to render".into()));
        }

        let hierarchy = TaskHierarchy::build(&project.tasks);
        let rows = hierarchy.display_order(false);

        let width = self.total_width();
        let height = self.total_height(rows.len()) + 30;

        let mut document = Document::new()
            .set("width", width)
            .set("height", height)
            .set("viewBox", (0, 0, width, height))
            .set("xmlns", "http://www.w3.org/2000/svg");

        let background = Rectangle::new()
            .set("width", "100%")
            .set("height", "100%")
            .set("fill", self.background_color.as_str());
        document = document.add(background);

        let title = Text::new(project.name.as_str())
            .set("x", self.padding)
            .set("y", self.padding + 15)
            .set("font-family", self.font_family.as_str())
            .set("font-size", self.font_size + 4)
            .set("font-weight", "bold")
            .set("fill", self.text_color.as_str());
        document = document.add(title);

        document = document.add(self.render_grid(rows.len()));
        document = document.add(self.render_header(timeline));

        for (index, row) in rows.iter().enumerate() {
            document = document.add(self.render_row(row, index, timeline));
        }

        let legend_y = self.padding + self.header_height + (rows.len() as u32 * self.row_height) + 10;
        document = document.add(self.render_legend(legend_y));

        let mut output = Vec::new();
        svg::write(&mut output, &document)
            .map_err(|e| RenderError::Format(format!("Failed to write SVG: {}", e)))?;

        String::from_utf8(output).map_err(|e| RenderError::Format(format!("Invalid UTF-8: {}", e)))
    }
}

/// Days between header labels for a window of `total_days`
fn label_interval(total_days: u32) -> u32 {
    if total_days <= 14 {
        1
    } else if total_days <= 60 {
        7
    } else if total_days <= 180 {
        14
    } else {
        30
    }
}

/// Format an optional date, `-` when absent
pub(crate) fn format_date(date: Option<NaiveDate>, format: &str) -> String {
    date.map_or_else(|| "-".to_string(), |d| d.format(format).to_string())
}

/// HTML-escape a string
pub(crate) fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Truncate a string with ellipsis
pub(crate) fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        format!(
            "{}…",
            s.chars().take(max.saturating_sub(1)).collect::<String>()
        )
    }
}
