//! Progress audit for rendered HTML.
//!
//! Scans progress cells (a `progress-bar` holding a `progress-fill`, followed
//! by a `progress-text` span), pairs each rendered value with the declared
//! `data-progress` value and hands the pairs to
//! [`plancast_core::repair_progress`]. Divergent numbers are rewritten in
//! place; the rest of the markup is left byte-for-byte untouched.
//!
//! `data-progress` may sit on the bar, the fill or the text span. A cell
//! without it falls back to its text value.

use std::ops::Range;

use plancast_core::{repair_progress, ProgressPair, RenderError, RepairReport};
use regex::{Captures, Regex};
use tracing::debug;

/// Result of auditing a document
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuditOutcome {
    /// The document with divergent values rewritten
    pub html: String,
    pub report: RepairReport,
    /// Progress cells found
    pub cells: usize,
}

/// Compiled matchers for progress cells
#[derive(Clone, Debug)]
pub struct ProgressAudit {
    cell: Regex,
    width: Regex,
    declared: Regex,
    task_id: Regex,
}

/// Location of the rendered numbers of one cell
struct CellSpans {
    width: Option<Range<usize>>,
    text: Range<usize>,
}

impl ProgressAudit {
    pub fn new() -> Result<Self, RenderError> {
        let compile = |pattern: &str| {
            Regex::new(pattern).map_err(|e| RenderError::Format(format!("bad audit pattern: {e}")))
        };
        Ok(Self {
            cell: compile(
                r#"(?s)<div class="progress-bar"(?P<bar>[^>]*)>\s*<div class="progress-fill"(?P<fill>[^>]*)>\s*</div>\s*</div>\s*<span class="progress-text"(?P<span>[^>]*)>\s*(?P<text>\d+)%"#,
            )?,
            width: compile(r"width:\s*(\d+(?:\.\d+)?)%")?,
            declared: compile(r#"data-progress="(\d+)""#)?,
            task_id: compile(r#"data-task-id="([^"]*)""#)?,
        })
    }

    fn declared_value(&self, caps: &Captures<'_>) -> Option<u8> {
        ["bar", "fill", "span"]
            .into_iter()
            .filter_map(|group| caps.name(group))
            .find_map(|m| self.declared.captures(m.as_str()))
            .and_then(|c| c[1].parse().ok())
    }

    /// Collect (declared, rendered) pairs and where each rendered value lives
    fn scan(&self, html: &str) -> (Vec<ProgressPair>, Vec<CellSpans>) {
        let mut pairs = Vec::new();
        let mut spans = Vec::new();

        for (index, caps) in self.cell.captures_iter(html).enumerate() {
            let (Some(fill), Some(text)) = (caps.name("fill"), caps.name("text")) else {
                continue;
            };
            let label = caps
                .name("bar")
                .and_then(|m| self.task_id.captures(m.as_str()))
                .map_or_else(|| format!("cell {index}"), |c| c[1].to_string());

            let text_value = parse_percent(text.as_str());
            let declared = self.declared_value(&caps).unwrap_or_else(|| {
                debug!(cell = %label, "no data-progress, using text value");
                text_value
            });

            let width = self.width.captures(fill.as_str()).and_then(|c| c.get(1)).map(|m| {
                let range = fill.start() + m.start()..fill.start() + m.end();
                pairs.push(ProgressPair::new(format!("{label} bar"), declared, parse_percent(m.as_str())));
                range
            });
            pairs.push(ProgressPair::new(format!("{label} text"), declared, text_value));

            spans.push(CellSpans {
                width,
                text: text.range(),
            });
        }
        (pairs, spans)
    }

    /// Pairs found in `html`, without repairing anything
    pub fn pairs(&self, html: &str) -> Vec<ProgressPair> {
        self.scan(html).0
    }

    /// Repair every divergent cell
    pub fn run(&self, html: &str) -> AuditOutcome {
        let (mut pairs, spans) = self.scan(html);
        let report = repair_progress(pairs.iter_mut());

        let mut values = pairs.iter().map(|p| p.rendered);
        let mut out = String::with_capacity(html.len());
        let mut last = 0;
        for cell in &spans {
            let ranges = cell.width.iter().chain(std::iter::once(&cell.text));
            for range in ranges {
                let Some(value) = values.next() else { break };
                let value = value.to_string();
                if html[range.clone()] != value {
                    out.push_str(&html[last..range.start]);
                    out.push_str(&value);
                    last = range.end;
                }
            }
        }
        out.push_str(&html[last..]);

        AuditOutcome {
            html: out,
            report,
            cells: spans.len(),
        }
    }
}

/// Parse a rendered percentage, rounding fractions and saturating at 255
fn parse_percent(raw: &str) -> u8 {
    raw.parse::<f64>()
        .map(|v| v.round().clamp(0.0, 255.0) as u8)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn cell(declared: u8, width: &str, text: u8) -> String {
        format!(
            r#"<td><div class="progress-bar" data-task-id="task1" data-progress="{declared}"><div class="progress-fill" style="width: {width}%;"></div></div><span class="progress-text">{text}%</span></td>"#
        )
    }

    #[test]
    fn divergent_width_is_rewritten() {
        let audit = ProgressAudit::new().unwrap();
        let outcome = audit.run(&cell(42, "37", 42));
        assert_eq!(outcome.html, cell(42, "42", 42));
        assert_eq!(outcome.cells, 1);
        assert_eq!(outcome.report, RepairReport { checked: 2, repaired: 1 });
    }

    #[test]
    fn both_representations_follow_declared_value() {
        let audit = ProgressAudit::new().unwrap();
        let outcome = audit.run(&cell(80, "12.5", 60));
        assert_eq!(outcome.html, cell(80, "80", 80));
        assert_eq!(outcome.report.repaired, 2);
    }

    #[test]
    fn second_pass_changes_nothing() {
        let audit = ProgressAudit::new().unwrap();
        let first = audit.run(&format!("{}\n{}", cell(42, "37", 42), cell(10, "10", 10)));
        let second = audit.run(&first.html);
        assert!(second.report.is_clean());
        assert_eq!(second.html, first.html);
        assert_eq!(second.cells, 2);
    }

    #[test]
    fn browser_markup_with_fill_attribute() {
        let html = r#"<div class="progress-container dynamic-progress"><div class="progress-content">
    <div class="progress-bar">
        <div class="progress-fill" data-progress="55" style="width: 50%"></div>
    </div>
    <span class="progress-text">50% 🔄</span>
</div></div>"#;
        let audit = ProgressAudit::new().unwrap();
        let outcome = audit.run(html);
        assert_eq!(outcome.report.repaired, 2);
        assert!(outcome.html.contains(r#"style="width: 55%""#));
        assert!(outcome.html.contains("55% 🔄"));
    }

    #[test]
    fn missing_declared_value_trusts_text() {
        let html = r#"<div class="progress-bar"><div class="progress-fill" style="width: 30%"></div></div><span class="progress-text">35%</span>"#;
        let audit = ProgressAudit::new().unwrap();
        let pairs = audit.pairs(html);
        assert_eq!(pairs.len(), 2);
        assert_eq!(pairs[0].declared, 35);
        assert_eq!(pairs[0].label, "cell 0 bar");

        let outcome = audit.run(html);
        assert!(outcome.html.contains("width: 35%"));
    }

    #[test]
    fn unrelated_markup_is_untouched() {
        let html = "<p>width: 12%</p><span class=\"progress-text\">40%</span>";
        let outcome = ProgressAudit::new().unwrap().run(html);
        assert_eq!(outcome.cells, 0);
        assert_eq!(outcome.html, html);
    }

    #[test]
    fn percent_parsing() {
        assert_eq!(parse_percent("37"), 37);
        assert_eq!(parse_percent("12.5"), 13);
        assert_eq!(parse_percent("999"), 255);
    }
}
