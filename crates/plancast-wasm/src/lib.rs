//! WebAssembly bindings for the plancast planning core
//!
//! JavaScript-callable functions that take and return JSON strings, so a
//! browser editor can keep its own task records and hand them over for
//! rollup, bar geometry and progress repair.

use serde::{Deserialize, Serialize};
use wasm_bindgen::prelude::*;

use plancast_core::{
    rollup, ProgressPair, Project, ProjectSummary, RepairReport, Renderer, Timeline, TimelineConfig,
};
use plancast_render::{HtmlTimelineRenderer, ProgressAudit};

/// Initialize panic hook for better error messages in console
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

/// Recompute parent progress and inherited fields; returns the project JSON
#[wasm_bindgen]
pub fn aggregate_project(project_json: &str) -> Result<String, JsValue> {
    aggregate_json(project_json).map_err(|e| JsValue::from_str(&e))
}

/// Bar geometry for every task. `config_json` may be omitted for defaults.
#[wasm_bindgen]
pub fn project_timeline(project_json: &str, config_json: Option<String>) -> Result<String, JsValue> {
    timeline_json(project_json, config_json.as_deref()).map_err(|e| JsValue::from_str(&e))
}

/// Repair `[{label, declared, rendered}]` pairs
#[wasm_bindgen]
pub fn repair_progress(pairs_json: &str) -> Result<String, JsValue> {
    repair_json(pairs_json).map_err(|e| JsValue::from_str(&e))
}

#[wasm_bindgen]
pub fn project_summary(project_json: &str) -> Result<String, JsValue> {
    summary_json(project_json).map_err(|e| JsValue::from_str(&e))
}

/// Standalone HTML timeline page
#[wasm_bindgen]
pub fn render_timeline_html(project_json: &str, dark_theme: bool) -> Result<String, JsValue> {
    html_page(project_json, dark_theme).map_err(|e| JsValue::from_str(&e))
}

/// Audit a rendered page; returns `{html, cells, checked, repaired}`
#[wasm_bindgen]
pub fn audit_html(html: &str) -> Result<JsValue, JsValue> {
    let result = audit(html).map_err(|e| JsValue::from_str(&e))?;
    serde_wasm_bindgen::to_value(&result).map_err(|e| JsValue::from_str(&e.to_string()))
}

// ============================================================================
// JSON plumbing
// ============================================================================

#[derive(Debug, Serialize, Deserialize)]
struct RepairResult {
    pairs: Vec<ProgressPair>,
    report: RepairReport,
}

#[derive(Debug, Serialize, Deserialize)]
struct AuditResult {
    html: String,
    cells: usize,
    checked: usize,
    repaired: usize,
}

fn parse_project(raw: &str) -> Result<Project, String> {
    let mut project: Project =
        serde_json::from_str(raw).map_err(|e| format!("Invalid project: {}", e))?;
    rollup::refresh(&mut project);
    Ok(project)
}

fn to_json<T: Serialize>(value: &T) -> Result<String, String> {
    serde_json::to_string(value).map_err(|e| format!("Serialization error: {}", e))
}

fn aggregate_json(raw: &str) -> Result<String, String> {
    to_json(&parse_project(raw)?)
}

fn timeline_json(raw: &str, config: Option<&str>) -> Result<String, String> {
    let project = parse_project(raw)?;
    let config: TimelineConfig = match config {
        Some(c) if !c.trim().is_empty() => {
            serde_json::from_str(c).map_err(|e| format!("Invalid timeline config: {}", e))?
        }
        _ => TimelineConfig::default(),
    };
    to_json(&Timeline::compute(&project, &config))
}

fn repair_json(raw: &str) -> Result<String, String> {
    let mut pairs: Vec<ProgressPair> =
        serde_json::from_str(raw).map_err(|e| format!("Invalid pairs: {}", e))?;
    let report = plancast_core::repair_progress(pairs.iter_mut());
    to_json(&RepairResult { pairs, report })
}

fn summary_json(raw: &str) -> Result<String, String> {
    to_json(&ProjectSummary::compute(&parse_project(raw)?))
}

fn html_page(raw: &str, dark_theme: bool) -> Result<String, String> {
    let project = parse_project(raw)?;
    let timeline = Timeline::compute(&project, &TimelineConfig::default());
    let mut renderer = HtmlTimelineRenderer::new();
    if dark_theme {
        renderer = renderer.dark_theme();
    }
    renderer
        .render(&project, &timeline)
        .map_err(|e| format!("Render error: {}", e))
}

fn audit(html: &str) -> Result<AuditResult, String> {
    let outcome = ProgressAudit::new()
        .map_err(|e| e.to_string())?
        .run(html);
    Ok(AuditResult {
        html: outcome.html,
        cells: outcome.cells,
        checked: outcome.report.checked,
        repaired: outcome.report.repaired,
    })
}
