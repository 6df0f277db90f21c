//! CLI configuration file (TOML).
//!
//! ```toml
//! [timeline]
//! min_window_days = 30
//! max_extent_percent = 95.0
//!
//! [display]
//! date_format = "%d/%m/%Y"
//! bar_width = 50
//! ```

use std::path::Path;

use anyhow::{bail, Context, Result};
use chrono::format::{Item, StrftimeItems};
use plancast_core::TimelineConfig;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlancastConfig {
    pub timeline: TimelineConfig,
    pub display: DisplayConfig,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// chrono format string used by text and HTML output
    pub date_format: String,
    /// Width of the ASCII timeline
    pub bar_width: usize,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            date_format: "%d/%m/%Y".into(),
            bar_width: 50,
        }
    }
}

impl DisplayConfig {
    fn validate(&self) -> Result<()> {
        if StrftimeItems::new(&self.date_format).any(|item| matches!(item, Item::Error)) {
            bail!("date_format {:?} is not a valid strftime pattern", self.date_format);
        }
        Ok(())
    }
}

impl PlancastConfig {
    /// Read the config file, or fall back to defaults when none is given
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::parse(&raw).with_context(|| format!("Invalid config file {}", path.display()))
    }

    pub fn parse(raw: &str) -> Result<Self> {
        let config: Self = toml::from_str(raw)?;
        config.display.validate().context("Invalid [display] section")?;
        tracing::debug!(?config, "loaded configuration");
        Ok(config)
    }
}
