// Config Module - JSON-loadable settings for the demo binary

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::state::VisualState;
use crate::viz::{DEFAULT_BAR_COUNT, VisualizerOptions};

/// Demo settings. Every field has a default matching the visualizer's
/// built-in constants, so a partial (or empty) config file is valid.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct RippleConfig {
    pub bar_count: usize,
    pub min_height: f32,
    pub max_height: f32,
    pub demo: bool,
    pub center_align: bool,
    /// Auto-cycle through visual states on a timer.
    pub kiosk: bool,
    /// Initial visual state by name; unknown names fall back to idle.
    pub state: Option<String>,
}

impl Default for RippleConfig {
    fn default() -> Self {
        Self {
            bar_count: DEFAULT_BAR_COUNT,
            min_height: 20.0,
            max_height: 100.0,
            demo: false,
            center_align: false,
            kiosk: false,
            state: None,
        }
    }
}

impl RippleConfig {
    /// Load settings from a JSON file.
    pub fn load(path: &Path) -> Result<RippleConfig> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        let config = serde_json::from_str(&text)
            .with_context(|| format!("failed to parse config file {}", path.display()))?;
        Ok(config)
    }

    pub fn visualizer_options(&self) -> VisualizerOptions {
        VisualizerOptions {
            bar_count: self.bar_count,
            min_height: self.min_height,
            max_height: self.max_height,
            demo: self.demo,
            center_align: self.center_align,
        }
    }

    pub fn initial_state(&self) -> Option<VisualState> {
        self.state.as_deref().and_then(VisualState::from_name)
    }
}
