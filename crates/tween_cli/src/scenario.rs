//! Scenario file handling

use anyhow::{ensure, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tween_core::{ClockKind, Easing, EngineConfig};

/// A scenario file: engine settings plus the tweens to run
///
/// ```toml
/// driver = "thread"
///
/// [engine]
/// paused = false
/// [engine.clock]
/// kind = "frame_synchronized"
/// frame_skip = 2
///
/// [[tween]]
/// name = "fade"
/// from = 0.0
/// to = 1.0
/// duration = 0.5
/// easing = "ease-out-cubic"
/// ```
#[derive(Debug, Deserialize, Serialize)]
pub struct Scenario {
    #[serde(default)]
    pub driver: DriverKind,
    /// Emulated display refresh rate (Hz) for frame-synchronized cadence
    #[serde(default = "default_refresh_rate")]
    pub refresh_rate: f64,
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default, rename = "tween")]
    pub tweens: Vec<TweenEntry>,
}

/// Which real-time driver ticks the engine
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DriverKind {
    #[default]
    Thread,
    Tokio,
}

/// One `[[tween]]` entry
#[derive(Debug, Deserialize, Serialize)]
pub struct TweenEntry {
    pub name: String,
    pub from: f64,
    pub to: f64,
    pub duration: f64,
    #[serde(default)]
    pub delay: f64,
    #[serde(default)]
    pub easing: Easing,
}

fn default_refresh_rate() -> f64 {
    tween_platform::DEFAULT_REFRESH_RATE
}

impl Scenario {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let scenario: Scenario = toml::from_str(content)?;
        scenario.validate()?;
        Ok(scenario)
    }

    fn validate(&self) -> Result<()> {
        self.engine.validate()?;
        ensure!(
            self.engine.clock.kind != ClockKind::None,
            "clock kind \"none\" never ticks; use frame_synchronized or fixed_interval"
        );
        ensure!(
            !self.engine.paused,
            "engine starts paused and would never advance; set paused = false"
        );
        ensure!(!self.tweens.is_empty(), "scenario has no [[tween]] entries");
        for tween in &self.tweens {
            ensure!(
                tween.delay.is_finite() && tween.delay >= 0.0,
                "tween '{}': delay must be a non-negative number",
                tween.name
            );
        }
        Ok(())
    }

    /// Longest delay + duration across all entries
    pub fn total_duration(&self) -> f64 {
        self.tweens
            .iter()
            .map(|tween| tween.delay + tween.duration)
            .fold(0.0, f64::max)
    }
}
