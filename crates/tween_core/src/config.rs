//! Engine configuration (tween.toml)
//!
//! ```toml
//! paused = false
//!
//! [clock]
//! kind = "fixed_interval"   # frame_synchronized | fixed_interval | none
//! frame_skip = 1
//! interval = 0.016666666666666666
//! ```

use crate::clock::Cadence;
use crate::error::{Result, TweenError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Engine-wide settings
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Tick source and cadence
    pub clock: Cadence,
    /// Start the engine paused
    pub paused: bool,
}

impl EngineConfig {
    /// Parse and validate a TOML document
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: EngineConfig =
            toml::from_str(content).map_err(|e| TweenError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse, and validate a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        tracing::debug!(path = %path.display(), "loaded tween engine config");
        Self::from_toml_str(&content)
    }

    pub fn validate(&self) -> Result<()> {
        self.clock.validate()
    }

    /// Serialize to a TOML string
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| TweenError::ConfigParse(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ClockKind;

    #[test]
    fn test_empty_document_uses_defaults() {
        let config = EngineConfig::from_toml_str("").unwrap();
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.clock.kind, ClockKind::FrameSynchronized);
        assert_eq!(config.clock.frame_skip, 1);
        assert!(!config.paused);
    }

    #[test]
    fn test_parse_fixed_interval() {
        let config = EngineConfig::from_toml_str(
            r#"
            paused = true

            [clock]
            kind = "fixed_interval"
            interval = 0.5
            "#,
        )
        .unwrap();
        assert!(config.paused);
        assert_eq!(config.clock.kind, ClockKind::FixedInterval);
        assert_eq!(config.clock.interval, 0.5);
        assert_eq!(config.clock.frame_skip, 1);
    }

    #[test]
    fn test_rejects_zero_frame_skip() {
        let result = EngineConfig::from_toml_str(
            r#"
            [clock]
            frame_skip = 0
            "#,
        );
        assert!(matches!(result, Err(TweenError::InvalidConfig(_))));
    }

    #[test]
    fn test_rejects_unknown_clock_kind() {
        let result = EngineConfig::from_toml_str(
            r#"
            [clock]
            kind = "vsync"
            "#,
        );
        assert!(matches!(result, Err(TweenError::ConfigParse(_))));
    }

    #[test]
    fn test_toml_round_trip() {
        let mut config = EngineConfig::default();
        config.clock.kind = ClockKind::None;
        config.clock.frame_skip = 2;
        let text = config.to_toml().unwrap();
        assert_eq!(EngineConfig::from_toml_str(&text).unwrap(), config);
    }

    #[test]
    fn test_load_missing_file() {
        let result = EngineConfig::load("/nonexistent/tween.toml");
        assert!(matches!(result, Err(TweenError::Io(_))));
    }
}
