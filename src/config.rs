//! Dashboard configuration.
//!
//! Supports YAML configuration with precedence: ENV > file > defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Event bus and gesture queue bounds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusConfig {
    /// Deepest nested publish the bus accepts.
    #[serde(default = "default_max_dispatch_depth")]
    pub max_dispatch_depth: usize,

    /// Gestures the coordinator drains per turn before giving up.
    #[serde(default = "default_max_gestures_per_turn")]
    pub max_gestures_per_turn: usize,
}

fn default_max_dispatch_depth() -> usize {
    crate::bus::DEFAULT_MAX_DISPATCH_DEPTH
}
fn default_max_gestures_per_turn() -> usize {
    64
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            max_dispatch_depth: default_max_dispatch_depth(),
            max_gestures_per_turn: default_max_gestures_per_turn(),
        }
    }
}

/// View-level thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterConfig {
    /// |r| above which a correlation cell is marked strong.
    #[serde(default = "default_strong_correlation")]
    pub strong_correlation: f64,
}

fn default_strong_correlation() -> f64 {
    crate::correlation::STRONG_CORRELATION
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            strong_correlation: default_strong_correlation(),
        }
    }
}

/// Main configuration structure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardConfig {
    /// Configuration version.
    #[serde(default = "default_version")]
    pub version: u32,

    /// Bus bounds.
    #[serde(default)]
    pub bus: BusConfig,

    /// View thresholds.
    #[serde(default)]
    pub filters: FilterConfig,

    /// Debug logging.
    #[serde(default)]
    pub debug: bool,
}

fn default_version() -> u32 {
    1
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            version: default_version(),
            bus: BusConfig::default(),
            filters: FilterConfig::default(),
            debug: false,
        }
    }
}

impl DashboardConfig {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// `<config_dir>/wellbeing-viz/config.yaml`, if the platform has a config dir.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("wellbeing-viz").join("config.yaml"))
    }

    /// Loads configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed or validated.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path)
            .map_err(|_| Error::ConfigNotFound(path.display().to_string()))?;

        Self::parse(&content)
    }

    /// Parses and validates configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns an error with line number if parsing fails.
    pub fn parse(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml_ng::from_str(yaml).map_err(|e| {
            let line = e.location().map_or(0, |l| l.line());
            Error::ConfigParse {
                line,
                message: e.to_string(),
            }
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Loads configuration with fallback to defaults.
    #[must_use]
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(path).unwrap_or_default()
    }

    /// Rejects values the engine cannot run with.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigInvalid`] naming the offending key.
    pub fn validate(&self) -> Result<()> {
        if self.bus.max_dispatch_depth == 0 {
            return Err(Error::ConfigInvalid {
                key: "bus.max_dispatch_depth".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        if self.bus.max_gestures_per_turn == 0 {
            return Err(Error::ConfigInvalid {
                key: "bus.max_gestures_per_turn".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        let t = self.filters.strong_correlation;
        if !(t > 0.0 && t <= 1.0) {
            return Err(Error::ConfigInvalid {
                key: "filters.strong_correlation".to_string(),
                message: format!("{t} is outside (0, 1]"),
            });
        }
        Ok(())
    }

    /// Debug switch after applying the environment override.
    #[must_use]
    pub fn debug_enabled(&self) -> bool {
        crate::debug::env_requested() || self.debug
    }

    /// Turns debug logging on if requested by file or environment.
    pub fn apply_logging(&self) {
        if self.debug_enabled() {
            crate::debug::enable();
            crate::info!("config", "debug logging enabled (config v{})", self.version);
        }
    }
}
