#![forbid(unsafe_code)]

//! Editor configuration.
//!
//! Every tunable the editor uses lives in [`EditorConfig`]. With the
//! `config` feature (on by default) it can be loaded from TOML or JSON;
//! every section is optional and missing keys take their defaults.
//!
//! ```toml
//! [history]
//! max_depth = 200
//!
//! [interaction]
//! hit_radius_px = 24.0
//! default_cta = { x = 0.5, y = 0.8 }
//!
//! [new_hotspot]
//! target = "product"
//! selector = ".product"
//! ```
//!
//! # Failure Modes
//!
//! - Unknown keys are rejected so typos do not silently fall back to
//!   defaults.
//! - Out-of-range values are reported by [`EditorConfig::validate`]; the
//!   loaders run it and fail with [`ConfigError::Validation`].

#[cfg(feature = "config")]
use std::path::Path;

#[cfg(feature = "config")]
use serde::{Deserialize, Serialize};

use hotspot_core::{CallToAction, Hotspot, Point};

use crate::interaction::InteractionConfig;
use crate::undo::HistoryConfig;

/// Template for hotspots created from the editor.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "config", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config", serde(default, deny_unknown_fields))]
pub struct NewHotspotConfig {
    pub target: String,
    pub selector: String,
    /// New hotspots start with (empty) CTA metadata.
    pub cta_enabled: bool,
}

impl Default for NewHotspotConfig {
    fn default() -> Self {
        Self {
            target: "example".to_string(),
            selector: ".example".to_string(),
            cta_enabled: true,
        }
    }
}

impl NewHotspotConfig {
    /// Build a new hotspot with an empty timeline.
    #[must_use]
    pub fn template(&self) -> Hotspot {
        let hotspot = Hotspot::new(self.target.clone(), self.selector.clone());
        if self.cta_enabled {
            hotspot.with_cta(CallToAction::default())
        } else {
            hotspot
        }
    }
}

/// Top-level editor configuration.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "config", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config", serde(default, deny_unknown_fields))]
pub struct EditorConfig {
    pub history: HistoryConfig,
    pub interaction: InteractionConfig,
    pub new_hotspot: NewHotspotConfig,
}

fn in_unit_square(p: Point) -> bool {
    (0.0..=1.0).contains(&p.x) && (0.0..=1.0).contains(&p.y)
}

impl EditorConfig {
    /// Load from a TOML string.
    #[cfg(feature = "config")]
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str::<Self>(s)
            .map_err(ConfigError::Toml)?
            .validated()
    }

    /// Load from a TOML file on disk.
    #[cfg(feature = "config")]
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(ConfigError::Io)?;
        let config = Self::from_toml_str(&content)?;
        tracing::info!(
            target: "hotspot.config",
            path = %path.as_ref().display(),
            "editor configuration loaded"
        );
        Ok(config)
    }

    /// Load from a JSON string.
    #[cfg(feature = "config")]
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        serde_json::from_str::<Self>(s)
            .map_err(ConfigError::Json)?
            .validated()
    }

    /// Render the effective configuration as TOML.
    #[cfg(feature = "config")]
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        toml::to_string(self).map_err(ConfigError::TomlSerialize)
    }

    /// Check that every value is usable.
    ///
    /// Returns a list of problems; empty means valid.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        let interaction = &self.interaction;

        if self.history.max_depth == 0 {
            errors.push("history.max_depth must be at least 1".to_string());
        }
        if !(interaction.hit_radius_px.is_finite() && interaction.hit_radius_px > 0.0) {
            errors.push(format!(
                "interaction.hit_radius_px must be positive, got {}",
                interaction.hit_radius_px
            ));
        }
        if !(interaction.retime_drag_threshold_px.is_finite()
            && interaction.retime_drag_threshold_px >= 0.0)
        {
            errors.push(format!(
                "interaction.retime_drag_threshold_px must be non-negative, got {}",
                interaction.retime_drag_threshold_px
            ));
        }
        if !in_unit_square(interaction.default_cta) {
            errors.push("interaction.default_cta must lie in [0, 1]".to_string());
        }
        if !in_unit_square(interaction.fallback_position) {
            errors.push("interaction.fallback_position must lie in [0, 1]".to_string());
        }
        errors
    }

    #[cfg(feature = "config")]
    fn validated(self) -> Result<Self, ConfigError> {
        let errors = self.validate();
        if errors.is_empty() {
            Ok(self)
        } else {
            Err(ConfigError::Validation(errors))
        }
    }
}

/// Errors from loading configuration.
#[derive(Debug)]
pub enum ConfigError {
    /// I/O error reading a file.
    Io(std::io::Error),
    /// TOML parse error.
    #[cfg(feature = "config")]
    Toml(toml::de::Error),
    /// TOML serialization error.
    #[cfg(feature = "config")]
    TomlSerialize(toml::ser::Error),
    /// JSON parse error.
    #[cfg(feature = "config")]
    Json(serde_json::Error),
    /// Values out of range.
    Validation(Vec<String>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O error: {e}"),
            #[cfg(feature = "config")]
            Self::Toml(e) => write!(f, "TOML parse error: {e}"),
            #[cfg(feature = "config")]
            Self::TomlSerialize(e) => write!(f, "TOML serialization error: {e}"),
            #[cfg(feature = "config")]
            Self::Json(e) => write!(f, "JSON parse error: {e}"),
            Self::Validation(errors) => {
                write!(f, "validation errors: {}", errors.join("; "))
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            #[cfg(feature = "config")]
            Self::Toml(e) => Some(e),
            #[cfg(feature = "config")]
            Self::TomlSerialize(e) => Some(e),
            #[cfg(feature = "config")]
            Self::Json(e) => Some(e),
            Self::Validation(_) => None,
        }
    }
}
