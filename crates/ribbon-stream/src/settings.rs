//! Layout settings and parser options recorded on a stream.
//!
//! Both can be loaded from TOML:
//!
//! ```toml
//! initial-capacity = 4096
//!
//! [layout]
//! max-width = 320.0
//! wrapping = "whole-words"
//! alignment = "center"
//!
//! [parser]
//! icons = false
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from loading stream configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse stream configuration: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid value for '{field}': {reason}")]
    Invalid { field: &'static str, reason: String },
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Wrapping {
    NoWrap,
    #[default]
    Wrap,
    WholeWords,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Alignment {
    #[default]
    Left,
    Center,
    Right,
    Justify,
}

/// Settings the layout engine ran with.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct LayoutSettings {
    pub max_width: Option<f32>,
    pub max_height: Option<f32>,
    pub wrapping: Wrapping,
    pub alignment: Alignment,
    /// Multiplier applied to each line's natural height.
    pub line_spacing: f32,
    pub tab_width: u32,
    pub hyphenate: bool,
}

impl Default for LayoutSettings {
    fn default() -> Self {
        Self {
            max_width: None,
            max_height: None,
            wrapping: Wrapping::default(),
            alignment: Alignment::default(),
            line_spacing: 1.0,
            tab_width: 4,
            hyphenate: false,
        }
    }
}

/// Which inline markup the source text was parsed with.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ParserOptions {
    /// Style, font and color tags.
    pub markup: bool,
    pub icons: bool,
    /// Backslash escapes.
    pub escapes: bool,
}

impl Default for ParserOptions {
    fn default() -> Self {
        Self {
            markup: true,
            icons: true,
            escapes: true,
        }
    }
}

/// Configuration for constructing a [`CommandStream`](crate::CommandStream).
#[derive(Clone, Debug, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct StreamConfig {
    /// Bytes reserved up front for command records.
    pub initial_capacity: usize,
    pub layout: LayoutSettings,
    pub parser: ParserOptions,
}

impl StreamConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: StreamConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !(self.layout.line_spacing.is_finite() && self.layout.line_spacing > 0.0) {
            return Err(ConfigError::Invalid {
                field: "layout.line-spacing",
                reason: format!("{} is not a positive number", self.layout.line_spacing),
            });
        }
        for (field, value) in [
            ("layout.max-width", self.layout.max_width),
            ("layout.max-height", self.layout.max_height),
        ] {
            if let Some(v) = value.filter(|v| !(v.is_finite() && *v >= 0.0)) {
                return Err(ConfigError::Invalid {
                    field,
                    reason: format!("{v} is not a non-negative number"),
                });
            }
        }
        Ok(())
    }
}
