//! Engine configuration.
//!
//! All fields have defaults, so a configuration file only needs to name the
//! values it changes:
//!
//! ```
//! use horizon_grid::GridConfig;
//!
//! let config = GridConfig::from_toml_str(
//!     r#"
//!     history_capacity = 100
//!
//!     [theme]
//!     row_height = 28.0
//!     "#,
//! )
//! .unwrap();
//! assert_eq!(config.theme.row_height, 28.0);
//! assert_eq!(config.theme.header_height, 36.0);
//! ```

use serde::{Deserialize, Serialize};

use horizon_grid_core::logging::targets;

/// Errors produced while loading or validating configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML syntax or type error.
    #[error("invalid TOML configuration: {0}")]
    Toml(#[from] toml::de::Error),

    /// JSON syntax or type error.
    #[error("invalid JSON configuration: {0}")]
    Json(#[from] serde_json::Error),

    /// A value is out of its allowed range.
    #[error("invalid value for '{field}': {message}")]
    InvalidValue {
        field: &'static str,
        message: String,
    },
}

impl ConfigError {
    fn invalid(field: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidValue {
            field,
            message: message.into(),
        }
    }
}

/// Theme-derived metrics used for every coordinate transform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Theme {
    /// Height of every data row and group header.
    pub row_height: f32,
    /// Height of the column header strip.
    pub header_height: f32,
    /// Width of the row header strip.
    pub row_header_width: f32,
    /// Font used for cell text (auto-fit measurement).
    pub cell_font: String,
    /// Font used for header labels (auto-fit measurement).
    pub header_font: String,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            row_height: 32.0,
            header_height: 36.0,
            row_header_width: 60.0,
            cell_font: "13px sans-serif".to_string(),
            header_font: "600 13px sans-serif".to_string(),
        }
    }
}

/// Pointer interaction thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InteractionConfig {
    /// Half-width of the column edge zone that starts a resize.
    pub resize_edge_tolerance: f32,
    /// Movement that promotes a press candidate to a drag gesture.
    pub drag_threshold: f32,
    /// Fraction of a column's width the reorder ghost must cover.
    pub reorder_overlap_ratio: f32,
    /// Side length of the fill handle square.
    pub fill_handle_size: f32,
    /// Width of the checkbox zone at the left of the row header.
    pub checkbox_zone_width: f32,
    /// Width of the menu zone at the right end of each column header.
    pub header_menu_zone_width: f32,
    /// Maximum pointer travel between clicks of a double-click.
    pub double_click_distance: f32,
    /// Maximum delay between clicks of a double-click.
    pub double_click_ms: f64,
    /// Pixels scrolled per wheel line.
    pub wheel_line_height: f32,
}

impl Default for InteractionConfig {
    fn default() -> Self {
        Self {
            resize_edge_tolerance: 5.0,
            drag_threshold: 5.0,
            reorder_overlap_ratio: 0.3,
            fill_handle_size: 8.0,
            checkbox_zone_width: 24.0,
            header_menu_zone_width: 20.0,
            double_click_distance: 10.0,
            double_click_ms: 400.0,
            wheel_line_height: 20.0,
        }
    }
}

/// Column auto-fit parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutoFitConfig {
    /// Padding added to the measured header label.
    pub header_padding: f32,
    /// Padding added to the widest measured cell text.
    pub cell_padding: f32,
    /// Maximum number of rows sampled.
    pub sample_rows: usize,
    /// Upper bound of an auto-fit width.
    pub max_width: f32,
}

impl Default for AutoFitConfig {
    fn default() -> Self {
        Self {
            header_padding: 40.0,
            cell_padding: 16.0,
            sample_rows: 1000,
            max_width: 600.0,
        }
    }
}

/// Top-level engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    /// Layout metrics.
    pub theme: Theme,
    /// Pointer thresholds.
    pub interaction: InteractionConfig,
    /// Auto-fit behaviour.
    pub auto_fit: AutoFitConfig,
    /// Extra horizontal scroll past the last column.
    pub horizontal_overscroll: f32,
    /// Undo stack capacity.
    pub history_capacity: usize,
    /// Page-size hint passed to the adapter on fetch.
    pub page_size: usize,
    /// Initial viewport width.
    pub viewport_width: f32,
    /// Initial viewport height.
    pub viewport_height: f32,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            theme: Theme::default(),
            interaction: InteractionConfig::default(),
            auto_fit: AutoFitConfig::default(),
            horizontal_overscroll: 100.0,
            history_capacity: 50,
            page_size: 100,
            viewport_width: 1024.0,
            viewport_height: 768.0,
        }
    }
}

impl GridConfig {
    /// Parse and validate a TOML configuration.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        tracing::debug!(target: targets::CONFIG, "loaded TOML grid configuration");
        Ok(config)
    }

    /// Parse and validate a JSON configuration.
    pub fn from_json_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(source)?;
        config.validate()?;
        tracing::debug!(target: targets::CONFIG, "loaded JSON grid configuration");
        Ok(config)
    }

    /// Check value ranges that the engine relies on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.theme.row_height <= 0.0 {
            return Err(ConfigError::invalid("theme.row_height", "must be positive"));
        }
        if self.theme.header_height < 0.0 {
            return Err(ConfigError::invalid(
                "theme.header_height",
                "must not be negative",
            ));
        }
        if self.theme.row_header_width < 0.0 {
            return Err(ConfigError::invalid(
                "theme.row_header_width",
                "must not be negative",
            ));
        }
        if self.horizontal_overscroll <= 0.0 {
            return Err(ConfigError::invalid(
                "horizontal_overscroll",
                "must be positive",
            ));
        }
        if self.history_capacity == 0 {
            return Err(ConfigError::invalid(
                "history_capacity",
                "must hold at least one command",
            ));
        }
        let ratio = self.interaction.reorder_overlap_ratio;
        if !(0.0..=1.0).contains(&ratio) {
            return Err(ConfigError::invalid(
                "interaction.reorder_overlap_ratio",
                format!("{ratio} is not within 0..=1"),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = GridConfig::default();
        assert_eq!(config.history_capacity, 50);
        assert_eq!(config.interaction.drag_threshold, 5.0);
        assert_eq!(config.interaction.double_click_ms, 400.0);
        assert_eq!(config.auto_fit.sample_rows, 1000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml() {
        let config = GridConfig::from_toml_str(
            r#"
            page_size = 250

            [interaction]
            drag_threshold = 8.0
            "#,
        )
        .unwrap();
        assert_eq!(config.page_size, 250);
        assert_eq!(config.interaction.drag_threshold, 8.0);
        assert_eq!(config.interaction.resize_edge_tolerance, 5.0);
    }

    #[test]
    fn test_json_round_trip() {
        let json = serde_json::to_string(&GridConfig::default()).unwrap();
        let config = GridConfig::from_json_str(&json).unwrap();
        assert_eq!(config, GridConfig::default());
    }

    #[test]
    fn test_rejects_invalid_values() {
        let err = GridConfig::from_toml_str("history_capacity = 0").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue {
                field: "history_capacity",
                ..
            }
        ));

        let err = GridConfig::from_toml_str("[theme]\nrow_height = 0.0").unwrap_err();
        assert!(err.to_string().contains("theme.row_height"));

        assert!(GridConfig::from_toml_str("page_size = \"many\"").is_err());
    }
}
