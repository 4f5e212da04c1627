//! Editor configuration.

use crate::pagination::PaperSize;
use kurbo::Size;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Smallest zoom scale (100%).
pub const MIN_ZOOM: f64 = 1.0;
/// Largest zoom scale (200%).
pub const MAX_ZOOM: f64 = 2.0;
/// Height of the gutter between two pages, in page pixels.
pub const DEFAULT_EXCLUSION_ZONE_HEIGHT: f64 = 10.0;
/// Distance from the document bottom at which the document grows.
pub const DEFAULT_BOTTOM_PADDING: f64 = 200.0;
/// Width of the pen eraser outline.
pub const DEFAULT_ERASER_WIDTH: f64 = 30.0;
/// Number of history actions kept in the persisted log.
pub const DEFAULT_MAX_STORED_ACTIONS: usize = 30;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("View size must be positive, got {width}x{height}")]
    InvalidViewSize { width: f64, height: f64 },
    #[error("Zoom range must be finite with 0 < min <= max, got {min}..{max}")]
    InvalidZoomRange { min: f64, max: f64 },
    #[error("{field} must be a finite non-negative length, got {value}")]
    InvalidLength { field: &'static str, value: f64 },
}

/// Settings for one open page editor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Physical view width in pixels.
    pub view_width: f64,
    /// Physical view height in pixels.
    pub view_height: f64,
    pub paper_size: PaperSize,
    pub pagination_enabled: bool,
    pub exclusion_zone_height: f64,
    pub bottom_padding: f64,
    pub min_zoom: f64,
    pub max_zoom: f64,
    pub eraser_width: f64,
    /// Cap of the persisted history log.
    pub max_stored_actions: usize,
    pub zoom_indicator_ms: u64,
    pub scroll_indicator_ms: u64,
    pub top_boundary_indicator_ms: u64,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            view_width: 1404.0,
            view_height: 1872.0,
            paper_size: PaperSize::Letter,
            pagination_enabled: true,
            exclusion_zone_height: DEFAULT_EXCLUSION_ZONE_HEIGHT,
            bottom_padding: DEFAULT_BOTTOM_PADDING,
            min_zoom: MIN_ZOOM,
            max_zoom: MAX_ZOOM,
            eraser_width: DEFAULT_ERASER_WIDTH,
            max_stored_actions: DEFAULT_MAX_STORED_ACTIONS,
            zoom_indicator_ms: 1500,
            scroll_indicator_ms: 1500,
            top_boundary_indicator_ms: 800,
        }
    }
}

impl EditorConfig {
    /// Create a default configuration for the given view size.
    pub fn with_view_size(width: f64, height: f64) -> Self {
        Self {
            view_width: width,
            view_height: height,
            ..Self::default()
        }
    }

    /// Parse and validate a configuration from JSON. Missing fields take defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize the configuration to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.view_width > 0.0 && self.view_height > 0.0)
            || !self.view_width.is_finite()
            || !self.view_height.is_finite()
        {
            return Err(ConfigError::InvalidViewSize {
                width: self.view_width,
                height: self.view_height,
            });
        }
        if !zoom_range_is_valid(self.min_zoom, self.max_zoom) {
            return Err(ConfigError::InvalidZoomRange {
                min: self.min_zoom,
                max: self.max_zoom,
            });
        }
        let lengths = [
            ("exclusion_zone_height", self.exclusion_zone_height),
            ("bottom_padding", self.bottom_padding),
            ("eraser_width", self.eraser_width),
        ];
        for (field, value) in lengths {
            if !(value.is_finite() && value >= 0.0) {
                return Err(ConfigError::InvalidLength { field, value });
            }
        }
        Ok(())
    }

    pub fn view_size(&self) -> Size {
        Size::new(self.view_width, self.view_height)
    }

    pub fn zoom_indicator_duration(&self) -> Duration {
        Duration::from_millis(self.zoom_indicator_ms)
    }

    pub fn scroll_indicator_duration(&self) -> Duration {
        Duration::from_millis(self.scroll_indicator_ms)
    }

    pub fn top_boundary_indicator_duration(&self) -> Duration {
        Duration::from_millis(self.top_boundary_indicator_ms)
    }
}

/// Whether `min..=max` can be used as a zoom clamp.
pub fn zoom_range_is_valid(min: f64, max: f64) -> bool {
    min.is_finite() && max.is_finite() && min > 0.0 && min <= max
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = EditorConfig::from_json(r#"{"view_width": 800, "view_height": 600}"#).unwrap();
        assert_eq!(config.view_size(), Size::new(800.0, 600.0));
        assert_eq!(config.max_stored_actions, DEFAULT_MAX_STORED_ACTIONS);
        assert!(config.pagination_enabled);
    }

    #[test]
    fn test_rejects_empty_view() {
        let result = EditorConfig::from_json(r#"{"view_width": 0}"#);
        assert!(matches!(result, Err(ConfigError::InvalidViewSize { .. })));
    }

    #[test]
    fn test_rejects_inverted_zoom_range() {
        let result = EditorConfig::from_json(r#"{"min_zoom": 2.0, "max_zoom": 1.0}"#);
        assert!(matches!(
            result,
            Err(ConfigError::InvalidZoomRange { min, max }) if min == 2.0 && max == 1.0
        ));
        assert!(EditorConfig::from_json(r#"{"min_zoom": 0.0}"#).is_err());
        assert!(EditorConfig::from_json(r#"{"min_zoom": 1.5, "max_zoom": 1.5}"#).is_ok());
    }

    #[test]
    fn test_rejects_negative_exclusion_height() {
        let result = EditorConfig::from_json(r#"{"exclusion_zone_height": -1.0}"#);
        assert!(matches!(
            result,
            Err(ConfigError::InvalidLength { field: "exclusion_zone_height", .. })
        ));
    }

    #[test]
    fn test_rejects_negative_bottom_padding() {
        let result = EditorConfig::from_json(r#"{"bottom_padding": -200.0}"#);
        assert!(matches!(result, Err(ConfigError::InvalidLength { field: "bottom_padding", .. })));
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(EditorConfig::default().validate().is_ok());
    }

    #[test]
    fn test_json_roundtrip() {
        let mut config = EditorConfig::with_view_size(1000.0, 1400.0);
        config.paper_size = PaperSize::A4;
        let parsed = EditorConfig::from_json(&config.to_json().unwrap()).unwrap();
        assert_eq!(parsed, config);
    }
}
