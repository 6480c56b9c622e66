//! Editor configuration.

use crate::error::ConfigError;
use crate::history::DEFAULT_HISTORY_CAPACITY;
use crate::snap::{DEFAULT_GRID_SIZE, DEFAULT_SNAP_DISTANCE, SnapMode};
use crate::throttle::DEFAULT_FRAME_INTERVAL_MS;
use serde::{Deserialize, Serialize};

/// Tunables for an [`Editor`](crate::editor::Editor).
///
/// Every field has a default, so a partial JSON object is a valid config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Grid spacing in millimetres; 0 disables the grid.
    pub grid_size: f64,
    pub snap_mode: SnapMode,
    /// Maximum distance at which element snapping applies.
    pub snap_distance: f64,
    /// Number of undo steps kept.
    pub history_capacity: usize,
    /// Margin around the viewport whose elements stay realized.
    pub viewport_buffer: f64,
    pub virtualization_enabled: bool,
    /// Distance elements keep from the page edges while dragging.
    pub canvas_padding: f64,
    /// Minimum interval between viewport recomputes.
    pub frame_interval_ms: u64,
    /// Offset applied to cloned elements.
    pub clone_offset: f64,
    /// Device resolution used to convert pixels to millimetres.
    pub dpi: f64,
    /// Distance moved by a plain nudge.
    pub nudge_step: f64,
    /// Distance moved by a large nudge.
    pub nudge_large_step: f64,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            grid_size: DEFAULT_GRID_SIZE,
            snap_mode: SnapMode::Grid,
            snap_distance: DEFAULT_SNAP_DISTANCE,
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            viewport_buffer: 50.0,
            virtualization_enabled: true,
            canvas_padding: 0.0,
            frame_interval_ms: DEFAULT_FRAME_INTERVAL_MS,
            clone_offset: 10.0,
            dpi: crate::camera::DEFAULT_DPI,
            nudge_step: 1.0,
            nudge_large_step: 10.0,
        }
    }
}

impl EditorConfig {
    /// Parse and validate a JSON configuration.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Check value ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        non_negative("grid_size", self.grid_size)?;
        non_negative("snap_distance", self.snap_distance)?;
        non_negative("viewport_buffer", self.viewport_buffer)?;
        non_negative("canvas_padding", self.canvas_padding)?;
        non_negative("nudge_step", self.nudge_step)?;
        non_negative("nudge_large_step", self.nudge_large_step)?;
        if !self.clone_offset.is_finite() {
            return Err(invalid("clone_offset", "must be finite"));
        }
        if self.history_capacity == 0 {
            return Err(invalid("history_capacity", "must be at least 1"));
        }
        if !(self.dpi.is_finite() && self.dpi > 0.0) {
            return Err(invalid("dpi", "must be positive"));
        }
        Ok(())
    }

    /// Grid size used by the controllers, 0 when grid snapping is off.
    pub fn effective_grid(&self) -> f64 {
        if self.snap_mode.snaps_to_grid() { self.grid_size } else { 0.0 }
    }
}

fn invalid(field: &'static str, reason: &str) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.to_string(),
    }
}

fn non_negative(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(invalid(field, "must be a non-negative number"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EditorConfig::default();
        assert_eq!(config.history_capacity, 50);
        assert_eq!(config.frame_interval_ms, 16);
        assert!(config.virtualization_enabled);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = EditorConfig::from_json(r#"{ "grid_size": 2.5, "snap_mode": "all" }"#).unwrap();
        assert!((config.grid_size - 2.5).abs() < f64::EPSILON);
        assert_eq!(config.snap_mode, SnapMode::All);
        assert_eq!(config.history_capacity, 50);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let err = EditorConfig::from_json(r#"{ "history_capacity": 0 }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "history_capacity", .. }));

        let err = EditorConfig::from_json(r#"{ "grid_size": -1.0 }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "grid_size", .. }));
    }

    #[test]
    fn test_malformed_json() {
        let err = EditorConfig::from_json("{ not json").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_effective_grid() {
        let mut config = EditorConfig::default();
        assert!((config.effective_grid() - config.grid_size).abs() < f64::EPSILON);
        config.snap_mode = SnapMode::Elements;
        assert!(config.effective_grid().abs() < f64::EPSILON);
    }

    #[test]
    fn test_json_round_trip() {
        let config = EditorConfig {
            snap_mode: SnapMode::None,
            viewport_buffer: 0.0,
            ..EditorConfig::default()
        };
        let json = config.to_json().unwrap();
        assert_eq!(EditorConfig::from_json(&json).unwrap(), config);
    }
}
