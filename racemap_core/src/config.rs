//! Pipeline configuration.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};

/// Centerline resampling strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SplineMode {
    /// Centripetal Catmull-Rom through every control point
    #[default]
    Centripetal,

    /// Straight edges with quadratic Bézier corners
    Rounded,
}

/// Parameters for the simplify → spline → mesh pipeline.
///
/// Lengths are in normalized map units unless noted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Meters represented by one normalized unit (default: 1000.0)
    pub map_size: f64,

    /// Distance filter threshold, 0 disables (default: 0.0005 = 0.5 m)
    pub min_distance: f64,

    /// Douglas-Peucker tolerance, 0 disables (default: 0.0002 = 0.2 m)
    pub dp_tolerance: f64,

    /// Moving-average window, 0 or 1 disables (default: 0)
    pub smoothing_window: usize,

    /// Resampling strategy (default: Centripetal)
    pub spline_mode: SplineMode,

    /// Samples per control segment in centripetal mode (default: 10)
    pub points_per_segment: usize,

    /// Knot exponent, 0.5 = centripetal (default: 0.5)
    pub alpha: f64,

    /// Corner radius in rounded mode (default: 0.01)
    pub corner_radius: f64,

    /// Bézier subdivisions per corner in rounded mode (default: 8)
    pub segments_per_corner: usize,

    /// Full width of the road ribbon (default: 0.02 = 20 m)
    pub track_width: f64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            map_size: 1000.0,
            min_distance: 0.0005,
            dp_tolerance: 0.0002,
            smoothing_window: 0,
            spline_mode: SplineMode::Centripetal,
            points_per_segment: 10,
            alpha: 0.5,
            corner_radius: 0.01,
            segments_per_corner: 8,
            track_width: 0.02,
        }
    }
}

impl PipelineConfig {
    /// Parses a (possibly partial) JSON configuration; missing fields keep
    /// their defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects parameters that would produce non-finite geometry.
    pub fn validate(&self) -> Result<(), ConfigError> {
        fn check(field: &'static str, requirement: &'static str, value: f64, ok: bool) -> Result<(), ConfigError> {
            if ok {
                Ok(())
            } else {
                Err(ConfigError::OutOfRange {
                    field,
                    requirement,
                    value,
                })
            }
        }

        let non_negative = |v: f64| v.is_finite() && v >= 0.0;
        check("map_size", "finite and > 0", self.map_size, self.map_size.is_finite() && self.map_size > 0.0)?;
        // Non-positive thresholds disable their stage
        check("min_distance", "finite", self.min_distance, self.min_distance.is_finite())?;
        check("dp_tolerance", "finite", self.dp_tolerance, self.dp_tolerance.is_finite())?;
        check("alpha", "finite and >= 0", self.alpha, non_negative(self.alpha))?;
        check("corner_radius", "finite and >= 0", self.corner_radius, non_negative(self.corner_radius))?;
        check("track_width", "finite and >= 0", self.track_width, non_negative(self.track_width))?;
        check(
            "points_per_segment",
            ">= 1",
            self.points_per_segment as f64,
            self.points_per_segment >= 1,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pipeline_config_default() {
        let config = PipelineConfig::default();
        assert_eq!(config.map_size, 1000.0);
        assert_eq!(config.points_per_segment, 10);
        assert_eq!(config.alpha, 0.5);
        assert_eq!(config.spline_mode, SplineMode::Centripetal);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = PipelineConfig::from_json(r#"{"spline_mode":"rounded","track_width":0.05}"#).unwrap();
        assert_eq!(config.spline_mode, SplineMode::Rounded);
        assert_eq!(config.track_width, 0.05);
        assert_eq!(config.points_per_segment, 10);
    }

    #[test]
    fn test_invalid_json_is_an_error() {
        assert!(matches!(
            PipelineConfig::from_json("{\"alpha\": \"high\"}"),
            Err(ConfigError::Malformed(_))
        ));
    }

    #[test]
    fn test_defaults_are_valid() {
        assert_eq!(PipelineConfig::default().validate(), Ok(()));
    }

    #[test]
    fn test_out_of_range_values_rejected() {
        let err = PipelineConfig::from_json(r#"{"map_size": 0.0}"#).unwrap_err();
        assert!(matches!(err, ConfigError::OutOfRange { field: "map_size", .. }));

        let err = PipelineConfig::from_json(r#"{"points_per_segment": 0}"#).unwrap_err();
        assert!(matches!(err, ConfigError::OutOfRange { field: "points_per_segment", .. }));

        for config in [
            PipelineConfig { map_size: f64::INFINITY, ..PipelineConfig::default() },
            PipelineConfig { alpha: -0.5, ..PipelineConfig::default() },
            PipelineConfig { track_width: f64::NAN, ..PipelineConfig::default() },
            PipelineConfig { corner_radius: -1.0, ..PipelineConfig::default() },
        ] {
            assert!(config.validate().is_err());
        }
    }
}
