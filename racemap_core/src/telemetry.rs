//! Telemetry ingestion boundary.
//!
//! The transport layer hands over one JSON object per fix. Fields use fixed
//! point integers on the wire; [`ParsedTelemetry`] carries SI units.

use crate::coords;
use crate::error::TelemetryError;
use crate::types::{GeodeticPoint, NormalizedPoint, Origin};
use serde::{Deserialize, Serialize};

/// Wire value of `acc` meaning "acceleration unavailable".
pub const ACCELERATION_UNAVAILABLE: i64 = -911;

/// Raw telemetry message as sent by a tracker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TelemetryMessage {
    pub id: String,

    /// Latitude in degrees × 1e7
    pub lat: i64,

    /// Longitude in degrees × 1e7
    pub lon: i64,

    /// Timestamp in milliseconds
    pub time: i64,

    /// Altitude in millimeters
    #[serde(default)]
    pub alt: Option<i64>,

    /// Ground speed in cm/s
    #[serde(default)]
    pub speed: Option<i64>,

    /// Course over ground in degrees × 100
    #[serde(default)]
    pub course: Option<i64>,

    #[serde(default)]
    pub fix_type: Option<u8>,

    /// Satellites in use
    #[serde(default)]
    pub sats: Option<u32>,

    /// Acceleration × 100, or [`ACCELERATION_UNAVAILABLE`]
    #[serde(default)]
    pub acc: Option<i64>,
}

/// GNSS fix quality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FixType {
    #[default]
    NoFix,
    Fix2D,
    Fix3D,
    RtkFixed,
    RtkFloat,
    /// Any code outside the documented set
    Unknown(u8),
}

impl From<u8> for FixType {
    fn from(code: u8) -> Self {
        match code {
            0 => FixType::NoFix,
            2 => FixType::Fix2D,
            3 => FixType::Fix3D,
            4 => FixType::RtkFixed,
            5 => FixType::RtkFloat,
            other => FixType::Unknown(other),
        }
    }
}

impl FixType {
    /// True for any fix that yields a position.
    pub fn has_position(&self) -> bool {
        matches!(
            self,
            FixType::Fix2D | FixType::Fix3D | FixType::RtkFixed | FixType::RtkFloat
        )
    }
}

/// A decoded telemetry fix in SI units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedTelemetry {
    pub id: String,
    pub position: GeodeticPoint,
    pub time_ms: i64,
    /// Meters
    pub altitude: Option<f64>,
    /// m/s
    pub speed: Option<f64>,
    /// Degrees
    pub course: Option<f64>,
    pub fix_type: FixType,
    pub satellites: Option<u32>,
    pub acceleration: f64,
    pub acceleration_valid: bool,
}

impl From<TelemetryMessage> for ParsedTelemetry {
    fn from(msg: TelemetryMessage) -> Self {
        let (acceleration, acceleration_valid) = match msg.acc {
            Some(acc) if acc != ACCELERATION_UNAVAILABLE => (acc as f64 / 100.0, true),
            _ => (0.0, false),
        };

        Self {
            id: msg.id,
            position: GeodeticPoint::new(msg.lat as f64 * 1e-7, msg.lon as f64 * 1e-7),
            time_ms: msg.time,
            altitude: msg.alt.map(|mm| mm as f64 / 1000.0),
            speed: msg.speed.map(|cms| cms as f64 / 100.0),
            course: msg.course.map(|c| c as f64 / 100.0),
            fix_type: msg.fix_type.map(FixType::from).unwrap_or_default(),
            satellites: msg.sats,
            acceleration,
            acceleration_valid,
        }
    }
}

impl ParsedTelemetry {
    /// Projects the fix straight into the map frame of `origin`.
    ///
    /// Live vehicles skip the spline/progress path entirely.
    pub fn normalized(&self, origin: &Origin) -> NormalizedPoint {
        coords::project(self.position, origin)
    }
}

/// Decodes one telemetry JSON object.
pub fn parse_telemetry_json(json: &str) -> Result<ParsedTelemetry, TelemetryError> {
    let msg: TelemetryMessage = serde_json::from_str(json)?;
    if msg.id.is_empty() {
        return Err(TelemetryError::EmptyId);
    }
    Ok(msg.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_minimal_payload_with_unavailable_acceleration() {
        let parsed = parse_telemetry_json(
            r#"{"id":"A1","lat":407128000,"lon":-740060000,"time":1000,"speed":2500,"acc":-911}"#,
        )
        .unwrap();

        assert_eq!(parsed.id, "A1");
        assert_relative_eq!(parsed.position.lat, 40.7128, epsilon = 1e-9);
        assert_relative_eq!(parsed.position.lon, -74.0060, epsilon = 1e-9);
        assert_eq!(parsed.time_ms, 1000);
        assert_relative_eq!(parsed.speed.unwrap(), 25.0);
        assert!(!parsed.acceleration_valid);
        assert_eq!(parsed.fix_type, FixType::NoFix);
        assert_eq!(parsed.altitude, None);
    }

    #[test]
    fn test_full_payload() {
        let parsed = parse_telemetry_json(
            r#"{"id":"car-7","lat":-338688000,"lon":1512093000,"time":42,
                "alt":58250,"speed":100,"course":27050,"fixType":4,"sats":17,"acc":-153}"#,
        )
        .unwrap();

        assert_relative_eq!(parsed.altitude.unwrap(), 58.25);
        assert_relative_eq!(parsed.speed.unwrap(), 1.0);
        assert_relative_eq!(parsed.course.unwrap(), 270.5);
        assert_eq!(parsed.fix_type, FixType::RtkFixed);
        assert!(parsed.fix_type.has_position());
        assert_eq!(parsed.satellites, Some(17));
        assert!(parsed.acceleration_valid);
        assert_relative_eq!(parsed.acceleration, -1.53);
    }

    #[test]
    fn test_fix_type_codes() {
        assert_eq!(FixType::from(5), FixType::RtkFloat);
        assert_eq!(FixType::from(9), FixType::Unknown(9));
        assert!(!FixType::from(0).has_position());
    }

    #[test]
    fn test_missing_required_field() {
        let err = parse_telemetry_json(r#"{"id":"A1","lat":1,"time":1}"#).unwrap_err();
        assert!(matches!(err, TelemetryError::Malformed(_)));
    }

    #[test]
    fn test_empty_id() {
        let err = parse_telemetry_json(r#"{"id":"","lat":1,"lon":1,"time":1}"#).unwrap_err();
        assert!(matches!(err, TelemetryError::EmptyId));
    }

    #[test]
    fn test_normalized_fix_at_origin() {
        let origin = coords::anchor_origin(GeodeticPoint::new(40.7128, -74.0060), 1000.0);
        let parsed = parse_telemetry_json(r#"{"id":"A1","lat":407128000,"lon":-740060000,"time":0}"#).unwrap();
        assert_relative_eq!(parsed.normalized(&origin).norm(), 0.0, epsilon = 1e-9);
    }
}
