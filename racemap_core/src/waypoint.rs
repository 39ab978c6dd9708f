//! Waypoint text parsing.
//!
//! Two line formats are accepted:
//! - `"<x> <y>"`: an already-normalized point (quick manual testing)
//! - `D°M'S" D°M'S"`: a latitude/longitude pair in degrees-minutes-seconds

use crate::error::WaypointError;
use crate::types::{GeodeticPoint, NormalizedPoint};

/// A parsed waypoint line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Waypoint {
    Normalized(NormalizedPoint),
    Geodetic(GeodeticPoint),
}

/// Parses one input line in either accepted format.
pub fn parse_waypoint_line(line: &str) -> Result<Waypoint, WaypointError> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Err(WaypointError::Empty);
    }

    let tokens: Vec<&str> = trimmed.split_whitespace().collect();
    if let [x, y] = tokens.as_slice() {
        if let (Ok(x), Ok(y)) = (x.parse::<f64>(), y.parse::<f64>()) {
            if x.is_finite() && y.is_finite() {
                return Ok(Waypoint::Normalized(NormalizedPoint::new(x, y)));
            }
        }
    }

    parse_dms_pair(trimmed).map(Waypoint::Geodetic)
}

/// Parses a `D°M'S" D°M'S"` latitude/longitude pair.
///
/// Every character other than digits, `.` and `-` is treated as a separator,
/// and exactly six numeric fields must remain. A negative degree field makes
/// the whole coordinate negative.
pub fn parse_dms_pair(line: &str) -> Result<GeodeticPoint, WaypointError> {
    let cleaned: String = line
        .chars()
        .map(|c| if c.is_ascii_digit() || c == '.' || c == '-' { c } else { ' ' })
        .collect();

    let fields = cleaned
        .split_whitespace()
        .map(|field| {
            field
                .parse::<f64>()
                .map_err(|_| WaypointError::InvalidNumber(field.to_string()))
        })
        .collect::<Result<Vec<f64>, _>>()?;

    let &[lat_d, lat_m, lat_s, lon_d, lon_m, lon_s] = fields.as_slice() else {
        return Err(WaypointError::FieldCount(fields.len()));
    };

    let lat = dms_to_decimal(lat_d, lat_m, lat_s, line)?;
    let lon = dms_to_decimal(lon_d, lon_m, lon_s, line)?;

    if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
        return Err(WaypointError::OutOfRange { lat, lon });
    }

    Ok(GeodeticPoint::new(lat, lon))
}

/// `deg + min/60 + sec/3600`, signed by the degree field.
pub fn dms_to_decimal(degrees: f64, minutes: f64, seconds: f64, source: &str) -> Result<f64, WaypointError> {
    if !(0.0..60.0).contains(&minutes) || !(0.0..60.0).contains(&seconds) {
        return Err(WaypointError::InvalidMinutesSeconds(source.to_string()));
    }

    let magnitude = degrees.abs() + minutes / 60.0 + seconds / 3600.0;
    Ok(if degrees.is_sign_negative() {
        -magnitude
    } else {
        magnitude
    })
}

/// Lines of a track payload worth parsing: non-empty and containing a digit.
pub fn payload_lines(payload: &str) -> impl Iterator<Item = (usize, &str)> {
    payload
        .lines()
        .enumerate()
        .filter(|(_, line)| line.chars().any(|c| c.is_ascii_digit()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_normalized_line() {
        assert_eq!(
            parse_waypoint_line("0.25 -1.5").unwrap(),
            Waypoint::Normalized(NormalizedPoint::new(0.25, -1.5))
        );
    }

    #[test]
    fn test_dms_line() {
        let parsed = parse_waypoint_line("52°4'14.2\" 1°1'2.6\"").unwrap();
        let Waypoint::Geodetic(g) = parsed else {
            panic!("expected geodetic waypoint");
        };
        assert_relative_eq!(g.lat, 52.0 + 4.0 / 60.0 + 14.2 / 3600.0, epsilon = 1e-12);
        assert_relative_eq!(g.lon, 1.0 + 1.0 / 60.0 + 2.6 / 3600.0, epsilon = 1e-12);
    }

    #[test]
    fn test_negative_degrees_sign_whole_value() {
        let g = parse_dms_pair("-33°52'7.7\" 151°12'33.5\"").unwrap();
        assert_relative_eq!(g.lat, -(33.0 + 52.0 / 60.0 + 7.7 / 3600.0), epsilon = 1e-12);
        assert!(g.lon > 151.0);

        let g = parse_dms_pair("-0°30'0\" -0°15'0\"").unwrap();
        assert_relative_eq!(g.lat, -0.5);
        assert_relative_eq!(g.lon, -0.25);
    }

    #[test]
    fn test_wrong_field_count() {
        assert_eq!(parse_dms_pair("52°4'14\" 1°1'"), Err(WaypointError::FieldCount(5)));
        assert_eq!(parse_waypoint_line("1.0"), Err(WaypointError::FieldCount(1)));
    }

    #[test]
    fn test_invalid_values() {
        assert!(matches!(
            parse_dms_pair("52°61'0\" 1°1'2\""),
            Err(WaypointError::InvalidMinutesSeconds(_))
        ));
        assert!(matches!(
            parse_dms_pair("95°0'0\" 1°1'2\""),
            Err(WaypointError::OutOfRange { .. })
        ));
        assert!(matches!(
            parse_dms_pair("5-2°0'0\" 1°1'2\""),
            Err(WaypointError::InvalidNumber(_))
        ));
        assert_eq!(parse_waypoint_line("   "), Err(WaypointError::Empty));
    }

    #[test]
    fn test_payload_lines_skip_blank_and_text() {
        let payload = "Silverstone\n\n52°4'14\" 1°1'2\"\n  \n52°4'20\" 1°1'5\"\n";
        let lines: Vec<_> = payload_lines(payload).map(|(i, _)| i).collect();
        assert_eq!(lines, vec![2, 4]);
    }
}
