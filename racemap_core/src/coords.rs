//! The Coordinate Transformer - WGS84 ⇄ UTM ⇄ normalized map frame
//!
//! Geodetic waypoints are projected with the Transverse Mercator (Krüger
//! series, third order in the third flattening), then shifted and scaled into
//! the dimensionless map frame anchored at the session [`Origin`].
//!
//! Every operation has a fallible `try_*` form. The plain forms never fail:
//! a projection error is logged and replaced by a zero point, so a corrupt
//! waypoint collapses onto the origin instead of aborting the pipeline.

use crate::error::ProjectionError;
use crate::types::{GeodeticPoint, NormalizedPoint, Origin, PlanarPoint, UtmZone};
use tracing::warn;

/// WGS84 semi-major axis (meters).
pub const WGS84_A: f64 = 6_378_137.0;
/// WGS84 flattening.
pub const WGS84_F: f64 = 1.0 / 298.257_223_563;

/// UTM central scale factor.
pub const UTM_K0: f64 = 0.9996;
/// UTM false easting (meters).
pub const FALSE_EASTING: f64 = 500_000.0;
/// UTM false northing for the southern hemisphere (meters).
pub const FALSE_NORTHING_SOUTH: f64 = 10_000_000.0;

/// Latitude band letters from -80° upward, 8° each (X spans 72°..84°).
const BANDS: &[u8; 20] = b"CDEFGHJKLMNPQRSTUVWX";

/// Coefficients of the Krüger series for one ellipsoid.
struct KrugerSeries {
    /// First eccentricity
    e: f64,
    /// Rectifying radius
    a_rect: f64,
    alpha: [f64; 3],
    beta: [f64; 3],
    delta: [f64; 3],
}

impl KrugerSeries {
    fn wgs84() -> Self {
        let n = WGS84_F / (2.0 - WGS84_F);
        let n2 = n * n;
        let n3 = n2 * n;

        Self {
            e: 2.0 * n.sqrt() / (1.0 + n),
            a_rect: WGS84_A / (1.0 + n) * (1.0 + n2 / 4.0 + n2 * n2 / 64.0),
            alpha: [
                n / 2.0 - 2.0 * n2 / 3.0 + 5.0 * n3 / 16.0,
                13.0 * n2 / 48.0 - 3.0 * n3 / 5.0,
                61.0 * n3 / 240.0,
            ],
            beta: [
                n / 2.0 - 2.0 * n2 / 3.0 + 37.0 * n3 / 96.0,
                n2 / 48.0 + n3 / 15.0,
                17.0 * n3 / 480.0,
            ],
            delta: [
                2.0 * n - 2.0 * n2 / 3.0 - 2.0 * n3,
                7.0 * n2 / 3.0 - 8.0 * n3 / 5.0,
                56.0 * n3 / 15.0,
            ],
        }
    }
}

fn validate_geodetic(point: GeodeticPoint) -> Result<(), ProjectionError> {
    if !point.lat.is_finite() || !point.lon.is_finite() {
        return Err(ProjectionError::NonFinite {
            lat: point.lat,
            lon: point.lon,
        });
    }
    if !(-90.0..=90.0).contains(&point.lat) {
        return Err(ProjectionError::LatitudeOutOfRange(point.lat));
    }
    if !(-180.0..=180.0).contains(&point.lon) {
        return Err(ProjectionError::LongitudeOutOfRange(point.lon));
    }
    Ok(())
}

fn validate_zone(zone: UtmZone) -> Result<(), ProjectionError> {
    if (1..=60).contains(&zone.number) {
        Ok(())
    } else {
        Err(ProjectionError::InvalidZone(zone.number))
    }
}

fn false_northing(zone: UtmZone) -> f64 {
    if zone.northern {
        0.0
    } else {
        FALSE_NORTHING_SOUTH
    }
}

/// Latitude band letter for a latitude in degrees.
///
/// Latitudes beyond the UTM range map to `Z` (north) and `A` (south).
pub fn band_letter(lat: f64) -> char {
    if lat > 84.0 {
        'Z'
    } else if lat < -80.0 {
        'A'
    } else {
        let index = (((lat + 80.0) / 8.0).floor() as usize).min(BANDS.len() - 1);
        BANDS[index] as char
    }
}

/// UTM zone number for a position, including the Norway and Svalbard
/// exceptions.
pub fn zone_number(lat: f64, lon: f64) -> u8 {
    if (56.0..64.0).contains(&lat) && (3.0..12.0).contains(&lon) {
        return 32;
    }

    if (72.0..=84.0).contains(&lat) && lon >= 0.0 {
        if lon < 9.0 {
            return 31;
        } else if lon < 21.0 {
            return 33;
        } else if lon < 33.0 {
            return 35;
        } else if lon < 42.0 {
            return 37;
        }
    }

    (((lon + 180.0) / 6.0).floor() as i64 + 1).clamp(1, 60) as u8
}

/// Full zone identifier for a geodetic point.
pub fn zone_for(point: GeodeticPoint) -> UtmZone {
    UtmZone {
        number: zone_number(point.lat, point.lon),
        northern: point.lat >= 0.0,
        band: band_letter(point.lat),
    }
}

/// Projects a geodetic point into its own UTM zone.
pub fn try_forward(point: GeodeticPoint) -> Result<PlanarPoint, ProjectionError> {
    validate_geodetic(point)?;
    try_forward_in_zone(point, zone_for(point))
}

/// Projects a geodetic point into a fixed UTM zone.
///
/// Used to keep every point of a track in the zone of its origin, even when
/// the track straddles a zone boundary.
pub fn try_forward_in_zone(
    point: GeodeticPoint,
    zone: UtmZone,
) -> Result<PlanarPoint, ProjectionError> {
    validate_geodetic(point)?;
    validate_zone(zone)?;

    let series = KrugerSeries::wgs84();
    let phi = point.lat.to_radians();
    let dlam = (point.lon - zone.central_meridian()).to_radians();

    // Conformal latitude, expressed through its tangent
    let sin_phi = phi.sin();
    let t = (sin_phi.atanh() - series.e * (series.e * sin_phi).atanh()).sinh();

    let xi_p = t.atan2(dlam.cos());
    let eta_p = (dlam.sin() / (1.0 + t * t).sqrt()).atanh();

    let mut xi = xi_p;
    let mut eta = eta_p;
    for (j, alpha) in series.alpha.iter().enumerate() {
        let k = 2.0 * (j + 1) as f64;
        xi += alpha * (k * xi_p).sin() * (k * eta_p).cosh();
        eta += alpha * (k * xi_p).cos() * (k * eta_p).sinh();
    }

    let easting = FALSE_EASTING + UTM_K0 * series.a_rect * eta;
    let northing = false_northing(zone) + UTM_K0 * series.a_rect * xi;

    if !easting.is_finite() || !northing.is_finite() {
        return Err(ProjectionError::NonFinite {
            lat: point.lat,
            lon: point.lon,
        });
    }

    Ok(PlanarPoint::new(easting, northing, zone))
}

/// Inverse projection of a planar point within its zone.
pub fn try_reverse(point: PlanarPoint) -> Result<GeodeticPoint, ProjectionError> {
    validate_zone(point.zone)?;
    if !point.easting.is_finite() || !point.northing.is_finite() {
        return Err(ProjectionError::NonFinitePlanar {
            easting: point.easting,
            northing: point.northing,
        });
    }

    let series = KrugerSeries::wgs84();
    let xi = (point.northing - false_northing(point.zone)) / (UTM_K0 * series.a_rect);
    let eta = (point.easting - FALSE_EASTING) / (UTM_K0 * series.a_rect);

    let mut xi_p = xi;
    let mut eta_p = eta;
    for (j, beta) in series.beta.iter().enumerate() {
        let k = 2.0 * (j + 1) as f64;
        xi_p -= beta * (k * xi).sin() * (k * eta).cosh();
        eta_p -= beta * (k * xi).cos() * (k * eta).sinh();
    }

    let chi = (xi_p.sin() / eta_p.cosh()).clamp(-1.0, 1.0).asin();
    let mut phi = chi;
    for (j, delta) in series.delta.iter().enumerate() {
        let k = 2.0 * (j + 1) as f64;
        phi += delta * (k * chi).sin();
    }

    let lam = eta_p.sinh().atan2(xi_p.cos());
    let mut lon = point.zone.central_meridian() + lam.to_degrees();
    if lon > 180.0 {
        lon -= 360.0;
    } else if lon < -180.0 {
        lon += 360.0;
    }

    let result = GeodeticPoint::new(phi.to_degrees(), lon);
    validate_geodetic(result)?;
    Ok(result)
}

/// Projects a geodetic point, substituting a zero planar point on failure.
pub fn forward(point: GeodeticPoint) -> PlanarPoint {
    try_forward(point).unwrap_or_else(|err| {
        warn!(%err, lat = point.lat, lon = point.lon, "forward projection failed, using zero point");
        PlanarPoint::zero(UtmZone::default())
    })
}

/// Projects into a fixed zone, substituting a zero planar point on failure.
pub fn forward_in_zone(point: GeodeticPoint, zone: UtmZone) -> PlanarPoint {
    try_forward_in_zone(point, zone).unwrap_or_else(|err| {
        warn!(%err, lat = point.lat, lon = point.lon, %zone, "forward projection failed, using zero point");
        PlanarPoint::zero(zone)
    })
}

/// Inverse projection, substituting the zero geodetic point on failure.
pub fn reverse(point: PlanarPoint) -> GeodeticPoint {
    try_reverse(point).unwrap_or_else(|err| {
        warn!(%err, easting = point.easting, northing = point.northing, "reverse projection failed, using zero point");
        GeodeticPoint::default()
    })
}

/// Creates the session origin from its first waypoint.
pub fn try_anchor_origin(point: GeodeticPoint, map_size: f64) -> Result<Origin, ProjectionError> {
    let planar = try_forward(point)?;
    Ok(Origin {
        geodetic: point,
        planar,
        map_size,
    })
}

/// Creates the session origin, falling back to a zero planar anchor.
pub fn anchor_origin(point: GeodeticPoint, map_size: f64) -> Origin {
    Origin {
        geodetic: point,
        planar: forward(point),
        map_size,
    }
}

/// `(planar - origin.planar) / origin.map_size`
pub fn normalize(point: PlanarPoint, origin: &Origin) -> NormalizedPoint {
    (point.as_vector() - origin.planar.as_vector()) / origin.map_size
}

/// Inverse of [`normalize`], in the origin's zone.
pub fn denormalize(point: NormalizedPoint, origin: &Origin) -> PlanarPoint {
    let meters = origin.planar.as_vector() + point * origin.map_size;
    PlanarPoint::new(meters.x, meters.y, origin.zone())
}

/// Geodetic → normalized map frame, using the origin's zone.
pub fn project(point: GeodeticPoint, origin: &Origin) -> NormalizedPoint {
    normalize(forward_in_zone(point, origin.zone()), origin)
}

/// Fallible form of [`project`].
pub fn try_project(point: GeodeticPoint, origin: &Origin) -> Result<NormalizedPoint, ProjectionError> {
    Ok(normalize(try_forward_in_zone(point, origin.zone())?, origin))
}

/// Normalized map frame → geodetic.
pub fn unproject(point: NormalizedPoint, origin: &Origin) -> GeodeticPoint {
    reverse(denormalize(point, origin))
}
