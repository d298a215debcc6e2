//! Geodesic helpers for the location trigger engine.

use crate::defaults::EARTH_RADIUS_METERS;
use crate::error::{Error, Result};

/// Great-circle distance between two coordinates in meters, using the
/// haversine formula on a spherical earth.
pub fn haversine_meters(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let d_phi = (lat2 - lat1).to_radians();
    let d_lambda = (lng2 - lng1).to_radians();

    let a = (d_phi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_METERS * c
}

/// Validate caller-supplied coordinates before they enter the trigger
/// engine. Both fields are reported when both are out of range.
pub fn validate_coordinates(lat: f64, lng: f64) -> Result<()> {
    let mut problems = Vec::new();
    if !lat.is_finite() || !(-90.0..=90.0).contains(&lat) {
        problems.push(format!("lat must be within [-90, 90], got {}", lat));
    }
    if !lng.is_finite() || !(-180.0..=180.0).contains(&lng) {
        problems.push(format!("lng must be within [-180, 180], got {}", lng));
    }
    if problems.is_empty() {
        Ok(())
    } else {
        Err(Error::InvalidInput(problems.join("; ")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_haversine_zero_distance() {
        assert_eq!(haversine_meters(51.5, -0.12, 51.5, -0.12), 0.0);
    }

    #[test]
    fn test_haversine_sixty_meters_east_of_origin() {
        // 0.00054 degrees of longitude at the equator is roughly 60 m.
        let d = haversine_meters(0.0, 0.0, 0.0, 0.00054);
        assert!((d - 60.0).abs() < 1.0, "expected ~60m, got {}", d);
    }

    #[test]
    fn test_haversine_hundred_eleven_meters() {
        // 0.001 degrees of longitude at the equator is roughly 111 m.
        let d = haversine_meters(0.0, 0.0, 0.0, 0.001);
        assert!((d - 111.0).abs() < 2.0, "expected ~111m, got {}", d);
    }

    #[test]
    fn test_haversine_symmetric() {
        let a = haversine_meters(48.85, 2.35, 40.71, -74.01);
        let b = haversine_meters(40.71, -74.01, 48.85, 2.35);
        assert!((a - b).abs() < 1e-6);
    }

    #[test]
    fn test_haversine_paris_to_new_york() {
        // Known distance is about 5,837 km.
        let d = haversine_meters(48.8566, 2.3522, 40.7128, -74.0060);
        assert!((d - 5_837_000.0).abs() < 20_000.0, "got {}", d);
    }

    #[test]
    fn test_validate_coordinates_ok() {
        assert!(validate_coordinates(0.0, 0.0).is_ok());
        assert!(validate_coordinates(-90.0, 180.0).is_ok());
        assert!(validate_coordinates(90.0, -180.0).is_ok());
    }

    #[test]
    fn test_validate_coordinates_out_of_range() {
        assert!(validate_coordinates(91.0, 0.0).is_err());
        assert!(validate_coordinates(0.0, 181.0).is_err());
        assert!(validate_coordinates(f64::NAN, 0.0).is_err());
    }

    #[test]
    fn test_validate_coordinates_reports_both_fields() {
        let err = validate_coordinates(95.0, -200.0).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("lat"));
        assert!(msg.contains("lng"));
    }
}
