//! Equatorial coordinate handling
//!
//! Positions are stored as RA/Dec in radians. RA is normalized into
//! [0, 2π) on construction; [`wrap_ra`] provides the symmetric convention
//! used for box cuts that straddle RA = 0.

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Equatorial coordinates (RA/Dec)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Equatorial {
    /// Right ascension in radians
    pub ra: f64,
    /// Declination in radians
    pub dec: f64,
}

impl Equatorial {
    pub fn new(ra: f64, dec: f64) -> Self {
        let normalized_ra = ra.rem_euclid(2.0 * PI);
        Equatorial {
            ra: normalized_ra,
            dec,
        }
    }

    /// Create a new Equatorial coordinate with values in degrees
    pub fn from_degrees(ra_deg: f64, dec_deg: f64) -> Self {
        Self::new(ra_deg.to_radians(), dec_deg.to_radians())
    }

    /// Get right ascension in degrees
    pub fn ra_degrees(&self) -> f64 {
        self.ra.to_degrees()
    }

    /// Get declination in degrees
    pub fn dec_degrees(&self) -> f64 {
        self.dec.to_degrees()
    }

    /// Unit vector pointing at these coordinates
    pub fn to_unit_vector(&self) -> Vector3<f64> {
        let cos_dec = self.dec.cos();
        Vector3::new(
            cos_dec * self.ra.cos(),
            cos_dec * self.ra.sin(),
            self.dec.sin(),
        )
    }

    /// Angular separation to another coordinate in radians
    pub fn angle_between(&self, other: &Equatorial) -> f64 {
        let cos_angle = self.to_unit_vector().dot(&other.to_unit_vector());

        // Handle numerical precision issues
        if cos_angle >= 1.0 {
            0.0
        } else if cos_angle <= -1.0 {
            PI
        } else {
            cos_angle.acos()
        }
    }
}

/// Re-wrap a right ascension in [0, 2π) into the symmetric range [-π, π).
///
/// Values below π pass through unchanged; values at or above π come back
/// shifted by -2π.
pub fn wrap_ra(ra: f64) -> f64 {
    if ra < PI {
        ra
    } else {
        ra - 2.0 * PI
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_construction_normalizes_ra() {
        let coord = Equatorial::new(2.5 * PI, 0.3);
        assert_relative_eq!(coord.ra, 0.5 * PI, epsilon = 1e-12);
        assert_relative_eq!(coord.dec, 0.3, epsilon = 1e-12);

        let coord = Equatorial::new(-0.25 * PI, -0.1);
        assert_relative_eq!(coord.ra, 1.75 * PI, epsilon = 1e-12);
    }

    #[test]
    fn test_degree_conversions() {
        let coord = Equatorial::from_degrees(180.0, -45.0);
        assert_relative_eq!(coord.ra, PI, epsilon = 1e-12);
        assert_relative_eq!(coord.ra_degrees(), 180.0, epsilon = 1e-10);
        assert_relative_eq!(coord.dec_degrees(), -45.0, epsilon = 1e-10);
    }

    #[test]
    fn test_angle_between() {
        // Same point should have zero separation
        let p1 = Equatorial::new(1.0, 0.5);
        assert!(p1.angle_between(&p1).abs() < 1e-10);

        // Opposite points on the equator are PI apart
        let p2 = Equatorial::new(0.0, 0.0);
        let p3 = Equatorial::new(PI, 0.0);
        assert_relative_eq!(p2.angle_between(&p3), PI, epsilon = 1e-10);

        // Equator to pole is PI/2
        let pole = Equatorial::new(0.0, PI / 2.0);
        assert_relative_eq!(p2.angle_between(&pole), PI / 2.0, epsilon = 1e-10);

        // Polaris to Vega is about 51 degrees
        let polaris = Equatorial::from_degrees(37.95, 89.26);
        let vega = Equatorial::from_degrees(279.23, 38.78);
        let dist_deg = polaris.angle_between(&vega).to_degrees();
        assert!((dist_deg - 51.0).abs() < 1.0);
    }

    #[test]
    fn test_wrap_ra_symmetric_range() {
        // Below PI passes through
        assert_relative_eq!(wrap_ra(0.0), 0.0, epsilon = 1e-12);
        assert_relative_eq!(wrap_ra(1.0), 1.0, epsilon = 1e-12);

        // At and above PI shifts down by a full turn
        assert_relative_eq!(wrap_ra(PI), -PI, epsilon = 1e-12);
        assert_relative_eq!(wrap_ra(1.75 * PI), -0.25 * PI, epsilon = 1e-12);

        // Whole [0, 2PI) domain lands in [-PI, PI)
        for i in 0..100 {
            let ra = i as f64 * 2.0 * PI / 100.0;
            let wrapped = wrap_ra(ra);
            assert!(wrapped >= -PI && wrapped < PI, "wrap_ra({}) = {}", ra, wrapped);
        }
    }

    #[test]
    fn test_unit_vector() {
        let v = Equatorial::new(0.0, 0.0).to_unit_vector();
        assert_relative_eq!(v.x, 1.0, epsilon = 1e-12);
        assert_relative_eq!(v.y, 0.0, epsilon = 1e-12);
        assert_relative_eq!(v.z, 0.0, epsilon = 1e-12);

        let v = Equatorial::new(0.0, PI / 2.0).to_unit_vector();
        assert_relative_eq!(v.z, 1.0, epsilon = 1e-12);
        assert_relative_eq!(v.norm(), 1.0, epsilon = 1e-12);
    }
}
