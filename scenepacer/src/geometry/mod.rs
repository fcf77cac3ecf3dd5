//! World-space vector math.
//!
//! Scenes are expressed in Earth-centered, Earth-fixed (ECEF) Cartesian
//! coordinates in metres, the same frame tile-streaming renderers use for
//! globe content. Local-frame scenes (tests, flat demos) can use the same
//! type with an arbitrary origin.

use std::ops::{Add, Mul, Neg, Sub};

use serde::{Deserialize, Serialize};

/// Magnitudes below this are treated as zero-length.
pub const EPSILON: f64 = 1e-9;

/// WGS84 semi-major axis (metres).
pub const WGS84_A: f64 = 6_378_137.0;

/// WGS84 flattening.
pub const WGS84_F: f64 = 1.0 / 298.257_223_563;

/// WGS84 first eccentricity squared.
pub const WGS84_E2: f64 = WGS84_F * (2.0 - WGS84_F);

/// A 3D Cartesian position or direction.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Cartesian3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Cartesian3 {
    pub const ZERO: Cartesian3 = Cartesian3::new(0.0, 0.0, 0.0);
    pub const UNIT_X: Cartesian3 = Cartesian3::new(1.0, 0.0, 0.0);
    pub const UNIT_Y: Cartesian3 = Cartesian3::new(0.0, 1.0, 0.0);
    pub const UNIT_Z: Cartesian3 = Cartesian3::new(0.0, 0.0, 1.0);

    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Convert WGS84 geodetic coordinates (degrees, metres) to ECEF.
    pub fn from_degrees(lon_deg: f64, lat_deg: f64, height_m: f64) -> Self {
        let lat = lat_deg.to_radians();
        let lon = lon_deg.to_radians();
        let (sin_lat, cos_lat) = lat.sin_cos();
        let (sin_lon, cos_lon) = lon.sin_cos();

        let n = WGS84_A / (1.0 - WGS84_E2 * sin_lat * sin_lat).sqrt();
        Self::new(
            (n + height_m) * cos_lat * cos_lon,
            (n + height_m) * cos_lat * sin_lon,
            (n * (1.0 - WGS84_E2) + height_m) * sin_lat,
        )
    }

    pub fn dot(self, other: Self) -> f64 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    pub fn cross(self, other: Self) -> Self {
        Self::new(
            self.y * other.z - self.z * other.y,
            self.z * other.x - self.x * other.z,
            self.x * other.y - self.y * other.x,
        )
    }

    pub fn magnitude(self) -> f64 {
        self.dot(self).sqrt()
    }

    pub fn distance(self, other: Self) -> f64 {
        (self - other).magnitude()
    }

    /// Unit vector in the same direction, or `None` for a (near) zero vector.
    pub fn normalize(self) -> Option<Self> {
        let m = self.magnitude();
        if m < EPSILON || !m.is_finite() {
            None
        } else {
            Some(self * (1.0 / m))
        }
    }

    /// Rotate around a unit `axis` by `angle` radians (right-hand rule).
    ///
    /// Rodrigues: `v cos t + (k x v) sin t + k (k . v)(1 - cos t)`.
    pub fn rotate_about(self, axis: Self, angle: f64) -> Self {
        let (sin, cos) = angle.sin_cos();
        self * cos + axis.cross(self) * sin + axis * (axis.dot(self) * (1.0 - cos))
    }

    /// Azimuth of this vector in the XY plane, in radians.
    pub fn azimuth(self) -> f64 {
        self.y.atan2(self.x)
    }
}

impl Add for Cartesian3 {
    type Output = Self;

    fn add(self, other: Self) -> Self::Output {
        Self::new(self.x + other.x, self.y + other.y, self.z + other.z)
    }
}

impl Sub for Cartesian3 {
    type Output = Self;

    fn sub(self, other: Self) -> Self::Output {
        Self::new(self.x - other.x, self.y - other.y, self.z - other.z)
    }
}

impl Mul<f64> for Cartesian3 {
    type Output = Self;

    fn mul(self, scale: f64) -> Self::Output {
        Self::new(self.x * scale, self.y * scale, self.z * scale)
    }
}

impl Neg for Cartesian3 {
    type Output = Self;

    fn neg(self) -> Self::Output {
        Self::new(-self.x, -self.y, -self.z)
    }
}

impl std::fmt::Display for Cartesian3 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.3}, {:.3}, {:.3})", self.x, self.y, self.z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::FRAC_PI_2;

    fn assert_close(a: Cartesian3, b: Cartesian3) {
        assert!(
            a.distance(b) < 1e-9,
            "expected {} to be close to {}",
            a,
            b
        );
    }

    #[test]
    fn test_add_sub_scale() {
        let a = Cartesian3::new(1.0, 2.0, -1.0);
        let b = Cartesian3::new(0.5, -2.0, 3.0);
        assert_eq!(a + b, Cartesian3::new(1.5, 0.0, 2.0));
        assert_eq!(a - b, Cartesian3::new(0.5, 4.0, -4.0));
        assert_eq!(a * 2.0, Cartesian3::new(2.0, 4.0, -2.0));
        assert_eq!(-a, Cartesian3::new(-1.0, -2.0, 1.0));
    }

    #[test]
    fn test_dot_and_cross() {
        assert_eq!(Cartesian3::UNIT_X.dot(Cartesian3::UNIT_Y), 0.0);
        assert_eq!(
            Cartesian3::UNIT_X.cross(Cartesian3::UNIT_Y),
            Cartesian3::UNIT_Z
        );
    }

    #[test]
    fn test_normalize_zero_vector_is_none() {
        assert!(Cartesian3::ZERO.normalize().is_none());
        assert!(Cartesian3::new(1e-12, 0.0, 0.0).normalize().is_none());
    }

    #[test]
    fn test_normalize_unit_length() {
        let n = Cartesian3::new(3.0, 4.0, 0.0).normalize().unwrap();
        assert!((n.magnitude() - 1.0).abs() < 1e-12);
        assert_close(n, Cartesian3::new(0.6, 0.8, 0.0));
    }

    #[test]
    fn test_rotate_about_z_quarter_turn() {
        let rotated = Cartesian3::UNIT_X.rotate_about(Cartesian3::UNIT_Z, FRAC_PI_2);
        assert_close(rotated, Cartesian3::UNIT_Y);

        let back = rotated.rotate_about(Cartesian3::UNIT_Z, -FRAC_PI_2);
        assert_close(back, Cartesian3::UNIT_X);
    }

    #[test]
    fn test_rotate_preserves_axis_component() {
        let v = Cartesian3::new(1.0, 0.0, 2.0);
        let rotated = v.rotate_about(Cartesian3::UNIT_Z, 1.0);
        assert!((rotated.z - 2.0).abs() < 1e-12);
        assert!((rotated.magnitude() - v.magnitude()).abs() < 1e-12);
    }

    #[test]
    fn test_from_degrees_equator_prime_meridian() {
        let p = Cartesian3::from_degrees(0.0, 0.0, 0.0);
        assert_close(p, Cartesian3::new(WGS84_A, 0.0, 0.0));
    }

    #[test]
    fn test_from_degrees_north_pole() {
        let p = Cartesian3::from_degrees(0.0, 90.0, 0.0);
        // Polar radius is ~6356752 m
        assert!(p.x.abs() < 1e-6);
        assert!((p.z - 6_356_752.314).abs() < 1.0, "got z = {}", p.z);
    }

    #[test]
    fn test_from_degrees_height_extends_radius() {
        let ground = Cartesian3::from_degrees(10.0, 45.0, 0.0);
        let raised = Cartesian3::from_degrees(10.0, 45.0, 1000.0);
        assert!((raised.distance(ground) - 1000.0).abs() < 1e-6);
    }
}
