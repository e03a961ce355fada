//! Immutable 2D vector algebra.

use serde::{Deserialize, Serialize};
use std::f64::consts::TAU;
use std::ops::{Add, Div, Mul, Neg, Sub};

/// 2D point or direction. All operations return new values.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct Vector2 {
    pub x: f64,
    pub y: f64,
}

impl Vector2 {
    pub const ZERO: Self = Self::new(0.0, 0.0);

    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Unit vector pointing at `radians` (counted from +x towards +y).
    #[must_use]
    pub fn from_angle(radians: f64) -> Self {
        Self::new(radians.cos(), radians.sin())
    }

    #[must_use]
    pub fn length(self) -> f64 {
        self.x.hypot(self.y)
    }

    #[must_use]
    pub fn dot(self, other: Self) -> f64 {
        self.x * other.x + self.y * other.y
    }

    /// Z component of the 3D cross product; positive when `other` turns towards +angle.
    #[must_use]
    pub fn cross(self, other: Self) -> f64 {
        self.x * other.y - self.y * other.x
    }

    /// Vector from `self` to `other`.
    #[must_use]
    pub fn to(self, other: Self) -> Self {
        other - self
    }

    #[must_use]
    pub fn distance(self, other: Self) -> f64 {
        (self - other).length()
    }

    /// Direction of the vector; the zero vector falls back to `(1, 0)`.
    #[must_use]
    pub fn unit(self) -> Self {
        let length = self.length();
        if length == 0.0 || !length.is_finite() {
            Self::new(1.0, 0.0)
        } else {
            self / length
        }
    }

    /// Angle in `[0, 2π)`, consistent with [`Vector2::from_angle`]. Zero for the zero vector.
    #[must_use]
    pub fn angle(self) -> f64 {
        if self.x == 0.0 && self.y == 0.0 {
            return 0.0;
        }
        let angle = self.y.atan2(self.x);
        if angle < 0.0 { angle + TAU } else { angle }
    }

    /// Counterclockwise rotation (in the +angle sense) by `radians`.
    #[must_use]
    pub fn rotate(self, radians: f64) -> Self {
        let (sin, cos) = radians.sin_cos();
        Self::new(self.x * cos - self.y * sin, self.x * sin + self.y * cos)
    }

    /// Point halfway between `self` and `other`.
    #[must_use]
    pub fn midpoint(self, other: Self) -> Self {
        (self + other) / 2.0
    }

    #[must_use]
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl Add for Vector2 {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Vector2 {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f64> for Vector2 {
    type Output = Self;

    fn mul(self, rhs: f64) -> Self {
        Self::new(self.x * rhs, self.y * rhs)
    }
}

impl Div<f64> for Vector2 {
    type Output = Self;

    fn div(self, rhs: f64) -> Self {
        Self::new(self.x / rhs, self.y / rhs)
    }
}

impl Neg for Vector2 {
    type Output = Self;

    fn neg(self) -> Self {
        Self::new(-self.x, -self.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::{FRAC_PI_2, PI};

    fn approx_eq(a: f64, b: f64, eps: f64) -> bool {
        (a - b).abs() <= eps
    }

    #[test]
    fn unit_of_zero_vector_is_finite() {
        assert_eq!(Vector2::ZERO.unit(), Vector2::new(1.0, 0.0));
        let unit = Vector2::new(3.0, 4.0).unit();
        assert!(approx_eq(unit.x, 0.6, 1e-12));
        assert!(approx_eq(unit.y, 0.8, 1e-12));
    }

    #[test]
    fn angle_round_trips_through_from_angle() {
        for step in 0..16 {
            let radians = step as f64 * PI / 8.0;
            let angle = Vector2::from_angle(radians).angle();
            let diff = (angle - radians).rem_euclid(TAU);
            assert!(diff < 1e-9 || TAU - diff < 1e-9, "{radians} -> {angle}");
        }
        assert_eq!(Vector2::ZERO.angle(), 0.0);
    }

    #[test]
    fn rotate_and_cross_agree_on_orientation() {
        let x = Vector2::new(1.0, 0.0);
        let turned = x.rotate(FRAC_PI_2);
        assert!(approx_eq(turned.x, 0.0, 1e-12));
        assert!(approx_eq(turned.y, 1.0, 1e-12));
        assert!(x.cross(turned) > 0.0);
        assert!(approx_eq(x.dot(turned), 0.0, 1e-12));
    }

    #[test]
    fn distance_and_to() {
        let a = Vector2::new(1.0, 1.0);
        let b = Vector2::new(4.0, 5.0);
        assert_eq!(a.to(b), Vector2::new(3.0, 4.0));
        assert!(approx_eq(a.distance(b), 5.0, 1e-12));
        assert_eq!(a.midpoint(b), Vector2::new(2.5, 3.0));
    }
}
