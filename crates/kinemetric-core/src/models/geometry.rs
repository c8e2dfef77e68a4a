// ABOUTME: Small value types for 3D positions, 2D projections, and device orientation
// ABOUTME: Vec3, Point2, and unit Quaternion with the algebra the analysis core needs
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign, Div, Mul, Neg, Sub};

/// 3D vector in meters (positions) or sensor units (acceleration, angular velocity)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec3 {
    /// X component
    pub x: f64,
    /// Y component
    pub y: f64,
    /// Z component
    pub z: f64,
}

impl Vec3 {
    /// Zero vector
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);
    /// Gravity-aligned world up axis
    pub const UP: Self = Self::new(0.0, 1.0, 0.0);

    /// Create a vector
    #[must_use]
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Dot product
    #[must_use]
    pub fn dot(self, other: Self) -> f64 {
        self.z.mul_add(other.z, self.x.mul_add(other.x, self.y * other.y))
    }

    /// Cross product
    #[must_use]
    pub fn cross(self, other: Self) -> Self {
        Self::new(
            self.y.mul_add(other.z, -(self.z * other.y)),
            self.z.mul_add(other.x, -(self.x * other.z)),
            self.x.mul_add(other.y, -(self.y * other.x)),
        )
    }

    /// Squared Euclidean length
    #[must_use]
    pub fn norm_squared(self) -> f64 {
        self.dot(self)
    }

    /// Euclidean length
    #[must_use]
    pub fn norm(self) -> f64 {
        self.norm_squared().sqrt()
    }

    /// Unit vector in the same direction, or `None` for a (near) zero vector
    #[must_use]
    pub fn normalized(self) -> Option<Self> {
        let n = self.norm();
        (n > f64::EPSILON).then(|| self / n)
    }

    /// Distance to another point
    #[must_use]
    pub fn distance(self, other: Self) -> f64 {
        (self - other).norm()
    }

    /// Component-wise mean of a set of points, `None` when empty
    #[must_use]
    pub fn centroid(points: &[Self]) -> Option<Self> {
        if points.is_empty() {
            return None;
        }
        let sum = points.iter().fold(Self::ZERO, |acc, p| acc + *p);
        Some(sum / points.len() as f64)
    }

    /// Components as an array
    #[must_use]
    pub const fn to_array(self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }
}

impl Add for Vec3 {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl AddAssign for Vec3 {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl Sub for Vec3 {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Mul<f64> for Vec3 {
    type Output = Self;
    fn mul(self, rhs: f64) -> Self {
        Self::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

impl Div<f64> for Vec3 {
    type Output = Self;
    fn div(self, rhs: f64) -> Self {
        Self::new(self.x / rhs, self.y / rhs, self.z / rhs)
    }
}

impl Neg for Vec3 {
    type Output = Self;
    fn neg(self) -> Self {
        Self::new(-self.x, -self.y, -self.z)
    }
}

/// Point in a 2D projection plane or normalized image space
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point2 {
    /// Horizontal coordinate
    pub x: f64,
    /// Vertical coordinate (image space: grows downward)
    pub y: f64,
}

impl Point2 {
    /// Create a point
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Distance to another point
    #[must_use]
    pub fn distance(self, other: Self) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    /// Vector from `self` to `other`
    #[must_use]
    pub fn to(self, other: Self) -> Self {
        Self::new(other.x - self.x, other.y - self.y)
    }

    /// Length when treated as a vector
    #[must_use]
    pub fn norm(self) -> f64 {
        self.x.hypot(self.y)
    }

    /// Unsigned angle between two vectors in degrees, `None` if either is zero
    #[must_use]
    pub fn angle_between_degrees(self, other: Self) -> Option<f64> {
        let denom = self.norm() * other.norm();
        if denom <= f64::EPSILON {
            return None;
        }
        let cos = self.x.mul_add(other.x, self.y * other.y) / denom;
        Some(cos.clamp(-1.0, 1.0).acos().to_degrees())
    }
}

/// Unit quaternion for device orientation (w + xi + yj + zk)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quaternion {
    /// Scalar part
    pub w: f64,
    /// i component
    pub x: f64,
    /// j component
    pub y: f64,
    /// k component
    pub z: f64,
}

impl Default for Quaternion {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Quaternion {
    /// No rotation
    pub const IDENTITY: Self = Self {
        w: 1.0,
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    /// Create a quaternion from raw components
    #[must_use]
    pub const fn new(w: f64, x: f64, y: f64, z: f64) -> Self {
        Self { w, x, y, z }
    }

    /// Rotation of `radians` about `axis`; identity when the axis is zero
    #[must_use]
    pub fn from_axis_angle(axis: Vec3, radians: f64) -> Self {
        let Some(unit) = axis.normalized() else {
            return Self::IDENTITY;
        };
        let (sin, cos) = (radians / 2.0).sin_cos();
        Self::new(cos, unit.x * sin, unit.y * sin, unit.z * sin)
    }

    /// Four-component dot product
    #[must_use]
    pub fn dot(self, other: Self) -> f64 {
        self.z.mul_add(
            other.z,
            self.y
                .mul_add(other.y, self.w.mul_add(other.w, self.x * other.x)),
        )
    }

    /// Rotation angle separating two orientations, in radians within [0, π]
    #[must_use]
    pub fn angle_to(self, other: Self) -> f64 {
        2.0 * self.dot(other).abs().min(1.0).acos()
    }

    /// Hamilton product
    #[must_use]
    pub fn mul(self, rhs: Self) -> Self {
        Self::new(
            self.w * rhs.w - self.x * rhs.x - self.y * rhs.y - self.z * rhs.z,
            self.w * rhs.x + self.x * rhs.w + self.y * rhs.z - self.z * rhs.y,
            self.w * rhs.y - self.x * rhs.z + self.y * rhs.w + self.z * rhs.x,
            self.w * rhs.z + self.x * rhs.y - self.y * rhs.x + self.z * rhs.w,
        )
    }

    /// Inverse of a unit quaternion
    #[must_use]
    pub const fn conjugate(self) -> Self {
        Self::new(self.w, -self.x, -self.y, -self.z)
    }

    /// Rotate a vector by this orientation (device frame to world frame)
    #[must_use]
    pub fn rotate(self, v: Vec3) -> Vec3 {
        let p = Self::new(0.0, v.x, v.y, v.z);
        let r = self.mul(p).mul(self.conjugate());
        Vec3::new(r.x, r.y, r.z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::{FRAC_PI_2, PI};

    #[test]
    fn test_cross_follows_right_hand_rule() {
        let x = Vec3::new(1.0, 0.0, 0.0);
        let y = Vec3::new(0.0, 1.0, 0.0);
        assert_eq!(x.cross(y), Vec3::new(0.0, 0.0, 1.0));
    }

    #[test]
    fn test_quaternion_separation() {
        let axis = Vec3::new(0.0, 0.0, 1.0);
        let a = Quaternion::from_axis_angle(axis, 0.0);
        let b = Quaternion::from_axis_angle(axis, FRAC_PI_2);
        let c = Quaternion::from_axis_angle(axis, PI);
        assert!((a.angle_to(b) - FRAC_PI_2).abs() < 1e-9);
        assert!((a.angle_to(c) - PI).abs() < 1e-9);
    }

    #[test]
    fn test_rotate_quarter_turn() {
        let q = Quaternion::from_axis_angle(Vec3::new(0.0, 0.0, 1.0), FRAC_PI_2);
        let v = q.rotate(Vec3::new(1.0, 0.0, 0.0));
        assert!((v.x).abs() < 1e-9);
        assert!((v.y - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_angle_between_orthogonal_vectors() {
        let a = Point2::new(0.0, 1.0);
        let b = Point2::new(1.0, 0.0);
        let angle = a.angle_between_degrees(b);
        assert!(angle.is_some_and(|deg| (deg - 90.0).abs() < 1e-9));
        assert!(a.angle_between_degrees(Point2::default()).is_none());
    }
}
