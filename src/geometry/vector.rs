//! 2D/3D vector primitives.
//!
//! Degenerate inputs are absorbed rather than propagated: normalizing a zero
//! vector yields the zero vector and the angle to a zero-length vector is 0,
//! never NaN. Upstream signal noise must not poison downstream scoring.

use serde::{Deserialize, Serialize};

/// A 2D point, typically in normalized screen coordinates (0–1).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point2 {
    pub x: f64,
    pub y: f64,
}

impl Point2 {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// True if both components are finite.
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    /// Euclidean distance to another point.
    pub fn distance(&self, other: &Point2) -> f64 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        (dx * dx + dy * dy).sqrt()
    }

    /// Normalize as a direction vector. Zero maps to zero.
    pub fn normalized(&self) -> Point2 {
        let len = (self.x * self.x + self.y * self.y).sqrt();
        if len < f64::EPSILON {
            Point2 { x: 0.0, y: 0.0 }
        } else {
            Point2 {
                x: self.x / len,
                y: self.y / len,
            }
        }
    }
}

/// A 3D vector, typically a unit pointing direction in device space
/// (x right, y up, z forward).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// The straight-ahead unit direction.
    pub const FORWARD: Vec3 = Vec3 {
        x: 0.0,
        y: 0.0,
        z: 1.0,
    };

    /// True if all components are finite.
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }

    pub fn length(&self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    /// Euclidean distance to another vector.
    pub fn distance(&self, other: &Vec3) -> f64 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        let dz = other.z - self.z;
        (dx * dx + dy * dy + dz * dz).sqrt()
    }

    pub fn dot(&self, other: &Vec3) -> f64 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    /// Normalize to unit length. Zero maps to zero.
    pub fn normalized(&self) -> Vec3 {
        let len = self.length();
        if len < f64::EPSILON {
            Vec3 {
                x: 0.0,
                y: 0.0,
                z: 0.0,
            }
        } else {
            Vec3 {
                x: self.x / len,
                y: self.y / len,
                z: self.z / len,
            }
        }
    }

    /// Angle between two vectors in radians.
    ///
    /// Defined as 0 when either vector has zero length, so a dropped
    /// direction sample reads as "unchanged" rather than NaN.
    pub fn angle_between(&self, other: &Vec3) -> f64 {
        let len_product = self.length() * other.length();
        if len_product < f64::EPSILON {
            return 0.0;
        }
        // Clamp: floating error can push the cosine fractionally outside [-1, 1]
        let cos = (self.dot(other) / len_product).clamp(-1.0, 1.0);
        cos.acos()
    }

    /// Compass-style heading of this direction in degrees, measured from
    /// +z (forward) toward +x (right): `atan2(x, z)`.
    pub fn heading_deg(&self) -> f64 {
        self.x.atan2(self.z).to_degrees()
    }
}
