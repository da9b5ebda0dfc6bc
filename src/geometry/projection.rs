//! Tap-to-direction projection.
//!
//! Converts a normalized screen tap into a forward-biased unit direction
//! using a simple pinhole approximation: offset the tap from screen center,
//! scale by half the field-of-view, and keep the forward component dominant.
//! This is an approximation, not a calibrated camera model — it only needs
//! to be good enough to rank nearby candidates by rough bearing.

use super::vector::{Point2, Vec3};

/// Forward component weight; keeps the direction dominated by +z.
const Z_FORWARD: f64 = 0.95;

/// Lateral scale applied to the angular offsets.
const LATERAL_SCALE: f64 = 0.1;

/// Project a normalized tap point (0–1 in both axes, origin top-left) into
/// a forward-biased unit direction in device space.
///
/// `fov_deg` is the camera's horizontal field of view in degrees. Taps right
/// of center yield +x, taps above center yield +y.
pub fn tap_to_direction(tap: &Point2, fov_deg: f64) -> Vec3 {
    let half_fov = fov_deg.to_radians() / 2.0;

    // Offset from screen center, in [-0.5, 0.5]
    let offset_x = tap.x - 0.5;
    let offset_y = tap.y - 0.5;

    let dir = Vec3 {
        x: (offset_x * half_fov).sin() * LATERAL_SCALE,
        // Screen y grows downward; device y grows upward
        y: -(offset_y * half_fov).sin() * LATERAL_SCALE,
        z: Z_FORWARD,
    };
    dir.normalized()
}
