//! Pure geometry: vector math, great-circle math, and tap projection.
//!
//! Everything here is a pure function over plain value types. No locking,
//! no IO, no clock reads.

pub mod vector;
pub mod geo;
pub mod projection;

pub use geo::{bearing_delta_deg, haversine_m, initial_bearing_deg, Geo};
pub use projection::tap_to_direction;
pub use vector::{Point2, Vec3};
