//! Explicit millisecond clock.

pub mod clock;

pub use clock::{Clock, SystemClock};
