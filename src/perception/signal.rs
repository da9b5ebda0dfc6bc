//! Intent signal model.
//!
//! An intent signal is the cheap, local, non-ML estimate of "the user might
//! be pointing at something". It is produced continuously by a Tier-1
//! detector outside this crate and consumed only by the state machine.

use crate::geometry::{Point2, Vec3};
use serde::{Deserialize, Serialize};

/// One tick of the Tier-1 detector's output.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IntentSignal {
    /// Tap/point position in normalized screen coordinates (0–1).
    pub position: Option<Point2>,
    /// Unit pointing direction in device space.
    pub direction: Option<Vec3>,
    /// Detection strength in [0, 1].
    pub strength: f64,
}

impl IntentSignal {
    /// An empty tick: nothing detected.
    pub const fn none() -> Self {
        Self {
            position: None,
            direction: None,
            strength: 0.0,
        }
    }

    /// A signal qualifies for gating when it carries both a position and a
    /// direction, all fields are finite, and strength is in range. Malformed
    /// input is treated as "no signal", never as an error.
    pub fn is_well_formed(&self) -> bool {
        self.strength.is_finite()
            && (0.0..=1.0).contains(&self.strength)
            && self.position.is_none_or(|p| p.is_finite())
            && self.direction.is_none_or(|d| d.is_finite())
    }

    /// Well-formed and carrying both spatial components.
    pub fn has_spatial_fix(&self) -> bool {
        self.is_well_formed() && self.position.is_some() && self.direction.is_some()
    }
}

/// A signal paired with the clock reading at which it arrived. Used for
/// offline replay of gating behavior.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TimedSignal {
    /// Milliseconds since trace start.
    pub at_ms: u64,
    pub signal: IntentSignal,
}

/// An ordered recording of signals, replayable through the state machine.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SignalTrace {
    pub signals: Vec<TimedSignal>,
}

impl SignalTrace {
    /// Parse a trace from JSON, rejecting traces whose timestamps go
    /// backward.
    pub fn from_json(json: &str) -> crate::Result<Self> {
        let trace: SignalTrace = serde_json::from_str(json)?;
        let mut last = 0u64;
        for entry in &trace.signals {
            if entry.at_ms < last {
                return Err(crate::Error::Trace(format!(
                    "timestamps must be non-decreasing, {} follows {}",
                    entry.at_ms, last
                )));
            }
            last = entry.at_ms;
        }
        Ok(trace)
    }
}
