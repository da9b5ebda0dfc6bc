//! # Spatial Intent
//!
//! A spatial intent resolution engine: a handheld client points at something
//! in the physical world (screen tap plus device orientation and location)
//! and receives one grounded, human-readable identification of the object
//! pointed at.
//!
//! ## Overview
//!
//! The crate has two halves. A perception state machine consumes a cheap,
//! continuous intent signal and decides *when* an expensive identification
//! may fire. A disambiguation engine then fuses a vision-derived hint, the
//! device location, and the pointing direction into a single ranked place
//! identification, falling back through a defined ladder when any signal is
//! missing or unreliable.
//!
//! ## Quick Start
//!
//! ```no_run
//! use spatial_intent::perception::{GatingConfig, IntentSignal, PerceptionStateMachine};
//! use spatial_intent::geometry::{Point2, Vec3};
//!
//! let mut machine = PerceptionStateMachine::new(GatingConfig::default());
//!
//! // Feed signals with an explicit clock reading
//! let signal = IntentSignal {
//!     position: Some(Point2 { x: 0.5, y: 0.5 }),
//!     direction: Some(Vec3 { x: 0.0, y: 0.0, z: 1.0 }),
//!     strength: 0.8,
//! };
//! machine.update(&signal, 0);
//! ```
//!
//! ## Architecture
//!
//! - [`geometry`]: pure vector, great-circle, and projection math
//! - [`time`]: explicit millisecond clock so all timing is injectable
//! - [`perception`]: intent signal model, confidence smoothing, gating state machine
//! - [`resolve`]: vision hint parsing, candidate scoring, fallback ladder, engine
//! - [`services`]: collaborator seams and their HTTP implementations
//! - [`app`]: CLI and configuration management
//!
//! ## Pipeline
//!
//! ```text
//! ┌──────────────┐    ┌───────────────┐    ┌────────────────┐
//! │ IntentSignal │───▶│  Perception   │───▶│ Disambiguation │
//! │  (Tier 1)    │    │ State Machine │    │     Engine     │
//! └──────────────┘    └───────────────┘    └────────────────┘
//!                                                  │
//!                     vision hint ─ place search ─ enrichment
//!                                                  │
//!                                                  ▼
//!                                         ResolutionResult
//! ```

pub mod time;
pub mod geometry;
pub mod perception;
pub mod resolve;
pub mod services;
pub mod app;

// Re-export commonly used types
pub use geometry::{Geo, Point2, Vec3};
pub use perception::{IntentSignal, PerceptionContext, PerceptionState, PerceptionStateMachine};
pub use resolve::{DisambiguationEngine, ResolutionKind, ResolutionResult};

/// Result type alias for the crate
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for configuration and IO concerns.
///
/// The resolution pipeline itself never surfaces these: every pipeline
/// failure mode resolves to a typed [`ResolutionResult`].
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Signal trace error: {0}")]
    Trace(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
