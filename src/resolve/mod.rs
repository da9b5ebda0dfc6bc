//! Disambiguation: turn one confirmed intent event into a single grounded
//! identification, or a typed fallback when signals are missing.

pub mod candidates;
pub mod engine;
pub mod fallback;
pub mod hint;
pub mod result;

pub use candidates::{PlaceCandidate, PlaceDetails, ScoredCandidate};
pub use engine::{DisambiguationEngine, EngineConfig};
pub use hint::{HintFields, VisionHint};
pub use result::{ResolutionKind, ResolutionResult};
