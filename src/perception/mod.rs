//! Perception gating: intent signals, confidence smoothing, and the state
//! machine that decides when an identification attempt may fire.

pub mod signal;
pub mod smoother;
pub mod state_machine;

pub use signal::{IntentSignal, SignalTrace, TimedSignal};
pub use smoother::ConfidenceSmoother;
pub use state_machine::{
    GatingConfig, PerceptionContext, PerceptionState, PerceptionStateMachine,
};
