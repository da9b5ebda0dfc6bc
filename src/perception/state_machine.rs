//! Perception gating state machine.
//!
//! Decides when one expensive identification attempt may fire, driven by
//! the Tier-1 intent signal and injected clock readings. The machine is
//! single-threaded cooperative: every `update` completes synchronously, and
//! time is always an explicit argument so tests can step it deterministically.
//!
//! States: `Idle → Candidate → IntentLocked → Display → Release → Idle`.
//! `IntentLocked` exists only to mark the instant the disambiguation engine
//! is invoked; observers see it before the immediate hand-off to `Display`.

use super::signal::IntentSignal;
use super::smoother::ConfidenceSmoother;
use crate::geometry::Vec3;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Gating states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PerceptionState {
    /// Nothing of interest.
    Idle,
    /// A spatial fix is present; waiting for it to stabilize.
    Candidate,
    /// Intent confirmed this instant; the identification fires now.
    IntentLocked,
    /// A result is (or is about to be) on screen; only release detection runs.
    Display,
    /// Fading out before returning to idle.
    Release,
}

impl PerceptionState {
    /// Human-readable state name, as handed to observers.
    pub fn name(&self) -> &'static str {
        match self {
            PerceptionState::Idle => "idle",
            PerceptionState::Candidate => "candidate",
            PerceptionState::IntentLocked => "intent_locked",
            PerceptionState::Display => "display",
            PerceptionState::Release => "release",
        }
    }
}

/// Tunable gating thresholds.
///
/// The source material disagrees with itself on several of these numbers,
/// so they are configuration with internally consistent defaults, not
/// hard-coded truth.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatingConfig {
    /// Minimum signal strength to enter `Candidate`.
    pub enter_threshold: f64,
    /// Minimum smoothed confidence to lock intent.
    pub lock_threshold: f64,
    /// How long the direction must hold steady before locking (ms).
    pub stability_ms: u64,
    /// `Candidate` expires after this long without a qualifying signal (ms).
    pub candidate_timeout_ms: u64,
    /// `Display` releases after this long without a qualifying signal (ms).
    pub display_timeout_ms: u64,
    /// Fade period between `Release` and `Idle` (ms).
    pub release_fade_ms: u64,
    /// Angular change that counts as "significant" and resets stability (degrees).
    pub direction_change_deg: f64,
    /// EMA blend factor for the confidence smoother.
    pub smoothing_alpha: f64,
}

impl Default for GatingConfig {
    fn default() -> Self {
        Self {
            enter_threshold: 0.35,
            lock_threshold: 0.7,
            stability_ms: 300,
            candidate_timeout_ms: 500,
            display_timeout_ms: 2000,
            release_fade_ms: 200,
            direction_change_deg: 15.0,
            smoothing_alpha: 0.3,
        }
    }
}

/// Observable snapshot of the machine's internals.
///
/// `get_context` hands out copies of this; callers can never mutate the
/// machine through it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerceptionContext {
    pub state: PerceptionState,
    /// Smoothed confidence in [0, 1].
    pub confidence: f64,
    /// How long the current direction has held steady (ms).
    pub stability_ms: u64,
    /// Clock reading of the last qualifying signal.
    pub last_signal_at_ms: u64,
    /// Direction of the last qualifying signal.
    pub last_direction: Option<Vec3>,
}

impl PerceptionContext {
    fn initial() -> Self {
        Self {
            state: PerceptionState::Idle,
            confidence: 0.0,
            stability_ms: 0,
            last_signal_at_ms: 0,
            last_direction: None,
        }
    }
}

type Observer = Box<dyn FnMut(PerceptionState) + Send>;

/// The gating state machine. Owns its context exclusively; all mutation
/// goes through [`update`](Self::update), [`tick`](Self::tick), and
/// [`reset`](Self::reset).
pub struct PerceptionStateMachine {
    config: GatingConfig,
    context: PerceptionContext,
    smoother: ConfidenceSmoother,
    observers: Vec<Observer>,
    /// Clock reading when `Release` was entered.
    release_entered_ms: u64,
    /// Start of a continuous below-threshold confidence stretch in `Display`.
    low_confidence_since_ms: Option<u64>,
}

impl PerceptionStateMachine {
    pub fn new(config: GatingConfig) -> Self {
        let smoother = ConfidenceSmoother::new(config.smoothing_alpha);
        Self {
            config,
            context: PerceptionContext::initial(),
            smoother,
            observers: Vec::new(),
            release_entered_ms: 0,
            low_confidence_since_ms: None,
        }
    }

    /// Current state.
    pub fn get_state(&self) -> PerceptionState {
        self.context.state
    }

    /// Defensive copy of the full context.
    pub fn get_context(&self) -> PerceptionContext {
        self.context.clone()
    }

    /// Register an observer, notified synchronously on every state change
    /// with the new state.
    pub fn on_state_change<F>(&mut self, observer: F)
    where
        F: FnMut(PerceptionState) + Send + 'static,
    {
        self.observers.push(Box::new(observer));
    }

    /// Force `Idle` and clear all timers and history.
    pub fn reset(&mut self) {
        self.smoother.reset();
        self.context = PerceptionContext::initial();
        self.release_entered_ms = 0;
        self.low_confidence_since_ms = None;
        debug!("perception machine reset");
    }

    /// Process one signal at the given clock reading.
    ///
    /// Malformed signals (non-finite fields, strength outside [0, 1]) are
    /// absorbed as "no signal for this tick"; this method never panics on
    /// input.
    pub fn update(&mut self, signal: &IntentSignal, now_ms: u64) -> PerceptionState {
        let qualifying =
            signal.has_spatial_fix() && signal.strength >= self.config.enter_threshold;

        // Malformed input contributes nothing, not even a confidence sample.
        if signal.is_well_formed() {
            self.context.confidence = self.smoother.smooth(signal.strength);
        }

        match self.context.state {
            PerceptionState::Idle => {
                if qualifying {
                    self.context.stability_ms = 0;
                    self.context.last_direction = signal.direction;
                    self.context.last_signal_at_ms = now_ms;
                    self.transition(PerceptionState::Candidate, now_ms);
                }
            }
            PerceptionState::Candidate => {
                if qualifying {
                    self.accumulate_stability(signal, now_ms);
                    if self.context.stability_ms >= self.config.stability_ms
                        && self.context.confidence >= self.config.lock_threshold
                    {
                        self.transition(PerceptionState::IntentLocked, now_ms);
                        // Unconditional, immediate: IntentLocked only marks
                        // the instant the engine is invoked.
                        self.transition(PerceptionState::Display, now_ms);
                        self.low_confidence_since_ms = None;
                    }
                } else {
                    self.check_candidate_timeout(now_ms);
                }
            }
            PerceptionState::Display => {
                if qualifying {
                    // A qualifying signal refreshes the release timer; it
                    // never forces a new identification.
                    self.context.last_signal_at_ms = now_ms;
                    self.context.last_direction = signal.direction;
                }
                self.track_display_confidence(now_ms);
                self.check_display_timeout(now_ms);
            }
            PerceptionState::IntentLocked => {
                // Unreachable between updates; handled defensively.
                self.transition(PerceptionState::Display, now_ms);
            }
            PerceptionState::Release => {
                self.check_release_fade(now_ms);
            }
        }

        self.context.state
    }

    /// Re-evaluate timeout-driven transitions without a new signal.
    pub fn tick(&mut self, now_ms: u64) -> PerceptionState {
        match self.context.state {
            PerceptionState::Candidate => self.check_candidate_timeout(now_ms),
            PerceptionState::Display => self.check_display_timeout(now_ms),
            PerceptionState::Release => self.check_release_fade(now_ms),
            PerceptionState::Idle | PerceptionState::IntentLocked => {}
        }
        self.context.state
    }

    /// Accumulate or reset stability for a qualifying candidate signal.
    fn accumulate_stability(&mut self, signal: &IntentSignal, now_ms: u64) {
        // Callers only reach here with a spatial fix present
        let Some(direction) = signal.direction else {
            return;
        };

        let significant_change = match self.context.last_direction {
            Some(last) => {
                last.angle_between(&direction).to_degrees() > self.config.direction_change_deg
            }
            None => false,
        };

        if significant_change {
            self.context.stability_ms = 0;
            self.context.last_direction = Some(direction);
        } else {
            let elapsed = now_ms.saturating_sub(self.context.last_signal_at_ms);
            self.context.stability_ms += elapsed;
        }
        self.context.last_signal_at_ms = now_ms;
    }

    fn check_candidate_timeout(&mut self, now_ms: u64) {
        let silent = now_ms.saturating_sub(self.context.last_signal_at_ms);
        if silent >= self.config.candidate_timeout_ms {
            self.transition(PerceptionState::Release, now_ms);
        }
    }

    /// Track how long confidence has stayed below the enter threshold while
    /// displaying; a sustained drop releases just like signal silence.
    fn track_display_confidence(&mut self, now_ms: u64) {
        if self.context.confidence < self.config.enter_threshold {
            self.low_confidence_since_ms.get_or_insert(now_ms);
        } else {
            self.low_confidence_since_ms = None;
        }
    }

    fn check_display_timeout(&mut self, now_ms: u64) {
        let silent = now_ms.saturating_sub(self.context.last_signal_at_ms);
        let low_for = self
            .low_confidence_since_ms
            .map(|since| now_ms.saturating_sub(since))
            .unwrap_or(0);

        if silent >= self.config.display_timeout_ms || low_for >= self.config.display_timeout_ms {
            self.transition(PerceptionState::Release, now_ms);
        }
    }

    fn check_release_fade(&mut self, now_ms: u64) {
        if now_ms.saturating_sub(self.release_entered_ms) >= self.config.release_fade_ms {
            self.context.stability_ms = 0;
            self.context.last_direction = None;
            self.low_confidence_since_ms = None;
            self.transition(PerceptionState::Idle, now_ms);
        }
    }

    fn transition(&mut self, next: PerceptionState, now_ms: u64) {
        if next == PerceptionState::Release {
            self.release_entered_ms = now_ms;
        }
        debug!(
            from = self.context.state.name(),
            to = next.name(),
            at_ms = now_ms,
            "state transition"
        );
        self.context.state = next;
        for observer in &mut self.observers {
            observer(next);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{Point2, Vec3};
    use std::sync::{Arc, Mutex};

    fn signal(strength: f64) -> IntentSignal {
        IntentSignal {
            position: Some(Point2::new(0.5, 0.5)),
            direction: Some(Vec3::FORWARD),
            strength,
        }
    }

    fn signal_with_direction(strength: f64, direction: Vec3) -> IntentSignal {
        IntentSignal {
            position: Some(Point2::new(0.5, 0.5)),
            direction: Some(direction),
            strength,
        }
    }

    fn machine() -> PerceptionStateMachine {
        PerceptionStateMachine::new(GatingConfig::default())
    }

    #[test]
    fn test_weak_signal_stays_idle() {
        let mut m = machine();
        for t in 0..10 {
            m.update(&signal(0.2), t * 50);
        }
        assert_eq!(m.get_state(), PerceptionState::Idle);
    }

    #[test]
    fn test_missing_direction_stays_idle() {
        let mut m = machine();
        let s = IntentSignal {
            position: Some(Point2::new(0.5, 0.5)),
            direction: None,
            strength: 0.9,
        };
        m.update(&s, 0);
        assert_eq!(m.get_state(), PerceptionState::Idle);
    }

    #[test]
    fn test_strong_signal_enters_candidate() {
        let mut m = machine();
        assert_eq!(m.update(&signal(0.8), 0), PerceptionState::Candidate);
        let ctx = m.get_context();
        assert_eq!(ctx.stability_ms, 0);
        assert!(ctx.last_direction.is_some());
    }

    #[test]
    fn test_stable_direction_locks_and_displays() {
        let mut m = machine();
        m.update(&signal(0.9), 0);
        // Hold steady past the stability window; smoother needs a few
        // samples to clear the lock threshold
        for t in 1..=10 {
            m.update(&signal(0.9), t * 100);
        }
        assert_eq!(m.get_state(), PerceptionState::Display);
    }

    #[test]
    fn test_observers_see_lock_before_display() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_clone = seen.clone();

        let mut m = machine();
        m.on_state_change(move |s| seen_clone.lock().unwrap().push(s));

        m.update(&signal(0.9), 0);
        for t in 1..=10 {
            m.update(&signal(0.9), t * 100);
        }

        let states = seen.lock().unwrap();
        let lock_pos = states
            .iter()
            .position(|s| *s == PerceptionState::IntentLocked)
            .expect("observer should see IntentLocked");
        assert_eq!(states[lock_pos + 1], PerceptionState::Display);
    }

    #[test]
    fn test_divergent_direction_resets_stability() {
        let mut m = machine();
        m.update(&signal(0.9), 0);
        m.update(&signal(0.9), 100);
        assert!(m.get_context().stability_ms > 0);

        // 45 degrees off forward, well past the 15-degree threshold
        let divergent = Vec3::new(1.0, 0.0, 1.0).normalized();
        m.update(&signal_with_direction(0.9, divergent), 200);

        let ctx = m.get_context();
        assert_eq!(ctx.state, PerceptionState::Candidate);
        assert_eq!(ctx.stability_ms, 0);
    }

    #[test]
    fn test_candidate_times_out_to_release() {
        let mut m = machine();
        m.update(&signal(0.8), 0);
        assert_eq!(m.get_state(), PerceptionState::Candidate);

        // Silence past the candidate timeout
        assert_eq!(m.update(&IntentSignal::none(), 600), PerceptionState::Release);
    }

    #[test]
    fn test_candidate_timeout_via_tick() {
        let mut m = machine();
        m.update(&signal(0.8), 0);
        assert_eq!(m.tick(400), PerceptionState::Candidate);
        assert_eq!(m.tick(501), PerceptionState::Release);
    }

    #[test]
    fn test_release_fades_to_idle() {
        let mut m = machine();
        m.update(&signal(0.8), 0);
        m.tick(600); // Release at t=600
        assert_eq!(m.tick(700), PerceptionState::Release);
        assert_eq!(m.tick(800), PerceptionState::Idle);
        assert!(m.get_context().last_direction.is_none());
    }

    #[test]
    fn test_display_signal_refreshes_release_timer() {
        let mut m = machine();
        m.update(&signal(0.9), 0);
        for t in 1..=10 {
            m.update(&signal(0.9), t * 100);
        }
        assert_eq!(m.get_state(), PerceptionState::Display);

        // Keep qualifying signals coming; display must persist well past
        // the bare timeout horizon
        for t in 11..=40 {
            m.update(&signal(0.9), t * 100);
        }
        assert_eq!(m.get_state(), PerceptionState::Display);

        // Then go silent
        assert_eq!(m.tick(40 * 100 + 2000), PerceptionState::Release);
    }

    #[test]
    fn test_display_releases_on_sustained_low_confidence() {
        let mut m = machine();
        m.update(&signal(0.9), 0);
        for t in 1..=10 {
            m.update(&signal(0.9), t * 100);
        }
        assert_eq!(m.get_state(), PerceptionState::Display);

        // Qualifying-shape signals but with collapsed strength; confidence
        // decays below the enter threshold and stays there
        let mut t = 1100;
        while t < 1100 + 4000 {
            m.update(&signal(0.0), t);
            t += 100;
        }
        assert_eq!(m.get_state(), PerceptionState::Release);
    }

    #[test]
    fn test_reset_from_any_state() {
        let mut m = machine();
        m.update(&signal(0.9), 0);
        for t in 1..=10 {
            m.update(&signal(0.9), t * 100);
        }
        assert_eq!(m.get_state(), PerceptionState::Display);

        m.reset();
        assert_eq!(m.get_state(), PerceptionState::Idle);
        assert_eq!(m.get_context().confidence, 0.0);
        assert_eq!(m.get_context().stability_ms, 0);
    }

    #[test]
    fn test_malformed_signal_absorbed() {
        let mut m = machine();
        let bad = IntentSignal {
            position: Some(Point2::new(f64::NAN, 0.5)),
            direction: Some(Vec3::FORWARD),
            strength: 0.9,
        };
        // Must neither panic nor leave Idle
        m.update(&bad, 0);
        assert_eq!(m.get_state(), PerceptionState::Idle);
        // And must not have polluted the confidence estimate
        assert_eq!(m.get_context().confidence, 0.0);
    }

    #[test]
    fn test_context_copy_is_defensive() {
        let mut m = machine();
        m.update(&signal(0.8), 0);
        let mut ctx = m.get_context();
        ctx.state = PerceptionState::Display;
        ctx.confidence = 1.0;
        // Mutating the copy must not affect the machine
        assert_eq!(m.get_state(), PerceptionState::Candidate);
        assert!(m.get_context().confidence < 1.0);
    }

    #[test]
    fn test_full_cycle_returns_to_idle() {
        let mut m = machine();
        m.update(&signal(0.9), 0);
        for t in 1..=10 {
            m.update(&signal(0.9), t * 100);
        }
        assert_eq!(m.get_state(), PerceptionState::Display);

        let release_at = 1000 + 2000;
        m.tick(release_at);
        assert_eq!(m.get_state(), PerceptionState::Release);
        m.tick(release_at + 200);
        assert_eq!(m.get_state(), PerceptionState::Idle);

        // The machine can gate a second attempt afterward
        m.update(&signal(0.9), release_at + 300);
        assert_eq!(m.get_state(), PerceptionState::Candidate);
    }
}
