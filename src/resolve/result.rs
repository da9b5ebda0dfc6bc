//! The engine's single output per attempt.

use crate::geometry::Point2;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Which rung of the fallback ladder produced the result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ResolutionKind {
    /// Full merged identification: vision hint, accepted candidate, enrichment.
    PlaceMatch,
    /// Vision hint only; no candidate accepted.
    VisionOnly,
    /// No usable hint; best general nearby place.
    NearbyOnly,
    /// Device location unavailable; a normal user-facing outcome.
    LocationRequired,
    /// No hint and no candidates at all.
    NothingFound,
    /// Rate limit denied the attempt before any collaborator call.
    Throttled {
        /// When the client's window resets.
        retry_at: DateTime<Utc>,
    },
    /// A collaborator's credentials are absent; user-actionable.
    MissingCredentials,
    /// Unexpected internal failure; detail is logged, never surfaced.
    LookupFailed,
}

/// The human-readable identification handed to the caller. Immutable; the
/// caller owns its display lifecycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolutionResult {
    pub title: String,
    pub subtitle: String,
    pub description: String,
    pub details: String,
    /// Construction year, when known.
    pub year: Option<String>,
    /// Confidence in [0, 1].
    pub confidence: f64,
    /// Link to more information, when available.
    pub url: Option<String>,
    pub kind: ResolutionKind,
}

impl ResolutionResult {
    /// Typed "enable location" outcome; not an error.
    pub fn location_required() -> Self {
        Self {
            title: "Location needed".to_string(),
            subtitle: "Identification unavailable".to_string(),
            description: "Enable location access to identify what you're pointing at."
                .to_string(),
            details: String::new(),
            year: None,
            confidence: 0.0,
            url: None,
            kind: ResolutionKind::LocationRequired,
        }
    }

    /// Typed "nothing found" outcome, carrying the tap for user context.
    pub fn nothing_found(tap: &Point2) -> Self {
        Self {
            title: "Nothing identified".to_string(),
            subtitle: format!("at ({:.2}, {:.2})", tap.x, tap.y),
            description: "Couldn't identify anything at that point. Try moving closer or \
                          pointing at a distinctive feature."
                .to_string(),
            details: String::new(),
            year: None,
            confidence: 0.3,
            url: None,
            kind: ResolutionKind::NothingFound,
        }
    }

    /// Typed throttled outcome with retry timing.
    pub fn throttled(retry_at: DateTime<Utc>) -> Self {
        Self {
            title: "Too many lookups".to_string(),
            subtitle: "Try again shortly".to_string(),
            description: format!("Rate limit reached. Retry after {}.", retry_at.format("%H:%M:%S")),
            details: String::new(),
            year: None,
            confidence: 0.0,
            url: None,
            kind: ResolutionKind::Throttled { retry_at },
        }
    }

    /// Typed missing-credentials outcome; actionable, never a stack trace.
    pub fn missing_credentials(service: &str) -> Self {
        Self {
            title: "Setup required".to_string(),
            subtitle: format!("{} not configured", service),
            description: format!(
                "The {} service has no credentials configured. Add an API key to enable \
                 identification.",
                service
            ),
            details: String::new(),
            year: None,
            confidence: 0.0,
            url: None,
            kind: ResolutionKind::MissingCredentials,
        }
    }

    /// Generic failure result. Internal error text is logged by the caller,
    /// never placed in the result.
    pub fn lookup_failed() -> Self {
        Self {
            title: "Lookup failed".to_string(),
            subtitle: "Please try again".to_string(),
            description: "Something went wrong while identifying. Try again in a moment."
                .to_string(),
            details: String::new(),
            year: None,
            confidence: 0.0,
            url: None,
            kind: ResolutionKind::LookupFailed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nothing_found_carries_tap() {
        let r = ResolutionResult::nothing_found(&Point2::new(0.25, 0.75));
        assert_eq!(r.kind, ResolutionKind::NothingFound);
        assert!(r.subtitle.contains("0.25"));
        assert!(r.subtitle.contains("0.75"));
        assert!((r.confidence - 0.3).abs() < 1e-9);
    }

    #[test]
    fn test_throttled_carries_retry_time() {
        let at = Utc::now();
        let r = ResolutionResult::throttled(at);
        match r.kind {
            ResolutionKind::Throttled { retry_at } => assert_eq!(retry_at, at),
            other => panic!("expected Throttled, got {:?}", other),
        }
    }

    #[test]
    fn test_failure_results_have_no_internal_text() {
        let r = ResolutionResult::lookup_failed();
        assert!(!r.description.contains("error:"));
        assert_eq!(r.confidence, 0.0);
    }

    #[test]
    fn test_json_round_trip() {
        let r = ResolutionResult::location_required();
        let json = serde_json::to_string(&r).unwrap();
        let back: ResolutionResult = serde_json::from_str(&json).unwrap();
        assert_eq!(back, r);
    }
}
