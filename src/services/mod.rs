//! Collaborator seams and their concrete implementations.
//!
//! The resolution engine only sees these traits; production wires in the
//! HTTP clients, tests wire in mocks. Failure taxonomy is carried by
//! [`ServiceError`] so the engine can distinguish "not configured" (a
//! user-actionable outcome) from transient unavailability (absorbed by the
//! fallback ladder).

pub mod http_retry;
pub mod location;
pub mod places_api;
pub mod rate_limit;
pub mod vision_api;

use crate::geometry::Geo;
use crate::resolve::candidates::{PlaceCandidate, PlaceDetails};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

pub use location::StaticLocation;
pub use places_api::HttpPlaceSearch;
pub use rate_limit::{FixedWindowLimiter, UnlimitedLimiter};
pub use vision_api::ClaudeVision;

/// Collaborator failure taxonomy.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// No credentials configured for this collaborator.
    #[error("missing credentials for {0}")]
    MissingCredentials(&'static str),

    /// Network failure, timeout, or non-success status after retries.
    #[error("{0} unavailable: {1}")]
    Unavailable(&'static str, String),

    /// The collaborator answered, but the payload didn't decode.
    #[error("{0} returned a malformed response: {1}")]
    Malformed(&'static str, String),
}

pub type ServiceResult<T> = std::result::Result<T, ServiceError>;

/// Vision identification: one still image region in, raw response text out.
#[async_trait]
pub trait VisionIdentifier: Send + Sync {
    async fn identify(&self, image: &[u8]) -> ServiceResult<String>;
}

/// Place search: three independent, idempotent, read-only calls.
#[async_trait]
pub trait PlaceSearch: Send + Sync {
    async fn search_text(
        &self,
        query: &str,
        location: &Geo,
        radius_m: f64,
    ) -> ServiceResult<Vec<PlaceCandidate>>;

    async fn search_nearby(
        &self,
        location: &Geo,
        radius_m: f64,
    ) -> ServiceResult<Vec<PlaceCandidate>>;

    async fn fetch_details(&self, place_id: &str) -> ServiceResult<PlaceDetails>;
}

/// Outcome of a rate-limit check.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RateDecision {
    pub allowed: bool,
    /// Requests remaining in the current window.
    pub remaining: u32,
    /// When the window resets.
    pub reset_at: DateTime<Utc>,
}

/// Per-client request throttle, consulted before any attempt.
pub trait RateLimiter: Send + Sync {
    fn check(&self, client_id: &str) -> RateDecision;
}

/// Best-effort device location.
pub trait LocationProvider: Send + Sync {
    fn current(&self) -> Option<Geo>;
}
