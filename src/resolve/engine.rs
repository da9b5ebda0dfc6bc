//! The disambiguation engine.
//!
//! Orchestrates one attempt: throttle check, tap projection, vision hint,
//! candidate ranking, enrichment, then the fallback ladder. Every attempt
//! produces exactly one [`ResolutionResult`]; collaborator failures are
//! absorbed into the ladder rather than surfaced as errors, except the two
//! that are user outcomes in their own right (throttled, missing
//! credentials).

use super::candidates::{best_nearby, rank_directional, rank_named, ScoredCandidate};
use super::fallback::{run_ladder, EnrichedPlace, LadderInput};
use super::hint::VisionHint;
use super::result::ResolutionResult;
use crate::geometry::{tap_to_direction, Geo, Point2, Vec3};
use crate::services::{PlaceSearch, RateLimiter, ServiceError, VisionIdentifier};
use tracing::{debug, info, warn};

/// Tunables for one engine instance.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Search radius for the name-match strategy, meters.
    pub named_radius_m: f64,
    /// Search radius for the directional nearby strategy, meters.
    pub nearby_radius_m: f64,
    /// Minimum composite score a directional candidate must clear.
    pub min_directional_score: f64,
    /// Throttle key for this device or caller.
    pub client_id: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            named_radius_m: 2000.0,
            nearby_radius_m: 150.0,
            min_directional_score: 0.2,
            client_id: "default".to_string(),
        }
    }
}

/// Fuses the three signals into one ranked identification.
pub struct DisambiguationEngine {
    vision: Box<dyn VisionIdentifier>,
    places: Box<dyn PlaceSearch>,
    limiter: Box<dyn RateLimiter>,
    config: EngineConfig,
}

impl DisambiguationEngine {
    pub fn new(
        vision: Box<dyn VisionIdentifier>,
        places: Box<dyn PlaceSearch>,
        limiter: Box<dyn RateLimiter>,
        config: EngineConfig,
    ) -> Self {
        Self {
            vision,
            places,
            limiter,
            config,
        }
    }

    /// Resolve one confirmed intent event.
    ///
    /// `frame` is the captured image region, `tap` the normalized screen
    /// point, `fov_deg` the camera's horizontal field of view, and
    /// `location` the device fix if one is available. Always returns a
    /// result; the `kind` field says which rung produced it.
    pub async fn resolve_intent(
        &self,
        frame: &[u8],
        tap: Point2,
        fov_deg: f64,
        location: Option<Geo>,
    ) -> ResolutionResult {
        // Throttle before any work is done
        let decision = self.limiter.check(&self.config.client_id);
        if !decision.allowed {
            info!(
                client = %self.config.client_id,
                reset_at = %decision.reset_at,
                "attempt throttled"
            );
            return ResolutionResult::throttled(decision.reset_at);
        }

        let direction = tap_to_direction(&tap, fov_deg);
        debug!(
            tap_x = tap.x,
            tap_y = tap.y,
            bearing = direction.heading_deg(),
            "projected tap to pointing direction"
        );

        let hint = match self.vision.identify(frame).await {
            Ok(raw) => VisionHint::from_raw(&raw),
            Err(ServiceError::MissingCredentials(service)) => {
                warn!(service, "vision collaborator not configured");
                return ResolutionResult::missing_credentials(service);
            }
            Err(err) => {
                // Vision loss is survivable: the ladder still has the
                // location-based rungs
                warn!(error = %err, "vision identification failed, continuing without hint");
                VisionHint::None
            }
        };
        if let Some(name) = hint.name() {
            info!(name, "vision hint extracted");
        }

        let (place, nearby) = match &location {
            Some(device) => match self.gather_place_evidence(&hint, device, &direction).await {
                Ok(evidence) => evidence,
                Err(result) => return result,
            },
            None => {
                debug!("no device location, skipping candidate search");
                (None, None)
            }
        };

        let result = run_ladder(&LadderInput {
            hint: &hint,
            place: place.as_ref(),
            nearby: nearby.as_ref(),
            has_location: location.is_some(),
            tap,
        });
        info!(
            kind = ?result.kind,
            title = %result.title,
            confidence = result.confidence,
            "attempt resolved"
        );
        result
    }

    /// Run the applicable ranking strategy and enrichment.
    ///
    /// Returns `Err` only for the missing-credentials outcome, which
    /// short-circuits the whole attempt.
    async fn gather_place_evidence(
        &self,
        hint: &VisionHint,
        device: &Geo,
        direction: &Vec3,
    ) -> std::result::Result<(Option<EnrichedPlace>, Option<ScoredCandidate>), ResolutionResult>
    {
        let accepted = if let Some(name) = hint.name() {
            let candidates = match self
                .places
                .search_text(name, device, self.config.named_radius_m)
                .await
            {
                Ok(c) => c,
                Err(ServiceError::MissingCredentials(service)) => {
                    warn!(service, "place search not configured");
                    return Err(ResolutionResult::missing_credentials(service));
                }
                Err(err) => {
                    warn!(error = %err, "text search failed");
                    Vec::new()
                }
            };
            debug!(count = candidates.len(), query = name, "text search returned");
            rank_named(&candidates, name, device, self.config.named_radius_m)
        } else {
            None
        };

        // The directional strategy and the general-nearby fallback share
        // one nearby search
        let mut nearby_candidates = None;
        let accepted = match accepted {
            Some(top) => Some(top),
            None => {
                let candidates = match self
                    .places
                    .search_nearby(device, self.config.nearby_radius_m)
                    .await
                {
                    Ok(c) => c,
                    Err(ServiceError::MissingCredentials(service)) => {
                        warn!(service, "place search not configured");
                        return Err(ResolutionResult::missing_credentials(service));
                    }
                    Err(err) => {
                        warn!(error = %err, "nearby search failed");
                        Vec::new()
                    }
                };
                debug!(count = candidates.len(), "nearby search returned");
                let top = rank_directional(
                    &candidates,
                    device,
                    direction,
                    hint.kind(),
                    self.config.nearby_radius_m,
                    self.config.min_directional_score,
                );
                nearby_candidates = Some(candidates);
                top
            }
        };

        let place = match accepted {
            Some(scored) => {
                info!(
                    place = %scored.candidate.name,
                    score = scored.score,
                    distance_m = scored.distance_m,
                    "candidate accepted"
                );
                match self.places.fetch_details(&scored.candidate.place_id).await {
                    Ok(details) => Some(EnrichedPlace { scored, details }),
                    Err(err) => {
                        // Enrichment failure drops the match entirely; the
                        // ladder falls through to the hint-only rungs
                        warn!(error = %err, "detail fetch failed, dropping candidate");
                        None
                    }
                }
            }
            None => None,
        };

        // A general nearby pick only matters when the hint gave us nothing
        let nearby = if place.is_none() && !hint.is_usable() {
            let candidates = match nearby_candidates {
                Some(c) => c,
                None => self
                    .places
                    .search_nearby(device, self.config.nearby_radius_m)
                    .await
                    .unwrap_or_default(),
            };
            best_nearby(&candidates, device)
        } else {
            None
        };

        Ok((place, nearby))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolve::candidates::{PlaceCandidate, PlaceDetails};
    use crate::resolve::result::ResolutionKind;
    use crate::services::{RateDecision, ServiceResult, UnlimitedLimiter};
    use async_trait::async_trait;
    use chrono::{Duration, Utc};

    struct FixedVision(ServiceResult<String>);

    #[async_trait]
    impl VisionIdentifier for FixedVision {
        async fn identify(&self, _image: &[u8]) -> ServiceResult<String> {
            match &self.0 {
                Ok(s) => Ok(s.clone()),
                Err(ServiceError::MissingCredentials(s)) => {
                    Err(ServiceError::MissingCredentials(s))
                }
                Err(ServiceError::Unavailable(s, m)) => {
                    Err(ServiceError::Unavailable(s, m.clone()))
                }
                Err(ServiceError::Malformed(s, m)) => Err(ServiceError::Malformed(s, m.clone())),
            }
        }
    }

    struct FixedPlaces {
        text: Vec<PlaceCandidate>,
        nearby: Vec<PlaceCandidate>,
        details: Option<PlaceDetails>,
    }

    #[async_trait]
    impl PlaceSearch for FixedPlaces {
        async fn search_text(
            &self,
            _query: &str,
            _location: &Geo,
            _radius_m: f64,
        ) -> ServiceResult<Vec<PlaceCandidate>> {
            Ok(self.text.clone())
        }

        async fn search_nearby(
            &self,
            _location: &Geo,
            _radius_m: f64,
        ) -> ServiceResult<Vec<PlaceCandidate>> {
            Ok(self.nearby.clone())
        }

        async fn fetch_details(&self, _place_id: &str) -> ServiceResult<PlaceDetails> {
            self.details
                .clone()
                .ok_or_else(|| ServiceError::Unavailable("places", "details down".to_string()))
        }
    }

    struct DenyAll;

    impl RateLimiter for DenyAll {
        fn check(&self, _client_id: &str) -> RateDecision {
            RateDecision {
                allowed: false,
                remaining: 0,
                reset_at: Utc::now() + Duration::seconds(30),
            }
        }
    }

    const DEVICE: Geo = Geo::new(37.7749, -122.4194);

    fn engine(vision: FixedVision, places: FixedPlaces) -> DisambiguationEngine {
        DisambiguationEngine::new(
            Box::new(vision),
            Box::new(places),
            Box::new(UnlimitedLimiter),
            EngineConfig::default(),
        )
    }

    fn ferry_candidate() -> PlaceCandidate {
        PlaceCandidate {
            name: "Ferry Building".to_string(),
            latitude: DEVICE.latitude + 50.0 / 111_195.0,
            longitude: DEVICE.longitude,
            place_id: "ferry".to_string(),
            types: vec!["point_of_interest".to_string()],
            rating: Some(4.7),
        }
    }

    #[tokio::test]
    async fn test_throttled_before_any_work() {
        let engine = DisambiguationEngine::new(
            Box::new(FixedVision(Ok("ignored".to_string()))),
            Box::new(FixedPlaces {
                text: vec![],
                nearby: vec![],
                details: None,
            }),
            Box::new(DenyAll),
            EngineConfig::default(),
        );
        let result = engine
            .resolve_intent(b"img", Point2::new(0.5, 0.5), 60.0, Some(DEVICE))
            .await;
        assert!(matches!(result.kind, ResolutionKind::Throttled { .. }));
    }

    #[tokio::test]
    async fn test_full_place_match() {
        let vision = FixedVision(Ok(r#"{"name": "Ferry Building", "type": "marketplace"}"#
            .to_string()));
        let places = FixedPlaces {
            text: vec![ferry_candidate()],
            nearby: vec![],
            details: Some(PlaceDetails {
                editorial_summary: Some("Iconic marketplace.".to_string()),
                ..Default::default()
            }),
        };
        let result = engine(vision, places)
            .resolve_intent(b"img", Point2::new(0.5, 0.5), 60.0, Some(DEVICE))
            .await;
        assert_eq!(result.kind, ResolutionKind::PlaceMatch);
        assert_eq!(result.title, "Ferry Building");
        assert!((result.confidence - 0.9).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_enrichment_failure_falls_back_to_vision_only() {
        let vision = FixedVision(Ok(
            r#"{"name": "Ferry Building", "description": "Waterfront marketplace"}"#.to_string(),
        ));
        let places = FixedPlaces {
            text: vec![ferry_candidate()],
            nearby: vec![],
            details: None,
        };
        let result = engine(vision, places)
            .resolve_intent(b"img", Point2::new(0.5, 0.5), 60.0, Some(DEVICE))
            .await;
        assert_eq!(result.kind, ResolutionKind::VisionOnly);
    }

    #[tokio::test]
    async fn test_vision_failure_still_resolves_nearby() {
        let vision = FixedVision(Err(ServiceError::Unavailable(
            "vision",
            "timeout".to_string(),
        )));
        let places = FixedPlaces {
            text: vec![],
            nearby: vec![ferry_candidate()],
            details: Some(PlaceDetails::default()),
        };
        let result = engine(vision, places)
            .resolve_intent(b"img", Point2::new(0.5, 0.5), 60.0, Some(DEVICE))
            .await;
        // The directional strategy accepts the aligned candidate even
        // without a hint
        assert_eq!(result.kind, ResolutionKind::PlaceMatch);
        assert_eq!(result.title, "Ferry Building");
    }

    #[tokio::test]
    async fn test_missing_vision_credentials_short_circuits() {
        let vision = FixedVision(Err(ServiceError::MissingCredentials("vision")));
        let places = FixedPlaces {
            text: vec![],
            nearby: vec![],
            details: None,
        };
        let result = engine(vision, places)
            .resolve_intent(b"img", Point2::new(0.5, 0.5), 60.0, Some(DEVICE))
            .await;
        assert_eq!(result.kind, ResolutionKind::MissingCredentials);
    }

    #[tokio::test]
    async fn test_no_location_with_hint_is_vision_only() {
        let vision = FixedVision(Ok(r#"{"name": "Coit Tower"}"#.to_string()));
        let places = FixedPlaces {
            text: vec![ferry_candidate()],
            nearby: vec![],
            details: Some(PlaceDetails::default()),
        };
        let result = engine(vision, places)
            .resolve_intent(b"img", Point2::new(0.5, 0.5), 60.0, None)
            .await;
        assert_eq!(result.kind, ResolutionKind::VisionOnly);
        assert_eq!(result.title, "Coit Tower");
    }

    #[tokio::test]
    async fn test_no_location_no_hint_is_location_required() {
        let vision = FixedVision(Ok("no idea".to_string()));
        let places = FixedPlaces {
            text: vec![],
            nearby: vec![],
            details: None,
        };
        let result = engine(vision, places)
            .resolve_intent(b"img", Point2::new(0.5, 0.5), 60.0, None)
            .await;
        assert_eq!(result.kind, ResolutionKind::LocationRequired);
    }

    #[tokio::test]
    async fn test_everything_empty_is_nothing_found() {
        let vision = FixedVision(Ok("no idea".to_string()));
        let places = FixedPlaces {
            text: vec![],
            nearby: vec![],
            details: None,
        };
        let result = engine(vision, places)
            .resolve_intent(b"img", Point2::new(0.4, 0.6), 60.0, Some(DEVICE))
            .await;
        assert_eq!(result.kind, ResolutionKind::NothingFound);
    }
}
