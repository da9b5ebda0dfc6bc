//! Place candidates and the two ranking strategies.
//!
//! Strategy A matches a vision-derived name against a generous text search.
//! Strategy B ranks a tight nearby search by distance and directional
//! alignment. Both produce composite scores; ranking is deterministic, with
//! equal scores broken by place id so repeated runs select the same
//! candidate.

use crate::geometry::{bearing_delta_deg, haversine_m, initial_bearing_deg, Geo, Vec3};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// A place returned by the search collaborator. Ephemeral, scoped to one
/// disambiguation attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaceCandidate {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub place_id: String,
    /// Category tags, e.g. `["museum", "point_of_interest"]`.
    pub types: Vec<String>,
    pub rating: Option<f64>,
}

impl PlaceCandidate {
    pub fn location(&self) -> Geo {
        Geo::new(self.latitude, self.longitude)
    }
}

/// Detail record for an accepted candidate.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlaceDetails {
    pub formatted_address: Option<String>,
    pub rating: Option<f64>,
    pub phone: Option<String>,
    /// Opening hours, one line per day.
    pub hours: Vec<String>,
    pub editorial_summary: Option<String>,
    /// Leading review snippet.
    pub top_review: Option<String>,
    pub url: Option<String>,
}

/// A candidate with derived ranking data. Exists only during ranking.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredCandidate {
    pub candidate: PlaceCandidate,
    pub distance_m: f64,
    pub bearing_deg: f64,
    /// Name similarity in [0, 1]; 0 when no hint name was available.
    pub name_score: f64,
    pub score: f64,
}

/// Name similarity: 1.0 exact (case-insensitive), 0.7 substring containment
/// either direction, otherwise token-overlap ratio.
pub fn name_score(hint_name: &str, candidate_name: &str) -> f64 {
    let a = hint_name.trim().to_lowercase();
    let b = candidate_name.trim().to_lowercase();
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    if a == b {
        return 1.0;
    }
    if a.contains(&b) || b.contains(&a) {
        return 0.7;
    }

    let tokens_a: Vec<&str> = a.split_whitespace().collect();
    let tokens_b: Vec<&str> = b.split_whitespace().collect();
    let common = tokens_a.iter().filter(|t| tokens_b.contains(t)).count();
    let larger = tokens_a.len().max(tokens_b.len());
    if larger == 0 {
        0.0
    } else {
        common as f64 / larger as f64
    }
}

/// Strategy A: rank text-search candidates by name similarity and distance.
///
/// Composite score `0.7·nameScore + 0.3·(1 − min(distance/radius, 1))`.
/// Returns the top candidate only if its distance is inside `radius_m`.
pub fn rank_named(
    candidates: &[PlaceCandidate],
    hint_name: &str,
    device: &Geo,
    radius_m: f64,
) -> Option<ScoredCandidate> {
    let mut scored: Vec<ScoredCandidate> = candidates
        .iter()
        .map(|c| {
            let distance_m = haversine_m(device, &c.location());
            let ns = name_score(hint_name, &c.name);
            let proximity = 1.0 - (distance_m / radius_m).min(1.0);
            ScoredCandidate {
                candidate: c.clone(),
                distance_m,
                bearing_deg: initial_bearing_deg(device, &c.location()),
                name_score: ns,
                score: 0.7 * ns + 0.3 * proximity,
            }
        })
        .collect();

    sort_deterministic(&mut scored);
    scored.into_iter().next().filter(|top| top.distance_m < radius_m)
}

/// Strategy B: rank nearby candidates by proximity and directional alignment.
///
/// `distanceScore = 1/(1 + d/50)`, `directionScore = max(0, 1 − Δbearing/45)`
/// inside the 45° cone, plus a 0.3 bonus when the hint's type token matches
/// any candidate type tag. Accepts the top candidate only when it is inside
/// `radius_m` and its score clears `min_score`.
pub fn rank_directional(
    candidates: &[PlaceCandidate],
    device: &Geo,
    direction: &Vec3,
    hint_kind: Option<&str>,
    radius_m: f64,
    min_score: f64,
) -> Option<ScoredCandidate> {
    let direction_bearing = direction.heading_deg();

    let mut scored: Vec<ScoredCandidate> = candidates
        .iter()
        .map(|c| {
            let distance_m = haversine_m(device, &c.location());
            let bearing_deg = initial_bearing_deg(device, &c.location());
            let delta = bearing_delta_deg(bearing_deg, direction_bearing);

            let distance_score = 1.0 / (1.0 + distance_m / 50.0);
            let direction_score = if delta < 45.0 { 1.0 - delta / 45.0 } else { 0.0 };
            let type_bonus = if type_matches(hint_kind, &c.types) { 0.3 } else { 0.0 };

            ScoredCandidate {
                candidate: c.clone(),
                distance_m,
                bearing_deg,
                name_score: 0.0,
                score: distance_score + 0.5 * direction_score + type_bonus,
            }
        })
        .collect();

    sort_deterministic(&mut scored);
    scored
        .into_iter()
        .next()
        .filter(|top| top.distance_m < radius_m && top.score > min_score)
}

/// Heuristic confidence for the general-nearby fallback: a distance/rating
/// blend clamped to [0.3, 1.0].
pub fn nearby_confidence(distance_m: f64, rating: Option<f64>) -> f64 {
    let proximity = 1.0 - (distance_m / 500.0).min(1.0);
    let rating_part = rating.map(|r| (r / 5.0).clamp(0.0, 1.0)).unwrap_or(0.0);
    (0.3 + 0.5 * proximity + 0.2 * rating_part).clamp(0.3, 1.0)
}

/// Best general nearby candidate by the heuristic blend, unranked by
/// direction.
pub fn best_nearby(candidates: &[PlaceCandidate], device: &Geo) -> Option<ScoredCandidate> {
    let mut scored: Vec<ScoredCandidate> = candidates
        .iter()
        .map(|c| {
            let distance_m = haversine_m(device, &c.location());
            ScoredCandidate {
                candidate: c.clone(),
                distance_m,
                bearing_deg: initial_bearing_deg(device, &c.location()),
                name_score: 0.0,
                score: nearby_confidence(distance_m, c.rating),
            }
        })
        .collect();
    sort_deterministic(&mut scored);
    scored.into_iter().next()
}

/// True when the hint's type token appears in (or contains) any candidate tag.
fn type_matches(hint_kind: Option<&str>, types: &[String]) -> bool {
    let Some(kind) = hint_kind else {
        return false;
    };
    let kind = kind.trim().to_lowercase();
    if kind.is_empty() {
        return false;
    }
    types.iter().any(|t| {
        let t = t.to_lowercase();
        t.contains(&kind) || kind.contains(&t)
    })
}

/// Sort by score descending, breaking exact ties on place id so repeated
/// runs over the same candidate set pick the same winner.
fn sort_deterministic(scored: &mut [ScoredCandidate]) {
    scored.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.candidate.place_id.cmp(&b.candidate.place_id))
    });
}
