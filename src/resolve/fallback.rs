//! The fallback ladder.
//!
//! An explicit ordered list of result-producing rungs, each a pure function
//! of the attempt's gathered evidence. They are evaluated in order and the
//! first non-`None` wins, which keeps every rung testable in isolation. The
//! final rung always produces, so the ladder is total.

use super::candidates::{PlaceDetails, ScoredCandidate};
use super::hint::VisionHint;
use super::result::{ResolutionKind, ResolutionResult};
use crate::geometry::Point2;

/// Fixed confidence for an accepted, enriched place match. Not re-derived
/// from the composite score: enrichment success is treated as strong
/// evidence regardless of how the match scored.
const PLACE_MATCH_CONFIDENCE: f64 = 0.9;

/// Confidence for a vision-only identification.
const VISION_ONLY_CONFIDENCE: f64 = 0.7;

/// Review snippets are cut to this many characters.
const REVIEW_LIMIT: usize = 200;

/// An accepted candidate together with its fetched detail record.
#[derive(Debug, Clone)]
pub struct EnrichedPlace {
    pub scored: ScoredCandidate,
    pub details: PlaceDetails,
}

/// Evidence gathered for one attempt, handed to the ladder.
#[derive(Debug)]
pub struct LadderInput<'a> {
    pub hint: &'a VisionHint,
    /// Accepted and enriched candidate, when both steps succeeded.
    pub place: Option<&'a EnrichedPlace>,
    /// Best general nearby place, gathered when no hint was usable.
    pub nearby: Option<&'a ScoredCandidate>,
    pub has_location: bool,
    pub tap: Point2,
}

type Rung = fn(&LadderInput) -> Option<ResolutionResult>;

/// The ladder, in priority order.
const LADDER: &[Rung] = &[
    rung_place_match,
    rung_vision_only,
    rung_nearby,
    rung_location_required,
    rung_nothing_found,
];

/// Evaluate the ladder; the first applicable rung wins.
pub fn run_ladder(input: &LadderInput) -> ResolutionResult {
    LADDER
        .iter()
        .find_map(|rung| rung(input))
        .unwrap_or_else(ResolutionResult::lookup_failed)
}

/// Rung 1: accepted candidate with successful enrichment, merged with
/// whatever the vision hint contributed.
fn rung_place_match(input: &LadderInput) -> Option<ResolutionResult> {
    let place = input.place?;
    let fields = input.hint.fields();
    let details = &place.details;

    let title = place.scored.candidate.name.clone();
    let subtitle = fields
        .and_then(|f| f.kind.clone())
        .or_else(|| place.scored.candidate.types.first().map(|t| t.replace('_', " ")))
        .unwrap_or_else(|| "Place".to_string());

    // Prefer the place's editorial summary; append the vision description
    // when it adds something distinct
    let vision_desc = fields.and_then(|f| f.description.as_deref());
    let description = match (&details.editorial_summary, vision_desc) {
        (Some(summary), Some(vd)) if !summary.to_lowercase().contains(&vd.to_lowercase()) => {
            format!("{} {}", summary, vd)
        }
        (Some(summary), _) => summary.clone(),
        (None, Some(vd)) => vd.to_string(),
        (None, None) => format!("{} is nearby.", title),
    };

    let mut blocks: Vec<String> = Vec::new();
    if let Some(summary) = &details.editorial_summary {
        blocks.push(summary.clone());
    }
    if let Some(f) = fields {
        if let Some(d) = &f.details {
            blocks.push(d.clone());
        }
        if let Some(s) = &f.significance {
            blocks.push(s.clone());
        }
        if let Some(style) = &f.architectural_style {
            blocks.push(format!("Style: {}", style));
        }
        if let Some(year) = &f.construction_year {
            blocks.push(format!("Built: {}", year));
        }
    }
    if let Some(addr) = &details.formatted_address {
        blocks.push(addr.clone());
    }
    if let Some(rating) = details.rating {
        blocks.push(format!("Rated {:.1}/5", rating));
    }
    if let Some(phone) = &details.phone {
        blocks.push(phone.clone());
    }
    if !details.hours.is_empty() {
        blocks.push(details.hours.join("\n"));
    }
    if let Some(review) = &details.top_review {
        blocks.push(format!("\"{}\"", truncate_chars(review, REVIEW_LIMIT)));
    }

    Some(ResolutionResult {
        title,
        subtitle,
        description,
        details: blocks.join("\n\n"),
        year: fields.and_then(|f| f.construction_year.clone()),
        confidence: PLACE_MATCH_CONFIDENCE,
        url: details.url.clone(),
        kind: ResolutionKind::PlaceMatch,
    })
}

/// Rung 2: usable vision hint but no accepted candidate.
fn rung_vision_only(input: &LadderInput) -> Option<ResolutionResult> {
    if !input.hint.is_usable() {
        return None;
    }
    let fields = input.hint.fields()?;

    let title = fields
        .name
        .clone()
        .unwrap_or_else(|| "Unidentified landmark".to_string());
    let subtitle = fields
        .kind
        .clone()
        .unwrap_or_else(|| "Identified by sight".to_string());
    let description = fields
        .description
        .clone()
        .unwrap_or_else(|| "Recognized from visible features.".to_string());

    let mut blocks: Vec<String> = Vec::new();
    if let Some(d) = &fields.details {
        blocks.push(d.clone());
    }
    if let Some(s) = &fields.significance {
        blocks.push(s.clone());
    }
    if let Some(style) = &fields.architectural_style {
        blocks.push(format!("Style: {}", style));
    }
    if let Some(year) = &fields.construction_year {
        blocks.push(format!("Built: {}", year));
    }

    Some(ResolutionResult {
        title,
        subtitle,
        description,
        details: blocks.join("\n\n"),
        year: fields.construction_year.clone(),
        confidence: VISION_ONLY_CONFIDENCE,
        url: None,
        kind: ResolutionKind::VisionOnly,
    })
}

/// Rung 3: no usable hint, but something is nearby. Confidence is the
/// candidate's own distance/rating heuristic.
fn rung_nearby(input: &LadderInput) -> Option<ResolutionResult> {
    let nearby = input.nearby?;
    let candidate = &nearby.candidate;

    let subtitle = candidate
        .types
        .first()
        .map(|t| t.replace('_', " "))
        .unwrap_or_else(|| "Nearby place".to_string());

    Some(ResolutionResult {
        title: candidate.name.clone(),
        subtitle,
        description: format!("{} is about {:.0} m away.", candidate.name, nearby.distance_m),
        details: candidate
            .rating
            .map(|r| format!("Rated {:.1}/5", r))
            .unwrap_or_default(),
        year: None,
        confidence: nearby.score,
        url: None,
        kind: ResolutionKind::NearbyOnly,
    })
}

/// Rung 4: no device location; a normal, user-facing outcome.
fn rung_location_required(input: &LadderInput) -> Option<ResolutionResult> {
    if input.has_location {
        None
    } else {
        Some(ResolutionResult::location_required())
    }
}

/// Rung 5: nothing at all; carries the tap coordinates for context.
fn rung_nothing_found(input: &LadderInput) -> Option<ResolutionResult> {
    Some(ResolutionResult::nothing_found(&input.tap))
}

/// Cut to `limit` characters on a char boundary, with an ellipsis when
/// anything was dropped.
fn truncate_chars(text: &str, limit: usize) -> String {
    if text.chars().count() <= limit {
        return text.to_string();
    }
    let cut: String = text.chars().take(limit).collect();
    format!("{}...", cut.trim_end())
}
