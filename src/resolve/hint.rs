//! Vision hint parsing.
//!
//! The vision collaborator returns free text that usually, but not always,
//! contains a JSON object with the requested fields. Rather than null-check
//! loose shapes downstream, the hint is a closed tagged type: fully parsed,
//! partially recovered by pattern extraction, or absent. Scoring logic
//! pattern-matches on exactly these three cases.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;
use tracing::debug;

/// Identifying fields extracted from one frame. Immutable after parsing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HintFields {
    /// Proper name read from signage or recognized directly.
    pub name: Option<String>,
    /// Object category ("museum", "restaurant", "monument", ...).
    #[serde(alias = "type")]
    pub kind: Option<String>,
    pub description: Option<String>,
    pub details: Option<String>,
    #[serde(alias = "year")]
    pub construction_year: Option<String>,
    #[serde(alias = "style")]
    pub architectural_style: Option<String>,
    pub significance: Option<String>,
}

impl HintFields {
    /// True if at least one field carries text.
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.kind.is_none()
            && self.description.is_none()
            && self.details.is_none()
            && self.construction_year.is_none()
            && self.architectural_style.is_none()
            && self.significance.is_none()
    }
}

/// Outcome of hint extraction for one attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum VisionHint {
    /// Structured JSON parsed cleanly.
    Parsed(HintFields),
    /// Structured parse failed; fields recovered by pattern extraction.
    Partial(HintFields),
    /// No usable hint. Processing continues without one.
    None,
}

impl VisionHint {
    /// Parse the raw collaborator response.
    ///
    /// Tries the embedded JSON object first, then best-effort pattern
    /// extraction of name/type/description, then gives up. Never errors:
    /// a garbage response is simply `VisionHint::None`.
    pub fn from_raw(raw: &str) -> VisionHint {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return VisionHint::None;
        }

        if let Some(fields) = parse_embedded_json(trimmed) {
            if !fields.is_empty() {
                return VisionHint::Parsed(normalize(fields));
            }
        }

        let fields = extract_by_pattern(trimmed);
        if fields.is_empty() {
            debug!("vision response carried no extractable hint");
            VisionHint::None
        } else {
            VisionHint::Partial(normalize(fields))
        }
    }

    /// Fields, regardless of how they were recovered.
    pub fn fields(&self) -> Option<&HintFields> {
        match self {
            VisionHint::Parsed(f) | VisionHint::Partial(f) => Some(f),
            VisionHint::None => None,
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.fields().and_then(|f| f.name.as_deref())
    }

    pub fn kind(&self) -> Option<&str> {
        self.fields().and_then(|f| f.kind.as_deref())
    }

    /// True when the hint carries anything worth acting on.
    pub fn is_usable(&self) -> bool {
        self.fields().is_some_and(|f| !f.is_empty())
    }
}

/// Locate and parse the first JSON object embedded in the response text.
fn parse_embedded_json(text: &str) -> Option<HintFields> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end <= start {
        return None;
    }
    serde_json::from_str(&text[start..=end]).ok()
}

/// Best-effort recovery of name/type/description from loose prose, for
/// responses where the collaborator ignored the JSON instruction.
fn extract_by_pattern(text: &str) -> HintFields {
    static PATTERNS: OnceLock<[(usize, Regex); 3]> = OnceLock::new();
    let patterns = PATTERNS.get_or_init(|| {
        let field = |key: &str| {
            Regex::new(&format!(
                r#"(?im)^\s*"?{}"?\s*[:=]\s*"?([^"\n]+?)"?\s*,?\s*$"#,
                key
            ))
            .expect("static pattern compiles")
        };
        [(0, field("name")), (1, field("type")), (2, field("description"))]
    });

    let mut fields = HintFields::default();
    for (slot, re) in patterns {
        let value = re
            .captures(text)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().trim().to_string())
            .filter(|s| !s.is_empty() && s != "null");
        match *slot {
            0 => fields.name = value,
            1 => fields.kind = value,
            _ => fields.description = value,
        }
    }
    fields
}

/// Drop empty / "null" strings so downstream code only sees real text.
fn normalize(mut fields: HintFields) -> HintFields {
    let clean = |v: &mut Option<String>| {
        if let Some(s) = v {
            let t = s.trim();
            if t.is_empty() || t.eq_ignore_ascii_case("null") || t.eq_ignore_ascii_case("unknown") {
                *v = None;
            } else if t.len() != s.len() {
                *v = Some(t.to_string());
            }
        }
    };
    clean(&mut fields.name);
    clean(&mut fields.kind);
    clean(&mut fields.description);
    clean(&mut fields.details);
    clean(&mut fields.construction_year);
    clean(&mut fields.architectural_style);
    clean(&mut fields.significance);
    fields
}
