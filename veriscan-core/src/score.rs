//! Score normalization
//!
//! The backend reports scores in two structurally different shapes: a flat
//! label → percentage-string map for images, and a label → aggregate record
//! (`mean`/`min`/`max`) map for videos. Both are normalized into one
//! canonical [`ProbabilityTriple`]. Normalization is a total function: any
//! missing or malformed slot defaults to zero so a renderable triple always
//! comes out.

use std::collections::HashMap;

use serde::Deserialize;

use crate::types::ProbabilityTriple;

/// Class labels the backend reports for both media classes
pub const LABEL_REAL: &str = "Real";
pub const LABEL_DEEPFAKE: &str = "Deepfake";
pub const LABEL_AI_FACE: &str = "AI-Generated Face";

/// Per-class aggregate statistics in the video response shape
///
/// Only `mean` is consumed; `min`/`max` are carried for completeness.
#[derive(Debug, Clone, Deserialize)]
pub struct ClassStat {
    pub mean: Option<String>,
    pub min: Option<String>,
    pub max: Option<String>,
}

/// Raw score payload from the backend, tagged by media class
#[derive(Debug, Clone)]
pub enum RawScores {
    /// Image shape: label → `"NN.NN%"`
    Image(HashMap<String, String>),
    /// Video shape: label → `{ mean, min, max }`
    Video(HashMap<String, ClassStat>),
}

/// Parse a percentage string like `"88.00%"` into a float, defaulting to 0
///
/// The trailing `%` is optional; whitespace is tolerated. Anything that does
/// not parse as a float yields `0.0`.
pub fn parse_percent(raw: Option<&str>) -> f64 {
    raw.map(|s| s.trim().trim_end_matches('%').trim())
        .and_then(|s| s.parse::<f64>().ok())
        .unwrap_or(0.0)
}

/// Normalize a raw backend payload into the canonical probability triple
///
/// Never fails: `{}` and every partially-malformed payload normalize to a
/// valid (possibly all-zero) triple.
pub fn normalize(raw: &RawScores) -> ProbabilityTriple {
    match raw {
        RawScores::Image(scores) => ProbabilityTriple {
            real: parse_percent(scores.get(LABEL_REAL).map(String::as_str)),
            fake: parse_percent(scores.get(LABEL_DEEPFAKE).map(String::as_str)),
            ai: parse_percent(scores.get(LABEL_AI_FACE).map(String::as_str)),
        },
        RawScores::Video(scores) => {
            let mean_of = |label: &str| {
                parse_percent(
                    scores
                        .get(label)
                        .and_then(|stat| stat.mean.as_deref()),
                )
            };
            ProbabilityTriple {
                real: mean_of(LABEL_REAL),
                fake: mean_of(LABEL_DEEPFAKE),
                ai: mean_of(LABEL_AI_FACE),
            }
        }
    }
}
