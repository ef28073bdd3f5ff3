//! Core data types shared across the detection pipeline

use serde::{Deserialize, Serialize};

/// Media class of a selected file
///
/// Determines the analysis endpoint and the shape of the score payload the
/// backend returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaClass {
    Image,
    Video,
}

impl MediaClass {
    /// Classify by file extension (lowercase, no dot)
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext {
            "png" | "jpg" | "jpeg" | "gif" | "bmp" | "avif" | "webp" => Some(MediaClass::Image),
            "mp4" | "avi" | "mov" | "mkv" | "webm" => Some(MediaClass::Video),
            _ => None,
        }
    }

    /// Classify by content sniffing (magic bytes)
    pub fn sniff(bytes: &[u8]) -> Option<Self> {
        match infer::get(bytes)?.matcher_type() {
            infer::MatcherType::Image => Some(MediaClass::Image),
            infer::MatcherType::Video => Some(MediaClass::Video),
            _ => None,
        }
    }
}

impl std::fmt::Display for MediaClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MediaClass::Image => write!(f, "image"),
            MediaClass::Video => write!(f, "video"),
        }
    }
}

/// Canonical three-way probability verdict, percentages in [0, 100]
///
/// The three confidences are independently reported by the backend and are
/// not required to sum to 100. A triple is derived once per analysis and
/// replaced wholesale by the next one.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProbabilityTriple {
    /// Confidence the media is authentic
    pub real: f64,
    /// Confidence the media is a deepfake
    pub fake: f64,
    /// Confidence the media is a synthetic (AI-generated) face
    pub ai: f64,
}

impl ProbabilityTriple {
    pub const ZERO: ProbabilityTriple = ProbabilityTriple {
        real: 0.0,
        fake: 0.0,
        ai: 0.0,
    };

    pub fn new(real: f64, fake: f64, ai: f64) -> Self {
        Self { real, fake, ai }
    }
}
