//! Categorical verdict derivation
//!
//! The verdict is a pure function of a [`ProbabilityTriple`] and is
//! recomputed on demand, never stored. The tie-break is deliberately
//! asymmetric: `Authentic` and `Fake` each require a strict maximum, and
//! everything else (including exact three-way ties) falls through to
//! `AiGenerated`. This mirrors the deployed behavior and is observable, so
//! it must not be "fixed".

use serde::{Deserialize, Serialize};

use crate::types::ProbabilityTriple;

/// Categorical verdict over a probability triple
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verdict {
    Authentic,
    Fake,
    AiGenerated,
}

impl Verdict {
    /// Human-readable label for presentation
    pub fn label(&self) -> &'static str {
        match self {
            Verdict::Authentic => "Likely Authentic",
            Verdict::Fake => "Likely Fake",
            Verdict::AiGenerated => "Likely AI Generated",
        }
    }
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Derive the verdict from a probability triple
pub fn classify(triple: &ProbabilityTriple) -> Verdict {
    if triple.real > triple.fake && triple.real > triple.ai {
        Verdict::Authentic
    } else if triple.fake > triple.real && triple.fake > triple.ai {
        Verdict::Fake
    } else {
        Verdict::AiGenerated
    }
}
