//! veriscan-core: client-side orchestration for a media authenticity
//! detection service
//!
//! Submits a selected image or video to the remote classification backend,
//! normalizes the two backend score shapes into one canonical probability
//! triple (Real / Fake / AI-Generated), derives a categorical verdict, and
//! runs an independent best-effort reverse-image-search enrichment task.

pub mod auth;
pub mod client;
pub mod config;
pub mod enrichment;
pub mod error;
pub mod orchestrator;
pub mod score;
pub mod selection;
pub mod types;
pub mod verdict;

pub use crate::auth::{CredentialProvider, StaticCredential};
pub use crate::config::{BackendConfig, TomlConfig};
pub use crate::enrichment::{EnrichmentOutcome, ReverseSearchLink};
pub use crate::error::{DetectError, Result};
pub use crate::orchestrator::{AnalysisResult, DetectionOrchestrator, Phase};
pub use crate::selection::{MediaSelection, PreviewHandle, SelectionManager};
pub use crate::types::{MediaClass, ProbabilityTriple};
pub use crate::verdict::{classify, Verdict};
