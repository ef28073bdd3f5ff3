//! Detection request orchestration
//!
//! Coordinates the selection manager, the primary authenticated analysis
//! request, score normalization, and the fire-and-forget reverse-search
//! enrichment task.
//!
//! # State Progression
//! Idle → Busy → {Succeeded, Failed} → Idle (re-entrant: a new selection or
//! a re-invoked analysis returns to Busy)
//!
//! # Staleness
//! Every select/clear bumps a monotonic generation counter. Each analysis
//! invocation is stamped with the generation it started under, and every
//! state mutation after a suspension point is generation-checked: a response
//! that arrives after a newer selection or reset is discarded, never applied.
//! In-flight transport operations are not cancelled; only their effect is.

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::task::JoinHandle;

use crate::auth::CredentialProvider;
use crate::client::BackendClient;
use crate::config::BackendConfig;
use crate::enrichment::{self, EnrichmentOutcome};
use crate::error::{DetectError, Result};
use crate::score::{normalize, RawScores};
use crate::selection::{MediaSelection, SelectionManager};
use crate::types::{MediaClass, ProbabilityTriple};
use crate::verdict::{classify, Verdict};

/// Orchestrator lifecycle phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Phase {
    Idle,
    Busy,
    Succeeded,
    Failed,
}

/// Outcome of one successful primary analysis
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisResult {
    pub triple: ProbabilityTriple,
    /// Absolute URL of the generated heatmap (image analyses only)
    pub heatmap_url: Option<String>,
    pub completed_at: DateTime<Utc>,
}

impl AnalysisResult {
    /// Verdict is derived on demand, never stored
    pub fn verdict(&self) -> Verdict {
        classify(&self.triple)
    }
}

struct Inner {
    selection: SelectionManager,
    phase: Phase,
    result: Option<AnalysisResult>,
    error: Option<String>,
    enrichment: Option<EnrichmentOutcome>,
    enrichment_task: Option<JoinHandle<()>>,
}

impl Inner {
    fn clear_derived(&mut self) {
        self.phase = Phase::Idle;
        self.result = None;
        self.error = None;
        self.enrichment = None;
        self.enrichment_task = None;
    }
}

/// Detection request orchestrator
///
/// Cheap to clone; clones share the same state, client, and credentials.
#[derive(Clone)]
pub struct DetectionOrchestrator {
    client: Arc<BackendClient>,
    credentials: Arc<dyn CredentialProvider>,
    inner: Arc<Mutex<Inner>>,
}

impl DetectionOrchestrator {
    pub fn new(config: &BackendConfig, credentials: Arc<dyn CredentialProvider>) -> Result<Self> {
        Ok(Self {
            client: Arc::new(BackendClient::new(config)?),
            credentials,
            inner: Arc::new(Mutex::new(Inner {
                selection: SelectionManager::new(),
                phase: Phase::Idle,
                result: None,
                error: None,
                enrichment: None,
                enrichment_task: None,
            })),
        })
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Select a file from disk, replacing any current selection
    pub fn select_file(
        &self,
        path: &Path,
        class_hint: Option<MediaClass>,
    ) -> Result<Arc<MediaSelection>> {
        let bytes = std::fs::read(path)?;
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("upload")
            .to_string();
        self.select_bytes(&file_name, bytes, class_hint)
    }

    /// Select in-memory media, replacing any current selection
    ///
    /// Clears any prior result, error, and enrichment state and bumps the
    /// generation counter, invalidating in-flight requests.
    pub fn select_bytes(
        &self,
        file_name: &str,
        bytes: Vec<u8>,
        class_hint: Option<MediaClass>,
    ) -> Result<Arc<MediaSelection>> {
        let mut state = self.lock();
        let selection = state.selection.select(file_name, bytes, class_hint)?;
        state.clear_derived();
        Ok(selection)
    }

    /// Release the current selection and all derived state
    pub fn clear_selection(&self) {
        let mut state = self.lock();
        state.selection.clear();
        state.clear_derived();
    }

    /// Return to `Idle`, discarding all results
    ///
    /// A response from any in-flight request is discarded when it lands
    /// (generation mismatch); the transport operation itself keeps running.
    pub fn reset(&self) {
        let mut state = self.lock();
        state.selection.clear();
        state.clear_derived();
        tracing::debug!("Orchestrator reset");
    }

    /// Run the primary analysis for the current selection
    ///
    /// Preconditions are checked locally and never reach the network: a
    /// selection must exist, no other analysis may be in flight, and a
    /// credential must be available. On image success the enrichment task is
    /// started fire-and-forget; its outcome never affects this result.
    pub async fn analyze(&self) -> Result<AnalysisResult> {
        let (selection, generation, token) = {
            let mut state = self.lock();
            if state.phase == Phase::Busy {
                return Err(DetectError::AnalysisInFlight);
            }
            let selection = state
                .selection
                .current()
                .cloned()
                .ok_or(DetectError::NoMedia)?;

            state.phase = Phase::Busy;
            state.result = None;
            state.error = None;
            state.enrichment = None;

            let token = match self.credentials.access_token() {
                Some(token) => token,
                None => {
                    state.phase = Phase::Failed;
                    state.error = Some(DetectError::Unauthenticated.user_message());
                    return Err(DetectError::Unauthenticated);
                }
            };

            (selection, state.selection.generation(), token)
        };

        tracing::info!(
            file_name = selection.file_name(),
            media_class = %selection.media_class(),
            generation,
            "Starting analysis"
        );

        // Suspension point: the lock is released for the round trip
        let outcome = self.run_primary_request(&selection, &token).await;

        let mut state = self.lock();
        if state.selection.generation() != generation {
            tracing::debug!(
                stamped = generation,
                current = state.selection.generation(),
                "Discarding stale analysis response"
            );
            return Err(DetectError::Superseded);
        }

        match outcome {
            Ok((triple, heatmap_url)) => {
                let result = AnalysisResult {
                    triple,
                    heatmap_url,
                    completed_at: Utc::now(),
                };
                state.phase = Phase::Succeeded;
                state.result = Some(result.clone());

                tracing::info!(
                    real = triple.real,
                    fake = triple.fake,
                    ai = triple.ai,
                    verdict = %result.verdict(),
                    "Analysis succeeded"
                );

                if selection.media_class() == MediaClass::Image {
                    self.spawn_enrichment(&mut state, selection, token, generation);
                }

                Ok(result)
            }
            Err(e) => {
                state.phase = Phase::Failed;
                state.error = Some(e.user_message());
                tracing::error!(error = %e, "Analysis failed");
                Err(e)
            }
        }
    }

    async fn run_primary_request(
        &self,
        selection: &Arc<MediaSelection>,
        token: &str,
    ) -> Result<(ProbabilityTriple, Option<String>)> {
        match selection.media_class() {
            MediaClass::Image => {
                let response = self
                    .client
                    .predict(selection.file_name(), selection.bytes().to_vec(), token)
                    .await?;
                // Missing score maps are not an error: the normalizer
                // defaults every absent slot to zero
                let raw = RawScores::Image(response.all_scores.unwrap_or_default());
                let heatmap_url = response
                    .heatmap_url
                    .map(|path| self.client.absolute_url(&path));
                Ok((normalize(&raw), heatmap_url))
            }
            MediaClass::Video => {
                let response = self
                    .client
                    .predict_video(selection.file_name(), selection.bytes().to_vec(), token)
                    .await?;
                let raw = RawScores::Video(response.class_scores.unwrap_or_default());
                Ok((normalize(&raw), None))
            }
        }
    }

    /// Start the reverse-search task without awaiting it
    ///
    /// The task publishes into its own slot through a generation-checked
    /// update; it never touches the orchestrator phase.
    fn spawn_enrichment(
        &self,
        state: &mut Inner,
        selection: Arc<MediaSelection>,
        token: String,
        generation: u64,
    ) {
        let client = Arc::clone(&self.client);
        let shared = Arc::clone(&self.inner);

        let handle = tokio::spawn(async move {
            let outcome = enrichment::fetch_outcome(client, selection, token).await;
            let mut state = shared.lock().unwrap_or_else(PoisonError::into_inner);
            if state.selection.generation() == generation {
                state.enrichment = Some(outcome);
            } else {
                tracing::debug!(
                    stamped = generation,
                    current = state.selection.generation(),
                    "Discarding stale reverse search result"
                );
            }
        });

        state.enrichment_task = Some(handle);
    }

    /// Wait for the most recently spawned enrichment task to finish
    ///
    /// Observability hook for callers that want quiescence (CLI, tests);
    /// the task itself stays fire-and-forget.
    pub async fn await_enrichment(&self) {
        let handle = self.lock().enrichment_task.take();
        if let Some(handle) = handle {
            let _ = handle.await;
        }
    }

    pub fn phase(&self) -> Phase {
        self.lock().phase
    }

    pub fn result(&self) -> Option<AnalysisResult> {
        self.lock().result.clone()
    }

    pub fn enrichment(&self) -> Option<EnrichmentOutcome> {
        self.lock().enrichment.clone()
    }

    /// Message for the single user-visible failure surface, if failed
    pub fn last_error(&self) -> Option<String> {
        self.lock().error.clone()
    }

    pub fn selection(&self) -> Option<Arc<MediaSelection>> {
        self.lock().selection.current().cloned()
    }

    pub fn generation(&self) -> u64 {
        self.lock().selection.generation()
    }
}
