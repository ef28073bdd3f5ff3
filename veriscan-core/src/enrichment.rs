//! Reverse-image-search enrichment
//!
//! Advisory, fire-and-forget companion to the primary analysis. Every
//! failure on this path is absorbed: logged, degraded to "no results", and
//! never surfaced as an analysis error.

use std::sync::Arc;

use serde::Serialize;

use crate::client::{BackendClient, ReverseSearchResponse};
use crate::selection::MediaSelection;

/// One usable reverse-search match
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReverseSearchLink {
    pub title: String,
    pub url: String,
}

/// Published result of one enrichment attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum EnrichmentOutcome {
    /// At least one match with a usable link
    Links(Vec<ReverseSearchLink>),
    /// Completed with nothing to show (including every absorbed failure)
    NoResults,
}

/// Map a reverse-search response to the published outcome
///
/// Entries without a link are dropped; a missing title falls back to the
/// link itself.
pub fn outcome_from_response(response: &ReverseSearchResponse) -> EnrichmentOutcome {
    let Some(body) = &response.reverse_search else {
        return EnrichmentOutcome::NoResults;
    };

    if let Some(note) = &body.note {
        tracing::info!(note = %note, "Reverse search used a fallback provider");
    }

    let links: Vec<ReverseSearchLink> = body
        .results
        .iter()
        .flatten()
        .filter_map(|hit| {
            let url = hit.link.clone()?;
            let title = hit
                .title
                .clone()
                .filter(|t| !t.trim().is_empty())
                .unwrap_or_else(|| url.clone());
            Some(ReverseSearchLink { title, url })
        })
        .collect();

    if links.is_empty() {
        EnrichmentOutcome::NoResults
    } else {
        EnrichmentOutcome::Links(links)
    }
}

/// Run one best-effort reverse search; never fails
///
/// No retry and no timeout beyond the shared client timeout: a single
/// attempt per primary analysis.
pub(crate) async fn fetch_outcome(
    client: Arc<BackendClient>,
    selection: Arc<MediaSelection>,
    token: String,
) -> EnrichmentOutcome {
    match client
        .reverse_search(selection.file_name(), selection.bytes().to_vec(), &token)
        .await
    {
        Ok(response) => outcome_from_response(&response),
        Err(e) => {
            tracing::warn!(error = %e, "Reverse search failed");
            EnrichmentOutcome::NoResults
        }
    }
}
