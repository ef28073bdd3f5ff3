//! HTTP client for the analysis backend
//!
//! One `reqwest::Client` per orchestrator, owning the base URL, timeout, and
//! user agent. Every endpoint takes the raw file as a multipart body (field
//! `file`) with the session credential attached as a bearer authorization
//! header.

use std::collections::HashMap;

use reqwest::multipart;
use serde::Deserialize;

use crate::config::BackendConfig;
use crate::error::{DetectError, Result};
use crate::score::ClassStat;

const USER_AGENT: &str = concat!("veriscan/", env!("CARGO_PKG_VERSION"));

/// Success body of `POST /predict`
#[derive(Debug, Clone, Deserialize)]
pub struct PredictResponse {
    /// Label → percentage string, e.g. `"Real": "88.00%"`
    pub all_scores: Option<HashMap<String, String>>,
    /// Server-relative path to a generated heatmap image
    pub heatmap_url: Option<String>,
}

/// Success body of `POST /predict_video`
#[derive(Debug, Clone, Deserialize)]
pub struct PredictVideoResponse {
    /// Label → per-class aggregate statistics
    pub class_scores: Option<HashMap<String, ClassStat>>,
}

/// Success body of `POST /reverse_search`
///
/// The backend answers 200 even on its own internal failures, with
/// `reverse_search: null`; that is a valid "no results" response.
#[derive(Debug, Clone, Deserialize)]
pub struct ReverseSearchResponse {
    pub reverse_search: Option<ReverseSearchBody>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReverseSearchBody {
    pub results: Option<Vec<ReverseSearchHit>>,
    /// Set when the backend fell back to a secondary search provider
    pub note: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReverseSearchHit {
    pub title: Option<String>,
    pub link: Option<String>,
}

/// Non-success bodies may carry a service-provided message
#[derive(Debug, Deserialize)]
struct ServiceErrorBody {
    error: Option<String>,
}

/// Client for the detection backend
pub struct BackendClient {
    http_client: reqwest::Client,
    base_url: String,
}

impl BackendClient {
    pub fn new(config: &BackendConfig) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| DetectError::Transport(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: config.base_url.clone(),
        })
    }

    /// Service base address, without a trailing slash
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Build an absolute URL from a server-relative path (e.g. a heatmap)
    pub fn absolute_url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// `POST /predict`: image analysis
    pub async fn predict(
        &self,
        file_name: &str,
        bytes: Vec<u8>,
        token: &str,
    ) -> Result<PredictResponse> {
        self.post_multipart("/predict", file_name, bytes, token, "Image prediction failed")
            .await
    }

    /// `POST /predict_video`: video analysis
    ///
    /// Video inference is slow on the backend; the shared client timeout is
    /// sized for it (see config).
    pub async fn predict_video(
        &self,
        file_name: &str,
        bytes: Vec<u8>,
        token: &str,
    ) -> Result<PredictVideoResponse> {
        self.post_multipart(
            "/predict_video",
            file_name,
            bytes,
            token,
            "Video prediction failed",
        )
        .await
    }

    /// `POST /reverse_search`: best-effort reverse image search
    pub async fn reverse_search(
        &self,
        file_name: &str,
        bytes: Vec<u8>,
        token: &str,
    ) -> Result<ReverseSearchResponse> {
        self.post_multipart(
            "/reverse_search",
            file_name,
            bytes,
            token,
            "Reverse search failed",
        )
        .await
    }

    async fn post_multipart<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        file_name: &str,
        bytes: Vec<u8>,
        token: &str,
        generic_message: &str,
    ) -> Result<T> {
        let part = multipart::Part::bytes(bytes).file_name(file_name.to_string());
        let form = multipart::Form::new().part("file", part);

        tracing::debug!(path, file_name, "Uploading media to analysis backend");

        let response = self
            .http_client
            .post(format!("{}{}", self.base_url, path))
            .bearer_auth(token)
            .multipart(form)
            .send()
            .await
            .map_err(|e| DetectError::Transport(e.to_string()))?;

        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ServiceErrorBody>(&body)
                .ok()
                .and_then(|b| b.error)
                .unwrap_or_else(|| generic_message.to_string());
            return Err(DetectError::Service {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json()
            .await
            .map_err(|e| DetectError::Transport(format!("invalid response body: {}", e)))
    }
}
