//! Orchestrator integration tests
//!
//! Each test spins up an in-process mock backend on an ephemeral port and
//! drives a real orchestrator against it over HTTP.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::{http::StatusCode, routing::post, Json, Router};
use serde_json::json;

use veriscan_core::{
    BackendConfig, DetectError, DetectionOrchestrator, EnrichmentOutcome, Phase,
    ReverseSearchLink, StaticCredential,
};

const PNG_MAGIC: &[u8] = b"\x89PNG\r\n\x1a\n\x00\x00\x00\rIHDR";

/// Serve a router on an ephemeral port, returning the base URL
async fn spawn_backend(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

fn orchestrator_for(base_url: &str) -> DetectionOrchestrator {
    let config = BackendConfig {
        base_url: base_url.to_string(),
        request_timeout: Duration::from_secs(5),
    };
    DetectionOrchestrator::new(&config, Arc::new(StaticCredential::new("test-token"))).unwrap()
}

fn image_backend() -> Router {
    Router::new()
        .route(
            "/predict",
            post(|| async {
                Json(json!({
                    "all_scores": {
                        "Real": "88.00%",
                        "Deepfake": "5.00%",
                        "AI-Generated Face": "7.00%"
                    },
                    "heatmap_url": "/uploads/x.png"
                }))
            }),
        )
        .route(
            "/reverse_search",
            post(|| async {
                Json(json!({
                    "reverse_search": {
                        "results": [
                            { "title": "Original photo", "link": "https://example.com/original" },
                            { "title": "No link entry" }
                        ]
                    }
                }))
            }),
        )
}

#[tokio::test]
async fn test_image_analysis_end_to_end() {
    let base = spawn_backend(image_backend()).await;
    let orch = orchestrator_for(&base);

    orch.select_bytes("photo.png", PNG_MAGIC.to_vec(), None).unwrap();
    let result = orch.analyze().await.unwrap();

    assert_eq!(result.triple.real, 88.0);
    assert_eq!(result.triple.fake, 5.0);
    assert_eq!(result.triple.ai, 7.0);
    assert_eq!(result.verdict().label(), "Likely Authentic");
    assert_eq!(
        result.heatmap_url.as_deref(),
        Some(format!("{}/uploads/x.png", base).as_str())
    );
    assert_eq!(orch.phase(), Phase::Succeeded);

    // Enrichment was spawned fire-and-forget; wait for quiescence and check
    // its independent slot
    orch.await_enrichment().await;
    assert_eq!(
        orch.enrichment(),
        Some(EnrichmentOutcome::Links(vec![ReverseSearchLink {
            title: "Original photo".to_string(),
            url: "https://example.com/original".to_string(),
        }]))
    );
}

#[tokio::test]
async fn test_video_analysis_uses_mean_scores() {
    let router = Router::new().route(
        "/predict_video",
        post(|| async {
            Json(json!({
                "class_scores": {
                    "Real": { "mean": "12.50%", "min": "2.00%", "max": "60.00%" },
                    "Deepfake": { "mean": "80.25%" },
                    "AI-Generated Face": { "mean": "3.00%" }
                }
            }))
        }),
    );
    let base = spawn_backend(router).await;
    let orch = orchestrator_for(&base);

    orch.select_bytes("clip.mp4", vec![0u8; 256], None).unwrap();
    let result = orch.analyze().await.unwrap();

    assert_eq!(result.triple.real, 12.5);
    assert_eq!(result.triple.fake, 80.25);
    assert_eq!(result.triple.ai, 3.0);
    assert!(result.heatmap_url.is_none());

    // No enrichment for video analyses
    orch.await_enrichment().await;
    assert_eq!(orch.enrichment(), None);
}

#[tokio::test]
async fn test_service_error_surfaces_backend_message() {
    let router = Router::new().route(
        "/predict",
        post(|| async {
            (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": "Invalid file type. Allowed: PNG, JPG" })),
            )
        }),
    );
    let base = spawn_backend(router).await;
    let orch = orchestrator_for(&base);

    orch.select_bytes("photo.png", PNG_MAGIC.to_vec(), None).unwrap();
    let err = orch.analyze().await.unwrap_err();

    match err {
        DetectError::Service { status, message } => {
            assert_eq!(status, 400);
            assert_eq!(message, "Invalid file type. Allowed: PNG, JPG");
        }
        other => panic!("expected service error, got {:?}", other),
    }
    assert_eq!(orch.phase(), Phase::Failed);
    assert_eq!(
        orch.last_error(),
        Some("Invalid file type. Allowed: PNG, JPG".to_string())
    );
    assert!(orch.result().is_none());
}

#[tokio::test]
async fn test_missing_score_map_defaults_to_zero_triple() {
    let router = Router::new()
        .route("/predict", post(|| async { Json(json!({})) }))
        .route(
            "/reverse_search",
            post(|| async { Json(json!({ "reverse_search": null })) }),
        );
    let base = spawn_backend(router).await;
    let orch = orchestrator_for(&base);

    orch.select_bytes("photo.png", PNG_MAGIC.to_vec(), None).unwrap();
    let result = orch.analyze().await.unwrap();

    // Success status with no scores is still a success, normalized to zeros
    assert_eq!(result.triple.real, 0.0);
    assert_eq!(result.triple.fake, 0.0);
    assert_eq!(result.triple.ai, 0.0);
    assert_eq!(orch.phase(), Phase::Succeeded);
}

#[tokio::test]
async fn test_stale_response_is_discarded_after_reselect() {
    let calls = Arc::new(AtomicUsize::new(0));
    let calls_handler = Arc::clone(&calls);
    let router = Router::new()
        .route(
            "/predict",
            post(move || {
                let calls = Arc::clone(&calls_handler);
                async move {
                    if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                        // First request is slow and will be superseded
                        tokio::time::sleep(Duration::from_millis(400)).await;
                        Json(json!({
                            "all_scores": {
                                "Real": "99.00%",
                                "Deepfake": "0.50%",
                                "AI-Generated Face": "0.50%"
                            }
                        }))
                    } else {
                        Json(json!({
                            "all_scores": {
                                "Real": "11.00%",
                                "Deepfake": "80.00%",
                                "AI-Generated Face": "9.00%"
                            }
                        }))
                    }
                }
            }),
        )
        .route(
            "/reverse_search",
            post(|| async { Json(json!({ "reverse_search": null })) }),
        );
    let base = spawn_backend(router).await;
    let orch = orchestrator_for(&base);

    orch.select_bytes("first.png", PNG_MAGIC.to_vec(), None).unwrap();
    let slow = {
        let orch = orch.clone();
        tokio::spawn(async move { orch.analyze().await })
    };
    tokio::time::sleep(Duration::from_millis(100)).await;

    // Reselecting bumps the generation while the first request is in flight
    orch.select_bytes("second.png", PNG_MAGIC.to_vec(), None).unwrap();
    let result = orch.analyze().await.unwrap();
    assert_eq!(result.triple.real, 11.0);

    // The slow response lands bound to the superseded generation
    let stale = slow.await.unwrap();
    assert!(matches!(stale, Err(DetectError::Superseded)));

    // No stale overwrite: state still reflects the newest selection
    assert_eq!(orch.phase(), Phase::Succeeded);
    assert_eq!(orch.result().unwrap().triple.real, 11.0);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_enrichment_failure_never_touches_primary_result() {
    let router = Router::new()
        .route(
            "/predict",
            post(|| async {
                Json(json!({
                    "all_scores": {
                        "Real": "88.00%",
                        "Deepfake": "5.00%",
                        "AI-Generated Face": "7.00%"
                    }
                }))
            }),
        )
        .route(
            "/reverse_search",
            post(|| async {
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": "search provider down" })),
                )
            }),
        );
    let base = spawn_backend(router).await;
    let orch = orchestrator_for(&base);

    orch.select_bytes("photo.png", PNG_MAGIC.to_vec(), None).unwrap();
    let result = orch.analyze().await.unwrap();
    orch.await_enrichment().await;

    assert_eq!(orch.enrichment(), Some(EnrichmentOutcome::NoResults));
    assert_eq!(orch.phase(), Phase::Succeeded);
    assert_eq!(orch.result().unwrap().triple.real, result.triple.real);
    assert!(orch.last_error().is_none());
}

#[tokio::test]
async fn test_stale_enrichment_is_discarded() {
    let router = Router::new()
        .route(
            "/predict",
            post(|| async {
                Json(json!({
                    "all_scores": { "Real": "88.00%" }
                }))
            }),
        )
        .route(
            "/reverse_search",
            post(|| async {
                tokio::time::sleep(Duration::from_millis(300)).await;
                Json(json!({
                    "reverse_search": {
                        "results": [{ "title": "Late match", "link": "https://example.com/late" }]
                    }
                }))
            }),
        );
    let base = spawn_backend(router).await;
    let orch = orchestrator_for(&base);

    orch.select_bytes("photo.png", PNG_MAGIC.to_vec(), None).unwrap();
    orch.analyze().await.unwrap();

    // New selection before the reverse search completes invalidates it
    orch.select_bytes("other.png", PNG_MAGIC.to_vec(), None).unwrap();
    tokio::time::sleep(Duration::from_millis(600)).await;

    assert_eq!(orch.enrichment(), None);
}

#[tokio::test]
async fn test_double_invocation_while_busy_is_rejected() {
    let router = Router::new().route(
        "/predict",
        post(|| async {
            tokio::time::sleep(Duration::from_millis(300)).await;
            Json(json!({ "all_scores": { "Real": "88.00%" } }))
        }),
    );
    let base = spawn_backend(router).await;
    let orch = orchestrator_for(&base);

    orch.select_bytes("photo.png", PNG_MAGIC.to_vec(), None).unwrap();
    let first = {
        let orch = orch.clone();
        tokio::spawn(async move { orch.analyze().await })
    };
    tokio::time::sleep(Duration::from_millis(50)).await;

    let err = orch.analyze().await.unwrap_err();
    assert!(matches!(err, DetectError::AnalysisInFlight));

    // The in-flight analysis is unaffected
    assert!(first.await.unwrap().is_ok());
    assert_eq!(orch.phase(), Phase::Succeeded);
}

#[tokio::test]
async fn test_reset_from_succeeded_clears_everything() {
    let base = spawn_backend(image_backend()).await;
    let orch = orchestrator_for(&base);

    orch.select_bytes("photo.png", PNG_MAGIC.to_vec(), None).unwrap();
    orch.analyze().await.unwrap();
    orch.await_enrichment().await;
    assert_eq!(orch.phase(), Phase::Succeeded);

    orch.reset();

    assert_eq!(orch.phase(), Phase::Idle);
    assert!(orch.selection().is_none());
    assert!(orch.result().is_none());
    assert!(orch.enrichment().is_none());
    assert!(orch.last_error().is_none());
}

#[tokio::test]
async fn test_unauthenticated_never_reaches_the_network() {
    let calls = Arc::new(AtomicUsize::new(0));
    let calls_handler = Arc::clone(&calls);
    let router = Router::new().route(
        "/predict",
        post(move || {
            let calls = Arc::clone(&calls_handler);
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Json(json!({ "all_scores": { "Real": "88.00%" } }))
            }
        }),
    );
    let base = spawn_backend(router).await;

    let config = BackendConfig {
        base_url: base,
        request_timeout: Duration::from_secs(5),
    };
    let orch =
        DetectionOrchestrator::new(&config, Arc::new(StaticCredential::anonymous())).unwrap();

    orch.select_bytes("photo.png", PNG_MAGIC.to_vec(), None).unwrap();
    let err = orch.analyze().await.unwrap_err();

    assert!(matches!(err, DetectError::Unauthenticated));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert_eq!(orch.phase(), Phase::Failed);
}

#[tokio::test]
async fn test_select_file_reads_from_disk() {
    let base = spawn_backend(image_backend()).await;
    let orch = orchestrator_for(&base);

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("photo.png");
    std::fs::write(&path, PNG_MAGIC).unwrap();

    let selection = orch.select_file(&path, None).unwrap();
    assert_eq!(selection.file_name(), "photo.png");

    let result = orch.analyze().await.unwrap();
    assert_eq!(result.triple.real, 88.0);
}

#[tokio::test]
async fn test_reanalyze_after_failure_recovers() {
    let calls = Arc::new(AtomicUsize::new(0));
    let calls_handler = Arc::clone(&calls);
    let router = Router::new()
        .route(
            "/predict",
            post(move || {
                let calls = Arc::clone(&calls_handler);
                async move {
                    if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                        (
                            StatusCode::SERVICE_UNAVAILABLE,
                            Json(json!({ "error": "model loading" })),
                        )
                    } else {
                        (
                            StatusCode::OK,
                            Json(json!({
                                "all_scores": {
                                    "Real": "10.00%",
                                    "Deepfake": "70.00%",
                                    "AI-Generated Face": "20.00%"
                                }
                            })),
                        )
                    }
                }
            }),
        )
        .route(
            "/reverse_search",
            post(|| async { Json(json!({ "reverse_search": null })) }),
        );
    let base = spawn_backend(router).await;
    let orch = orchestrator_for(&base);

    orch.select_bytes("photo.png", PNG_MAGIC.to_vec(), None).unwrap();
    assert!(orch.analyze().await.is_err());
    assert_eq!(orch.phase(), Phase::Failed);

    // Re-invoking from Failed returns through Busy to Succeeded
    let result = orch.analyze().await.unwrap();
    assert_eq!(result.triple.fake, 70.0);
    assert_eq!(result.verdict().label(), "Likely Fake");
    assert_eq!(orch.phase(), Phase::Succeeded);
    assert!(orch.last_error().is_none());
}
