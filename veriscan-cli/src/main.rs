//! veriscan: command-line client for the media authenticity service
//!
//! Submits one image or video for analysis and prints the normalized
//! probability verdict, the heatmap reference when the backend generated
//! one, and any reverse-image-search matches.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, ValueEnum};
use serde_json::json;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;
use veriscan_core::{
    BackendConfig, DetectionOrchestrator, EnrichmentOutcome, MediaClass, StaticCredential,
    TomlConfig,
};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum MediaKind {
    Image,
    Video,
}

impl From<MediaKind> for MediaClass {
    fn from(kind: MediaKind) -> Self {
        match kind {
            MediaKind::Image => MediaClass::Image,
            MediaKind::Video => MediaClass::Video,
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "veriscan", about = "Media authenticity detection client", version)]
struct Cli {
    /// Image or video file to analyze
    file: PathBuf,

    /// Treat the file as this media class instead of deriving it
    #[arg(long, value_enum)]
    media: Option<MediaKind>,

    /// Backend base URL (overrides config file and default)
    #[arg(long, env = "VERISCAN_BACKEND_URL")]
    backend_url: Option<String>,

    /// Bearer token for the analysis service
    #[arg(long, env = "VERISCAN_ACCESS_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Do not wait for the reverse-image-search enrichment
    #[arg(long)]
    no_enrichment_wait: bool,

    /// Emit the result as JSON on stdout
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so --json output stays machine-readable
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let toml_config = match &cli.config {
        Some(path) => Some(TomlConfig::load(path)?),
        None => None,
    };
    let mut config = BackendConfig::resolve(toml_config.as_ref());
    if let Some(url) = &cli.backend_url {
        config.base_url = url.trim_end_matches('/').to_string();
    }

    let credentials = match &cli.token {
        Some(token) => StaticCredential::new(token.clone()),
        None => StaticCredential::from_env(),
    };

    let orchestrator = DetectionOrchestrator::new(&config, Arc::new(credentials))?;

    let selection = orchestrator.select_file(&cli.file, cli.media.map(MediaClass::from))?;
    info!(
        file = %cli.file.display(),
        media_class = %selection.media_class(),
        size_bytes = selection.size_bytes(),
        "Media selected"
    );

    let result = match orchestrator.analyze().await {
        Ok(result) => result,
        Err(e) => {
            eprintln!("{}", e.user_message());
            std::process::exit(1);
        }
    };

    let wait_for_enrichment =
        selection.media_class() == MediaClass::Image && !cli.no_enrichment_wait;
    if wait_for_enrichment {
        orchestrator.await_enrichment().await;
    }
    let enrichment = orchestrator.enrichment();

    if cli.json {
        let output = json!({
            "results": result.triple,
            "verdict": result.verdict(),
            "heatmap_url": result.heatmap_url,
            "reverse_search": enrichment,
            "completed_at": result.completed_at,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!("Verdict: {}", result.verdict());
    println!("  Real:         {:.2}%", result.triple.real);
    println!("  Deepfake:     {:.2}%", result.triple.fake);
    println!("  AI-Generated: {:.2}%", result.triple.ai);
    if let Some(heatmap_url) = &result.heatmap_url {
        println!("Heatmap: {}", heatmap_url);
    }
    match enrichment {
        Some(EnrichmentOutcome::Links(links)) => {
            println!("Reverse search matches:");
            for link in links {
                println!("  {} ({})", link.title, link.url);
            }
        }
        Some(EnrichmentOutcome::NoResults) => println!("Reverse search: no results"),
        None => {}
    }

    Ok(())
}
