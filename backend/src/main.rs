//! Episode operator backend
//!
//! `serve` runs the reveal oracle as three concurrent subsystems:
//!
//! - **Listener**: WebSocket subscription to program events + startup catch-up scan.
//! - **Fulfiller**: Consumes reveal requests and submits Ed25519-proven randomness.
//! - **HTTP server**: Liveness (`/health`), readiness (`/status`) and `/metrics`.
//!
//! The remaining subcommands are one-shot operator tools: creating an
//! episode from a layout file, building and publishing the whitelist, and
//! moving the episode through its chapters.

use actix_web::{App, HttpResponse, HttpServer, web};
use anyhow::Result;
use clap::{Parser, Subcommand};
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signer;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::mpsc;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt};

mod commands;
mod config;
mod episode;
mod fulfiller;
mod instructions;
mod listener;
mod metrics;
mod transactions;
mod vrf;
mod whitelist;

use config::{AppConfig, OracleConfig};
use episode::{EpisodeLayout, LabelBook};
use metrics::Metrics;

#[derive(Parser, Debug)]
#[command(name = "episode-backend", version, about = "Operator and reveal oracle for staged episode sales")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run the reveal oracle and its HTTP probes.
    Serve {
        /// Episode layout used to print chapter labels in logs.
        #[arg(long)]
        layout: Option<PathBuf>,
    },

    /// Create and configure an episode from a JSON layout file.
    WriteEpisode {
        #[arg(long)]
        file: PathBuf,
        /// Resume after a failed batch: number of instructions already confirmed.
        #[arg(long, default_value_t = 0)]
        skip: usize,
        /// Validate and derive the episode address without sending anything.
        #[arg(long)]
        dry_run: bool,
    },

    /// Whitelist tree tools.
    #[command(subcommand)]
    Whitelist(WhitelistCmd),

    /// Emit an onlife event (default `EpisodeProgressedOnlife`).
    Progress {
        #[arg(long)]
        episode: Pubkey,
        #[arg(long)]
        event: Option<String>,
    },

    /// Request reveal randomness for an episode in a revealing chapter.
    Reveal {
        #[arg(long)]
        episode: Pubkey,
    },
}

#[derive(Debug, Subcommand)]
enum WhitelistCmd {
    /// Build the Merkle root and per-account proofs from JSON or CSV allocations.
    Build {
        #[arg(long)]
        input: PathBuf,
        #[arg(long, default_value = "whitelist-proofs.json")]
        output: PathBuf,
    },

    /// Store a whitelist root on an episode.
    Publish {
        #[arg(long)]
        episode: Pubkey,
        /// Hex root; alternatively read from `--proofs`.
        #[arg(long, conflicts_with = "proofs")]
        root: Option<String>,
        #[arg(long)]
        proofs: Option<PathBuf>,
    },
}

/// Shared application state accessible from HTTP handlers.
struct AppState {
    /// Number of fulfillment transactions currently in-flight.
    pending_count: Arc<AtomicU64>,
    metrics: Arc<Metrics>,
}

/// Liveness probe: returns 200 if the process is running.
async fn health() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({"status": "ok"}))
}

/// Readiness / status probe: reports the number of in-flight fulfillments.
async fn status(data: web::Data<AppState>) -> HttpResponse {
    let pending = data.pending_count.load(Ordering::Relaxed);
    HttpResponse::Ok().json(serde_json::json!({
        "status": "running",
        "pending_fulfillments": pending
    }))
}

async fn metrics_handler(data: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(data.metrics.to_json())
}

async fn serve(config: AppConfig, layout: Option<PathBuf>) -> Result<()> {
    let oracle = OracleConfig::from_env()?;
    let labels = match layout {
        Some(path) => EpisodeLayout::load(&path)?.label_book(),
        None => LabelBook::default(),
    };

    info!(
        program = %config.program_id,
        authority = %config.authority_keypair.pubkey(),
        "Starting episode oracle"
    );
    info!(rpc = %config.rpc_url, ws = %config.ws_url, "Endpoints configured");

    let pending_count = Arc::new(AtomicU64::new(0));
    let metrics = Arc::new(Metrics::new());
    let (tx, rx) = mpsc::channel(256);

    // Pick up reveal requests issued while the oracle was offline.
    listener::catch_up_pending_requests(&config, &tx).await;

    let listener_config = config.clone();
    let listener_metrics = metrics.clone();
    let labels = Arc::new(labels);
    tokio::spawn(async move {
        listener::listen_for_events(listener_config, tx, labels, listener_metrics).await;
    });

    let fulfiller_config = config.clone();
    let fulfiller_pending = pending_count.clone();
    let fulfiller_metrics = metrics.clone();
    let http_port = oracle.http_port;
    tokio::spawn(async move {
        fulfiller::run_fulfiller(
            fulfiller_config,
            oracle,
            rx,
            fulfiller_pending,
            fulfiller_metrics,
        )
        .await;
    });

    let state = web::Data::new(AppState {
        pending_count,
        metrics,
    });

    let addr = ("0.0.0.0", http_port);
    info!(port = http_port, "Starting HTTP server");

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .route("/health", web::get().to(health))
            .route("/status", web::get().to(status))
            .route("/metrics", web::get().to(metrics_handler))
    })
    .bind(addr)?
    .run()
    .await?;
    Ok(())
}

#[actix_web::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,solana_client=warn,solana_rpc_client=warn,hyper=warn")),
        )
        .with_target(true)
        .with_ansi(true)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Whitelist(WhitelistCmd::Build { input, output }) => {
            commands::build_whitelist(&input, &output)
        }
        Commands::Whitelist(WhitelistCmd::Publish {
            episode,
            root,
            proofs,
        }) => {
            let root = commands::resolve_root(root.as_deref(), proofs.as_deref())?;
            commands::publish_whitelist(&AppConfig::from_env()?, &episode, root).await
        }
        Commands::Serve { layout } => serve(AppConfig::from_env()?, layout).await,
        Commands::WriteEpisode {
            file,
            skip,
            dry_run,
        } => commands::write_episode(&AppConfig::from_env()?, &file, skip, dry_run).await,
        Commands::Progress { episode, event } => {
            commands::progress(&AppConfig::from_env()?, &episode, event.as_deref()).await
        }
        Commands::Reveal { episode } => {
            commands::request_reveal(&AppConfig::from_env()?, &episode).await
        }
    }
}
