use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tokio::net::TcpListener;

use tutor_rag::cli::{Cli, Commands};
use tutor_rag::core::config::{AppPaths, ConfigService};
use tutor_rag::state::{build_indexer, AppState};
use tutor_rag::{console, logging, server};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let paths = Arc::new(AppPaths::new());
    logging::init(&paths, &cli.log_level);

    match cli.command() {
        Commands::Chat => chat(paths).await,
        Commands::Serve { host, port } => serve(paths, host, port).await,
        Commands::Index => index(paths).await,
    }
}

async fn chat(paths: Arc<AppPaths>) -> anyhow::Result<()> {
    let state = AppState::initialize(paths)?;

    if state.engine.retrieval_enabled() {
        match state.index_corpus().await {
            Ok(report) => tracing::info!(
                "Corpus ready: {} documents, {} chunks",
                report.documents,
                report.chunks
            ),
            Err(err) => tracing::warn!("Corpus indexing failed, answering without retrieval: {}", err),
        }
    }

    console::run(&state.engine).await
}

async fn serve(paths: Arc<AppPaths>, host: Option<String>, port: Option<u16>) -> anyhow::Result<()> {
    let state = AppState::initialize(paths)?;

    let host = host.unwrap_or_else(|| state.config.server.host.clone());
    let port = port.unwrap_or(state.config.server.port);
    let bind_addr = format!("{}:{}", host, port);

    let listener = TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", bind_addr))?;
    let addr = listener.local_addr()?;

    println!("TUTOR_PORT={}", addr.port());
    tracing::info!("Listening on {}", addr);

    // Index in the background; `ask` answers IndexNotReady until it finishes.
    if state.engine.retrieval_enabled() {
        let indexing_state = state.clone();
        tokio::spawn(async move {
            if let Err(err) = indexing_state.index_corpus().await {
                tracing::warn!("Initial corpus indexing failed: {}", err);
            }
        });
    }

    let app = server::router(state);
    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}

async fn index(paths: Arc<AppPaths>) -> anyhow::Result<()> {
    let config_service = ConfigService::new(paths.clone());
    let config = config_service.load_config()?;
    let api_key = config_service.api_key(&config).ok();

    let indexer = build_indexer(&config, api_key)?;
    let root = paths.resolve(&config.rag.corpus_dir);
    let load = tutor_rag::rag::DirectorySource::new().load(&root)?;
    let report = indexer.build(&load.documents, load.failures).await?;

    println!(
        "Indexed {} documents into {} chunks (dimension {}) from {}",
        report.documents,
        report.chunks,
        report.index.dimension(),
        root.display()
    );
    for failure in &report.failures {
        println!("  failed: {} ({})", failure.source.display(), failure.reason);
    }

    Ok(())
}
