use std::sync::Arc;

use mediad_core::config;
use mediad_core::extract::YtDlpExtractor;
use mediad_core::jobs::Orchestrator;
use mediad_core::{locate, logging};

use mediad_server::app::{self, AppState};

#[tokio::main]
async fn main() {
    // Initialize logging as early as possible; fall back to stderr if the
    // state dir is unwritable.
    if logging::init_logging().is_err() {
        logging::init_logging_stderr();
    }

    if let Err(err) = run().await {
        eprintln!("mediad error: {err:#}");
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let cfg = config::load_or_init()?;
    tracing::debug!("loaded config: {:?}", cfg);

    let output_dir = cfg.resolved_output_dir()?;
    std::fs::create_dir_all(&output_dir)?;
    // Clear in-progress leftovers from a previous process.
    locate::sweep_partials(&output_dir);

    let extractor = Arc::new(YtDlpExtractor::new(cfg.extractor.clone(), output_dir.clone()));
    let orchestrator = Orchestrator::new(&cfg, extractor, output_dir);

    let router = app::router(AppState { orchestrator });
    let listener = tokio::net::TcpListener::bind(&cfg.bind_addr).await?;
    tracing::info!("mediad listening on {}", cfg.bind_addr);
    axum::serve(listener, router).await?;
    Ok(())
}
