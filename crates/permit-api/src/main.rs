//! permit-api server binary.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use permit_api::auth::{LoggingMailSender, MagicLinkStore};
use permit_api::jobs::{JobContext, JobQueue};
use permit_api::metrics::ApiMetrics;
use permit_api::state::AppState;
use permit_pack::PackLoader;
use permit_portal::DriverRegistry;
use permit_state::{seed_demo_data, MemoryStore, Storage};

/// Permit application workflow API.
#[derive(Debug, Parser)]
#[command(name = "permit-api", version, about)]
struct Args {
    /// Address to listen on.
    #[arg(long, default_value = "127.0.0.1:8080")]
    listen: String,

    /// Directory holding jurisdiction pack documents.
    #[arg(long, default_value = "crates/permit-pack/jurisdictions")]
    jurisdictions_dir: PathBuf,

    /// Seed demo records (org, projects, cases, session) at startup.
    #[arg(long)]
    seed: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let store: Arc<dyn Storage> = Arc::new(MemoryStore::new());
    if args.seed {
        let summary = seed_demo_data(store.as_ref())?;
        tracing::info!(
            org = %summary.org_id,
            ready_case = %summary.ready_case_id,
            incomplete_case = %summary.incomplete_case_id,
            token = permit_state::seed::SEED_SESSION_TOKEN,
            "demo data seeded"
        );
    }

    let loader = Arc::new(PackLoader::with_cache(args.jurisdictions_dir.clone()));
    let drivers = Arc::new(DriverRegistry::with_mock_drivers());
    let metrics = ApiMetrics::new();
    let jobs = JobQueue::start(JobContext {
        store: store.clone(),
        loader: loader.clone(),
        drivers: drivers.clone(),
    });

    let state = AppState {
        store,
        loader,
        drivers,
        magic_links: Arc::new(MagicLinkStore::new()),
        mailer: Arc::new(LoggingMailSender),
        jobs,
        metrics,
    };

    let listener = tokio::net::TcpListener::bind(&args.listen).await?;
    tracing::info!(addr = %args.listen, "permit-api listening");
    axum::serve(listener, permit_api::app(state)).await?;
    Ok(())
}
