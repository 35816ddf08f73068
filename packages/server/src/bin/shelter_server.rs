//! `shelter-server`: serves the shelter dashboard API.

use std::sync::Arc;

use clap::Parser;
use shelter_server::telemetry::init_tracing;
use shelter_server::{import_csv, AnimalShelter, Dashboard, MemoryDocumentStore, NetworkModule, ServerArgs};
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = ServerArgs::parse();
    init_tracing(args.log_json)?;

    let shelter = AnimalShelter::new(Arc::new(MemoryDocumentStore::new(args.collection.clone())));
    let dashboard = Dashboard::new(Arc::new(shelter.clone()), args.dashboard_config());

    let mut module = NetworkModule::new(args.network_config(), dashboard, shelter.clone());
    let port = module.start().await?;

    if let Some(path) = &args.seed_csv {
        let summary = import_csv(&shelter, path).await?;
        info!(
            inserted = summary.inserted,
            skipped = summary.skipped,
            "collection seeded"
        );
    } else {
        warn!(collection = %args.collection, "no seed CSV given, starting with an empty collection");
    }

    info!(port, "shelter dashboard ready");
    module
        .serve(async {
            if let Err(err) = tokio::signal::ctrl_c().await {
                warn!(error = %err, "failed to listen for ctrl-c");
                std::future::pending::<()>().await;
            }
            info!("shutdown signal received");
        })
        .await
}
