//! Wiring & DI. Entry point: bootstrap adapters, inject into services, run the batch.
//! No business logic here; per-company failures are logged and the batch moves on.

use ch_sync::adapters::persistence::{FsContentStore, SqliteStore};
use ch_sync::adapters::registry::CompaniesHouseGateway;
use ch_sync::ports::{ContentStorePort, IndexStorePort, ProfileStorePort, RegistryGateway};
use ch_sync::shared::config::AppConfig;
use ch_sync::shared::pacing::Pacer;
use ch_sync::usecases::{IngestReport, IngestService, ProfileService, ReconciliationService};
use dotenv::dotenv;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cfg = AppConfig::load().unwrap_or_default();

    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.is_empty() {
        anyhow::bail!("usage: ch-sync <company-number>... | ch-sync report");
    }

    let data_path = PathBuf::from(cfg.data_dir_or_default());
    info!(path = %data_path.display(), "data directory");

    // --- Adapters ---
    let registry: Arc<dyn RegistryGateway> = Arc::new(CompaniesHouseGateway::new(
        cfg.api_base_url_or_default(),
        cfg.api_key(),
    ));
    if cfg.api_key().is_none() {
        warn!("CH_SYNC_API_KEY is not set; registry requests will be unauthenticated");
    }

    let sqlite = Arc::new(
        SqliteStore::connect(&data_path)
            .await
            .map_err(|e| anyhow::anyhow!("SQLite connect failed: {}", e))?,
    );
    let profiles: Arc<dyn ProfileStorePort> = Arc::clone(&sqlite) as Arc<dyn ProfileStorePort>;
    let index: Arc<dyn IndexStorePort> = Arc::clone(&sqlite) as Arc<dyn IndexStorePort>;
    let content: Arc<dyn ContentStorePort> =
        Arc::new(FsContentStore::new(data_path.join("documents")));

    let pace_delay_ms = cfg.pace_delay_ms_or_default();
    info!(pace_delay_ms, "registry pacing: {} ms between calls", pace_delay_ms);
    let pacer = Pacer::new(Duration::from_millis(pace_delay_ms));

    // --- Services ---
    let profile_service = ProfileService::new(Arc::clone(&registry), Arc::clone(&profiles));
    let ingest_service = IngestService::new(
        Arc::clone(&registry),
        Arc::clone(&content),
        Arc::clone(&index),
        pacer,
    );
    let reconciliation =
        ReconciliationService::new(Arc::clone(&profiles), cfg.scan_page_size_or_default());

    if args[0] == "report" {
        return run_report(&reconciliation).await;
    }

    for company_id in &args {
        let company_id = company_id.as_str();
        if let Err(e) = profile_service.upsert_profile(company_id).await {
            error!(company_id, error = %e, "profile refresh failed; skipping company");
            continue;
        }
        match ingest_service.ingest_company(company_id).await {
            Ok(IngestReport::NoAccountsFilings) => {
                info!(company_id, "nothing to archive")
            }
            Ok(report) => info!(
                company_id,
                stored = report.stored(),
                failed = report.failed(),
                "company processed"
            ),
            Err(e) => error!(company_id, error = %e, "company processing failed"),
        }
    }

    Ok(())
}

/// Print the last-accounts projection over every known company.
async fn run_report(reconciliation: &ReconciliationService) -> anyhow::Result<()> {
    let info = reconciliation
        .collect_last_accounts_info()
        .await
        .map_err(|e| anyhow::anyhow!("{}", e))?;
    let known = reconciliation
        .collect_company_ids()
        .await
        .map_err(|e| anyhow::anyhow!("{}", e))?;

    info!(
        companies = known.len(),
        with_accounts = info.len(),
        "last-accounts report"
    );
    let mut entries: Vec<_> = info.into_iter().collect();
    entries.sort();
    for (company_id, made_up_to) in entries {
        println!("{company_id}\t{made_up_to}");
    }
    Ok(())
}
