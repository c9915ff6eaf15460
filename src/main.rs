use std::sync::Arc;

use economy_api::{ApiConfig, ApiServer, AppContext};
use economy_billing::WebhookProcessor;
use economy_core::{CatalogStore, EconomyConfig};
use economy_db::repositories::ItemRepository;
use economy_db::{DatabaseConfig, DatabasePool};
use economy_engine::{
    HuntEngine, Ledger, Marketplace, TradeEngine, TradeSweeper, UpgradeEngine,
};
use economy_metrics::{MetricsConfig, MetricsServer};
use tokio::sync::broadcast;
use tracing::{error, info, warn, Level};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file (ignore if not found)
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive(Level::INFO.into())
                .add_directive("economy_engine=info".parse()?)
                .add_directive("economy_billing=info".parse()?),
        )
        .init();

    info!("Economy service starting...");

    let economy_config = match EconomyConfig::from_env() {
        Ok(config) => {
            info!(
                cooldown_hours = config.free_hunt_cooldown_hours,
                trade_expiry_hours = config.trade_expiry_hours,
                providers = config.webhook_secrets.len(),
                "Configuration loaded"
            );
            Arc::new(config)
        }
        Err(e) => {
            error!(error = %e, "Failed to load configuration");
            std::process::exit(1);
        }
    };

    // Database pool + migrations
    let db_config = DatabaseConfig::from_env();
    let db_pool = Arc::new(DatabasePool::new(&db_config).await?);
    db_pool.migrate().await?;

    // Warm the item catalog cache; hunts cannot grant from an empty catalog.
    let catalog = Arc::new(CatalogStore::new());
    let rows = ItemRepository::get_all(db_pool.inner()).await?;
    let mut items = Vec::with_capacity(rows.len());
    for row in rows {
        items.push(row.into_item()?);
    }
    if items.is_empty() {
        warn!("Item catalog is empty; hunt collection will fail until items are seeded");
    }
    catalog.load(items);

    // Metrics server (also installs the Prometheus recorder)
    let metrics_config = MetricsConfig::from_env();
    tokio::spawn(async move {
        if let Err(e) = MetricsServer::new(metrics_config).run().await {
            error!(error = %e, "Metrics server failed");
        }
    });
    economy_metrics::gauges::catalog_items(catalog.len() as f64);

    // Domain engines
    let marketplace = Arc::new(Marketplace::new(db_pool.clone()));
    let trades = TradeEngine::new(db_pool.clone(), economy_config.clone());
    let ctx = Arc::new(AppContext {
        ledger: Ledger::new(db_pool.clone(), catalog.clone()),
        hunt: HuntEngine::new(db_pool.clone(), catalog.clone(), economy_config.clone()),
        upgrade: UpgradeEngine::new(db_pool.clone()),
        marketplace: marketplace.clone(),
        trades,
        billing: WebhookProcessor::new(db_pool.clone(), marketplace, economy_config.clone()),
    });

    // Stale-trade sweeper
    let (shutdown_tx, _) = broadcast::channel(1);
    let sweeper_engine = Arc::new(TradeEngine::new(db_pool.clone(), economy_config.clone()));
    let sweeper = TradeSweeper::new(sweeper_engine, economy_config.sweep_interval_secs);
    let sweeper_handle = tokio::spawn(sweeper.run(shutdown_tx.subscribe()));

    // API server
    let api_config = ApiConfig::from_env();
    let api_handle = tokio::spawn(async move {
        if let Err(e) = ApiServer::new(api_config, ctx).run().await {
            error!(error = %e, "API server failed");
        }
    });

    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received");

    let _ = shutdown_tx.send(());
    let _ = sweeper_handle.await;
    api_handle.abort();
    db_pool.close().await;

    info!("Economy service stopped");
    Ok(())
}
