pub mod config;
pub mod log;
pub mod metrics;
pub mod price_provider;
pub mod providers;
pub mod scheduler;
pub mod server;
pub mod valuation;

use anyhow::Result;
use prometheus::Registry;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info};

use crate::price_provider::PriceProvider;
use crate::providers::cryptocompare::CryptoCompareProvider;
use crate::valuation::PortfolioTotal;

pub async fn run(config_path: Option<&str>) -> Result<()> {
    info!("Coinfolio exporter starting...");

    let config = match config_path {
        Some(path) => config::AppConfig::load_from_path(path)?,
        None => config::AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");

    let registry = Arc::new(Registry::new());
    let gauges = Arc::new(metrics::prepare_gauges(
        &registry,
        &config.symbols(),
        &config.currency,
    )?);

    let base_url = config
        .providers
        .cryptocompare
        .as_ref()
        .map_or("https://min-api.cryptocompare.com", |p| &p.base_url);
    let provider: Arc<dyn PriceProvider> = Arc::new(CryptoCompareProvider::new(base_url));

    let config = Arc::new(config);
    let total = Arc::new(PortfolioTotal::new());

    // First cycle runs before the server binds so "/" has data immediately.
    valuation::update_portfolio(provider.as_ref(), &config, &gauges, &total).await;

    // Held for the server's lifetime; dropping it stops the scheduler.
    let (_shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(scheduler::run(
        Arc::clone(&provider),
        Arc::clone(&config),
        Arc::clone(&gauges),
        Arc::clone(&total),
        shutdown_rx,
    ));

    let state = server::AppState { total, registry };
    server::serve(&config.bind_address, state).await
}
