use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::{self, MissedTickBehavior};
use tracing::info;

use crate::config::AppConfig;
use crate::metrics::GaugeSet;
use crate::price_provider::PriceProvider;
use crate::valuation::{self, PortfolioTotal};

/// Drives the refresh loop until the shutdown channel fires or its
/// sender is dropped.
///
/// Cycles run inline in this task, so two can never overlap; a cycle
/// that outlasts the interval simply delays the next tick. The caller
/// is expected to run the first update itself before spawning this, so
/// the query surface has data from the start.
pub async fn run(
    provider: Arc<dyn PriceProvider>,
    config: Arc<AppConfig>,
    gauges: Arc<GaugeSet>,
    total: Arc<PortfolioTotal>,
    mut shutdown: watch::Receiver<bool>,
) {
    let period = Duration::from_secs(config.refresh_interval_secs.max(1));
    let mut ticker = time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick completes immediately; the initial update already ran.
    ticker.tick().await;

    info!(period_secs = period.as_secs(), "Scheduler started");
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                valuation::update_portfolio(provider.as_ref(), &config, &gauges, &total).await;
            }
            _ = shutdown.changed() => {
                info!("Scheduler stopping");
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CoinHolding;
    use crate::metrics::prepare_gauges;
    use crate::price_provider::PriceTable;
    use anyhow::Result;
    use async_trait::async_trait;
    use prometheus::Registry;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingProvider {
        calls: Arc<AtomicUsize>,
        price: f64,
    }

    #[async_trait]
    impl PriceProvider for CountingProvider {
        async fn fetch_prices(&self, _symbols: &[String], currency: &str) -> Result<PriceTable> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let mut table = PriceTable::new();
            table.insert(
                "BTC".to_string(),
                HashMap::from([(currency.to_string(), self.price)]),
            );
            Ok(table)
        }
    }

    fn test_config(refresh_interval_secs: u64) -> AppConfig {
        AppConfig {
            bind_address: "127.0.0.1:0".to_string(),
            currency: "USD".to_string(),
            refresh_interval_secs,
            coins: vec![CoinHolding {
                name: "BTC".to_string(),
                amount: 1.0,
            }],
            providers: Default::default(),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticks_run_updates_until_shutdown() {
        let calls = Arc::new(AtomicUsize::new(0));
        let provider: Arc<dyn PriceProvider> = Arc::new(CountingProvider {
            calls: Arc::clone(&calls),
            price: 42000.0,
        });
        let config = Arc::new(test_config(60));
        let registry = Registry::new();
        let gauges = Arc::new(
            prepare_gauges(&registry, &config.symbols(), &config.currency).unwrap(),
        );
        let total = Arc::new(PortfolioTotal::new());

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let handle = tokio::spawn(run(
            provider,
            Arc::clone(&config),
            Arc::clone(&gauges),
            Arc::clone(&total),
            shutdown_rx,
        ));

        // Paused clock auto-advances; two periods mean two cycles.
        time::sleep(Duration::from_secs(121)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(total.load(), 42000.0);

        shutdown_tx.send(true).unwrap();
        handle.await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_before_first_tick_runs_no_update() {
        let calls = Arc::new(AtomicUsize::new(0));
        let provider: Arc<dyn PriceProvider> = Arc::new(CountingProvider {
            calls: Arc::clone(&calls),
            price: 42000.0,
        });
        let config = Arc::new(test_config(60));
        let registry = Registry::new();
        let gauges = Arc::new(
            prepare_gauges(&registry, &config.symbols(), &config.currency).unwrap(),
        );
        let total = Arc::new(PortfolioTotal::new());

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let handle = tokio::spawn(run(provider, config, gauges, total, shutdown_rx));

        time::sleep(Duration::from_secs(1)).await;
        shutdown_tx.send(true).unwrap();
        handle.await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_sender_stops_scheduler() {
        let calls = Arc::new(AtomicUsize::new(0));
        let provider: Arc<dyn PriceProvider> = Arc::new(CountingProvider {
            calls: Arc::clone(&calls),
            price: 42000.0,
        });
        let config = Arc::new(test_config(60));
        let registry = Registry::new();
        let gauges = Arc::new(
            prepare_gauges(&registry, &config.symbols(), &config.currency).unwrap(),
        );
        let total = Arc::new(PortfolioTotal::new());

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let handle = tokio::spawn(run(provider, config, gauges, total, shutdown_rx));

        drop(shutdown_tx);
        handle.await.unwrap();
    }
}
