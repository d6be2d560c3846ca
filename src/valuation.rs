use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, info, warn};

use crate::config::AppConfig;
use crate::metrics::GaugeSet;
use crate::price_provider::PriceProvider;

/// Latest portfolio total, written by the update cycle and read
/// concurrently by the query surface.
///
/// Single writer, so `Relaxed` loads and stores of the f64 bit pattern
/// are enough; readers always observe a complete value.
pub struct PortfolioTotal(AtomicU64);

impl PortfolioTotal {
    pub fn new() -> Self {
        PortfolioTotal(AtomicU64::new(0.0f64.to_bits()))
    }

    pub fn store(&self, value: f64) {
        self.0.store(value.to_bits(), Ordering::Relaxed);
    }

    pub fn load(&self) -> f64 {
        f64::from_bits(self.0.load(Ordering::Relaxed))
    }
}

impl Default for PortfolioTotal {
    fn default() -> Self {
        Self::new()
    }
}

/// Runs one valuation cycle: fetch prices, publish per-coin gauges and
/// the aggregate total.
///
/// A failed fetch logs and returns without touching any gauge or the
/// total, so readers keep seeing the previous successful cycle. Each
/// gauge is set to that coin's own value (`price * amount`), and the
/// total is replaced with a single atomic store after the full pass.
pub async fn update_portfolio(
    provider: &dyn PriceProvider,
    config: &AppConfig,
    gauges: &GaugeSet,
    total: &PortfolioTotal,
) {
    info!("Updating portfolio...");
    let symbols = config.symbols();
    let prices = match provider.fetch_prices(&symbols, &config.currency).await {
        Ok(prices) => prices,
        Err(e) => {
            warn!(error = %e, "Price fetch failed, keeping previous values");
            return;
        }
    };

    let mut running_total = 0.0;
    for (base, quotes) in &prices {
        for (quote, price) in quotes {
            if !quote.eq_ignore_ascii_case(&config.currency) {
                continue;
            }
            let contribution = price * config.amount_for(base);
            match gauges.get(&base.to_lowercase()) {
                Some(gauge) => gauge.set(contribution),
                // Upstream returned a symbol we never asked for.
                None => warn!(symbol = %base, "No gauge for unrequested symbol"),
            }
            running_total += contribution;
        }
    }

    total.store(running_total);
    debug!(total = running_total, "Portfolio updated");
}
