use anyhow::{Context, Result};
use prometheus::{Gauge, Opts, Registry};
use std::collections::HashMap;

/// One gauge per configured coin, keyed by lowercased symbol.
pub type GaugeSet = HashMap<String, Gauge>;

const NAMESPACE: &str = "portfolio_metrics";

/// Creates and registers a value gauge for every configured symbol.
///
/// The metric name is `portfolio_metrics_<symbol>_<currency>` (all
/// lowercase). Registration happens exactly once at startup; a duplicate
/// symbol in the configuration collides in the registry and fails here
/// rather than silently overwriting.
pub fn prepare_gauges(registry: &Registry, symbols: &[String], currency: &str) -> Result<GaugeSet> {
    let mut gauges = GaugeSet::new();
    for coin in symbols {
        let symbol = coin.to_lowercase();
        let opts = Opts::new(
            currency.to_lowercase(),
            format!("Value of the held {coin} in {currency}"),
        )
        .namespace(NAMESPACE)
        .subsystem(symbol.clone());
        let gauge =
            Gauge::with_opts(opts).with_context(|| format!("Invalid gauge opts for {coin}"))?;
        registry
            .register(Box::new(gauge.clone()))
            .with_context(|| format!("Failed to register gauge for {coin}"))?;
        gauges.insert(symbol, gauge);
    }
    Ok(gauges)
}
