use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;

/// Prices keyed by base symbol, then by quote currency,
/// as the upstream returns them: `{ "BTC": { "USD": 50000.0 } }`.
pub type PriceTable = HashMap<String, HashMap<String, f64>>;

#[async_trait]
pub trait PriceProvider: Send + Sync {
    /// Fetches current prices for `symbols` quoted in `currency`
    /// in a single request.
    async fn fetch_prices(&self, symbols: &[String], currency: &str) -> Result<PriceTable>;
}
