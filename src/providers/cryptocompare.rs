use anyhow::{Result, anyhow};
use async_trait::async_trait;
use tracing::{debug, instrument};

use crate::price_provider::{PriceProvider, PriceTable};

// CryptoCompareProvider implementation for PriceProvider
pub struct CryptoCompareProvider {
    base_url: String,
}

impl CryptoCompareProvider {
    pub fn new(base_url: &str) -> Self {
        CryptoCompareProvider {
            base_url: base_url.to_string(),
        }
    }
}

#[async_trait]
impl PriceProvider for CryptoCompareProvider {
    #[instrument(
        name = "CryptoComparePriceFetch",
        skip(self, symbols),
        fields(currency = %currency)
    )]
    async fn fetch_prices(&self, symbols: &[String], currency: &str) -> Result<PriceTable> {
        let url = format!("{}/data/pricemulti", self.base_url);
        let fsyms = symbols.join(",");
        debug!("Requesting price data from {} for {}", url, fsyms);

        let client = reqwest::Client::builder()
            .user_agent("coinfolio/0.1")
            .build()?;
        let response = client
            .get(&url)
            .query(&[("fsyms", fsyms.as_str()), ("tsyms", currency)])
            .send()
            .await
            .map_err(|e| anyhow!("Request error: {} for URL: {}", e, url))?;

        let status = response.status();
        if status.as_u16() >= 300 {
            return Err(anyhow!("Bad status: {} from {}", status, url));
        }

        let text = response.text().await?;
        let table: PriceTable = serde_json::from_str(&text)
            .map_err(|e| anyhow!("Failed to parse price response: {}", e))?;

        debug!(symbols = table.len(), "Received price table");
        Ok(table)
    }
}
