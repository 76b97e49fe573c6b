//! In-memory store of published best prices
//!
//! This is the gauge sink: one slot per `(product_name, currency)` pair,
//! last write wins. Values are never removed, so a product whose fetch keeps
//! failing stays exposed with its last known price.

use crate::{constants::STALE_THRESHOLD_SECS, error::PriceError, types::BestPrice};
use std::collections::BTreeMap;
use tokio::sync::RwLock;

/// Label pair identifying a gauge series
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GaugeKey {
    pub product_name: String,
    pub currency: String,
}

impl GaugeKey {
    pub fn new(product_name: &str, currency: &str) -> Self {
        Self {
            product_name: product_name.to_string(),
            currency: currency.to_string(),
        }
    }
}

/// In-memory store for best prices
pub struct PriceStore {
    prices: RwLock<BTreeMap<GaugeKey, BestPrice>>,
    stale_threshold_secs: u64,
}

impl PriceStore {
    /// Creates a new price store
    pub fn new() -> Self {
        Self::with_stale_threshold(STALE_THRESHOLD_SECS)
    }

    /// Creates a price store with a custom staleness threshold
    pub fn with_stale_threshold(stale_threshold_secs: u64) -> Self {
        Self {
            prices: RwLock::new(BTreeMap::new()),
            stale_threshold_secs,
        }
    }

    /// Publishes a best price, replacing the previous value of its series
    pub async fn set(&self, price: BestPrice) {
        let key = GaugeKey::new(&price.product_name, &price.currency);
        tracing::debug!(
            product = %key.product_name,
            currency = %key.currency,
            price = price.price,
            "Updated best price"
        );
        self.prices.write().await.insert(key, price);
    }

    /// Gets the current price for a product
    ///
    /// # Returns
    /// The price data or an error if not available or stale
    pub async fn get_price(&self, product_name: &str, currency: &str) -> Result<BestPrice, PriceError> {
        let prices = self.prices.read().await;
        let price = prices
            .get(&GaugeKey::new(product_name, currency))
            .ok_or_else(|| PriceError::not_available(product_name))?;

        if price.is_stale(self.stale_threshold_secs) {
            return Err(PriceError::stale(product_name, price.age()));
        }

        Ok(price.clone())
    }

    /// Returns every published price, stale ones included, ordered by labels
    pub async fn snapshot(&self) -> Vec<BestPrice> {
        self.prices.read().await.values().cloned().collect()
    }
}

impl Default for PriceStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SelectedOffer;

    fn price(name: &str, currency: &str, value: f64) -> BestPrice {
        BestPrice::new(
            name,
            currency,
            SelectedOffer {
                price: value,
                store: None,
            },
        )
    }

    #[tokio::test]
    async fn test_last_write_wins() {
        let store = PriceStore::new();
        store.set(price("Hades", "eur", 20.0)).await;
        store.set(price("Hades", "eur", 18.5)).await;
        store.set(price("Hades", "usd", 21.0)).await;

        assert_eq!(store.get_price("Hades", "eur").await.unwrap().price, 18.5);
        assert_eq!(store.get_price("Hades", "usd").await.unwrap().price, 21.0);
        assert_eq!(store.snapshot().await.len(), 2);
    }

    #[tokio::test]
    async fn test_missing_price() {
        let store = PriceStore::new();
        let err = store.get_price("Hades", "eur").await.unwrap_err();
        assert!(matches!(err, PriceError::NotAvailable { .. }));
    }

    #[tokio::test]
    async fn test_stale_price_stays_in_snapshot() {
        let store = PriceStore::with_stale_threshold(60);
        let mut old = price("Hades", "eur", 20.0);
        old.last_updated = chrono::Utc::now() - chrono::Duration::seconds(600);
        store.set(old).await;

        assert!(matches!(
            store.get_price("Hades", "eur").await,
            Err(PriceError::Stale { .. })
        ));
        assert_eq!(store.snapshot().await.len(), 1);
    }
}
