//! Best price tracker service
//!
//! Polls the offers of every product entry on a fixed interval and publishes
//! the selected best price to the store.

use crate::{
    config::ProductSpec,
    constants::{
        INITIAL_BACKOFF_MS, MAX_BACKOFF_MS, MAX_RETRY_ATTEMPTS, REFRESH_INTERVAL_SECS,
        STALE_THRESHOLD_SECS,
    },
    entry::resolve_entries,
    error::{FetchError, StartupError, UpdateError},
    metrics::{MetricsCollector, ProviderMetrics},
    provider::OfferProvider,
    selector::select_best,
    store::PriceStore,
    types::{BestPrice, ComponentHealth, HealthStatus, Offer, ProductEntry},
};
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tokio::time::sleep;

/// Polling behaviour of the tracker
#[derive(Debug, Clone)]
pub struct TrackerOptions {
    /// Time between the start of two ticks
    pub interval: Duration,
    /// Number of products fetched at the same time within a tick
    pub concurrency: usize,
    /// Attempts per product and tick for transient failures
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
    /// Age after which a published price counts as stale
    pub stale_threshold: Duration,
}

impl Default for TrackerOptions {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(REFRESH_INTERVAL_SECS),
            concurrency: 1,
            max_attempts: MAX_RETRY_ATTEMPTS,
            initial_backoff: Duration::from_millis(INITIAL_BACKOFF_MS),
            max_backoff: Duration::from_millis(MAX_BACKOFF_MS),
            stale_threshold: Duration::from_secs(STALE_THRESHOLD_SECS),
        }
    }
}

/// Outcome of one tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    pub updated: usize,
    pub failed: usize,
}

/// Best price tracker
///
/// Owns the resolved product entries and publishes into a shared store that
/// the scrape endpoint reads from.
pub struct PriceTracker {
    entries: Vec<ProductEntry>,
    provider: Arc<dyn OfferProvider>,
    store: Arc<PriceStore>,
    metrics: Arc<MetricsCollector>,
    options: TrackerOptions,
}

impl PriceTracker {
    /// Creates a tracker for already resolved entries
    pub fn new(
        entries: Vec<ProductEntry>,
        provider: Arc<dyn OfferProvider>,
        options: TrackerOptions,
    ) -> Self {
        let store = Arc::new(PriceStore::with_stale_threshold(
            options.stale_threshold.as_secs(),
        ));
        let metrics = Arc::new(MetricsCollector::new(provider.provider_name()));

        Self {
            entries,
            provider,
            store,
            metrics,
            options,
        }
    }

    /// Resolves configured products and creates a tracker for them
    ///
    /// Fails on the first product that cannot be resolved; the exporter must
    /// not start without it.
    pub async fn from_specs(
        specs: &[ProductSpec],
        provider: Arc<dyn OfferProvider>,
        options: TrackerOptions,
    ) -> Result<Self, StartupError> {
        let entries = resolve_entries(specs, provider.as_ref()).await?;
        Ok(Self::new(entries, provider, options))
    }

    /// Resolved product entries
    pub fn entries(&self) -> &[ProductEntry] {
        &self.entries
    }

    /// Store the best prices are published to
    pub fn store(&self) -> Arc<PriceStore> {
        self.store.clone()
    }

    /// Returns the name of the current provider
    pub fn provider_name(&self) -> &str {
        self.provider.provider_name()
    }

    /// Gets fetch metrics including latency percentiles and success rates
    pub async fn get_provider_metrics(&self) -> ProviderMetrics {
        self.metrics.get_metrics().await
    }

    /// Starts the background polling task
    ///
    /// The first tick runs immediately.
    pub fn start_background_task(self: &Arc<Self>) -> JoinHandle<()> {
        let tracker = self.clone();

        tokio::spawn(async move {
            tracing::info!(
                refresh_interval_secs = tracker.options.interval.as_secs(),
                products = tracker.entries.len(),
                "Starting best price tracker background task"
            );

            loop {
                let start = Instant::now();
                let report = tracker.tick().await;
                tracing::info!(
                    updated = report.updated,
                    failed = report.failed,
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    "Finished price update"
                );

                sleep(tracker.options.interval.saturating_sub(start.elapsed())).await;
            }
        })
    }

    /// Updates every entry once
    ///
    /// A failing product is logged and skipped; its previously published
    /// price is left untouched.
    pub async fn tick(&self) -> TickReport {
        let outcomes: Vec<bool> = stream::iter(0..self.entries.len())
            .map(|idx| self.update_and_log(idx))
            .buffer_unordered(self.options.concurrency.max(1))
            .collect()
            .await;

        let updated = outcomes.iter().filter(|ok| **ok).count();
        TickReport {
            updated,
            failed: outcomes.len() - updated,
        }
    }

    async fn update_and_log(&self, idx: usize) -> bool {
        let entry = &self.entries[idx];

        match self.update_entry(entry).await {
            Ok(price) => {
                tracing::debug!(
                    product = %entry.name,
                    currency = %entry.market.currency,
                    price = price.price,
                    store = price.store.as_deref().unwrap_or_default(),
                    "Best price updated"
                );
                true
            }
            Err(e) => {
                tracing::warn!(
                    product = %entry.name,
                    id = %entry.id,
                    currency = %entry.market.currency,
                    error = %e,
                    "Failed to update best price"
                );
                false
            }
        }
    }

    /// Fetches offers for one entry, selects the best one and publishes it
    pub async fn update_entry(&self, entry: &ProductEntry) -> Result<BestPrice, UpdateError> {
        let offers = self.fetch_with_retry(entry).await?;
        let selected = select_best(&offers, &entry.market.currency, entry.store_filter.as_deref())?;

        let price = BestPrice::new(&entry.name, &entry.market.currency, selected);
        self.store.set(price.clone()).await;

        Ok(price)
    }

    /// Fetches offers, retrying transient failures with exponential backoff
    async fn fetch_with_retry(&self, entry: &ProductEntry) -> Result<Vec<Offer>, FetchError> {
        let mut backoff = self.options.initial_backoff;
        let mut attempt = 1;

        loop {
            let start = Instant::now();
            match self.provider.fetch_offers(entry.id, &entry.market).await {
                Ok(offers) => {
                    self.metrics.record_request(start.elapsed(), true).await;
                    return Ok(offers);
                }
                Err(e) => {
                    self.metrics.record_request(start.elapsed(), false).await;

                    if !e.is_transient() || attempt >= self.options.max_attempts {
                        return Err(e);
                    }

                    tracing::warn!(
                        product = %entry.name,
                        attempt = attempt,
                        max_attempts = self.options.max_attempts,
                        error = %e,
                        "Failed to fetch offers, retrying"
                    );

                    sleep(backoff).await;
                    backoff = (backoff * 2).min(self.options.max_backoff);
                    attempt += 1;
                }
            }
        }
    }

    /// Perform a health check on the tracker
    ///
    /// # Returns
    /// ComponentHealth indicating whether every product has a fresh price
    pub async fn health_check(&self) -> ComponentHealth {
        let mut details = std::collections::HashMap::new();

        let mut outdated = Vec::new();
        for entry in &self.entries {
            if let Err(e) = self
                .store
                .get_price(&entry.name, &entry.market.currency)
                .await
            {
                outdated.push(e.to_string());
            }
        }

        let fresh = self.entries.len() - outdated.len();

        details.insert("products".to_string(), serde_json::json!(self.entries.len()));
        details.insert("fresh_prices".to_string(), serde_json::json!(fresh));
        details.insert("outdated".to_string(), serde_json::json!(outdated));
        details.insert(
            "provider_name".to_string(),
            serde_json::json!(self.provider_name()),
        );

        let status = if outdated.is_empty() {
            HealthStatus::Healthy
        } else if fresh > 0 {
            HealthStatus::Degraded
        } else {
            HealthStatus::Unhealthy
        };

        let message = match status {
            HealthStatus::Healthy => "All tracked products have a fresh price".to_string(),
            HealthStatus::Degraded => format!(
                "{} of {} products have no fresh price",
                outdated.len(),
                self.entries.len()
            ),
            HealthStatus::Unhealthy => "No tracked product has a fresh price".to_string(),
        };

        ComponentHealth {
            name: "best_price_tracker".to_string(),
            status,
            message: Some(message),
            details,
            last_checked: chrono::Utc::now(),
        }
    }
}
