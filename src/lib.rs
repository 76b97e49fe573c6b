//! # allkeyshop best price exporter
//!
//! Periodically fetches the vendor offers allkeyshop.com lists for a set of
//! games and exposes the lowest in-stock price of each as a Prometheus gauge.
//!
//! ## Pipeline
//!
//! ```text
//! settings.ini ──► ProductSpec ──► ProductEntry        (once, at startup)
//!                        │ name + platform
//!                        ▼
//!                 product page ──► data-product-id
//!
//! every tick, per entry:
//!   offers API ──► Vec<Offer> ──► select_best ──► PriceStore ──► /metrics
//! ```
//!
//! ## Usage
//!
//! ```no_run
//! use allkeyshop_exporter::{
//!     providers::AllKeyShopProvider, tracker::TrackerOptions, PriceTracker, Settings,
//! };
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let settings = Settings::load("settings.ini".as_ref())?;
//! let provider = Arc::new(AllKeyShopProvider::new()?);
//! let tracker = PriceTracker::from_specs(&settings.products, provider, TrackerOptions::default()).await?;
//!
//! let report = tracker.tick().await;
//! println!("updated {} products", report.updated);
//! # Ok(())
//! # }
//! ```
//!
//! ## Error Handling
//!
//! Configuration and resolution problems surface as [`StartupError`] and
//! stop the exporter before it serves anything. Failures while polling are
//! [`UpdateError`]s; the tracker logs them and keeps the last published
//! price of the product.

pub mod config;
pub mod constants;
pub mod entry;
pub mod error;
pub mod metrics;
pub mod provider;
pub mod providers;
pub mod selector;
pub mod server;
pub mod slug;
pub mod store;
pub mod telemetry;
pub mod tracker;
pub mod types;

// Re-export commonly used types
pub use crate::config::{ProductSpec, Settings};
pub use error::{
    ConfigError, FetchError, NoOfferError, PriceError, ResolutionError, StartupError, UpdateError,
};
pub use metrics::ProviderMetrics;
pub use provider::OfferProvider;
pub use selector::select_best;
pub use slug::slugify;
pub use tracker::PriceTracker;
pub use types::{
    BestPrice, MarketParams, Offer, Platform, ProductEntry, ProductId, ProductReference,
};
