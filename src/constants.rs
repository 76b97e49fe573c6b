//! Constants for the allkeyshop price exporter
//!
//! Upstream endpoints, timing defaults and metric names are centralized here.
//! The settings file only describes *which* products to track; everything
//! else defaults to these values and a few of them can be overridden on the
//! command line.

/// How often to fetch offers for every product (in seconds)
pub const REFRESH_INTERVAL_SECS: u64 = 60;

/// How long before a published price is reported as stale (in seconds)
pub const STALE_THRESHOLD_SECS: u64 = 300;

/// HTTP request timeout when talking to allkeyshop (in seconds)
pub const REQUEST_TIMEOUT_SECS: u64 = 10;

/// Maximum number of attempts for a single product fetch within a tick
pub const MAX_RETRY_ATTEMPTS: u32 = 3;

/// Initial backoff delay for retries (in milliseconds)
pub const INITIAL_BACKOFF_MS: u64 = 1000;

/// Maximum backoff delay for retries (in milliseconds)
pub const MAX_BACKOFF_MS: u64 = 30000;

/// allkeyshop base URL
pub const ALLKEYSHOP_BASE_URL: &str = "https://www.allkeyshop.com";

/// Offers API endpoint, relative to the base URL
pub const OFFERS_ENDPOINT: &str = "/blog/wp-admin/admin-ajax.php";

/// Ajax action used by the offers API
pub const OFFERS_ACTION: &str = "get_offers";

/// Stock value of an offer that can be bought right now
pub const IN_STOCK: &str = "InStock";

/// User agent for HTTP requests
pub const USER_AGENT: &str = concat!("allkeyshop-exporter/", env!("CARGO_PKG_VERSION"));

/// Default path of the settings file
pub const DEFAULT_CONFIG_PATH: &str = "settings.ini";

/// Default port of the scrape endpoint
pub const DEFAULT_PORT: u16 = 8090;

/// Default listen address of the scrape endpoint
pub const DEFAULT_ADDRESS: &str = "0.0.0.0";

/// Name of the best price gauge
pub const BEST_PRICE_METRIC: &str = "allkeyshop_best_price";

/// Prefix for the exporter's own request metrics
pub const FETCH_METRIC_PREFIX: &str = "allkeyshop_fetch";
