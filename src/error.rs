//! Error types for the allkeyshop price exporter

use std::time::Duration;
use thiserror::Error;

/// Errors in the settings file, detected before anything is fetched
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The settings file could not be read or parsed
    #[error("Failed to load settings: {0}")]
    Load(#[from] ini::Error),

    /// A required key has no value in the section nor in the defaults
    #[error("{field} not set for section {section}")]
    MissingField { section: String, field: &'static str },

    /// The platform name is not one allkeyshop knows about
    #[error("Unknown platform {value:?} for section {section}")]
    UnknownPlatform { section: String, value: String },

    /// The HTTP client could not be built from the given options
    #[error("Failed to create HTTP client: {0}")]
    HttpClient(String),
}

impl ConfigError {
    /// Creates a MissingField error
    pub fn missing(section: &str, field: &'static str) -> Self {
        Self::MissingField {
            section: section.to_string(),
            field,
        }
    }
}

/// Errors that can occur when resolving a product name to its id
#[derive(Debug, Error)]
pub enum ResolutionError {
    /// The product page could not be fetched
    #[error("Failed to fetch product page {url}: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The product page answered with a non-success status
    #[error("Product page {url} returned HTTP {status}")]
    HttpStatus { url: String, status: u16 },

    /// No usable product id on the page
    #[error("Could not resolve product ID for product {product} on platform {platform}")]
    NotFound { product: String, platform: String },
}

impl ResolutionError {
    /// Creates a NotFound error
    pub fn not_found(product: &str, platform: &str) -> Self {
        Self::NotFound {
            product: product.to_string(),
            platform: platform.to_string(),
        }
    }
}

/// Errors that can occur when fetching offers from the API
#[derive(Debug, Error)]
pub enum FetchError {
    /// Network request failed
    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    /// Rate limit exceeded
    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    /// Non-success HTTP status
    #[error("HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    /// Response body was not the expected JSON
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// The API answered but flagged the request as unsuccessful
    #[error("Request rejected by upstream")]
    Rejected,
}

impl FetchError {
    /// Whether a later attempt within the same tick may succeed
    pub fn is_transient(&self) -> bool {
        match self {
            FetchError::NetworkError(_) | FetchError::RateLimitExceeded => true,
            FetchError::HttpStatus { status, .. } => *status >= 500,
            FetchError::InvalidResponse(_) | FetchError::Rejected => false,
        }
    }
}

/// No offer matched the stock, store and currency constraints
#[derive(Debug, Error, Clone, PartialEq)]
#[error("No in-stock offer in {currency}{}", store_suffix(.store))]
pub struct NoOfferError {
    pub currency: String,
    pub store: Option<String>,
}

fn store_suffix(store: &Option<String>) -> String {
    store
        .as_ref()
        .map(|s| format!(" from store {s}"))
        .unwrap_or_default()
}

/// Steady-state failure of one product update; never fatal
#[derive(Debug, Error)]
pub enum UpdateError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    NoOffer(#[from] NoOfferError),
}

/// Startup failure; the exporter must not start serving with it
#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Error resolving section {section}: {source}")]
    Resolution {
        section: String,
        #[source]
        source: ResolutionError,
    },
}

/// Errors that can occur when reading a published price
#[derive(Debug, Error, Clone)]
pub enum PriceError {
    /// No price has been published for the product yet
    #[error("Price data not available for {product}")]
    NotAvailable { product: String },

    /// Price data is too old (stale)
    #[error("Price data for {product} is stale (age: {age:?})")]
    Stale { product: String, age: Duration },
}

impl PriceError {
    /// Creates a NotAvailable error
    pub fn not_available(product: &str) -> Self {
        Self::NotAvailable {
            product: product.to_string(),
        }
    }

    /// Creates a Stale error
    pub fn stale(product: &str, age: Duration) -> Self {
        Self::Stale {
            product: product.to_string(),
            age,
        }
    }
}
