//! Types for the allkeyshop price exporter

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Numeric allkeyshop product identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(pub u64);

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Platforms allkeyshop has product pages for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Platform {
    /// PC keys
    PC,
    /// PlayStation 5
    PS5,
    /// PlayStation 4
    PS4,
    /// Xbox One
    XB1,
    /// Xbox Series X|S
    XBSX,
    /// Nintendo Switch
    Switch,
}

impl Platform {
    /// Get the path segment allkeyshop uses for this platform in product URLs
    pub fn url_segment(&self) -> &'static str {
        match self {
            Platform::PC => "cd-key",
            Platform::PS5 => "ps5",
            Platform::PS4 => "ps4",
            Platform::XB1 => "xbox-one",
            Platform::XBSX => "xbox-series-x",
            Platform::Switch => "nintendo-switch",
        }
    }

    /// Get all supported platforms
    pub fn all() -> &'static [Platform] {
        &[
            Platform::PC,
            Platform::PS5,
            Platform::PS4,
            Platform::XB1,
            Platform::XBSX,
            Platform::Switch,
        ]
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.url_segment())
    }
}

/// Returned when a platform name is not recognised
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownPlatform(pub String);

impl FromStr for Platform {
    type Err = UnknownPlatform;

    /// Accepts the short tags (`pc`, `ps5`, ..., `switch`) as well as the
    /// upstream URL segments (`cd-key`, `xbox-one`, ...), case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase();
        match normalized.as_str() {
            "pc" => Ok(Platform::PC),
            "ps5" => Ok(Platform::PS5),
            "ps4" => Ok(Platform::PS4),
            "xb1" => Ok(Platform::XB1),
            "xbsx" => Ok(Platform::XBSX),
            "switch" => Ok(Platform::Switch),
            other => Platform::all()
                .iter()
                .copied()
                .find(|p| p.url_segment() == other)
                .ok_or_else(|| UnknownPlatform(s.to_string())),
        }
    }
}

/// How a configured product is identified upstream
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProductReference {
    /// Product id already known
    NumericId(ProductId),
    /// Product name that has to be resolved through its product page
    Named { name: String, platform: Platform },
}

/// Market parameters passed to the offers API
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketParams {
    /// Currency code, always lowercase (e.g. "eur")
    pub currency: String,
    /// Region filter (e.g. "eu"), empty for all regions
    pub region: String,
    /// Edition filter (e.g. "standard"), empty for all editions
    pub edition: String,
    /// Additional query terms sent as `moreq`
    pub extra: String,
}

impl MarketParams {
    /// Creates market parameters for a currency, normalizing it to lowercase
    pub fn new(currency: &str) -> Self {
        Self {
            currency: currency.trim().to_lowercase(),
            ..Self::default()
        }
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = region.into();
        self
    }

    pub fn with_edition(mut self, edition: impl Into<String>) -> Self {
        self.edition = edition.into();
        self
    }

    pub fn with_extra(mut self, extra: impl Into<String>) -> Self {
        self.extra = extra.into();
        self
    }
}

/// A resolved product, polled on every tick
///
/// Built once at startup and never modified afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductEntry {
    /// Resolved product id
    pub id: ProductId,
    /// Display name, used as the `product_name` label
    pub name: String,
    /// Market parameters for the offers API
    pub market: MarketParams,
    /// Only consider offers from this store (exact match)
    pub store_filter: Option<String>,
}

/// One vendor offer, kept as the raw JSON object returned upstream
///
/// Offers are not validated when fetched; accessors return `None` for
/// anything that does not have the expected shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Offer(pub serde_json::Value);

impl Offer {
    /// Stock status, e.g. "InStock"
    pub fn stock(&self) -> Option<&str> {
        self.0.get("stock").and_then(|v| v.as_str())
    }

    /// Store (allkeyshop calls it "platform") selling this offer
    pub fn store(&self) -> Option<&str> {
        self.0.get("platform").and_then(|v| v.as_str())
    }

    /// Price in the given currency, if the offer lists one
    pub fn price_in(&self, currency: &str) -> Option<f64> {
        let price = self.0.get("price")?.get(currency)?.get("price")?;
        match price {
            serde_json::Value::Number(n) => n.as_f64(),
            serde_json::Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        }
        .filter(|p| p.is_finite())
    }
}

/// Raw offers API response
#[derive(Debug, Clone, Deserialize)]
pub struct OffersResponse {
    pub success: serde_json::Value,
    pub offers: Vec<Offer>,
}

impl OffersResponse {
    /// Whether upstream flagged the request as successful
    pub fn is_success(&self) -> bool {
        match &self.success {
            serde_json::Value::Null => false,
            serde_json::Value::Bool(b) => *b,
            serde_json::Value::Number(n) => n.as_f64().is_some_and(|v| v != 0.0),
            serde_json::Value::String(s) => !s.is_empty(),
            serde_json::Value::Array(a) => !a.is_empty(),
            serde_json::Value::Object(o) => !o.is_empty(),
        }
    }
}

/// The winning offer of a selection
#[derive(Debug, Clone, PartialEq)]
pub struct SelectedOffer {
    pub price: f64,
    pub store: Option<String>,
}

/// A published best price
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BestPrice {
    /// Display name of the product
    pub product_name: String,

    /// Lowercase currency code
    pub currency: String,

    /// Lowest in-stock price
    pub price: f64,

    /// Store offering that price
    pub store: Option<String>,

    /// Last updated timestamp
    pub last_updated: DateTime<Utc>,
}

impl BestPrice {
    /// Create a best price stamped with the current time
    pub fn new(product_name: &str, currency: &str, selected: SelectedOffer) -> Self {
        Self {
            product_name: product_name.to_string(),
            currency: currency.to_string(),
            price: selected.price,
            store: selected.store,
            last_updated: Utc::now(),
        }
    }

    /// Check if the price data is stale (older than threshold seconds)
    pub fn is_stale(&self, threshold_seconds: u64) -> bool {
        let age = Utc::now().signed_duration_since(self.last_updated);
        age.num_seconds() > threshold_seconds as i64
    }

    /// Get the age of the price data
    pub fn age(&self) -> std::time::Duration {
        let duration = Utc::now().signed_duration_since(self.last_updated);
        std::time::Duration::from_secs(duration.num_seconds().max(0) as u64)
    }
}

/// Overall system health status
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum HealthStatus {
    /// Every product has a fresh price
    Healthy,
    /// Some products are stale or were never updated
    Degraded,
    /// No product has a price
    Unhealthy,
}

/// Component health information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentHealth {
    /// Component name
    pub name: String,
    /// Component status
    pub status: HealthStatus,
    /// Optional status message
    pub message: Option<String>,
    /// Component-specific details
    pub details: std::collections::HashMap<String, serde_json::Value>,
    /// Last checked timestamp
    pub last_checked: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn platform_parses_tags_and_segments() {
        assert_eq!("pc".parse::<Platform>(), Ok(Platform::PC));
        assert_eq!("PC".parse::<Platform>(), Ok(Platform::PC));
        assert_eq!("cd-key".parse::<Platform>(), Ok(Platform::PC));
        assert_eq!("Switch".parse::<Platform>(), Ok(Platform::Switch));
        assert_eq!("xbox-series-x".parse::<Platform>(), Ok(Platform::XBSX));
        assert_eq!(
            "dreamcast".parse::<Platform>(),
            Err(UnknownPlatform("dreamcast".to_string()))
        );
    }

    #[test]
    fn platform_segments() {
        assert_eq!(Platform::PC.url_segment(), "cd-key");
        assert_eq!(Platform::PS5.url_segment(), "ps5");
        assert_eq!(Platform::XB1.url_segment(), "xbox-one");
        assert_eq!(Platform::XBSX.url_segment(), "xbox-series-x");
        assert_eq!(Platform::Switch.url_segment(), "nintendo-switch");
    }

    #[test]
    fn market_params_lowercase_currency() {
        let market = MarketParams::new(" EUR ").with_region("eu");
        assert_eq!(market.currency, "eur");
        assert_eq!(market.region, "eu");
        assert_eq!(market.edition, "");
    }

    #[test]
    fn offer_accessors_tolerate_bad_shapes() {
        let offer = Offer(json!({
            "stock": "InStock",
            "platform": "Steam",
            "price": { "eur": { "price": 9.99 }, "usd": { "price": "10.50" }, "gbp": { "price": null } }
        }));
        assert_eq!(offer.stock(), Some("InStock"));
        assert_eq!(offer.store(), Some("Steam"));
        assert_eq!(offer.price_in("eur"), Some(9.99));
        assert_eq!(offer.price_in("usd"), Some(10.5));
        assert_eq!(offer.price_in("gbp"), None);
        assert_eq!(offer.price_in("chf"), None);

        let broken = Offer(json!({ "stock": 1, "price": [] }));
        assert_eq!(broken.stock(), None);
        assert_eq!(broken.store(), None);
        assert_eq!(broken.price_in("eur"), None);
    }

    #[test]
    fn success_flag_truthiness() {
        let parse = |v: serde_json::Value| -> bool {
            serde_json::from_value::<OffersResponse>(json!({ "success": v, "offers": [] }))
                .unwrap()
                .is_success()
        };
        assert!(parse(json!(true)));
        assert!(parse(json!(1)));
        assert!(!parse(json!(false)));
        assert!(!parse(json!(0)));
        assert!(!parse(json!("")));
        assert!(!parse(json!(null)));
    }

    #[test]
    fn best_price_freshness() {
        let mut price = BestPrice::new(
            "Elden Ring",
            "eur",
            SelectedOffer {
                price: 30.0,
                store: None,
            },
        );
        assert!(!price.is_stale(60));

        price.last_updated = Utc::now() - chrono::Duration::seconds(120);
        assert!(price.is_stale(60));
        assert!(price.age().as_secs() >= 120);
    }
}
