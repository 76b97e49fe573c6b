//! allkeyshop.com offer provider implementation

use crate::{
    constants::{
        ALLKEYSHOP_BASE_URL, OFFERS_ACTION, OFFERS_ENDPOINT, REQUEST_TIMEOUT_SECS, USER_AGENT,
    },
    error::{FetchError, ResolutionError},
    provider::OfferProvider,
    slug::slugify,
    types::{MarketParams, Offer, OffersResponse, Platform, ProductId},
};
use async_trait::async_trait;
use reqwest::Client;
use scraper::{Html, Selector};
use std::sync::LazyLock;
use std::time::Duration;

static PRODUCT_ID_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("[data-product-id]").expect("valid selector"));

/// Extracts the product id from a product page
///
/// Elements are visited in document order (outer elements before the ones
/// they contain). Values that are not a positive integer are skipped and the
/// first valid one wins.
pub fn extract_product_id(html: &str) -> Option<ProductId> {
    let document = Html::parse_document(html);

    document
        .select(&PRODUCT_ID_SELECTOR)
        .filter_map(|element| element.value().attr("data-product-id"))
        .filter_map(|value| value.trim().parse::<u64>().ok())
        .find(|id| *id > 0)
        .map(ProductId)
}

/// allkeyshop offer provider
pub struct AllKeyShopProvider {
    client: Client,
    base_url: String,
}

impl AllKeyShopProvider {
    /// Creates a new allkeyshop provider
    pub fn new() -> Result<Self, FetchError> {
        Self::with_options(ALLKEYSHOP_BASE_URL, Duration::from_secs(REQUEST_TIMEOUT_SECS))
    }

    /// Creates a provider against another base URL with a custom request timeout
    pub fn with_options(base_url: &str, timeout: Duration) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(FetchError::NetworkError)?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Builds the product page URL for a product name and platform
    pub fn product_page_url(&self, name: &str, platform: Platform) -> String {
        format!(
            "{}/blog/buy-{}-{}-compare-prices/",
            self.base_url,
            slugify(name),
            platform.url_segment()
        )
    }

    /// Builds the offers API URL for a product
    fn offers_url(&self) -> String {
        format!("{}{}", self.base_url, OFFERS_ENDPOINT)
    }

    /// Parses an offers API body
    fn parse_offers(body: &str) -> Result<Vec<Offer>, FetchError> {
        let response: OffersResponse = serde_json::from_str(body).map_err(|e| {
            FetchError::InvalidResponse(format!(
                "Failed to parse offers response: {}. Response: {}",
                e,
                truncate(body, 200)
            ))
        })?;

        if !response.is_success() {
            return Err(FetchError::Rejected);
        }

        Ok(response.offers)
    }
}

fn truncate(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

#[async_trait]
impl OfferProvider for AllKeyShopProvider {
    async fn resolve_product(
        &self,
        name: &str,
        platform: Platform,
    ) -> Result<ProductId, ResolutionError> {
        let url = self.product_page_url(name, platform);
        tracing::debug!(url = %url, "Fetching product page");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|source| ResolutionError::Network {
                url: url.clone(),
                source,
            })?;

        if !response.status().is_success() {
            return Err(ResolutionError::HttpStatus {
                url,
                status: response.status().as_u16(),
            });
        }

        let html = response
            .text()
            .await
            .map_err(|source| ResolutionError::Network {
                url: url.clone(),
                source,
            })?;

        let id = extract_product_id(&html)
            .ok_or_else(|| ResolutionError::not_found(name, platform.url_segment()))?;

        tracing::debug!(product = name, platform = %platform, id = %id, "Resolved product");

        Ok(id)
    }

    async fn fetch_offers(
        &self,
        id: ProductId,
        market: &MarketParams,
    ) -> Result<Vec<Offer>, FetchError> {
        let product = id.to_string();
        let query = [
            ("action", OFFERS_ACTION),
            ("product", product.as_str()),
            ("currency", market.currency.as_str()),
            ("region", market.region.as_str()),
            ("edition", market.edition.as_str()),
            ("moreq", market.extra.as_str()),
            ("use_beta_offers_display", "1"),
        ];

        tracing::debug!(product = %id, currency = %market.currency, "Fetching offers");

        let response = self
            .client
            .get(self.offers_url())
            .query(&query)
            .send()
            .await
            .map_err(FetchError::NetworkError)?;

        // Check for rate limiting
        if response.status().as_u16() == 429 {
            return Err(FetchError::RateLimitExceeded);
        }

        if !response.status().is_success() {
            return Err(FetchError::HttpStatus {
                status: response.status().as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }

        let body = response.text().await.map_err(FetchError::NetworkError)?;
        let offers = Self::parse_offers(&body)?;

        tracing::debug!(product = %id, count = offers.len(), "Fetched offers");

        Ok(offers)
    }

    fn provider_name(&self) -> &'static str {
        "allkeyshop"
    }
}
