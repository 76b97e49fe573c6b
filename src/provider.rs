//! Provider abstraction for resolving products and fetching their offers

use crate::{
    error::{FetchError, ResolutionError},
    types::{MarketParams, Offer, Platform, ProductId},
};
use async_trait::async_trait;

/// Trait for offer providers
///
/// The exporter talks to allkeyshop through this trait so the polling loop
/// and startup composition can be exercised without the network.
#[async_trait]
pub trait OfferProvider: Send + Sync {
    /// Resolves a product name on a platform to its numeric id
    ///
    /// # Arguments
    /// * `name` - Human readable product name
    /// * `platform` - Platform the product page belongs to
    ///
    /// # Returns
    /// The product id embedded in the product page
    async fn resolve_product(
        &self,
        name: &str,
        platform: Platform,
    ) -> Result<ProductId, ResolutionError>;

    /// Fetches all current offers for a product
    ///
    /// # Arguments
    /// * `id` - Product id
    /// * `market` - Currency, region, edition and extra query terms
    ///
    /// # Returns
    /// The offers in upstream order, unvalidated
    async fn fetch_offers(
        &self,
        id: ProductId,
        market: &MarketParams,
    ) -> Result<Vec<Offer>, FetchError>;

    /// Returns the name of this provider
    fn provider_name(&self) -> &'static str;
}
