//! Startup composition of product entries

use crate::{
    config::ProductSpec,
    error::StartupError,
    provider::OfferProvider,
    types::{ProductEntry, ProductReference},
};

impl ProductEntry {
    /// Resolves a configured product into an entry, fetching its product page
    /// if only the name is known
    pub async fn resolve(
        spec: &ProductSpec,
        provider: &dyn OfferProvider,
    ) -> Result<Self, StartupError> {
        let id = match &spec.reference {
            ProductReference::NumericId(id) => *id,
            ProductReference::Named { name, platform } => provider
                .resolve_product(name, *platform)
                .await
                .map_err(|source| StartupError::Resolution {
                    section: spec.section.clone(),
                    source,
                })?,
        };

        Ok(Self {
            id,
            name: spec.name.clone(),
            market: spec.market.clone(),
            store_filter: spec.store_filter.clone(),
        })
    }
}

/// Resolves every configured product, one after another
///
/// Stops at the first product that cannot be resolved.
pub async fn resolve_entries(
    specs: &[ProductSpec],
    provider: &dyn OfferProvider,
) -> Result<Vec<ProductEntry>, StartupError> {
    let mut entries = Vec::with_capacity(specs.len());

    for spec in specs {
        let entry = ProductEntry::resolve(spec, provider).await?;
        tracing::info!(
            section = %spec.section,
            product = %entry.name,
            id = %entry.id,
            currency = %entry.market.currency,
            "Tracking product"
        );
        entries.push(entry);
    }

    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::mock::MockProvider;
    use crate::types::{MarketParams, Platform, ProductId};

    fn named(section: &str, platform: Platform) -> ProductSpec {
        ProductSpec {
            section: section.to_string(),
            reference: ProductReference::Named {
                name: section.to_string(),
                platform,
            },
            name: section.to_string(),
            market: MarketParams::new("eur"),
            store_filter: Some("Steam".to_string()),
        }
    }

    fn numeric(id: u64, name: &str) -> ProductSpec {
        ProductSpec {
            section: id.to_string(),
            reference: ProductReference::NumericId(ProductId(id)),
            name: name.to_string(),
            market: MarketParams::new("usd"),
            store_filter: None,
        }
    }

    #[tokio::test]
    async fn test_numeric_id_is_used_directly() {
        let provider = MockProvider::new();
        let entries = resolve_entries(&[numeric(99, "Hades")], &provider)
            .await
            .unwrap();

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].id, ProductId(99));
        assert_eq!(entries[0].name, "Hades");
        assert_eq!(provider.call_count(), 0);
    }

    #[tokio::test]
    async fn test_named_product_is_resolved() {
        let provider = MockProvider::new();
        provider.set_product("Elden Ring", Platform::PC, 4321);

        let entries = resolve_entries(&[named("Elden Ring", Platform::PC)], &provider)
            .await
            .unwrap();

        assert_eq!(entries[0].id, ProductId(4321));
        assert_eq!(entries[0].store_filter.as_deref(), Some("Steam"));
        assert_eq!(provider.call_count(), 1);
    }

    #[tokio::test]
    async fn test_resolution_failure_names_section() {
        let provider = MockProvider::new();
        provider.set_product("Elden Ring", Platform::PC, 4321);

        let specs = [
            named("Elden Ring", Platform::PC),
            named("Missing Game", Platform::PS4),
            numeric(1, "never reached"),
        ];
        let err = resolve_entries(&specs, &provider).await.unwrap_err();

        match err {
            StartupError::Resolution { section, .. } => assert_eq!(section, "Missing Game"),
            other => panic!("Expected Resolution error, got: {other:?}"),
        }
    }
}
