//! Best offer selection

use crate::{
    constants::IN_STOCK,
    error::NoOfferError,
    types::{Offer, SelectedOffer},
};

/// Picks the lowest in-stock price from a list of offers
///
/// Offers are kept when their stock is `"InStock"` and, if `store_filter` is
/// set, their store matches it exactly. Offers without a price in `currency`
/// are not comparable and are skipped. On equal prices the earliest offer
/// wins.
///
/// # Arguments
/// * `offers` - Offers in upstream order
/// * `currency` - Lowercase currency code to compare prices in
/// * `store_filter` - Optional exact store name
///
/// # Returns
/// The winning price and store, or `NoOfferError` if nothing qualifies
pub fn select_best(
    offers: &[Offer],
    currency: &str,
    store_filter: Option<&str>,
) -> Result<SelectedOffer, NoOfferError> {
    let mut best: Option<(f64, &Offer)> = None;

    let candidates = offers
        .iter()
        .filter(|offer| offer.stock() == Some(IN_STOCK))
        .filter(|offer| store_filter.is_none_or(|store| offer.store() == Some(store)));

    for offer in candidates {
        let Some(price) = offer.price_in(currency) else {
            continue;
        };
        if best.is_none_or(|(lowest, _)| price < lowest) {
            best = Some((price, offer));
        }
    }

    best.map(|(price, offer)| SelectedOffer {
        price,
        store: offer.store().map(str::to_string),
    })
    .ok_or_else(|| NoOfferError {
        currency: currency.to_string(),
        store: store_filter.map(str::to_string),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn offer(stock: &str, store: &str, currency: &str, price: f64) -> Offer {
        let mut prices = serde_json::Map::new();
        prices.insert(currency.to_string(), json!({ "price": price }));
        Offer(json!({
            "stock": stock,
            "platform": store,
            "price": prices
        }))
    }

    #[test]
    fn test_empty_offers() {
        let err = select_best(&[], "eur", None).unwrap_err();
        assert_eq!(err.currency, "eur");
        assert_eq!(err.store, None);
    }

    #[test]
    fn test_out_of_stock_is_skipped() {
        let offers = vec![
            offer("OutOfStock", "A", "eur", 5.0),
            offer("InStock", "B", "eur", 9.0),
        ];
        let best = select_best(&offers, "eur", None).unwrap();
        assert_eq!(best.price, 9.0);
        assert_eq!(best.store.as_deref(), Some("B"));
    }

    #[test]
    fn test_store_filter() {
        let offers = vec![
            offer("InStock", "A", "eur", 10.0),
            offer("InStock", "B", "eur", 5.0),
        ];
        assert_eq!(select_best(&offers, "eur", Some("A")).unwrap().price, 10.0);
        assert_eq!(select_best(&offers, "eur", None).unwrap().price, 5.0);
    }

    #[test]
    fn test_store_filter_is_case_sensitive() {
        let offers = vec![offer("InStock", "Steam", "eur", 10.0)];
        let err = select_best(&offers, "eur", Some("steam")).unwrap_err();
        assert_eq!(err.store.as_deref(), Some("steam"));
    }

    #[test]
    fn test_minimum_price() {
        let offers = vec![
            offer("InStock", "A", "eur", 12.5),
            offer("InStock", "B", "eur", 9.99),
            offer("InStock", "C", "eur", 20.0),
        ];
        assert_eq!(select_best(&offers, "eur", None).unwrap().price, 9.99);
    }

    #[test]
    fn test_ties_keep_first_offer() {
        let offers = vec![
            offer("InStock", "First", "eur", 7.0),
            offer("InStock", "Second", "eur", 7.0),
        ];
        let best = select_best(&offers, "eur", None).unwrap();
        assert_eq!(best.store.as_deref(), Some("First"));
    }

    #[test]
    fn test_offers_without_currency_are_not_comparable() {
        let offers = vec![
            offer("InStock", "A", "usd", 1.0),
            offer("InStock", "B", "eur", 15.0),
            Offer(json!({ "stock": "InStock", "platform": "C" })),
        ];
        assert_eq!(select_best(&offers, "eur", None).unwrap().price, 15.0);

        let only_usd = vec![offer("InStock", "A", "usd", 1.0)];
        assert!(select_best(&only_usd, "eur", None).is_err());
    }
}
