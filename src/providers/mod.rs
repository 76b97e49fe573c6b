//! Offer provider implementations

pub mod allkeyshop;

pub use allkeyshop::{extract_product_id, AllKeyShopProvider};
