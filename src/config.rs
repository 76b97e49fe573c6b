//! Settings file loading
//!
//! The settings file is INI with one section per tracked product. The section
//! header is either a numeric allkeyshop product id or a product name that is
//! resolved through its product page at startup:
//!
//! ```ini
//! [DEFAULT]
//! Currency = eur
//! Platform = pc
//!
//! [Elden Ring]
//! Store = Steam
//!
//! [12345]
//! Name = Cyberpunk 2077
//! Currency = usd
//! Region = us
//! ```
//!
//! Every key is looked up in the product section first, then in the
//! `DEFAULT` section (or keys outside any section), then falls back to a
//! built-in default. Keys ignore case; section headers are kept as written
//! since they become product names.

use crate::{
    error::ConfigError,
    types::{MarketParams, Platform, ProductId, ProductReference},
};
use ini::{Ini, Properties};
use std::collections::HashMap;
use std::path::Path;

/// Name of the section holding defaults
const DEFAULT_SECTION: &str = "default";

/// Key/value pairs of one section, keys lowercased
type Table = HashMap<String, String>;

/// One tracked product, as described by the settings file
#[derive(Debug, Clone, PartialEq)]
pub struct ProductSpec {
    /// Section header, used in error messages
    pub section: String,
    /// Id or name/platform pair to resolve
    pub reference: ProductReference,
    /// Display name for the `product_name` label
    pub name: String,
    /// Market parameters for the offers API
    pub market: MarketParams,
    /// Exact store name filter
    pub store_filter: Option<String>,
}

/// Parsed settings file
#[derive(Debug, Clone, Default)]
pub struct Settings {
    /// Products in file order
    pub products: Vec<ProductSpec>,
}

impl Settings {
    /// Loads settings from an INI file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let ini = Ini::load_from_file(path)?;
        Self::from_ini(&ini)
    }

    /// Parses settings from INI text
    pub fn from_ini_str(text: &str) -> Result<Self, ConfigError> {
        let ini = Ini::load_from_str(text).map_err(ini::Error::Parse)?;
        Self::from_ini(&ini)
    }

    fn from_ini(ini: &Ini) -> Result<Self, ConfigError> {
        let mut defaults = Table::new();
        let mut sections = Vec::new();

        for (name, properties) in ini.iter() {
            let table = into_table(properties);
            match name {
                // Keys outside of any section act as defaults too
                None => {
                    for (key, value) in table {
                        defaults.entry(key).or_insert(value);
                    }
                }
                Some(name) if name.eq_ignore_ascii_case(DEFAULT_SECTION) => defaults.extend(table),
                Some(name) => sections.push((name.to_string(), table)),
            }
        }

        let products = sections
            .iter()
            .map(|(section, table)| product_spec(section, table, &defaults))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { products })
    }
}

fn into_table(properties: &Properties) -> Table {
    properties
        .iter()
        .map(|(key, value)| (key.to_lowercase(), value.to_string()))
        .collect()
}

/// Section value if the key is present, else the default section's value
fn lookup<'a>(section: &'a Table, defaults: &'a Table, key: &str) -> Option<&'a str> {
    section
        .get(key)
        .or_else(|| defaults.get(key))
        .map(|v| v.trim())
}

/// Like `lookup`, falling back to an empty string
fn lookup_or_empty(section: &Table, defaults: &Table, key: &str) -> String {
    lookup(section, defaults, key).unwrap_or_default().to_string()
}

/// Like `lookup`, treating missing and empty values as an error
fn require<'a>(
    section_name: &str,
    section: &'a Table,
    defaults: &'a Table,
    key: &str,
    field: &'static str,
) -> Result<&'a str, ConfigError> {
    lookup(section, defaults, key)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ConfigError::missing(section_name, field))
}

fn product_spec(
    section_name: &str,
    section: &Table,
    defaults: &Table,
) -> Result<ProductSpec, ConfigError> {
    let currency = require(section_name, section, defaults, "currency", "Currency")?;

    let market = MarketParams::new(currency)
        .with_region(lookup_or_empty(section, defaults, "region"))
        .with_edition(lookup_or_empty(section, defaults, "edition"))
        .with_extra(lookup_or_empty(section, defaults, "extra"));

    let store_filter = lookup(section, defaults, "store")
        .filter(|s| !s.is_empty())
        .map(str::to_string);

    let (reference, name) = match section_name.trim().parse::<u64>() {
        Ok(id) => {
            let name = lookup(section, defaults, "name")
                .filter(|n| !n.is_empty())
                .unwrap_or(section_name)
                .to_string();
            (ProductReference::NumericId(ProductId(id)), name)
        }
        Err(_) => {
            let value = require(section_name, section, defaults, "platform", "Platform")?;
            let platform = value
                .parse::<Platform>()
                .map_err(|_| ConfigError::UnknownPlatform {
                    section: section_name.to_string(),
                    value: value.to_string(),
                })?;
            let reference = ProductReference::Named {
                name: section_name.to_string(),
                platform,
            };
            (reference, section_name.to_string())
        }
    };

    Ok(ProductSpec {
        section: section_name.to_string(),
        reference,
        name,
        market,
        store_filter,
    })
}
