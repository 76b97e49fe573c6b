//! URL slugs for allkeyshop product pages

use regex::Regex;
use std::sync::LazyLock;

static DISALLOWED: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^\w\s-]").expect("valid regex"));
static SEPARATORS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[\s_-]+").expect("valid regex"));

/// Turns a human readable product name into the slug used in product URLs
///
/// `"Elden Ring: Shadow of the Erdtree"` becomes
/// `"elden-ring-shadow-of-the-erdtree"`. Applying it to its own output is a
/// no-op.
pub fn slugify(input: &str) -> String {
    let lowered = input.to_lowercase();
    let stripped = DISALLOWED.replace_all(lowered.trim(), "");
    let joined = SEPARATORS.replace_all(&stripped, "-");
    joined.trim_matches('-').to_string()
}
