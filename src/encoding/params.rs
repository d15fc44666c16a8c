//! encoding::params
//!
//! Merging of client defaults, computed protocol fields and caller
//! options into one outgoing field set.
//!
//! # Precedence
//!
//! `caller > computed > defaults`: later tiers override earlier ones on
//! key collision, while a field keeps the position of its first
//! appearance. Encoded property blocks (the `propertyId[n]` /
//! `propertyValue[n]` pairs of one bag) are produced by a single tier
//! and merged as a block, so an id/value pair is never split across
//! tiers.

use super::FormFields;

/// Global defaults merged into every call unless overridden.
///
/// The browser binding's `_charset_` field names the response character
/// set; `succinct` requests the compact property representation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlobalDefaults {
    /// Response character set.
    pub charset: String,
    /// Request succinct properties.
    pub succinct: bool,
}

impl Default for GlobalDefaults {
    fn default() -> Self {
        Self {
            charset: "UTF-8".to_string(),
            succinct: true,
        }
    }
}

impl GlobalDefaults {
    /// Render the defaults as wire fields.
    pub fn to_fields(&self) -> FormFields {
        let mut fields = FormFields::new();
        fields.insert("_charset_", self.charset.clone());
        fields.insert("succinct", self.succinct.to_string());
        fields
    }
}

/// Merge three field tiers with `caller > computed > defaults`
/// precedence.
pub fn merge(defaults: FormFields, computed: FormFields, caller: FormFields) -> FormFields {
    let mut merged = defaults;
    merged.extend(computed);
    merged.extend(caller);
    merged
}
