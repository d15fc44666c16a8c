//! encoding
//!
//! The two wire encodings of the browser binding.
//!
//! # Design
//!
//! Both encoders produce a [`FormFields`] value: a flat, ordered list of
//! string key/value pairs ready to become one multipart form field each.
//! They are pure functions over ordering-preserving inputs; given the
//! same bag they always produce the same fields in the same order.
//!
//! - [`encode_property_pairs`] ties each property name to its value via
//!   a shared index: `propertyId[n]` / `propertyValue[n]` (scalar) or
//!   `propertyValue[n][m]` (multi-valued). Write calls carry their
//!   property payload this way.
//! - [`encode_indexed`] flattens a list of records into `field[i]` /
//!   `field[i][j]` keys. ACL entry lists and copy-source field specs
//!   use this form.
//!
//! An empty multi-valued property serializes as the `propertyId[n]`
//! entry alone; the repository interprets the missing value entries as
//! "clear the property".
//!
//! # Example
//!
//! ```
//! use cmis_browser::core::properties::{PropertyBag, PropertyValue, Scalar};
//! use cmis_browser::encoding::encode_property_pairs;
//!
//! let mut bag = PropertyBag::new();
//! bag.insert("cmis:name", PropertyValue::single(Scalar::str("a.txt")));
//!
//! let fields = encode_property_pairs(&bag);
//! assert_eq!(fields.get("propertyId[0]"), Some("cmis:name"));
//! assert_eq!(fields.get("propertyValue[0]"), Some("a.txt"));
//! ```

pub mod params;

use crate::core::properties::{PropertyBag, PropertyValue};

/// An ordered, flat set of form fields.
///
/// Insertion order is preserved; re-inserting an existing key replaces
/// the value in place. This makes the parameter merger's precedence rule
/// a plain fold over tiers.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FormFields {
    entries: Vec<(String, String)>,
}

impl FormFields {
    /// Create an empty field set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a field, preserving its original position on
    /// replacement.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        if let Some(entry) = self.entries.iter_mut().find(|(k, _)| *k == key) {
            entry.1 = value;
        } else {
            self.entries.push((key, value));
        }
    }

    /// Insert every field of `other`, applying the same replace-in-place
    /// rule per key.
    pub fn extend(&mut self, other: FormFields) {
        for (key, value) in other.entries {
            self.insert(key, value);
        }
    }

    /// Look up a field value by exact key.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate fields in order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Consume into the underlying ordered pairs.
    pub fn into_pairs(self) -> Vec<(String, String)> {
        self.entries
    }
}

impl FromIterator<(String, String)> for FormFields {
    fn from_iter<T: IntoIterator<Item = (String, String)>>(iter: T) -> Self {
        let mut fields = FormFields::new();
        for (key, value) in iter {
            fields.insert(key, value);
        }
        fields
    }
}

/// Encode a property bag as alternating `propertyId[n]` /
/// `propertyValue[n]` fields.
///
/// The index `n` follows the bag's iteration order and ties each id to
/// its value; ids and values are never reordered independently. A
/// multi-valued property emits one `propertyValue[n][m]` field per
/// element, in element order; an empty multi emits only the id field.
pub fn encode_property_pairs(bag: &PropertyBag) -> FormFields {
    let mut fields = FormFields::new();
    for (n, (name, value)) in bag.iter().enumerate() {
        fields.insert(format!("propertyId[{}]", n), name);
        match value {
            PropertyValue::Single(scalar) => {
                fields.insert(format!("propertyValue[{}]", n), scalar.to_wire());
            }
            PropertyValue::Multi(scalars) => {
                for (m, scalar) in scalars.iter().enumerate() {
                    fields.insert(format!("propertyValue[{}][{}]", n, m), scalar.to_wire());
                }
            }
        }
    }
    fields
}

/// Encode an ordered list of records as `field[i]` / `field[i][j]`
/// fields.
///
/// Record order in the input list becomes index `i`; array element
/// order becomes index `j`.
pub fn encode_indexed(records: &[PropertyBag]) -> FormFields {
    let mut fields = FormFields::new();
    for (i, record) in records.iter().enumerate() {
        for (field, value) in record.iter() {
            match value {
                PropertyValue::Single(scalar) => {
                    fields.insert(format!("{}[{}]", field, i), scalar.to_wire());
                }
                PropertyValue::Multi(scalars) => {
                    for (j, scalar) in scalars.iter().enumerate() {
                        fields.insert(format!("{}[{}][{}]", field, i, j), scalar.to_wire());
                    }
                }
            }
        }
    }
    fields
}

/// Decode `propertyId[n]` / `propertyValue[n]` fields back into a bag.
///
/// The inverse of [`encode_property_pairs`] for string-valued bags;
/// scalars come back in their wire form. Used by the in-memory mock
/// repository and by round-trip tests. Indexes are walked from zero
/// until the first missing `propertyId[n]`.
pub fn decode_property_pairs(fields: &FormFields) -> PropertyBag {
    use crate::core::properties::Scalar;

    let mut bag = PropertyBag::new();
    for n in 0.. {
        let Some(name) = fields.get(&format!("propertyId[{}]", n)) else {
            break;
        };
        if let Some(value) = fields.get(&format!("propertyValue[{}]", n)) {
            bag.insert(name, PropertyValue::Single(Scalar::str(value)));
            continue;
        }
        let mut elements = Vec::new();
        for m in 0.. {
            match fields.get(&format!("propertyValue[{}][{}]", n, m)) {
                Some(value) => elements.push(Scalar::str(value)),
                None => break,
            }
        }
        bag.insert(name, PropertyValue::Multi(elements));
    }
    bag
}
