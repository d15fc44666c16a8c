//! core::properties
//!
//! Semantically-typed property values and ordered property bags.
//!
//! # Design
//!
//! Property cardinality is decided once, at the boundary where a value
//! enters the bag: a property is either [`Single`] scalar or [`Multi`]
//! ordered scalars. Downstream code (the serializer, the merger) matches
//! on the variant instead of re-inspecting value shapes at each call
//! site.
//!
//! [`PropertyBag`] preserves insertion order. The wire encodings index
//! properties by position, so iteration order is part of the contract,
//! not an implementation detail.
//!
//! # Example
//!
//! ```
//! use cmis_browser::core::properties::{PropertyBag, PropertyValue, Scalar};
//!
//! let mut bag = PropertyBag::new();
//! bag.insert("cmis:name", PropertyValue::single(Scalar::str("a.txt")));
//! bag.insert(
//!     "keywords",
//!     PropertyValue::multi(vec![Scalar::str("alpha"), Scalar::str("beta")]),
//! );
//!
//! assert_eq!(bag.len(), 2);
//! assert_eq!(bag.get("cmis:name").unwrap().as_str(), Some("a.txt"));
//! ```

use chrono::{DateTime, Utc};

/// A single scalar property value.
///
/// Datetimes travel on the wire as integer milliseconds since the Unix
/// epoch, per the browser binding.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    /// String value.
    Str(String),
    /// Integer value.
    Int(i64),
    /// Decimal value.
    Dec(f64),
    /// Boolean value.
    Bool(bool),
    /// Datetime value.
    DateTime(DateTime<Utc>),
}

impl Scalar {
    /// Shorthand for a string scalar.
    pub fn str(value: impl Into<String>) -> Self {
        Scalar::Str(value.into())
    }

    /// Render the scalar in its wire form.
    pub fn to_wire(&self) -> String {
        match self {
            Scalar::Str(s) => s.clone(),
            Scalar::Int(i) => i.to_string(),
            Scalar::Dec(d) => d.to_string(),
            Scalar::Bool(b) => b.to_string(),
            Scalar::DateTime(dt) => dt.timestamp_millis().to_string(),
        }
    }
}

impl std::fmt::Display for Scalar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_wire())
    }
}

impl From<&str> for Scalar {
    fn from(value: &str) -> Self {
        Scalar::Str(value.to_string())
    }
}

impl From<String> for Scalar {
    fn from(value: String) -> Self {
        Scalar::Str(value)
    }
}

impl From<i64> for Scalar {
    fn from(value: i64) -> Self {
        Scalar::Int(value)
    }
}

impl From<bool> for Scalar {
    fn from(value: bool) -> Self {
        Scalar::Bool(value)
    }
}

impl From<DateTime<Utc>> for Scalar {
    fn from(value: DateTime<Utc>) -> Self {
        Scalar::DateTime(value)
    }
}

/// A property value: one scalar or an ordered list of scalars.
///
/// An empty `Multi` is meaningful: serialized, it instructs the
/// repository to clear the property.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    /// Single-valued property.
    Single(Scalar),
    /// Multi-valued property; element order is preserved on the wire.
    Multi(Vec<Scalar>),
}

impl PropertyValue {
    /// Construct a single-valued property.
    pub fn single(scalar: impl Into<Scalar>) -> Self {
        PropertyValue::Single(scalar.into())
    }

    /// Construct a multi-valued property.
    pub fn multi(scalars: Vec<Scalar>) -> Self {
        PropertyValue::Multi(scalars)
    }

    /// The string content, when this is a single string scalar.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropertyValue::Single(Scalar::Str(s)) => Some(s),
            _ => None,
        }
    }
}

impl From<Scalar> for PropertyValue {
    fn from(value: Scalar) -> Self {
        PropertyValue::Single(value)
    }
}

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        PropertyValue::Single(value.into())
    }
}

impl From<String> for PropertyValue {
    fn from(value: String) -> Self {
        PropertyValue::Single(value.into())
    }
}

impl From<i64> for PropertyValue {
    fn from(value: i64) -> Self {
        PropertyValue::Single(value.into())
    }
}

impl From<bool> for PropertyValue {
    fn from(value: bool) -> Self {
        PropertyValue::Single(value.into())
    }
}

impl From<Vec<Scalar>> for PropertyValue {
    fn from(value: Vec<Scalar>) -> Self {
        PropertyValue::Multi(value)
    }
}

/// An insertion-ordered map from property name to value.
///
/// Re-inserting an existing name replaces the value in place, keeping
/// the property's original position.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PropertyBag {
    entries: Vec<(String, PropertyValue)>,
}

impl PropertyBag {
    /// Create an empty bag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a property, preserving its original position on
    /// replacement.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<PropertyValue>) {
        let name = name.into();
        let value = value.into();
        if let Some(entry) = self.entries.iter_mut().find(|(n, _)| *n == name) {
            entry.1 = value;
        } else {
            self.entries.push((name, value));
        }
    }

    /// Look up a property by name.
    pub fn get(&self, name: &str) -> Option<&PropertyValue> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    /// Number of properties in the bag.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the bag is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &PropertyValue)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v))
    }
}

impl<N: Into<String>, V: Into<PropertyValue>> FromIterator<(N, V)> for PropertyBag {
    fn from_iter<T: IntoIterator<Item = (N, V)>>(iter: T) -> Self {
        let mut bag = PropertyBag::new();
        for (name, value) in iter {
            bag.insert(name, value);
        }
        bag
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn insertion_order_is_preserved() {
        let mut bag = PropertyBag::new();
        bag.insert("c", PropertyValue::single(1i64));
        bag.insert("a", PropertyValue::single(2i64));
        bag.insert("b", PropertyValue::single(3i64));

        let names: Vec<&str> = bag.iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["c", "a", "b"]);
    }

    #[test]
    fn reinsert_replaces_in_place() {
        let mut bag = PropertyBag::new();
        bag.insert("a", PropertyValue::single(1i64));
        bag.insert("b", PropertyValue::single(2i64));
        bag.insert("a", PropertyValue::single(9i64));

        let names: Vec<&str> = bag.iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["a", "b"]);
        assert_eq!(
            bag.get("a"),
            Some(&PropertyValue::Single(Scalar::Int(9)))
        );
    }

    #[test]
    fn datetime_wire_form_is_epoch_millis() {
        let dt = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        assert_eq!(Scalar::DateTime(dt).to_wire(), "1714564800000");
    }

    #[test]
    fn scalar_wire_forms() {
        assert_eq!(Scalar::str("x").to_wire(), "x");
        assert_eq!(Scalar::Int(-7).to_wire(), "-7");
        assert_eq!(Scalar::Bool(true).to_wire(), "true");
        assert_eq!(Scalar::Dec(1.5).to_wire(), "1.5");
    }

    #[test]
    fn bag_from_iterator() {
        let bag: PropertyBag = vec![("x", "1"), ("y", "2")].into_iter().collect();
        assert_eq!(bag.len(), 2);
        assert_eq!(bag.get("y").unwrap().as_str(), Some("2"));
    }
}
