//! Property-based tests for the wire encodings.
//!
//! These tests use proptest to verify ordering invariants hold across
//! randomly generated property bags.

use proptest::prelude::*;

use cmis_browser::core::properties::{PropertyBag, PropertyValue, Scalar};
use cmis_browser::encoding::params::merge;
use cmis_browser::encoding::{
    decode_property_pairs, encode_indexed, encode_property_pairs, FormFields,
};

/// Strategy for property-name characters.
fn name_char() -> impl Strategy<Value = char> {
    prop_oneof![
        prop::char::range('a', 'z'),
        prop::char::range('A', 'Z'),
        prop::char::range('0', '9'),
        Just(':'),
        Just('_'),
        Just('-'),
    ]
}

/// Strategy for property names.
fn property_name() -> impl Strategy<Value = String> {
    prop::collection::vec(name_char(), 1..24).prop_map(|chars| chars.into_iter().collect())
}

/// Strategy for string scalar values (any printable content).
fn string_value() -> impl Strategy<Value = String> {
    "[ -~]{0,32}"
}

/// Strategy for a scalar-or-array property value over string scalars.
fn property_value() -> impl Strategy<Value = PropertyValue> {
    prop_oneof![
        string_value().prop_map(|s| PropertyValue::Single(Scalar::Str(s))),
        prop::collection::vec(string_value().prop_map(Scalar::Str), 0..4)
            .prop_map(PropertyValue::Multi),
    ]
}

/// Strategy for bags with unique property names, in random order.
fn property_bag() -> impl Strategy<Value = PropertyBag> {
    prop::collection::btree_map(property_name(), property_value(), 0..8).prop_flat_map(|map| {
        let entries: Vec<(String, PropertyValue)> = map.into_iter().collect();
        let len = entries.len();
        Just(entries).prop_shuffle().prop_map(move |shuffled| {
            debug_assert_eq!(shuffled.len(), len);
            shuffled.into_iter().collect()
        })
    })
}

proptest! {
    /// Decoding the pairs back by index reconstructs the original bag.
    #[test]
    fn property_pairs_round_trip(bag in property_bag()) {
        let decoded = decode_property_pairs(&encode_property_pairs(&bag));
        prop_assert_eq!(decoded, bag);
    }

    /// The id fields appear in bag iteration order and carry the bag's
    /// names.
    #[test]
    fn pair_indexes_follow_iteration_order(bag in property_bag()) {
        let fields = encode_property_pairs(&bag);
        for (n, (name, _)) in bag.iter().enumerate() {
            prop_assert_eq!(fields.get(&format!("propertyId[{}]", n)), Some(name));
        }
    }

    /// A multi value emits one indexed field per element, in element
    /// order; an empty multi emits none.
    #[test]
    fn multi_values_emit_elements_in_order(
        name in property_name(),
        elements in prop::collection::vec(string_value(), 0..6),
    ) {
        let mut bag = PropertyBag::new();
        bag.insert(
            name,
            PropertyValue::Multi(elements.iter().cloned().map(Scalar::Str).collect()),
        );

        let fields = encode_property_pairs(&bag);
        for (m, element) in elements.iter().enumerate() {
            prop_assert_eq!(
                fields.get(&format!("propertyValue[0][{}]", m)),
                Some(element.as_str())
            );
        }
        prop_assert_eq!(
            fields.get(&format!("propertyValue[0][{}]", elements.len())),
            None
        );
        // A scalar-form value field never coexists with element fields.
        prop_assert_eq!(fields.get("propertyValue[0]"), None);
    }

    /// Record order becomes index `i` in the indexed encoding.
    #[test]
    fn indexed_records_keep_their_positions(
        principals in prop::collection::vec(string_value(), 1..6),
    ) {
        let records: Vec<PropertyBag> = principals
            .iter()
            .map(|p| {
                let mut record = PropertyBag::new();
                record.insert("principal", PropertyValue::Single(Scalar::Str(p.clone())));
                record
            })
            .collect();

        let fields = encode_indexed(&records);
        for (i, principal) in principals.iter().enumerate() {
            prop_assert_eq!(
                fields.get(&format!("principal[{}]", i)),
                Some(principal.as_str())
            );
        }
    }

    /// Merging never loses keys and always prefers the later tier.
    #[test]
    fn merge_prefers_later_tiers(
        defaults in prop::collection::btree_map("[a-e]", string_value(), 0..5),
        caller in prop::collection::btree_map("[a-e]", string_value(), 0..5),
    ) {
        let to_fields = |map: &std::collections::BTreeMap<String, String>| {
            map.iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect::<FormFields>()
        };

        let merged = merge(to_fields(&defaults), FormFields::new(), to_fields(&caller));

        for (key, value) in &caller {
            prop_assert_eq!(merged.get(key), Some(value.as_str()));
        }
        for (key, value) in &defaults {
            if !caller.contains_key(key) {
                prop_assert_eq!(merged.get(key), Some(value.as_str()));
            }
        }
        prop_assert_eq!(
            merged.len(),
            defaults.keys().chain(caller.keys()).collect::<std::collections::BTreeSet<_>>().len()
        );
    }
}
