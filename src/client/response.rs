//! client::response
//!
//! Mapping of wire responses back into semantic results.
//!
//! The repository answers with the succinct property representation
//! (requested via the `succinct` default); these functions lift that
//! JSON into [`CmisObject`], result sets and ACLs. Unknown properties
//! are kept in the object's bag rather than dropped.

use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;

use super::options::Ace;
use crate::core::properties::{PropertyBag, PropertyValue, Scalar};
use crate::core::types::{BaseType, CmisObject, ContentStreamInfo, ObjectId, TypeId};
use crate::error::CmisError;

/// A query or children result page.
#[derive(Debug, Clone)]
pub struct ObjectList {
    /// Decoded objects, in result order.
    pub objects: Vec<CmisObject>,
    /// Whether more results exist past this page.
    pub has_more_items: bool,
    /// Total result count, when the repository reports one.
    pub num_items: Option<u64>,
}

/// A decoded ACL.
#[derive(Debug, Clone)]
pub struct AclResult {
    /// Entries in repository order.
    pub aces: Vec<Ace>,
    /// Whether the ACL fully expresses the object's permissions.
    pub exact: bool,
}

fn malformed(message: impl Into<String>) -> CmisError {
    CmisError::MalformedResponse(message.into())
}

/// Decode one object from its succinct representation.
pub(crate) fn parse_object(value: &Value) -> Result<CmisObject, CmisError> {
    let props = value
        .get("succinctProperties")
        .and_then(Value::as_object)
        .ok_or_else(|| malformed("response carries no succinctProperties"))?;

    let id_str = props
        .get("cmis:objectId")
        .and_then(Value::as_str)
        .ok_or_else(|| malformed("object is missing cmis:objectId"))?;
    let id = ObjectId::new(id_str).map_err(|e| malformed(e.to_string()))?;

    let base_type_id = props
        .get("cmis:baseTypeId")
        .and_then(Value::as_str)
        .unwrap_or("cmis:document");
    let type_id_str = props
        .get("cmis:objectTypeId")
        .and_then(Value::as_str)
        .unwrap_or(base_type_id);
    let type_id = TypeId::new(type_id_str).map_err(|e| malformed(e.to_string()))?;

    let mut properties = PropertyBag::new();
    for (name, value) in props {
        if let Some(decoded) = decode_property(name, value) {
            properties.insert(name.as_str(), decoded);
        }
    }

    let content = props
        .get("cmis:contentStreamFileName")
        .and_then(Value::as_str)
        .map(|file_name| ContentStreamInfo {
            file_name: file_name.to_string(),
            mime_type: props
                .get("cmis:contentStreamMimeType")
                .and_then(Value::as_str)
                .unwrap_or("application/octet-stream")
                .to_string(),
            length: props
                .get("cmis:contentStreamLength")
                .and_then(Value::as_u64),
        });

    Ok(CmisObject {
        id,
        type_id,
        base_type: BaseType::from_type_id(base_type_id),
        version_series_id: props
            .get("cmis:versionSeriesId")
            .and_then(Value::as_str)
            .map(str::to_string),
        version_label: props
            .get("cmis:versionLabel")
            .and_then(Value::as_str)
            .map(str::to_string),
        is_private_working_copy: props
            .get("cmis:isPrivateWorkingCopy")
            .and_then(Value::as_bool)
            .unwrap_or(false),
        content,
        created_at: props.get("cmis:creationDate").and_then(parse_datetime),
        modified_at: props
            .get("cmis:lastModificationDate")
            .and_then(parse_datetime),
        properties,
    })
}

/// Lift one succinct JSON value into a property value.
///
/// Datetime-typed system properties arrive as epoch-millis integers and
/// decode to datetimes; other integers stay integers.
fn decode_property(name: &str, value: &Value) -> Option<PropertyValue> {
    match value {
        Value::Array(elements) => Some(PropertyValue::Multi(
            elements.iter().filter_map(|v| decode_scalar(name, v)).collect(),
        )),
        Value::Null => None,
        other => decode_scalar(name, other).map(PropertyValue::Single),
    }
}

fn decode_scalar(name: &str, value: &Value) -> Option<Scalar> {
    match value {
        Value::String(s) => Some(Scalar::Str(s.clone())),
        Value::Bool(b) => Some(Scalar::Bool(*b)),
        Value::Number(n) => {
            if is_datetime_property(name) {
                n.as_i64()
                    .and_then(|millis| Utc.timestamp_millis_opt(millis).single())
                    .map(Scalar::DateTime)
            } else if let Some(i) = n.as_i64() {
                Some(Scalar::Int(i))
            } else {
                n.as_f64().map(Scalar::Dec)
            }
        }
        _ => None,
    }
}

fn is_datetime_property(name: &str) -> bool {
    matches!(name, "cmis:creationDate" | "cmis:lastModificationDate")
}

fn parse_datetime(value: &Value) -> Option<DateTime<Utc>> {
    value
        .as_i64()
        .and_then(|millis| Utc.timestamp_millis_opt(millis).single())
}

/// Decode a `query` result page.
pub(crate) fn parse_query_result(value: &Value) -> Result<ObjectList, CmisError> {
    let results = value
        .get("results")
        .and_then(Value::as_array)
        .ok_or_else(|| malformed("query response carries no results"))?;

    Ok(ObjectList {
        objects: results
            .iter()
            .map(parse_object)
            .collect::<Result<_, _>>()?,
        has_more_items: value
            .get("hasMoreItems")
            .and_then(Value::as_bool)
            .unwrap_or(false),
        num_items: value.get("numItems").and_then(Value::as_u64),
    })
}

/// Decode a `children` result page (entries nest under `object`).
pub(crate) fn parse_children(value: &Value) -> Result<ObjectList, CmisError> {
    let entries = value
        .get("objects")
        .and_then(Value::as_array)
        .ok_or_else(|| malformed("children response carries no objects"))?;

    let objects = entries
        .iter()
        .map(|entry| parse_object(entry.get("object").unwrap_or(entry)))
        .collect::<Result<_, _>>()?;

    Ok(ObjectList {
        objects,
        has_more_items: value
            .get("hasMoreItems")
            .and_then(Value::as_bool)
            .unwrap_or(false),
        num_items: value.get("numItems").and_then(Value::as_u64),
    })
}

/// Decode an ACL response.
pub(crate) fn parse_acl(value: &Value) -> Result<AclResult, CmisError> {
    let acl = value
        .get("acl")
        .ok_or_else(|| malformed("response carries no acl"))?;
    let aces = acl
        .get("aces")
        .and_then(Value::as_array)
        .ok_or_else(|| malformed("acl carries no aces"))?;

    let decoded = aces
        .iter()
        .map(|ace| {
            let principal = ace
                .get("principal")
                .and_then(|p| p.get("principalId"))
                .and_then(Value::as_str)
                .ok_or_else(|| malformed("ace carries no principalId"))?
                .to_string();
            let permissions = ace
                .get("permissions")
                .and_then(Value::as_array)
                .map(|perms| {
                    perms
                        .iter()
                        .filter_map(Value::as_str)
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default();
            Ok(Ace {
                principal,
                permissions,
            })
        })
        .collect::<Result<_, CmisError>>()?;

    Ok(AclResult {
        aces: decoded,
        exact: value.get("exact").and_then(Value::as_bool).unwrap_or(false),
    })
}

/// Decode an allowable-actions response into (action, allowed) pairs.
pub(crate) fn parse_allowable_actions(value: &Value) -> Result<Vec<(String, bool)>, CmisError> {
    let actions = value
        .get("allowableActions")
        .and_then(Value::as_object)
        .ok_or_else(|| malformed("response carries no allowableActions"))?;

    Ok(actions
        .iter()
        .map(|(name, allowed)| (name.clone(), allowed.as_bool().unwrap_or(false)))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn document_json() -> Value {
        json!({
            "succinctProperties": {
                "cmis:objectId": "id42",
                "cmis:baseTypeId": "cmis:document",
                "cmis:objectTypeId": "cmis:document",
                "cmis:name": "a.txt",
                "cmis:versionSeriesId": "series42",
                "cmis:versionLabel": "1.0",
                "cmis:isPrivateWorkingCopy": false,
                "cmis:contentStreamFileName": "a.txt",
                "cmis:contentStreamMimeType": "text/plain",
                "cmis:contentStreamLength": 5,
                "cmis:creationDate": 1714564800000i64,
            }
        })
    }

    #[test]
    fn parse_document() {
        let object = parse_object(&document_json()).unwrap();
        assert_eq!(object.id.as_str(), "id42");
        assert_eq!(object.base_type, BaseType::Document);
        assert_eq!(object.name(), Some("a.txt"));
        assert_eq!(object.version_label.as_deref(), Some("1.0"));
        assert!(!object.is_private_working_copy);

        let content = object.content.unwrap();
        assert_eq!(content.mime_type, "text/plain");
        assert_eq!(content.length, Some(5));

        let created = object.created_at.unwrap();
        assert_eq!(created.timestamp_millis(), 1714564800000);
    }

    #[test]
    fn missing_object_id_is_malformed() {
        let value = json!({ "succinctProperties": { "cmis:name": "a.txt" } });
        assert!(matches!(
            parse_object(&value),
            Err(CmisError::MalformedResponse(_))
        ));
    }

    #[test]
    fn multi_valued_property_decodes_in_order() {
        let value = json!({
            "succinctProperties": {
                "cmis:objectId": "id1",
                "cmis:baseTypeId": "cmis:document",
                "keywords": ["alpha", "beta"],
            }
        });
        let object = parse_object(&value).unwrap();
        match object.properties.get("keywords").unwrap() {
            PropertyValue::Multi(elements) => {
                assert_eq!(elements.len(), 2);
                assert_eq!(elements[0], Scalar::str("alpha"));
            }
            other => panic!("expected multi value, got {:?}", other),
        }
    }

    #[test]
    fn parse_query_page() {
        let value = json!({
            "results": [document_json()],
            "hasMoreItems": true,
            "numItems": 7,
        });
        let list = parse_query_result(&value).unwrap();
        assert_eq!(list.objects.len(), 1);
        assert!(list.has_more_items);
        assert_eq!(list.num_items, Some(7));
    }

    #[test]
    fn parse_acl_entries() {
        let value = json!({
            "acl": {
                "aces": [
                    {
                        "principal": { "principalId": "alice" },
                        "permissions": ["cmis:read", "cmis:write"],
                        "isDirect": true,
                    }
                ]
            },
            "exact": true,
        });
        let acl = parse_acl(&value).unwrap();
        assert_eq!(acl.aces.len(), 1);
        assert_eq!(acl.aces[0].principal, "alice");
        assert_eq!(acl.aces[0].permissions, vec!["cmis:read", "cmis:write"]);
        assert!(acl.exact);
    }
}
