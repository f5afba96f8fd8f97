//! Conversion between JSON documents and DynamoDB items.

use aws_sdk_dynamodb::types::AttributeValue as Av;
use pxl_core::store::{Result, StoreError};
use pxl_core::Document;
use serde_json::{Map, Number, Value};
use std::collections::HashMap;

/// Converts a document into a DynamoDB item.
pub fn to_item(document: Document) -> HashMap<String, Av> {
    document
        .into_iter()
        .map(|(name, value)| (name, to_attribute(value)))
        .collect()
}

/// Converts a DynamoDB item into a document.
///
/// String and number sets become arrays. Binary attributes are rejected.
pub fn from_item(item: HashMap<String, Av>) -> Result<Document> {
    item.into_iter()
        .map(|(name, value)| {
            let value = from_attribute(&name, value)?;
            Ok((name, value))
        })
        .collect()
}

fn to_attribute(value: Value) -> Av {
    match value {
        Value::Null => Av::Null(true),
        Value::Bool(value) => Av::Bool(value),
        Value::Number(value) => Av::N(value.to_string()),
        Value::String(value) => Av::S(value),
        Value::Array(values) => Av::L(values.into_iter().map(to_attribute).collect()),
        Value::Object(map) => Av::M(
            map.into_iter()
                .map(|(name, value)| (name, to_attribute(value)))
                .collect(),
        ),
    }
}

fn from_attribute(name: &str, value: Av) -> Result<Value> {
    match value {
        Av::S(value) => Ok(Value::String(value)),
        Av::N(value) => parse_number(name, &value),
        Av::Bool(value) => Ok(Value::Bool(value)),
        Av::Null(_) => Ok(Value::Null),
        Av::L(values) => values
            .into_iter()
            .map(|value| from_attribute(name, value))
            .collect::<Result<Vec<_>>>()
            .map(Value::Array),
        Av::M(map) => map
            .into_iter()
            .map(|(key, value)| {
                let value = from_attribute(&key, value)?;
                Ok((key, value))
            })
            .collect::<Result<Map<_, _>>>()
            .map(Value::Object),
        Av::Ss(values) => Ok(Value::Array(values.into_iter().map(Value::String).collect())),
        Av::Ns(values) => values
            .iter()
            .map(|value| parse_number(name, value))
            .collect::<Result<Vec<_>>>()
            .map(Value::Array),
        Av::B(_) | Av::Bs(_) => Err(StoreError::InvalidData(format!(
            "attribute '{name}' is binary, which is not supported"
        ))),
        other => Err(StoreError::InvalidData(format!(
            "attribute '{name}' has an unsupported type: {other:?}"
        ))),
    }
}

fn parse_number(name: &str, raw: &str) -> Result<Value> {
    if let Ok(value) = raw.parse::<u64>() {
        return Ok(Value::from(value));
    }
    if let Ok(value) = raw.parse::<i64>() {
        return Ok(Value::from(value));
    }

    raw.parse::<f64>()
        .ok()
        .and_then(Number::from_f64)
        .map(Value::Number)
        .ok_or_else(|| {
            StoreError::InvalidData(format!("attribute '{name}' is not a valid number: {raw}"))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use aws_sdk_dynamodb::primitives::Blob;
    use serde_json::json;

    fn document(value: Value) -> Document {
        match value {
            Value::Object(map) => map,
            _ => unreachable!("document fixtures are objects"),
        }
    }

    #[test]
    fn pixel_document_maps_to_native_types() {
        let item = to_item(document(json!({"pxl": "abc", "count": 0, "user": "u1"})));

        assert_eq!(item["pxl"], Av::S("abc".to_string()));
        assert_eq!(item["count"], Av::N("0".to_string()));
        assert_eq!(item["user"], Av::S("u1".to_string()));
    }

    #[test]
    fn nested_metadata_survives_conversion() {
        let original = document(json!({
            "pxl": "abc",
            "count": 3,
            "ratio": 0.5,
            "offset": -2,
            "active": true,
            "note": null,
            "tags": ["a", "b"],
            "campaign": {"name": "spring", "variant": 2},
        }));

        let restored = from_item(to_item(original.clone())).unwrap();
        assert_eq!(restored, original);
    }

    #[test]
    fn counter_returned_by_add_is_an_integer() {
        let item = HashMap::from([
            ("pxl".to_string(), Av::S("abc".to_string())),
            ("count".to_string(), Av::N("12".to_string())),
        ]);

        let restored = from_item(item).unwrap();
        assert_eq!(restored["count"].as_u64(), Some(12));
    }

    #[test]
    fn sets_become_arrays() {
        let item = HashMap::from([
            ("names".to_string(), Av::Ss(vec!["a".to_string()])),
            ("numbers".to_string(), Av::Ns(vec!["1".to_string(), "2.5".to_string()])),
        ]);

        let restored = from_item(item).unwrap();
        assert_eq!(Value::Object(restored), json!({"names": ["a"], "numbers": [1, 2.5]}));
    }

    #[test]
    fn binary_attributes_are_rejected() {
        let item = HashMap::from([("raw".to_string(), Av::B(Blob::new(vec![1, 2, 3])))]);

        let err = from_item(item).unwrap_err();
        assert!(matches!(err, StoreError::InvalidData(_)));
    }

    #[test]
    fn malformed_number_is_rejected() {
        let item = HashMap::from([("count".to_string(), Av::N("one".to_string()))]);

        assert!(matches!(
            from_item(item).unwrap_err(),
            StoreError::InvalidData(_)
        ));
    }
}
