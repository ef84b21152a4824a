//! Conversion of DynamoDB attribute maps into dataset records.
//!
//! Items are first mapped onto `serde_json::Value` and then decoded through
//! the serde contract of [`DatasetRecord`], so the JSON field names are the
//! single source of truth for the stored attribute names.

use std::collections::HashMap;

use aws_sdk_dynamodb::types::AttributeValue;
use serde_json::{Map, Number, Value};

use crate::dataset::DatasetRecord;
use crate::error::StoreError;

/// Convert a single attribute into a JSON value.
pub fn attribute_to_json(attribute: &AttributeValue) -> Result<Value, String> {
    let value = match attribute {
        AttributeValue::S(s) => Value::String(s.clone()),
        AttributeValue::N(n) => Value::Number(parse_number(n)?),
        AttributeValue::Bool(b) => Value::Bool(*b),
        AttributeValue::Null(_) => Value::Null,
        AttributeValue::M(map) => Value::Object(map_to_json(map)?),
        AttributeValue::L(list) => Value::Array(
            list.iter()
                .map(attribute_to_json)
                .collect::<Result<Vec<_>, _>>()?,
        ),
        AttributeValue::Ss(set) => Value::Array(set.iter().cloned().map(Value::String).collect()),
        AttributeValue::Ns(set) => Value::Array(
            set.iter()
                .map(|n| parse_number(n).map(Value::Number))
                .collect::<Result<Vec<_>, _>>()?,
        ),
        AttributeValue::B(_) | AttributeValue::Bs(_) => {
            return Err("binary attributes are not supported".to_string())
        }
        other => return Err(format!("unsupported attribute type: {other:?}")),
    };

    Ok(value)
}

fn map_to_json(map: &HashMap<String, AttributeValue>) -> Result<Map<String, Value>, String> {
    map.iter()
        .map(|(key, attribute)| {
            attribute_to_json(attribute)
                .map(|value| (key.clone(), value))
                .map_err(|e| format!("{key}: {e}"))
        })
        .collect()
}

/// Store numbers arrive as strings; integral values stay integral.
fn parse_number(raw: &str) -> Result<Number, String> {
    if let Ok(n) = raw.parse::<i64>() {
        return Ok(Number::from(n));
    }
    if let Ok(n) = raw.parse::<u64>() {
        return Ok(Number::from(n));
    }
    raw.parse::<f64>()
        .ok()
        .and_then(Number::from_f64)
        .ok_or_else(|| format!("invalid number {raw:?}"))
}

/// Decode one store item into a record.
pub fn decode_record(
    table: &str,
    item: &HashMap<String, AttributeValue>,
) -> Result<DatasetRecord, StoreError> {
    let decode_err = |reason: String| StoreError::Decode {
        table: table.to_string(),
        reason,
    };

    let value = map_to_json(item).map_err(decode_err)?;
    serde_json::from_value(Value::Object(value)).map_err(|e| decode_err(e.to_string()))
}

/// Decode a page of store items, failing on the first malformed one.
pub fn decode_records(
    table: &str,
    items: &[HashMap<String, AttributeValue>],
) -> Result<Vec<DatasetRecord>, StoreError> {
    items.iter().map(|item| decode_record(table, item)).collect()
}
