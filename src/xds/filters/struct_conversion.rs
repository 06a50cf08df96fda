//! JSON to `google.protobuf.Struct` mapping.
//!
//! Older proxies read filter configuration as a loosely typed `Struct`. These
//! helpers move a serde JSON value into that shape and back.

use crate::Result;
use prost_types::value::Kind;
use prost_types::{ListValue, Struct, Value};
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;

/// Convert a JSON object to a protobuf Struct.
///
/// Anything other than an object is rejected; `Struct` has no scalar form.
pub fn json_to_struct(json: &JsonValue) -> Result<Struct> {
    match json {
        JsonValue::Object(map) => Ok(Struct { fields: object_fields(map)? }),
        other => Err(crate::Error::encoding(format!(
            "struct payload must be a JSON object, got {}",
            json_kind(other)
        ))),
    }
}

/// Convert a protobuf Struct back to a JSON object.
pub fn struct_to_json(s: &Struct) -> JsonValue {
    JsonValue::Object(
        s.fields.iter().map(|(key, value)| (key.clone(), proto_value_to_json(value))).collect(),
    )
}

fn object_fields(map: &serde_json::Map<String, JsonValue>) -> Result<BTreeMap<String, Value>> {
    map.iter().map(|(key, value)| Ok((key.clone(), json_to_proto_value(value)?))).collect()
}

fn json_to_proto_value(json: &JsonValue) -> Result<Value> {
    let kind = match json {
        JsonValue::Null => Kind::NullValue(0),
        JsonValue::Bool(b) => Kind::BoolValue(*b),
        JsonValue::Number(n) => Kind::NumberValue(n.as_f64().ok_or_else(|| {
            crate::Error::encoding(format!("number {} has no f64 representation", n))
        })?),
        JsonValue::String(s) => Kind::StringValue(s.clone()),
        JsonValue::Array(items) => Kind::ListValue(ListValue {
            values: items.iter().map(json_to_proto_value).collect::<Result<_>>()?,
        }),
        JsonValue::Object(map) => Kind::StructValue(Struct { fields: object_fields(map)? }),
    };

    Ok(Value { kind: Some(kind) })
}

fn proto_value_to_json(value: &Value) -> JsonValue {
    match &value.kind {
        Some(Kind::NullValue(_)) | None => JsonValue::Null,
        Some(Kind::BoolValue(b)) => JsonValue::Bool(*b),
        // Non-finite numbers have no JSON form
        Some(Kind::NumberValue(n)) => {
            serde_json::Number::from_f64(*n).map(JsonValue::Number).unwrap_or(JsonValue::Null)
        }
        Some(Kind::StringValue(s)) => JsonValue::String(s.clone()),
        Some(Kind::ListValue(list)) => {
            JsonValue::Array(list.values.iter().map(proto_value_to_json).collect())
        }
        Some(Kind::StructValue(s)) => struct_to_json(s),
    }
}

fn json_kind(json: &JsonValue) -> &'static str {
    match json {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "a boolean",
        JsonValue::Number(_) => "a number",
        JsonValue::String(_) => "a string",
        JsonValue::Array(_) => "an array",
        JsonValue::Object(_) => "an object",
    }
}
