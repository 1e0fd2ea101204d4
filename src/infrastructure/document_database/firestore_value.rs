//! Conversion between plain JSON and Firestore's typed `Value` messages.

use serde_json::{json, Map, Number, Value};

use crate::domain::DomainError;

pub fn encode_fields(fields: Map<String, Value>) -> Result<Value, DomainError> {
    let encoded = fields
        .into_iter()
        .map(|(key, value)| encode(value).map(|v| (key, v)))
        .collect::<Result<Map<String, Value>, _>>()?;
    Ok(Value::Object(encoded))
}

pub fn encode(value: Value) -> Result<Value, DomainError> {
    Ok(match value {
        Value::Null => json!({ "nullValue": null }),
        Value::Bool(b) => json!({ "booleanValue": b }),
        Value::Number(n) => encode_number(&n)?,
        Value::String(s) => json!({ "stringValue": s }),
        Value::Array(items) => {
            let values = items.into_iter().map(encode).collect::<Result<Vec<_>, _>>()?;
            json!({ "arrayValue": { "values": values } })
        }
        Value::Object(fields) => json!({ "mapValue": { "fields": encode_fields(fields)? } }),
    })
}

// integerValue is int64 carried as a string. Wider integers have no exact
// Firestore form and are refused rather than rounded to a double.
fn encode_number(n: &Number) -> Result<Value, DomainError> {
    if let Some(i) = n.as_i64() {
        return Ok(json!({ "integerValue": i.to_string() }));
    }
    if n.is_u64() {
        return Err(DomainError::invalid_argument(format!(
            "integer {n} exceeds the int64 range"
        )));
    }
    Ok(json!({ "doubleValue": n.as_f64().unwrap_or_default() }))
}

pub fn decode_fields(fields: Map<String, Value>) -> Result<Map<String, Value>, DomainError> {
    fields
        .into_iter()
        .map(|(key, value)| decode(value).map(|v| (key, v)))
        .collect()
}

pub fn decode(value: Value) -> Result<Value, DomainError> {
    let Value::Object(mut typed) = value else {
        return Err(DomainError::internal("firestore value is not an object"));
    };
    let Some((kind, inner)) = typed.iter_mut().next().map(|(k, v)| (k.clone(), v.take())) else {
        return Ok(Value::Null);
    };

    match kind.as_str() {
        "nullValue" => Ok(Value::Null),
        "booleanValue" => Ok(Value::Bool(inner.as_bool().unwrap_or_default())),
        "integerValue" => decode_integer(&inner),
        "doubleValue" => Ok(decode_double(&inner)),
        "stringValue" | "timestampValue" | "bytesValue" | "referenceValue" => Ok(inner),
        "geoPointValue" => Ok(inner),
        "arrayValue" => {
            let values = match inner.get("values") {
                Some(Value::Array(values)) => values.clone(),
                _ => Vec::new(),
            };
            values
                .into_iter()
                .map(decode)
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array)
        }
        "mapValue" => {
            let fields = match inner.get("fields") {
                Some(Value::Object(fields)) => fields.clone(),
                _ => Map::new(),
            };
            decode_fields(fields).map(Value::Object)
        }
        other => Err(DomainError::internal(format!(
            "unsupported firestore value type {other}"
        ))),
    }
}

fn decode_integer(inner: &Value) -> Result<Value, DomainError> {
    match inner {
        Value::String(s) => s
            .parse::<i64>()
            .map(Value::from)
            .map_err(|e| DomainError::internal(format!("invalid integerValue {s:?}: {e}"))),
        Value::Number(n) => Ok(Value::Number(n.clone())),
        _ => Err(DomainError::internal("invalid integerValue")),
    }
}

// NaN and infinities arrive as strings and have no JSON form.
fn decode_double(inner: &Value) -> Value {
    inner
        .as_f64()
        .and_then(Number::from_f64)
        .map(Value::Number)
        .unwrap_or(Value::Null)
}
