//! Component N — marshalling between `Value` and foreign representations
//! (spec §4.N).
//!
//! A real adapter would convert `Value` into whatever its embedded runtime
//! natively uses (a Lua table, a Python object, ...); since no real runtime
//! is wired in here (spec §5 Non-goals), this module defines the conversion
//! *rules* against a small neutral JSON-like interchange representation
//! (`serde_json::Value`).

use std::collections::BTreeSet;

use indexmap::IndexMap;
use num_traits::cast::ToPrimitive;
use serde_json::{Map, Number, Value as Json};

use crate::error::{Error, ErrorKind, SuResult};
use crate::value::Value;

/// Converts a `Value` into its foreign/interchange representation.
///
/// Cycle detection walks the same list/map identity tracking `Value`'s own
/// `display_repl` uses; a cycle marshals to the literal string
/// `"<circular_reference>"` rather than erroring, since a partially-useful
/// snapshot beats losing the whole call (spec §4.N).
pub fn to_foreign(value: &Value) -> SuResult<Json> {
    let mut seen = BTreeSet::new();
    to_foreign_inner(value, &mut seen)
}

fn to_foreign_inner(value: &Value, seen: &mut BTreeSet<usize>) -> SuResult<Json> {
    Ok(match value {
        Value::Nil => Json::Null,
        Value::Bool(b) => Json::Bool(*b),
        Value::Int(n) => match n.to_i64() {
            Some(i) => Json::Number(Number::from(i)),
            None => Json::String(n.to_string()),
        },
        Value::Float(f) => Number::from_f64(*f).map(Json::Number).unwrap_or(Json::Null),
        Value::Str(s) | Value::Preformatted(s) => Json::String(s.to_string()),
        Value::Bitstring(b) => match b.as_bytes() {
            Some(bytes) => Json::Array(bytes.iter().map(|b| Json::Number(Number::from(*b))).collect()),
            None => {
                return Err(Error::new(
                    ErrorKind::BitstringOverflow,
                    "a non-byte-aligned bitstring cannot be marshalled to a foreign runtime",
                ))
            }
        },
        Value::Foreign(h) => Json::String(format!("<{}:{}>", h.language, h.label)),
        Value::List(items) => {
            let ptr = std::sync::Arc::as_ptr(items) as usize;
            if !seen.insert(ptr) {
                return Ok(Json::String("<circular_reference>".to_string()));
            }
            let out: Vec<Json> = items
                .lock()
                .expect("value list lock poisoned")
                .iter()
                .map(|v| to_foreign_inner(v, seen))
                .collect::<SuResult<_>>()?;
            seen.remove(&ptr);
            Json::Array(out)
        }
        Value::Map(entries) => {
            let ptr = std::sync::Arc::as_ptr(entries) as usize;
            if !seen.insert(ptr) {
                return Ok(Json::String("<circular_reference>".to_string()));
            }
            let mut out = Map::new();
            for (k, v) in entries.lock().expect("value map lock poisoned").iter() {
                out.insert(k.clone(), to_foreign_inner(v, seen)?);
            }
            seen.remove(&ptr);
            Json::Object(out)
        }
    })
}

/// Converts a foreign/interchange value back into a `Value`.
pub fn from_foreign(json: &Json) -> Value {
    match json {
        Json::Null => Value::Nil,
        Json::Bool(b) => Value::Bool(*b),
        Json::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::Int(num_bigint::BigInt::from(i))
            } else {
                Value::Float(n.as_f64().unwrap_or(0.0))
            }
        }
        Json::String(s) => Value::str(s.clone()),
        Json::Array(items) => Value::list(items.iter().map(from_foreign).collect()),
        Json::Object(entries) => {
            let mut map = IndexMap::new();
            for (k, v) in entries {
                map.insert(k.clone(), from_foreign(v));
            }
            Value::map(map)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_bigint::BigInt;

    #[test]
    fn roundtrips_scalars() {
        let v = Value::Int(BigInt::from(42));
        let json = to_foreign(&v).unwrap();
        match from_foreign(&json) {
            Value::Int(n) => assert_eq!(n, BigInt::from(42)),
            _ => panic!("expected int"),
        }
    }

    #[test]
    fn byte_aligned_bitstring_marshals_to_array() {
        let bs = crate::bitstring::Bitstring::from_bytes(vec![1, 2, 3]);
        let json = to_foreign(&Value::Bitstring(std::sync::Arc::new(bs))).unwrap();
        assert_eq!(json, Json::Array(vec![Json::Number(1.into()), Json::Number(2.into()), Json::Number(3.into())]));
    }

    #[test]
    fn non_byte_aligned_bitstring_errors() {
        let mut buf = crate::bitstring::BitBuffer::new();
        buf.push_bit(true);
        buf.push_bit(false);
        buf.push_bit(true);
        let bs = crate::bitstring::Bitstring::from_buffer(buf);
        let err = to_foreign(&Value::Bitstring(std::sync::Arc::new(bs))).unwrap_err();
        assert_eq!(err.kind, ErrorKind::BitstringOverflow);
    }

    #[test]
    fn circular_list_marshals_to_sentinel_string() {
        let list = std::sync::Arc::new(std::sync::Mutex::new(vec![Value::Nil]));
        let v = Value::List(list.clone());
        list.lock().unwrap()[0] = v.clone();
        let json = to_foreign(&v).unwrap();
        match json {
            Json::Array(items) => assert_eq!(items[0], Json::String("<circular_reference>".to_string())),
            _ => panic!("expected array"),
        }
    }
}
