//! Component J — the runtime value model (spec §4.J, §6.3).
//!
//! `Value` is the tagged union every expression evaluates to. Lists and maps
//! are reference-counted so copying a `Value` around the evaluator (binding
//! it to a new name, pushing it onto a call-argument vector) is cheap, the
//! same cloning discipline a reference-counted namespace or heap type uses.
//! The counted pointer is `Arc`, not `Rc`, and the interior mutability is a
//! `Mutex`, not a `RefCell`: a background job (spec §4.M) runs its foreign
//! call on a worker thread and returns a `Value` across that boundary, so
//! `Value` has to be `Send`.

use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt;
use std::sync::{Arc, Mutex};

use indexmap::IndexMap;
use num_bigint::BigInt;
use num_traits::cast::ToPrimitive;

use crate::bitstring::Bitstring;

pub type ValueList = Arc<Mutex<Vec<Value>>>;
pub type ValueMap = Arc<Mutex<IndexMap<String, Value>>>;

/// An opaque handle to something a foreign runtime adapter produced that has
/// no useful shape on this side (spec §4.N "opaque foreign handle").
#[derive(Debug, Clone)]
pub struct ForeignHandle {
    pub language: String,
    pub label: String,
    pub id: u64,
}

impl PartialEq for ForeignHandle {
    fn eq(&self, other: &Self) -> bool {
        self.language == other.language && self.id == other.id
    }
}

#[derive(Debug, Clone)]
pub enum Value {
    Nil,
    Bool(bool),
    Int(BigInt),
    Float(f64),
    Str(Arc<str>),
    List(ValueList),
    Map(ValueMap),
    Bitstring(Arc<Bitstring>),
    Foreign(Arc<ForeignHandle>),
    /// A string that is already formatted for display and must not be
    /// re-quoted by `display_repl` (spec §6.3 — e.g. a foreign traceback).
    Preformatted(Arc<str>),
}

impl Value {
    #[must_use]
    pub fn str(s: impl Into<Arc<str>>) -> Self {
        Value::Str(s.into())
    }

    #[must_use]
    pub fn list(items: Vec<Value>) -> Self {
        Value::List(Arc::new(Mutex::new(items)))
    }

    #[must_use]
    pub fn map(entries: IndexMap<String, Value>) -> Self {
        Value::Map(Arc::new(Mutex::new(entries)))
    }

    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Nil => "nil",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) | Value::Preformatted(_) => "string",
            Value::List(_) => "list",
            Value::Map(_) => "map",
            Value::Bitstring(_) => "bitstring",
            Value::Foreign(_) => "foreign",
        }
    }

    /// Truthiness used by `if`/`while`/`&&`/`||`/elvis (spec §6.2): only
    /// `nil` and `false` are falsy, everything else — including `0` and
    /// `""` — is truthy.
    #[must_use]
    pub fn is_truthy(&self) -> bool {
        !matches!(self, Value::Nil | Value::Bool(false))
    }

    /// Rendering used by the REPL to echo a result (spec §6.3): strings are
    /// quoted, containers render their elements recursively.
    #[must_use]
    pub fn display_repl(&self) -> String {
        let mut seen = BTreeSet::new();
        self.render(true, &mut seen)
    }

    /// Rendering used by `print(...)` (spec §6.3): strings are bare.
    #[must_use]
    pub fn display_print(&self) -> String {
        let mut seen = BTreeSet::new();
        self.render(false, &mut seen)
    }

    fn render(&self, quote_strings: bool, seen: &mut BTreeSet<usize>) -> String {
        match self {
            Value::Nil => "nil".to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Int(n) => n.to_string(),
            Value::Float(f) => format_float(*f),
            Value::Str(s) if quote_strings => format!("{s:?}"),
            Value::Str(s) | Value::Preformatted(s) => s.to_string(),
            Value::Bitstring(b) => b.display(),
            Value::Foreign(h) => format!("<{}:{}>", h.language, h.label),
            Value::List(items) => {
                let ptr = Arc::as_ptr(items) as usize;
                if !seen.insert(ptr) {
                    return "<circular_reference>".to_string();
                }
                let rendered: Vec<String> = items
                    .lock()
                    .expect("value list lock poisoned")
                    .iter()
                    .map(|v| v.render(true, seen))
                    .collect();
                seen.remove(&ptr);
                format!("[{}]", rendered.join(", "))
            }
            Value::Map(entries) => {
                let ptr = Arc::as_ptr(entries) as usize;
                if !seen.insert(ptr) {
                    return "<circular_reference>".to_string();
                }
                let rendered: Vec<String> = entries
                    .lock()
                    .expect("value map lock poisoned")
                    .iter()
                    .map(|(k, v)| format!("{k}: {}", v.render(true, seen)))
                    .collect();
                seen.remove(&ptr);
                format!("{{{}}}", rendered.join(", "))
            }
        }
    }

    /// Structural equality used by `==`/`!=` and literal bitstring pattern
    /// segments (spec §4.H step 5). Numbers compare across int/float by
    /// value; containers compare structurally, not by identity.
    #[must_use]
    pub fn values_equal(a: &Value, b: &Value) -> bool {
        match (a, b) {
            (Value::Nil, Value::Nil) => true,
            (Value::Bool(x), Value::Bool(y)) => x == y,
            (Value::Int(x), Value::Int(y)) => x == y,
            (Value::Float(x), Value::Float(y)) => x == y,
            (Value::Int(x), Value::Float(y)) | (Value::Float(y), Value::Int(x)) => {
                x.to_f64().is_some_and(|xf| xf == *y)
            }
            (Value::Str(x), Value::Str(y)) => x == y,
            (Value::Bitstring(x), Value::Bitstring(y)) => x == y,
            (Value::List(x), Value::List(y)) => {
                let (x, y) = (x.lock().expect("value list lock poisoned"), y.lock().expect("value list lock poisoned"));
                x.len() == y.len() && x.iter().zip(y.iter()).all(|(a, b)| Value::values_equal(a, b))
            }
            (Value::Map(x), Value::Map(y)) => {
                let (x, y) = (x.lock().expect("value map lock poisoned"), y.lock().expect("value map lock poisoned"));
                x.len() == y.len()
                    && x.iter().all(|(k, v)| y.get(k).is_some_and(|w| Value::values_equal(v, w)))
            }
            _ => false,
        }
    }

    /// Ordering used by `<`/`<=`/`>`/`>=` (spec §4.L numeric and string
    /// comparisons only); returns `None` for types that have no ordering.
    #[must_use]
    pub fn partial_compare(a: &Value, b: &Value) -> Option<Ordering> {
        match (a, b) {
            (Value::Int(x), Value::Int(y)) => Some(x.cmp(y)),
            (Value::Float(x), Value::Float(y)) => x.partial_cmp(y),
            (Value::Int(x), Value::Float(y)) => x.to_f64()?.partial_cmp(y),
            (Value::Float(x), Value::Int(y)) => x.partial_cmp(&y.to_f64()?),
            (Value::Str(x), Value::Str(y)) => Some(x.cmp(y)),
            _ => None,
        }
    }
}

/// Float rendering shared by both display modes: integral floats keep a
/// trailing `.0` so `1.0` never prints identically to the integer `1`.
fn format_float(f: f64) -> String {
    if f.is_nan() {
        "nan".to_string()
    } else if f.is_infinite() {
        if f > 0.0 { "inf".to_string() } else { "-inf".to_string() }
    } else if f.fract() == 0.0 && f.abs() < 1e15 {
        format!("{f:.1}")
    } else {
        format!("{f}")
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_print())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truthiness_matches_spec_rules() {
        assert!(!Value::Nil.is_truthy());
        assert!(!Value::Bool(false).is_truthy());
        assert!(Value::Int(BigInt::from(0)).is_truthy());
        assert!(Value::str("").is_truthy());
    }

    #[test]
    fn repl_quotes_strings_print_does_not() {
        let v = Value::str("hi");
        assert_eq!(v.display_repl(), "\"hi\"");
        assert_eq!(v.display_print(), "hi");
    }

    #[test]
    fn circular_list_renders_sentinel() {
        let list = Arc::new(Mutex::new(vec![Value::Int(BigInt::from(1))]));
        let v = Value::List(list.clone());
        list.lock().unwrap().push(v.clone());
        assert!(v.display_repl().contains("<circular_reference>"));
    }

    #[test]
    fn numeric_cross_type_equality() {
        assert!(Value::values_equal(&Value::Int(BigInt::from(2)), &Value::Float(2.0)));
        assert!(!Value::values_equal(&Value::Int(BigInt::from(2)), &Value::Float(2.5)));
    }

    #[test]
    fn float_display_keeps_trailing_point_zero() {
        assert_eq!(format_float(3.0), "3.0");
        assert_eq!(format_float(3.5), "3.5");
    }
}
