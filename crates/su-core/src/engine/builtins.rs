//! Built-in, language-level functions (spec §4.L.7): `print`, `len`,
//! `concat`, `id`. Every other bare name that reaches a call site is either a
//! user variable holding a value that isn't callable, or simply unbound —
//! both collapse to the same `Unbound` error here.

use crate::error::{Error, ErrorKind, SuResult};
use crate::io::PrintWriter;
use crate::value::Value;
use num_bigint::BigInt;

/// Dispatches a builtin call. Returns `(result, was_printed)`.
pub fn call(name: &str, args: &[Value], print: &mut dyn PrintWriter) -> SuResult<(Value, bool)> {
    match name {
        "print" => {
            let rendered: Vec<String> = args.iter().map(Value::display_print).collect();
            print.write_str(&rendered.join(" "))?;
            print.write_str("\n")?;
            Ok((Value::Nil, true))
        }
        "len" => {
            let v = args.first().ok_or_else(|| Error::new(ErrorKind::Semantic, "len requires one argument"))?;
            Ok((Value::Int(BigInt::from(value_size(v)?)), false))
        }
        "concat" => {
            let mut out = Vec::new();
            for arg in args {
                match arg {
                    Value::List(items) => out.extend(items.lock().expect("value list lock poisoned").iter().cloned()),
                    other => {
                        return Err(Error::new(
                            ErrorKind::Semantic,
                            format!("concat requires list arguments, got {}", other.type_name()),
                        ))
                    }
                }
            }
            Ok((Value::list(out), false))
        }
        "id" => Ok((args.first().cloned().unwrap_or(Value::Nil), false)),
        other => Err(Error::new(ErrorKind::Unbound, format!("'{other}' is not a builtin or a qualified foreign call"))),
    }
}

/// Shared by the `len` builtin and the `@` size-of operator (spec §4.L.7:
/// "`len` ... equivalent to `@`").
pub fn value_size(value: &Value) -> SuResult<u64> {
    match value {
        Value::List(items) => Ok(items.lock().expect("value list lock poisoned").len() as u64),
        Value::Map(entries) => Ok(entries.lock().expect("value map lock poisoned").len() as u64),
        Value::Str(s) | Value::Preformatted(s) => Ok(s.len() as u64),
        Value::Bitstring(b) => Ok(b.byte_len_floor()),
        other => Err(Error::new(ErrorKind::Semantic, format!("{} has no length", other.type_name()))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::NoPrint;

    #[test]
    fn print_joins_args_with_space_and_marks_printed() {
        let mut p = crate::io::CollectStringPrint::default();
        let (v, printed) = call("print", &[Value::Int(BigInt::from(1)), Value::str("a")], &mut p).unwrap();
        assert!(matches!(v, Value::Nil));
        assert!(printed);
        assert_eq!(p.0, "1 a\n");
    }

    #[test]
    fn len_counts_list_items() {
        let mut p = NoPrint;
        let (v, printed) = call("len", &[Value::list(vec![Value::Nil, Value::Nil])], &mut p).unwrap();
        assert!(!printed);
        match v {
            Value::Int(n) => assert_eq!(n, BigInt::from(2)),
            _ => panic!("expected int"),
        }
    }

    #[test]
    fn concat_merges_lists() {
        let mut p = NoPrint;
        let (v, _) = call(
            "concat",
            &[Value::list(vec![Value::Int(BigInt::from(1))]), Value::list(vec![Value::Int(BigInt::from(2))])],
            &mut p,
        )
        .unwrap();
        match v {
            Value::List(items) => assert_eq!(items.lock().unwrap().len(), 2),
            _ => panic!("expected list"),
        }
    }

    #[test]
    fn unknown_builtin_is_unbound() {
        let mut p = NoPrint;
        let err = call("nope", &[], &mut p).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Unbound);
    }
}
