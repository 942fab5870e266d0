//! The adapter registry's aliasing, timeout and recovery behavior
//! (spec §4.K/§4.L), exercised through the public `Engine`/`AdapterRegistry`
//! surface rather than by poking at engine internals.

use std::time::Duration;

use su_core::{AdapterRegistry, ErrorKind, NullAdapter, TestAdapter};

#[test]
fn js_is_an_alias_for_node() {
    let mut registry = AdapterRegistry::new(Duration::from_secs(1));
    registry.register("node", Box::new(NullAdapter::new("node")));
    let result = registry.call_function("js", "f", vec![]);
    assert!(result.is_ok());
}

#[test]
fn unregistered_language_is_adapter_unavailable() {
    let registry = AdapterRegistry::new(Duration::from_secs(1));
    let err = registry.call_function("lua", "f", vec![]).unwrap_err();
    assert_eq!(err.kind, ErrorKind::AdapterUnavailable);
}

#[test]
fn a_call_that_exceeds_the_timeout_leaves_the_adapter_permanently_unavailable() {
    let mut registry = AdapterRegistry::new(Duration::from_millis(20));
    let mut adapter = TestAdapter::new("slow");
    adapter.register_function("wait", |_| {
        std::thread::sleep(Duration::from_millis(200));
        Ok(su_core::Value::Nil)
    });
    registry.register("slow", Box::new(adapter));

    let first = registry.call_function("slow", "wait", vec![]);
    assert_eq!(first.unwrap_err().kind, ErrorKind::Timeout);

    let second = registry.call_function("slow", "wait", vec![]);
    assert_eq!(second.unwrap_err().kind, ErrorKind::AdapterUnavailable);
}

#[test]
fn a_successful_call_leaves_the_adapter_reusable() {
    let mut registry = AdapterRegistry::new(Duration::from_secs(1));
    let mut adapter = TestAdapter::new("calc");
    adapter.register_function("double", |args| match args.first() {
        Some(su_core::Value::Int(n)) => Ok(su_core::Value::Int(n.clone() * num_bigint::BigInt::from(2))),
        _ => Err(su_core::Error::new(ErrorKind::Semantic, "double requires an int")),
    });
    registry.register("calc", Box::new(adapter));

    for expected in [2i64, 4, 6] {
        let n = expected / 2;
        let result = registry.call_function("calc", "double", vec![su_core::Value::Int(n.into())]).unwrap();
        match result {
            su_core::Value::Int(v) => assert_eq!(v, num_bigint::BigInt::from(expected)),
            other => panic!("expected int, got {other:?}"),
        }
    }
}
