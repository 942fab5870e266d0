//! The six literal-input/literal-output scenarios (spec §8).

use std::time::Duration;

use su_core::{AdapterRegistry, CollectStringPrint, Engine, JobManager, JobState, NullAdapter, TestAdapter, Value};

fn engine() -> Engine<CollectStringPrint> {
    let adapters = AdapterRegistry::new(Duration::from_secs(1));
    let jobs = JobManager::new(2, 8);
    Engine::new(adapters, jobs, CollectStringPrint::default())
}

fn run(source: &str) -> String {
    let mut e = engine();
    let program = su_core::parse_program(source).expect("parse");
    e.run_program(&program).expect("run");
    e.print_sink().0.clone()
}

#[test]
fn round_trip_integer_and_binary_segments() {
    let out = run(r#"b = <<42, 17:8, "hello":5/binary>>; match b { <<a:8, c:8, d:5/binary>> -> print(a, c, d) }"#);
    assert_eq!(out, "42 17 hello\n");
}

#[test]
fn dynamic_tlv_length_prefixed_payload() {
    let out = run(
        r#"packet = <<5:8, "Hello":5/binary, " World">>; <<len:8, content:len/binary, rest/binary>> = packet; print(len, content, rest)"#,
    );
    assert_eq!(out, "5 Hello  World\n");
}

#[test]
fn little_endian_integer_segment() {
    let out = run("<<x:16/little>> = <<0x34, 0x12>>; print(x)");
    assert_eq!(out, "4660\n");
}

#[test]
fn utf8_codepoint_segments() {
    let out = run(r#"<<a/utf8, b/utf8, c/utf8>> = "abc"; print(a, b, c)"#);
    assert_eq!(out, "97 98 99\n");
}

#[test]
fn pipe_chains_through_two_foreign_adapters() {
    let mut e = engine();

    let mut a = TestAdapter::new("a");
    a.register_function("upper", |args| match args.first() {
        Some(Value::Str(s)) => Ok(Value::str(s.to_uppercase())),
        _ => Err(su_core::Error::new(su_core::ErrorKind::Semantic, "upper requires a string")),
    });
    e.register_adapter("a", Box::new(a));

    let mut b = TestAdapter::new("b");
    b.register_function("bang", |args| match args.first() {
        Some(Value::Str(s)) => Ok(Value::str(format!("{s}!"))),
        _ => Err(su_core::Error::new(su_core::ErrorKind::Semantic, "bang requires a string")),
    });
    e.register_adapter("b", Box::new(b));

    let program = su_core::parse_program(r#"print("hi" | a.upper | b.bang)"#).expect("parse");
    e.run_program(&program).expect("run");
    assert_eq!(e.print_sink().0, "HI!\n");
}

#[test]
fn background_job_notification_carries_its_result() {
    let mut e = engine();
    let mut a = TestAdapter::new("a");
    a.register_function("sleep_and_return", |args| Ok(args.get(1).cloned().unwrap_or(Value::Nil)));
    e.register_adapter("a", Box::new(a));

    let program = su_core::parse_program(r#"a.sleep_and_return(1, "done") &"#).expect("parse");
    e.run_program(&program).expect("run");

    let notes = e.poll_job_notifications();
    assert_eq!(notes.len(), 1);
    match &notes[0].state {
        JobState::Completed(value) => assert_eq!(value.as_str(), Some("done")),
        other => panic!("expected a completed job, got {other:?}"),
    }
}

#[test]
fn registered_null_adapter_accepts_any_call_and_returns_nil() {
    let mut e = engine();
    e.register_adapter("lua", Box::new(NullAdapter::new("lua")));
    let program = su_core::parse_program("lua.f(1)").expect("parse");
    e.run_program(&program).expect("run");
}

#[test]
fn calling_an_unregistered_language_is_adapter_unavailable() {
    let mut e = engine();
    let program = su_core::parse_program("lua.f(1)").expect("parse");
    let err = e.run_program(&program).unwrap_err();
    assert_eq!(err.kind, su_core::ErrorKind::AdapterUnavailable);
}
