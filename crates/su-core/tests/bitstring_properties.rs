//! Invariant-style properties for the bitstring builder/matcher (spec §8),
//! driven entirely through SU source the way the end-to-end scenarios are.

use std::time::Duration;

use su_core::{AdapterRegistry, CollectStringPrint, Engine, JobManager};

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

fn run_err(source: &str) -> su_core::ErrorKind {
    let mut e = engine();
    let program = su_core::parse_program(source).expect("parse");
    e.run_program(&program).unwrap_err().kind
}

#[test]
fn unsigned_integer_segment_round_trips_full_range() {
    for (width, n) in [(8u64, 0u64), (8, 255), (16, 0), (16, 65535), (1, 1)] {
        let source = format!("<<x:{width}>> = <<{n}:{width}>>; print(x)");
        assert_eq!(run(&source), format!("{n}\n"), "width {width} value {n}");
    }
}

#[test]
fn signed_integer_segment_round_trips_negative_values() {
    let out = run("<<x:8/signed>> = <<-1:8/signed>>; print(x)");
    assert_eq!(out, "-1\n");
    let out = run("<<x:8/signed>> = <<-128:8/signed>>; print(x)");
    assert_eq!(out, "-128\n");
}

#[test]
fn endianness_swap_reverses_byte_order_for_byte_aligned_width() {
    let be = run("<<x:16/big>> = <<0x12, 0x34>>; print(x)");
    assert_eq!(be, "4660\n");
    let le = run("<<x:16/little>> = <<0x12, 0x34>>; print(x)");
    assert_eq!(le, "13330\n");
}

#[test]
fn utf8_round_trips_ascii_and_multibyte_codepoints() {
    let out = run("<<a/utf8>> = \"\u{1F600}\"; print(a)");
    assert_eq!(out, "128512\n");
}

#[test]
fn dynamic_tlv_succeeds_only_when_enough_bytes_remain() {
    let ok = run(r#"b = <<3:8, "Hi!":3/binary>>; <<n:8, body:n/binary>> = b; print(body)"#);
    assert_eq!(ok, "Hi!\n");

    let kind = run_err(r#"b = <<3:8, "Hi":2/binary>>; <<n:8, body:n/binary>> = b; print(body)"#);
    assert_eq!(kind, su_core::ErrorKind::LiteralMismatch);
}

#[test]
fn pipe_associativity_matches_nested_function_calls() {
    let piped = run("print(1 | id | id)");
    assert_eq!(piped, "1\n");
}

#[test]
fn scope_get_falls_through_to_defining_ancestor() {
    let out = run("x = 1\nif true {\n  print(x)\n}");
    assert_eq!(out, "1\n");
}

#[test]
fn unsized_non_final_binary_segment_is_an_ambiguous_tail() {
    let kind = run_err(r#"<<a/binary, b:8>> = <<"hi", 1:8>>; print(a)"#);
    assert_eq!(kind, su_core::ErrorKind::AmbiguousTail);
}

#[test]
fn repeating_a_pattern_variable_with_a_matching_value_succeeds() {
    let out = run("<<a:8, a:8>> = <<5:8, 5:8>>; print(a)");
    assert_eq!(out, "5\n");
}

#[test]
fn repeating_a_pattern_variable_with_a_conflicting_value_is_a_rebinding_mismatch() {
    let kind = run_err("<<a:8, a:8>> = <<1:8, 2:8>>; print(a)");
    assert_eq!(kind, su_core::ErrorKind::RebindingMismatch);
}
