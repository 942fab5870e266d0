//! Parser-surface error behavior: every rejected source should fail with a
//! `Syntax` error and a line/column position, never panic.

use su_core::{parse_program, ErrorKind};

#[test]
fn unterminated_string_literal_is_a_syntax_error() {
    let err = parse_program("x = \"oops").unwrap_err();
    assert_eq!(err.kind, ErrorKind::Syntax);
}

#[test]
fn unsized_non_final_pattern_segment_parses_but_is_rejected_at_match_time() {
    // The parser accepts any segment list; the ambiguous-tail rule is an
    // execution-time check (spec §3.3), not a grammar constraint.
    let program = parse_program("<<a/binary, b:8>> = x");
    assert!(program.is_ok());
}

#[test]
fn dangling_operator_is_a_syntax_error() {
    let err = parse_program("x = 1 +").unwrap_err();
    assert_eq!(err.kind, ErrorKind::Syntax);
}

#[test]
fn mismatched_bitstring_delimiters_is_a_syntax_error() {
    let err = parse_program("x = <<1:8, 2:8").unwrap_err();
    assert_eq!(err.kind, ErrorKind::Syntax);
}

#[test]
fn unknown_segment_specifier_is_a_syntax_error() {
    let err = parse_program("x = <<1:8/bogus>>").unwrap_err();
    assert_eq!(err.kind, ErrorKind::Syntax);
}

#[test]
fn pipe_is_always_a_pipe_never_a_bitwise_or() {
    // `|` has one meaning in this grammar: the pipe operator (spec §4.F).
    let program = parse_program("print(1 | id)").unwrap();
    assert_eq!(program.statements.len(), 1);
}

#[test]
fn repl_line_returns_none_for_blank_input() {
    let stmt = su_core::parse_repl_line("   ").unwrap();
    assert!(stmt.is_none());
}

#[test]
fn repl_line_returns_one_statement_per_line() {
    let stmt = su_core::parse_repl_line("x = 1").unwrap();
    assert!(stmt.is_some());
}

#[test]
fn call_arguments_and_list_literals_may_span_multiple_lines() {
    let program = parse_program("print(\n  1,\n  2\n)\nxs = [\n  1,\n  2\n]").unwrap();
    assert_eq!(program.statements.len(), 2);
}
