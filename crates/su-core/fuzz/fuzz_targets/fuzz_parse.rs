//! Fuzz target: lex and parse arbitrary source (no execution).
//!
//! A crash here indicates a bug in the lexer or the construct-handler
//! parser driver — both should always return an `Err`, never panic,
//! regardless of input.

#![no_main]

use libfuzzer_sys::fuzz_target;

use su_core::parse_program;

fuzz_target!(|data: &[u8]| {
    let Ok(source) = std::str::from_utf8(data) else {
        return;
    };

    if source.len() > 8192 {
        return;
    }

    let _ = parse_program(source);
});
