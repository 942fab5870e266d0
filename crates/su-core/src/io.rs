//! Output abstraction used by the `print` builtin (spec §4.L.7).
//!
//! `su-core` never touches `std::io::stdout()` directly. The execution
//! engine is generic over a [`PrintWriter`] instead, so a test can capture
//! everything `print(...)` produces ([`CollectStringPrint`]) while `su-cli`
//! drives the real terminal ([`StdPrint`]).

use crate::error::{Error, ErrorKind, SuResult};

/// Receives text produced by the `print` builtin.
pub trait PrintWriter {
    fn write_str(&mut self, text: &str) -> SuResult<()>;
}

/// Writes straight to the process's real stdout, flushing after every call
/// so output interleaves correctly with a REPL's own prompt/echo writes.
#[derive(Debug, Default)]
pub struct StdPrint;

impl PrintWriter for StdPrint {
    fn write_str(&mut self, text: &str) -> SuResult<()> {
        use std::io::Write;
        print!("{text}");
        std::io::stdout().flush().map_err(|e| Error::new(ErrorKind::System, e.to_string()))
    }
}

/// Collects everything written into an in-memory string, for tests that
/// assert on `print(...)` output without touching the real terminal.
#[derive(Debug, Default)]
pub struct CollectStringPrint(pub String);

impl PrintWriter for CollectStringPrint {
    fn write_str(&mut self, text: &str) -> SuResult<()> {
        self.0.push_str(text);
        Ok(())
    }
}

/// Discards everything written to it.
#[derive(Debug, Default)]
pub struct NoPrint;

impl PrintWriter for NoPrint {
    fn write_str(&mut self, _text: &str) -> SuResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collect_string_print_accumulates_writes() {
        let mut p = CollectStringPrint::default();
        p.write_str("a ").unwrap();
        p.write_str("b\n").unwrap();
        assert_eq!(p.0, "a b\n");
    }

    #[test]
    fn no_print_discards_everything() {
        let mut p = NoPrint;
        p.write_str("anything").unwrap();
    }
}
