//! Component L — the execution engine (spec §4.L).
//!
//! Ties together scope, the adapter registry, and the background job
//! manager into a single tree-walking evaluator. A batch run
//! ([`Engine::run_program`]) and a REPL ([`Engine::eval_repl_stmt`]) share
//! the exact same statement/expression evaluation code; they differ only in
//! whether the program is a flat list run once or one line at a time
//! against a persistent scope.

pub mod adapters;
mod builtins;
mod eval;

pub use adapters::{AdapterRegistry, DEFAULT_ADAPTER_TIMEOUT};

use crate::ast::{Program, StmtNode};
use crate::error::SuResult;
use crate::io::PrintWriter;
use crate::job::{JobManager, JobNotification};
use crate::scope::Scope;
use crate::value::Value;

/// What evaluating one top-level statement produced (spec §4.L.1: "(value,
/// was_printed, has_result) per node"). `has_result` is false for pure
/// control-flow statements (`if`, `while`, `break`, ...) that have nothing
/// meaningful to echo at a REPL prompt.
#[derive(Debug, Clone)]
pub struct Outcome {
    pub value: Value,
    pub was_printed: bool,
    pub has_result: bool,
}

impl Outcome {
    fn none() -> Self {
        Self { value: Value::Nil, was_printed: false, has_result: false }
    }

    fn of(value: Value, was_printed: bool) -> Self {
        Self { value, was_printed, has_result: true }
    }
}

/// Propagates `break`/`continue` up out of a statement sequence to the
/// nearest enclosing loop.
pub(crate) enum Signal {
    None,
    Break,
    Continue,
}

/// Owns everything one running program needs: the persistent root scope, the
/// foreign-language adapters, and the background job manager.
pub struct Engine<P: PrintWriter> {
    pub(crate) adapters: AdapterRegistry,
    pub(crate) jobs: JobManager,
    pub(crate) print: P,
    root: Scope,
}

impl<P: PrintWriter> Engine<P> {
    #[must_use]
    pub fn new(adapters: AdapterRegistry, jobs: JobManager, print: P) -> Self {
        Self { adapters, jobs, print, root: Scope::root() }
    }

    /// Runs every top-level statement of `program` against a fresh child of
    /// the root scope, then blocks until every background job it started has
    /// finished (spec §4.M: batch mode must not exit mid-job).
    pub fn run_program(&mut self, program: &Program) -> SuResult<()> {
        let scope = self.root.clone();
        for stmt in &program.statements {
            self.exec_stmt(stmt, &scope)?;
        }
        self.jobs.join();
        Ok(())
    }

    /// Runs one REPL-entered statement against the persistent root scope and
    /// returns what it produced, for the REPL to decide whether/how to echo
    /// it (spec §4.L.1, §6.3).
    pub fn eval_repl_stmt(&mut self, stmt: &StmtNode) -> SuResult<Outcome> {
        let scope = self.root.clone();
        let (_, outcome) = self.exec_stmt(stmt, &scope)?;
        Ok(outcome)
    }

    /// Drains background-job completion notifications (spec §4.M: "the REPL
    /// polls between prompts").
    #[must_use]
    pub fn poll_job_notifications(&self) -> Vec<JobNotification> {
        self.jobs.poll_notifications()
    }

    /// Registers (or replaces) the adapter for `language`.
    pub fn register_adapter(&mut self, language: impl Into<String>, adapter: Box<dyn crate::adapter::RuntimeAdapter>) {
        self.adapters.register(language, adapter);
    }

    /// The engine's print sink, for callers that built the engine around a
    /// capturing [`PrintWriter`] (e.g. [`crate::io::CollectStringPrint`]) and
    /// want to inspect what was written.
    pub fn print_sink(&self) -> &P {
        &self.print
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::CollectStringPrint;
    use crate::parser::parse_program;
    use std::time::Duration;

    fn engine() -> Engine<CollectStringPrint> {
        let adapters = AdapterRegistry::new(Duration::from_secs(1));
        let jobs = JobManager::new(2, 8);
        Engine::new(adapters, jobs, CollectStringPrint::default())
    }

    #[test]
    fn print_writes_to_the_engine_print_sink() {
        let mut e = engine();
        let program = parse_program("print(\"hi\")").unwrap();
        e.run_program(&program).unwrap();
        assert_eq!(e.print.0, "hi\n");
    }

    #[test]
    fn arithmetic_and_assignment_round_trip() {
        let mut e = engine();
        let program = parse_program("x = 2 + 3 * 4\nprint(x)").unwrap();
        e.run_program(&program).unwrap();
        assert_eq!(e.print.0, "14\n");
    }

    #[test]
    fn numeric_for_accumulates() {
        let mut e = engine();
        let program = parse_program("total = 0\nfor i = 1, 5 {\n  total = total + i\n}\nprint(total)").unwrap();
        e.run_program(&program).unwrap();
        assert_eq!(e.print.0, "15\n");
    }

    #[test]
    fn bitstring_pattern_assignment_binds_dynamic_tlv() {
        let mut e = engine();
        let program =
            parse_program("packet = <<3:8, 65:8, 66:8, 67:8>>\n<<len:8, payload:len/binary>> = packet\nprint(len)").unwrap();
        e.run_program(&program).unwrap();
        assert_eq!(e.print.0, "3\n");
    }

    #[test]
    fn pipe_passes_value_as_first_argument() {
        let mut e = engine();
        let program = parse_program("print(1 | id)").unwrap();
        e.run_program(&program).unwrap();
        assert_eq!(e.print.0, "1\n");
    }
}
