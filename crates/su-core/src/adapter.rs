//! Component K — the Runtime Adapter Interface (spec §4.K).
//!
//! A per-language adapter is the only seam between the execution engine and
//! an actual foreign runtime. This crate implements the trait and two test
//! doubles; wiring a real Lua/Python/Go/JS runtime behind it is out of scope
//! (spec §5 Non-goals), the same way `PrintWriter` ships only in-process
//! implementations and leaves the real terminal/file targets to the binary
//! crate.

use std::collections::HashMap;

use crate::error::SuResult;
use crate::value::Value;

/// One exported variable name plus its current value, used by
/// [`RuntimeAdapter::execute_code_block_with_variables`] to pass bindings
/// into and back out of an embedded code block (spec §3.2 `CodeBlock`).
pub type VariableBindings = HashMap<String, Value>;

/// Introspection summary an adapter can report about itself (spec §4.K).
#[derive(Debug, Clone, Default)]
pub struct AdapterIntrospection {
    pub language: String,
    pub version: Option<String>,
    pub ready: bool,
}

/// The per-foreign-language runtime seam (spec §4.K). Every method that can
/// fail returns [`SuResult`] so a foreign-side failure becomes a
/// `ForeignRuntime` error the engine can classify (spec §7).
///
/// `Send` is a supertrait because `isolate()` hands a fresh adapter to the
/// job manager's worker pool (spec §4.M/§5): an adapter instance must be
/// movable onto that background thread.
pub trait RuntimeAdapter: Send {
    /// Starts up the underlying runtime, if it isn't already.
    fn initialize(&mut self) -> SuResult<()>;

    /// Whether the adapter is ready to accept calls without blocking on
    /// startup work.
    fn is_ready(&self) -> bool;

    /// Evaluates a single expression of foreign source, returning its value.
    fn eval(&mut self, source: &str) -> SuResult<Value>;

    /// Calls a named function in the foreign runtime with positional args,
    /// returning its single return value.
    fn call_function(&mut self, name: &str, args: &[Value]) -> SuResult<Value>;

    /// Calls a named function that may return more than one value (spec
    /// §3.1 multi-value qualified calls).
    fn call_function_multi(&mut self, name: &str, args: &[Value]) -> SuResult<Vec<Value>>;

    /// Reads a global variable from the foreign runtime.
    fn get_variable(&mut self, name: &str) -> SuResult<Value>;

    /// Writes a global variable into the foreign runtime.
    fn set_variable(&mut self, name: &str, value: Value) -> SuResult<()>;

    /// Runs a batch of statements with no return value (spec §3.2
    /// `CodeBlock` bodies that export nothing).
    fn execute_batch(&mut self, source: &str) -> SuResult<()>;

    /// Runs a code block, seeding `inputs` as foreign globals first, then
    /// reading back `exported_names` afterward.
    fn execute_code_block_with_variables(
        &mut self,
        source: &str,
        inputs: &VariableBindings,
        exported_names: &[String],
    ) -> SuResult<VariableBindings>;

    /// Releases any resources the adapter is holding (interpreter state,
    /// subprocess handles, etc).
    fn cleanup(&mut self) -> SuResult<()>;

    /// Returns a fresh, independent adapter instance for background-task
    /// isolation (spec §4.M: background jobs must not share mutable foreign
    /// state with the caller).
    fn isolate(&self) -> Box<dyn RuntimeAdapter>;

    /// Reports what this adapter is and whether it is ready.
    fn introspection(&self) -> AdapterIntrospection;
}

/// An adapter that accepts every call and always returns `nil` — useful as
/// a placeholder for a language with no real implementation wired in yet.
#[derive(Debug, Clone, Default)]
pub struct NullAdapter {
    language: String,
}

impl NullAdapter {
    #[must_use]
    pub fn new(language: impl Into<String>) -> Self {
        Self { language: language.into() }
    }
}

impl RuntimeAdapter for NullAdapter {
    fn initialize(&mut self) -> SuResult<()> {
        Ok(())
    }

    fn is_ready(&self) -> bool {
        true
    }

    fn eval(&mut self, _source: &str) -> SuResult<Value> {
        Ok(Value::Nil)
    }

    fn call_function(&mut self, _name: &str, _args: &[Value]) -> SuResult<Value> {
        Ok(Value::Nil)
    }

    fn call_function_multi(&mut self, _name: &str, _args: &[Value]) -> SuResult<Vec<Value>> {
        Ok(vec![Value::Nil])
    }

    fn get_variable(&mut self, _name: &str) -> SuResult<Value> {
        Ok(Value::Nil)
    }

    fn set_variable(&mut self, _name: &str, _value: Value) -> SuResult<()> {
        Ok(())
    }

    fn execute_batch(&mut self, _source: &str) -> SuResult<()> {
        Ok(())
    }

    fn execute_code_block_with_variables(
        &mut self,
        _source: &str,
        _inputs: &VariableBindings,
        exported_names: &[String],
    ) -> SuResult<VariableBindings> {
        Ok(exported_names.iter().map(|name| (name.clone(), Value::Nil)).collect())
    }

    fn cleanup(&mut self) -> SuResult<()> {
        Ok(())
    }

    fn isolate(&self) -> Box<dyn RuntimeAdapter> {
        Box::new(self.clone())
    }

    fn introspection(&self) -> AdapterIntrospection {
        AdapterIntrospection { language: self.language.clone(), version: None, ready: true }
    }
}

/// A scriptable test double: globals live in an in-memory map, and
/// functions are pre-registered closures, so tests can exercise the engine's
/// qualified-call and pipe machinery without a real foreign runtime (spec
/// §8 test scenarios).
pub struct TestAdapter {
    language: String,
    globals: HashMap<String, Value>,
    functions: HashMap<String, Box<dyn Fn(&[Value]) -> SuResult<Value> + Send + Sync>>,
    ready: bool,
}

impl TestAdapter {
    #[must_use]
    pub fn new(language: impl Into<String>) -> Self {
        Self { language: language.into(), globals: HashMap::new(), functions: HashMap::new(), ready: false }
    }

    pub fn register_function(
        &mut self,
        name: impl Into<String>,
        f: impl Fn(&[Value]) -> SuResult<Value> + Send + Sync + 'static,
    ) {
        self.functions.insert(name.into(), Box::new(f));
    }

    pub fn set_global(&mut self, name: impl Into<String>, value: Value) {
        self.globals.insert(name.into(), value);
    }
}

impl RuntimeAdapter for TestAdapter {
    fn initialize(&mut self) -> SuResult<()> {
        self.ready = true;
        Ok(())
    }

    fn is_ready(&self) -> bool {
        self.ready
    }

    fn eval(&mut self, source: &str) -> SuResult<Value> {
        self.get_variable(source)
    }

    fn call_function(&mut self, name: &str, args: &[Value]) -> SuResult<Value> {
        match self.functions.get(name) {
            Some(f) => f(args),
            None => Err(crate::error::Error::foreign_runtime(
                &self.language,
                format!("NameError: name '{name}' is not defined"),
            )),
        }
    }

    fn call_function_multi(&mut self, name: &str, args: &[Value]) -> SuResult<Vec<Value>> {
        Ok(vec![self.call_function(name, args)?])
    }

    fn get_variable(&mut self, name: &str) -> SuResult<Value> {
        self.globals.get(name).cloned().ok_or_else(|| {
            crate::error::Error::foreign_runtime(&self.language, format!("NameError: name '{name}' is not defined"))
        })
    }

    fn set_variable(&mut self, name: &str, value: Value) -> SuResult<()> {
        self.globals.insert(name.to_string(), value);
        Ok(())
    }

    fn execute_batch(&mut self, _source: &str) -> SuResult<()> {
        Ok(())
    }

    fn execute_code_block_with_variables(
        &mut self,
        _source: &str,
        inputs: &VariableBindings,
        exported_names: &[String],
    ) -> SuResult<VariableBindings> {
        for (name, value) in inputs {
            self.globals.insert(name.clone(), value.clone());
        }
        Ok(exported_names
            .iter()
            .map(|name| (name.clone(), self.globals.get(name).cloned().unwrap_or(Value::Nil)))
            .collect())
    }

    fn cleanup(&mut self) -> SuResult<()> {
        self.globals.clear();
        Ok(())
    }

    fn isolate(&self) -> Box<dyn RuntimeAdapter> {
        let mut clone = TestAdapter::new(self.language.clone());
        clone.ready = self.ready;
        clone.globals = self.globals.clone();
        Box::new(clone)
    }

    fn introspection(&self) -> AdapterIntrospection {
        AdapterIntrospection { language: self.language.clone(), version: Some("test-double".into()), ready: self.ready }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_bigint::BigInt;

    #[test]
    fn null_adapter_always_returns_nil() {
        let mut a = NullAdapter::new("lua");
        assert!(matches!(a.eval("1+1").unwrap(), Value::Nil));
    }

    #[test]
    fn test_adapter_calls_registered_function() {
        let mut a = TestAdapter::new("py");
        a.register_function("double", |args| match &args[0] {
            Value::Int(n) => Ok(Value::Int(n * 2)),
            _ => Ok(Value::Nil),
        });
        let result = a.call_function("double", &[Value::Int(BigInt::from(21))]).unwrap();
        match result {
            Value::Int(n) => assert_eq!(n, BigInt::from(42)),
            _ => panic!("expected int"),
        }
    }

    #[test]
    fn test_adapter_unbound_name_is_foreign_runtime_error() {
        let mut a = TestAdapter::new("py");
        let err = a.get_variable("missing").unwrap_err();
        assert_eq!(err.kind, crate::error::ErrorKind::ForeignRuntime);
    }

    #[test]
    fn isolate_copies_globals_without_sharing_state() {
        let mut a = TestAdapter::new("lua");
        a.set_global("x", Value::Bool(true));
        let mut copy = a.isolate();
        copy.set_variable("x", Value::Bool(false)).unwrap();
        assert!(matches!(a.get_variable("x").unwrap(), Value::Bool(true)));
    }
}
