//! The execution engine's view of the Runtime Adapter Interface (spec §4.K,
//! §4.L.2, §5): a named table of adapters, plus the per-call timeout and
//! `js`→`node` aliasing the engine needs on every call.
//!
//! A call runs on a worker thread for the duration of the configured
//! timeout (spec §5: "each adapter call runs under a configurable
//! wall-clock timeout"). If the call doesn't return in time the adapter is
//! left unavailable afterward — there's no safe way to reclaim an
//! interpreter that might still be running in the background, so a timeout
//! here is terminal for that adapter rather than a retryable hiccup.

use std::collections::HashMap;
use std::sync::Mutex;
use std::thread;
use std::time::Duration;

use crate::adapter::{AdapterIntrospection, RuntimeAdapter, VariableBindings};
use crate::error::{Error, ErrorKind, SuResult};
use crate::value::Value;

/// Default per-adapter-call timeout (spec §5).
pub const DEFAULT_ADAPTER_TIMEOUT: Duration = Duration::from_secs(30);

struct Slot {
    adapter: Mutex<Option<Box<dyn RuntimeAdapter>>>,
}

/// Owns every registered language adapter.
pub struct AdapterRegistry {
    slots: HashMap<String, Slot>,
    timeout: Duration,
}

impl AdapterRegistry {
    #[must_use]
    pub fn new(timeout: Duration) -> Self {
        Self { slots: HashMap::new(), timeout }
    }

    pub fn register(&mut self, language: impl Into<String>, adapter: Box<dyn RuntimeAdapter>) {
        self.slots.insert(language.into(), Slot { adapter: Mutex::new(Some(adapter)) });
    }

    /// `js` is an alias for `node` (spec §4.L.2).
    fn canonical(language: &str) -> &str {
        if language == "js" { "node" } else { language }
    }

    fn slot(&self, language: &str) -> SuResult<&Slot> {
        self.slots
            .get(Self::canonical(language))
            .ok_or_else(|| Error::new(ErrorKind::AdapterUnavailable, format!("no adapter registered for '{language}'")))
    }

    /// Runs `op` against the named adapter under the configured timeout,
    /// moving the adapter instance onto a dedicated worker thread for the
    /// call's duration.
    fn with_adapter<T, F>(&self, language: &str, op: F) -> SuResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut dyn RuntimeAdapter) -> SuResult<T> + Send + 'static,
    {
        let slot = self.slot(language)?;
        let mut adapter = {
            let mut guard = slot.adapter.lock().expect("adapter lock poisoned");
            guard.take().ok_or_else(|| {
                Error::new(
                    ErrorKind::AdapterUnavailable,
                    format!("adapter '{language}' timed out previously and is no longer available"),
                )
            })?
        };

        let (tx, rx) = std::sync::mpsc::channel();
        thread::spawn(move || {
            let result = op(adapter.as_mut());
            let _ = tx.send((adapter, result));
        });

        match rx.recv_timeout(self.timeout) {
            Ok((adapter, result)) => {
                *slot.adapter.lock().expect("adapter lock poisoned") = Some(adapter);
                result
            }
            Err(_) => Err(Error::new(ErrorKind::Timeout, format!("adapter '{language}' call exceeded its timeout"))),
        }
    }

    pub fn initialize(&self, language: &str) -> SuResult<()> {
        self.with_adapter(language, |a| a.initialize())
    }

    pub fn call_function(&self, language: &str, name: &str, args: Vec<Value>) -> SuResult<Value> {
        let name = name.to_string();
        self.with_adapter(language, move |a| a.call_function(&name, &args))
    }

    pub fn call_function_multi(&self, language: &str, name: &str, args: Vec<Value>) -> SuResult<Vec<Value>> {
        let name = name.to_string();
        self.with_adapter(language, move |a| a.call_function_multi(&name, &args))
    }

    pub fn get_variable(&self, language: &str, name: &str) -> SuResult<Value> {
        let name = name.to_string();
        self.with_adapter(language, move |a| a.get_variable(&name))
    }

    pub fn set_variable(&self, language: &str, name: &str, value: Value) -> SuResult<()> {
        let name = name.to_string();
        self.with_adapter(language, move |a| a.set_variable(&name, value))
    }

    pub fn execute_batch(&self, language: &str, source: &str) -> SuResult<()> {
        let source = source.to_string();
        self.with_adapter(language, move |a| a.execute_batch(&source))
    }

    pub fn execute_code_block_with_variables(
        &self,
        language: &str,
        source: &str,
        inputs: VariableBindings,
        exported_names: Vec<String>,
    ) -> SuResult<VariableBindings> {
        let source = source.to_string();
        self.with_adapter(language, move |a| a.execute_code_block_with_variables(&source, &inputs, &exported_names))
    }

    pub fn introspection(&self, language: &str) -> SuResult<AdapterIntrospection> {
        self.with_adapter(language, |a| Ok(a.introspection()))
    }

    /// Returns a fresh, independent adapter instance for a background job
    /// (spec §4.M): the job runs against its own clone so it never contends
    /// with the caller's in-flight call.
    pub fn isolate(&self, language: &str) -> SuResult<Box<dyn RuntimeAdapter>> {
        let slot = self.slot(language)?;
        let guard = slot.adapter.lock().expect("adapter lock poisoned");
        match guard.as_ref() {
            Some(a) => Ok(a.isolate()),
            None => Err(Error::new(ErrorKind::AdapterUnavailable, format!("adapter '{language}' is unavailable"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::TestAdapter;
    use num_bigint::BigInt;

    fn registry() -> AdapterRegistry {
        let mut reg = AdapterRegistry::new(Duration::from_secs(1));
        let mut py = TestAdapter::new("py");
        py.register_function("double", |args| match &args[0] {
            Value::Int(n) => Ok(Value::Int(n * 2)),
            _ => Ok(Value::Nil),
        });
        reg.register("py", Box::new(py));
        reg
    }

    #[test]
    fn call_function_routes_to_the_named_adapter() {
        let reg = registry();
        let result = reg.call_function("py", "double", vec![Value::Int(BigInt::from(21))]).unwrap();
        match result {
            Value::Int(n) => assert_eq!(n, BigInt::from(42)),
            _ => panic!("expected int"),
        }
    }

    #[test]
    fn js_aliases_node() {
        let mut reg = AdapterRegistry::new(Duration::from_secs(1));
        reg.register("node", Box::new(crate::adapter::NullAdapter::new("node")));
        assert!(reg.call_function("js", "f", vec![]).is_ok());
    }

    #[test]
    fn unregistered_language_is_adapter_unavailable() {
        let reg = registry();
        let err = reg.call_function("go", "f", vec![]).unwrap_err();
        assert_eq!(err.kind, ErrorKind::AdapterUnavailable);
    }

    #[test]
    fn adapter_is_reusable_after_a_successful_call() {
        let reg = registry();
        reg.call_function("py", "double", vec![Value::Int(BigInt::from(1))]).unwrap();
        assert!(reg.call_function("py", "double", vec![Value::Int(BigInt::from(2))]).is_ok());
    }
}
