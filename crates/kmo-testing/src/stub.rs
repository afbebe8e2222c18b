//! Scriptable in-memory engine handle.
//!
//! Responses are routed by SQL substring: the first route whose pattern occurs
//! in the executed text answers. Unrouted text gets an empty result. Every call
//! is recorded so tests can assert on exactly what reached the "server".

use kmo_runtime::{EngineHandle, HandleError, RawResult};
use kmo_types::{Parameter, RawVersion};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

/// One `execute_text` call as received by the stub
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub sql: String,
    pub parameters: Vec<Parameter>,
}

impl RecordedCall {
    pub fn parameter(&self, name: &str) -> Option<&Parameter> {
        self.parameters.iter().find(|p| p.name == name)
    }
}

struct Route {
    pattern: String,
    response: Result<RawResult, HandleError>,
}

pub struct StubEngine {
    version: Mutex<Result<RawVersion, HandleError>>,
    routes: Vec<Route>,
    calls: Mutex<Vec<RecordedCall>>,
    version_reads: AtomicUsize,
}

impl StubEngine {
    pub fn new(version: RawVersion) -> Self {
        Self {
            version: Mutex::new(Ok(version)),
            routes: Vec::new(),
            calls: Mutex::new(Vec::new()),
            version_reads: AtomicUsize::new(0),
        }
    }

    /// Answer any SQL containing `pattern` with `result`.
    pub fn with_result(mut self, pattern: impl Into<String>, result: RawResult) -> Self {
        self.routes.push(Route {
            pattern: pattern.into(),
            response: Ok(result),
        });
        self
    }

    /// Fail any SQL containing `pattern` with `error`.
    pub fn with_error(mut self, pattern: impl Into<String>, error: HandleError) -> Self {
        self.routes.push(Route {
            pattern: pattern.into(),
            response: Err(error),
        });
        self
    }

    /// Replace what the next version reads return.
    pub fn set_version(&self, version: Result<RawVersion, HandleError>) {
        *self.version.lock().expect("stub version lock poisoned") = version;
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().expect("stub call log poisoned").clone()
    }

    pub fn execute_count(&self) -> usize {
        self.calls.lock().expect("stub call log poisoned").len()
    }

    pub fn version_reads(&self) -> usize {
        self.version_reads.load(Ordering::SeqCst)
    }

    pub fn last_call(&self) -> Option<RecordedCall> {
        self.calls
            .lock()
            .expect("stub call log poisoned")
            .last()
            .cloned()
    }
}

impl EngineHandle for StubEngine {
    fn execute_text(
        &self,
        sql: &str,
        parameters: &[Parameter],
    ) -> Result<RawResult, HandleError> {
        self.calls
            .lock()
            .expect("stub call log poisoned")
            .push(RecordedCall {
                sql: sql.to_string(),
                parameters: parameters.to_vec(),
            });

        self.routes
            .iter()
            .find(|route| sql.contains(&route.pattern))
            .map(|route| route.response.clone())
            .unwrap_or_else(|| Ok(RawResult::empty()))
    }

    fn raw_version_identifiers(&self) -> Result<RawVersion, HandleError> {
        self.version_reads.fetch_add(1, Ordering::SeqCst);
        self.version
            .lock()
            .expect("stub version lock poisoned")
            .clone()
    }
}
