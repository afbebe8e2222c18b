//! Testing infrastructure for kmo integration tests.
//!
//! - `StubEngine`: scriptable engine handle that records every call
//! - `fixtures`: raw version identifiers and canned result sets
//! - `assertions`: table and call-log assertions
//! - `TestWorld`: isolated environment for running the `kmo` binary

pub mod assertions;
pub mod fixtures;
pub mod stub;
pub mod world;

pub use stub::{RecordedCall, StubEngine};
pub use world::{CliResult, TestWorld};
