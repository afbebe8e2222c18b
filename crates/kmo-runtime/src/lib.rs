// Runtime layer - everything that touches an engine handle
// Composition stays in kmo-engine; this crate executes, normalizes and caches per handle

pub mod client;
pub mod config;
pub mod error;
pub mod executor;
pub mod handle;
pub mod normalize;

pub use client::Diagnostics;
pub use config::{Config, resolve_config_path};
pub use error::{Error, Result};
pub use handle::{EngineHandle, HandleError, HandleErrorKind, RawColumn, RawResult, RawValue};
