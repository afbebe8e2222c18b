pub mod catalog;
pub mod compose;
pub mod config;
pub mod version;

use anyhow::{Context, Result};
use serde::Serialize;

pub(crate) fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{}", json);
    Ok(())
}

/// Parse "13.0" or "13.0.5026.0" into a capability set.
pub(crate) fn capabilities_for(version: &str) -> Result<kmo_types::CapabilitySet> {
    let (major, minor) = kmo_engine::parse_major_minor(version)
        .with_context(|| format!("Invalid engine version '{}': expected MAJOR.MINOR", version))?;
    Ok(kmo_types::CapabilitySet::for_version(major, minor))
}
