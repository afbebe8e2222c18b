use crate::handlers::{capabilities_for, print_json};
use crate::types::OutputFormat;
use anyhow::Result;
use kmo_engine::version_name;
use serde::Serialize;

#[derive(Serialize)]
struct VersionView {
    version: String,
    name: &'static str,
    capabilities: Vec<String>,
}

pub fn handle(version: &str, format: OutputFormat) -> Result<()> {
    let capabilities = capabilities_for(version)?;
    let detected = capabilities.detected();

    let view = VersionView {
        version: detected.to_string(),
        name: version_name(detected.major, detected.minor),
        capabilities: capabilities.iter().map(|c| c.to_string()).collect(),
    };

    match format {
        OutputFormat::Json => print_json(&view),
        OutputFormat::Plain => {
            println!("{}", view.name);
            Ok(())
        }
    }
}
