use crate::handlers::{capabilities_for, print_json};
use crate::types::OutputFormat;
use anyhow::Result;
use kmo_engine::catalog;
use serde::Serialize;

#[derive(Serialize)]
struct CatalogEntry {
    id: String,
    display_name: &'static str,
    required_capability: Option<String>,
    min_version: Option<String>,
    option_fields: &'static [&'static str],
    #[serde(skip_serializing_if = "Option::is_none")]
    available: Option<bool>,
}

pub fn handle(engine_version: Option<&str>, format: OutputFormat) -> Result<()> {
    let capabilities = engine_version.map(capabilities_for).transpose()?;

    let entries: Vec<CatalogEntry> = catalog::all()
        .iter()
        .map(|op| CatalogEntry {
            id: op.id.to_string(),
            display_name: op.display_name,
            required_capability: op.required_capability.map(|c| c.to_string()),
            min_version: op.min_version().map(|v| v.to_string()),
            option_fields: op.option_schema.fields(),
            available: capabilities.as_ref().map(|caps| {
                op.required_capability
                    .is_none_or(|required| caps.supports(required))
            }),
        })
        .collect();

    match format {
        OutputFormat::Json => print_json(&entries),
        OutputFormat::Plain => {
            for entry in &entries {
                let since = entry.min_version.as_deref().unwrap_or("any");
                let marker = match entry.available {
                    Some(true) => "  ",
                    Some(false) => "x ",
                    None => "",
                };
                println!(
                    "{}{:<20} {:<20} since {:<6} {}",
                    marker,
                    entry.id,
                    entry.display_name,
                    since,
                    entry.option_fields.join(", ")
                );
            }
            Ok(())
        }
    }
}
