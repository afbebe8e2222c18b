use crate::args::OptionArgs;
use crate::handlers::{capabilities_for, print_json};
use crate::options;
use crate::types::OutputFormat;
use anyhow::Result;
use kmo_engine::Defaults;
use kmo_types::{Capability, OperationId};
use tracing::debug;

pub fn handle(
    operation: OperationId,
    engine_version: &str,
    ole_automation: bool,
    args: &OptionArgs,
    defaults: &Defaults,
    format: OutputFormat,
) -> Result<()> {
    let capabilities = capabilities_for(engine_version)?.with_ole_automation(ole_automation);
    debug!(
        detected = %capabilities.detected(),
        ole_automation = capabilities.supports(Capability::OleAutomation),
        "composing offline"
    );

    let options = options::build(operation, defaults, args)?;
    let query = kmo_engine::compose(operation, &options, &capabilities)?;

    match format {
        OutputFormat::Json => print_json(&query),
        OutputFormat::Plain => {
            println!("-- {}", operation);
            if !query.parameters.is_empty() {
                println!("-- parameters: {}", query.parameter_declarations());
                for parameter in &query.parameters {
                    println!("--   {} = {}", parameter.name, parameter.value);
                }
            }
            println!("{}", query.text);
            Ok(())
        }
    }
}
