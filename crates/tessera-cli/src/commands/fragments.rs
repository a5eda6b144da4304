//! Implementation of the `tessera fragments` commands.

use serde_json::json;

use tessera_adapters::StructuredSerializer;
use tessera_core::application::{ApplicationError, FragmentInfo, FragmentService};

use crate::{
    cli::{FragmentCommands, GlobalArgs, ListFormat},
    commands::build_store,
    config::AppConfig,
    error::{CliError, CliResult},
    output::OutputManager,
};

pub fn execute(
    cmd: FragmentCommands,
    global: GlobalArgs,
    config: AppConfig,
    output: OutputManager,
) -> CliResult<()> {
    let service = FragmentService::new(Box::new(build_store(&global, &config)?));

    match cmd {
        FragmentCommands::List { format } => {
            let fragments = service.list()?;
            list(&fragments, format, &output)
        }
        FragmentCommands::Show { name, format } => {
            let fragment = service.get(&name)?;
            let content = StructuredSerializer::render(format.into(), fragment.document())
                .map_err(|reason| {
                    CliError::Core(
                        ApplicationError::SerializationFailed {
                            artifact: name.clone(),
                            reason,
                        }
                        .into(),
                    )
                })?;
            output.document(&content)?;
            Ok(())
        }
    }
}

fn list(fragments: &[FragmentInfo], format: ListFormat, output: &OutputManager) -> CliResult<()> {
    match format {
        ListFormat::Table => {
            output.header("Available Fragments:")?;
            let width = fragments.iter().map(|f| f.name.len()).max().unwrap_or(0);
            for fragment in fragments {
                output.print(&format!(
                    "  {:<width$}  {}",
                    fragment.name,
                    fragment.keys.join(", "),
                ))?;
            }
        }
        ListFormat::List => {
            // One name per line for scripts; not subject to --quiet.
            let names: Vec<&str> = fragments.iter().map(|f| f.name.as_str()).collect();
            if !names.is_empty() {
                output.document(&format!("{}\n", names.join("\n")))?;
            }
        }
        ListFormat::Json => {
            let entries: Vec<_> = fragments
                .iter()
                .map(|f| json!({"name": f.name, "keys": f.keys}))
                .collect();
            output.json(&json!(entries))?;
        }
    }
    Ok(())
}
