//! Implementation of the `tessera codegen` command.
//!
//! Output-keyed flags take `OUTPUT=VALUE`. The output name is used verbatim,
//! so `src/types.ts` needs no escaping. An empty `VALUE` removes the key.

use tracing::instrument;

use tessera_adapters::fragment_loader::read_document;
use tessera_core::domain::{
    ArtifactFormat, CodegenConfigAssembler, ConfigDocument, ConfigNode, DomainResult,
};

use crate::{
    cli::{CodegenArgs, GlobalArgs},
    commands::{emit, override_entries, parse_value, split_assignment},
    config::AppConfig,
    error::{ArtifactContext, CliResult},
    output::OutputManager,
};

type OutputOverride = for<'a, 'b> fn(
    &'a mut CodegenConfigAssembler,
    &'b str,
    Option<ConfigNode>,
) -> DomainResult<&'a mut CodegenConfigAssembler>;

#[instrument(skip_all, fields(base = %args.base.display()))]
pub fn execute(
    mut args: CodegenArgs,
    _global: GlobalArgs,
    config: AppConfig,
    output: OutputManager,
) -> CliResult<()> {
    let base = read_document(&args.base)?;
    let document = assemble(&args, base).for_artifact("codegen config")?;

    // Print in the base document's format unless asked otherwise.
    if args.emit.out.is_none() && args.emit.format.is_none() {
        args.emit.format = ArtifactFormat::from_path(&args.base).map(Into::into);
    }
    emit(document, &args.emit, &config, &output)
}

fn assemble(args: &CodegenArgs, base: ConfigDocument) -> CliResult<ConfigDocument> {
    let mut assembler = CodegenConfigAssembler::new(base);

    if let Some(schema) = &args.schema {
        assembler.override_schema(optional_value(schema));
    }
    if let Some(overwrite) = args.overwrite {
        assembler.override_overwrite(Some(overwrite));
    }

    let keyed: [(&'static str, &[String], OutputOverride); 5] = [
        ("--documents", &args.documents, CodegenConfigAssembler::override_documents_for_output),
        ("--plugins", &args.plugins, CodegenConfigAssembler::override_plugins_for_output),
        ("--output-config", &args.output_config, CodegenConfigAssembler::override_config_for_output),
        ("--preset", &args.preset, CodegenConfigAssembler::override_preset_for_output),
        (
            "--preset-config",
            &args.preset_config,
            CodegenConfigAssembler::override_preset_config_for_output,
        ),
    ];
    for (flag, entries, apply) in keyed {
        for raw in entries {
            let (output, value) = split_assignment(flag, raw, "OUTPUT=VALUE")?;
            apply(&mut assembler, output, optional_value(value))?;
        }
    }

    for (path, value) in override_entries(&args.overrides)? {
        assembler.add_override(&path, value)?;
    }

    Ok(assembler.synthesize()?)
}

fn optional_value(raw: &str) -> Option<ConfigNode> {
    (!raw.is_empty()).then(|| parse_value(raw))
}
