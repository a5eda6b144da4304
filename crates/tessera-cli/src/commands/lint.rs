//! Implementation of the `tessera lint` command.

use tracing::{debug, instrument};

use tessera_adapters::fragment_loader::read_document;
use tessera_core::{
    application::FragmentService,
    domain::{ConfigDocument, Fragment, LintConfigAssembler, ShapeMismatch},
};

use crate::{
    cli::{GlobalArgs, LintArgs},
    commands::{build_store, emit, override_entries},
    config::AppConfig,
    error::{ArtifactContext, CliResult},
    output::OutputManager,
};

#[instrument(skip_all, fields(quality = %args.quality, formatting = %args.formatting))]
pub fn execute(
    args: LintArgs,
    global: GlobalArgs,
    config: AppConfig,
    output: OutputManager,
) -> CliResult<()> {
    let service = FragmentService::new(Box::new(build_store(&global, &config)?));
    let document = assemble(&args, &service).for_artifact("lint config")?;
    emit(document, &args.emit, &config, &output)
}

/// Base pair, then `--with` fragments, then `--with-file` documents.
fn assemble(args: &LintArgs, service: &FragmentService) -> CliResult<ConfigDocument> {
    let quality = service.get(&args.quality)?;
    let formatting = service.get(&args.formatting)?;

    let mut assembler =
        LintConfigAssembler::new(quality, formatting).inherit_base(args.inherit_base);
    if args.wrap {
        assembler = assembler.on_shape_mismatch(ShapeMismatch::Wrap);
    }

    for fragment in service.resolve(&args.with)? {
        assembler.add_fragment(fragment);
    }
    for path in &args.with_files {
        let document = read_document(path)?;
        assembler.add_fragment(Fragment::new(path.display().to_string(), document));
    }
    for (path, value) in override_entries(&args.overrides)? {
        assembler.add_override(&path, value)?;
    }

    debug!(fragments = assembler.fragments().len(), "lint fragments collected");
    Ok(assembler.assemble()?)
}
