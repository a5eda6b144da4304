//! Implementation of the `tessera merge` command.
//!
//! Stored fragments are merged first, then files, in command-line order.
//! Scalars and mappings follow later-wins; sequences are replaced unless
//! their path was passed to `--concat`.

use tracing::{debug, instrument};

use tessera_adapters::fragment_loader::read_document;
use tessera_core::{
    application::FragmentService,
    domain::{ConfigDocument, Fragment, MergePolicy, OverridePath, ShapeMismatch, merge},
};

use crate::{
    cli::{GlobalArgs, MergeArgs},
    commands::{build_store, emit, override_set},
    config::AppConfig,
    error::{ArtifactContext, CliResult},
    output::OutputManager,
};

#[instrument(skip_all, fields(fragments = args.fragments.len(), files = args.files.len()))]
pub fn execute(
    args: MergeArgs,
    global: GlobalArgs,
    config: AppConfig,
    output: OutputManager,
) -> CliResult<()> {
    let mut fragments = if args.fragments.is_empty() {
        Vec::new()
    } else {
        FragmentService::new(Box::new(build_store(&global, &config)?)).resolve(&args.fragments)?
    };

    for path in &args.files {
        let document = read_document(path)?;
        fragments.push(Fragment::new(path.display().to_string(), document));
    }

    let document = merge_all(&args, &fragments).for_artifact("merged document")?;
    emit(document, &args.emit, &config, &output)
}

/// Merge in order, then apply `--set`/`--unset`.
fn merge_all(args: &MergeArgs, fragments: &[Fragment]) -> CliResult<ConfigDocument> {
    let policy = merge_policy(&args.concat, args.wrap)?;
    let merged = merge(fragments, &policy)?;
    debug!(keys = merged.len(), "documents merged");

    Ok(override_set(&args.overrides)?.apply_to(merged)?)
}

fn merge_policy(concat: &[String], wrap: bool) -> CliResult<MergePolicy> {
    let mut policy = MergePolicy::new();
    for path in concat {
        policy = policy.concat_path(OverridePath::parse(path)?);
    }
    if wrap {
        policy = policy.on_shape_mismatch(ShapeMismatch::Wrap);
    }
    Ok(policy)
}
