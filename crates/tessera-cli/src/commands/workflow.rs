//! Implementation of the `tessera workflow` command.
//!
//! Builds a one-job workflow. Flags win over `[workflow]` config values.
//! The dependency cache key is derived from the SHA-256 of the lockfile.

use std::path::Path;

use sha2::{Digest, Sha256};
use tracing::{debug, info, instrument, warn};

use tessera_core::{
    application::FragmentService,
    domain::{
        CacheState, CiJobAssembler, ConfigDocument, DependencyCache, Fragment, PackageManager,
        Runtime, Trigger, WorkflowAssembler,
    },
};

use crate::{
    cli::{DocumentFormat, GlobalArgs, TriggerEvent, WorkflowArgs},
    commands::{build_store, emit, override_entries, split_assignment},
    config::AppConfig,
    error::{ArtifactContext, CliError, CliResult, IntoCli},
    output::OutputManager,
};

#[instrument(skip_all, fields(workflow = %args.name, job = %args.job))]
pub fn execute(
    mut args: WorkflowArgs,
    global: GlobalArgs,
    config: AppConfig,
    output: OutputManager,
) -> CliResult<()> {
    let fragments = if args.job_fragments.is_empty() {
        Vec::new()
    } else {
        FragmentService::new(Box::new(build_store(&global, &config)?))
            .resolve(&args.job_fragments)?
    };

    let cwd = std::env::current_dir().with_cli_context(|| "Failed to read the current directory")?;
    let document = assemble(&args, &config, fragments, &cwd).for_artifact("CI workflow")?;

    // Workflows are YAML files; print them as such unless asked otherwise.
    if args.emit.out.is_none() && args.emit.format.is_none() {
        args.emit.format = Some(DocumentFormat::Yaml);
    }
    emit(document, &args.emit, &config, &output)
}

fn assemble(
    args: &WorkflowArgs,
    config: &AppConfig,
    fragments: Vec<Fragment>,
    cwd: &Path,
) -> CliResult<ConfigDocument> {
    let package_manager = match args.package_manager {
        Some(manager) => Some(manager),
        None => config
            .workflow
            .package_manager
            .as_deref()
            .map(str::parse::<PackageManager>)
            .transpose()?,
    };

    let runs_on = if args.runs_on.is_empty() {
        &config.workflow.runs_on
    } else {
        &args.runs_on
    };

    let mut job = CiJobAssembler::new(&args.job).runs_on(runs_on.iter().map(String::as_str));
    if let Some(name) = &args.job_name {
        job = job.name(name);
    }
    for capability in &args.capabilities {
        job = job.capability(*capability);
    }
    for (runtime, version) in resolve_runtimes(args, config, package_manager) {
        job = job.runtime(runtime, version.as_deref());
    }
    if let Some(manager) = package_manager {
        job = job.package_manager(manager);
        if let Some(cache) = dependency_cache(args, manager, cwd)? {
            job = job.cache(cache);
        }
    } else if args.lockfile.is_some() || args.cache_hit.is_some() {
        return Err(CliError::InvalidInput {
            message: "--lockfile and --cache-hit need a package manager".into(),
            source: None,
        });
    }
    for command in &args.run {
        job = job.command(command);
    }
    for raw in &args.env {
        let (key, value) = split_assignment("--env", raw, "KEY=VALUE")?;
        job = job.env(key, value);
    }
    for fragment in fragments {
        job = job.with_fragment(fragment);
    }

    let mut workflow = args
        .on
        .iter()
        .fold(WorkflowAssembler::new(&args.name), |workflow, event| {
            workflow.on(trigger(*event, &args.branches))
        });
    workflow.add_job(job)?;
    for (path, value) in override_entries(&args.overrides)? {
        workflow.add_override(&path, value)?;
    }

    Ok(workflow.assemble()?)
}

/// Explicit runtimes, or Node when only a package manager was named.
/// Unpinned Node takes `workflow.node_version` from config.
fn resolve_runtimes(
    args: &WorkflowArgs,
    config: &AppConfig,
    package_manager: Option<PackageManager>,
) -> Vec<(Runtime, Option<String>)> {
    let node_version = config.workflow.node_version.clone();
    if args.runtimes.is_empty() {
        return package_manager
            .map(|_| vec![(Runtime::Node, node_version)])
            .unwrap_or_default();
    }

    args.runtimes
        .iter()
        .map(|(runtime, version)| match (runtime, version) {
            (Runtime::Node, None) => (Runtime::Node, node_version.clone()),
            _ => (*runtime, version.clone()),
        })
        .collect()
}

fn dependency_cache(
    args: &WorkflowArgs,
    manager: PackageManager,
    cwd: &Path,
) -> CliResult<Option<DependencyCache>> {
    if args.no_cache {
        return Ok(None);
    }

    let lockfile = match &args.lockfile {
        Some(path) => path.clone(),
        None => {
            let default = cwd.join(manager.lockfile());
            if !default.is_file() {
                if args.cache_hit.is_some() {
                    return Err(CliError::InvalidInput {
                        message: format!(
                            "--cache-hit needs a lockfile, and {} was not found",
                            manager.lockfile()
                        ),
                        source: None,
                    });
                }
                warn!(lockfile = manager.lockfile(), "no lockfile found, dependency cache disabled");
                return Ok(None);
            }
            default
        }
    };

    let hash = hash_lockfile(&lockfile)?;
    let state = args.cache_hit.map(CacheState::from_hit).unwrap_or_default();
    info!(lockfile = %lockfile.display(), state = ?state, "dependency cache configured");
    Ok(Some(DependencyCache::new(hash, state)))
}

/// Hex-encoded SHA-256 of the lockfile contents.
fn hash_lockfile(path: &Path) -> CliResult<String> {
    let bytes = std::fs::read(path)
        .with_cli_context(|| format!("Failed to read lockfile '{}'", path.display()))?;

    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    let hash = hex::encode(hasher.finalize());
    debug!(path = %path.display(), hash = %hash, "lockfile hashed");
    Ok(hash)
}

fn trigger(event: TriggerEvent, branches: &[String]) -> Trigger {
    let branches = branches.to_vec();
    match event {
        TriggerEvent::Push => Trigger::Push { branches },
        TriggerEvent::PullRequest => Trigger::PullRequest { branches },
        TriggerEvent::Dispatch => Trigger::WorkflowDispatch,
    }
}
