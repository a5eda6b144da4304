//! CLI argument definitions using the clap derive API.
//!
//! This module is the *only* place that knows about argument names, aliases,
//! help text, and value enums.  No business logic lives here.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use tessera_core::domain::{ArtifactFormat, Capability, PackageManager, Runtime};

pub mod global;
pub use global::{GlobalArgs, OutputFormat};

// ── Top-level CLI ─────────────────────────────────────────────────────────────

/// Main CLI entry-point.
#[derive(Debug, Parser)]
#[command(
    name    = "tessera",
    bin_name = "tessera",
    version  = env!("CARGO_PKG_VERSION"),
    author   = env!("CARGO_PKG_AUTHORS"),
    about    = "Compose generated configuration files from fragments",
    long_about = "tessera merges partial configuration fragments into lint configs, \
                  CI workflows and codegen specs, with deterministic precedence and \
                  path-based overrides.",
    after_help = "EXAMPLES:\n\
        \x20 tessera lint --with lint/react --out .eslintrc.json\n\
        \x20 tessera workflow --runtime node --package-manager npm --run 'npm test'\n\
        \x20 tessera codegen codegen.yml --documents 'src/types.ts=\"src/**/*.ts\"'\n\
        \x20 tessera merge base.json extra.yaml --concat extends",
    arg_required_else_help = true,
    subcommand_required    = true,
)]
pub struct Cli {
    /// Flags available on every subcommand.
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

// ── Subcommands ───────────────────────────────────────────────────────────────

/// All available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Deep-merge documents and fragments in order.
    #[command(
        visible_alias = "m",
        about = "Merge documents and fragments",
        after_help = "EXAMPLES:\n\
            \x20 tessera merge a.json b.yaml\n\
            \x20 tessera merge -f lint/quality -f lint/react --concat extends --concat plugins\n\
            \x20 tessera merge base.toml --set server.port=8080 --out merged.toml"
    )]
    Merge(MergeArgs),

    /// Assemble a lint configuration.
    #[command(
        about = "Assemble a lint configuration",
        after_help = "EXAMPLES:\n\
            \x20 tessera lint\n\
            \x20 tessera lint --with lint/typescript --with lint/react --out .eslintrc.json\n\
            \x20 tessera lint --inherit-base --with lint/jest --out packages/app/.eslintrc.json"
    )]
    Lint(LintArgs),

    /// Assemble a CI workflow with a single job.
    #[command(
        visible_alias = "ci",
        about = "Assemble a CI workflow",
        after_help = "EXAMPLES:\n\
            \x20 tessera workflow --runtime node@20.x --package-manager pnpm --run 'pnpm test'\n\
            \x20 tessera workflow --capability publish-packages --run 'npm publish' \\\n\
            \x20     --out .github/workflows/release.yml"
    )]
    Workflow(WorkflowArgs),

    /// Apply named overrides to a codegen configuration.
    #[command(
        about = "Override a codegen configuration",
        after_help = "EXAMPLES:\n\
            \x20 tessera codegen codegen.yml --documents 'out.ts=\"src/**/*.ts\"'\n\
            \x20 tessera codegen codegen.yml --plugins 'out.ts=[\"typescript\"]' --out codegen.yml --force"
    )]
    Codegen(CodegenArgs),

    /// Inspect available fragments.
    #[command(
        about = "List and show fragments",
        subcommand,
        after_help = "EXAMPLES:\n\
            \x20 tessera fragments list\n\
            \x20 tessera fragments show lint/react --format yaml"
    )]
    Fragments(FragmentCommands),

    /// Initialise a tessera configuration file.
    #[command(
        about = "Initialise configuration",
        after_help = "EXAMPLES:\n\
            \x20 tessera init           # default location\n\
            \x20 tessera init --local   # .tessera.toml in CWD"
    )]
    Init(InitArgs),

    /// Generate shell completion scripts.
    #[command(
        about = "Generate shell completions",
        after_help = "EXAMPLES:\n\
            \x20 tessera completions bash > ~/.local/share/bash-completion/completions/tessera\n\
            \x20 tessera completions zsh  > ~/.zfunc/_tessera\n\
            \x20 tessera completions fish > ~/.config/fish/completions/tessera.fish"
    )]
    Completions(CompletionsArgs),

    /// Inspect the tessera configuration.
    #[command(
        about = "Configuration management",
        subcommand,
        after_help = "EXAMPLES:\n\
            \x20 tessera config get workflow.package_manager\n\
            \x20 tessera config list\n\
            \x20 tessera config path"
    )]
    Config(ConfigCommands),
}

// ── shared argument groups ────────────────────────────────────────────────────

/// Path overrides applied to the finished document.
#[derive(Debug, Clone, Default, Args)]
pub struct OverrideArgs {
    /// Set a value. `VALUE` is parsed as JSON and falls back to a plain
    /// string. Escape literal dots in keys as `\.`.
    #[arg(long = "set", value_name = "PATH=VALUE", help = "Set a value at a path")]
    pub set: Vec<String>,

    /// Remove a key. Applied after every `--set`.
    #[arg(long = "unset", value_name = "PATH", help = "Remove the value at a path")]
    pub unset: Vec<String>,
}

/// Where and how the finished document is written.
#[derive(Debug, Clone, Default, Args)]
pub struct EmitArgs {
    /// Output file, relative to the current directory. Prints to stdout when
    /// omitted.
    #[arg(short = 'o', long = "out", value_name = "FILE", help = "Write to this file")]
    pub out: Option<PathBuf>,

    /// Document format. Inferred from `--out` when omitted.
    #[arg(long = "format", value_enum, help = "Document format")]
    pub format: Option<DocumentFormat>,

    /// Replace an existing output file.
    #[arg(long = "force", help = "Overwrite an existing output file")]
    pub force: bool,

    /// Render and report without writing anything.
    #[arg(long = "dry-run", help = "Show what would be written without writing")]
    pub dry_run: bool,

    /// Leave out the generated-file comment in YAML and TOML output.
    #[arg(long = "no-marker", help = "Omit the generated-file comment")]
    pub no_marker: bool,
}

/// Serialization format of a generated document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DocumentFormat {
    Json,
    #[value(alias = "yml")]
    Yaml,
    Toml,
}

impl From<DocumentFormat> for ArtifactFormat {
    fn from(format: DocumentFormat) -> Self {
        match format {
            DocumentFormat::Json => Self::Json,
            DocumentFormat::Yaml => Self::Yaml,
            DocumentFormat::Toml => Self::Toml,
        }
    }
}

impl From<ArtifactFormat> for DocumentFormat {
    fn from(format: ArtifactFormat) -> Self {
        match format {
            ArtifactFormat::Json => Self::Json,
            ArtifactFormat::Yaml => Self::Yaml,
            ArtifactFormat::Toml => Self::Toml,
        }
    }
}

// ── merge ─────────────────────────────────────────────────────────────────────

/// Arguments for `tessera merge`.
#[derive(Debug, Args)]
pub struct MergeArgs {
    /// Documents to merge, after any `--fragment`s, in order.
    #[arg(value_name = "FILE", help = "JSON, YAML or TOML documents to merge")]
    pub files: Vec<PathBuf>,

    /// Stored fragments to merge first, in order.
    #[arg(
        short = 'f',
        long = "fragment",
        value_name = "NAME",
        help = "Fragment to merge (repeatable)"
    )]
    pub fragments: Vec<String>,

    /// Paths whose sequences are concatenated instead of replaced.
    #[arg(
        long = "concat",
        value_name = "PATH",
        help = "Concatenate sequences at this path (repeatable)"
    )]
    pub concat: Vec<String>,

    /// Wrap non-sequence values at concatenated paths instead of failing.
    #[arg(long = "wrap", help = "Wrap mismatched values into sequences")]
    pub wrap: bool,

    #[command(flatten)]
    pub overrides: OverrideArgs,

    #[command(flatten)]
    pub emit: EmitArgs,
}

// ── lint ──────────────────────────────────────────────────────────────────────

/// Arguments for `tessera lint`.
#[derive(Debug, Args)]
pub struct LintArgs {
    /// Fragment owning static-analysis rules.
    #[arg(
        long = "quality",
        value_name = "NAME",
        default_value = "lint/quality",
        help = "Quality base fragment"
    )]
    pub quality: String,

    /// Fragment owning formatting rules.
    #[arg(
        long = "formatting",
        value_name = "NAME",
        default_value = "lint/formatting",
        help = "Formatting base fragment"
    )]
    pub formatting: String,

    /// Extra fragments appended after the base pair, in order.
    #[arg(
        short = 'w',
        long = "with",
        value_name = "NAME",
        help = "Extra fragment (repeatable)"
    )]
    pub with: Vec<String>,

    /// Extra documents read from disk, appended after `--with` fragments.
    #[arg(long = "with-file", value_name = "FILE", help = "Extra document file (repeatable)")]
    pub with_files: Vec<PathBuf>,

    /// The parent config already carries the base pair; leave it out.
    #[arg(long = "inherit-base", help = "Omit the base fragments")]
    pub inherit_base: bool,

    /// Wrap non-sequence `extends`/`overrides`/`plugins` values instead of failing.
    #[arg(long = "wrap", help = "Wrap mismatched values into sequences")]
    pub wrap: bool,

    #[command(flatten)]
    pub overrides: OverrideArgs,

    #[command(flatten)]
    pub emit: EmitArgs,
}

// ── workflow ──────────────────────────────────────────────────────────────────

/// Arguments for `tessera workflow`.
#[derive(Debug, Args)]
pub struct WorkflowArgs {
    /// Workflow display name.
    #[arg(long = "name", default_value = "CI", help = "Workflow name")]
    pub name: String,

    /// Job id under `jobs`.
    #[arg(long = "job", value_name = "ID", default_value = "build", help = "Job id")]
    pub job: String,

    /// Job display name.
    #[arg(long = "job-name", value_name = "NAME", help = "Job display name")]
    pub job_name: Option<String>,

    /// Runner labels. Falls back to `workflow.runs_on` from config.
    #[arg(long = "runs-on", value_name = "LABEL", help = "Runner label (repeatable)")]
    pub runs_on: Vec<String>,

    /// Runtime to set up, optionally pinned: `node`, `node@20.x`, `python@3.11`.
    #[arg(
        long = "runtime",
        value_name = "RUNTIME[@VERSION]",
        value_parser = parse_runtime,
        help = "Runtime to set up (repeatable)"
    )]
    pub runtimes: Vec<(Runtime, Option<String>)>,

    /// Package manager used for the install step.
    #[arg(
        long = "package-manager",
        value_name = "NAME",
        value_parser = parse_package_manager,
        help = "npm, yarn or pnpm"
    )]
    pub package_manager: Option<PackageManager>,

    /// Lockfile hashed into the cache key. Defaults to the package manager's
    /// lockfile in the current directory.
    #[arg(long = "lockfile", value_name = "FILE", help = "Lockfile to hash")]
    pub lockfile: Option<PathBuf>,

    /// Known cache outcome. When omitted the install step is guarded by the
    /// cache step's output.
    #[arg(long = "cache-hit", value_name = "BOOL", help = "Known cache outcome")]
    pub cache_hit: Option<bool>,

    /// Do not add a dependency cache step.
    #[arg(long = "no-cache", conflicts_with_all = ["lockfile", "cache_hit"], help = "Disable the dependency cache")]
    pub no_cache: bool,

    /// Capabilities that raise job permissions above `contents: read`.
    #[arg(
        long = "capability",
        value_name = "NAME",
        value_parser = parse_capability,
        help = "push-commits, publish-packages, write-pull-requests or id-token"
    )]
    pub capabilities: Vec<Capability>,

    /// Commands run as steps, in order.
    #[arg(short = 'r', long = "run", value_name = "CMD", help = "Command step (repeatable)")]
    pub run: Vec<String>,

    /// Job environment variables.
    #[arg(long = "env", value_name = "KEY=VALUE", help = "Job environment variable")]
    pub env: Vec<String>,

    /// Events that trigger the workflow.
    #[arg(
        long = "on",
        value_enum,
        value_name = "EVENT",
        default_values_t = [TriggerEvent::Push, TriggerEvent::PullRequest],
        help = "Trigger event (repeatable)"
    )]
    pub on: Vec<TriggerEvent>,

    /// Branch filter for push and pull_request triggers.
    #[arg(long = "branch", value_name = "BRANCH", help = "Branch filter (repeatable)")]
    pub branches: Vec<String>,

    /// Fragments merged into the job; their `steps` are appended.
    #[arg(long = "job-fragment", value_name = "NAME", help = "Job fragment (repeatable)")]
    pub job_fragments: Vec<String>,

    #[command(flatten)]
    pub overrides: OverrideArgs,

    #[command(flatten)]
    pub emit: EmitArgs,
}

/// Workflow trigger events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TriggerEvent {
    Push,
    #[value(alias = "pr")]
    PullRequest,
    #[value(name = "dispatch", alias = "workflow-dispatch")]
    Dispatch,
}

/// Parse `runtime[@version]`.
fn parse_runtime(s: &str) -> Result<(Runtime, Option<String>), String> {
    let (name, version) = match s.split_once('@') {
        Some((name, version)) if !version.is_empty() => (name, Some(version.to_string())),
        Some(_) => return Err(format!("missing version after '@' in '{s}'")),
        None => (s, None),
    };
    let runtime = name.parse::<Runtime>().map_err(|e| e.to_string())?;
    Ok((runtime, version))
}

fn parse_package_manager(s: &str) -> Result<PackageManager, String> {
    s.parse().map_err(|e: tessera_core::domain::DomainError| e.to_string())
}

fn parse_capability(s: &str) -> Result<Capability, String> {
    s.parse().map_err(|e: tessera_core::domain::DomainError| e.to_string())
}

// ── codegen ───────────────────────────────────────────────────────────────────

/// Arguments for `tessera codegen`.
///
/// Output-keyed options take `OUTPUT=VALUE`, split at the first `=`. The
/// output name is used verbatim, dots included.
#[derive(Debug, Args)]
pub struct CodegenArgs {
    /// Base codegen document.
    #[arg(value_name = "BASE", help = "Base codegen config (JSON, YAML or TOML)")]
    pub base: PathBuf,

    /// Replace the top-level `schema`.
    #[arg(long = "schema", value_name = "VALUE", help = "Override the schema")]
    pub schema: Option<String>,

    /// Replace the top-level `overwrite` flag.
    #[arg(long = "overwrite", value_name = "BOOL", help = "Override the overwrite flag")]
    pub overwrite: Option<bool>,

    #[arg(long = "documents", value_name = "OUTPUT=VALUE", help = "Override documents for an output")]
    pub documents: Vec<String>,

    #[arg(long = "plugins", value_name = "OUTPUT=VALUE", help = "Override plugins for an output")]
    pub plugins: Vec<String>,

    /// `config` block of an output. Named `--output-config` to stay clear of
    /// the global `--config`.
    #[arg(long = "output-config", value_name = "OUTPUT=VALUE", help = "Override config for an output")]
    pub output_config: Vec<String>,

    #[arg(long = "preset", value_name = "OUTPUT=VALUE", help = "Override the preset for an output")]
    pub preset: Vec<String>,

    #[arg(long = "preset-config", value_name = "OUTPUT=VALUE", help = "Override presetConfig for an output")]
    pub preset_config: Vec<String>,

    #[command(flatten)]
    pub overrides: OverrideArgs,

    #[command(flatten)]
    pub emit: EmitArgs,
}

// ── fragments ─────────────────────────────────────────────────────────────────

/// Subcommands for `tessera fragments`.
#[derive(Debug, Subcommand)]
pub enum FragmentCommands {
    /// List built-in and user fragments.
    #[command(visible_alias = "ls")]
    List {
        #[arg(long = "format", value_enum, default_value = "table", help = "Listing format")]
        format: ListFormat,
    },
    /// Print a fragment's document.
    Show {
        /// Fragment name, e.g. `lint/react`.
        name: String,
        #[arg(long = "format", value_enum, default_value = "json", help = "Document format")]
        format: DocumentFormat,
    },
}

/// Output format for `fragments list`.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ListFormat {
    /// Human-readable table.
    Table,
    /// One name per line.
    List,
    /// JSON array.
    Json,
}

// ── init ──────────────────────────────────────────────────────────────────────

/// Arguments for `tessera init`.
#[derive(Debug, Args)]
pub struct InitArgs {
    /// Write `.tessera.toml` in the current directory instead of the user
    /// config location.
    #[arg(
        long = "local",
        help = "Create local configuration in current directory"
    )]
    pub local: bool,

    /// Overwrite an existing config file.
    #[arg(short = 'f', long = "force", help = "Overwrite existing configuration")]
    pub force: bool,
}

// ── completions ───────────────────────────────────────────────────────────────

/// Arguments for `tessera completions`.
#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Target shell.
    #[arg(value_enum, help = "Shell to generate completions for")]
    pub shell: Shell,
}

/// Supported shells for completion generation.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
    Elvish,
}

// ── config subcommands ────────────────────────────────────────────────────────

/// Subcommands for `tessera config`.
#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    /// Print the value of a configuration key.
    Get {
        /// Dotted key path, e.g. `workflow.runs_on`.
        key: String,
    },
    /// Print all configuration values.
    List,
    /// Print the path to the active configuration file.
    Path,
}

// ── tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli_structure() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parse_lint_command() {
        let cli = Cli::parse_from([
            "tessera", "lint", "--with", "lint/react", "-w", "lint/jest", "--out", ".eslintrc.json",
        ]);
        let Commands::Lint(args) = cli.command else {
            panic!("expected Lint command");
        };
        assert_eq!(args.quality, "lint/quality");
        assert_eq!(args.with, ["lint/react", "lint/jest"]);
        assert_eq!(args.emit.out, Some(PathBuf::from(".eslintrc.json")));
    }

    #[test]
    fn no_color_flag_is_global() {
        let cli = Cli::parse_from(["tessera", "fragments", "list", "--no-color"]);
        assert!(cli.global.no_color);
    }

    #[test]
    fn runtime_accepts_pinned_version() {
        assert_eq!(parse_runtime("node@18.x").unwrap(), (Runtime::Node, Some("18.x".into())));
        assert_eq!(parse_runtime("golang").unwrap(), (Runtime::Go, None));
        assert!(parse_runtime("node@").is_err());
        assert!(parse_runtime("ruby").is_err());
    }

    #[test]
    fn workflow_defaults_to_push_and_pull_request() {
        let cli = Cli::parse_from(["tessera", "workflow", "--run", "make"]);
        let Commands::Workflow(args) = cli.command else {
            panic!("expected Workflow command");
        };
        assert_eq!(args.on, [TriggerEvent::Push, TriggerEvent::PullRequest]);
        assert_eq!(args.job, "build");
    }

    #[test]
    fn unknown_capability_is_rejected_by_parser() {
        let result = Cli::try_parse_from(["tessera", "workflow", "--capability", "root"]);
        assert!(result.is_err());
    }

    #[test]
    fn no_cache_conflicts_with_cache_hit() {
        let result = Cli::try_parse_from([
            "tessera", "workflow", "--no-cache", "--cache-hit", "true",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn quiet_and_verbose_conflict() {
        let result = Cli::try_parse_from(["tessera", "--quiet", "--verbose", "fragments", "list"]);
        assert!(result.is_err());
    }

    #[test]
    fn yml_is_a_format_alias() {
        let cli = Cli::parse_from(["tessera", "merge", "a.json", "--format", "yml"]);
        let Commands::Merge(args) = cli.command else {
            panic!("expected Merge command");
        };
        assert_eq!(args.emit.format, Some(DocumentFormat::Yaml));
    }
}
