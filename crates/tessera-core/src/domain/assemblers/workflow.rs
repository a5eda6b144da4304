//! CI workflow and job assembly.
//!
//! A job is built from a fixed step prefix followed by the caller's
//! commands:
//!
//! ```text
//! checkout → runtime setup → dependency cache → install → commands → extra steps
//! ```
//!
//! The prefix order never changes. Caller job fragments are merged on top
//! with `steps` concatenated, so they can only append after the prefix.

use std::fmt;
use std::str::FromStr;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::domain::document::{ConfigDocument, ConfigNode, Fragment, Mapping};
use crate::domain::error::{DomainError, DomainResult};
use crate::domain::merge::{MergePolicy, merge};
use crate::domain::overrides::OverrideSet;

pub const DEFAULT_RUNNER: &str = "ubuntu-latest";
pub const CHECKOUT_ACTION: &str = "actions/checkout@v4";
pub const CACHE_ACTION: &str = "actions/cache@v4";
pub const CACHE_STEP_ID: &str = "cache-deps";

/// Merge policy for caller job fragments.
pub fn job_merge_policy() -> MergePolicy {
    MergePolicy::new().concat("steps")
}

// ── Permissions ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PermissionLevel {
    None,
    Read,
    Write,
}

impl PermissionLevel {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Read => "read",
            Self::Write => "write",
        }
    }
}

/// Things a job may need beyond read access to the repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Capability {
    PushCommits,
    PublishPackages,
    WritePullRequests,
    IdToken,
}

impl Capability {
    pub const ALL: &'static [Capability] = &[
        Self::PushCommits,
        Self::PublishPackages,
        Self::WritePullRequests,
        Self::IdToken,
    ];

    /// Permission scope and level this capability requires.
    pub const fn grant(&self) -> (&'static str, PermissionLevel) {
        match self {
            Self::PushCommits => ("contents", PermissionLevel::Write),
            Self::PublishPackages => ("packages", PermissionLevel::Write),
            Self::WritePullRequests => ("pull-requests", PermissionLevel::Write),
            Self::IdToken => ("id-token", PermissionLevel::Write),
        }
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::PushCommits => "push-commits",
            Self::PublishPackages => "publish-packages",
            Self::WritePullRequests => "write-pull-requests",
            Self::IdToken => "id-token",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Capability {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|c| c.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| DomainError::UnknownOption {
                kind: "capability",
                value: s.to_string(),
            })
    }
}

/// Job permission block. Starts at `contents: read`; capabilities only ever
/// raise a scope, never lower it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobPermissions {
    scopes: IndexMap<String, PermissionLevel>,
}

impl Default for JobPermissions {
    fn default() -> Self {
        let mut scopes = IndexMap::new();
        scopes.insert("contents".to_string(), PermissionLevel::Read);
        Self { scopes }
    }
}

impl JobPermissions {
    pub fn read_only() -> Self {
        Self::default()
    }

    pub fn elevate(&mut self, scope: &str, level: PermissionLevel) -> &mut Self {
        let current = self.scopes.entry(scope.to_string()).or_insert(level);
        if level > *current {
            *current = level;
        }
        self
    }

    pub fn grant(&mut self, capability: Capability) -> &mut Self {
        let (scope, level) = capability.grant();
        self.elevate(scope, level)
    }

    pub fn level(&self, scope: &str) -> Option<PermissionLevel> {
        self.scopes.get(scope).copied()
    }

    pub fn to_node(&self) -> ConfigNode {
        ConfigNode::Mapping(
            self.scopes
                .iter()
                .map(|(scope, level)| (scope.clone(), ConfigNode::from(level.as_str())))
                .collect(),
        )
    }
}

// ── Steps ────────────────────────────────────────────────────────────────────

/// One entry of a job's `steps` list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WorkflowStep {
    pub name: Option<String>,
    pub id: Option<String>,
    pub condition: Option<String>,
    pub uses: Option<String>,
    pub with: Mapping,
    pub run: Option<String>,
    pub env: IndexMap<String, String>,
}

impl WorkflowStep {
    pub fn uses(name: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            uses: Some(action.into()),
            ..Self::default()
        }
    }

    pub fn run(name: impl Into<String>, command: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            run: Some(command.into()),
            ..Self::default()
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_condition(mut self, condition: impl Into<String>) -> Self {
        self.condition = Some(condition.into());
        self
    }

    pub fn with_input(mut self, key: impl Into<String>, value: impl Into<ConfigNode>) -> Self {
        self.with.insert(key.into(), value.into());
        self
    }

    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    /// Render in the key order CI runners document: name, id, if, uses,
    /// with, run, env.
    pub fn to_node(&self) -> ConfigNode {
        let mut map = Mapping::new();
        if let Some(name) = &self.name {
            map.insert("name".into(), name.as_str().into());
        }
        if let Some(id) = &self.id {
            map.insert("id".into(), id.as_str().into());
        }
        if let Some(condition) = &self.condition {
            map.insert("if".into(), condition.as_str().into());
        }
        if let Some(uses) = &self.uses {
            map.insert("uses".into(), uses.as_str().into());
        }
        if !self.with.is_empty() {
            map.insert("with".into(), ConfigNode::Mapping(self.with.clone()));
        }
        if let Some(run) = &self.run {
            map.insert("run".into(), run.as_str().into());
        }
        if !self.env.is_empty() {
            map.insert(
                "env".into(),
                ConfigNode::Mapping(
                    self.env
                        .iter()
                        .map(|(k, v)| (k.clone(), ConfigNode::from(v.as_str())))
                        .collect(),
                ),
            );
        }
        ConfigNode::Mapping(map)
    }
}

// ── Runtimes ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Runtime {
    Node,
    Python,
    Go,
}

/// Setup action for one runtime.
#[derive(Debug, Clone, Copy)]
pub struct RuntimeDef {
    pub runtime: Runtime,
    pub display: &'static str,
    pub action: &'static str,
    pub version_input: &'static str,
    pub default_version: &'static str,
}

pub static RUNTIME_REGISTRY: &[RuntimeDef] = &[
    RuntimeDef {
        runtime: Runtime::Node,
        display: "Node.js",
        action: "actions/setup-node@v4",
        version_input: "node-version",
        default_version: "20.x",
    },
    RuntimeDef {
        runtime: Runtime::Python,
        display: "Python",
        action: "actions/setup-python@v5",
        version_input: "python-version",
        default_version: "3.12",
    },
    RuntimeDef {
        runtime: Runtime::Go,
        display: "Go",
        action: "actions/setup-go@v5",
        version_input: "go-version",
        default_version: "1.22",
    },
];

impl Runtime {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Node => "node",
            Self::Python => "python",
            Self::Go => "go",
        }
    }

    pub fn def(&self) -> &'static RuntimeDef {
        // Every variant has a registry entry.
        RUNTIME_REGISTRY
            .iter()
            .find(|d| d.runtime == *self)
            .unwrap_or(&RUNTIME_REGISTRY[0])
    }

    pub fn setup_step(&self, version: Option<&str>) -> WorkflowStep {
        let def = self.def();
        WorkflowStep::uses(format!("Setup {}", def.display), def.action)
            .with_input(def.version_input, version.unwrap_or(def.default_version))
    }
}

impl fmt::Display for Runtime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Runtime {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "node" | "nodejs" | "node.js" => Ok(Self::Node),
            "python" | "py" => Ok(Self::Python),
            "go" | "golang" => Ok(Self::Go),
            other => Err(DomainError::UnknownOption {
                kind: "runtime",
                value: other.to_string(),
            }),
        }
    }
}

// ── Dependencies ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PackageManager {
    #[default]
    Npm,
    Yarn,
    Pnpm,
}

impl PackageManager {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Npm => "npm",
            Self::Yarn => "yarn",
            Self::Pnpm => "pnpm",
        }
    }

    /// Frozen-lockfile install command.
    pub const fn install_command(&self) -> &'static str {
        match self {
            Self::Npm => "npm ci",
            Self::Yarn => "yarn install --frozen-lockfile",
            Self::Pnpm => "pnpm install --frozen-lockfile",
        }
    }

    pub const fn lockfile(&self) -> &'static str {
        match self {
            Self::Npm => "package-lock.json",
            Self::Yarn => "yarn.lock",
            Self::Pnpm => "pnpm-lock.yaml",
        }
    }

    pub const fn cache_path(&self) -> &'static str {
        match self {
            Self::Npm => "~/.npm",
            Self::Yarn => "~/.cache/yarn",
            Self::Pnpm => "~/.local/share/pnpm/store",
        }
    }
}

impl fmt::Display for PackageManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PackageManager {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "npm" => Ok(Self::Npm),
            "yarn" => Ok(Self::Yarn),
            "pnpm" => Ok(Self::Pnpm),
            other => Err(DomainError::UnknownOption {
                kind: "package manager",
                value: other.to_string(),
            }),
        }
    }
}

/// Whether the lockfile hash matched a previous cache entry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CacheState {
    /// Known hit: the install step is omitted.
    Hit,
    /// Known miss: the install step runs unconditionally.
    Miss,
    /// Decided by the runner: the install step is guarded on the cache step output.
    #[default]
    Unknown,
}

impl CacheState {
    pub fn from_hit(hit: bool) -> Self {
        if hit { Self::Hit } else { Self::Miss }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyCache {
    pub lockfile_hash: String,
    pub state: CacheState,
}

impl DependencyCache {
    pub fn new(lockfile_hash: impl Into<String>, state: CacheState) -> Self {
        Self {
            lockfile_hash: lockfile_hash.into(),
            state,
        }
    }

    pub fn key(&self, manager: PackageManager) -> String {
        format!("${{{{ runner.os }}}}-{}-{}", manager, self.lockfile_hash)
    }

    fn step(&self, manager: PackageManager) -> WorkflowStep {
        WorkflowStep::uses("Cache dependencies", CACHE_ACTION)
            .with_id(CACHE_STEP_ID)
            .with_input("path", manager.cache_path())
            .with_input("key", self.key(manager))
    }
}

// ── Job assembler ────────────────────────────────────────────────────────────

/// Job keys only the assembler may set. Permissions go through
/// [`CiJobAssembler::capability`], runner labels through
/// [`CiJobAssembler::runs_on`].
const RESERVED_JOB_KEYS: [&str; 2] = ["permissions", "runs-on"];

#[derive(Debug, Clone)]
pub struct CiJobAssembler {
    id: String,
    name: Option<String>,
    runs_on: Vec<String>,
    permissions: JobPermissions,
    runtimes: Vec<(Runtime, Option<String>)>,
    package_manager: Option<PackageManager>,
    cache: Option<DependencyCache>,
    commands: Vec<WorkflowStep>,
    extra_steps: Vec<WorkflowStep>,
    env: IndexMap<String, String>,
    fragments: Vec<Fragment>,
}

impl CiJobAssembler {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: None,
            runs_on: vec![DEFAULT_RUNNER.to_string()],
            permissions: JobPermissions::default(),
            runtimes: Vec::new(),
            package_manager: None,
            cache: None,
            commands: Vec::new(),
            extra_steps: Vec::new(),
            env: IndexMap::new(),
            fragments: Vec::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Replace the default runner labels.
    pub fn runs_on<I, S>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.runs_on = labels.into_iter().map(Into::into).collect();
        self
    }

    pub fn capability(mut self, capability: Capability) -> Self {
        self.permissions.grant(capability);
        self
    }

    pub fn runtime(mut self, runtime: Runtime, version: Option<&str>) -> Self {
        self.runtimes.push((runtime, version.map(str::to_string)));
        self
    }

    pub fn package_manager(mut self, manager: PackageManager) -> Self {
        self.package_manager = Some(manager);
        self
    }

    pub fn cache(mut self, cache: DependencyCache) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Add a command step; its name is the command itself.
    pub fn command(mut self, command: impl Into<String>) -> Self {
        let command = command.into();
        self.commands.push(WorkflowStep::run(command.clone(), command));
        self
    }

    pub fn command_step(mut self, step: WorkflowStep) -> Self {
        self.commands.push(step);
        self
    }

    /// Append a step after the commands.
    pub fn step(mut self, step: WorkflowStep) -> Self {
        self.extra_steps.push(step);
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    /// Merge a caller fragment over the job. `steps` concatenate after the
    /// standard prefix; `permissions` and `runs-on` are rejected.
    pub fn with_fragment(mut self, fragment: Fragment) -> Self {
        self.fragments.push(fragment);
        self
    }

    pub fn validate(&self) -> DomainResult<()> {
        let invalid = |reason: &str| DomainError::InvalidJob {
            job: self.id.clone(),
            reason: reason.to_string(),
        };

        if !is_valid_job_id(&self.id) {
            return Err(invalid(
                "job id must start with a letter or '_' and contain only letters, digits, '-' or '_'",
            ));
        }
        if self.runs_on.is_empty() || self.runs_on.iter().any(|l| l.trim().is_empty()) {
            return Err(invalid("at least one non-empty runner label is required"));
        }
        if self.commands.is_empty() {
            return Err(invalid("at least one command step is required"));
        }
        if self.cache.is_some() && self.package_manager.is_none() {
            return Err(invalid("a dependency cache requires a package manager"));
        }
        for fragment in &self.fragments {
            if let Some(key) = RESERVED_JOB_KEYS
                .iter()
                .find(|key| fragment.document().get(key).is_some())
            {
                return Err(invalid(&format!(
                    "fragment '{}' sets '{}'; use capabilities and runner labels instead",
                    fragment.name(),
                    key
                )));
            }
        }
        Ok(())
    }

    /// The ordered step list.
    pub fn steps(&self) -> DomainResult<Vec<WorkflowStep>> {
        self.validate()?;

        let mut steps = vec![WorkflowStep::uses("Checkout", CHECKOUT_ACTION)];
        steps.extend(
            self.runtimes
                .iter()
                .map(|(runtime, version)| runtime.setup_step(version.as_deref())),
        );

        if let Some(manager) = self.package_manager {
            let install = WorkflowStep::run("Install dependencies", manager.install_command());
            match &self.cache {
                Some(cache) => {
                    steps.push(cache.step(manager));
                    match cache.state {
                        CacheState::Hit => {
                            debug!(job = %self.id, "cache hit, install step omitted");
                        }
                        CacheState::Miss => steps.push(install),
                        CacheState::Unknown => steps.push(install.with_condition(format!(
                            "steps.{CACHE_STEP_ID}.outputs.cache-hit != 'true'"
                        ))),
                    }
                }
                None => steps.push(install),
            }
        }

        steps.extend(self.commands.iter().cloned());
        steps.extend(self.extra_steps.iter().cloned());
        Ok(steps)
    }

    #[instrument(skip(self), fields(job = %self.id))]
    pub fn assemble(&self) -> DomainResult<ConfigDocument> {
        let steps = self.steps()?;

        let mut base = ConfigDocument::new();
        if let Some(name) = &self.name {
            base.insert("name", name.as_str());
        }
        base.insert("runs-on", runner_node(&self.runs_on));
        base.insert("permissions", self.permissions.to_node());
        if !self.env.is_empty() {
            base.insert(
                "env",
                ConfigNode::Mapping(
                    self.env
                        .iter()
                        .map(|(k, v)| (k.clone(), ConfigNode::from(v.as_str())))
                        .collect(),
                ),
            );
        }
        base.insert(
            "steps",
            ConfigNode::Sequence(steps.iter().map(WorkflowStep::to_node).collect()),
        );

        if self.fragments.is_empty() {
            return Ok(base);
        }

        let mut fragments = Vec::with_capacity(self.fragments.len() + 1);
        fragments.push(Fragment::new(format!("job:{}", self.id), base));
        fragments.extend(self.fragments.iter().cloned());
        merge(&fragments, &job_merge_policy())
    }
}

/// A single label renders as a plain string, several as a list.
fn runner_node(labels: &[String]) -> ConfigNode {
    match labels {
        [single] => single.as_str().into(),
        many => ConfigNode::Sequence(many.iter().map(|l| l.as_str().into()).collect()),
    }
}

fn is_valid_job_id(id: &str) -> bool {
    let mut chars = id.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        }
        _ => false,
    }
}

// ── Workflow assembler ───────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Trigger {
    Push { branches: Vec<String> },
    PullRequest { branches: Vec<String> },
    WorkflowDispatch,
}

impl Trigger {
    pub const fn event(&self) -> &'static str {
        match self {
            Self::Push { .. } => "push",
            Self::PullRequest { .. } => "pull_request",
            Self::WorkflowDispatch => "workflow_dispatch",
        }
    }

    fn to_node(&self) -> ConfigNode {
        let mut map = Mapping::new();
        match self {
            Self::Push { branches } | Self::PullRequest { branches } if !branches.is_empty() => {
                map.insert(
                    "branches".into(),
                    ConfigNode::Sequence(branches.iter().map(|b| b.as_str().into()).collect()),
                );
            }
            _ => {}
        }
        ConfigNode::Mapping(map)
    }
}

/// A workflow file: name, triggers and named jobs.
#[derive(Debug, Clone)]
pub struct WorkflowAssembler {
    name: String,
    triggers: Vec<Trigger>,
    jobs: IndexMap<String, CiJobAssembler>,
    overrides: OverrideSet,
}

impl WorkflowAssembler {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            triggers: Vec::new(),
            jobs: IndexMap::new(),
            overrides: OverrideSet::new(),
        }
    }

    /// Add a trigger; a later trigger for the same event replaces the earlier one.
    pub fn on(mut self, trigger: Trigger) -> Self {
        self.triggers.retain(|t| t.event() != trigger.event());
        self.triggers.push(trigger);
        self
    }

    pub fn add_job(&mut self, job: CiJobAssembler) -> DomainResult<&mut Self> {
        if self.jobs.contains_key(job.id()) {
            return Err(DomainError::InvalidJob {
                job: job.id().to_string(),
                reason: format!("job id is already used in workflow '{}'", self.name),
            });
        }
        self.jobs.insert(job.id().to_string(), job);
        Ok(self)
    }

    pub fn with_job(mut self, job: CiJobAssembler) -> DomainResult<Self> {
        self.add_job(job)?;
        Ok(self)
    }

    pub fn add_override(&mut self, path: &str, value: Option<ConfigNode>) -> DomainResult<&mut Self> {
        self.overrides.add(path, value)?;
        Ok(self)
    }

    #[instrument(skip(self), fields(workflow = %self.name, jobs = self.jobs.len()))]
    pub fn assemble(&self) -> DomainResult<ConfigDocument> {
        if self.jobs.is_empty() {
            return Err(DomainError::InvalidJob {
                job: self.name.clone(),
                reason: "a workflow needs at least one job".into(),
            });
        }

        let mut on = Mapping::new();
        for trigger in &self.triggers {
            on.insert(trigger.event().to_string(), trigger.to_node());
        }

        let mut jobs = Mapping::new();
        for (id, job) in &self.jobs {
            jobs.insert(id.clone(), ConfigNode::Mapping(job.assemble()?.into_mapping()));
        }

        let doc = ConfigDocument::new()
            .with("name", self.name.as_str())
            .with("on", on)
            .with("jobs", jobs);
        self.overrides.apply_to(doc)
    }
}
