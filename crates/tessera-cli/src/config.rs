//! Application configuration.
//!
//! [`AppConfig`] is loaded once at startup and passed down by value.  The
//! CLI layer owns config; the core crate never sees it.
//!
//! # Resolution order (highest priority first)
//!
//! 1. CLI flags (handled at the call-site, not here)
//! 2. Environment variables: `TESSERA_<SECTION>__<KEY>`, e.g.
//!    `TESSERA_WORKFLOW__PACKAGE_MANAGER=pnpm`
//! 3. `.tessera.toml` in the current directory
//! 4. Config file (`--config`, or the platform config directory)
//! 5. Built-in defaults (always present)

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};

use tessera_core::domain::assemblers::workflow::DEFAULT_RUNNER;

/// Name of the per-project config file.
pub const LOCAL_CONFIG_FILE: &str = ".tessera.toml";

/// Application configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Output settings.
    pub output: OutputConfig,
    /// Defaults for `tessera workflow`.
    pub workflow: WorkflowConfig,
    /// Fragment lookup settings.
    pub fragments: FragmentConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub no_color: bool,
    /// Document format used for stdout when `--format` is not given.
    pub format: String,
    /// Emit the generated-file comment in YAML and TOML.
    pub marker: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkflowConfig {
    pub runs_on: Vec<String>,
    pub node_version: Option<String>,
    pub package_manager: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FragmentConfig {
    /// User fragments directory. Discovered automatically when unset.
    pub dir: Option<PathBuf>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            no_color: false,
            format: "json".into(),
            marker: true,
        }
    }
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            runs_on: vec![DEFAULT_RUNNER.into()],
            node_version: None,
            package_manager: None,
        }
    }
}

impl AppConfig {
    /// Load configuration, layering file and environment over defaults.
    ///
    /// An explicit `config_file` must exist; the default location is optional.
    pub fn load(config_file: Option<&PathBuf>) -> anyhow::Result<Self> {
        let defaults = Config::try_from(&Self::default()).context("encoding default configuration")?;

        let (path, required) = match config_file {
            Some(path) => (path.clone(), true),
            None => (Self::config_path(), false),
        };

        Self::load_from(defaults, &path, required, Path::new(LOCAL_CONFIG_FILE))
    }

    fn load_from(
        defaults: Config,
        path: &Path,
        required: bool,
        local: &Path,
    ) -> anyhow::Result<Self> {
        let config = Config::builder()
            .add_source(defaults)
            .add_source(File::from(path).format(FileFormat::Toml).required(required))
            .add_source(File::from(local).format(FileFormat::Toml).required(false))
            .add_source(
                Environment::with_prefix("TESSERA")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("workflow.runs_on"),
            )
            .build()
            .with_context(|| format!("reading configuration from {}", path.display()))?;

        config
            .try_deserialize()
            .context("configuration has invalid values")
    }

    /// Path to the default configuration file.
    ///
    /// Uses `directories::ProjectDirs` for cross-platform correctness,
    /// falling back to `.tessera.toml` in the current directory.
    pub fn config_path() -> PathBuf {
        directories::ProjectDirs::from("dev", "tessera", "tessera")
            .map(|d| d.config_dir().join("config.toml"))
            .unwrap_or_else(|| PathBuf::from(LOCAL_CONFIG_FILE))
    }

    /// Look up a dotted key, rendered as a display string.
    pub fn get(&self, key: &str) -> Option<String> {
        let value = serde_json::to_value(self).ok()?;
        let found = key
            .split('.')
            .try_fold(&value, |node, segment| node.get(segment))?;
        Some(match found {
            serde_json::Value::String(s) => s.clone(),
            serde_json::Value::Null => String::new(),
            other => other.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn load_file(content: &str) -> anyhow::Result<AppConfig> {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        std::fs::write(&path, content).unwrap();
        let defaults = Config::try_from(&AppConfig::default()).unwrap();
        AppConfig::load_from(defaults, &path, true, &temp.path().join("missing.toml"))
    }

    #[test]
    fn default_runner_is_ubuntu() {
        assert_eq!(AppConfig::default().workflow.runs_on, [DEFAULT_RUNNER]);
    }

    #[test]
    fn default_no_color_is_false() {
        assert!(!AppConfig::default().output.no_color);
    }

    #[test]
    fn file_values_override_defaults() {
        let cfg = load_file(
            "[workflow]\nruns_on = [\"self-hosted\", \"linux\"]\npackage_manager = \"pnpm\"\n",
        )
        .unwrap();
        assert_eq!(cfg.workflow.runs_on, ["self-hosted", "linux"]);
        assert_eq!(cfg.workflow.package_manager.as_deref(), Some("pnpm"));
        assert!(cfg.output.marker);
    }

    #[test]
    fn missing_explicit_file_is_error() {
        let defaults = Config::try_from(&AppConfig::default()).unwrap();
        let result = AppConfig::load_from(
            defaults,
            Path::new("/does/not/exist.toml"),
            true,
            Path::new("/does/not/exist/.tessera.toml"),
        );
        assert!(result.is_err());
    }

    #[test]
    fn get_reads_dotted_keys() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.get("output.format").as_deref(), Some("json"));
        assert_eq!(cfg.get("output.marker").as_deref(), Some("true"));
        assert_eq!(cfg.get("workflow.runs_on").as_deref(), Some("[\"ubuntu-latest\"]"));
        assert_eq!(cfg.get("fragments.dir").as_deref(), Some(""));
        assert!(cfg.get("does.not.exist").is_none());
    }

    #[test]
    fn config_path_is_not_empty() {
        let p = AppConfig::config_path();
        assert!(!p.as_os_str().is_empty());
    }
}
