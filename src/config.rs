//! Application configuration: TOML file loading, CLI overrides, and defaults.
//!
//! Resolution order (first found wins, values merge/override):
//! 1. CLI flags (`--config`, `--show-hidden`, `--log-level`, positional path)
//! 2. `$LAZYTREE_CONFIG` environment variable (path to config file)
//! 3. Project-local `.lazytree.toml` in the current working directory
//! 4. Global `~/.config/lazytree/config.toml`
//! 5. Built-in defaults

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{AppError, Result};
use crate::logging::LogLevel;

// ── Section configs ──────────────────────────────────────────────────────────

/// General application settings.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct GeneralConfig {
    /// Directory revealed at startup (overridden by CLI positional arg).
    pub default_path: Option<String>,
    /// Diagnostics verbosity.
    pub log_level: Option<LogLevel>,
}

/// Tree settings.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct TreeConfig {
    /// Explicit top-level locations. Empty means platform default.
    pub roots: Option<Vec<String>>,
    /// List dot directories.
    pub show_hidden: Option<bool>,
    /// Add the home directory to the platform default roots.
    pub include_home: Option<bool>,
}

// ── Top-level config ─────────────────────────────────────────────────────────

/// Top-level application configuration.
///
/// All fields are optional so that partial configs from different sources
/// can be merged together (CLI overrides file, file overrides defaults).
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub general: GeneralConfig,
    pub tree: TreeConfig,
}

// ── Config file locator ──────────────────────────────────────────────────────

/// Candidate config file paths in priority order, excluding `--config`.
fn candidate_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();

    if let Ok(env_path) = std::env::var("LAZYTREE_CONFIG") {
        paths.push(PathBuf::from(env_path));
    }

    if let Ok(cwd) = std::env::current_dir() {
        paths.push(cwd.join(".lazytree.toml"));
    }

    if let Some(config_dir) = dirs::config_dir() {
        paths.push(config_dir.join("lazytree").join("config.toml"));
    }

    paths
}

/// Read and parse one config file.
fn parse_file(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| AppError::from_io(path, e))?;
    toml::from_str::<AppConfig>(&content)
        .map_err(|e| AppError::Config(format!("{}: {}", path.display(), e)))
}

/// Like [`parse_file`], but a missing file is `Ok(None)`.
fn load_file(path: &Path) -> Result<Option<AppConfig>> {
    match parse_file(path) {
        Ok(cfg) => Ok(Some(cfg)),
        Err(AppError::PathNotFound(_)) => Ok(None),
        Err(e) => Err(e),
    }
}

/// Expand a leading `~` to the home directory.
fn expand_home(raw: &str) -> PathBuf {
    if let Some(rest) = raw.strip_prefix('~') {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest.trim_start_matches(['/', '\\']));
        }
    }
    PathBuf::from(raw)
}

// ── Merge logic ──────────────────────────────────────────────────────────────

impl AppConfig {
    /// Merge `other` on top of `self` — `other`'s `Some` values win.
    pub fn merge(self, other: &AppConfig) -> AppConfig {
        AppConfig {
            general: GeneralConfig {
                default_path: other
                    .general
                    .default_path
                    .clone()
                    .or(self.general.default_path),
                log_level: other.general.log_level.or(self.general.log_level),
            },
            tree: TreeConfig {
                roots: other.tree.roots.clone().or(self.tree.roots),
                show_hidden: other.tree.show_hidden.or(self.tree.show_hidden),
                include_home: other.tree.include_home.or(self.tree.include_home),
            },
        }
    }

    /// Load the final merged configuration.
    ///
    /// `cli_config_path` is an explicit config file path from `--config`.
    /// `cli_overrides` are partial overrides derived from CLI flags.
    ///
    /// Files that exist but cannot be read or parsed are skipped and returned
    /// alongside the config, so the caller can report them once logging is up.
    /// A missing `--config` file is reported too; missing candidates are not.
    pub fn load(
        cli_config_path: Option<&Path>,
        cli_overrides: Option<&AppConfig>,
    ) -> (AppConfig, Vec<AppError>) {
        let mut config = AppConfig::default();
        let mut skipped = Vec::new();

        // Lowest priority first so higher overwrites.
        for path in candidate_paths().iter().rev() {
            match load_file(path) {
                Ok(Some(file_cfg)) => config = config.merge(&file_cfg),
                Ok(None) => {}
                Err(e) => skipped.push(e),
            }
        }

        if let Some(cli_path) = cli_config_path {
            match parse_file(cli_path) {
                Ok(file_cfg) => config = config.merge(&file_cfg),
                Err(e) => skipped.push(e),
            }
        }

        if let Some(overrides) = cli_overrides {
            config = config.merge(overrides);
        }

        (config, skipped)
    }

    // ── Convenience getters with built-in defaults ──────────────────────────

    pub fn default_path(&self) -> Option<PathBuf> {
        self.general.default_path.as_deref().map(expand_home)
    }

    pub fn log_level(&self) -> LogLevel {
        self.general.log_level.unwrap_or_default()
    }

    /// Configured roots with `~` expanded. Empty means platform default.
    pub fn roots(&self) -> Vec<PathBuf> {
        self.tree
            .roots
            .iter()
            .flatten()
            .map(|r| expand_home(r))
            .collect()
    }

    pub fn show_hidden(&self) -> bool {
        self.tree.show_hidden.unwrap_or(false)
    }

    pub fn include_home(&self) -> bool {
        self.tree.include_home.unwrap_or(true)
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────
