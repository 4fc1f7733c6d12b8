//! TOML configuration for ShapeSeek.
//!
//! Resolution order for the config path: explicit argument, then the
//! `SHAPESEEK_CONFIG` environment variable, then `config/shapeseek.toml`.
//! A missing file is created with defaults so users have something to edit.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::{DEFAULT_FEATURE_EXTENSION, DEFAULT_MODEL_EXTENSIONS, Language, Metric};

pub const CONFIG_ENV: &str = "SHAPESEEK_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "config/shapeseek.toml";

/// Upper bound on the number of results a single search may keep.
pub const MAX_RESULTS_LIMIT: usize = 100;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub app: AppSection,
    pub logging: LoggingConfig,
    pub retrieval: RetrievalConfig,
    pub history: HistoryConfig,
    pub report: ReportConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSection {
    pub data_dir: String,
}

impl Default for AppSection {
    fn default() -> Self {
        Self {
            data_dir: "data".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is unset.
    pub level: String,
    /// Optional log file; empty disables file logging.
    pub file: String,
    /// Emit JSON lines instead of human-readable output.
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
            file: String::new(),
            json: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    pub metric: Metric,
    /// L2-normalize vectors before comparing them.
    pub normalize: bool,
    pub max_results: usize,
    pub model_extensions: Vec<String>,
    pub feature_extension: String,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            metric: Metric::Euclidean,
            normalize: true,
            max_results: 8,
            model_extensions: DEFAULT_MODEL_EXTENSIONS
                .iter()
                .map(|s| (*s).to_string())
                .collect(),
            feature_extension: DEFAULT_FEATURE_EXTENSION.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    pub max_items: usize,
    /// History file; relative paths resolve against `app.data_dir`.
    pub file: String,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            max_items: 20,
            file: "history.json".into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    pub language: Language,
}

impl AppConfig {
    /// Absolute-or-relative location of the history file.
    pub fn history_path(&self) -> PathBuf {
        let file = Path::new(&self.history.file);
        if file.is_absolute() {
            file.to_path_buf()
        } else {
            Path::new(&self.app.data_dir).join(file)
        }
    }

    /// Apply `SHAPESEEK_*` environment overrides.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(dir) = std::env::var("SHAPESEEK_DATA_DIR") {
            if !dir.is_empty() {
                self.app.data_dir = dir;
            }
        }
        if let Ok(level) = std::env::var("SHAPESEEK_LOG_LEVEL") {
            if !level.is_empty() {
                self.logging.level = level;
            }
        }
    }
}

/// Resolve the configuration path from an explicit argument or the environment.
pub fn resolve_config_path(path: Option<&Path>) -> PathBuf {
    path.map(Path::to_path_buf)
        .or_else(|| std::env::var_os(CONFIG_ENV).map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

/// Parse a config file without creating it.
pub fn load_config(path: &Path) -> Result<AppConfig> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    toml::from_str(&text).with_context(|| format!("parsing config {}", path.display()))
}

/// Load the config, writing defaults to disk first if the file does not exist.
pub fn load_or_create_config(path: Option<&Path>) -> Result<AppConfig> {
    let path = resolve_config_path(path);
    let mut cfg = if path.exists() {
        load_config(&path)?
    } else {
        let cfg = AppConfig::default();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating config dir {}", parent.display()))?;
        }
        let text = toml::to_string_pretty(&cfg).context("serializing default config")?;
        std::fs::write(&path, text)
            .with_context(|| format!("writing default config {}", path.display()))?;
        cfg
    };
    cfg.apply_env_overrides();
    cfg.retrieval.max_results = cfg.retrieval.max_results.clamp(1, MAX_RESULTS_LIMIT);
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn creates_default_config_when_missing() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("nested").join("shapeseek.toml");
        let cfg = load_or_create_config(Some(&path))?;
        assert!(path.exists());
        assert_eq!(cfg.retrieval.metric, Metric::Euclidean);
        assert_eq!(cfg.retrieval.max_results, 8);
        assert_eq!(cfg.history.max_items, 20);

        let reread = load_config(&path)?;
        assert_eq!(reread.retrieval, cfg.retrieval);
        Ok(())
    }

    #[test]
    fn partial_file_falls_back_to_defaults() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("shapeseek.toml");
        std::fs::write(
            &path,
            "[retrieval]\nmetric = \"cosine\"\nmax_results = 500\n\n[report]\nlanguage = \"zh\"\n",
        )?;
        let cfg = load_or_create_config(Some(&path))?;
        assert_eq!(cfg.retrieval.metric, Metric::Cosine);
        assert_eq!(cfg.retrieval.max_results, MAX_RESULTS_LIMIT);
        assert_eq!(cfg.retrieval.model_extensions, vec!["step", "stp"]);
        assert_eq!(cfg.report.language, Language::Zh);
        assert_eq!(cfg.logging.level, "info");
        Ok(())
    }

    #[test]
    fn history_path_resolves_against_data_dir() {
        let mut cfg = AppConfig::default();
        cfg.app.data_dir = "/var/lib/shapeseek".into();
        assert_eq!(
            cfg.history_path(),
            PathBuf::from("/var/lib/shapeseek/history.json")
        );
    }
}
