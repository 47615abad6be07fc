use crate::error::{AppError, Result};
use crate::gather::SelectionRule;
use crate::logs::LogAggregatorConfig;
use crate::paths::{self, LOG_OUTPUT_FILENAME};
use crate::tree::TreeSpec;
use indexmap::IndexMap;
use log;
use rust_embed::RustEmbed;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_FILENAME: &str = "ch_config.toml";
pub const DEFAULT_TREE_DEPTH: usize = 1;

pub const TREE_SECTIONS: [&str; 2] = ["tree", "tree-extra"];
pub const CONTENT_SECTIONS: [&str; 2] = ["content", "content-extra"];

const DEFAULT_CONFIG_ASSET: &str = "ch_config_default.toml";

#[derive(RustEmbed)]
#[folder = "../data/"]
struct DefaultConfigAssets;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub shared: SectionConfig,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tree: Option<SectionConfig>,
    #[serde(default, rename = "tree-extra", skip_serializing_if = "Option::is_none")]
    pub tree_extra: Option<SectionConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<SectionConfig>,
    #[serde(
        default,
        rename = "content-extra",
        skip_serializing_if = "Option::is_none"
    )]
    pub content_extra: Option<SectionConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_aggregator: Option<LogAggregatorSection>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct GeneralConfig {
    #[serde(default)]
    pub print_summary: bool,
    #[serde(default)]
    pub copy_to_clipboard: bool,
}

/// Settings shared by `[shared]` and every tree/content section.
///
/// Every key is optional so that a section can tell "not set" apart from an
/// explicit value when it is merged over `[shared]`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct SectionConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_dir: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exclude_dirs: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_depth: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limits: Option<IndexMap<String, usize>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exclude_prefixes: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exclude_suffixes: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recursive: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefixes: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suffixes: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub all_dirs: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub all_dirs_recursive: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_line_numbers: Option<bool>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct LogAggregatorSection {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub log_dirs: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_range_hours: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_lines: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,
    #[serde(default)]
    pub channels: Vec<String>,
}

impl SectionConfig {
    /// Shallow key-by-key merge: values set on `self` win over `shared`.
    pub fn merged_over(&self, shared: &SectionConfig) -> SectionConfig {
        SectionConfig {
            enabled: self.enabled.or(shared.enabled),
            base_dir: self.base_dir.clone().or_else(|| shared.base_dir.clone()),
            exclude_dirs: self
                .exclude_dirs
                .clone()
                .or_else(|| shared.exclude_dirs.clone()),
            default_depth: self.default_depth.or(shared.default_depth),
            limits: self.limits.clone().or_else(|| shared.limits.clone()),
            exclude_prefixes: self
                .exclude_prefixes
                .clone()
                .or_else(|| shared.exclude_prefixes.clone()),
            exclude_suffixes: self
                .exclude_suffixes
                .clone()
                .or_else(|| shared.exclude_suffixes.clone()),
            recursive: self.recursive.or(shared.recursive),
            prefixes: self.prefixes.clone().or_else(|| shared.prefixes.clone()),
            suffixes: self.suffixes.clone().or_else(|| shared.suffixes.clone()),
            all_dirs: self.all_dirs.clone().or_else(|| shared.all_dirs.clone()),
            all_dirs_recursive: self
                .all_dirs_recursive
                .clone()
                .or_else(|| shared.all_dirs_recursive.clone()),
            display_line_numbers: self.display_line_numbers.or(shared.display_line_numbers),
        }
    }

    /// A present section runs unless it is explicitly disabled.
    pub fn is_enabled(&self) -> bool {
        self.enabled != Some(false)
    }

    pub fn tree_spec(&self) -> TreeSpec {
        let default_depth = match self.default_depth {
            None | Some(0) => DEFAULT_TREE_DEPTH,
            Some(depth) => depth,
        };
        TreeSpec {
            base_dir: self.base_dir.clone().unwrap_or_default(),
            exclude_dirs: self.exclude_dirs.clone().unwrap_or_default(),
            default_depth,
            limits: self.limits.clone().unwrap_or_default(),
        }
    }

    pub fn selection_rule(&self) -> SelectionRule {
        SelectionRule {
            base_dir: self.base_dir.clone().unwrap_or_default(),
            exclude_dirs: self.exclude_dirs.clone().unwrap_or_default(),
            exclude_prefixes: self.exclude_prefixes.clone().unwrap_or_default(),
            exclude_suffixes: self.exclude_suffixes.clone().unwrap_or_default(),
            recursive: self.recursive.unwrap_or(false),
            prefixes: self.prefixes.clone().unwrap_or_default(),
            suffixes: self.suffixes.clone().unwrap_or_default(),
            all_dirs: self.all_dirs.clone().unwrap_or_default(),
            all_dirs_recursive: self.all_dirs_recursive.clone().unwrap_or_default(),
            display_line_numbers: self.display_line_numbers.unwrap_or(false),
        }
    }
}

impl LogAggregatorSection {
    pub fn aggregator_config(&self, project_root: &Path) -> LogAggregatorConfig {
        LogAggregatorConfig {
            log_directories: self
                .log_dirs
                .iter()
                .map(|dir| paths::resolve_dir(project_root, dir))
                .collect(),
            output_file: paths::context_dir(project_root).join(LOG_OUTPUT_FILENAME),
            time_range_hours: self.time_range_hours.filter(|h| *h > 0),
            max_lines: self.max_lines.filter(|n| *n > 0),
            log_level: self.log_level.clone().filter(|level| !level.trim().is_empty()),
            channels: self.channels.clone(),
        }
    }
}

impl Config {
    pub fn section(&self, name: &str) -> Option<&SectionConfig> {
        match name {
            "tree" => self.tree.as_ref(),
            "tree-extra" => self.tree_extra.as_ref(),
            "content" => self.content.as_ref(),
            "content-extra" => self.content_extra.as_ref(),
            _ => None,
        }
    }

    /// The section merged over `[shared]`, or `None` when the section is absent.
    pub fn effective_section(&self, name: &str) -> Option<SectionConfig> {
        self.section(name)
            .map(|section| section.merged_over(&self.shared))
    }

    /// Project context runs only when `tree` or `content` is explicitly enabled.
    pub fn is_project_context_enabled(&self) -> bool {
        let explicitly_enabled =
            |section: &Option<SectionConfig>| section.as_ref().and_then(|s| s.enabled) == Some(true);
        explicitly_enabled(&self.tree) || explicitly_enabled(&self.content)
    }

    pub fn is_log_aggregator_enabled(&self) -> bool {
        self.log_aggregator.as_ref().is_some_and(|l| l.enabled)
    }

    pub fn resolve_config_path(project_root: &Path, config_file: Option<&str>) -> PathBuf {
        let filename = config_file.unwrap_or(DEFAULT_CONFIG_FILENAME);
        let expanded = shellexpand::tilde(filename);
        let candidate = Path::new(expanded.as_ref());
        if candidate.is_absolute() {
            candidate.to_path_buf()
        } else {
            paths::context_dir(project_root).join(candidate)
        }
    }

    /// Loads the configuration, writing the embedded default first when the file is missing.
    pub fn load(project_root: &Path, config_file: Option<&str>) -> Result<Self> {
        let config_path = Self::resolve_config_path(project_root, config_file);
        ensure_config_file(&config_path)?;
        Self::load_from_path(&config_path)
    }

    /// Reads `config_path` when it exists and the embedded default otherwise. Never writes.
    pub fn load_or_default(config_path: &Path) -> Result<Self> {
        if config_path.exists() {
            return Self::load_from_path(config_path);
        }
        log::info!(
            "No config file at {}; using the embedded default.",
            config_path.display()
        );
        Self::from_toml_str(&default_config_text()?)
    }

    pub fn load_from_path(config_path: &Path) -> Result<Self> {
        log::info!("Loading configuration from: {}", config_path.display());
        let toml_content = fs::read_to_string(config_path).map_err(|e| AppError::FileRead {
            path: config_path.to_path_buf(),
            source: e,
        })?;
        Self::from_toml_str(&toml_content).map_err(|e| match e {
            AppError::TomlParse(msg) => AppError::TomlParse(format!(
                "Error parsing config file '{}': {}",
                config_path.display(),
                msg
            )),
            other => other,
        })
    }

    pub fn from_toml_str(toml_content: &str) -> Result<Self> {
        let config = toml::from_str::<Config>(toml_content).map_err(|e| {
            AppError::TomlParse(format!("{}. Check TOML syntax and structure.", e))
        })?;
        config.warn_on_suspicious_settings();
        Ok(config)
    }

    fn warn_on_suspicious_settings(&self) {
        if let Some(logs) = &self.log_aggregator {
            if logs.enabled && logs.log_dirs.is_empty() {
                log::warn!("[log_aggregator] is enabled but no log_dirs are configured.");
            }
        }
        if self.tree.is_none()
            && self.tree_extra.is_none()
            && self.content.is_none()
            && self.content_extra.is_none()
        {
            log::debug!("No tree or content sections configured.");
        }
    }
}

pub fn default_config_text() -> Result<String> {
    let asset = DefaultConfigAssets::get(DEFAULT_CONFIG_ASSET).ok_or_else(|| {
        AppError::Config(format!(
            "Default configuration not found in embed: {}",
            DEFAULT_CONFIG_ASSET
        ))
    })?;
    let content = std::str::from_utf8(asset.data.as_ref())?;
    Ok(content.to_string())
}

/// Writes the embedded default configuration to `config_path` if nothing is there yet.
pub fn ensure_config_file(config_path: &Path) -> Result<()> {
    if config_path.exists() {
        return Ok(());
    }
    if let Some(parent) = config_path.parent() {
        fs::create_dir_all(parent).map_err(|e| AppError::DirCreation {
            path: parent.to_path_buf(),
            source: e,
        })?;
    }
    let default_text = default_config_text()?;
    fs::write(config_path, default_text).map_err(|e| AppError::FileWrite {
        path: config_path.to_path_buf(),
        source: e,
    })?;
    log::info!(
        "Wrote default configuration to {}",
        config_path.display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn section_values_win_over_shared() {
        let config = Config::from_toml_str(
            r#"
            [shared]
            exclude_dirs = [".git"]
            recursive = true
            suffixes = [".rs"]

            [content]
            suffixes = [".md"]
            "#,
        )
        .unwrap();

        let effective = config.effective_section("content").unwrap();
        assert_eq!(effective.suffixes, Some(vec![".md".to_string()]));
        assert_eq!(effective.exclude_dirs, Some(vec![".git".to_string()]));
        assert_eq!(effective.recursive, Some(true));
    }

    #[test]
    fn absent_section_has_no_effective_config() {
        let config = Config::from_toml_str("[shared]\nrecursive = true\n").unwrap();
        assert!(config.effective_section("tree").is_none());
        assert!(config.effective_section("content-extra").is_none());
    }

    #[test]
    fn unknown_top_level_section_is_rejected() {
        let err = Config::from_toml_str("[callstack]\nenabled = true\n").unwrap_err();
        assert!(matches!(err, AppError::TomlParse(_)));
    }

    #[test]
    fn unknown_section_key_is_rejected() {
        let err = Config::from_toml_str("[tree]\ndepth = 3\n").unwrap_err();
        assert!(err.to_string().contains("depth"));
    }

    #[test]
    fn tree_spec_defaults() {
        let spec = SectionConfig::default().tree_spec();
        assert_eq!(spec.base_dir, "");
        assert_eq!(spec.default_depth, DEFAULT_TREE_DEPTH);
        assert!(spec.limits.is_empty());
        assert!(spec.exclude_dirs.is_empty());

        let zero = SectionConfig {
            default_depth: Some(0),
            ..Default::default()
        };
        assert_eq!(zero.tree_spec().default_depth, 1);
    }

    #[test]
    fn limits_keep_file_order() {
        let config = Config::from_toml_str(
            r#"
            [tree]
            default_depth = 2
            [tree.limits]
            "src/b" = 1
            "src/a" = 5
            "#,
        )
        .unwrap();
        let spec = config.effective_section("tree").unwrap().tree_spec();
        let keys: Vec<&str> = spec.limits.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["src/b", "src/a"]);
    }

    #[test]
    fn project_context_requires_explicit_enable() {
        let implicit = Config::from_toml_str("[tree]\nbase_dir = \"\"\n").unwrap();
        assert!(!implicit.is_project_context_enabled());
        assert!(implicit.effective_section("tree").unwrap().is_enabled());

        let explicit = Config::from_toml_str("[content]\nenabled = true\n").unwrap();
        assert!(explicit.is_project_context_enabled());
    }

    #[test]
    fn zero_and_empty_log_settings_mean_unset() {
        let config = Config::from_toml_str(
            r#"
            [log_aggregator]
            enabled = true
            log_dirs = ["logs"]
            time_range_hours = 0
            max_lines = 0
            log_level = ""
            "#,
        )
        .unwrap();
        let root = Path::new("/work/project");
        let agg = config
            .log_aggregator
            .as_ref()
            .unwrap()
            .aggregator_config(root);
        assert_eq!(agg.time_range_hours, None);
        assert_eq!(agg.max_lines, None);
        assert_eq!(agg.log_level, None);
        assert_eq!(agg.log_directories, vec![PathBuf::from("/work/project/logs")]);
        assert_eq!(
            agg.output_file,
            PathBuf::from("/work/project/.context/channel_output.txt")
        );
    }

    #[test]
    fn embedded_default_config_parses() {
        let text = default_config_text().unwrap();
        let config = Config::from_toml_str(&text).unwrap();
        assert!(config.tree.is_some());
        assert!(config.content.is_some());
        assert!(!config.is_log_aggregator_enabled());
    }

    #[test]
    fn load_or_default_leaves_missing_config_unwritten() {
        let tmp = tempfile::tempdir().unwrap();
        let config_path = Config::resolve_config_path(tmp.path(), None);
        let config = Config::load_or_default(&config_path).unwrap();
        assert!(!config_path.exists());
        assert!(!tmp.path().join(".context").exists());
        assert!(config.is_project_context_enabled());
    }

    #[test]
    fn load_or_default_prefers_the_existing_file() {
        let tmp = tempfile::tempdir().unwrap();
        let config_path = tmp.path().join("custom.toml");
        fs::write(&config_path, "[tree]\nenabled = false\n").unwrap();
        let config = Config::load_or_default(&config_path).unwrap();
        assert!(config.tree.is_some());
        assert!(config.content.is_none());
    }

    #[test]
    fn load_bootstraps_missing_config() {
        let tmp = tempfile::tempdir().unwrap();
        let config = Config::load(tmp.path(), None).unwrap();
        assert!(tmp.path().join(".context").join(DEFAULT_CONFIG_FILENAME).exists());
        assert!(config.is_project_context_enabled());
    }
}
