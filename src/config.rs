//! Entry filtering configuration.
//!
//! Rules are loaded from a TOML file and decide which regular files of the target
//! directory are left where they are:
//!
//! ```toml
//! [filters]
//! enable_hidden_files = true
//!
//! [filters.exclude]
//! filenames = [".DS_Store", "Thumbs.db"]
//! patterns = ["*.part", "~*"]
//! extensions = ["tmp", "crdownload"]
//! regex = ['^IMG_\d+\.lock$']
//!
//! [filters.include]
//! patterns = [".keepme"]
//! ```
//!
//! Patterns are matched against the entry name only, since the walk never descends
//! into subdirectories.

use glob::Pattern;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Name of the per-directory configuration file looked up in the working directory.
pub const LOCAL_CONFIG_NAME: &str = ".datesortrc.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {}", .0.display())]
    ConfigNotFound(PathBuf),
    #[error("Invalid configuration: {0}")]
    ConfigInvalid(String),
    #[error("Invalid glob pattern '{0}'")]
    InvalidGlobPattern(String),
    #[error("Invalid regex pattern '{pattern}': {reason}")]
    InvalidRegexPattern { pattern: String, reason: String },
    #[error("IO error reading configuration: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FilterConfig {
    #[serde(default)]
    pub filters: FilterRules,

    /// Canonical path of the file the rules were read from, if any.
    #[serde(skip)]
    pub source: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterRules {
    /// Whether entries starting with "." are organized. Defaults to true.
    #[serde(default = "default_enable_hidden_files")]
    pub enable_hidden_files: bool,

    #[serde(default)]
    pub exclude: ExcludeRules,

    /// Whitelist that wins over every exclude rule.
    #[serde(default)]
    pub include: IncludeRules,
}

fn default_enable_hidden_files() -> bool {
    true
}

impl Default for FilterRules {
    fn default() -> Self {
        Self {
            enable_hidden_files: default_enable_hidden_files(),
            exclude: ExcludeRules::default(),
            include: IncludeRules::default(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExcludeRules {
    #[serde(default)]
    pub filenames: Vec<String>,
    #[serde(default)]
    pub patterns: Vec<String>,
    /// Compared case-insensitively, without the leading dot.
    #[serde(default)]
    pub extensions: Vec<String>,
    #[serde(default)]
    pub regex: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IncludeRules {
    #[serde(default)]
    pub patterns: Vec<String>,
}

impl FilterConfig {
    /// Loads the configuration, trying in order:
    /// 1. `config_path`, if given (it must exist)
    /// 2. `.datesortrc.toml` in the current directory
    /// 3. `~/.config/datesort/config.toml`
    /// 4. built-in defaults
    pub fn load(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = config_path {
            return Self::load_from_file(path);
        }

        let local_config = PathBuf::from(LOCAL_CONFIG_NAME);
        if local_config.is_file() {
            return Self::load_from_file(&local_config);
        }

        if let Ok(home) = std::env::var("HOME") {
            let home_config = PathBuf::from(home)
                .join(".config")
                .join("datesort")
                .join("config.toml");
            if home_config.is_file() {
                return Self::load_from_file(&home_config);
            }
        }

        Ok(Self::default())
    }

    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::ConfigNotFound(path.to_path_buf()));
        }
        let content = fs::read_to_string(path)?;
        let mut config = Self::from_toml(&content)?;
        config.source = Some(fs::canonicalize(path)?);
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::ConfigInvalid(e.to_string()))
    }

    /// Validates and pre-compiles every pattern.
    pub fn compile(self) -> Result<CompiledFilters, ConfigError> {
        let mut compiled = CompiledFilters::new(self.filters)?;
        compiled.source = self.source;
        Ok(compiled)
    }
}

/// Filter rules with glob and regex patterns compiled once per run.
#[derive(Debug)]
pub struct CompiledFilters {
    enable_hidden_files: bool,
    exclude_filenames: HashSet<String>,
    exclude_extensions: HashSet<String>,
    exclude_patterns: Vec<Pattern>,
    exclude_regexes: Vec<Regex>,
    include_patterns: Vec<Pattern>,
    source: Option<PathBuf>,
}

fn compile_globs(patterns: &[String]) -> Result<Vec<Pattern>, ConfigError> {
    patterns
        .iter()
        .map(|p| Pattern::new(p).map_err(|_| ConfigError::InvalidGlobPattern(p.clone())))
        .collect()
}

impl CompiledFilters {
    fn new(rules: FilterRules) -> Result<Self, ConfigError> {
        let exclude_patterns = compile_globs(&rules.exclude.patterns)?;
        let include_patterns = compile_globs(&rules.include.patterns)?;

        let exclude_regexes = rules
            .exclude
            .regex
            .iter()
            .map(|pattern| {
                Regex::new(pattern).map_err(|e| ConfigError::InvalidRegexPattern {
                    pattern: pattern.clone(),
                    reason: e.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            enable_hidden_files: rules.enable_hidden_files,
            exclude_filenames: rules.exclude.filenames.into_iter().collect(),
            exclude_extensions: rules
                .exclude
                .extensions
                .iter()
                .map(|ext| ext.trim_start_matches('.').to_lowercase())
                .collect(),
            exclude_patterns,
            exclude_regexes,
            include_patterns,
            source: None,
        })
    }

    /// Canonical path of the configuration file these filters came from.
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    /// Whether the entry called `file_name` should be organized.
    ///
    /// Include patterns are checked first and always win. Then, in order, hidden
    /// entries, exact names, extensions, globs and regexes can exclude the entry.
    pub fn should_include(&self, file_name: &Path) -> bool {
        let name = file_name
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_default();

        if self
            .include_patterns
            .iter()
            .any(|pattern| pattern.matches_path(file_name))
        {
            return true;
        }

        if !self.enable_hidden_files && name.starts_with('.') {
            return false;
        }

        if self.exclude_filenames.contains(name.as_ref()) {
            return false;
        }

        if let Some(ext) = file_name.extension() {
            let ext = ext.to_string_lossy().to_lowercase();
            if self.exclude_extensions.contains(&ext) {
                return false;
            }
        }

        if self
            .exclude_patterns
            .iter()
            .any(|pattern| pattern.matches_path(file_name))
        {
            return false;
        }

        !self.exclude_regexes.iter().any(|re| re.is_match(&name))
    }
}

impl Default for CompiledFilters {
    fn default() -> Self {
        Self {
            enable_hidden_files: default_enable_hidden_files(),
            exclude_filenames: HashSet::new(),
            exclude_extensions: HashSet::new(),
            exclude_patterns: Vec::new(),
            exclude_regexes: Vec::new(),
            include_patterns: Vec::new(),
            source: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compile(content: &str) -> CompiledFilters {
        FilterConfig::from_toml(content)
            .expect("Failed to parse configuration")
            .compile()
            .expect("Failed to compile filters")
    }

    #[test]
    fn test_default_config_includes_everything() {
        let compiled = FilterConfig::default().compile().unwrap();
        assert!(compiled.should_include(Path::new("report.txt")));
        assert!(compiled.should_include(Path::new(".bashrc")));
        assert!(compiled.should_include(Path::new("no_extension")));
    }

    #[test]
    fn test_empty_toml_uses_defaults() {
        let config = FilterConfig::from_toml("").unwrap();
        assert!(config.filters.enable_hidden_files);
        assert!(config.filters.exclude.patterns.is_empty());
    }

    #[test]
    fn test_hidden_files_can_be_disabled() {
        let compiled = compile("[filters]\nenable_hidden_files = false\n");
        assert!(!compiled.should_include(Path::new(".DS_Store")));
        assert!(compiled.should_include(Path::new("photo.jpg")));
    }

    #[test]
    fn test_exclude_filenames_and_extensions() {
        let compiled = compile(
            r#"
            [filters.exclude]
            filenames = ["Thumbs.db"]
            extensions = ["tmp", ".PART"]
            "#,
        );
        assert!(!compiled.should_include(Path::new("Thumbs.db")));
        assert!(!compiled.should_include(Path::new("download.TMP")));
        assert!(!compiled.should_include(Path::new("video.part")));
        assert!(compiled.should_include(Path::new("video.mp4")));
    }

    #[test]
    fn test_exclude_glob_and_regex() {
        let compiled = compile(
            r#"
            [filters.exclude]
            patterns = ["~*", "*.bak"]
            regex = ['^IMG_\d+\.lock$']
            "#,
        );
        assert!(!compiled.should_include(Path::new("~lockfile")));
        assert!(!compiled.should_include(Path::new("notes.bak")));
        assert!(!compiled.should_include(Path::new("IMG_0042.lock")));
        assert!(compiled.should_include(Path::new("IMG_0042.jpg")));
    }

    #[test]
    fn test_include_overrides_exclude() {
        let compiled = compile(
            r#"
            [filters]
            enable_hidden_files = false

            [filters.exclude]
            extensions = ["log"]

            [filters.include]
            patterns = [".keepme", "server.log"]
            "#,
        );
        assert!(compiled.should_include(Path::new(".keepme")));
        assert!(compiled.should_include(Path::new("server.log")));
        assert!(!compiled.should_include(Path::new("client.log")));
        assert!(!compiled.should_include(Path::new(".other")));
    }

    #[test]
    fn test_invalid_patterns_are_rejected() {
        let glob = FilterConfig::from_toml("[filters.exclude]\npatterns = [\"[unclosed\"]\n")
            .unwrap()
            .compile();
        assert!(matches!(glob, Err(ConfigError::InvalidGlobPattern(_))));

        let regex = FilterConfig::from_toml("[filters.exclude]\nregex = [\"(open\"]\n")
            .unwrap()
            .compile();
        assert!(matches!(regex, Err(ConfigError::InvalidRegexPattern { .. })));
    }

    #[test]
    fn test_invalid_toml() {
        let result = FilterConfig::from_toml("[filters\nbroken");
        assert!(matches!(result, Err(ConfigError::ConfigInvalid(_))));
    }

    #[test]
    fn test_explicit_missing_config_file() {
        let result = FilterConfig::load(Some(Path::new("/non/existent/datesort.toml")));
        assert!(matches!(result, Err(ConfigError::ConfigNotFound(_))));
    }

    #[test]
    fn test_load_from_explicit_file() {
        let temp_dir = tempfile::TempDir::new().expect("Failed to create temp directory");
        let path = temp_dir.path().join("config.toml");
        fs::write(&path, "[filters.exclude]\nextensions = [\"iso\"]\n").unwrap();

        let compiled = FilterConfig::load(Some(&path)).unwrap().compile().unwrap();
        assert!(!compiled.should_include(Path::new("disk.iso")));
    }

    #[test]
    fn test_loaded_file_is_reported_as_source() {
        let temp_dir = tempfile::TempDir::new().expect("Failed to create temp directory");
        let path = temp_dir.path().join("rules.toml");
        fs::write(&path, "[filters.exclude]\nextensions = [\"part\"]\n").unwrap();

        let config = FilterConfig::load(Some(&path)).unwrap();
        let expected = fs::canonicalize(&path).unwrap();
        assert_eq!(config.source.as_deref(), Some(expected.as_path()));
        assert_eq!(config.compile().unwrap().source(), Some(expected.as_path()));
    }

    #[test]
    fn test_inline_config_has_no_source() {
        assert!(compile("[filters]\n").source().is_none());
        assert!(CompiledFilters::default().source().is_none());
    }
}
