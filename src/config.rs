//! Configuration handling for owl templates.
//! This module describes the project and template settings and reads the
//! template config file (`owl_config.toml`, `.yaml` or `.json`) into a
//! format-independent tree queried by dotted keys.

use crate::constants::{CACHE_DIR_NAME, CONFIG_FILE_NAME};
use crate::error::{Error, Result};
use crate::fs::FileSystem;
use indexmap::IndexMap;
use log::debug;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Settings of the project being created. Fixed once creation starts.
#[derive(Debug, Clone)]
pub struct ProjectConfig {
    /// Name of the project directory.
    pub name: String,
    /// Template name, relative template path or remote repository.
    pub template: String,
    /// Directories searched for local templates, in order.
    pub templates_dirs: Vec<PathBuf>,
    pub verbose: bool,
    /// Where remote templates are cloned to.
    pub cache_dir: PathBuf,
    /// Directory in which the project directory is created.
    pub base_dir: PathBuf,
    /// Clone with the `git` executable instead of libgit2.
    pub use_git_cli: bool,
}

impl ProjectConfig {
    pub fn new<N: Into<String>, T: Into<String>>(name: N, template: T) -> Self {
        Self {
            name: name.into(),
            template: template.into(),
            templates_dirs: Vec::new(),
            verbose: false,
            cache_dir: default_cache_dir(),
            base_dir: PathBuf::from("."),
            use_git_cli: false,
        }
    }

    /// Full path of the project root.
    pub fn project_root(&self) -> PathBuf {
        self.base_dir.join(&self.name)
    }
}

/// `<system temp>/owl`
pub fn default_cache_dir() -> PathBuf {
    std::env::temp_dir().join(CACHE_DIR_NAME)
}

/// Supported template config file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum ConfigFormat {
    #[default]
    Toml,
    Yaml,
    Json,
}

impl ConfigFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ConfigFormat::Toml => "toml",
            ConfigFormat::Yaml => "yaml",
            ConfigFormat::Json => "json",
        }
    }
}

impl fmt::Display for ConfigFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ConfigFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "toml" => Ok(ConfigFormat::Toml),
            "yaml" | "yml" => Ok(ConfigFormat::Yaml),
            "json" => Ok(ConfigFormat::Json),
            other => Err(Error::ConfigError(format!("unsupported config format '{other}'"))),
        }
    }
}

/// Settings describing how a template is read.
#[derive(Debug, Clone)]
pub struct TemplateConfig {
    /// Set once the template has been resolved.
    pub path: Option<PathBuf>,
    pub format: ConfigFormat,
    /// Config file base name, without extension.
    pub name: String,
    /// Values available to script command templates.
    pub context: serde_json::Value,
}

impl Default for TemplateConfig {
    fn default() -> Self {
        Self {
            path: None,
            format: ConfigFormat::default(),
            name: CONFIG_FILE_NAME.to_string(),
            context: serde_json::Value::Object(serde_json::Map::new()),
        }
    }
}

impl TemplateConfig {
    /// `owl_config.toml` for the default settings.
    pub fn file_name(&self) -> String {
        format!("{}.{}", self.name, self.format.extension())
    }
}

/// Read access to a structured config document by dotted keys,
/// e.g. `scripts.oncreate.linux`.
pub trait ConfigSource {
    /// Keys of the table at `key`, in document order. Empty if the key is
    /// missing or not a table.
    fn keys_at(&self, key: &str) -> Vec<String>;

    /// The list of strings at `key`. A missing key yields an empty list and a
    /// single string yields a one-element list.
    fn get_string_list_at(&self, key: &str) -> Result<Vec<String>>;

    /// Every entry of the table at `key` as a list of strings, in document
    /// order. Entry names are taken as-is, so they may contain dots. A missing
    /// key yields an empty map.
    fn get_string_lists_at(&self, key: &str) -> Result<IndexMap<String, Vec<String>>>;
}

/// A parsed config document.
#[derive(Debug, Clone)]
pub struct StructuredConfig {
    root: serde_json::Value,
}

impl StructuredConfig {
    /// Parses `content` in the given format.
    pub fn parse(content: &str, format: ConfigFormat) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self { root: serde_json::json!({}) });
        }
        let root = match format {
            ConfigFormat::Toml => toml::from_str::<serde_json::Value>(content)
                .map_err(|e| Error::ConfigError(format!("Invalid TOML: {}", e)))?,
            ConfigFormat::Yaml => serde_yaml::from_str::<serde_json::Value>(content)
                .map_err(|e| Error::ConfigError(format!("Invalid YAML: {}", e)))?,
            ConfigFormat::Json => serde_json::from_str::<serde_json::Value>(content)
                .map_err(|e| Error::ConfigError(format!("Invalid JSON: {}", e)))?,
        };
        // A YAML document holding only comments parses to null.
        let root = if root.is_null() { serde_json::json!({}) } else { root };
        Ok(Self { root })
    }

    /// Reads and parses a config file.
    pub fn load(fs: &dyn FileSystem, path: &Path, format: ConfigFormat) -> Result<Self> {
        debug!("Loading configuration from {}", path.display());
        let content = fs.read_file(path)?;
        let content = String::from_utf8(content).map_err(|e| {
            Error::ConfigError(format!("{} is not valid UTF-8: {}", path.display(), e))
        })?;
        Self::parse(&content, format)
    }

    fn lookup(&self, key: &str) -> Option<&serde_json::Value> {
        key.split('.')
            .filter(|segment| !segment.is_empty())
            .try_fold(&self.root, |value, segment| value.get(segment))
    }
}

impl ConfigSource for StructuredConfig {
    fn keys_at(&self, key: &str) -> Vec<String> {
        match self.lookup(key) {
            Some(serde_json::Value::Object(map)) => map.keys().cloned().collect(),
            _ => Vec::new(),
        }
    }

    fn get_string_list_at(&self, key: &str) -> Result<Vec<String>> {
        match self.lookup(key) {
            None => Ok(Vec::new()),
            Some(value) => string_list(key, value),
        }
    }

    fn get_string_lists_at(&self, key: &str) -> Result<IndexMap<String, Vec<String>>> {
        match self.lookup(key) {
            None | Some(serde_json::Value::Null) => Ok(IndexMap::new()),
            Some(serde_json::Value::Object(map)) => map
                .iter()
                .map(|(name, value)| {
                    let commands = string_list(&format!("{key}.{name}"), value)?;
                    Ok((name.clone(), commands))
                })
                .collect(),
            Some(other) => Err(Error::ConfigError(format!(
                "'{key}' must be a table, found {other}"
            ))),
        }
    }
}

fn string_list(key: &str, value: &serde_json::Value) -> Result<Vec<String>> {
    match value {
        serde_json::Value::Null => Ok(Vec::new()),
        serde_json::Value::String(s) => Ok(vec![s.clone()]),
        serde_json::Value::Array(items) => items
            .iter()
            .map(|item| match item {
                serde_json::Value::String(s) => Ok(s.clone()),
                other => Err(Error::ConfigError(format!(
                    "'{key}' must contain only strings, found {other}"
                ))),
            })
            .collect(),
        other => Err(Error::ConfigError(format!(
            "'{key}' must be a list of strings, found {other}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOML_CONFIG: &str = r#"
[scripts.oncreate.universal]
init = ["git init", "echo {{ name }}"]
greet = "echo hi"

[scripts.oncreate.linux]
deps = ["apt list"]
"#;

    #[test]
    fn test_toml_keys_keep_document_order() {
        let config = StructuredConfig::parse(TOML_CONFIG, ConfigFormat::Toml).unwrap();
        assert_eq!(config.keys_at("scripts.oncreate.universal"), vec!["init", "greet"]);
        assert_eq!(config.keys_at("scripts.oncreate"), vec!["universal", "linux"]);
        assert!(config.keys_at("scripts.onmount.universal").is_empty());
    }

    #[test]
    fn test_string_list_lookup() {
        let config = StructuredConfig::parse(TOML_CONFIG, ConfigFormat::Toml).unwrap();
        assert_eq!(
            config.get_string_list_at("scripts.oncreate.universal.init").unwrap(),
            vec!["git init", "echo {{ name }}"]
        );
        assert_eq!(
            config.get_string_list_at("scripts.oncreate.universal.greet").unwrap(),
            vec!["echo hi"]
        );
        assert!(config.get_string_list_at("scripts.nothing.here").unwrap().is_empty());
    }

    #[test]
    fn test_invalid_list_shape() {
        let config =
            StructuredConfig::parse(r#"{"scripts": {"a": [1, 2]}}"#, ConfigFormat::Json).unwrap();
        assert!(matches!(config.get_string_list_at("scripts.a"), Err(Error::ConfigError(_))));
    }

    #[test]
    fn test_string_lists_keep_dotted_names() {
        let toml = r#"
[scripts.oncreate.universal]
"setup.py" = ["python setup.py install"]
lint = "ruff"
"#;
        let config = StructuredConfig::parse(toml, ConfigFormat::Toml).unwrap();
        let lists = config.get_string_lists_at("scripts.oncreate.universal").unwrap();
        assert_eq!(lists.keys().collect::<Vec<_>>(), vec!["setup.py", "lint"]);
        assert_eq!(lists["setup.py"], vec!["python setup.py install"]);
        assert_eq!(lists["lint"], vec!["ruff"]);

        assert!(config.get_string_lists_at("scripts.onmount.linux").unwrap().is_empty());
        assert!(matches!(
            config.get_string_lists_at("scripts.oncreate.universal.lint"),
            Err(Error::ConfigError(_))
        ));
    }

    #[test]
    fn test_yaml_and_empty_documents() {
        let yaml = "scripts:\n  onmount:\n    universal:\n      build: [\"make\"]\n";
        let config = StructuredConfig::parse(yaml, ConfigFormat::Yaml).unwrap();
        assert_eq!(config.keys_at("scripts.onmount.universal"), vec!["build"]);

        let empty = StructuredConfig::parse("", ConfigFormat::Yaml).unwrap();
        assert!(empty.keys_at("scripts").is_empty());
    }

    #[test]
    fn test_config_format_from_str() {
        assert_eq!("TOML".parse::<ConfigFormat>().unwrap(), ConfigFormat::Toml);
        assert_eq!("yml".parse::<ConfigFormat>().unwrap(), ConfigFormat::Yaml);
        assert!("ini".parse::<ConfigFormat>().is_err());
    }

    #[test]
    fn test_template_config_file_name() {
        let config = TemplateConfig { format: ConfigFormat::Json, ..Default::default() };
        assert_eq!(config.file_name(), "owl_config.json");
    }
}
