//! Configuration management for `bagzulla`.
//!
//! Configuration sources and precedence (highest wins):
//! 1. CLI overrides
//! 2. Environment variables (`BAGZ_*`)
//! 3. Project config (.bagz/config.yaml)
//! 4. User config (~/.config/bagz/config.yaml)
//! 5. Defaults

use crate::error::{BagzError, Result};
use std::collections::{BTreeMap, HashMap};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Project configuration directory name.
pub const PROJECT_DIR: &str = ".bagz";
/// Config filename inside project and user config directories.
pub const CONFIG_FILENAME: &str = "config.yaml";
/// Environment prefix for config keys.
const ENV_PREFIX: &str = "BAGZ_";

/// Canonical key for the site root used to build bug links.
pub const URL_KEY: &str = "url";
/// Accepted spellings of [`URL_KEY`], after normalization.
///
/// `top-url` matches the site-root setting of the web application.
const URL_ALIASES: &[&str] = &["url", "top-url", "base-url", "bug-base-url"];

/// A flat configuration layer keyed by normalized dotted keys.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigLayer {
    pub values: HashMap<String, String>,
}

impl ConfigLayer {
    /// Merge another layer on top of this one (higher precedence wins).
    pub fn merge_from(&mut self, other: &Self) {
        for (key, value) in &other.values {
            self.values.insert(key.clone(), value.clone());
        }
    }

    /// Merge multiple layers in precedence order (lowest to highest).
    #[must_use]
    pub fn merge_layers(layers: &[Self]) -> Self {
        let mut merged = Self::default();
        for layer in layers {
            merged.merge_from(layer);
        }
        merged
    }

    /// Build a layer from a YAML file path. Missing files return empty config.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn from_yaml(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let parse_error = |reason: String| BagzError::ConfigParse {
            path: path.to_path_buf(),
            reason,
        };
        let contents = String::from_utf8(fs::read(path)?)
            .map_err(|e| parse_error(format!("not valid UTF-8: {e}")))?;
        let value: serde_yaml::Value =
            serde_yaml::from_str(&contents).map_err(|e| parse_error(e.to_string()))?;
        if !matches!(
            value,
            serde_yaml::Value::Mapping(_) | serde_yaml::Value::Null
        ) {
            return Err(parse_error("top level must be a mapping of keys".to_string()));
        }
        debug!(path = %path.display(), "Loaded config file");
        Ok(layer_from_yaml_value(&value))
    }

    /// Build a layer from `BAGZ_*` environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_vars(env::vars())
    }

    /// Build a layer from an explicit set of environment-style pairs.
    #[must_use]
    pub fn from_vars<I>(vars: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut layer = Self::default();
        for (key, value) in vars {
            // BAGZ_DIR locates the project, it is not a setting.
            if key == "BAGZ_DIR" {
                continue;
            }
            if let Some(stripped) = key.strip_prefix(ENV_PREFIX) {
                layer.insert(stripped, value);
            }
        }
        layer
    }

    /// Set `key` to `value`. Aliases of the bug base URL are stored under
    /// [`URL_KEY`].
    pub fn insert(&mut self, key: &str, value: String) {
        self.values.insert(canonical_key(key), value);
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&String> {
        self.values.get(&canonical_key(key))
    }

    /// All values, sorted by key.
    #[must_use]
    pub fn entries(&self) -> BTreeMap<String, String> {
        self.values
            .iter()
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect()
    }
}

/// CLI overrides for config loading.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub url: Option<String>,
}

impl CliOverrides {
    #[must_use]
    pub fn as_layer(&self) -> ConfigLayer {
        let mut layer = ConfigLayer::default();
        if let Some(url) = &self.url {
            layer.insert(URL_KEY, url.clone());
        }
        layer
    }
}

/// Find the project `.bagz` directory.
///
/// Honors `BAGZ_DIR` when set, otherwise walks up from `start` (or CWD).
/// Returns `None` when no project directory exists.
#[must_use]
pub fn discover_project_dir(start: Option<&Path>) -> Option<PathBuf> {
    discover_project_dir_with_env(start, env::var_os("BAGZ_DIR").map(PathBuf::from))
}

fn discover_project_dir_with_env(
    start: Option<&Path>,
    env_dir: Option<PathBuf>,
) -> Option<PathBuf> {
    if let Some(dir) = env_dir {
        if dir.is_dir() {
            return Some(dir);
        }
        debug!(path = %dir.display(), "BAGZ_DIR does not exist, ignoring");
    }

    let start = match start {
        Some(path) => path.to_path_buf(),
        None => env::current_dir().ok()?,
    };
    let mut current = start.as_path();
    loop {
        let candidate = current.join(PROJECT_DIR);
        if candidate.is_dir() {
            return Some(candidate);
        }
        current = current.parent()?;
    }
}

/// Path of the user config file (~/.config/bagz/config.yaml), if HOME is set.
#[must_use]
pub fn user_config_path() -> Option<PathBuf> {
    let home = env::var_os("HOME")?;
    Some(
        Path::new(&home)
            .join(".config")
            .join("bagz")
            .join(CONFIG_FILENAME),
    )
}

/// Load project config (.bagz/config.yaml).
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load_project_config(project_dir: &Path) -> Result<ConfigLayer> {
    ConfigLayer::from_yaml(&project_dir.join(CONFIG_FILENAME))
}

/// Load user config (~/.config/bagz/config.yaml).
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load_user_config() -> Result<ConfigLayer> {
    match user_config_path() {
        Some(path) => ConfigLayer::from_yaml(&path),
        None => Ok(ConfigLayer::default()),
    }
}

/// Default config layer (lowest precedence).
#[must_use]
pub fn default_config_layer() -> ConfigLayer {
    let mut layer = ConfigLayer::default();
    layer.insert(URL_KEY, String::new());
    layer
}

/// Where a config value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSource {
    Default,
    User,
    Project,
    Environment,
    Cli,
}

impl ConfigSource {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::User => "user config",
            Self::Project => ".bagz/config",
            Self::Environment => "environment",
            Self::Cli => "cli",
        }
    }
}

/// Load every layer, lowest precedence first, tagged with its source.
///
/// # Errors
///
/// Returns an error if any config file cannot be read or parsed.
pub fn load_sourced_layers(
    project_dir: Option<&Path>,
    cli: &CliOverrides,
) -> Result<Vec<(ConfigSource, ConfigLayer)>> {
    let project = match project_dir {
        Some(dir) => load_project_config(dir)?,
        None => ConfigLayer::default(),
    };
    Ok(vec![
        (ConfigSource::Default, default_config_layer()),
        (ConfigSource::User, load_user_config()?),
        (ConfigSource::Project, project),
        (ConfigSource::Environment, ConfigLayer::from_env()),
        (ConfigSource::Cli, cli.as_layer()),
    ])
}

/// Load configuration with the full precedence order.
///
/// # Errors
///
/// Returns an error if any config file cannot be read or parsed.
pub fn load_config(project_dir: Option<&Path>, cli: &CliOverrides) -> Result<ConfigLayer> {
    let layers: Vec<ConfigLayer> = load_sourced_layers(project_dir, cli)?
        .into_iter()
        .map(|(_, layer)| layer)
        .collect();
    Ok(ConfigLayer::merge_layers(&layers))
}

/// Bug base URL from a merged layer. Empty when nothing sets it.
#[must_use]
pub fn bug_base_url_from_layer(layer: &ConfigLayer) -> String {
    layer.get(URL_KEY).map(|v| v.trim().to_string()).unwrap_or_default()
}

/// Normalize `key` (case, `_` vs `-`) and fold bug base URL aliases into
/// [`URL_KEY`].
#[must_use]
pub fn canonical_key(key: &str) -> String {
    let normalized = normalize_key(key);
    if URL_ALIASES.contains(&normalized.as_str()) {
        URL_KEY.to_string()
    } else {
        normalized
    }
}

fn normalize_key(key: &str) -> String {
    key.trim().to_lowercase().replace('_', "-")
}

fn layer_from_yaml_value(value: &serde_yaml::Value) -> ConfigLayer {
    let mut layer = ConfigLayer::default();
    let mut flat = HashMap::new();
    flatten_yaml(value, "", &mut flat);

    for (key, value) in flat {
        layer.insert(&key, value);
    }

    layer
}

fn flatten_yaml(value: &serde_yaml::Value, prefix: &str, out: &mut HashMap<String, String>) {
    match value {
        serde_yaml::Value::Mapping(map) => {
            for (key, value) in map {
                let Some(key_str) = key.as_str() else {
                    continue;
                };
                let next_prefix = if prefix.is_empty() {
                    key_str.to_string()
                } else {
                    format!("{prefix}.{key_str}")
                };
                flatten_yaml(value, &next_prefix, out);
            }
        }
        serde_yaml::Value::Sequence(values) => {
            let joined = values
                .iter()
                .filter_map(yaml_scalar_to_string)
                .collect::<Vec<_>>()
                .join(",");
            out.insert(prefix.to_string(), joined);
        }
        _ => {
            if let Some(value) = yaml_scalar_to_string(value) {
                out.insert(prefix.to_string(), value);
            }
        }
    }
}

fn yaml_scalar_to_string(value: &serde_yaml::Value) -> Option<String> {
    match value {
        serde_yaml::Value::Bool(v) => Some(v.to_string()),
        serde_yaml::Value::Number(n) => Some(n.to_string()),
        serde_yaml::Value::String(s) => Some(s.clone()),
        serde_yaml::Value::Null
        | serde_yaml::Value::Sequence(_)
        | serde_yaml::Value::Mapping(_) => None,
        serde_yaml::Value::Tagged(tagged) => yaml_scalar_to_string(&tagged.value),
    }
}
