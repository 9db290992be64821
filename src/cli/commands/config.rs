//! Configuration inspection command.
//!
//! Provides CLI access to the layered configuration system:
//! - Show current merged configuration with the source of each value
//! - Get individual config values
//! - Show config file paths

use crate::cli::ConfigArgs;
use crate::config::{
    self, CONFIG_FILENAME, CliOverrides, ConfigLayer, ConfigSource, discover_project_dir,
    load_sourced_layers, user_config_path,
};
use crate::error::{BagzError, OptionExt, Result};
use crate::output::OutputContext;
use serde::Serialize;
use serde_json::json;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
struct ConfigEntry {
    value: String,
    source: &'static str,
}

/// Execute the config command.
///
/// # Errors
///
/// Returns an error if config files cannot be parsed or a requested key is
/// not set.
pub fn execute(args: &ConfigArgs, cli: &CliOverrides, ctx: &OutputContext) -> Result<()> {
    let project_dir = discover_project_dir(None);
    debug!(project_dir = ?project_dir, "Config command");

    if args.path {
        return show_paths(project_dir.as_deref(), ctx);
    }

    let layers = load_sourced_layers(project_dir.as_deref(), cli)?;
    let entries = collect_entries(&layers);

    if let Some(key) = &args.get {
        return get_value(&entries, key, ctx);
    }

    list_values(&entries, ctx)
}

/// Merge layers while remembering which layer supplied each final value.
fn collect_entries(layers: &[(ConfigSource, ConfigLayer)]) -> BTreeMap<String, ConfigEntry> {
    let mut entries = BTreeMap::new();
    for (source, layer) in layers {
        for (key, value) in layer.entries() {
            entries.insert(
                key,
                ConfigEntry {
                    value,
                    source: source.label(),
                },
            );
        }
    }
    entries
}

fn get_value(entries: &BTreeMap<String, ConfigEntry>, key: &str, ctx: &OutputContext) -> Result<()> {
    let canonical = config::canonical_key(key);
    let entry = entries
        .get(&canonical)
        .ok_or_bagz(|| BagzError::ConfigKeyNotFound {
            key: key.to_string(),
        })?;

    if ctx.is_json() {
        return ctx.json_pretty(&json!({
            "key": canonical,
            "value": entry.value,
            "source": entry.source,
        }));
    }
    ctx.emit(&format!("{}\n", entry.value))
}

fn list_values(entries: &BTreeMap<String, ConfigEntry>, ctx: &OutputContext) -> Result<()> {
    if ctx.is_json() {
        return ctx.json_pretty(entries);
    }
    let width = entries.keys().map(String::len).max().unwrap_or(0);
    for (key, entry) in entries {
        let value = if entry.value.is_empty() {
            "(empty)"
        } else {
            entry.value.as_str()
        };
        ctx.emit(&format!("{key:<width$} = {value}  [{}]", entry.source))?;
    }
    Ok(())
}

fn show_paths(project_dir: Option<&Path>, ctx: &OutputContext) -> Result<()> {
    let project = project_dir.map(|dir| dir.join(CONFIG_FILENAME));
    let user = user_config_path();

    if ctx.is_json() {
        return ctx.json_pretty(&json!({
            "project": project.as_ref().map(|p| p.display().to_string()),
            "user": user.as_ref().map(|p| p.display().to_string()),
        }));
    }

    let describe = |path: Option<&Path>| match path {
        Some(path) if path.exists() => path.display().to_string(),
        Some(path) => format!("{} (not found)", path.display()),
        None => "(none)".to_string(),
    };
    ctx.emit(&format!("project: {}", describe(project.as_deref())))?;
    ctx.emit(&format!("user:    {}", describe(user.as_deref())))
}
