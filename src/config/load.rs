//! Settings file discovery, environment overlay, CLI overrides and dump.

use super::Settings;
use crate::error::{Error, Result};
use serde_yaml::{Mapping, Value};
use std::fs;
use std::path::{Path, PathBuf};

/// Settings file looked up in the module directory.
pub const SETTINGS_FILE: &str = ".tofu-docs.yml";

/// Prefix of every environment override.
const ENV_PREFIX: &str = "TOFU_DOCS_";

/// Environment variable naming the settings file.
const ENV_CONFIG: &str = "TOFU_DOCS_CONFIG";

/// Top-level keys the environment may set.
const ENV_KEYS: &[&str] = &[
    "debug",
    "changed_exit_code",
    "target",
    "target_config",
    "format",
    "replace",
];

/// CLI values that override the loaded settings.
///
/// Only `Some` values (and a set `debug` flag) override.
#[derive(Debug, Default)]
pub struct CliSettings {
    pub config_file: Option<PathBuf>,
    pub target: Option<String>,
    pub debug: bool,
}

/// Settings file location: `--config-file`, then `$TOFU_DOCS_CONFIG`, then
/// `.tofu-docs.yml` in the module directory.
pub fn settings_path(module_path: &Path, cli: &CliSettings, env: &[(String, String)]) -> PathBuf {
    if let Some(path) = &cli.config_file {
        return path.clone();
    }
    if let Some((_, path)) = env.iter().find(|(k, _)| k == ENV_CONFIG) {
        return PathBuf::from(path);
    }
    module_path.join(SETTINGS_FILE)
}

/// Resolve the full settings tree for a run.
///
/// `env` is the process environment (or a test double).
///
/// # Errors
///
/// Returns [`Error::Config`] when the file cannot be read or parsed, an
/// environment value does not fit its key, or validation fails.
pub fn load(
    module_path: &Path,
    cli: &CliSettings,
    env: impl IntoIterator<Item = (String, String)>,
) -> Result<Settings> {
    let env: Vec<(String, String)> = env.into_iter().collect();
    let path = settings_path(module_path, cli, &env);

    let mut tree = read_tree(&path)?;
    apply_env(&mut tree, &env)?;

    let mut settings: Settings = serde_yaml::from_value(tree)
        .map_err(|e| Error::config(path.display().to_string(), e.to_string()))?;
    apply_cli(&mut settings, cli);
    settings.validate()?;

    tracing::debug!("Loaded settings from {}", path.display());
    Ok(settings)
}

fn read_tree(path: &Path) -> Result<Value> {
    if path.is_dir() {
        return Err(Error::config(
            path.display().to_string(),
            "settings path is a directory",
        ));
    }
    if !path.exists() {
        tracing::debug!("No settings file at {}, using defaults", path.display());
        return Ok(Value::Mapping(Mapping::new()));
    }
    let content = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
    let tree: Value = serde_yaml::from_str(&content)
        .map_err(|e| Error::config(path.display().to_string(), e.to_string()))?;
    match tree {
        Value::Null => Ok(Value::Mapping(Mapping::new())),
        Value::Mapping(_) => Ok(tree),
        _ => Err(Error::config(
            path.display().to_string(),
            "settings file must contain a mapping",
        )),
    }
}

/// Write `TOFU_DOCS_<PATH>` variables into the settings tree.
///
/// `__` separates nesting levels, so `TOFU_DOCS_FORMAT__SKIP_AUTO=false` sets
/// `format.skip_auto`. A value is typed after the setting it targets: boolean
/// and numeric settings parse it, string settings take it verbatim, `replace`
/// takes a YAML document. Each override is checked on its own so a bad value
/// is reported against its variable name.
fn apply_env(tree: &mut Value, env: &[(String, String)]) -> Result<()> {
    let defaults = serde_yaml::to_value(Settings::default())
        .map_err(|e| Error::config("settings", e.to_string()))?;

    for (key, raw) in env {
        if key == ENV_CONFIG {
            continue;
        }
        let Some(rest) = key.strip_prefix(ENV_PREFIX) else {
            continue;
        };
        let path: Vec<String> = rest.to_lowercase().split("__").map(str::to_owned).collect();
        if !ENV_KEYS.contains(&path[0].as_str()) {
            tracing::debug!("Ignoring unknown environment setting {key}");
            continue;
        }
        let value = if path[0] == "replace" {
            serde_yaml::from_str(raw).map_err(|e| Error::config(key.clone(), e.to_string()))?
        } else {
            env_value(&defaults, &path, raw)
        };

        let mut candidate = defaults.clone();
        set_path(&mut candidate, &path, value.clone())
            .map_err(|message| Error::config(key.clone(), message))?;
        serde_yaml::from_value::<Settings>(candidate)
            .map_err(|e| Error::config(key.clone(), e.to_string()))?;

        tracing::debug!("Environment override {}", path.join("."));
        set_path(tree, &path, value).map_err(|message| Error::config(key.clone(), message))?;
    }
    Ok(())
}

/// Type `raw` after the default value at `path`: strings stay strings,
/// anything else is read as a YAML scalar.
fn env_value(defaults: &Value, path: &[String], raw: &str) -> Value {
    match lookup(defaults, path) {
        Some(Value::String(_)) | None => Value::String(raw.to_owned()),
        Some(_) => env_scalar(raw),
    }
}

fn lookup<'v>(tree: &'v Value, path: &[String]) -> Option<&'v Value> {
    path.iter().try_fold(tree, |node, key| node.get(key.as_str()))
}

/// Booleans and numbers keep their YAML type; everything else is a string.
fn env_scalar(raw: &str) -> Value {
    match serde_yaml::from_str::<Value>(raw) {
        Ok(v @ (Value::Bool(_) | Value::Number(_))) => v,
        _ => Value::String(raw.to_owned()),
    }
}

fn set_path(tree: &mut Value, path: &[String], value: Value) -> std::result::Result<(), String> {
    let Value::Mapping(map) = tree else {
        return Err("cannot set a nested key below a scalar value".to_owned());
    };
    let key = Value::String(path[0].clone());
    if path.len() == 1 {
        map.insert(key, value);
        return Ok(());
    }
    let child = map
        .entry(key)
        .or_insert_with(|| Value::Mapping(Mapping::new()));
    set_path(child, &path[1..], value)
}

fn apply_cli(settings: &mut Settings, cli: &CliSettings) {
    if let Some(target) = &cli.target {
        settings.target.clone_from(target);
    }
    if cli.debug {
        settings.debug = true;
    }
}

/// Write the effective settings to `path`.
///
/// # Errors
///
/// Refuses to replace an existing file unless `overwrite` is set.
pub fn dump(settings: &Settings, path: &Path, overwrite: bool) -> Result<()> {
    if path.exists() && !overwrite {
        return Err(Error::config(
            path.display().to_string(),
            "settings file already exists (use --dump-overwrite to replace it)",
        ));
    }
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
    }
    fs::write(path, settings.to_yaml()?).map_err(|e| Error::io(path, e))?;
    tracing::info!("Wrote settings to {}", path.display());
    Ok(())
}
