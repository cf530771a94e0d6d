//! Configuration file loader
//!
//! YAML and TOML files are both read into a JSON tree before deserializing, so the two
//! formats share the same directives:
//! - `$include: cloudflare.yaml` inside a mapping splices that file in; sibling keys of
//!   the directive override what the included file sets
//! - `${ENV_VAR:default}` is expanded inside any string value

use crate::{PipelineError, Result};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

const INCLUDE_KEY: &str = "$include";

/// Includes nested deeper than this are treated as a cycle
const MAX_INCLUDE_DEPTH: usize = 8;

/// Load `path` with includes resolved and variables expanded, then deserialize it
pub fn load_config_file<T: DeserializeOwned, P: AsRef<Path>>(path: P) -> Result<T> {
    let path = path.as_ref();
    let tree = load_tree(path)?;
    serde_json::from_value(tree)
        .map_err(|e| PipelineError::Config(format!("{}: {}", path.display(), e)))
}

/// The resolved document tree of `path`
pub fn load_tree(path: &Path) -> Result<Value> {
    let mut tree = resolve(path, 0)?;
    expand_variables(&mut tree);
    Ok(tree)
}

fn resolve(path: &Path, depth: usize) -> Result<Value> {
    if depth > MAX_INCLUDE_DEPTH {
        return Err(PipelineError::Config(format!(
            "{}: includes nested more than {} levels deep",
            path.display(),
            MAX_INCLUDE_DEPTH
        )));
    }
    let mut tree = parse_file(path)?;
    let base_dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
    splice_includes(&mut tree, &base_dir, depth)?;
    Ok(tree)
}

fn parse_file(path: &Path) -> Result<Value> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| PipelineError::Config(format!("cannot read {}: {}", path.display(), e)))?;

    let is_toml = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("toml"));
    let parsed = if is_toml {
        toml::from_str::<Value>(&content).map_err(|e| e.to_string())
    } else {
        serde_yaml::from_str::<Value>(&content).map_err(|e| e.to_string())
    };

    // An empty YAML file parses to null
    parsed
        .map(|v| if v.is_null() { Value::Object(Map::new()) } else { v })
        .map_err(|e| PipelineError::Config(format!("cannot parse {}: {}", path.display(), e)))
}

fn splice_includes(value: &mut Value, base_dir: &Path, depth: usize) -> Result<()> {
    match value {
        Value::Object(map) => {
            if let Some(Value::String(target)) = map.remove(INCLUDE_KEY) {
                let mut included = resolve(&include_path(base_dir, &target), depth + 1)?;
                for child in map.values_mut() {
                    splice_includes(child, base_dir, depth)?;
                }
                overlay(&mut included, Value::Object(std::mem::take(map)));
                *value = included;
                return Ok(());
            }
            for child in map.values_mut() {
                splice_includes(child, base_dir, depth)?;
            }
        }
        Value::Array(items) => {
            for item in items {
                splice_includes(item, base_dir, depth)?;
            }
        }
        _ => {}
    }
    Ok(())
}

fn include_path(base_dir: &Path, target: &str) -> PathBuf {
    let target = Path::new(target);
    if target.is_absolute() {
        target.to_path_buf()
    } else {
        base_dir.join(target)
    }
}

/// Recursively lay `top` over `base`; objects merge key by key, anything else replaces
pub fn overlay(base: &mut Value, top: Value) {
    match (base, top) {
        (Value::Object(base_map), Value::Object(top_map)) => {
            for (key, top_value) in top_map {
                match base_map.get_mut(&key) {
                    Some(base_value) => overlay(base_value, top_value),
                    None => {
                        base_map.insert(key, top_value);
                    }
                }
            }
        }
        (base, top) => *base = top,
    }
}

fn expand_variables(value: &mut Value) {
    match value {
        Value::String(s) => {
            if let Some(expanded) = expand_env_in_string(s) {
                *s = expanded;
            }
        }
        Value::Object(map) => map.values_mut().for_each(expand_variables),
        Value::Array(items) => items.iter_mut().for_each(expand_variables),
        _ => {}
    }
}

/// Expand `${ENV_VAR:default}` occurrences; `None` when there is nothing to expand.
/// Blank variables take the default.
pub fn expand_env_in_string(s: &str) -> Option<String> {
    if !s.contains("${") {
        return None;
    }
    let pattern = crate::patterns::regex(r"\$\{([A-Za-z_][A-Za-z0-9_]*)(?::([^}]*))?\}").ok()?;
    let expanded = pattern.replace_all(s, |cap: &regex::Captures| {
        utils::env::get_env_opt(&cap[1])
            .unwrap_or_else(|| cap.get(2).map_or("", |m| m.as_str()).to_string())
    });
    Some(expanded.into_owned())
}
