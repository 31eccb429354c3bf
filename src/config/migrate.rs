//! Config file upgrades: detect and fill fields added after the file was written.

use super::Config;
use crate::ui::messages::{info, success};
use serde_yaml::{Mapping, Value};
use std::fs;
use std::io;
use std::path::Path;

/// Keys of the serialized default config, in file order.
fn known_keys() -> io::Result<Vec<String>> {
    let value = serde_yaml::to_value(Config::default()).map_err(io::Error::other)?;
    Ok(value
        .as_mapping()
        .map(|m| {
            m.keys()
                .filter_map(|k| k.as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default())
}

fn read_mapping(conf: &Path) -> io::Result<Mapping> {
    let content = fs::read_to_string(conf)?;
    let yaml: Value = serde_yaml::from_str(&content)
        .map_err(|e| io::Error::other(format!("Failed to parse {:?}: {}", conf, e)))?;
    match yaml {
        Value::Mapping(m) => Ok(m),
        Value::Null => Ok(Mapping::new()),
        _ => Err(io::Error::other(format!("{:?} is not a YAML mapping", conf))),
    }
}

/// Fields the file does not set (their defaults apply).
pub fn missing_fields(conf: &Path) -> io::Result<Vec<String>> {
    let map = read_mapping(conf)?;
    Ok(known_keys()?
        .into_iter()
        .filter(|k| !map.contains_key(Value::String(k.clone())))
        .collect())
}

/// Keys the file sets that no current field reads.
pub fn unknown_fields(conf: &Path) -> io::Result<Vec<String>> {
    let map = read_mapping(conf)?;
    let known = known_keys()?;
    Ok(map
        .keys()
        .filter_map(|k| k.as_str())
        .filter(|k| !known.iter().any(|n| n == k))
        .map(str::to_string)
        .collect())
}

/// Write every missing field with the value `cfg` holds for it.
///
/// Returns the names of the fields that were added. Existing values are
/// never touched.
pub fn fill_missing_fields(conf: &Path, cfg: &Config) -> io::Result<Vec<String>> {
    let mut map = read_mapping(conf)?;
    let current = serde_yaml::to_value(cfg).map_err(io::Error::other)?;

    let mut added = Vec::new();
    if let Some(values) = current.as_mapping() {
        for (key, value) in values {
            if !map.contains_key(key) {
                map.insert(key.clone(), value.clone());
                if let Some(k) = key.as_str() {
                    added.push(k.to_string());
                }
            }
        }
    }

    if added.is_empty() {
        info("Configuration file is up to date.");
        return Ok(added);
    }

    let serialized = serde_yaml::to_string(&Value::Mapping(map))
        .map_err(|e| io::Error::other(format!("Failed to serialize {:?}: {}", conf, e)))?;
    fs::write(conf, serialized)?;

    success(format!(
        "Configuration migrated: added {}",
        added.join(", ")
    ));
    Ok(added)
}
