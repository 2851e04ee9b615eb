//! JSON and JSON5 data files exposed to templates as `data`

use serde_json::{Map, Value};
use std::fs;
use std::path::Path;
use walkdir::WalkDir;

use crate::error::Result;
use crate::helpers::deep_merge;
use crate::Site;

/// Legacy single data file in the base directory
pub const LEGACY_DATA_FILE: &str = "data.json";

/// Load and merge every data file
///
/// `data/a/b.json` containing `{"c": 1}` becomes `{"a": {"b": {"c": 1}}}`.
/// Files that fail to parse are logged and skipped.
pub fn load_data(site: &Site) -> Result<Value> {
    let mut data = Value::Object(Map::new());

    let legacy = site.base_dir.join(LEGACY_DATA_FILE);
    if legacy.is_file() {
        tracing::warn!(
            "Reading {} is deprecated; use the {} directory instead",
            LEGACY_DATA_FILE,
            site.config.data_dir
        );
        if let Some(value) = parse_data_file(&legacy, site.config.data_json5) {
            deep_merge(&mut data, value);
        }
    }

    if !site.data_dir.is_dir() {
        return Ok(data);
    }

    for entry in WalkDir::new(&site.data_dir)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();
        if !path.is_file() || !is_data_file(path) {
            continue;
        }

        let Some(keys) = data_keys(&site.data_dir, path) else {
            continue;
        };
        let Some(value) = parse_data_file(path, site.config.data_json5) else {
            continue;
        };

        let nested = keys
            .into_iter()
            .rev()
            .fold(value, |value, key| {
                let mut map = Map::new();
                map.insert(key, value);
                Value::Object(map)
            });
        deep_merge(&mut data, nested);
    }

    Ok(data)
}

fn is_data_file(path: &Path) -> bool {
    path.extension()
        .map_or(false, |ext| ext == "json" || ext == "json5")
}

/// Directory names below the data root followed by the file stem
fn data_keys(data_dir: &Path, path: &Path) -> Option<Vec<String>> {
    let relative = path.strip_prefix(data_dir).ok()?.with_extension("");
    relative
        .components()
        .map(|c| c.as_os_str().to_str().map(str::to_string))
        .collect()
}

fn parse_data_file(path: &Path, json5: bool) -> Option<Value> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) => {
            tracing::warn!("Failed to read data file {:?}: {}", path, e);
            return None;
        }
    };

    let parsed = if json5 {
        json5::from_str::<Value>(&text).map_err(|e| e.to_string())
    } else {
        serde_json::from_str::<Value>(&text).map_err(|e| e.to_string())
    };

    match parsed {
        Ok(Value::Null) => {
            tracing::debug!("Skipping empty data file {:?}", path);
            None
        }
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!("Invalid data file {:?}: {}", path, e);
            None
        }
    }
}
