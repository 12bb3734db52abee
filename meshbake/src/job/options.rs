//! Job options blob parsing.
//!
//! Options arrive as an opaque string. Two shapes are accepted:
//!
//! - JSON: either a list of `{"name": .., "value": ..}` objects or a flat
//!   object mapping names to values
//! - Comma-separated: `key=value` pairs and bare flags (`fast-orthophoto`)
//!
//! JSON is tried first; anything that does not parse as one of the JSON
//! shapes falls back to the comma-separated form.

use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;

/// Which input shape an options blob was parsed from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OptionsShape {
    #[default]
    Empty,
    JsonList,
    JsonObject,
    CommaSeparated,
}

/// Parsed job options.
///
/// Names are normalized to lowercase with `_` replaced by `-`. Values are
/// kept as strings; bare flags have the value `"true"`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobOptions {
    values: BTreeMap<String, String>,
    shape: OptionsShape,
}

#[derive(Deserialize)]
struct NamedOption {
    name: String,
    #[serde(default)]
    value: Value,
}

impl JobOptions {
    /// Parses an options blob. Never fails: unparsable input is read as
    /// comma-separated options.
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        if raw.is_empty() {
            return Self::default();
        }

        if let Ok(list) = serde_json::from_str::<Vec<NamedOption>>(raw) {
            let values = list
                .into_iter()
                .map(|opt| (normalize_name(&opt.name), value_to_string(&opt.value)))
                .filter(|(name, _)| !name.is_empty())
                .collect();
            return Self {
                values,
                shape: OptionsShape::JsonList,
            };
        }

        if let Ok(map) = serde_json::from_str::<BTreeMap<String, Value>>(raw) {
            let values = map
                .iter()
                .map(|(name, value)| (normalize_name(name), value_to_string(value)))
                .filter(|(name, _)| !name.is_empty())
                .collect();
            return Self {
                values,
                shape: OptionsShape::JsonObject,
            };
        }

        tracing::debug!(raw, "Options blob is not JSON, parsing as comma-separated");

        let values = raw
            .split(',')
            .filter_map(|part| {
                let part = part.trim();
                if part.is_empty() {
                    return None;
                }
                let (name, value) = match part.split_once('=') {
                    Some((name, value)) => (name, value.trim()),
                    None => (part, "true"),
                };
                let name = normalize_name(name);
                (!name.is_empty()).then(|| (name, value.to_string()))
            })
            .collect();

        Self {
            values,
            shape: OptionsShape::CommaSeparated,
        }
    }

    /// Returns the raw value of an option.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(&normalize_name(name)).map(String::as_str)
    }

    /// Returns an option parsed as an unsigned integer.
    ///
    /// Values that don't parse are logged and treated as absent.
    pub fn get_u32(&self, name: &str) -> Option<u32> {
        let raw = self.get(name)?;
        match raw.parse::<f64>() {
            Ok(v) if v.is_finite() && v >= 0.0 && v <= u32::MAX as f64 => Some(v as u32),
            _ => {
                tracing::warn!(option = name, value = raw, "Ignoring non-numeric option value");
                None
            }
        }
    }

    /// Returns true if the option is present and truthy.
    pub fn flag(&self, name: &str) -> bool {
        matches!(
            self.get(name).map(str::to_ascii_lowercase).as_deref(),
            Some("true" | "1" | "yes" | "on")
        )
    }

    /// Which input shape the options were parsed from.
    pub fn shape(&self) -> OptionsShape {
        self.shape
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Iterates over normalized `(name, value)` pairs in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

fn normalize_name(name: &str) -> String {
    name.trim().to_ascii_lowercase().replace('_', "-")
}

fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "true".to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty() {
        let opts = JobOptions::parse("   ");
        assert!(opts.is_empty());
        assert_eq!(opts.shape(), OptionsShape::Empty);
    }

    #[test]
    fn test_json_list() {
        let opts = JobOptions::parse(
            r#"[{"name": "texture-max-size", "value": 2048}, {"name": "dsm", "value": true}]"#,
        );
        assert_eq!(opts.shape(), OptionsShape::JsonList);
        assert_eq!(opts.get_u32("texture-max-size"), Some(2048));
        assert!(opts.flag("dsm"));
    }

    #[test]
    fn test_json_object() {
        let opts = JobOptions::parse(r#"{"Texture_Quality": "70", "orthophoto-resolution": 5}"#);
        assert_eq!(opts.shape(), OptionsShape::JsonObject);
        assert_eq!(opts.get("texture-quality"), Some("70"));
        assert_eq!(opts.get_u32("orthophoto_resolution"), Some(5));
    }

    #[test]
    fn test_comma_fallback() {
        let opts = JobOptions::parse("texture-max-size=512, fast-orthophoto ,texture_quality = 60");
        assert_eq!(opts.shape(), OptionsShape::CommaSeparated);
        assert_eq!(opts.get_u32("texture-max-size"), Some(512));
        assert!(opts.flag("fast-orthophoto"));
        assert_eq!(opts.get_u32("texture-quality"), Some(60));
        assert_eq!(opts.len(), 3);
    }

    #[test]
    fn test_malformed_json_falls_back() {
        let opts = JobOptions::parse(r#"{"broken": "#);
        assert_eq!(opts.shape(), OptionsShape::CommaSeparated);
        assert!(!opts.is_empty());
    }

    #[test]
    fn test_non_numeric_value_is_ignored() {
        let opts = JobOptions::parse("texture-max-size=huge");
        assert_eq!(opts.get_u32("texture-max-size"), None);
    }
}
