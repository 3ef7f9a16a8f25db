//! Config Analyzer (spec §4.7a): treats TOML/YAML/JSON/.env/Kconfig files
//! as flat key→value tables and emits one `ConfigSetting` node per leaf
//! key, scoped to the file that defines it. No cross-file resolution —
//! that's left to a human or a later pass, per spec.

use codegraph_model::{EdgeType, GraphBatch, NodeLabel, NodeRecord, QualifiedName, RelationshipRecord};
use once_cell::sync::Lazy;
use regex::Regex;

static LINE_KV: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*([A-Za-z_][A-Za-z0-9_.\-]*)\s*[:=]\s*(.+?)\s*$").unwrap());

/// Recognized config file formats, keyed by the extension/basename the
/// caller already classified via `Language::from_special_basename` or the
/// file's extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Toml,
    Json,
    Yaml,
    Env,
    Kconfig,
}

impl ConfigFormat {
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext {
            "toml" => Some(ConfigFormat::Toml),
            "json" => Some(ConfigFormat::Json),
            "yaml" | "yml" => Some(ConfigFormat::Yaml),
            "env" => Some(ConfigFormat::Env),
            _ => None,
        }
    }

    pub fn from_special_tag(tag: &str) -> Option<Self> {
        match tag {
            "kconfig" => Some(ConfigFormat::Kconfig),
            "env" => Some(ConfigFormat::Env),
            "json" => Some(ConfigFormat::Json),
            _ => None,
        }
    }

    fn as_str(&self) -> &'static str {
        match self {
            ConfigFormat::Toml => "toml",
            ConfigFormat::Json => "json",
            ConfigFormat::Yaml => "yaml",
            ConfigFormat::Env => "env",
            ConfigFormat::Kconfig => "kconfig",
        }
    }
}

pub fn analyze_config(source: &str, format: ConfigFormat, file_qn: &QualifiedName) -> GraphBatch {
    let entries = match format {
        ConfigFormat::Toml => flatten_toml(source),
        ConfigFormat::Json => flatten_json(source),
        ConfigFormat::Yaml => flatten_yaml(source),
        ConfigFormat::Env | ConfigFormat::Kconfig => flatten_lines(source),
    };

    let mut batch = GraphBatch::default();
    for (key, value) in entries {
        let sanitized = key.replace(['/', ' '], "_");
        let setting_qn = file_qn.child(&sanitized);
        batch.nodes.push(
            NodeRecord::new(NodeLabel::ConfigSetting, &setting_qn)
                .with_property("key", key.as_str())
                .with_property("value", value.as_str())
                .with_property("format", format.as_str()),
        );
        batch
            .relationships
            .push(RelationshipRecord::new(EdgeType::ContainsFile, file_qn, &setting_qn));
    }
    batch
}

fn flatten_toml(source: &str) -> Vec<(String, String)> {
    let Ok(value) = source.parse::<toml::Value>() else {
        return Vec::new();
    };
    let mut out = Vec::new();
    flatten_toml_value("", &value, &mut out);
    out
}

fn flatten_toml_value(prefix: &str, value: &toml::Value, out: &mut Vec<(String, String)>) {
    match value {
        toml::Value::Table(table) => {
            for (key, val) in table {
                let dotted = if prefix.is_empty() { key.clone() } else { format!("{prefix}.{key}") };
                flatten_toml_value(&dotted, val, out);
            }
        }
        other => out.push((prefix.to_string(), other.to_string())),
    }
}

fn flatten_json(source: &str) -> Vec<(String, String)> {
    let Ok(value) = serde_json::from_str::<serde_json::Value>(source) else {
        return Vec::new();
    };
    let mut out = Vec::new();
    flatten_json_value("", &value, &mut out);
    out
}

fn flatten_json_value(prefix: &str, value: &serde_json::Value, out: &mut Vec<(String, String)>) {
    match value {
        serde_json::Value::Object(map) => {
            for (key, val) in map {
                let dotted = if prefix.is_empty() { key.clone() } else { format!("{prefix}.{key}") };
                flatten_json_value(&dotted, val, out);
            }
        }
        other if !prefix.is_empty() => out.push((prefix.to_string(), other.to_string())),
        _ => {}
    }
}

fn flatten_yaml(source: &str) -> Vec<(String, String)> {
    let Ok(value) = serde_yaml::from_str::<serde_yaml::Value>(source) else {
        return Vec::new();
    };
    let mut out = Vec::new();
    flatten_yaml_value("", &value, &mut out);
    out
}

fn flatten_yaml_value(prefix: &str, value: &serde_yaml::Value, out: &mut Vec<(String, String)>) {
    match value {
        serde_yaml::Value::Mapping(map) => {
            for (key, val) in map {
                let key = key.as_str().map(str::to_string).unwrap_or_else(|| yaml_scalar_to_string(key));
                let dotted = if prefix.is_empty() { key } else { format!("{prefix}.{key}") };
                flatten_yaml_value(&dotted, val, out);
            }
        }
        other if !prefix.is_empty() => out.push((prefix.to_string(), yaml_scalar_to_string(other))),
        _ => {}
    }
}

/// YAML scalars don't implement `Display` the way `toml::Value`/
/// `serde_json::Value` do, so leaves are stringified by hand; sequences
/// and tagged values fall back to re-serializing the node itself.
fn yaml_scalar_to_string(value: &serde_yaml::Value) -> String {
    match value {
        serde_yaml::Value::Null => String::new(),
        serde_yaml::Value::Bool(b) => b.to_string(),
        serde_yaml::Value::Number(n) => n.to_string(),
        serde_yaml::Value::String(s) => s.clone(),
        other => serde_yaml::to_string(other).unwrap_or_default().trim().to_string(),
    }
}

fn flatten_lines(source: &str) -> Vec<(String, String)> {
    source
        .lines()
        .filter(|line| !line.trim_start().starts_with('#') && !line.trim_start().starts_with("//"))
        .filter_map(|line| LINE_KV.captures(line))
        .map(|caps| (caps[1].to_string(), caps[2].trim_matches('"').to_string()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toml_nested_table_flattens_with_dotted_key() {
        let source = "[server]\nport = 8080\n";
        let file_qn = QualifiedName::from_raw("proj.config.toml");
        let batch = analyze_config(source, ConfigFormat::Toml, &file_qn);
        assert!(batch.nodes.iter().any(|n| n.properties["key"] == "server.port"));
    }

    #[test]
    fn env_file_parses_key_equals_value_lines() {
        let source = "# comment\nDATABASE_URL=postgres://localhost\n";
        let file_qn = QualifiedName::from_raw("proj..env");
        let batch = analyze_config(source, ConfigFormat::Env, &file_qn);
        assert_eq!(batch.nodes.len(), 1);
        assert_eq!(batch.nodes[0].properties["value"], "postgres://localhost");
    }

    #[test]
    fn json_object_flattens_nested_keys() {
        let source = r#"{"db": {"host": "localhost"}}"#;
        let file_qn = QualifiedName::from_raw("proj.config.json");
        let batch = analyze_config(source, ConfigFormat::Json, &file_qn);
        assert!(batch.nodes.iter().any(|n| n.properties["key"] == "db.host"));
    }

    #[test]
    fn yaml_nested_mapping_flattens_with_dotted_key_not_colliding_flat_lines() {
        let source = "db:\n  host: localhost\n  port: 5432\n";
        let file_qn = QualifiedName::from_raw("proj.config.yaml");
        let batch = analyze_config(source, ConfigFormat::Yaml, &file_qn);
        assert!(batch.nodes.iter().any(|n| n.properties["key"] == "db.host" && n.properties["value"] == "localhost"));
        assert!(batch.nodes.iter().any(|n| n.properties["key"] == "db.port" && n.properties["value"] == "5432"));
        assert_eq!(batch.nodes.len(), 2);
    }

    #[test]
    fn yaml_sequence_leaf_flattens_to_one_setting() {
        let source = "hosts:\n  - a\n  - b\n";
        let file_qn = QualifiedName::from_raw("proj.config.yaml");
        let batch = analyze_config(source, ConfigFormat::Yaml, &file_qn);
        assert_eq!(batch.nodes.len(), 1);
        assert_eq!(batch.nodes[0].properties["key"], "hosts");
    }
}
