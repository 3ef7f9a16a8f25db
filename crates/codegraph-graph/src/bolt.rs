//! Conversion between the wire-agnostic `PropertyMap`/`GraphBatch` records
//! in `codegraph-model` and neo4rs's `BoltType` parameter values.

use std::collections::HashMap;

use codegraph_model::{NodeRecord, PropertyMap, RelationshipRecord};
use neo4rs::BoltType;
use serde_json::Value;

pub fn json_to_bolt(value: &Value) -> BoltType {
    match value {
        Value::Null => BoltType::Null(neo4rs::BoltNull::default()),
        Value::Bool(b) => BoltType::from(*b),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                BoltType::from(i)
            } else {
                BoltType::from(n.as_f64().unwrap_or_default())
            }
        }
        Value::String(s) => BoltType::from(s.as_str()),
        Value::Array(items) => BoltType::from(items.iter().map(json_to_bolt).collect::<Vec<_>>()),
        Value::Object(map) => {
            let converted: HashMap<String, BoltType> = map.iter().map(|(k, v)| (k.clone(), json_to_bolt(v))).collect();
            BoltType::from(converted)
        }
    }
}

/// Reverse of `json_to_bolt`, used by the standalone `export(path)` path to
/// turn a live-graph property map projection (`n{.*}`) back into the same
/// `serde_json::Value` shape the in-memory export path already produces.
pub fn bolt_to_json(value: &BoltType) -> Value {
    match value {
        BoltType::Null(_) => Value::Null,
        BoltType::Boolean(b) => Value::Bool(b.value),
        BoltType::Integer(i) => Value::from(i.value),
        BoltType::Float(f) => serde_json::Number::from_f64(f.value).map(Value::Number).unwrap_or(Value::Null),
        BoltType::String(s) => Value::String(s.value.clone()),
        BoltType::List(items) => Value::Array(items.value.iter().map(bolt_to_json).collect()),
        BoltType::Map(map) => {
            let object = map.value.iter().map(|(k, v)| (k.to_string(), bolt_to_json(v))).collect();
            Value::Object(object)
        }
        _ => Value::Null,
    }
}

fn properties_to_bolt(properties: &PropertyMap) -> BoltType {
    let converted: HashMap<String, BoltType> = properties.iter().map(|(k, v)| (k.clone(), json_to_bolt(v))).collect();
    BoltType::from(converted)
}

/// One `UNWIND $rows AS r` row for a node MERGE: `{qn: "...", props: {...}}`.
pub fn node_row(record: &NodeRecord) -> BoltType {
    let mut row = HashMap::new();
    row.insert("qn".to_string(), BoltType::from(record.qualified_name.as_str()));
    row.insert("props".to_string(), properties_to_bolt(&record.properties));
    BoltType::from(row)
}

/// One `UNWIND $rows AS r` row for a relationship MERGE:
/// `{src: "...", dst: "...", props: {...}}`.
pub fn relationship_row(record: &RelationshipRecord) -> BoltType {
    let mut row = HashMap::new();
    row.insert("src".to_string(), BoltType::from(record.source_qn.as_str()));
    row.insert("dst".to_string(), BoltType::from(record.target_qn.as_str()));
    row.insert("props".to_string(), properties_to_bolt(&record.properties));
    BoltType::from(row)
}

#[cfg(test)]
mod tests {
    use super::*;
    use codegraph_model::{EdgeType, NodeLabel, QualifiedName};

    #[test]
    fn node_row_carries_qn_and_properties() {
        let qn = QualifiedName::from_raw("proj.a");
        let record = NodeRecord::new(NodeLabel::Module, &qn).with_property("language", "python");
        match node_row(&record) {
            BoltType::Map(map) => assert!(map.value.contains_key(&neo4rs::BoltString::from("qn"))),
            other => panic!("expected map, got {other:?}"),
        }
    }

    #[test]
    fn bolt_to_json_round_trips_through_json_to_bolt() {
        let original = serde_json::json!({"name": "a", "count": 3, "tags": ["x", "y"]});
        let bolt = json_to_bolt(&original);
        assert_eq!(bolt_to_json(&bolt), original);
    }

    #[test]
    fn relationship_row_carries_both_endpoints() {
        let src = QualifiedName::from_raw("proj.a");
        let dst = QualifiedName::from_raw("proj.b");
        let record = RelationshipRecord::new(EdgeType::Imports, &src, &dst);
        match relationship_row(&record) {
            BoltType::Map(map) => {
                assert!(map.value.contains_key(&neo4rs::BoltString::from("src")));
                assert!(map.value.contains_key(&neo4rs::BoltString::from("dst")));
            }
            other => panic!("expected map, got {other:?}"),
        }
    }
}
