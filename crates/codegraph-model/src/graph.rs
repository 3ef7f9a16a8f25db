//! Node/relationship records emitted by Pass-1, Pass-2 and the analyzers,
//! and consumed by the Graph Writer (spec §3, §4.8).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::labels::{EdgeType, NodeLabel};
use crate::qn::QualifiedName;

/// A single typed property value, constrained to what the Bolt wire
/// protocol's row-stream can carry (spec §6): int, float, string, bool,
/// null, list, map. Nodes/relationships/paths are not needed as property
/// values since we never nest a graph entity inside another's properties.
pub type PropertyMap = BTreeMap<String, Value>;

/// A node to be MERGEd by qualified name (I1).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeRecord {
    pub label: NodeLabelWire,
    pub qualified_name: String,
    pub properties: PropertyMap,
}

/// `NodeLabel` is not `Serialize` itself (it's a plain enum without derive
/// dependencies beyond this crate); this newtype carries the label as its
/// canonical string for wire/JSON purposes while `NodeRecord::new` still
/// takes the typed `NodeLabel`.
pub type NodeLabelWire = String;

impl NodeRecord {
    pub fn new(label: NodeLabel, qn: &QualifiedName) -> Self {
        Self {
            label: label.as_str().to_string(),
            qualified_name: qn.as_str().to_string(),
            properties: PropertyMap::new(),
        }
    }

    pub fn with_property(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.properties.insert(key.to_string(), value.into());
        self
    }

    pub fn label(&self) -> &str {
        &self.label
    }
}

/// A directed, typed edge MERGEd by (source QN, type, target QN).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelationshipRecord {
    pub edge_type: String,
    pub source_qn: String,
    pub target_qn: String,
    pub properties: PropertyMap,
}

impl RelationshipRecord {
    pub fn new(edge_type: EdgeType, source: &QualifiedName, target: &QualifiedName) -> Self {
        Self {
            edge_type: edge_type.as_str().to_string(),
            source_qn: source.as_str().to_string(),
            target_qn: target.as_str().to_string(),
            properties: PropertyMap::new(),
        }
    }

    pub fn with_property(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.properties.insert(key.to_string(), value.into());
        self
    }
}

/// A per-run batch of nodes and relationships, the unit the Graph Writer
/// flushes (spec §4.8: "one batch per (label, edge-type) pair").
#[derive(Debug, Default)]
pub struct GraphBatch {
    pub nodes: Vec<NodeRecord>,
    pub relationships: Vec<RelationshipRecord>,
}

impl GraphBatch {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.relationships.is_empty()
    }

    pub fn merge(&mut self, mut other: GraphBatch) {
        self.nodes.append(&mut other.nodes);
        self.relationships.append(&mut other.relationships);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_record_carries_label_and_properties() {
        let qn = QualifiedName::from_raw("proj.pkg.a");
        let node = NodeRecord::new(NodeLabel::Module, &qn).with_property("language", "python");
        assert_eq!(node.label(), "Module");
        assert_eq!(node.qualified_name, "proj.pkg.a");
        assert_eq!(node.properties["language"], Value::from("python"));
    }

    #[test]
    fn relationship_record_carries_endpoints() {
        let src = QualifiedName::from_raw("proj.a.outer");
        let dst = QualifiedName::from_raw("proj.a.outer.inner");
        let rel = RelationshipRecord::new(EdgeType::Calls, &src, &dst);
        assert_eq!(rel.edge_type, "CALLS");
        assert_eq!(rel.source_qn, "proj.a.outer");
        assert_eq!(rel.target_qn, "proj.a.outer.inner");
    }

    #[test]
    fn batch_merge_appends_both_collections() {
        let qn = QualifiedName::from_raw("proj");
        let mut a = GraphBatch::default();
        a.nodes.push(NodeRecord::new(NodeLabel::Project, &qn));
        let mut b = GraphBatch::default();
        b.nodes.push(NodeRecord::new(NodeLabel::Package, &qn));
        a.merge(b);
        assert_eq!(a.nodes.len(), 2);
    }
}
