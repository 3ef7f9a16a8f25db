//! JSON export (spec §6): `{"nodes":[...],"relationships":[...]}` with IDs
//! stable across runs for unchanged input. Since every node is already
//! uniquely identified by `label:qualified_name` (I1), that pair doubles as
//! a naturally stable ID without a separate counter or hash.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use codegraph_model::{CodegraphError, GraphBatch, Result};
use neo4rs::{query, Graph};
use serde::Serialize;

use crate::bolt::bolt_to_json;

#[derive(Debug, Serialize)]
pub struct ExportedNode {
    pub id: String,
    pub labels: Vec<String>,
    pub properties: codegraph_model::PropertyMap,
}

#[derive(Debug, Serialize)]
pub struct ExportedRelationship {
    pub source: String,
    pub target: String,
    #[serde(rename = "type")]
    pub edge_type: String,
    pub properties: codegraph_model::PropertyMap,
}

#[derive(Debug, Serialize)]
pub struct ExportedGraph {
    pub nodes: Vec<ExportedNode>,
    pub relationships: Vec<ExportedRelationship>,
}

fn node_id(label: &str, qualified_name: &str) -> String {
    format!("{label}:{qualified_name}")
}

pub fn build_export(batches: &[GraphBatch]) -> ExportedGraph {
    let mut nodes = Vec::new();
    let mut relationships = Vec::new();

    for batch in batches {
        for node in &batch.nodes {
            nodes.push(ExportedNode {
                id: node_id(node.label(), &node.qualified_name),
                labels: vec![node.label().to_string()],
                properties: node.properties.clone(),
            });
        }
        for rel in &batch.relationships {
            relationships.push(ExportedRelationship {
                source: rel.source_qn.clone(),
                target: rel.target_qn.clone(),
                edge_type: rel.edge_type.clone(),
                properties: rel.properties.clone(),
            });
        }
    }

    ExportedGraph { nodes, relationships }
}

pub fn export_to_json(batches: &[GraphBatch], path: &Path) -> Result<()> {
    let exported = build_export(batches);
    let file = File::create(path)?;
    let writer = BufWriter::new(file);
    serde_json::to_writer_pretty(writer, &exported)?;
    Ok(())
}

/// The standalone `export(path)` core API (spec §6): queries the live graph
/// rather than replaying the last `ingest()` run's in-memory batches, so it
/// works even when invoked as its own `codegraph-ingest export` command.
pub async fn export_graph_to_json(graph: &Graph, path: &Path) -> Result<()> {
    let exported = query_exported_graph(graph).await?;
    let file = File::create(path)?;
    let writer = BufWriter::new(file);
    serde_json::to_writer_pretty(writer, &exported)?;
    Ok(())
}

async fn query_exported_graph(graph: &Graph) -> Result<ExportedGraph> {
    let mut nodes = Vec::new();
    let mut stream = graph
        .execute(query("MATCH (n) RETURN labels(n)[0] AS label, n.qualified_name AS qn, n{.*} AS props"))
        .await
        .map_err(|err| CodegraphError::writer(format!("export node query failed: {err}")))?;
    while let Ok(Some(row)) = stream.next().await {
        let label: String = row.get("label").unwrap_or_default();
        let qn: String = row.get("qn").unwrap_or_default();
        let props: neo4rs::BoltType = row.get("props").unwrap_or(neo4rs::BoltType::Null(neo4rs::BoltNull::default()));
        let properties = match bolt_to_json(&props) {
            serde_json::Value::Object(map) => map.into_iter().collect(),
            _ => codegraph_model::PropertyMap::new(),
        };
        nodes.push(ExportedNode { id: node_id(&label, &qn), labels: vec![label], properties });
    }

    let mut relationships = Vec::new();
    let mut stream = graph
        .execute(query(
            "MATCH (a)-[r]->(b) RETURN a.qualified_name AS src_qn, b.qualified_name AS dst_qn, \
             type(r) AS rel_type, r{.*} AS props",
        ))
        .await
        .map_err(|err| CodegraphError::writer(format!("export relationship query failed: {err}")))?;
    while let Ok(Some(row)) = stream.next().await {
        let src_qn: String = row.get("src_qn").unwrap_or_default();
        let dst_qn: String = row.get("dst_qn").unwrap_or_default();
        let edge_type: String = row.get("rel_type").unwrap_or_default();
        let props: neo4rs::BoltType = row.get("props").unwrap_or(neo4rs::BoltType::Null(neo4rs::BoltNull::default()));
        let properties = match bolt_to_json(&props) {
            serde_json::Value::Object(map) => map.into_iter().collect(),
            _ => codegraph_model::PropertyMap::new(),
        };
        relationships.push(ExportedRelationship { source: src_qn, target: dst_qn, edge_type, properties });
    }

    Ok(ExportedGraph { nodes, relationships })
}

#[cfg(test)]
mod tests {
    use super::*;
    use codegraph_model::{EdgeType, NodeLabel, NodeRecord, QualifiedName, RelationshipRecord};

    #[test]
    fn node_id_combines_label_and_qn() {
        assert_eq!(node_id("Module", "proj.a"), "Module:proj.a");
    }

    #[test]
    fn build_export_flattens_nodes_and_relationships() {
        let qn_a = QualifiedName::from_raw("proj.a");
        let qn_b = QualifiedName::from_raw("proj.b");
        let mut batch = GraphBatch::default();
        batch.nodes.push(NodeRecord::new(NodeLabel::Module, &qn_a));
        batch.nodes.push(NodeRecord::new(NodeLabel::Module, &qn_b));
        batch.relationships.push(RelationshipRecord::new(EdgeType::Imports, &qn_a, &qn_b));

        let exported = build_export(&[batch]);
        assert_eq!(exported.nodes.len(), 2);
        assert_eq!(exported.relationships.len(), 1);
        assert_eq!(exported.relationships[0].edge_type, "IMPORTS");
    }

    #[test]
    fn export_to_json_writes_well_formed_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("graph.json");
        let qn = QualifiedName::from_raw("proj");
        let mut batch = GraphBatch::default();
        batch.nodes.push(NodeRecord::new(NodeLabel::Project, &qn));
        export_to_json(&[batch], &path).unwrap();
        let contents = std::fs::read_to_string(&path).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&contents).unwrap();
        assert!(parsed["nodes"].is_array());
        assert!(parsed["relationships"].is_array());
    }
}
