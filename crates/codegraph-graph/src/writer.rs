//! Graph Writer (spec §4.8): batches nodes/relationships into typed groups
//! and flushes them via parameterized `UNWIND ... MERGE` statements over a
//! Bolt client, retrying transient transport errors per `retry::RetryPolicy`.
//!
//! Mirrors the teacher's storage-port shape (`codegraph-storage`'s
//! `#[async_trait]` `CodeSnapshotStore`): a narrow async trait the
//! orchestrator depends on, with one concrete Bolt-backed implementation.

use std::collections::HashMap;

use async_trait::async_trait;
use codegraph_model::{CodegraphError, GraphBatch, NodeRecord, RelationshipRecord, Result};
use neo4rs::{query, Graph};

use crate::bolt::{node_row, relationship_row};
use crate::retry::{with_retry, RetryPolicy};

pub const DEFAULT_BATCH_SIZE: usize = 1000;

#[derive(Debug, Clone)]
pub struct GraphClientConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub database: Option<String>,
}

impl Default for GraphClientConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 7687,
            user: "neo4j".to_string(),
            password: String::new(),
            database: None,
        }
    }
}

/// Port the orchestrator writes through; a test double can implement this
/// without a live graph server.
#[async_trait]
pub trait GraphWriter: Send + Sync {
    async fn write_batch(&self, batch: &GraphBatch) -> Result<()>;
    async fn clean_project(&self, project: &str) -> Result<()>;
    /// Index Manager entry point (spec §4.8): called once before the first
    /// write of a run. Part of the port, not a free function, so a fake
    /// writer in an orchestrator test can no-op it without a live graph.
    async fn ensure_indexes(&self) -> Result<()>;
}

pub struct BoltGraphWriter {
    graph: Graph,
    batch_size: usize,
    retry: RetryPolicy,
}

impl BoltGraphWriter {
    pub async fn connect(config: &GraphClientConfig) -> Result<Self> {
        let uri = format!("bolt://{}:{}", config.host, config.port);
        let graph = Graph::new(&uri, &config.user, &config.password)
            .await
            .map_err(|err| CodegraphError::writer(format!("failed to connect to graph server at {uri}: {err}")))?;
        Ok(Self {
            graph,
            batch_size: DEFAULT_BATCH_SIZE,
            retry: RetryPolicy::default(),
        })
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Exposes the underlying session for the Index Manager and the
    /// standalone `export(path)` path, which both need to run raw Cypher
    /// outside the `GraphWriter` port's write/clean surface.
    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    async fn run_with_retry(&self, cypher: String, rows: Vec<neo4rs::BoltType>) -> Result<()> {
        with_retry(&self.retry, is_transient, || {
            let graph = &self.graph;
            let stmt = query(&cypher).param("rows", rows.clone());
            async move { graph.run(stmt).await.map_err(|err| err.to_string()) }
        })
        .await
        .map_err(|err| CodegraphError::writer(format!("graph write failed after retries: {err}")))
    }

    async fn write_nodes(&self, nodes: &[NodeRecord]) -> Result<()> {
        let mut by_label: HashMap<&str, Vec<&NodeRecord>> = HashMap::new();
        for node in nodes {
            by_label.entry(node.label()).or_default().push(node);
        }
        for (label, records) in by_label {
            for chunk in records.chunks(self.batch_size) {
                let rows: Vec<_> = chunk.iter().map(|r| node_row(r)).collect();
                let cypher = format!("UNWIND $rows AS r MERGE (n:{label} {{qualified_name: r.qn}}) SET n += r.props");
                self.run_with_retry(cypher, rows).await?;
            }
        }
        Ok(())
    }

    async fn write_relationships(&self, relationships: &[RelationshipRecord]) -> Result<()> {
        let mut by_type: HashMap<&str, Vec<&RelationshipRecord>> = HashMap::new();
        for rel in relationships {
            by_type.entry(rel.edge_type.as_str()).or_default().push(rel);
        }
        for (edge_type, records) in by_type {
            for chunk in records.chunks(self.batch_size) {
                let rows: Vec<_> = chunk.iter().map(|r| relationship_row(r)).collect();
                let cypher = format!(
                    "UNWIND $rows AS r MERGE (a {{qualified_name: r.src}}) MERGE (b {{qualified_name: r.dst}}) \
                     MERGE (a)-[rel:{edge_type}]->(b) SET rel += r.props"
                );
                self.run_with_retry(cypher, rows).await?;
            }
        }
        Ok(())
    }
}

#[async_trait]
impl GraphWriter for BoltGraphWriter {
    async fn write_batch(&self, batch: &GraphBatch) -> Result<()> {
        self.write_nodes(&batch.nodes).await?;
        self.write_relationships(&batch.relationships).await
    }

    async fn clean_project(&self, project: &str) -> Result<()> {
        let cypher = "MATCH (n) WHERE n.qualified_name = $project OR n.qualified_name STARTS WITH $prefix DETACH DELETE n";
        let prefix = format!("{project}.");
        self.graph
            .run(query(cypher).param("project", project).param("prefix", prefix))
            .await
            .map_err(|err| CodegraphError::writer(format!("clean failed: {err}")))
    }

    async fn ensure_indexes(&self) -> Result<()> {
        crate::index::ensure_indexes(&self.graph).await
    }
}

fn is_transient(message: &String) -> bool {
    let lower = message.to_lowercase();
    lower.contains("timeout") || lower.contains("connection") || lower.contains("transport") || lower.contains("reset")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_points_at_localhost_bolt_port() {
        let config = GraphClientConfig::default();
        assert_eq!(config.port, 7687);
        assert_eq!(config.host, "localhost");
    }

    #[test]
    fn transient_classifier_matches_transport_wording() {
        assert!(is_transient(&"connection reset by peer".to_string()));
        assert!(is_transient(&"operation timeout".to_string()));
        assert!(!is_transient(&"syntax error near MERGE".to_string()));
    }
}
