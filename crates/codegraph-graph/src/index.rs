//! Index Manager (spec §4.8): ensures uniqueness constraints and property
//! indexes exist before the first write of a run.

use codegraph_model::{CodegraphError, Result};
use neo4rs::{query, Graph};

/// Labels that get a uniqueness constraint on `qualified_name` (spec §4.8).
const UNIQUE_LABELS: &[&str] = &["Project", "Module", "Class", "Function", "Method"];

/// Properties that get a plain index across all labels (spec §4.8).
const INDEXED_PROPERTIES: &[&str] = &["name", "path", "language", "framework", "severity"];

pub async fn ensure_indexes(graph: &Graph) -> Result<()> {
    for label in UNIQUE_LABELS {
        let stmt = format!("CREATE CONSTRAINT IF NOT EXISTS FOR (n:{label}) REQUIRE n.qualified_name IS UNIQUE");
        run(graph, &stmt).await?;
    }
    for label in UNIQUE_LABELS {
        for property in INDEXED_PROPERTIES {
            let stmt = format!("CREATE INDEX IF NOT EXISTS FOR (n:{label}) ON (n.{property})");
            run(graph, &stmt).await?;
        }
    }
    Ok(())
}

async fn run(graph: &Graph, stmt: &str) -> Result<()> {
    graph
        .run(query(stmt))
        .await
        .map_err(|err| CodegraphError::writer(format!("failed to ensure index/constraint `{stmt}`: {err}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unique_labels_match_spec_list() {
        assert_eq!(UNIQUE_LABELS, &["Project", "Module", "Class", "Function", "Method"]);
    }

    #[test]
    fn indexed_properties_match_spec_list() {
        assert_eq!(INDEXED_PROPERTIES, &["name", "path", "language", "framework", "severity"]);
    }
}
