//! Graph Writer and Index Manager (SPEC_FULL.md §4.8, §6): batches node and
//! relationship records into typed `UNWIND ... MERGE` statements over a
//! Bolt client, ensures required indexes/constraints up front, and exports
//! an accumulated run to the JSON schema external collaborators consume.

pub mod bolt;
pub mod export;
pub mod index;
pub mod retry;
pub mod writer;

pub use export::{build_export, export_graph_to_json, export_to_json, ExportedGraph, ExportedNode, ExportedRelationship};
pub use index::ensure_indexes;
pub use retry::RetryPolicy;
pub use writer::{BoltGraphWriter, GraphClientConfig, GraphWriter, DEFAULT_BATCH_SIZE};
