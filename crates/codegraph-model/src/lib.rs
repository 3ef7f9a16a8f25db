//! Shared data model for the code knowledge graph pipeline: qualified
//! names, node/relationship records, the language table, and the
//! crate-spanning error and run-report types (SPEC_FULL.md §3, §7).

pub mod error;
pub mod graph;
pub mod labels;
pub mod language;
pub mod qn;
pub mod report;

pub use error::{CodegraphError, ErrorKind, Result};
pub use graph::{GraphBatch, NodeRecord, PropertyMap, RelationshipRecord};
pub use labels::{EdgeType, NodeLabel, Severity, StepKeyword};
pub use language::Language;
pub use qn::QualifiedName;
pub use report::RunReport;
