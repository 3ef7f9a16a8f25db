//! Shared line→enclosing-function lookup for the C-specific analyzers
//! (spec §4.6): rather than re-parsing or re-tracking brace depth, reuse
//! the Function/Method spans Pass-1 already extracted for this file.

use codegraph_extract::DefinitionRegistry;
use codegraph_model::{NodeLabel, QualifiedName};

/// Find the smallest-span Function or Method in `file_path` whose
/// `[start_line, end_line]` contains `line`, i.e. the function a
/// textual match at `line` is considered to belong to.
pub fn enclosing_function_qn(registry: &DefinitionRegistry, file_path: &str, line: u32) -> Option<QualifiedName> {
    registry
        .iter()
        .filter(|record| record.file_path == file_path)
        .filter(|record| matches!(record.label, NodeLabel::Function | NodeLabel::Method))
        .filter(|record| record.start_line <= line && line <= record.end_line)
        .min_by_key(|record| record.end_line - record.start_line)
        .map(|record| record.qn.clone())
}
