//! C Pointer Analyzer (spec §4.6): a syntactic pass over C/C++ source text
//! that tracks pointer declarations, address-of assignments, and function
//! pointer assignment/invocation. Not a points-to solver (the teacher's own
//! `points_to` feature runs full Andersen/Steensgaard analysis, which is
//! out of scope here) — this stays at the surface-text level the same way
//! `codegraph_extract::imports` parses import statements.

use std::collections::HashSet;

use codegraph_extract::DefinitionRegistry;
use codegraph_model::{EdgeType, GraphBatch, NodeLabel, NodeRecord, QualifiedName, RelationshipRecord};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::context::enclosing_function_qn;

static POINTER_DECL: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b[\w ]+\*+\s*(\w+)\s*[;=,)]").unwrap());
static FUNCTION_POINTER_DECL: Lazy<Regex> = Lazy::new(|| Regex::new(r"\w[\w ]*\(\s*\*\s*(\w+)\s*\)\s*\(").unwrap());
static ADDRESS_OF_ASSIGN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(\w+)\s*=\s*&\s*(\w+)\b").unwrap());
static PLAIN_ASSIGN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(\w+)\s*=\s*(\w+)\s*;").unwrap());
static FUNCTION_CALL: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(\w+)\s*\(").unwrap());

/// Run the pointer analyzer over one C/C++ file's source.
pub fn analyze_pointers(source: &str, file_path: &str, module_qn: &QualifiedName, registry: &DefinitionRegistry) -> GraphBatch {
    let mut batch = GraphBatch::default();
    let mut known_pointers: HashSet<String> = HashSet::new();
    let mut known_function_pointers: HashSet<String> = HashSet::new();
    let mut emitted: HashSet<String> = HashSet::new();

    for (idx, line) in source.lines().enumerate() {
        let line_no = idx as u32 + 1;

        for caps in FUNCTION_POINTER_DECL.captures_iter(line) {
            let name = caps[1].to_string();
            known_function_pointers.insert(name.clone());
            let qn = module_qn.child(&name);
            if emitted.insert(qn.as_str().to_string()) {
                batch.nodes.push(
                    NodeRecord::new(NodeLabel::FunctionPointer, &qn)
                        .with_property("name", name.as_str())
                        .with_property("file_path", file_path)
                        .with_property("line", line_no as i64),
                );
            }
        }

        for caps in POINTER_DECL.captures_iter(line) {
            let name = caps[1].to_string();
            if known_function_pointers.contains(&name) {
                continue;
            }
            known_pointers.insert(name.clone());
        }
    }

    for (idx, line) in source.lines().enumerate() {
        let line_no = idx as u32 + 1;
        let caller = enclosing_function_qn(registry, file_path, line_no).unwrap_or_else(|| module_qn.clone());

        if let Some(caps) = ADDRESS_OF_ASSIGN.captures(line) {
            let (lhs, rhs) = (&caps[1], &caps[2]);
            if known_pointers.contains(lhs) {
                let pointer_qn = pointer_qn(module_qn, &caller, lhs);
                let target_qn = module_qn.child(rhs);
                emit_pointer_node(&mut batch, &mut emitted, &pointer_qn, lhs, file_path, line_no);
                batch
                    .relationships
                    .push(RelationshipRecord::new(EdgeType::PointsTo, &pointer_qn, &target_qn).with_property("line", line_no as i64));
            }
        }

        if let Some(caps) = PLAIN_ASSIGN.captures(line) {
            let (lhs, rhs) = (&caps[1], &caps[2]);
            if known_function_pointers.contains(lhs) {
                let fp_qn = module_qn.child(lhs);
                let target_qn = module_qn.child(rhs);
                if registry.contains(&target_qn) {
                    batch
                        .relationships
                        .push(RelationshipRecord::new(EdgeType::AssignsFp, &fp_qn, &target_qn).with_property("line", line_no as i64));
                }
            } else if known_pointers.contains(lhs) && known_pointers.contains(rhs) {
                let lhs_qn = pointer_qn(module_qn, &caller, lhs);
                let rhs_qn = pointer_qn(module_qn, &caller, rhs);
                emit_pointer_node(&mut batch, &mut emitted, &lhs_qn, lhs, file_path, line_no);
                batch
                    .relationships
                    .push(RelationshipRecord::new(EdgeType::PointsTo, &lhs_qn, &rhs_qn).with_property("line", line_no as i64));
            }
        }

        for caps in FUNCTION_CALL.captures_iter(line) {
            let name = &caps[1];
            if known_function_pointers.contains(name) {
                let fp_qn = module_qn.child(name);
                batch
                    .relationships
                    .push(RelationshipRecord::new(EdgeType::InvokesFp, &caller, &fp_qn).with_property("line", line_no as i64));
            }
        }
    }

    batch
}

fn pointer_qn(module_qn: &QualifiedName, caller: &QualifiedName, name: &str) -> QualifiedName {
    if caller.as_str() == module_qn.as_str() {
        module_qn.child(name)
    } else {
        caller.child(name)
    }
}

fn emit_pointer_node(batch: &mut GraphBatch, emitted: &mut HashSet<String>, qn: &QualifiedName, name: &str, file_path: &str, line: u32) {
    if emitted.insert(qn.as_str().to_string()) {
        batch.nodes.push(
            NodeRecord::new(NodeLabel::Pointer, qn)
                .with_property("name", name)
                .with_property("file_path", file_path)
                .with_property("line", line as i64),
        );
    }
}
