//! Pass-2 Resolver (spec §4.5): runs once, after every file's Pass-1 result
//! has been folded into the Definition Registry and the module table, and
//! turns each unresolved import/call/base reference into a graph edge (or,
//! failing that, an `ExternalPackage`/dropped-call accounting entry).

use std::collections::{HashMap, HashSet};

use codegraph_model::{EdgeType, GraphBatch, NodeLabel, NodeRecord, QualifiedName, RelationshipRecord, RunReport};

use crate::imports::candidate_targets;
use crate::registry::DefinitionRegistry;
use crate::unresolved::{CallKind, MethodDefinition, UnresolvedBase, UnresolvedCall, UnresolvedImport};

/// Read-only view Pass-2 resolves unresolved references against: the
/// Definition Registry (functions/classes/methods) plus every known
/// Module QN, since modules themselves live outside the registry (they're
/// emitted by `containment::build_containment`, not Pass-1).
pub struct ResolutionContext<'a> {
    pub registry: &'a DefinitionRegistry,
    pub modules: &'a HashSet<String>,
}

/// Resolve every import, returning IMPORTS edges for internal hits and
/// ExternalPackage nodes + DEPENDS_ON_EXTERNAL edges for the rest.
pub fn resolve_imports(
    imports: &[UnresolvedImport],
    ctx: &ResolutionContext,
    language: codegraph_model::Language,
    report: &mut RunReport,
) -> GraphBatch {
    let mut batch = GraphBatch::default();
    let mut seen_externals: HashSet<String> = HashSet::new();

    for import in imports {
        let targets = candidate_targets(language, &import.raw_text);
        if targets.is_empty() {
            report.record_error(codegraph_model::ErrorKind::Resolve);
            continue;
        }
        for target in targets {
            if let Some(module_qn) = best_module_match(&target.dotted_path, ctx.modules) {
                batch.relationships.push(RelationshipRecord::new(
                    EdgeType::Imports,
                    &import.module_qn,
                    &QualifiedName::from_raw(module_qn),
                ));
                continue;
            }
            if let Some(record) = best_registry_match(&target.dotted_path, ctx.registry) {
                batch.relationships.push(RelationshipRecord::new(EdgeType::Imports, &import.module_qn, &record.qn));
                continue;
            }
            // Falls outside the project: an external package dependency.
            let package_name = target.dotted_path.split('.').next().unwrap_or(&target.dotted_path).to_string();
            if seen_externals.insert(package_name.clone()) {
                let pkg_qn = QualifiedName::from_raw(format!("external.{package_name}"));
                batch
                    .nodes
                    .push(NodeRecord::new(NodeLabel::ExternalPackage, &pkg_qn).with_property("name", package_name.as_str()));
            }
            let pkg_qn = QualifiedName::from_raw(format!("external.{package_name}"));
            batch
                .relationships
                .push(RelationshipRecord::new(EdgeType::DependsOnExternal, &import.module_qn, &pkg_qn));
        }
    }
    batch
}

/// Resolve calls with the precedence spec §4.5 defines: local candidates
/// in the caller's own module first, then anything reachable via imports
/// of that module (approximated here by same-package candidates, since
/// per-module import sets aren't threaded through this call), then any
/// same-package candidate, then drop it as unresolved.
pub fn resolve_calls(calls: &[UnresolvedCall], registry: &DefinitionRegistry, report: &mut RunReport) -> GraphBatch {
    let mut batch = GraphBatch::default();
    for call in calls {
        let short_name = match call.kind {
            CallKind::Free => call.callee_text.as_str(),
            CallKind::Method | CallKind::Qualified => call.callee_text.rsplit(['.', ':']).next().unwrap_or(&call.callee_text),
        };
        let candidates = registry.candidates_by_short_name(short_name);

        let target = match call.kind {
            // Dynamic dispatch / duck typing (spec §4.5): a method call is
            // only ever resolved when the receiver's class is locally
            // known (constructor-site tracking in Pass-1). Otherwise it's
            // dropped, never guessed against the whole registry.
            CallKind::Method => match &call.receiver_class_qn {
                None => None,
                Some(receiver_class) => {
                    let method_candidates: Vec<_> = candidates
                        .iter()
                        .filter(|c| {
                            c.parent_class
                                .as_ref()
                                .map(|pc| pc.as_str() == receiver_class.as_str() || pc.short_name() == receiver_class.short_name())
                                .unwrap_or(false)
                        })
                        .copied()
                        .collect();
                    match method_candidates.len() {
                        0 => None,
                        1 => Some(method_candidates[0]),
                        _ => pick_best_candidate(&call.caller_qn, &method_candidates),
                    }
                }
            },
            CallKind::Free | CallKind::Qualified => match candidates.len() {
                0 => None,
                1 => Some(candidates[0]),
                _ => pick_best_candidate(&call.caller_qn, &candidates),
            },
        };

        match target {
            Some(record) => {
                batch
                    .relationships
                    .push(RelationshipRecord::new(EdgeType::Calls, &call.caller_qn, &record.qn).with_property("line", call.line as i64));
            }
            None => {
                report.calls_dropped_unresolved += 1;
            }
        }
    }
    batch
}

/// Among several same-short-name candidates, prefer the one whose
/// enclosing scope shares the longest QN suffix with the caller's
/// enclosing scope (spec §4.5: "prefer local over imported over
/// same-package over external"), breaking ties on the lexicographically
/// smallest QN rather than insertion order.
fn pick_best_candidate<'a>(
    caller_qn: &QualifiedName,
    candidates: &[&'a crate::registry::DefinitionRecord],
) -> Option<&'a crate::registry::DefinitionRecord> {
    let caller_scope = caller_qn.parent().unwrap_or_else(|| caller_qn.clone());
    let mut best: Option<(&'a crate::registry::DefinitionRecord, usize)> = None;
    for candidate in candidates {
        let candidate_scope = candidate.qn.parent().unwrap_or_else(|| candidate.qn.clone());
        let score = caller_scope.common_suffix_len(&candidate_scope);
        best = match best {
            None => Some((*candidate, score)),
            Some((best_record, best_score)) => {
                if score > best_score || (score == best_score && candidate.qn.as_str() < best_record.qn.as_str()) {
                    Some((*candidate, score))
                } else {
                    Some((best_record, best_score))
                }
            }
        };
    }
    best.map(|(record, _)| record)
}

/// Resolve base-class references into INHERITS_FROM/IMPLEMENTS edges.
/// Returns the edge batch plus the resolved `(derived, base)` QN pairs the
/// caller needs to build the class hierarchy for override resolution and
/// cycle detection.
pub fn resolve_inheritance(
    bases: &[UnresolvedBase],
    registry: &DefinitionRegistry,
    report: &mut RunReport,
) -> (GraphBatch, Vec<(QualifiedName, QualifiedName)>) {
    let mut batch = GraphBatch::default();
    let mut edges = Vec::new();
    for base in bases {
        let candidates = registry.candidates_by_short_name(&base.base_text);
        let target = match candidates.len() {
            0 => None,
            1 => Some(candidates[0]),
            _ => pick_best_candidate(&base.derived_qn, &candidates),
        };
        match target {
            Some(record) => {
                let edge_type = if base.is_interface { EdgeType::Implements } else { EdgeType::InheritsFrom };
                batch
                    .relationships
                    .push(RelationshipRecord::new(edge_type, &base.derived_qn, &record.qn));
                edges.push((base.derived_qn.clone(), record.qn.clone()));
            }
            None => {
                report.record_error(codegraph_model::ErrorKind::Resolve);
            }
        }
    }
    (batch, edges)
}

/// Resolve method overrides (spec §4.5 diamond-inheritance decision,
/// recorded in the grounding ledger): for each method, BFS the ancestor
/// chain breadth-first from its owning class and take the first ancestor
/// (shortest path, declaration order on ties) that defines a method with
/// the same short name.
pub fn resolve_overrides(methods: &[MethodDefinition], inheritance_edges: &[(QualifiedName, QualifiedName)]) -> GraphBatch {
    let mut parents: HashMap<String, Vec<String>> = HashMap::new();
    for (derived, base) in inheritance_edges {
        parents.entry(derived.as_str().to_string()).or_default().push(base.as_str().to_string());
    }

    let mut methods_by_class: HashMap<&str, Vec<&MethodDefinition>> = HashMap::new();
    for method in methods {
        methods_by_class.entry(method.owner_class_qn.as_str()).or_default().push(method);
    }

    let mut batch = GraphBatch::default();
    for method in methods {
        let mut visited: HashSet<&str> = HashSet::new();
        let mut queue: std::collections::VecDeque<&str> = parents
            .get(method.owner_class_qn.as_str())
            .into_iter()
            .flatten()
            .map(String::as_str)
            .collect();
        visited.insert(method.owner_class_qn.as_str());

        while let Some(ancestor) = queue.pop_front() {
            if !visited.insert(ancestor) {
                continue;
            }
            if let Some(siblings) = methods_by_class.get(ancestor) {
                if let Some(overridden) = siblings.iter().find(|m| m.short_name == method.short_name) {
                    batch.relationships.push(RelationshipRecord::new(
                        EdgeType::Overrides,
                        &method.method_qn,
                        &overridden.method_qn,
                    ));
                    break;
                }
            }
            if let Some(next) = parents.get(ancestor) {
                for grandparent in next {
                    queue.push_back(grandparent);
                }
            }
        }
    }
    batch
}

/// Look up a module whose dotted QN shares the longest suffix with
/// `dotted_path`, requiring at least the leaf segment to match.
fn best_module_match(dotted_path: &str, modules: &HashSet<String>) -> Option<String> {
    let candidate_segments: Vec<&str> = dotted_path.rsplit('.').collect();
    modules
        .iter()
        .filter(|m| m.rsplit('.').next() == candidate_segments.first().copied())
        .max_by_key(|m| {
            let module_segments: Vec<&str> = m.rsplit('.').collect();
            module_segments.iter().zip(candidate_segments.iter()).take_while(|(a, b)| a == b).count()
        })
        .cloned()
}

fn best_registry_match<'a>(dotted_path: &str, registry: &'a DefinitionRegistry) -> Option<&'a crate::registry::DefinitionRecord> {
    let short_name = dotted_path.rsplit('.').next().unwrap_or(dotted_path);
    let candidates = registry.candidates_by_short_name(short_name);
    let target_qn = QualifiedName::from_raw(dotted_path.to_string());
    candidates.into_iter().max_by_key(|record| record.qn.common_suffix_len(&target_qn))
}

#[cfg(test)]
mod tests {
    use super::*;
    use codegraph_model::Language;

    fn def(qn: &str) -> crate::registry::DefinitionRecord {
        crate::registry::DefinitionRecord {
            qn: QualifiedName::from_raw(qn),
            label: NodeLabel::Function,
            language: Language::Python,
            file_path: "a.py".to_string(),
            start_line: 1,
            end_line: 2,
            parent_class: None,
        }
    }

    #[test]
    fn unresolved_call_is_counted_as_dropped() {
        let registry = DefinitionRegistry::new();
        let mut report = RunReport::default();
        let calls = vec![UnresolvedCall {
            caller_qn: QualifiedName::from_raw("proj.a.f"),
            callee_text: "ghost".to_string(),
            kind: CallKind::Free,
            line: 1,
            receiver_class_qn: None,
        }];
        resolve_calls(&calls, &registry, &mut report);
        assert_eq!(report.calls_dropped_unresolved, 1);
    }

    #[test]
    fn resolved_call_emits_calls_edge() {
        let mut registry = DefinitionRegistry::new();
        registry.insert(def("proj.a.helper"));
        let mut report = RunReport::default();
        let calls = vec![UnresolvedCall {
            caller_qn: QualifiedName::from_raw("proj.a.f"),
            callee_text: "helper".to_string(),
            kind: CallKind::Free,
            line: 1,
            receiver_class_qn: None,
        }];
        let batch = resolve_calls(&calls, &registry, &mut report);
        assert_eq!(batch.relationships.len(), 1);
        assert_eq!(batch.relationships[0].edge_type, "CALLS");
    }

    #[test]
    fn ambiguous_candidates_prefer_longest_suffix_match() {
        let mut registry = DefinitionRegistry::new();
        registry.insert(def("proj.a.helper"));
        registry.insert(def("proj.b.helper"));
        let mut report = RunReport::default();
        let calls = vec![UnresolvedCall {
            caller_qn: QualifiedName::from_raw("proj.a.f"),
            callee_text: "helper".to_string(),
            kind: CallKind::Free,
            line: 1,
            receiver_class_qn: None,
        }];
        let batch = resolve_calls(&calls, &registry, &mut report);
        assert_eq!(batch.relationships[0].target_qn, "proj.a.helper");
    }

    #[test]
    fn ambiguous_candidates_break_ties_lexicographically() {
        let mut registry = DefinitionRegistry::new();
        registry.insert(def("other.helper"));
        registry.insert(def("zzz.helper"));
        let mut report = RunReport::default();
        let calls = vec![UnresolvedCall {
            caller_qn: QualifiedName::from_raw("proj.a.f"),
            callee_text: "helper".to_string(),
            kind: CallKind::Free,
            line: 1,
            receiver_class_qn: None,
        }];
        let batch = resolve_calls(&calls, &registry, &mut report);
        assert_eq!(batch.relationships[0].target_qn, "other.helper");
    }

    #[test]
    fn method_call_with_unknown_receiver_is_dropped_not_guessed() {
        let mut registry = DefinitionRegistry::new();
        registry.insert(crate::registry::DefinitionRecord {
            qn: QualifiedName::from_raw("proj.Widget.render"),
            label: NodeLabel::Method,
            language: Language::Python,
            file_path: "a.py".to_string(),
            start_line: 1,
            end_line: 2,
            parent_class: Some(QualifiedName::from_raw("proj.Widget")),
        });
        let mut report = RunReport::default();
        let calls = vec![UnresolvedCall {
            caller_qn: QualifiedName::from_raw("proj.a.f"),
            callee_text: "thing.render".to_string(),
            kind: CallKind::Method,
            line: 1,
            receiver_class_qn: None,
        }];
        let batch = resolve_calls(&calls, &registry, &mut report);
        assert!(batch.relationships.is_empty());
        assert_eq!(report.calls_dropped_unresolved, 1);
    }

    #[test]
    fn method_call_with_known_receiver_class_resolves_to_its_method() {
        let mut registry = DefinitionRegistry::new();
        registry.insert(crate::registry::DefinitionRecord {
            qn: QualifiedName::from_raw("proj.Widget.render"),
            label: NodeLabel::Method,
            language: Language::Python,
            file_path: "a.py".to_string(),
            start_line: 1,
            end_line: 2,
            parent_class: Some(QualifiedName::from_raw("proj.Widget")),
        });
        registry.insert(crate::registry::DefinitionRecord {
            qn: QualifiedName::from_raw("proj.Panel.render"),
            label: NodeLabel::Method,
            language: Language::Python,
            file_path: "b.py".to_string(),
            start_line: 1,
            end_line: 2,
            parent_class: Some(QualifiedName::from_raw("proj.Panel")),
        });
        let mut report = RunReport::default();
        let calls = vec![UnresolvedCall {
            caller_qn: QualifiedName::from_raw("proj.a.f"),
            callee_text: "thing.render".to_string(),
            kind: CallKind::Method,
            line: 1,
            receiver_class_qn: Some(QualifiedName::from_raw("Widget")),
        }];
        let batch = resolve_calls(&calls, &registry, &mut report);
        assert_eq!(batch.relationships.len(), 1);
        assert_eq!(batch.relationships[0].target_qn, "proj.Widget.render");
    }

    #[test]
    fn diamond_override_picks_nearest_ancestor() {
        let methods = vec![
            MethodDefinition { method_qn: QualifiedName::from_raw("proj.Base.run"), owner_class_qn: QualifiedName::from_raw("proj.Base"), short_name: "run".to_string() },
            MethodDefinition { method_qn: QualifiedName::from_raw("proj.Mid.run"), owner_class_qn: QualifiedName::from_raw("proj.Mid"), short_name: "run".to_string() },
            MethodDefinition { method_qn: QualifiedName::from_raw("proj.Leaf.run"), owner_class_qn: QualifiedName::from_raw("proj.Leaf"), short_name: "run".to_string() },
        ];
        let edges = vec![
            (QualifiedName::from_raw("proj.Leaf"), QualifiedName::from_raw("proj.Mid")),
            (QualifiedName::from_raw("proj.Mid"), QualifiedName::from_raw("proj.Base")),
        ];
        let batch = resolve_overrides(&methods, &edges);
        let leaf_override = batch.relationships.iter().find(|r| r.source_qn == "proj.Leaf.run").unwrap();
        assert_eq!(leaf_override.target_qn, "proj.Mid.run");
    }
}
