//! C Kernel Analyzer (spec §4.6): Linux-kernel-flavored macro conventions
//! that ordinary C parsing misses — `SYSCALL_DEFINEn`, `EXPORT_SYMBOL*`,
//! lock/unlock call pairs, and `module_init`/`module_exit` registration.
//! Pattern-matches on source text, the same macro-name-matching style the
//! teacher's `concurrency_analysis` feature uses for lock-call detection.

use std::collections::HashMap;

use codegraph_extract::DefinitionRegistry;
use codegraph_model::{EdgeType, GraphBatch, Language, NodeLabel, NodeRecord, QualifiedName, RelationshipRecord};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::context::enclosing_function_qn;

static SYSCALL_DEFINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bSYSCALL_DEFINE\d\s*\(\s*(\w+)").unwrap());
static EXPORT_SYMBOL: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bEXPORT_SYMBOL(?:_GPL)?\s*\(\s*(\w+)\s*\)").unwrap());
static LOCK_CALL: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(spin_lock|mutex_lock|spin_lock_irqsave|read_lock|write_lock)\w*\s*\(\s*&?(\w+)").unwrap());
static UNLOCK_CALL: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(spin_unlock|mutex_unlock|spin_unlock_irqrestore|read_unlock|write_unlock)\w*\s*\(\s*&?(\w+)").unwrap());
static MODULE_INIT: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bmodule_init\s*\(\s*(\w+)\s*\)").unwrap());
static MODULE_EXIT: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bmodule_exit\s*\(\s*(\w+)\s*\)").unwrap());
static DEFINE_MACRO: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*#\s*define\s+(\w+)(?:\(([^)]*)\))?\s+(.*)$").unwrap());
static INCLUDE_DIRECTIVE: Lazy<Regex> = Lazy::new(|| Regex::new(r#"^\s*#\s*include\s*[<"]([^">]+)[">]"#).unwrap());

/// One `#define`d macro: its body text and the QN of the module that
/// defines it, so an `EXPANDS_TO` edge crossing an `#include` can still
/// point at the macro's real owning node rather than the referencing
/// file's module.
#[derive(Debug, Clone)]
pub struct MacroEntry {
    body: String,
    owner_qn: QualifiedName,
}

fn scan_defines(source: &str, owner_qn: &QualifiedName) -> HashMap<String, MacroEntry> {
    let mut macros = HashMap::new();
    for line in source.lines() {
        if let Some(caps) = DEFINE_MACRO.captures(line) {
            macros.insert(caps[1].to_string(), MacroEntry { body: caps[3].trim().to_string(), owner_qn: owner_qn.clone() });
        }
    }
    macros
}

/// Resolve `file_path`'s `#include` closure against `sources` (every
/// discovered file's path, text, and module QN) up to `max_depth` hops,
/// matching include targets by basename since headers are `#include`d by
/// a path relative to the compiler's search dirs, not the project root.
/// Returns the macro table contributed by included files only — the
/// caller still scans its own source separately so its own `#define`s get
/// `Macro` nodes regardless of this closure.
fn resolve_include_closure(file_path: &str, sources: &HashMap<String, (String, QualifiedName)>, max_depth: u32) -> HashMap<String, MacroEntry> {
    let mut merged = HashMap::new();
    let mut visited: std::collections::HashSet<String> = std::collections::HashSet::new();
    visited.insert(file_path.to_string());
    let mut frontier = vec![file_path.to_string()];

    for _ in 0..max_depth {
        let mut next_frontier = Vec::new();
        for path in &frontier {
            let Some((source, _)) = sources.get(path) else { continue };
            for line in source.lines() {
                let Some(caps) = INCLUDE_DIRECTIVE.captures(line) else { continue };
                let target = &caps[1];
                let Some((included_path, (included_source, included_qn))) =
                    sources.iter().find(|(candidate, _)| candidate.as_str() != file_path && basename(candidate) == basename(target))
                else {
                    continue;
                };
                if visited.insert(included_path.clone()) {
                    merged.extend(scan_defines(included_source, included_qn));
                    next_frontier.push(included_path.clone());
                }
            }
        }
        frontier = next_frontier;
    }

    merged
}

fn basename(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// Build the macro table `analyze_kernel` should expand against for
/// `file_path`: empty when the pipeline isn't configured for transitive
/// expansion, otherwise this file's `#include` closure up to depth 3
/// (spec §9a Open Question decision). `sources` is every discovered
/// file's relative path mapped to its text and module QN.
pub fn macro_closure_for(file_path: &str, sources: &HashMap<String, (String, QualifiedName)>, macro_expand_transitive: bool) -> HashMap<String, MacroEntry> {
    if !macro_expand_transitive {
        return HashMap::new();
    }
    resolve_include_closure(file_path, sources, 3)
}

/// Run the kernel analyzer over one C file's source. Only meaningful for
/// `Language::C`; callers should skip other languages. `included_macros`
/// is this file's `#include`-closure macro table from `macro_closure_for`
/// — empty when the pipeline isn't configured for transitive expansion.
pub fn analyze_kernel(
    source: &str,
    file_path: &str,
    module_qn: &QualifiedName,
    registry: &DefinitionRegistry,
    macro_expand_transitive: bool,
    included_macros: &HashMap<String, MacroEntry>,
) -> GraphBatch {
    let mut batch = GraphBatch::default();
    let mut macros: HashMap<String, MacroEntry> = HashMap::new();

    for (idx, line) in source.lines().enumerate() {
        let line_no = idx as u32 + 1;

        if let Some(caps) = SYSCALL_DEFINE.captures(line) {
            let name = format!("sys_{}", &caps[1]);
            let qn = module_qn.child(&name);
            batch.nodes.push(
                NodeRecord::new(NodeLabel::Syscall, &qn)
                    .with_property("name", name.as_str())
                    .with_property("file_path", file_path)
                    .with_property("line", line_no as i64),
            );
        }

        if let Some(caps) = EXPORT_SYMBOL.captures(line) {
            let symbol = caps[1].to_string();
            let target_qn = module_qn.child(&symbol);
            if registry.contains(&target_qn) {
                let export_qn = QualifiedName::from_raw(format!("{}.export.{symbol}", module_qn.as_str()));
                batch.nodes.push(
                    NodeRecord::new(NodeLabel::KernelExport, &export_qn)
                        .with_property("name", symbol.as_str())
                        .with_property("file_path", file_path)
                        .with_property("line", line_no as i64),
                );
                batch
                    .relationships
                    .push(RelationshipRecord::new(EdgeType::Exports, module_qn, &target_qn));
            }
        }

        if let Some(caps) = LOCK_CALL.captures(line) {
            let lock_var = &caps[2];
            let caller = enclosing_function_qn(registry, file_path, line_no).unwrap_or_else(|| module_qn.clone());
            let lock_qn = module_qn.child(lock_var);
            batch
                .relationships
                .push(RelationshipRecord::new(EdgeType::Locks, &caller, &lock_qn).with_property("line", line_no as i64));
        }

        if let Some(caps) = UNLOCK_CALL.captures(line) {
            let lock_var = &caps[2];
            let caller = enclosing_function_qn(registry, file_path, line_no).unwrap_or_else(|| module_qn.clone());
            let lock_qn = module_qn.child(lock_var);
            batch
                .relationships
                .push(RelationshipRecord::new(EdgeType::Unlocks, &caller, &lock_qn).with_property("line", line_no as i64));
        }

        if let Some(caps) = MODULE_INIT.captures(line) {
            let fn_qn = module_qn.child(&caps[1]);
            if registry.contains(&fn_qn) {
                batch.relationships.push(RelationshipRecord::new(EdgeType::Calls, module_qn, &fn_qn).with_property("kind", "module_init"));
            }
        }
        if let Some(caps) = MODULE_EXIT.captures(line) {
            let fn_qn = module_qn.child(&caps[1]);
            if registry.contains(&fn_qn) {
                batch.relationships.push(RelationshipRecord::new(EdgeType::Calls, module_qn, &fn_qn).with_property("kind", "module_exit"));
            }
        }

        if let Some(caps) = DEFINE_MACRO.captures(line) {
            let name = caps[1].to_string();
            let body = caps[3].trim().to_string();
            let macro_qn = module_qn.child(&name);
            batch.nodes.push(
                NodeRecord::new(NodeLabel::Macro, &macro_qn)
                    .with_property("name", name.as_str())
                    .with_property("file_path", file_path)
                    .with_property("line", line_no as i64),
            );
            macros.insert(name, MacroEntry { body, owner_qn: module_qn.clone() });
        }
    }

    // EXPANDS_TO: a macro whose body references another macro name, within
    // a bounded depth when the pipeline config opts into transitive
    // expansion (spec §9a Open Question decision) — in which case the
    // macro table also carries every macro reachable through this file's
    // `#include` closure, not just its own `#define`s, and an edge into
    // one of those points at its real owning module, not this file's;
    // translation-unit-only (depth 1, own file) otherwise.
    let max_depth = if macro_expand_transitive { 3 } else { 1 };
    let own_macro_names: Vec<String> = macros.keys().cloned().collect();
    if macro_expand_transitive {
        for (name, entry) in included_macros {
            macros.entry(name.clone()).or_insert_with(|| entry.clone());
        }
    }
    for name in &own_macro_names {
        let from_qn = module_qn.child(name);
        let body = macros[name].body.clone();
        expand_macro_refs(&from_qn, &body, &macros, max_depth, &mut batch);
    }

    batch
}

fn expand_macro_refs(from_qn: &QualifiedName, body: &str, macros: &HashMap<String, MacroEntry>, depth_remaining: u32, batch: &mut GraphBatch) {
    if depth_remaining == 0 {
        return;
    }
    for (candidate_name, candidate) in macros {
        let candidate_qn = candidate.owner_qn.child(candidate_name);
        if candidate_qn.as_str() == from_qn.as_str() {
            continue;
        }
        if contains_word(body, candidate_name) {
            batch
                .relationships
                .push(RelationshipRecord::new(EdgeType::ExpandsTo, from_qn, &candidate_qn));
            expand_macro_refs(&candidate_qn, &candidate.body, macros, depth_remaining - 1, batch);
        }
    }
}

fn contains_word(haystack: &str, needle: &str) -> bool {
    haystack.split(|c: char| !c.is_alphanumeric() && c != '_').any(|w| w == needle)
}

/// `true` only for the language this analyzer applies to.
pub fn applies_to(language: Language) -> bool {
    matches!(language, Language::C)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn syscall_define_emits_syscall_node() {
        let registry = DefinitionRegistry::new();
        let module_qn = QualifiedName::from_raw("proj.a");
        let source = "SYSCALL_DEFINE2(write, int, fd)\n{\n    return 0;\n}\n";
        let batch = analyze_kernel(source, "a.c", &module_qn, &registry, false, &HashMap::new());
        assert!(batch.nodes.iter().any(|n| n.label() == "Syscall" && n.qualified_name == "proj.a.sys_write"));
    }

    #[test]
    fn lock_then_unlock_emit_paired_edges() {
        let registry = DefinitionRegistry::new();
        let module_qn = QualifiedName::from_raw("proj.a");
        let source = "void f() {\n    spin_lock(&mylock);\n    spin_unlock(&mylock);\n}\n";
        let batch = analyze_kernel(source, "a.c", &module_qn, &registry, false, &HashMap::new());
        assert!(batch.relationships.iter().any(|r| r.edge_type == "LOCKS"));
        assert!(batch.relationships.iter().any(|r| r.edge_type == "UNLOCKS"));
    }

    #[test]
    fn macro_referencing_another_macro_yields_expands_to() {
        let registry = DefinitionRegistry::new();
        let module_qn = QualifiedName::from_raw("proj.a");
        let source = "#define BASE 1\n#define DERIVED (BASE + 1)\n";
        let batch = analyze_kernel(source, "a.c", &module_qn, &registry, false, &HashMap::new());
        assert!(batch
            .relationships
            .iter()
            .any(|r| r.edge_type == "EXPANDS_TO" && r.source_qn == "proj.a.DERIVED" && r.target_qn == "proj.a.BASE"));
    }

    #[test]
    fn depth_one_does_not_follow_transitive_chain_by_default() {
        let registry = DefinitionRegistry::new();
        let module_qn = QualifiedName::from_raw("proj.a");
        let source = "#define A 1\n#define B (A)\n#define C (B)\n";
        let batch = analyze_kernel(source, "a.c", &module_qn, &registry, false, &HashMap::new());
        assert!(!batch.relationships.iter().any(|r| r.source_qn == "proj.a.C" && r.target_qn == "proj.a.A"));
    }

    #[test]
    fn depth_three_follows_transitive_chain_when_enabled() {
        let registry = DefinitionRegistry::new();
        let module_qn = QualifiedName::from_raw("proj.a");
        let source = "#define A 1\n#define B (A)\n#define C (B)\n";
        let batch = analyze_kernel(source, "a.c", &module_qn, &registry, true, &HashMap::new());
        assert!(batch.relationships.iter().any(|r| r.source_qn == "proj.a.C" && r.target_qn == "proj.a.B"));
        assert!(batch.relationships.iter().any(|r| r.source_qn == "proj.a.B" && r.target_qn == "proj.a.A"));
    }

    #[test]
    fn include_closure_pulls_macros_from_included_header() {
        let mut sources = HashMap::new();
        let header_qn = QualifiedName::from_raw("proj.defs");
        sources.insert("defs.h".to_string(), ("#define BASE 1\n".to_string(), header_qn.clone()));
        let closure = macro_closure_for("a.c", &sources, true);
        assert!(closure.is_empty());

        sources.insert("a.c".to_string(), ("#include \"defs.h\"\n#define DERIVED (BASE + 1)\n".to_string(), QualifiedName::from_raw("proj.a")));
        let closure = macro_closure_for("a.c", &sources, true);
        assert_eq!(closure.get("BASE").unwrap().owner_qn.as_str(), "proj.defs");

        let registry = DefinitionRegistry::new();
        let module_qn = QualifiedName::from_raw("proj.a");
        let source = "#include \"defs.h\"\n#define DERIVED (BASE + 1)\n";
        let batch = analyze_kernel(source, "a.c", &module_qn, &registry, true, &closure);
        assert!(batch
            .relationships
            .iter()
            .any(|r| r.edge_type == "EXPANDS_TO" && r.source_qn == "proj.a.DERIVED" && r.target_qn == "proj.defs.BASE"));
    }

    #[test]
    fn include_closure_is_empty_when_transitive_expansion_disabled() {
        let mut sources = HashMap::new();
        sources.insert("defs.h".to_string(), ("#define BASE 1\n".to_string(), QualifiedName::from_raw("proj.defs")));
        sources.insert("a.c".to_string(), ("#include \"defs.h\"\n".to_string(), QualifiedName::from_raw("proj.a")));
        assert!(macro_closure_for("a.c", &sources, false).is_empty());
    }
}
