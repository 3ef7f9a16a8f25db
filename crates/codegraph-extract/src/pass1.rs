//! Pass-1 Definer (spec §4.4): walks one file's syntax tree and emits its
//! definitions plus every raw import/call/base-class reference it contains,
//! without looking at any other file. Runs on the worker pool, one call per
//! file, and returns an owned `PassOneResult` the aggregator folds in.

use std::collections::HashMap;
use std::rc::Rc;

use codegraph_model::{EdgeType, Language, NodeLabel, NodeRecord, QualifiedName, RelationshipRecord};
use codegraph_parse::{LanguageKinds, ParsedFile};
use once_cell::sync::Lazy;
use regex::Regex;
use tree_sitter::Node;

use crate::ast::{find_child_by_kind, line_range, node_text};
use crate::unresolved::{CallKind, MethodDefinition, PassOneResult, UnresolvedBase, UnresolvedCall, UnresolvedImport};

/// Java's `implements` clause is a sibling of `superclass`, not covered by
/// `LanguageKinds::base_class_container_kind`; detected by literal kind
/// name since only one language needs it.
const INTERFACE_CLAUSE_KINDS: &[&str] = &["super_interfaces", "implements_clause"];

/// Constructor-site tracking (spec §4.5 dynamic-dispatch note): a local
/// variable bound to `ClassName(...)` or `new ClassName(...)` within the
/// same function body. Matching on a capitalized callee is a heuristic,
/// not a type system, but it's enough to tell a constructor call from an
/// ordinary function call assigned to a variable.
static CONSTRUCTOR_ASSIGN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^\s*(?:(?:let|var|const)\s+)?(\w+)\s*(?::\s*\w+\s*)?=\s*(?:new\s+)?([A-Z]\w*)\s*\(").unwrap());

struct Scope {
    /// QN new definitions nest under; the module QN at the top level, a
    /// class/struct QN for its direct members, a function QN for locals.
    owner_qn: QualifiedName,
    /// `Some(class_qn)` only while walking a class-like node's direct body,
    /// so a function found there is emitted as a Method, not a Function.
    direct_class_qn: Option<QualifiedName>,
    /// QN of the nearest enclosing class, inherited into nested function
    /// scopes so `self`/`this` calls deep inside a method still resolve to
    /// it. Distinct from `direct_class_qn`, which only holds while walking
    /// a class's own direct body.
    enclosing_class_qn: Option<QualifiedName>,
    /// Local variable name -> class short name, from constructor-site
    /// assignments found in the current function body's text.
    locals: Rc<HashMap<String, String>>,
}

fn scan_locals(node: &Node, source: &str) -> Rc<HashMap<String, String>> {
    let text = &source[node.start_byte()..node.end_byte()];
    let mut locals = HashMap::new();
    for caps in CONSTRUCTOR_ASSIGN.captures_iter(text) {
        locals.insert(caps[1].to_string(), caps[2].to_string());
    }
    Rc::new(locals)
}

/// Walk `parsed`'s tree and extract definitions, unresolved references, and
/// the DEFINES/DEFINES_METHOD edges that attach them to `module_qn`.
pub fn run_pass1(parsed: &ParsedFile, module_qn: &QualifiedName, relative_path: &str) -> PassOneResult {
    let mut result = PassOneResult::default();
    let source = parsed.source_text();
    let root = parsed.tree.root_node();
    let scope = Scope {
        owner_qn: module_qn.clone(),
        direct_class_qn: None,
        enclosing_class_qn: None,
        locals: scan_locals(&root, source),
    };
    walk(&root, source, &parsed.kinds, parsed.language, relative_path, module_qn, &scope, &mut result);
    result
}

fn walk(
    node: &Node,
    source: &str,
    kinds: &LanguageKinds,
    language: Language,
    relative_path: &str,
    module_qn: &QualifiedName,
    scope: &Scope,
    result: &mut PassOneResult,
) {
    let kind = node.kind();

    if kinds.is_function_kind(kind) {
        let name = function_name(node, kinds, source);
        let qn = scope.owner_qn.child(&name);
        let (start_line, end_line) = line_range(node);
        let label = if scope.direct_class_qn.is_some() { NodeLabel::Method } else { NodeLabel::Function };

        result.batch.nodes.push(
            NodeRecord::new(label, &qn)
                .with_property("name", name.as_str())
                .with_property("language", language.name())
                .with_property("file_path", relative_path)
                .with_property("start_line", start_line as i64)
                .with_property("end_line", end_line as i64),
        );

        if let Some(class_qn) = &scope.direct_class_qn {
            result
                .batch
                .relationships
                .push(RelationshipRecord::new(EdgeType::DefinesMethod, class_qn, &qn));
            result.methods.push(MethodDefinition {
                method_qn: qn.clone(),
                owner_class_qn: class_qn.clone(),
                short_name: name,
            });
        } else {
            result
                .batch
                .relationships
                .push(RelationshipRecord::new(EdgeType::Defines, &scope.owner_qn, &qn));
        }

        let child_scope = Scope {
            owner_qn: qn,
            direct_class_qn: None,
            enclosing_class_qn: scope.enclosing_class_qn.clone(),
            locals: scan_locals(node, source),
        };
        recurse_children(node, source, kinds, language, relative_path, module_qn, &child_scope, result);
        return;
    }

    if let Some(label) = kinds.class_label_for_kind(kind) {
        let name = find_child_by_kind(node, kinds.identifier_kind)
            .map(|n| node_text(&n, source).to_string())
            .unwrap_or_else(|| "<anonymous>".to_string());
        let qn = scope.owner_qn.child(&name);
        let (start_line, end_line) = line_range(node);

        result.batch.nodes.push(
            NodeRecord::new(label, &qn)
                .with_property("name", name.as_str())
                .with_property("language", language.name())
                .with_property("file_path", relative_path)
                .with_property("start_line", start_line as i64)
                .with_property("end_line", end_line as i64),
        );
        result
            .batch
            .relationships
            .push(RelationshipRecord::new(EdgeType::Defines, &scope.owner_qn, &qn));

        collect_bases(node, source, kinds, &qn, result);

        let child_scope = Scope {
            owner_qn: qn.clone(),
            direct_class_qn: Some(qn.clone()),
            enclosing_class_qn: Some(qn.clone()),
            locals: Rc::clone(&scope.locals),
        };
        match kinds.class_body_kind.and_then(|k| find_child_by_kind(node, k)) {
            Some(body) => recurse_children(&body, source, kinds, language, relative_path, module_qn, &child_scope, result),
            None => recurse_children(node, source, kinds, language, relative_path, module_qn, &child_scope, result),
        }
        return;
    }

    if kinds.is_call_kind(kind) {
        if let Some((callee_text, call_kind)) = classify_call(node, source) {
            let (line, _) = line_range(node);
            let (call_kind, receiver_class_qn) = receiver_for(call_kind, &callee_text, scope);
            result.calls.push(UnresolvedCall {
                caller_qn: scope.owner_qn.clone(),
                callee_text,
                kind: call_kind,
                line,
                receiver_class_qn,
            });
        }
        recurse_children(node, source, kinds, language, relative_path, module_qn, scope, result);
        return;
    }

    if kinds.is_import_kind(kind) {
        let (line, _) = line_range(node);
        result.imports.push(UnresolvedImport {
            module_qn: module_qn.clone(),
            raw_text: node_text(node, source).to_string(),
            line,
        });
        return;
    }

    recurse_children(node, source, kinds, language, relative_path, module_qn, scope, result);
}

fn recurse_children(
    node: &Node,
    source: &str,
    kinds: &LanguageKinds,
    language: Language,
    relative_path: &str,
    module_qn: &QualifiedName,
    scope: &Scope,
    result: &mut PassOneResult,
) {
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        walk(&child, source, kinds, language, relative_path, module_qn, scope, result);
    }
}

fn function_name(node: &Node, kinds: &LanguageKinds, source: &str) -> String {
    find_child_by_kind(node, kinds.identifier_kind)
        .map(|n| node_text(&n, source).to_string())
        .unwrap_or_else(|| format!("<anonymous@{}>", node.start_position().row + 1))
}

/// Find the call's argument list by its near-universal `arguments` field
/// and split the node's text there, rather than trusting a `function`
/// field name that not every grammar in the table uses (e.g. Java's
/// `method_invocation` has no `function` field).
fn classify_call(node: &Node, source: &str) -> Option<(String, CallKind)> {
    let arguments = node.child_by_field_name("arguments")?;
    let callee_text = source[node.start_byte()..arguments.start_byte()].trim().to_string();
    if callee_text.is_empty() {
        return None;
    }
    let kind = if callee_text.starts_with("self.") || callee_text.starts_with("this.") {
        CallKind::Method
    } else if callee_text.contains("::") || callee_text.contains('.') {
        CallKind::Qualified
    } else {
        CallKind::Free
    };
    Some((callee_text, kind))
}

/// Attach a receiver class to a `Method` call (`self`/`this`, always the
/// enclosing class) or promote a `Qualified` call to `Method` when its
/// receiver variable was constructor-tracked in this scope. Anything else
/// stays `Qualified`/`Free` and is resolved by short-name guessing in
/// Pass-2, which is fine there since those aren't receiver-typed calls.
fn receiver_for(kind: CallKind, callee_text: &str, scope: &Scope) -> (CallKind, Option<QualifiedName>) {
    match kind {
        CallKind::Method => (kind, scope.enclosing_class_qn.clone()),
        CallKind::Qualified => match callee_text.split_once('.') {
            Some((receiver, _)) if scope.locals.contains_key(receiver) => {
                (CallKind::Method, Some(QualifiedName::from_raw(scope.locals[receiver].clone())))
            }
            _ => (kind, None),
        },
        CallKind::Free => (kind, None),
    }
}

fn collect_bases(class_node: &Node, source: &str, kinds: &LanguageKinds, derived_qn: &QualifiedName, result: &mut PassOneResult) {
    let Some(container_kind) = kinds.base_class_container_kind else {
        return;
    };
    let (line, _) = line_range(class_node);
    if let Some(container) = find_child_by_kind(class_node, container_kind) {
        for base in crate::ast::find_descendants_by_kind(&container, kinds.identifier_kind) {
            result.bases.push(UnresolvedBase {
                derived_qn: derived_qn.clone(),
                base_text: node_text(&base, source).to_string(),
                is_interface: false,
                line,
            });
        }
    }
    for interface_kind in INTERFACE_CLAUSE_KINDS {
        if let Some(container) = find_child_by_kind(class_node, interface_kind) {
            for base in crate::ast::find_descendants_by_kind(&container, kinds.identifier_kind) {
                result.bases.push(UnresolvedBase {
                    derived_qn: derived_qn.clone(),
                    base_text: node_text(&base, source).to_string(),
                    is_interface: true,
                    line,
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use codegraph_parse::parse_file_default;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn parsed_python(src: &str) -> ParsedFile {
        let mut file = NamedTempFile::with_suffix(".py").unwrap();
        write!(file, "{src}").unwrap();
        match parse_file_default(file.path(), Language::Python).unwrap() {
            codegraph_parse::ParseOutcome::Parsed(parsed) => parsed,
            codegraph_parse::ParseOutcome::TooLarge { .. } => panic!("unexpected TooLarge"),
        }
    }

    #[test]
    fn nested_function_gets_dotted_qn_and_defines_edge() {
        let parsed = parsed_python("def outer():\n    def inner():\n        pass\n    inner()\n");
        let module_qn = QualifiedName::from_raw("proj.a");
        let result = run_pass1(&parsed, &module_qn, "a.py");
        let inner = result
            .batch
            .nodes
            .iter()
            .find(|n| n.qualified_name == "proj.a.outer.inner")
            .unwrap();
        assert_eq!(inner.label(), "Function");
        assert!(result
            .batch
            .relationships
            .iter()
            .any(|r| r.edge_type == "DEFINES" && r.source_qn == "proj.a.outer" && r.target_qn == "proj.a.outer.inner"));
    }

    #[test]
    fn class_method_is_emitted_as_method_with_defines_method_edge() {
        let parsed = parsed_python("class C:\n    def m(self):\n        pass\n");
        let module_qn = QualifiedName::from_raw("proj.a");
        let result = run_pass1(&parsed, &module_qn, "a.py");
        let method = result
            .batch
            .nodes
            .iter()
            .find(|n| n.qualified_name == "proj.a.C.m")
            .unwrap();
        assert_eq!(method.label(), "Method");
        assert!(result
            .batch
            .relationships
            .iter()
            .any(|r| r.edge_type == "DEFINES_METHOD" && r.target_qn == "proj.a.C.m"));
    }

    #[test]
    fn multiple_inheritance_yields_one_base_per_parent() {
        let parsed = parsed_python("class C(A, B):\n    pass\n");
        let module_qn = QualifiedName::from_raw("proj.a");
        let result = run_pass1(&parsed, &module_qn, "a.py");
        assert_eq!(result.bases.len(), 2);
    }

    #[test]
    fn free_call_is_recorded_as_free_kind() {
        let parsed = parsed_python("def f():\n    helper()\n");
        let module_qn = QualifiedName::from_raw("proj.a");
        let result = run_pass1(&parsed, &module_qn, "a.py");
        let call = result.calls.iter().find(|c| c.callee_text == "helper").unwrap();
        assert_eq!(call.kind, CallKind::Free);
    }

    #[test]
    fn method_call_on_self_is_recorded_as_method_kind() {
        let parsed = parsed_python("class C:\n    def m(self):\n        self.other()\n");
        let module_qn = QualifiedName::from_raw("proj.a");
        let result = run_pass1(&parsed, &module_qn, "a.py");
        let call = result.calls.iter().find(|c| c.callee_text == "self.other").unwrap();
        assert_eq!(call.kind, CallKind::Method);
        assert_eq!(call.receiver_class_qn.as_ref().unwrap().as_str(), "proj.a.C");
    }

    #[test]
    fn call_on_unknown_receiver_has_no_receiver_class() {
        let parsed = parsed_python("def f(widget):\n    widget.render()\n");
        let module_qn = QualifiedName::from_raw("proj.a");
        let result = run_pass1(&parsed, &module_qn, "a.py");
        let call = result.calls.iter().find(|c| c.callee_text == "widget.render").unwrap();
        assert!(call.receiver_class_qn.is_none());
    }

    #[test]
    fn constructor_tracked_local_carries_receiver_class() {
        let parsed = parsed_python("def f():\n    widget = Widget()\n    widget.render()\n");
        let module_qn = QualifiedName::from_raw("proj.a");
        let result = run_pass1(&parsed, &module_qn, "a.py");
        let call = result.calls.iter().find(|c| c.callee_text == "widget.render").unwrap();
        assert_eq!(call.kind, CallKind::Method);
        assert_eq!(call.receiver_class_qn.as_ref().unwrap().as_str(), "Widget");
    }

    #[test]
    fn import_statement_is_captured_verbatim() {
        let parsed = parsed_python("import os\n");
        let module_qn = QualifiedName::from_raw("proj.a");
        let result = run_pass1(&parsed, &module_qn, "a.py");
        assert_eq!(result.imports.len(), 1);
        assert_eq!(result.imports[0].raw_text, "import os");
    }
}
