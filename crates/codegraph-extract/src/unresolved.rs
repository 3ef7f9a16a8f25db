//! Pass-1 output buffers (spec §4.4, §4.5): everything a worker can say
//! about a single file without seeing any other file, left for Pass-2 to
//! resolve against the full Definition Registry.

use codegraph_model::{GraphBatch, QualifiedName};

/// How a call expression's callee text was shaped in the source, used by
/// Pass-2 to pick a resolution strategy (spec §4.5: local > imported >
/// same-package > external, in that order).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallKind {
    /// A bare name, e.g. `helper()`.
    Free,
    /// `self.method()` / `this.method()`, resolved against the enclosing
    /// class's method table first.
    Method,
    /// A dotted/double-colon qualified call, e.g. `pkg.mod.fn()` or
    /// `a::b::fn()`, resolved by longest matching QN suffix.
    Qualified,
}

/// A call site recorded during Pass-1, not yet resolved to a target QN.
#[derive(Debug, Clone)]
pub struct UnresolvedCall {
    /// QN of the function/method body the call appears inside.
    pub caller_qn: QualifiedName,
    /// Raw callee text as written, e.g. `helper`, `self.run`, `pkg.mod.f`.
    pub callee_text: String,
    pub kind: CallKind,
    pub line: u32,
    /// For `CallKind::Method`, the receiver's class — either the full QN of
    /// the enclosing class (`self`/`this`) or the short class name a local
    /// constructor-site assignment bound the receiver variable to. `None`
    /// means the receiver's type isn't locally known, in which case Pass-2
    /// must drop the call rather than guess (spec §4.5 dynamic-dispatch
    /// note).
    pub receiver_class_qn: Option<QualifiedName>,
}

/// A raw import/use/include statement recorded during Pass-1.
#[derive(Debug, Clone)]
pub struct UnresolvedImport {
    /// QN of the Module the import statement lives in.
    pub module_qn: QualifiedName,
    /// Raw statement text, parsed per-language by Pass-2 (spec §4.5).
    pub raw_text: String,
    pub line: u32,
}

/// A base-class/interface reference recorded during Pass-1, e.g. the
/// `Base` in `class Derived(Base):` or the `Iface` in `impl Iface for T`.
#[derive(Debug, Clone)]
pub struct UnresolvedBase {
    pub derived_qn: QualifiedName,
    pub base_text: String,
    /// `true` when the language's grammar distinguishes interface
    /// implementation from class inheritance (spec §3: IMPLEMENTS vs
    /// INHERITS_FROM).
    pub is_interface: bool,
    pub line: u32,
}

/// A method definition recorded during Pass-1, carried separately from
/// `DefinitionRecord` insertion so Pass-2 can run override resolution
/// (spec §4.5 diamond-inheritance tie-break) once every class's method
/// table is known.
#[derive(Debug, Clone)]
pub struct MethodDefinition {
    pub method_qn: QualifiedName,
    pub owner_class_qn: QualifiedName,
    pub short_name: String,
}

/// Everything Pass-1 extracted from one file, handed to the aggregator.
#[derive(Debug, Default)]
pub struct PassOneResult {
    /// Project/Package/Folder/File/Module nodes are built separately by
    /// `containment::build_containment`; this batch carries only
    /// definition nodes (Class/Function/Method/...) and the
    /// DEFINES/DEFINES_METHOD edges that attach them to their Module.
    pub batch: GraphBatch,
    pub methods: Vec<MethodDefinition>,
    pub imports: Vec<UnresolvedImport>,
    pub bases: Vec<UnresolvedBase>,
    pub calls: Vec<UnresolvedCall>,
}

impl PassOneResult {
    pub fn merge(&mut self, mut other: PassOneResult) {
        self.batch.merge(other.batch);
        self.methods.append(&mut other.methods);
        self.imports.append(&mut other.imports);
        self.bases.append(&mut other.bases);
        self.calls.append(&mut other.calls);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_combines_all_buffers() {
        let mut a = PassOneResult::default();
        a.calls.push(UnresolvedCall {
            caller_qn: QualifiedName::from_raw("proj.a.f"),
            callee_text: "helper".to_string(),
            kind: CallKind::Free,
            line: 3,
            receiver_class_qn: None,
        });
        let mut b = PassOneResult::default();
        b.imports.push(UnresolvedImport {
            module_qn: QualifiedName::from_raw("proj.a"),
            raw_text: "import os".to_string(),
            line: 1,
        });
        a.merge(b);
        assert_eq!(a.calls.len(), 1);
        assert_eq!(a.imports.len(), 1);
    }
}
