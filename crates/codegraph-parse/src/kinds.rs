//! Per-language node-kind tables: the concrete realization of the Language
//! Registry's "node-kind→graph-entity mapping" and "named capture queries"
//! (spec §4.2). Rather than hand-writing a `tree_sitter::Query` s-expression
//! per grammar, this mirrors the teacher's own
//! `shared/utils/tree_sitter.rs` approach of matching on `Node::kind()`
//! directly — the teacher never uses `tree_sitter::Query` either, across
//! its entire extractor layer.

use codegraph_model::{Language, NodeLabel};

/// The concrete tree-sitter node kinds that realize each capture query for
/// one language.
#[derive(Debug, Clone)]
pub struct LanguageKinds {
    pub language: Language,
    /// Free-function definitions at module (or nested-function) scope.
    pub function_kinds: &'static [&'static str],
    /// Class/struct/union/enum-like container kinds, each mapped to the
    /// `NodeLabel` it should be emitted as.
    pub class_like_kinds: &'static [(&'static str, NodeLabel)],
    /// Kind of the body block owned by a class-like node, used to find
    /// methods nested inside it.
    pub class_body_kind: Option<&'static str>,
    pub call_kinds: &'static [&'static str],
    pub import_kinds: &'static [&'static str],
    /// Node kind whose text (or a descendant identifier's text) names a
    /// base class in an inheritance clause.
    pub base_class_container_kind: Option<&'static str>,
    /// Identifier node kind used throughout the grammar for names.
    pub identifier_kind: &'static str,
    /// Decorator/annotation/attribute node kinds used to spot test markers
    /// (spec §4.7 "framework-specific markers").
    pub decorator_kinds: &'static [&'static str],
}

pub fn kinds_for(language: Language) -> LanguageKinds {
    match language {
        Language::Python => LanguageKinds {
            language,
            function_kinds: &["function_definition"],
            class_like_kinds: &[("class_definition", NodeLabel::Class)],
            class_body_kind: Some("block"),
            call_kinds: &["call"],
            import_kinds: &["import_statement", "import_from_statement"],
            base_class_container_kind: Some("argument_list"),
            identifier_kind: "identifier",
            decorator_kinds: &["decorator"],
        },
        Language::JavaScript => LanguageKinds {
            language,
            function_kinds: &["function_declaration", "function", "arrow_function"],
            class_like_kinds: &[("class_declaration", NodeLabel::Class)],
            class_body_kind: Some("class_body"),
            call_kinds: &["call_expression"],
            import_kinds: &["import_statement"],
            base_class_container_kind: Some("class_heritage"),
            identifier_kind: "identifier",
            decorator_kinds: &["decorator"],
        },
        Language::TypeScript => LanguageKinds {
            language,
            function_kinds: &["function_declaration", "function", "arrow_function"],
            class_like_kinds: &[
                ("class_declaration", NodeLabel::Class),
                ("interface_declaration", NodeLabel::Class),
            ],
            class_body_kind: Some("class_body"),
            call_kinds: &["call_expression"],
            import_kinds: &["import_statement"],
            base_class_container_kind: Some("class_heritage"),
            identifier_kind: "identifier",
            decorator_kinds: &["decorator"],
        },
        Language::Rust => LanguageKinds {
            language,
            function_kinds: &["function_item"],
            class_like_kinds: &[
                ("struct_item", NodeLabel::Struct),
                ("enum_item", NodeLabel::Enum),
                ("trait_item", NodeLabel::Class),
            ],
            class_body_kind: Some("declaration_list"),
            call_kinds: &["call_expression"],
            import_kinds: &["use_declaration"],
            base_class_container_kind: Some("trait_bounds"),
            identifier_kind: "identifier",
            decorator_kinds: &["attribute_item"],
        },
        Language::Go => LanguageKinds {
            language,
            function_kinds: &["function_declaration"],
            class_like_kinds: &[("type_declaration", NodeLabel::Struct)],
            class_body_kind: None,
            call_kinds: &["call_expression"],
            import_kinds: &["import_spec"],
            base_class_container_kind: None,
            identifier_kind: "identifier",
            decorator_kinds: &[],
        },
        Language::Java => LanguageKinds {
            language,
            function_kinds: &[],
            class_like_kinds: &[
                ("class_declaration", NodeLabel::Class),
                ("interface_declaration", NodeLabel::Class),
                ("enum_declaration", NodeLabel::Enum),
            ],
            class_body_kind: Some("class_body"),
            call_kinds: &["method_invocation"],
            import_kinds: &["import_declaration"],
            base_class_container_kind: Some("superclass"),
            identifier_kind: "identifier",
            decorator_kinds: &["annotation", "marker_annotation"],
        },
        Language::Scala => LanguageKinds {
            language,
            function_kinds: &[],
            class_like_kinds: &[
                ("class_definition", NodeLabel::Class),
                ("object_definition", NodeLabel::Class),
                ("trait_definition", NodeLabel::Class),
            ],
            class_body_kind: Some("template_body"),
            call_kinds: &["call_expression"],
            import_kinds: &["import_declaration"],
            base_class_container_kind: Some("extends_clause"),
            identifier_kind: "identifier",
            decorator_kinds: &["annotation"],
        },
        Language::Cpp => LanguageKinds {
            language,
            function_kinds: &["function_definition"],
            class_like_kinds: &[
                ("class_specifier", NodeLabel::Class),
                ("struct_specifier", NodeLabel::Struct),
                ("union_specifier", NodeLabel::Union),
                ("enum_specifier", NodeLabel::Enum),
            ],
            class_body_kind: Some("field_declaration_list"),
            call_kinds: &["call_expression"],
            import_kinds: &["preproc_include"],
            base_class_container_kind: Some("base_class_clause"),
            identifier_kind: "identifier",
            decorator_kinds: &[],
        },
        Language::C => LanguageKinds {
            language,
            function_kinds: &["function_definition"],
            class_like_kinds: &[
                ("struct_specifier", NodeLabel::Struct),
                ("union_specifier", NodeLabel::Union),
                ("enum_specifier", NodeLabel::Enum),
            ],
            class_body_kind: Some("field_declaration_list"),
            call_kinds: &["call_expression"],
            import_kinds: &["preproc_include"],
            base_class_container_kind: None,
            identifier_kind: "identifier",
            decorator_kinds: &[],
        },
    }
}

impl LanguageKinds {
    pub fn is_function_kind(&self, kind: &str) -> bool {
        self.function_kinds.contains(&kind)
    }

    pub fn class_label_for_kind(&self, kind: &str) -> Option<NodeLabel> {
        self.class_like_kinds
            .iter()
            .find(|(k, _)| *k == kind)
            .map(|(_, label)| *label)
    }

    pub fn is_call_kind(&self, kind: &str) -> bool {
        self.call_kinds.contains(&kind)
    }

    pub fn is_import_kind(&self, kind: &str) -> bool {
        self.import_kinds.contains(&kind)
    }
}
