//! Definition Registry (spec §4.4, §4.5, GLOSSARY): an in-memory index
//! from QN to emitted node descriptors, appended to only by the
//! aggregator, consumed read-only by Pass-2.

use std::collections::HashMap;

use codegraph_model::{Language, NodeLabel, QualifiedName};

/// One emitted definition, enough for Pass-2 name resolution without
/// re-walking the syntax tree.
#[derive(Debug, Clone)]
pub struct DefinitionRecord {
    pub qn: QualifiedName,
    pub label: NodeLabel,
    pub language: Language,
    /// Relative path of the file that defined this entity.
    pub file_path: String,
    pub start_line: u32,
    pub end_line: u32,
    /// For a Method, the QN of the owning Class/Struct.
    pub parent_class: Option<QualifiedName>,
}

/// Append-only, single-aggregator-owned table from QN to its definition.
///
/// Per spec §5 ("insertion into the Definition Registry is serialized"),
/// this is deliberately a plain `HashMap` behind a type that only the
/// aggregator touches, rather than a concurrent map: the worker pool never
/// writes into it directly, it only returns owned `PassOneResult`s that the
/// aggregator folds in one at a time.
#[derive(Debug, Default)]
pub struct DefinitionRegistry {
    by_qn: HashMap<String, DefinitionRecord>,
    /// QNs grouped by short name, to make Pass-2's "same-package" and
    /// "longest matching suffix" lookups linear in the candidate set
    /// instead of the whole registry.
    by_short_name: HashMap<String, Vec<String>>,
}

impl DefinitionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `record`, ignoring it (with a warning) if its QN is already
    /// present — spec §4.4: "An entity with duplicate QN within the same
    /// file is merged into the first; subsequent definitions are ignored."
    pub fn insert(&mut self, record: DefinitionRecord) {
        let qn = record.qn.as_str().to_string();
        if self.by_qn.contains_key(&qn) {
            tracing::warn!(qn, "duplicate qualified name, keeping first definition");
            return;
        }
        self.by_short_name
            .entry(record.qn.short_name().to_string())
            .or_default()
            .push(qn.clone());
        self.by_qn.insert(qn, record);
    }

    pub fn get(&self, qn: &QualifiedName) -> Option<&DefinitionRecord> {
        self.by_qn.get(qn.as_str())
    }

    pub fn contains(&self, qn: &QualifiedName) -> bool {
        self.by_qn.contains_key(qn.as_str())
    }

    pub fn candidates_by_short_name(&self, short_name: &str) -> Vec<&DefinitionRecord> {
        self.by_short_name
            .get(short_name)
            .into_iter()
            .flatten()
            .filter_map(|qn| self.by_qn.get(qn))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.by_qn.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_qn.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &DefinitionRecord> {
        self.by_qn.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(qn: &str, label: NodeLabel) -> DefinitionRecord {
        DefinitionRecord {
            qn: QualifiedName::from_raw(qn),
            label,
            language: Language::Python,
            file_path: "a.py".to_string(),
            start_line: 1,
            end_line: 2,
            parent_class: None,
        }
    }

    #[test]
    fn duplicate_qn_keeps_first_definition() {
        let mut registry = DefinitionRegistry::new();
        registry.insert(record("proj.a.f", NodeLabel::Function));
        registry.insert(record("proj.a.f", NodeLabel::Class));
        let found = registry.get(&QualifiedName::from_raw("proj.a.f")).unwrap();
        assert_eq!(found.label, NodeLabel::Function);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn candidates_by_short_name_finds_all_matches() {
        let mut registry = DefinitionRegistry::new();
        registry.insert(record("proj.a.helper", NodeLabel::Function));
        registry.insert(record("proj.b.helper", NodeLabel::Function));
        let candidates = registry.candidates_by_short_name("helper");
        assert_eq!(candidates.len(), 2);
    }
}
