//! Language Registry (spec §4.2): process-wide, populated at startup,
//! read-only thereafter. Owns the node-kind→entity-category mapping and the
//! names of the capture queries each `codegraph-parse` driver must expose;
//! the grammar handles and actual query objects live in `codegraph-parse`
//! to avoid a circular dependency between discovery and parsing.

use codegraph_model::Language;

/// The graph-entity category a grammar node kind maps to (spec §4.2).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityCategory {
    Function,
    Method,
    Class,
    Struct,
    Import,
    Call,
    Test,
}

/// Named capture queries every language entry must define (spec §4.2,
/// §4.4). The actual tree-sitter query source lives with the parser driver;
/// this is the registry's declaration of *which* queries exist for a
/// language, used by discovery-time validation and by tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryName {
    Functions,
    Classes,
    Calls,
    Imports,
    Tests,
    Inheritance,
}

impl QueryName {
    pub fn as_str(&self) -> &'static str {
        match self {
            QueryName::Functions => "functions",
            QueryName::Classes => "classes",
            QueryName::Calls => "calls",
            QueryName::Imports => "imports",
            QueryName::Tests => "tests",
            QueryName::Inheritance => "inheritance",
        }
    }
}

/// A single Language Registry entry.
#[derive(Debug, Clone)]
pub struct LanguageEntry {
    pub language: Language,
    pub extensions: &'static [&'static str],
    pub query_names: &'static [QueryName],
    pub has_packages: bool,
}

const ALL_QUERIES: &[QueryName] = &[
    QueryName::Functions,
    QueryName::Classes,
    QueryName::Calls,
    QueryName::Imports,
    QueryName::Tests,
    QueryName::Inheritance,
];

/// C has no class hierarchy, so it omits `inheritance`.
const NO_INHERITANCE: &[QueryName] = &[
    QueryName::Functions,
    QueryName::Classes,
    QueryName::Calls,
    QueryName::Imports,
    QueryName::Tests,
];

/// The process-wide table. Built once; every entry is `'static` data so
/// lookups never allocate.
pub struct LanguageRegistry {
    entries: Vec<LanguageEntry>,
}

impl LanguageRegistry {
    /// Populate the registry with every language the spec lists (§2, §4.2).
    pub fn bootstrap() -> Self {
        let entries = Language::ALL
            .into_iter()
            .map(|language| LanguageEntry {
                language,
                extensions: language.extensions(),
                query_names: if language.has_oop_inheritance() {
                    ALL_QUERIES
                } else {
                    NO_INHERITANCE
                },
                // Python/JS/TS/Rust/Go/Scala/Java use package- or
                // module-path-derived QNs; C/C++ fall back to the folder
                // chain (§4.4 edge case).
                has_packages: language.has_oop_inheritance(),
            })
            .collect();
        Self { entries }
    }

    pub fn entries(&self) -> &[LanguageEntry] {
        &self.entries
    }

    pub fn lookup(&self, language: Language) -> &LanguageEntry {
        self.entries
            .iter()
            .find(|e| e.language == language)
            .expect("bootstrap() registers every Language variant")
    }

    pub fn language_for_extension(&self, ext: &str) -> Option<Language> {
        Language::from_extension(ext)
    }
}

impl Default for LanguageRegistry {
    fn default() -> Self {
        Self::bootstrap()
    }
}
