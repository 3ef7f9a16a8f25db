//! Per-language tree-sitter grammar handles (spec §4.2, §4.3).
//!
//! Grounded on the teacher's `infrastructure/tree_sitter_adapter.rs`, which
//! sets the grammar via `Parser::set_language(&tree_sitter_<lang>::language())`
//! for every supported language rather than building one generic adapter
//! trait per grammar crate.

use codegraph_model::{CodegraphError, Language};
use tree_sitter::{Language as TsLanguage, Parser};

/// Resolve the tree-sitter grammar for a language. TypeScript's `.tsx`
/// extension uses the TSX grammar variant; callers that only know the
/// `Language` (not the extension) get the plain TypeScript grammar, and the
/// parser driver falls back to TSX only when the `.tsx` extension is known
/// (see `build_parser_for_extension`).
pub fn ts_language(language: Language) -> TsLanguage {
    match language {
        Language::Python => tree_sitter_python::language(),
        Language::JavaScript => tree_sitter_javascript::language(),
        Language::TypeScript => tree_sitter_typescript::language_typescript(),
        Language::Rust => tree_sitter_rust::language(),
        Language::Go => tree_sitter_go::language(),
        Language::Scala => tree_sitter_scala::language(),
        Language::Java => tree_sitter_java::language(),
        Language::Cpp => tree_sitter_cpp::language(),
        Language::C => tree_sitter_c::language(),
    }
}

/// Build a `Parser` for `language`, optionally selecting the TSX grammar
/// when the source file's extension is `.tsx`.
pub fn build_parser(language: Language, extension: &str) -> Result<Parser, CodegraphError> {
    let mut parser = Parser::new();
    let grammar = if language == Language::TypeScript && extension.eq_ignore_ascii_case("tsx") {
        tree_sitter_typescript::language_tsx()
    } else {
        ts_language(language)
    };
    parser
        .set_language(&grammar)
        .map_err(|e| CodegraphError::parse(format!("failed to load {language} grammar: {e}")))?;
    Ok(parser)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_parser_for_every_language() {
        for language in Language::ALL {
            let ext = language.extensions()[0];
            assert!(build_parser(language, ext).is_ok(), "{language:?} failed");
        }
    }

    #[test]
    fn typescript_falls_back_to_tsx_grammar_for_tsx_files() {
        assert!(build_parser(Language::TypeScript, "tsx").is_ok());
        assert!(build_parser(Language::TypeScript, "ts").is_ok());
    }
}
