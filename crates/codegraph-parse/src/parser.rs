//! Parser Drivers (spec §4.3): `parse(path, bytes) → (tree, captures)`.
//!
//! "Captures" are realized as the owned `LanguageKinds` table (kinds.rs)
//! plus the parsed `Tree`; `codegraph-extract`'s Pass-1 Definer walks the
//! tree directly rather than receiving a separate pre-extracted capture
//! list, since the tree and its kind table are both cheap, `Send` values
//! that a worker can produce and hand back as part of its pass-1 result.

use std::path::Path;
use std::time::Duration;

use codegraph_model::{CodegraphError, ErrorKind, Language, Result};
use tree_sitter::Tree;

use crate::drivers::build_parser;
use crate::kinds::{kinds_for, LanguageKinds};
use crate::source::{load_source, LoadOutcome, SourceBytes, DEFAULT_HARD_CAP_BYTES};

pub const DEFAULT_SOFT_TIMEOUT: Duration = Duration::from_secs(60);

/// A successfully parsed file, ready for Pass-1 traversal.
pub struct ParsedFile {
    pub tree: Tree,
    pub source: SourceBytes,
    pub language: Language,
    pub kinds: LanguageKinds,
    /// Set when the grammar produced an ERROR-rooted tree; such files are
    /// still returned and extracted on a best-effort basis (spec §4.3).
    pub had_error: bool,
}

impl ParsedFile {
    pub fn source_text(&self) -> &str {
        self.source.as_str()
    }
}

/// Outcome of attempting to parse one candidate file.
pub enum ParseOutcome {
    Parsed(ParsedFile),
    TooLarge { bytes: u64, cap: u64 },
}

/// Parse `path` as `language`. Returns `TooLarge` (not an error) when the
/// hard cap is exceeded, per spec §4.3; returns `Err` only when the
/// grammar itself cannot be loaded or the file cannot be read at all.
pub fn parse_file(
    path: &Path,
    language: Language,
    soft_timeout: Duration,
    hard_cap_bytes: u64,
) -> Result<ParseOutcome> {
    let source = match load_source(path, hard_cap_bytes)? {
        LoadOutcome::TooLarge { bytes, cap } => return Ok(ParseOutcome::TooLarge { bytes, cap }),
        LoadOutcome::Loaded(source) => source,
    };

    let extension = path
        .extension()
        .map(|e| e.to_string_lossy().to_string())
        .unwrap_or_default();

    let mut parser = build_parser(language, &extension)?;
    parser.set_timeout_micros(soft_timeout.as_micros() as u64);

    let tree = parser.parse(source.as_str(), None).ok_or_else(|| {
        CodegraphError::new(
            ErrorKind::Parse,
            format!("parse timed out after {soft_timeout:?}"),
        )
        .with_file(path.display().to_string())
    })?;

    let had_error = tree.root_node().has_error();
    if had_error {
        tracing::warn!(file = %path.display(), "parser produced an ERROR-rooted tree; extracting best-effort");
    }

    Ok(ParseOutcome::Parsed(ParsedFile {
        tree,
        source,
        language,
        kinds: kinds_for(language),
        had_error,
    }))
}

pub fn parse_file_default(path: &Path, language: Language) -> Result<ParseOutcome> {
    parse_file(path, language, DEFAULT_SOFT_TIMEOUT, DEFAULT_HARD_CAP_BYTES)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn parses_valid_python_source() {
        let mut file = NamedTempFile::with_suffix(".py").unwrap();
        write!(file, "def outer():\n    def inner():\n        pass\n    inner()\n").unwrap();
        let outcome = parse_file_default(file.path(), Language::Python).unwrap();
        match outcome {
            ParseOutcome::Parsed(parsed) => {
                assert!(!parsed.had_error);
                assert_eq!(parsed.tree.root_node().kind(), "module");
            }
            ParseOutcome::TooLarge { .. } => panic!("unexpected TooLarge"),
        }
    }

    #[test]
    fn flags_malformed_source_without_failing() {
        let mut file = NamedTempFile::with_suffix(".py").unwrap();
        write!(file, "def outer(:\n  pass").unwrap();
        let outcome = parse_file_default(file.path(), Language::Python).unwrap();
        match outcome {
            ParseOutcome::Parsed(parsed) => assert!(parsed.had_error),
            ParseOutcome::TooLarge { .. } => panic!("unexpected TooLarge"),
        }
    }

    #[test]
    fn oversized_file_is_reported_as_too_large_not_error() {
        let mut file = NamedTempFile::with_suffix(".py").unwrap();
        write!(file, "{}", "x = 1\n".repeat(10)).unwrap();
        let outcome = parse_file(file.path(), Language::Python, DEFAULT_SOFT_TIMEOUT, 10).unwrap();
        assert!(matches!(outcome, ParseOutcome::TooLarge { cap: 10, .. }));
    }
}
