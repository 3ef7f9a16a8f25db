//! Folder/pattern/skip-tests filters applied during discovery (spec §4.1).

/// Filters narrowing the set of files File Discovery yields.
#[derive(Debug, Clone, Default)]
pub struct DiscoveryFilter {
    /// Comma-separated relative path prefixes; empty means "no restriction".
    pub folder_prefixes: Vec<String>,
    /// Glob patterns (e.g. `*.py`); empty means "no restriction".
    pub file_patterns: Vec<String>,
    pub skip_tests: bool,
}

impl DiscoveryFilter {
    pub fn parse_folder_filter(raw: &str) -> Vec<String> {
        raw.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| s.trim_end_matches('/').to_string())
            .collect()
    }

    pub fn parse_file_pattern(raw: &str) -> Vec<String> {
        raw.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    }

    pub fn matches_folder(&self, relative_path: &str) -> bool {
        self.folder_prefixes.is_empty()
            || self
                .folder_prefixes
                .iter()
                .any(|prefix| relative_path.starts_with(prefix.as_str()))
    }

    pub fn matches_pattern(&self, relative_path: &str) -> bool {
        self.file_patterns.is_empty()
            || self
                .file_patterns
                .iter()
                .any(|pattern| glob_match(pattern, relative_path))
    }

    pub fn is_test_path(&self, relative_path: &str) -> bool {
        is_test_path(relative_path)
    }
}

/// Minimal glob matcher supporting `*` (any run of characters) anchored to
/// the basename, which covers the spec's `"*.py,*.c"` style patterns
/// without pulling in a full glob crate for this one use.
fn glob_match(pattern: &str, relative_path: &str) -> bool {
    let basename = relative_path.rsplit('/').next().unwrap_or(relative_path);
    match pattern.split_once('*') {
        None => basename == pattern,
        Some((prefix, suffix)) => {
            basename.len() >= prefix.len() + suffix.len()
                && basename.starts_with(prefix)
                && basename.ends_with(suffix)
        }
    }
}

/// Test-file path conventions from spec §4.7: `*_test.go`, `test_*.py`,
/// `*.test.ts`, `*.spec.js`, `*Tests.java`, `*_test.c`.
pub fn is_test_path(relative_path: &str) -> bool {
    let basename = relative_path.rsplit('/').next().unwrap_or(relative_path);
    basename.ends_with("_test.go")
        || basename.ends_with("_test.c")
        || basename.starts_with("test_")
        || basename.ends_with(".test.ts")
        || basename.ends_with(".test.tsx")
        || basename.ends_with(".test.js")
        || basename.ends_with(".spec.ts")
        || basename.ends_with(".spec.js")
        || basename.ends_with("Tests.java")
        || basename.ends_with("Test.java")
        || basename.ends_with("_test.rs")
        || basename.ends_with("Test.scala")
}
