//! Supported source languages and their file-extension mapping.

use std::fmt;

/// A language recognized by the Language Registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Language {
    Python,
    JavaScript,
    TypeScript,
    Rust,
    Go,
    Scala,
    Java,
    Cpp,
    C,
}

impl Language {
    pub const ALL: [Language; 9] = [
        Language::Python,
        Language::JavaScript,
        Language::TypeScript,
        Language::Rust,
        Language::Go,
        Language::Scala,
        Language::Java,
        Language::Cpp,
        Language::C,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Language::Python => "python",
            Language::JavaScript => "javascript",
            Language::TypeScript => "typescript",
            Language::Rust => "rust",
            Language::Go => "go",
            Language::Scala => "scala",
            Language::Java => "java",
            Language::Cpp => "cpp",
            Language::C => "c",
        }
    }

    /// File extensions recognized for this language, without the leading dot.
    pub fn extensions(&self) -> &'static [&'static str] {
        match self {
            Language::Python => &["py", "pyi"],
            Language::JavaScript => &["js", "jsx", "mjs", "cjs"],
            Language::TypeScript => &["ts", "tsx"],
            Language::Rust => &["rs"],
            Language::Go => &["go"],
            Language::Scala => &["scala", "sc"],
            Language::Java => &["java"],
            Language::Cpp => &["cpp", "cc", "cxx", "hpp", "hh", "hxx"],
            Language::C => &["c", "h"],
        }
    }

    pub fn from_extension(ext: &str) -> Option<Self> {
        let ext = ext.to_lowercase();
        Language::ALL
            .into_iter()
            .find(|lang| lang.extensions().contains(&ext.as_str()))
    }

    /// Resolve a language from a small set of recognized basenames that carry
    /// no informative extension (build files, manifests).
    pub fn from_special_basename(basename: &str) -> Option<&'static str> {
        match basename {
            "Makefile" | "makefile" => Some("make"),
            "Dockerfile" => Some("docker"),
            "Kconfig" => Some("kconfig"),
            "package.json" | "tsconfig.json" => Some("json"),
            _ => None,
        }
    }

    /// Resolve a special tag from a file extension for files that carry no
    /// `Language` of their own but still need a category for discovery and
    /// the analyzers that key off `CandidateFile::special_tag` (Gherkin
    /// `.feature` files for the Test/BDD Analyzer, `.env` for the Config
    /// Analyzer).
    pub fn from_special_extension(ext: &str) -> Option<&'static str> {
        match ext.to_lowercase().as_str() {
            "feature" => Some("gherkin"),
            "env" => Some("env"),
            _ => None,
        }
    }

    pub fn from_file_path(path: &str) -> Option<Self> {
        let basename = path.rsplit('/').next().unwrap_or(path);
        let ext = basename.rsplit_once('.').map(|(_, e)| e)?;
        Self::from_extension(ext)
    }

    /// `true` for languages whose classes/interfaces participate in
    /// `INHERITS_FROM` resolution the way the spec describes.
    pub fn has_oop_inheritance(&self) -> bool {
        !matches!(self, Language::C)
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_known_extensions() {
        assert_eq!(Language::from_extension("py"), Some(Language::Python));
        assert_eq!(Language::from_extension("TSX"), Some(Language::TypeScript));
        assert_eq!(Language::from_extension("xyz"), None);
    }

    #[test]
    fn resolves_from_file_path() {
        assert_eq!(
            Language::from_file_path("src/pkg/a.py"),
            Some(Language::Python)
        );
        assert_eq!(Language::from_file_path("README"), None);
    }

    #[test]
    fn c_and_cpp_extensions_distinct() {
        assert_eq!(Language::from_extension("c"), Some(Language::C));
        assert_eq!(Language::from_extension("cpp"), Some(Language::Cpp));
        assert_eq!(Language::from_extension("h"), Some(Language::C));
        assert_eq!(Language::from_extension("hpp"), Some(Language::Cpp));
    }
}
