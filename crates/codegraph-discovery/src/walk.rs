//! File Discovery (spec §4.1): walks the repository root, applies ignore
//! rules and the configured filter, and yields `(absolute_path,
//! relative_path, language_tag)` triples in deterministic lexicographic
//! order by relative path.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use codegraph_model::{CodegraphError, Language, Result};
use walkdir::WalkDir;

use crate::filter::DiscoveryFilter;

/// Directories skipped unconditionally, regardless of filter (spec §4.1).
const IGNORED_DIRS: &[&str] = &[
    ".git",
    ".venv",
    "venv",
    "node_modules",
    "target",
    "dist",
    "build",
    "__pycache__",
];

/// A discovered candidate file, tagged with its detected language.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateFile {
    pub absolute_path: PathBuf,
    pub relative_path: String,
    pub language: Option<Language>,
    /// Set for recognized special basenames with no informative extension
    /// (`Makefile`, `Dockerfile`, `Kconfig`, `package.json`, ...).
    pub special_tag: Option<&'static str>,
}

impl CandidateFile {
    pub fn is_source(&self) -> bool {
        self.language.is_some()
    }
}

/// Walk `repo_root`, applying `filter`, and return candidates sorted by
/// relative path. Symlinks are followed at most once per physical inode to
/// guard against cycles while still allowing one traversal of a symlinked
/// subtree (spec §4.1).
pub fn discover(repo_root: &Path, filter: &DiscoveryFilter) -> Result<Vec<CandidateFile>> {
    if !repo_root.is_dir() {
        return Err(CodegraphError::configuration(format!(
            "repo_path is not a directory: {}",
            repo_root.display()
        )));
    }

    let mut seen_inodes: HashSet<(u64, u64)> = HashSet::new();
    let mut candidates = Vec::new();

    let walker = WalkDir::new(repo_root)
        .follow_links(true)
        .into_iter()
        .filter_entry(|entry| {
            if entry.depth() == 0 {
                return true;
            }
            if entry.file_type().is_dir() {
                let name = entry.file_name().to_string_lossy();
                return !IGNORED_DIRS.contains(&name.as_ref());
            }
            true
        });

    for entry in walker {
        let entry = match entry {
            Ok(e) => e,
            Err(err) => {
                tracing::warn!(error = %err, "discovery: permission denied or unreadable entry, skipping");
                continue;
            }
        };

        if !entry.file_type().is_file() {
            continue;
        }

        if let Ok(metadata) = entry.metadata() {
            if let Some(inode_key) = inode_key(&metadata) {
                if !seen_inodes.insert(inode_key) {
                    continue;
                }
            }
        }

        let absolute_path = entry.path().to_path_buf();
        let relative_path = absolute_path
            .strip_prefix(repo_root)
            .unwrap_or(&absolute_path)
            .to_string_lossy()
            .replace('\\', "/");

        if !filter.matches_folder(&relative_path) || !filter.matches_pattern(&relative_path) {
            continue;
        }
        if filter.skip_tests && filter.is_test_path(&relative_path) {
            continue;
        }

        let basename = absolute_path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let language = Language::from_file_path(&relative_path);
        let special_tag = Language::from_special_basename(&basename).or_else(|| {
            basename.rsplit_once('.').and_then(|(_, ext)| Language::from_special_extension(ext))
        });

        if language.is_none() && special_tag.is_none() {
            continue;
        }

        candidates.push(CandidateFile {
            absolute_path,
            relative_path,
            language,
            special_tag,
        });
    }

    candidates.sort_by(|a, b| a.relative_path.cmp(&b.relative_path));
    Ok(candidates)
}

#[cfg(unix)]
fn inode_key(metadata: &std::fs::Metadata) -> Option<(u64, u64)> {
    use std::os::unix::fs::MetadataExt;
    Some((metadata.dev(), metadata.ino()))
}

#[cfg(not(unix))]
fn inode_key(_metadata: &std::fs::Metadata) -> Option<(u64, u64)> {
    None
}
