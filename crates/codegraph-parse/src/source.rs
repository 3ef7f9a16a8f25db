//! File content loading with the memory-mapping and size-cap policy from
//! spec §4.3: files ≥10 MB are memory-mapped; files over the hard cap
//! (default 50 MB) are skipped entirely.

use std::fs::File;
use std::path::Path;

use codegraph_model::{CodegraphError, Result};
use memmap2::Mmap;

pub const MMAP_THRESHOLD_BYTES: u64 = 10 * 1024 * 1024;
pub const DEFAULT_HARD_CAP_BYTES: u64 = 50 * 1024 * 1024;

/// Owned or memory-mapped file bytes, exposed uniformly as `&str`.
///
/// Non-UTF-8 files are treated as `Parse` warnings upstream (lossily
/// decoded) rather than hard failures, since tree-sitter grammars only need
/// valid UTF-8 to produce a best-effort ERROR-rooted tree.
pub enum SourceBytes {
    Owned(String),
    Mapped { mmap: Mmap, text: String },
}

impl SourceBytes {
    pub fn as_str(&self) -> &str {
        match self {
            SourceBytes::Owned(s) => s,
            SourceBytes::Mapped { text, .. } => text,
        }
    }
}

/// Outcome of attempting to load a candidate file's contents.
pub enum LoadOutcome {
    Loaded(SourceBytes),
    /// Spec §4.3: "files whose byte length exceeds a hard cap ... are
    /// skipped with a `FileTooLarge` warning and no nodes emitted."
    TooLarge { bytes: u64, cap: u64 },
}

/// Read `path`'s contents, honoring the mmap threshold and hard cap.
pub fn load_source(path: &Path, hard_cap_bytes: u64) -> Result<LoadOutcome> {
    let metadata = std::fs::metadata(path)?;
    let len = metadata.len();

    if len > hard_cap_bytes {
        return Ok(LoadOutcome::TooLarge {
            bytes: len,
            cap: hard_cap_bytes,
        });
    }

    if len >= MMAP_THRESHOLD_BYTES {
        let file = File::open(path)?;
        // SAFETY: the file is not concurrently truncated by this process;
        // external mutation during a read-only ingest run is an accepted
        // risk the teacher's own mmap usage takes for the same tradeoff.
        let mmap = unsafe { Mmap::map(&file) }
            .map_err(|e| CodegraphError::discovery(format!("mmap failed: {e}")))?;
        let text = String::from_utf8_lossy(&mmap).into_owned();
        return Ok(LoadOutcome::Loaded(SourceBytes::Mapped { mmap, text }));
    }

    let bytes = std::fs::read(path)?;
    let text = String::from_utf8_lossy(&bytes).into_owned();
    Ok(LoadOutcome::Loaded(SourceBytes::Owned(text)))
}
