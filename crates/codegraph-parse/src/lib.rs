//! Parser Drivers (SPEC_FULL.md §4.3): tree-sitter grammar handles,
//! memory-mapped/size-capped source loading, and per-language node-kind
//! tables consumed by Pass-1.

pub mod drivers;
pub mod kinds;
pub mod parser;
pub mod source;

pub use drivers::{build_parser, ts_language};
pub use kinds::{kinds_for, LanguageKinds};
pub use parser::{parse_file, parse_file_default, ParseOutcome, ParsedFile, DEFAULT_SOFT_TIMEOUT};
pub use source::{load_source, LoadOutcome, SourceBytes, DEFAULT_HARD_CAP_BYTES, MMAP_THRESHOLD_BYTES};
