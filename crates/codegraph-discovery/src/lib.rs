//! File Discovery and Language Registry (SPEC_FULL.md §4.1, §4.2).

pub mod filter;
pub mod registry;
pub mod walk;

pub use filter::DiscoveryFilter;
pub use registry::{EntityCategory, LanguageEntry, LanguageRegistry, QueryName};
pub use walk::{discover, CandidateFile};
