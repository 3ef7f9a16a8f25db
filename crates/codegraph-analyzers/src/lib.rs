//! Specialized analyzers layered on top of Pass-1/Pass-2 output
//! (SPEC_FULL.md §4.6, §4.7, §4.7a): C pointer/kernel analysis, test/BDD
//! detection, config-file flattening, and git history.

pub mod config;
pub mod context;
pub mod kernel;
pub mod pointer;
pub mod test_bdd;
pub mod vcs;

pub use config::{analyze_config, ConfigFormat};
pub use context::enclosing_function_qn;
pub use kernel::{analyze_kernel, macro_closure_for, MacroEntry};
pub use pointer::analyze_pointers;
pub use test_bdd::{detect_tests, parse_feature_file};
pub use vcs::{build_vcs_batch, walk_history, CommitInfo, GitExecutor, ModuleGitStats};
