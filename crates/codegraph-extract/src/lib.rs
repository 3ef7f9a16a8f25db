//! Definition extraction: the Definition Registry, containment-forest
//! builder, Pass-1 Definer, and Pass-2 Resolver (SPEC_FULL.md §4.4, §4.5).

pub mod ast;
pub mod containment;
pub mod cycles;
pub mod imports;
pub mod pass1;
pub mod pass2;
pub mod registry;
pub mod unresolved;

pub use containment::{build_containment, module_qn};
pub use cycles::detect_cycles;
pub use pass1::run_pass1;
pub use pass2::{resolve_calls, resolve_imports, resolve_inheritance, resolve_overrides, ResolutionContext};
pub use registry::{DefinitionRecord, DefinitionRegistry};
pub use unresolved::{CallKind, MethodDefinition, PassOneResult, UnresolvedBase, UnresolvedCall, UnresolvedImport};
