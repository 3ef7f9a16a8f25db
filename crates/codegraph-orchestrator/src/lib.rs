//! Orchestration (SPEC_FULL.md §2, §4.8, §6): the worker pool, cancellation,
//! memory policy, progress reporting, and layered config that `pipeline`
//! wires together into the three library entry points the spec names —
//! `ingest`, `export`, `ensure_indexes`.

pub mod cancel;
pub mod config;
pub mod memory;
pub mod pipeline;
pub mod pool;
pub mod progress;

pub use cancel::CancellationToken;
pub use config::{default_worker_count, PipelineConfig, PipelineConfigBuilder};
pub use memory::MemoryPolicy;
pub use pipeline::{ensure_indexes, export, ingest, run, run_cancellable};
pub use pool::WorkerPool;
pub use progress::ProgressReporter;
