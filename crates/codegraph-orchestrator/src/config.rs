//! Layered `PipelineConfig` (spec §2a, §6): compiled-in defaults, an
//! optional TOML file, environment variables (`CODEGRAPH_*`), then explicit
//! builder overrides, each layer replacing the previous. Grounded on the
//! teacher's `PipelineConfig` builder (`codegraph-ir::config::pipeline_config`)
//! but flattened to the handful of options SPEC_FULL.md's §6 table names,
//! rather than that preset/stage-control system.

use std::path::PathBuf;

use codegraph_model::{CodegraphError, ErrorKind, Result};
use serde::Deserialize;

const DEFAULT_WORKERS_FRACTION: f64 = 0.8;
const DEFAULT_MAX_COMMITS: usize = 500;
const DEFAULT_SOFT_PARSE_TIMEOUT_SECS: u64 = 60;
const DEFAULT_BATCH_TIMEOUT_SECS: u64 = 30;
const DEFAULT_MEMORY_CAP_MB: u64 = 4096;

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct FileConfig {
    repo_path: Option<PathBuf>,
    clean: Option<bool>,
    parallel: Option<bool>,
    workers: Option<usize>,
    folder_filter: Option<String>,
    file_pattern: Option<String>,
    skip_tests: Option<bool>,
    output_json: Option<PathBuf>,
    graph_host: Option<String>,
    graph_port: Option<u16>,
    macro_expand_transitive: Option<bool>,
    max_commits: Option<usize>,
    memory_cap_mb: Option<u64>,
}

/// Builder for `PipelineConfig`; call `.build()` to validate.
#[derive(Debug, Clone, Default)]
pub struct PipelineConfigBuilder {
    file: FileConfig,
}

impl PipelineConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Layer 2: apply an optional TOML config file.
    pub fn with_toml_file(mut self, path: &std::path::Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|err| CodegraphError::configuration(format!("cannot read config file {}: {err}", path.display())))?;
        let file: FileConfig = toml::from_str(&contents)
            .map_err(|err| CodegraphError::configuration(format!("invalid TOML in {}: {err}", path.display())))?;
        self.file = merge(self.file, file);
        Ok(self)
    }

    /// Layer 3: apply `CODEGRAPH_*` environment variables.
    pub fn with_env(mut self) -> Self {
        let env = FileConfig {
            repo_path: std::env::var("CODEGRAPH_REPO_PATH").ok().map(PathBuf::from),
            clean: std::env::var("CODEGRAPH_CLEAN").ok().and_then(|v| v.parse().ok()),
            parallel: std::env::var("CODEGRAPH_PARALLEL").ok().and_then(|v| v.parse().ok()),
            workers: std::env::var("CODEGRAPH_WORKERS").ok().and_then(|v| v.parse().ok()),
            folder_filter: std::env::var("CODEGRAPH_FOLDER_FILTER").ok(),
            file_pattern: std::env::var("CODEGRAPH_FILE_PATTERN").ok(),
            skip_tests: std::env::var("CODEGRAPH_SKIP_TESTS").ok().and_then(|v| v.parse().ok()),
            output_json: std::env::var("CODEGRAPH_OUTPUT_JSON").ok().map(PathBuf::from),
            graph_host: std::env::var("CODEGRAPH_GRAPH_HOST").ok(),
            graph_port: std::env::var("CODEGRAPH_GRAPH_PORT").ok().and_then(|v| v.parse().ok()),
            macro_expand_transitive: std::env::var("CODEGRAPH_MACRO_EXPAND_TRANSITIVE").ok().and_then(|v| v.parse().ok()),
            max_commits: std::env::var("CODEGRAPH_MAX_COMMITS").ok().and_then(|v| v.parse().ok()),
            memory_cap_mb: std::env::var("CODEGRAPH_MEMORY_CAP_MB").ok().and_then(|v| v.parse().ok()),
        };
        self.file = merge(self.file, env);
        self
    }

    /// Layer 4: explicit builder overrides, the final and highest-priority layer.
    pub fn repo_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.file.repo_path = Some(path.into());
        self
    }

    pub fn clean(mut self, clean: bool) -> Self {
        self.file.clean = Some(clean);
        self
    }

    pub fn parallel(mut self, parallel: bool) -> Self {
        self.file.parallel = Some(parallel);
        self
    }

    pub fn workers(mut self, workers: usize) -> Self {
        self.file.workers = Some(workers);
        self
    }

    pub fn folder_filter(mut self, filter: impl Into<String>) -> Self {
        self.file.folder_filter = Some(filter.into());
        self
    }

    pub fn file_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.file.file_pattern = Some(pattern.into());
        self
    }

    pub fn skip_tests(mut self, skip: bool) -> Self {
        self.file.skip_tests = Some(skip);
        self
    }

    pub fn output_json(mut self, path: impl Into<PathBuf>) -> Self {
        self.file.output_json = Some(path.into());
        self
    }

    pub fn graph_endpoint(mut self, host: impl Into<String>, port: u16) -> Self {
        self.file.graph_host = Some(host.into());
        self.file.graph_port = Some(port);
        self
    }

    pub fn build(self) -> Result<PipelineConfig> {
        let repo_path = self
            .file
            .repo_path
            .ok_or_else(|| CodegraphError::configuration("repo_path is required"))?;
        if !repo_path.exists() {
            return Err(CodegraphError::configuration(format!("repo_path does not exist: {}", repo_path.display())));
        }

        let folder_filter: Vec<String> = self
            .file
            .folder_filter
            .map(|raw| raw.split(',').map(|s| s.trim().to_string()).filter(|s| !s.is_empty()).collect())
            .unwrap_or_default();
        let file_pattern: Vec<String> = self
            .file
            .file_pattern
            .map(|raw| raw.split(',').map(|s| s.trim().to_string()).filter(|s| !s.is_empty()).collect())
            .unwrap_or_default();

        let parallel = self.file.parallel.unwrap_or(true);
        let workers = self.file.workers.unwrap_or_else(default_worker_count).max(1);
        if !parallel && self.file.workers.is_some() {
            return Err(CodegraphError::configuration("workers=N conflicts with parallel=false"));
        }

        Ok(PipelineConfig {
            repo_path,
            clean: self.file.clean.unwrap_or(false),
            parallel,
            workers,
            folder_filter,
            file_pattern,
            skip_tests: self.file.skip_tests.unwrap_or(false),
            output_json: self.file.output_json,
            graph_host: self.file.graph_host.unwrap_or_else(|| "localhost".to_string()),
            graph_port: self.file.graph_port.unwrap_or(7687),
            macro_expand_transitive: self.file.macro_expand_transitive.unwrap_or(false),
            max_commits: self.file.max_commits.unwrap_or(DEFAULT_MAX_COMMITS),
            soft_parse_timeout_secs: DEFAULT_SOFT_PARSE_TIMEOUT_SECS,
            batch_timeout_secs: DEFAULT_BATCH_TIMEOUT_SECS,
            memory_cap_mb: self.file.memory_cap_mb.unwrap_or(DEFAULT_MEMORY_CAP_MB),
        })
    }
}

fn merge(base: FileConfig, overlay: FileConfig) -> FileConfig {
    FileConfig {
        repo_path: overlay.repo_path.or(base.repo_path),
        clean: overlay.clean.or(base.clean),
        parallel: overlay.parallel.or(base.parallel),
        workers: overlay.workers.or(base.workers),
        folder_filter: overlay.folder_filter.or(base.folder_filter),
        file_pattern: overlay.file_pattern.or(base.file_pattern),
        skip_tests: overlay.skip_tests.or(base.skip_tests),
        output_json: overlay.output_json.or(base.output_json),
        graph_host: overlay.graph_host.or(base.graph_host),
        graph_port: overlay.graph_port.or(base.graph_port),
        macro_expand_transitive: overlay.macro_expand_transitive.or(base.macro_expand_transitive),
        max_commits: overlay.max_commits.or(base.max_commits),
        memory_cap_mb: overlay.memory_cap_mb.or(base.memory_cap_mb),
    }
}

/// Default worker count: `max(1, 0.8 * cores)` (spec §4.9).
pub fn default_worker_count() -> usize {
    ((num_cpus::get() as f64) * DEFAULT_WORKERS_FRACTION).floor().max(1.0) as usize
}

/// Validated, immutable pipeline configuration (spec §6).
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub repo_path: PathBuf,
    pub clean: bool,
    pub parallel: bool,
    pub workers: usize,
    pub folder_filter: Vec<String>,
    pub file_pattern: Vec<String>,
    pub skip_tests: bool,
    pub output_json: Option<PathBuf>,
    pub graph_host: String,
    pub graph_port: u16,
    /// Open-question flag (spec §9): whether C macro expansion follows
    /// `#include` closures transitively or only within the translation unit.
    pub macro_expand_transitive: bool,
    pub max_commits: usize,
    pub soft_parse_timeout_secs: u64,
    pub batch_timeout_secs: u64,
    pub memory_cap_mb: u64,
}

impl PipelineConfig {
    pub fn builder() -> PipelineConfigBuilder {
        PipelineConfigBuilder::new()
    }

    pub fn project_name(&self) -> String {
        self.repo_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "project".to_string())
    }

    pub fn error_kind_for_config() -> ErrorKind {
        ErrorKind::Configuration
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_repo_path_is_a_configuration_error() {
        let result = PipelineConfig::builder().build();
        assert!(result.is_err());
        assert_eq!(result.unwrap_err().kind, ErrorKind::Configuration);
    }

    #[test]
    fn nonexistent_repo_path_is_a_configuration_error() {
        let result = PipelineConfig::builder().repo_path("/does/not/exist/anywhere").build();
        assert!(result.is_err());
    }

    #[test]
    fn workers_with_parallel_false_is_conflicting() {
        let dir = tempfile::TempDir::new().unwrap();
        let result = PipelineConfig::builder().repo_path(dir.path()).parallel(false).workers(4).build();
        assert!(result.is_err());
    }

    #[test]
    fn folder_filter_splits_on_comma() {
        let dir = tempfile::TempDir::new().unwrap();
        let config = PipelineConfig::builder().repo_path(dir.path()).folder_filter("a, b/c").build().unwrap();
        assert_eq!(config.folder_filter, vec!["a".to_string(), "b/c".to_string()]);
    }

    #[test]
    fn toml_file_layer_is_overridden_by_builder_layer() {
        let dir = tempfile::TempDir::new().unwrap();
        let config_path = dir.path().join("codegraph.toml");
        std::fs::write(&config_path, "workers = 2\nskip_tests = true\n").unwrap();
        let config = PipelineConfig::builder()
            .with_toml_file(&config_path)
            .unwrap()
            .repo_path(dir.path())
            .workers(7)
            .build()
            .unwrap();
        assert_eq!(config.workers, 7);
        assert!(config.skip_tests);
    }

    #[test]
    fn default_worker_count_is_at_least_one() {
        assert!(default_worker_count() >= 1);
    }
}
