//! Pipeline orchestration (spec §2, §4.8): wires File Discovery, the
//! parallel Pass-1 Definer, containment-forest construction, the Pass-2
//! Resolver, the specialized analyzers, and the Graph Writer together in
//! the write order spec §4.8 prescribes (indexes, then containment, then
//! definitions, then resolved edges, then analyzer output), accumulating
//! every non-fatal error into a `RunReport` along the way.
//!
//! Parsing and Pass-1 run in the same worker-pool closure per file, since
//! both are "one call per file with no cross-file dependency" work; the
//! teacher's `end_to_end_orchestrator` groups stages the same way around
//! what a single worker can finish without touching another file's state.

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use codegraph_analyzers::{
    analyze_config, analyze_kernel, analyze_pointers, build_vcs_batch, detect_tests, kernel, parse_feature_file, walk_history, ConfigFormat, MacroEntry,
};
use codegraph_discovery::{discover, CandidateFile, DiscoveryFilter};
use codegraph_extract::{
    build_containment, detect_cycles, module_qn, resolve_calls, resolve_imports, resolve_inheritance, resolve_overrides, run_pass1,
    DefinitionRecord, DefinitionRegistry, PassOneResult, ResolutionContext, UnresolvedImport,
};
use codegraph_graph::{BoltGraphWriter, GraphClientConfig, GraphWriter};
use codegraph_model::{
    ErrorKind, GraphBatch, Language, NodeLabel, NodeRecord, QualifiedName, RelationshipRecord, Result, RunReport,
};
use codegraph_parse::{parse_file, ParseOutcome, DEFAULT_HARD_CAP_BYTES};

use crate::cancel::CancellationToken;
use crate::config::PipelineConfig;
use crate::memory::MemoryPolicy;
use crate::pool::WorkerPool;
use crate::progress::ProgressReporter;

/// `ingest(config)` (spec §6): connects to the configured graph endpoint
/// and runs the full pipeline against it.
pub async fn ingest(config: &PipelineConfig) -> Result<RunReport> {
    let writer = connect(config).await?;
    let cancel = CancellationToken::new();
    cancel.watch_sigint();
    run_cancellable(config, &writer, &cancel).await
}

/// `export(path)` (spec §6): queries the live graph rather than replaying
/// a specific `ingest()` run's in-memory batches, so it works as its own
/// standalone operation.
pub async fn export(config: &PipelineConfig, path: &Path) -> Result<()> {
    let writer = connect(config).await?;
    codegraph_graph::export_graph_to_json(writer.graph(), path).await
}

/// `ensure_indexes()` (spec §6): the Index Manager, runnable independently
/// of a full ingest.
pub async fn ensure_indexes(config: &PipelineConfig) -> Result<()> {
    let writer = connect(config).await?;
    writer.ensure_indexes().await
}

async fn connect(config: &PipelineConfig) -> Result<BoltGraphWriter> {
    let graph_config = GraphClientConfig {
        host: config.graph_host.clone(),
        port: config.graph_port,
        ..GraphClientConfig::default()
    };
    BoltGraphWriter::connect(&graph_config).await
}

/// Run the pipeline against any `GraphWriter`, with cancellation checked
/// between major stages. The orchestrator's integration tests drive this
/// directly against an in-memory fake, bypassing the network entirely.
pub async fn run(config: &PipelineConfig, writer: &dyn GraphWriter) -> Result<RunReport> {
    let cancel = CancellationToken::new();
    run_cancellable(config, writer, &cancel).await
}

pub async fn run_cancellable(config: &PipelineConfig, writer: &dyn GraphWriter, cancel: &CancellationToken) -> Result<RunReport> {
    let mut report = RunReport::default();
    let project = config.project_name();

    writer.ensure_indexes().await?;
    if config.clean {
        writer.clean_project(&project).await?;
    }

    let filter = DiscoveryFilter {
        folder_prefixes: config.folder_filter.clone(),
        file_patterns: config.file_pattern.clone(),
        skip_tests: config.skip_tests,
    };
    let files = discover(&config.repo_path, &filter)?;
    report.files_discovered = files.len();

    let containment_batch = build_containment(&project, &files);
    writer.write_batch(&containment_batch).await?;
    report.nodes_written += containment_batch.nodes.len();
    report.relationships_written += containment_batch.relationships.len();

    if cancel.is_cancelled() {
        report.cancelled = true;
        return Ok(report);
    }

    let (aggregated, per_file_sources) = run_pass1_stage(config, &project, &files, &mut report)?;
    writer.write_batch(&aggregated.batch).await?;
    report.nodes_written += aggregated.batch.nodes.len();
    report.relationships_written += aggregated.batch.relationships.len();

    if cancel.is_cancelled() {
        report.cancelled = true;
        return Ok(report);
    }

    let registry = build_registry(&aggregated.batch.nodes);
    let modules: HashSet<String> = files
        .iter()
        .filter(|f| f.language.is_some())
        .map(|f| module_qn(&project, &f.relative_path).into_string())
        .collect();

    let pass2_batch = run_pass2_stage(&aggregated, &registry, &modules, &per_file_sources, &mut report);
    writer.write_batch(&pass2_batch).await?;
    report.nodes_written += pass2_batch.nodes.len();
    report.relationships_written += pass2_batch.relationships.len();

    if cancel.is_cancelled() {
        report.cancelled = true;
        return Ok(report);
    }

    let resolved_calls: Vec<RelationshipRecord> = pass2_batch.relationships.iter().filter(|r| r.edge_type == "CALLS").cloned().collect();
    let analyzer_batch = run_analyzer_stage(config, &project, &files, &per_file_sources, &registry, &resolved_calls, &mut report);
    writer.write_batch(&analyzer_batch).await?;
    report.nodes_written += analyzer_batch.nodes.len();
    report.relationships_written += analyzer_batch.relationships.len();

    if let Some(path) = &config.output_json {
        let batches = [containment_batch, aggregated.batch, pass2_batch, analyzer_batch];
        codegraph_graph::export_to_json(&batches, path)?;
    }

    report.cancelled = cancel.is_cancelled();
    Ok(report)
}

/// One file's worth of Pass-1 context the later stages (Pass-2's language
/// grouping, the analyzers) need but that `PassOneResult` itself doesn't
/// carry, since it's a pure accumulator of graph records.
struct FileContext {
    candidate: CandidateFile,
    module_qn: QualifiedName,
    language: Language,
    source: String,
}

enum StageOutcome {
    Parsed { context: FileContext, had_error: bool, pass1: PassOneResult },
    TooLarge,
    Failed,
}

fn run_pass1_stage(
    config: &PipelineConfig,
    project: &str,
    files: &[CandidateFile],
    report: &mut RunReport,
) -> Result<(PassOneResult, Vec<FileContext>)> {
    struct Job {
        candidate: CandidateFile,
        module_qn: QualifiedName,
        size_bytes: u64,
    }

    let jobs: Vec<Job> = files
        .iter()
        .filter(|f| f.language.is_some())
        .map(|f| Job {
            module_qn: module_qn(project, &f.relative_path),
            size_bytes: f.absolute_path.metadata().map(|m| m.len()).unwrap_or(0),
            candidate: f.clone(),
        })
        .collect();

    let memory_policy = MemoryPolicy::new(config.memory_cap_mb);
    let worker_count = if config.parallel { config.workers } else { 1 };
    let pool = WorkerPool::new(worker_count)?;
    let soft_timeout = Duration::from_secs(config.soft_parse_timeout_secs);

    let total_bytes: u64 = jobs.iter().map(|job| job.size_bytes).sum();
    let progress = Arc::new(ProgressReporter::new(total_bytes));

    let outcomes: Vec<StageOutcome> = pool.map(jobs, |job| {
        if memory_policy.should_pause() {
            std::thread::sleep(Duration::from_millis(50));
        }
        let language = job.candidate.language.expect("filtered to source files above");
        let outcome = match parse_file(&job.candidate.absolute_path, language, soft_timeout, DEFAULT_HARD_CAP_BYTES) {
            Ok(ParseOutcome::Parsed(parsed)) => {
                let pass1 = run_pass1(&parsed, &job.module_qn, &job.candidate.relative_path);
                let context = FileContext {
                    candidate: job.candidate,
                    module_qn: job.module_qn,
                    language,
                    source: parsed.source_text().to_string(),
                };
                StageOutcome::Parsed { context, had_error: parsed.had_error, pass1 }
            }
            Ok(ParseOutcome::TooLarge { .. }) => StageOutcome::TooLarge,
            Err(_) => StageOutcome::Failed,
        };
        progress.advance(job.size_bytes);
        let eta_secs = progress.eta().map(|d| d.as_secs());
        tracing::info!(percent = progress.percent(), ?eta_secs, "pass-1 progress");
        outcome
    });

    let mut aggregated = PassOneResult::default();
    let mut contexts = Vec::new();
    for outcome in outcomes {
        match outcome {
            StageOutcome::Parsed { context, had_error, pass1 } => {
                report.files_parsed += 1;
                if had_error {
                    report.record_error(ErrorKind::Parse);
                }
                aggregated.merge(pass1);
                contexts.push(context);
            }
            StageOutcome::TooLarge => report.files_skipped_too_large += 1,
            StageOutcome::Failed => report.record_error(ErrorKind::Parse),
        }
    }

    Ok((aggregated, contexts))
}

/// Project a Pass-1 node back into a `DefinitionRecord` for the registry.
/// Only definition-bearing labels are kept; containment nodes (Project,
/// Package, Folder, File, Module) never enter the registry, since Pass-2
/// resolves against them via the separate `modules` set instead.
fn build_registry(nodes: &[NodeRecord]) -> DefinitionRegistry {
    let mut registry = DefinitionRegistry::new();
    for node in nodes {
        if let Some(record) = definition_record_from_node(node) {
            registry.insert(record);
        }
    }
    registry
}

fn definition_record_from_node(node: &NodeRecord) -> Option<DefinitionRecord> {
    let label = NodeLabel::ALL.iter().copied().find(|l| l.as_str() == node.label())?;
    if !matches!(label, NodeLabel::Function | NodeLabel::Method | NodeLabel::Class | NodeLabel::Struct | NodeLabel::Union | NodeLabel::Enum) {
        return None;
    }
    let qn = QualifiedName::from_raw(node.qualified_name.clone());
    let file_path = node.properties.get("file_path").and_then(|v| v.as_str()).unwrap_or_default().to_string();
    let start_line = node.properties.get("start_line").and_then(|v| v.as_i64()).unwrap_or(0) as u32;
    let end_line = node.properties.get("end_line").and_then(|v| v.as_i64()).unwrap_or(0) as u32;
    let language = Language::from_file_path(&file_path).unwrap_or(Language::Python);
    let parent_class = if label == NodeLabel::Method { qn.parent() } else { None };
    Some(DefinitionRecord { qn, label, language, file_path, start_line, end_line, parent_class })
}

fn run_pass2_stage(
    aggregated: &PassOneResult,
    registry: &DefinitionRegistry,
    modules: &HashSet<String>,
    contexts: &[FileContext],
    report: &mut RunReport,
) -> GraphBatch {
    let module_language: HashMap<&str, Language> = contexts.iter().map(|c| (c.module_qn.as_str(), c.language)).collect();

    let mut imports_by_language: HashMap<Language, Vec<UnresolvedImport>> = HashMap::new();
    for import in &aggregated.imports {
        let language = module_language.get(import.module_qn.as_str()).copied().unwrap_or(Language::Python);
        imports_by_language.entry(language).or_default().push(import.clone());
    }

    let ctx = ResolutionContext { registry, modules };
    let mut batch = GraphBatch::default();
    for (language, imports) in &imports_by_language {
        batch.merge(resolve_imports(imports, &ctx, *language, report));
    }

    batch.merge(resolve_calls(&aggregated.calls, registry, report));

    let (inheritance_batch, inheritance_edges) = resolve_inheritance(&aggregated.bases, registry, report);
    batch.merge(inheritance_batch);
    batch.merge(resolve_overrides(&aggregated.methods, &inheritance_edges));

    let import_edges: Vec<(QualifiedName, QualifiedName)> = batch
        .relationships
        .iter()
        .filter(|r| r.edge_type == "IMPORTS")
        .map(|r| (QualifiedName::from_raw(r.source_qn.clone()), QualifiedName::from_raw(r.target_qn.clone())))
        .collect();
    batch.merge(detect_cycles(&import_edges));
    batch.merge(detect_cycles(&inheritance_edges));

    batch
}

fn run_analyzer_stage(
    config: &PipelineConfig,
    project: &str,
    files: &[CandidateFile],
    contexts: &[FileContext],
    registry: &DefinitionRegistry,
    resolved_calls: &[RelationshipRecord],
    report: &mut RunReport,
) -> GraphBatch {
    let mut batch = GraphBatch::default();

    // #include closure source lookup for the kernel analyzer's transitive
    // macro expansion: every C/C++ file's text and module QN, keyed by its
    // relative path so `#include "foo.h"` can be matched against whichever
    // discovered file it names.
    let c_family_sources: HashMap<String, (String, QualifiedName)> = contexts
        .iter()
        .filter(|c| matches!(c.language, Language::C | Language::Cpp))
        .map(|c| (c.candidate.relative_path.clone(), (c.source.clone(), c.module_qn.clone())))
        .collect();

    for context in contexts {
        if matches!(context.language, Language::C | Language::Cpp) {
            batch.merge(analyze_pointers(&context.source, &context.candidate.relative_path, &context.module_qn, registry));
        }
        if kernel::applies_to(context.language) {
            let included_macros: HashMap<String, MacroEntry> =
                kernel::macro_closure_for(&context.candidate.relative_path, &c_family_sources, config.macro_expand_transitive);
            batch.merge(analyze_kernel(
                &context.source,
                &context.candidate.relative_path,
                &context.module_qn,
                registry,
                config.macro_expand_transitive,
                &included_macros,
            ));
        }
        if !config.skip_tests {
            batch.merge(detect_tests(
                &context.source,
                &context.candidate.relative_path,
                &context.module_qn,
                context.language,
                registry,
                resolved_calls,
            ));
        }
    }

    for file in files.iter().filter(|f| f.special_tag == Some("gherkin")) {
        match std::fs::read_to_string(&file.absolute_path) {
            Ok(source) => match parse_feature_file(&source, &file.relative_path, project, registry) {
                Ok(feature_batch) => batch.merge(feature_batch),
                Err(_) => report.record_error(ErrorKind::Analyzer),
            },
            Err(_) => report.record_error(ErrorKind::Discovery),
        }
    }

    for file in files {
        let Some(format) = config_format_for(file) else { continue };
        let Ok(source) = std::fs::read_to_string(&file.absolute_path) else {
            report.record_error(ErrorKind::Discovery);
            continue;
        };
        let file_qn = QualifiedName::from_raw(format!("{project}.{}", file.relative_path));
        batch.merge(analyze_config(&source, format, &file_qn));
    }

    // VCS history is best-effort: a repository with no `.git` directory
    // (a plain source tree, or a test fixture) just yields no history,
    // not a pipeline error.
    if let Ok(commits) = walk_history(&config.repo_path, config.max_commits) {
        let (vcs_batch, stats) = build_vcs_batch(project, &commits);
        batch.merge(vcs_batch);
        for (path, stats) in stats {
            let qn = module_qn(project, &path);
            let mut node = NodeRecord::new(NodeLabel::Module, &qn).with_property("commit_count", stats.commit_count as i64);
            if let Some(last_modified) = stats.last_modified {
                node = node.with_property("last_modified", last_modified.to_rfc3339());
            }
            if let Some(author) = stats.primary_author {
                node = node.with_property("primary_author", author);
            }
            batch.nodes.push(node);
        }
    }

    batch
}

fn config_format_for(file: &CandidateFile) -> Option<ConfigFormat> {
    let basename = file.relative_path.rsplit('/').next().unwrap_or(&file.relative_path);
    let ext = basename.rsplit_once('.').map(|(_, ext)| ext);
    ext.and_then(ConfigFormat::from_extension).or_else(|| file.special_tag.and_then(ConfigFormat::from_special_tag))
}

#[cfg(test)]
mod tests {
    use super::*;
    use codegraph_model::NodeLabel;

    #[test]
    fn definition_record_skips_containment_labels() {
        let qn = QualifiedName::from_raw("proj.a");
        let node = NodeRecord::new(NodeLabel::Module, &qn);
        assert!(definition_record_from_node(&node).is_none());
    }

    #[test]
    fn definition_record_marks_method_parent_class() {
        let qn = QualifiedName::from_raw("proj.a.C.m");
        let node = NodeRecord::new(NodeLabel::Method, &qn)
            .with_property("file_path", "a.py")
            .with_property("start_line", 1i64)
            .with_property("end_line", 2i64);
        let record = definition_record_from_node(&node).unwrap();
        assert_eq!(record.parent_class.unwrap().as_str(), "proj.a.C");
    }

    #[test]
    fn config_format_prefers_extension_over_special_tag() {
        let file = CandidateFile {
            absolute_path: "settings.toml".into(),
            relative_path: "settings.toml".to_string(),
            language: None,
            special_tag: None,
        };
        assert_eq!(config_format_for(&file), Some(ConfigFormat::Toml));
    }

    #[test]
    fn config_format_falls_back_to_special_tag() {
        let file = CandidateFile {
            absolute_path: "Kconfig".into(),
            relative_path: "Kconfig".to_string(),
            language: None,
            special_tag: Some("kconfig"),
        };
        assert_eq!(config_format_for(&file), Some(ConfigFormat::Kconfig));
    }
}
