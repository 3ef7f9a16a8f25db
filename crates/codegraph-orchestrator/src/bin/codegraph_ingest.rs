//! CLI entry point (spec §6): a thin `clap` front door over the three
//! library calls `codegraph_orchestrator` exposes. All actual pipeline
//! logic lives in `pipeline.rs`; this binary only parses arguments, builds
//! a `PipelineConfig`, and reports the outcome.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use codegraph_orchestrator::{ensure_indexes, export, ingest, PipelineConfig};

#[derive(Parser)]
#[command(name = "codegraph-ingest", about = "Ingest a repository into the code knowledge graph")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Walk a repository, extract its graph, and write it to the configured graph server.
    Ingest {
        repo_path: PathBuf,
        #[arg(long)]
        config: Option<PathBuf>,
        #[arg(long)]
        clean: bool,
        #[arg(long)]
        workers: Option<usize>,
        #[arg(long)]
        folder_filter: Option<String>,
        #[arg(long)]
        file_pattern: Option<String>,
        #[arg(long)]
        skip_tests: bool,
        #[arg(long)]
        output_json: Option<PathBuf>,
        #[arg(long, default_value = "localhost")]
        graph_host: String,
        #[arg(long, default_value_t = 7687)]
        graph_port: u16,
    },
    /// Dump the live graph for a project to a JSON file.
    Export {
        repo_path: PathBuf,
        output: PathBuf,
        #[arg(long, default_value = "localhost")]
        graph_host: String,
        #[arg(long, default_value_t = 7687)]
        graph_port: u16,
    },
    /// Create the graph's uniqueness constraints and property indexes.
    EnsureIndexes {
        #[arg(long, default_value = "localhost")]
        graph_host: String,
        #[arg(long, default_value_t = 7687)]
        graph_port: u16,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();
    match dispatch(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = %err, "codegraph-ingest failed");
            ExitCode::FAILURE
        }
    }
}

async fn dispatch(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Command::Ingest {
            repo_path,
            config,
            clean,
            workers,
            folder_filter,
            file_pattern,
            skip_tests,
            output_json,
            graph_host,
            graph_port,
        } => {
            let mut builder = PipelineConfig::builder();
            if let Some(path) = &config {
                builder = builder.with_toml_file(path)?;
            }
            builder = builder
                .with_env()
                .repo_path(repo_path)
                .clean(clean)
                .skip_tests(skip_tests)
                .graph_endpoint(graph_host, graph_port);
            if let Some(workers) = workers {
                builder = builder.workers(workers);
            }
            if let Some(filter) = folder_filter {
                builder = builder.folder_filter(filter);
            }
            if let Some(pattern) = file_pattern {
                builder = builder.file_pattern(pattern);
            }
            if let Some(path) = output_json {
                builder = builder.output_json(path);
            }
            let pipeline_config = builder.build()?;
            let report = ingest(&pipeline_config).await?;
            tracing::info!(
                files_discovered = report.files_discovered,
                files_parsed = report.files_parsed,
                nodes_written = report.nodes_written,
                relationships_written = report.relationships_written,
                clean = report.is_clean(),
                "ingest complete"
            );
            Ok(())
        }
        Command::Export { repo_path, output, graph_host, graph_port } => {
            let pipeline_config = PipelineConfig::builder().repo_path(repo_path).graph_endpoint(graph_host, graph_port).build()?;
            export(&pipeline_config, &output).await?;
            Ok(())
        }
        Command::EnsureIndexes { graph_host, graph_port } => {
            // ensure_indexes never reads the repo tree; "." is a harmless
            // placeholder to satisfy the builder's required repo_path.
            let pipeline_config = PipelineConfig::builder().repo_path(".").graph_endpoint(graph_host, graph_port).build()?;
            ensure_indexes(&pipeline_config).await?;
            Ok(())
        }
    }
}
