//! VCS Analyzer (spec §4.7a): walks first-parent git history with the same
//! "shell out to the `git` CLI" approach as the teacher's
//! `features::git_history::infrastructure::GitExecutor`, rather than
//! adding a libgit2 binding the pack never reaches for. Emits
//! Commit/Contributor nodes and AUTHORED/MODIFIED_IN edges, and computes
//! per-module git stats the caller merges into the Module nodes
//! `containment::build_containment` already created.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::Command;

use chrono::{DateTime, TimeZone, Utc};
use codegraph_model::{CodegraphError, EdgeType, ErrorKind, GraphBatch, NodeLabel, NodeRecord, QualifiedName, RelationshipRecord, Result};

const FIELD_SEP: char = '\u{1f}';
const RECORD_SEP: char = '\u{1e}';

pub struct GitExecutor {
    repo_root: PathBuf,
}

impl GitExecutor {
    pub fn new(repo_root: impl AsRef<Path>) -> Result<Self> {
        let repo_root = repo_root.as_ref().to_path_buf();
        if !repo_root.join(".git").exists() {
            return Err(CodegraphError::new(ErrorKind::Discovery, "not a git repository").with_file(repo_root.display().to_string()));
        }
        Ok(Self { repo_root })
    }

    fn run(&self, args: &[&str]) -> Result<String> {
        let output = Command::new("git")
            .args(args)
            .current_dir(&self.repo_root)
            .output()
            .map_err(|err| CodegraphError::new(ErrorKind::Discovery, format!("failed to spawn git: {err}")))?;
        if !output.status.success() {
            return Err(CodegraphError::new(
                ErrorKind::Discovery,
                format!("git command failed: {}", String::from_utf8_lossy(&output.stderr)),
            ));
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[derive(Debug, Clone)]
pub struct CommitInfo {
    pub hash: String,
    pub author_name: String,
    pub author_email: String,
    pub authored_at: DateTime<Utc>,
    pub summary: String,
    pub changed_paths: Vec<String>,
}

/// `git log -n<count>` argument for `max_commits`. The caller's configured
/// value is always honored as-is (floored at 1) — `DEFAULT_MAX_COMMITS` in
/// `codegraph-orchestrator`'s config layer is where a default kicks in when
/// the user never set one; this function must not clamp an explicit value
/// back down to it.
fn max_count_arg(max_commits: usize) -> String {
    format!("-n{}", max_commits.max(1))
}

/// Walk up to `max_commits` first-parent commits, newest first.
pub fn walk_history(repo_root: &Path, max_commits: usize) -> Result<Vec<CommitInfo>> {
    let executor = GitExecutor::new(repo_root)?;
    let format = format!("--pretty=format:%H{FIELD_SEP}%an{FIELD_SEP}%ae{FIELD_SEP}%at{FIELD_SEP}%s{RECORD_SEP}");
    let max_count = max_count_arg(max_commits);
    let output = executor.run(&["log", "--first-parent", &max_count, &format, "--name-only"])?;

    let mut commits = Vec::new();
    for record in output.split(RECORD_SEP) {
        let record = record.trim_start_matches('\n');
        if record.trim().is_empty() {
            continue;
        }
        let mut lines = record.splitn(2, '\n');
        let header = lines.next().unwrap_or_default();
        let fields: Vec<&str> = header.split(FIELD_SEP).collect();
        if fields.len() < 5 {
            continue;
        }
        let timestamp: i64 = fields[3].parse().unwrap_or(0);
        let changed_paths = lines
            .next()
            .unwrap_or_default()
            .lines()
            .map(|l| l.trim().to_string())
            .filter(|l| !l.is_empty())
            .collect();
        commits.push(CommitInfo {
            hash: fields[0].to_string(),
            author_name: fields[1].to_string(),
            author_email: fields[2].to_string(),
            authored_at: Utc.timestamp_opt(timestamp, 0).single().unwrap_or_else(Utc::now),
            summary: fields[4].to_string(),
            changed_paths,
        });
    }
    Ok(commits)
}

/// Per-module stats derived from history, merged into the Module node a
/// separate `build_containment` call already emitted for the same file.
#[derive(Debug, Clone, Default)]
pub struct ModuleGitStats {
    pub last_modified: Option<DateTime<Utc>>,
    pub commit_count: u32,
    pub primary_author: Option<String>,
}

/// Build Commit/Contributor nodes, AUTHORED/MODIFIED_IN edges, and
/// per-relative-path git stats keyed by the same relative path Discovery
/// produces (so the caller can look up the matching Module QN).
pub fn build_vcs_batch(project: &str, commits: &[CommitInfo]) -> (GraphBatch, HashMap<String, ModuleGitStats>) {
    let mut batch = GraphBatch::default();
    let mut seen_contributors: HashMap<&str, QualifiedName> = HashMap::new();
    let mut author_counts: HashMap<String, HashMap<String, u32>> = HashMap::new();
    let mut stats: HashMap<String, ModuleGitStats> = HashMap::new();

    for commit in commits {
        let commit_qn = QualifiedName::from_raw(format!("{project}.commit.{}", commit.hash));
        batch.nodes.push(
            NodeRecord::new(NodeLabel::Commit, &commit_qn)
                .with_property("hash", commit.hash.as_str())
                .with_property("summary", commit.summary.as_str())
                .with_property("authored_at", commit.authored_at.to_rfc3339()),
        );

        let contributor_qn = seen_contributors.entry(commit.author_email.as_str()).or_insert_with(|| {
            let qn = QualifiedName::from_raw(format!("{project}.contributor.{}", commit.author_email));
            batch.nodes.push(
                NodeRecord::new(NodeLabel::Contributor, &qn)
                    .with_property("name", commit.author_name.as_str())
                    .with_property("email", commit.author_email.as_str()),
            );
            qn
        });
        batch.relationships.push(RelationshipRecord::new(EdgeType::Authored, contributor_qn, &commit_qn));

        for path in &commit.changed_paths {
            let file_qn = QualifiedName::from_raw(format!("{project}.{path}"));
            batch
                .relationships
                .push(RelationshipRecord::new(EdgeType::ModifiedIn, &file_qn, &commit_qn));

            let entry = stats.entry(path.clone()).or_default();
            entry.commit_count += 1;
            if entry.last_modified.is_none() {
                entry.last_modified = Some(commit.authored_at);
            }
            *author_counts.entry(path.clone()).or_default().entry(commit.author_name.clone()).or_insert(0) += 1;
        }
    }

    for (path, counts) in author_counts {
        if let Some(entry) = stats.get_mut(&path) {
            entry.primary_author = counts.into_iter().max_by_key(|(_, count)| *count).map(|(name, _)| name);
        }
    }

    (batch, stats)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn max_count_arg_honors_values_above_the_old_hardcoded_cap() {
        assert_eq!(max_count_arg(5000), "-n5000");
    }

    #[test]
    fn max_count_arg_floors_zero_to_one() {
        assert_eq!(max_count_arg(0), "-n1");
    }

    #[test]
    fn rejects_non_git_directory() {
        let dir = tempfile::TempDir::new().unwrap();
        assert!(GitExecutor::new(dir.path()).is_err());
    }

    #[test]
    fn build_vcs_batch_counts_commits_per_path() {
        let commits = vec![
            CommitInfo {
                hash: "a1".to_string(),
                author_name: "Ada".to_string(),
                author_email: "ada@example.com".to_string(),
                authored_at: Utc.timestamp_opt(0, 0).single().unwrap(),
                summary: "init".to_string(),
                changed_paths: vec!["src/lib.rs".to_string()],
            },
            CommitInfo {
                hash: "a2".to_string(),
                author_name: "Ada".to_string(),
                author_email: "ada@example.com".to_string(),
                authored_at: Utc.timestamp_opt(10, 0).single().unwrap(),
                summary: "fix".to_string(),
                changed_paths: vec!["src/lib.rs".to_string()],
            },
        ];
        let (batch, stats) = build_vcs_batch("proj", &commits);
        assert_eq!(stats["src/lib.rs"].commit_count, 2);
        assert_eq!(stats["src/lib.rs"].primary_author.as_deref(), Some("Ada"));
        assert!(batch.nodes.iter().any(|n| n.label() == "Contributor"));
    }
}
