//! Containment forest construction (spec §3 I2, §4.1, §4.8 write-order step
//! 2/3): Project → Package/Folder → File/Module, built once from the full
//! sorted file list rather than per-file, since a folder's Package-vs-Folder
//! classification depends on every file discovered beneath it.

use std::collections::BTreeMap;

use codegraph_discovery::CandidateFile;
use codegraph_model::{EdgeType, GraphBatch, NodeLabel, NodeRecord, QualifiedName, RelationshipRecord};

#[derive(Default)]
struct FolderInfo {
    /// `true` once any file beneath this folder belongs to a
    /// package-capable language (spec §4.2 `has_packages`).
    is_package: bool,
}

/// Build the Project/Package/Folder/File/Module containment skeleton for
/// every discovered file. Does not emit Class/Function/etc. — those are
/// Pass-1's job, using the Module QNs this function establishes.
pub fn build_containment(project: &str, files: &[CandidateFile]) -> GraphBatch {
    let mut batch = GraphBatch::default();
    let project_qn = QualifiedName::root(project);
    batch.nodes.push(NodeRecord::new(NodeLabel::Project, &project_qn).with_property("name", project));

    let mut folders: BTreeMap<String, FolderInfo> = BTreeMap::new();
    for file in files {
        let segments = folder_segments(&file.relative_path);
        let mut path_acc = String::new();
        for segment in &segments {
            if !path_acc.is_empty() {
                path_acc.push('/');
            }
            path_acc.push_str(segment);
            let entry = folders.entry(path_acc.clone()).or_default();
            if file.language.map(|l| l.has_oop_inheritance()).unwrap_or(false) {
                entry.is_package = true;
            }
        }
    }

    // Emit folder/package nodes in lexicographic (= parent-before-child)
    // order and wire each to its direct parent or the Project root.
    for (path, info) in &folders {
        let qn = dotted_qn(project, path);
        let label = if info.is_package { NodeLabel::Package } else { NodeLabel::Folder };
        let name = path.rsplit('/').next().unwrap_or(path);
        batch.nodes.push(NodeRecord::new(label, &qn).with_property("name", name).with_property("path", path.as_str()));

        let parent_qn = match path.rsplit_once('/') {
            Some((parent_path, _)) => dotted_qn(project, parent_path),
            None => project_qn.clone(),
        };
        let edge_type = if info.is_package {
            EdgeType::ContainsPackage
        } else {
            EdgeType::ContainsFolder
        };
        batch
            .relationships
            .push(RelationshipRecord::new(edge_type, &parent_qn, &qn));
    }

    for file in files {
        let segments = folder_segments(&file.relative_path);
        let parent_qn = match segments.last() {
            Some(_) => dotted_qn(project, &segments.join("/")),
            None => project_qn.clone(),
        };

        let file_qn = QualifiedName::from_raw(format!("{project}.{}", file.relative_path));
        let basename = file.relative_path.rsplit('/').next().unwrap_or(&file.relative_path);
        let mut file_node = NodeRecord::new(NodeLabel::File, &file_qn)
            .with_property("name", basename)
            .with_property("path", file.relative_path.as_str());
        if let Some(language) = file.language {
            file_node = file_node.with_property("language", language.name());
        }
        batch.nodes.push(file_node);
        batch
            .relationships
            .push(RelationshipRecord::new(EdgeType::ContainsFile, &parent_qn, &file_qn));

        if let Some(language) = file.language {
            let module_qn = module_qn(project, &file.relative_path);
            let byte_size = file.absolute_path.metadata().map(|m| m.len()).unwrap_or(0);
            let module_node = NodeRecord::new(NodeLabel::Module, &module_qn)
                .with_property("name", strip_extension(basename))
                .with_property("path", file.relative_path.as_str())
                .with_property("language", language.name())
                .with_property("byte_size", byte_size as i64);
            batch.nodes.push(module_node);
            batch
                .relationships
                .push(RelationshipRecord::new(EdgeType::ContainsModule, &parent_qn, &module_qn));
        }
    }

    batch
}

/// The folder segments a relative path lives under, excluding the basename.
fn folder_segments(relative_path: &str) -> Vec<String> {
    let mut parts: Vec<&str> = relative_path.split('/').collect();
    parts.pop();
    parts.into_iter().map(str::to_string).collect()
}

fn dotted_qn(project: &str, slash_path: &str) -> QualifiedName {
    QualifiedName::from_raw(format!("{project}.{}", slash_path.replace('/', ".")))
}

fn strip_extension(basename: &str) -> &str {
    basename.rsplit_once('.').map(|(n, _)| n).unwrap_or(basename)
}

/// The Module QN for a source file: project-rooted dotted path with the
/// extension stripped (spec §4.4).
pub fn module_qn(project: &str, relative_path: &str) -> QualifiedName {
    let without_ext = relative_path
        .rsplit_once('.')
        .map(|(stem, _)| stem)
        .unwrap_or(relative_path);
    dotted_qn(project, without_ext)
}

#[cfg(test)]
mod tests {
    use super::*;
    use codegraph_model::Language;
    use std::path::PathBuf;

    fn file(rel: &str, language: Option<Language>) -> CandidateFile {
        CandidateFile {
            absolute_path: PathBuf::from(rel),
            relative_path: rel.to_string(),
            language,
            special_tag: None,
        }
    }

    #[test]
    fn python_package_yields_package_node_not_folder() {
        let files = vec![
            file("pkg/__init__.py", Some(Language::Python)),
            file("pkg/a.py", Some(Language::Python)),
        ];
        let batch = build_containment("proj", &files);
        let pkg_node = batch
            .nodes
            .iter()
            .find(|n| n.qualified_name == "proj.pkg")
            .unwrap();
        assert_eq!(pkg_node.label(), "Package");
    }

    #[test]
    fn c_files_yield_folder_not_package() {
        let files = vec![file("src/m.c", Some(Language::C))];
        let batch = build_containment("proj", &files);
        let folder_node = batch
            .nodes
            .iter()
            .find(|n| n.qualified_name == "proj.src")
            .unwrap();
        assert_eq!(folder_node.label(), "Folder");
    }

    #[test]
    fn module_qn_strips_extension_and_dots_path() {
        assert_eq!(module_qn("proj", "pkg/a.py").as_str(), "proj.pkg.a");
    }

    #[test]
    fn every_file_gets_a_file_node_and_contains_file_edge() {
        let files = vec![file("README.md", None)];
        let batch = build_containment("proj", &files);
        assert!(batch.nodes.iter().any(|n| n.label() == "File"));
        assert!(batch
            .relationships
            .iter()
            .any(|r| r.edge_type == "CONTAINS_FILE" && r.target_qn == "proj.README.md"));
    }
}
