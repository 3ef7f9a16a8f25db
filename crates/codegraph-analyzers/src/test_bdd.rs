//! Test/BDD Analyzer (spec §4.7): framework-marker-based test detection
//! over the Definition Registry's Function/Method records, plus Gherkin
//! `.feature` parsing with step-definition linking.

use std::collections::HashSet;

use codegraph_extract::DefinitionRegistry;
use codegraph_model::{CodegraphError, EdgeType, ErrorKind, GraphBatch, Language, NodeLabel, NodeRecord, QualifiedName, RelationshipRecord, Result, StepKeyword};
use once_cell::sync::Lazy;
use regex::Regex;

static ASSERTION_CALL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(assert\w*|expect|ok!|unwrap_err|assert_eq!|assert_ne!|self\.assert\w*)\s*\(").unwrap()
});

/// `true` when `short_name` looks like a test entry point in `language`'s
/// dominant framework convention (pytest, Go `testing`, JUnit-by-name,
/// Rust `#[test]`-annotated naming, JS `it`/`test` blocks are handled
/// separately via call-site detection since they aren't named functions).
fn looks_like_test_name(language: Language, short_name: &str) -> bool {
    match language {
        Language::Python => short_name.starts_with("test_") || short_name == "test",
        Language::Go => short_name.starts_with("Test"),
        Language::Java | Language::Scala => short_name.starts_with("test") || short_name.ends_with("Test"),
        Language::Rust => short_name.starts_with("test_") || short_name.contains("_test"),
        Language::C | Language::Cpp => short_name.starts_with("test_") || short_name.starts_with("Test"),
        Language::JavaScript | Language::TypeScript => false,
    }
}

/// Emit a TestSuite (one per module containing at least one test), a
/// TestCase per recognized test function, Assertion nodes for assertion
/// calls inside its span, and a TESTS edge to every in-project
/// function/method Pass-2 resolved a call to from inside the test's body
/// (`resolved_calls`, the Pass-2 CALLS batch) — not a naming guess, so a
/// test exercising several helpers gets an edge to each of them.
pub fn detect_tests(
    source: &str,
    file_path: &str,
    module_qn: &QualifiedName,
    language: Language,
    registry: &DefinitionRegistry,
    resolved_calls: &[RelationshipRecord],
) -> GraphBatch {
    let mut batch = GraphBatch::default();
    let lines: Vec<&str> = source.lines().collect();
    let mut suite_emitted = false;

    let candidates: Vec<_> = registry
        .iter()
        .filter(|r| r.file_path == file_path)
        .filter(|r| matches!(r.label, NodeLabel::Function | NodeLabel::Method))
        .filter(|r| looks_like_test_name(language, r.qn.short_name()))
        .collect();

    if candidates.is_empty() {
        return batch;
    }

    let suite_qn = QualifiedName::from_raw(format!("{}.__suite__", module_qn.as_str()));

    for record in candidates {
        if !suite_emitted {
            batch
                .nodes
                .push(NodeRecord::new(NodeLabel::TestSuite, &suite_qn).with_property("name", format!("{} tests", module_qn.short_name())));
            suite_emitted = true;
        }

        batch.nodes.push(
            NodeRecord::new(NodeLabel::TestCase, &record.qn)
                .with_property("name", record.qn.short_name())
                .with_property("file_path", file_path),
        );
        batch.relationships.push(RelationshipRecord::new(EdgeType::InSuite, &record.qn, &suite_qn));

        let start = record.start_line.saturating_sub(1) as usize;
        let end = (record.end_line as usize).min(lines.len());
        for (offset, line) in lines[start..end].iter().enumerate() {
            if ASSERTION_CALL.is_match(line) {
                let assertion_qn = QualifiedName::from_raw(format!("{}.assertion.{}", record.qn.as_str(), start + offset + 1));
                batch.nodes.push(
                    NodeRecord::new(NodeLabel::Assertion, &assertion_qn)
                        .with_property("line", (start + offset + 1) as i64),
                );
                batch.relationships.push(RelationshipRecord::new(EdgeType::Asserts, &record.qn, &assertion_qn));
            }
        }

        let mut seen_targets: HashSet<&str> = HashSet::new();
        for call in resolved_calls.iter().filter(|r| r.edge_type == "CALLS" && r.source_qn == record.qn.as_str()) {
            if seen_targets.insert(call.target_qn.as_str()) {
                batch.relationships.push(RelationshipRecord::new(
                    EdgeType::Tests,
                    &record.qn,
                    &QualifiedName::from_raw(call.target_qn.clone()),
                ));
            }
        }
    }

    batch
}

/// Parse one `.feature` file into BDDFeature/BDDScenario/BDDStep nodes and
/// link each step to the best-matching step-definition function in
/// `registry`, normalizing step text to match a snake_case function name.
pub fn parse_feature_file(source: &str, relative_path: &str, project: &str, registry: &DefinitionRegistry) -> Result<GraphBatch> {
    let feature = gherkin::Feature::parse(source, gherkin::GherkinEnv::default()).map_err(|err| {
        CodegraphError::new(ErrorKind::Analyzer, format!("gherkin parse error: {err}")).with_file(relative_path.to_string())
    })?;

    let mut batch = GraphBatch::default();
    let feature_qn = QualifiedName::from_raw(format!("{project}.{relative_path}"));
    batch.nodes.push(
        NodeRecord::new(NodeLabel::BDDFeature, &feature_qn)
            .with_property("name", feature.name.as_str())
            .with_property("file_path", relative_path),
    );

    for (scenario_idx, scenario) in feature.scenarios.iter().enumerate() {
        let scenario_qn = feature_qn.child(&format!("scenario_{scenario_idx}"));
        batch
            .nodes
            .push(NodeRecord::new(NodeLabel::BDDScenario, &scenario_qn).with_property("name", scenario.name.as_str()));
        batch
            .relationships
            .push(RelationshipRecord::new(EdgeType::InFeature, &scenario_qn, &feature_qn));

        for (step_idx, step) in scenario.steps.iter().enumerate() {
            let step_qn = scenario_qn.child(&format!("step_{step_idx}"));
            let keyword = step_keyword(&step.ty);
            batch.nodes.push(
                NodeRecord::new(NodeLabel::BDDStep, &step_qn)
                    .with_property("text", step.value.as_str())
                    .with_property("keyword", keyword.as_str()),
            );
            batch
                .relationships
                .push(RelationshipRecord::new(EdgeType::InScenario, &step_qn, &scenario_qn));

            if let Some(def) = find_step_definition(&step.value, registry) {
                batch
                    .relationships
                    .push(RelationshipRecord::new(EdgeType::ImplementsStep, &step_qn, &def.qn));
                batch.relationships.push(RelationshipRecord::new(keyword.links_to_edge(), &step_qn, &def.qn));
            }
        }
    }

    Ok(batch)
}

fn step_keyword(ty: &gherkin::StepType) -> StepKeyword {
    match ty {
        gherkin::StepType::Given => StepKeyword::Given,
        gherkin::StepType::When => StepKeyword::When,
        gherkin::StepType::Then => StepKeyword::Then,
    }
}

/// Normalize step text (`the user logs in`) to a snake_case candidate
/// (`the_user_logs_in`) and look for a same-named function.
fn find_step_definition<'a>(step_text: &str, registry: &'a DefinitionRegistry) -> Option<&'a codegraph_extract::DefinitionRecord> {
    let normalized: String = step_text
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '_' })
        .collect::<String>()
        .split('_')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("_");
    let mut seen: HashSet<&str> = HashSet::new();
    registry
        .candidates_by_short_name(&normalized)
        .into_iter()
        .find(|record| seen.insert(record.qn.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn def(qn: &str, start: u32, end: u32, label: NodeLabel) -> codegraph_extract::DefinitionRecord {
        codegraph_extract::DefinitionRecord {
            qn: QualifiedName::from_raw(qn),
            label,
            language: Language::Python,
            file_path: "test_a.py".to_string(),
            start_line: start,
            end_line: end,
            parent_class: None,
        }
    }

    #[test]
    fn pytest_style_function_becomes_test_case() {
        let mut registry = DefinitionRegistry::new();
        registry.insert(def("proj.test_a.test_add", 1, 3, NodeLabel::Function));
        let source = "def test_add():\n    assert add(1, 2) == 3\n";
        let module_qn = QualifiedName::from_raw("proj.test_a");
        let batch = detect_tests(source, "test_a.py", &module_qn, Language::Python, &registry, &[]);
        assert!(batch.nodes.iter().any(|n| n.label() == "TestCase"));
        assert!(batch.nodes.iter().any(|n| n.label() == "Assertion"));
    }

    #[test]
    fn tests_edge_links_to_every_resolved_callee() {
        let mut registry = DefinitionRegistry::new();
        registry.insert(def("proj.a.add", 1, 1, NodeLabel::Function));
        registry.insert(def("proj.a.log", 1, 1, NodeLabel::Function));
        registry.insert(def("proj.test_a.test_add", 1, 3, NodeLabel::Function));
        let source = "def test_add():\n    assert add(1, 2) == 3\n";
        let module_qn = QualifiedName::from_raw("proj.test_a");
        let resolved_calls = vec![
            RelationshipRecord::new(EdgeType::Calls, &QualifiedName::from_raw("proj.test_a.test_add"), &QualifiedName::from_raw("proj.a.add")),
            RelationshipRecord::new(EdgeType::Calls, &QualifiedName::from_raw("proj.test_a.test_add"), &QualifiedName::from_raw("proj.a.log")),
        ];
        let batch = detect_tests(source, "test_a.py", &module_qn, Language::Python, &registry, &resolved_calls);
        assert!(batch.relationships.iter().any(|r| r.edge_type == "TESTS" && r.target_qn == "proj.a.add"));
        assert!(batch.relationships.iter().any(|r| r.edge_type == "TESTS" && r.target_qn == "proj.a.log"));
        assert_eq!(batch.relationships.iter().filter(|r| r.edge_type == "TESTS").count(), 2);
    }

    #[test]
    fn test_with_no_resolved_calls_gets_no_tests_edge() {
        let mut registry = DefinitionRegistry::new();
        registry.insert(def("proj.test_a.test_add", 1, 3, NodeLabel::Function));
        let source = "def test_add():\n    assert add(1, 2) == 3\n";
        let module_qn = QualifiedName::from_raw("proj.test_a");
        let batch = detect_tests(source, "test_a.py", &module_qn, Language::Python, &registry, &[]);
        assert!(!batch.relationships.iter().any(|r| r.edge_type == "TESTS"));
    }

    #[test]
    fn non_test_function_yields_empty_batch() {
        let mut registry = DefinitionRegistry::new();
        registry.insert(def("proj.a.helper", 1, 1, NodeLabel::Function));
        let batch = detect_tests("def helper(): pass", "a.py", &QualifiedName::from_raw("proj.a"), Language::Python, &registry, &[]);
        assert!(batch.is_empty());
    }

    #[test]
    fn feature_file_parses_into_feature_scenario_step_nodes() {
        let registry = DefinitionRegistry::new();
        let source = "Feature: Login\n  Scenario: Valid login\n    Given the user is on the login page\n    When they submit valid credentials\n    Then they see the dashboard\n";
        let batch = parse_feature_file(source, "features/login.feature", "proj", &registry).unwrap();
        assert!(batch.nodes.iter().any(|n| n.label() == "BDDFeature"));
        assert!(batch.nodes.iter().any(|n| n.label() == "BDDScenario"));
        assert_eq!(batch.nodes.iter().filter(|n| n.label() == "BDDStep").count(), 3);
    }
}
