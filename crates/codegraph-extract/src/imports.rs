//! Per-language import-statement parsing (spec §4.5): turns the raw text
//! `codegraph-extract::pass1` captured into a list of dotted candidate
//! targets Pass-2 can look up in the Module table or Definition Registry.
//!
//! Grounded in the same "don't trust grammar-specific query syntax, match
//! the surface text" style as `codegraph_parse::kinds`: rather than reading
//! import grammars field-by-field (which vary a great deal between
//! tree-sitter grammars), each language gets one or two regexes over the
//! statement's own text.

use codegraph_model::Language;
use once_cell::sync::Lazy;
use regex::Regex;

/// One name pulled out of an import statement: the dotted path Pass-2 tries
/// to resolve, and the leaf name for `from X import Y` / `use a::{b, c}`
/// style statements where `Y`/`c` may itself be the real target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportTarget {
    pub dotted_path: String,
}

static PY_IMPORT: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*import\s+(.+)$").unwrap());
static PY_FROM_IMPORT: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*from\s+([.\w]+)\s+import\s+(.+)$").unwrap());
static JS_IMPORT: Lazy<Regex> = Lazy::new(|| Regex::new(r#"['"]([^'"]+)['"]"#).unwrap());
static RUST_USE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*(?:pub\s+)?use\s+(.+?);?\s*$").unwrap());
static GO_IMPORT: Lazy<Regex> = Lazy::new(|| Regex::new(r#"['"]([^'"]+)['"]"#).unwrap());
static JAVA_IMPORT: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*import\s+(?:static\s+)?([\w.]+?)(?:\.\*)?;?\s*$").unwrap());
static C_INCLUDE: Lazy<Regex> = Lazy::new(|| Regex::new(r#"^\s*#\s*include\s*[<"]([^>"]+)[>"]"#).unwrap());

/// Parse one raw import/use/include statement into zero or more candidate
/// dotted paths.
pub fn candidate_targets(language: Language, raw_text: &str) -> Vec<ImportTarget> {
    match language {
        Language::Python => python_targets(raw_text),
        Language::JavaScript | Language::TypeScript => js_targets(raw_text),
        Language::Rust => rust_targets(raw_text),
        Language::Go => go_targets(raw_text),
        Language::Java | Language::Scala => java_targets(raw_text),
        Language::Cpp | Language::C => c_targets(raw_text),
    }
}

fn python_targets(raw: &str) -> Vec<ImportTarget> {
    if let Some(caps) = PY_FROM_IMPORT.captures(raw) {
        let base = caps[1].trim_start_matches('.').to_string();
        return caps[2]
            .split(',')
            .map(|part| part.split(" as ").next().unwrap_or(part).trim())
            .filter(|n| !n.is_empty())
            .map(|name| ImportTarget {
                dotted_path: if base.is_empty() { name.to_string() } else { format!("{base}.{name}") },
            })
            .collect();
    }
    if let Some(caps) = PY_IMPORT.captures(raw) {
        return caps[1]
            .split(',')
            .map(|part| part.split(" as ").next().unwrap_or(part).trim())
            .filter(|n| !n.is_empty())
            .map(|name| ImportTarget { dotted_path: name.to_string() })
            .collect();
    }
    Vec::new()
}

fn js_targets(raw: &str) -> Vec<ImportTarget> {
    JS_IMPORT
        .captures(raw)
        .map(|caps| {
            let path = caps[1].trim_start_matches("./").trim_start_matches("../");
            let dotted = path.trim_end_matches(".js").trim_end_matches(".ts").replace('/', ".");
            vec![ImportTarget { dotted_path: dotted }]
        })
        .unwrap_or_default()
}

fn rust_targets(raw: &str) -> Vec<ImportTarget> {
    let Some(caps) = RUST_USE.captures(raw) else {
        return Vec::new();
    };
    let body = caps[1].replace(' ', "");
    match body.rsplit_once("::{") {
        Some((prefix, rest)) => {
            let leaves = rest.trim_end_matches('}');
            leaves
                .split(',')
                .map(|leaf| leaf.split("as").next().unwrap_or(leaf))
                .filter(|l| !l.is_empty() && *l != "self")
                .map(|leaf| ImportTarget {
                    dotted_path: format!("{}.{leaf}", prefix.replace("::", ".")),
                })
                .collect()
        }
        None => vec![ImportTarget {
            dotted_path: body.split("as").next().unwrap_or(&body).replace("::", "."),
        }],
    }
}

fn go_targets(raw: &str) -> Vec<ImportTarget> {
    GO_IMPORT
        .captures(raw)
        .map(|caps| vec![ImportTarget { dotted_path: caps[1].replace('/', ".") }])
        .unwrap_or_default()
}

fn java_targets(raw: &str) -> Vec<ImportTarget> {
    JAVA_IMPORT
        .captures(raw)
        .map(|caps| vec![ImportTarget { dotted_path: caps[1].to_string() }])
        .unwrap_or_default()
}

fn c_targets(raw: &str) -> Vec<ImportTarget> {
    C_INCLUDE
        .captures(raw)
        .map(|caps| {
            let stem = caps[1].rsplit_once('.').map(|(s, _)| s).unwrap_or(&caps[1]);
            vec![ImportTarget { dotted_path: stem.replace('/', ".") }]
        })
        .unwrap_or_default()
}
