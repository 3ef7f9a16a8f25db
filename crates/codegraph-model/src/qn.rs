//! Qualified names (QN): the dotted, project-rooted identifiers used as the
//! MERGE key for every node (spec §3, GLOSSARY).

use std::fmt;

/// A dotted, project-rooted identifier. Two `QualifiedName`s with equal
/// string content identify the same node regardless of label (I1).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QualifiedName(String);

impl QualifiedName {
    pub fn root(project: impl Into<String>) -> Self {
        Self(project.into())
    }

    pub fn from_raw(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// `self.child("inner")` → `self.inner`, used for nested definitions
    /// (Pass-1 Definer, §4.4: "Nested functions are emitted with QN
    /// `Parent.inner`").
    pub fn child(&self, segment: &str) -> Self {
        Self(format!("{}.{}", self.0, segment))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    /// The last dotted segment, e.g. `proj.pkg.mod.Class.method` → `method`.
    pub fn short_name(&self) -> &str {
        self.0.rsplit('.').next().unwrap_or(&self.0)
    }

    /// Everything but the last segment, e.g. `proj.pkg.mod.Class.method` →
    /// `proj.pkg.mod.Class`. `None` for a bare root.
    pub fn parent(&self) -> Option<Self> {
        self.0.rsplit_once('.').map(|(p, _)| Self(p.to_string()))
    }

    /// Length of the common dotted-segment suffix shared with `other`, used
    /// by Pass-2's "prefer the definition with the longest matching QN
    /// suffix" tie-break (spec §4.5).
    pub fn common_suffix_len(&self, other: &QualifiedName) -> usize {
        let a: Vec<&str> = self.0.rsplit('.').collect();
        let b: Vec<&str> = other.0.rsplit('.').collect();
        a.iter().zip(b.iter()).take_while(|(x, y)| x == y).count()
    }
}

impl fmt::Display for QualifiedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for QualifiedName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for QualifiedName {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn child_appends_dotted_segment() {
        let root = QualifiedName::root("proj");
        let module = root.child("pkg").child("a");
        assert_eq!(module.as_str(), "proj.pkg.a");
    }

    #[test]
    fn short_name_and_parent() {
        let qn = QualifiedName::from_raw("proj.pkg.a.Outer.inner");
        assert_eq!(qn.short_name(), "inner");
        assert_eq!(qn.parent().unwrap().as_str(), "proj.pkg.a.Outer");
    }

    #[test]
    fn parent_of_root_is_none() {
        let qn = QualifiedName::root("proj");
        assert!(qn.parent().is_none());
    }

    #[test]
    fn common_suffix_prefers_longest_match() {
        let a = QualifiedName::from_raw("proj.pkg.util.helper");
        let b = QualifiedName::from_raw("other.pkg.util.helper");
        let c = QualifiedName::from_raw("other.helper");
        assert_eq!(a.common_suffix_len(&b), 3);
        assert_eq!(a.common_suffix_len(&c), 1);
    }
}
