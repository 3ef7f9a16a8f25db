//! Node labels and relationship types (spec §3).

use std::fmt;

macro_rules! string_enum {
    ($name:ident { $($variant:ident => $str:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $str),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.as_str())
            }
        }
    };
}

string_enum!(NodeLabel {
    Project => "Project",
    Package => "Package",
    Folder => "Folder",
    File => "File",
    Module => "Module",
    Class => "Class",
    Struct => "Struct",
    Union => "Union",
    Enum => "Enum",
    Function => "Function",
    Method => "Method",
    Macro => "Macro",
    GlobalVariable => "GlobalVariable",
    Typedef => "Typedef",
    Pointer => "Pointer",
    FunctionPointer => "FunctionPointer",
    Syscall => "Syscall",
    KernelExport => "KernelExport",
    TestSuite => "TestSuite",
    TestCase => "TestCase",
    Assertion => "Assertion",
    BDDFeature => "BDDFeature",
    BDDScenario => "BDDScenario",
    BDDStep => "BDDStep",
    ExternalPackage => "ExternalPackage",
    Vulnerability => "Vulnerability",
    ConfigSetting => "ConfigSetting",
    Contributor => "Contributor",
    Commit => "Commit",
    LockVariable => "LockVariable",
});

string_enum!(EdgeType {
    ContainsPackage => "CONTAINS_PACKAGE",
    ContainsFolder => "CONTAINS_FOLDER",
    ContainsFile => "CONTAINS_FILE",
    ContainsModule => "CONTAINS_MODULE",
    Defines => "DEFINES",
    DefinesMethod => "DEFINES_METHOD",
    Imports => "IMPORTS",
    Exports => "EXPORTS",
    CircularDependency => "CIRCULAR_DEPENDENCY",
    Calls => "CALLS",
    InheritsFrom => "INHERITS_FROM",
    Implements => "IMPLEMENTS",
    Overrides => "OVERRIDES",
    PointsTo => "POINTS_TO",
    AssignsFp => "ASSIGNS_FP",
    InvokesFp => "INVOKES_FP",
    Locks => "LOCKS",
    Unlocks => "UNLOCKS",
    ExpandsTo => "EXPANDS_TO",
    Tests => "TESTS",
    Asserts => "ASSERTS",
    InSuite => "IN_SUITE",
    InTest => "IN_TEST",
    InFeature => "IN_FEATURE",
    InScenario => "IN_SCENARIO",
    ImplementsStep => "IMPLEMENTS_STEP",
    GivenLinksTo => "GIVEN_LINKS_TO",
    WhenLinksTo => "WHEN_LINKS_TO",
    ThenLinksTo => "THEN_LINKS_TO",
    HasVulnerability => "HAS_VULNERABILITY",
    FlowsTo => "FLOWS_TO",
    Modifies => "MODIFIES",
    DependsOnExternal => "DEPENDS_ON_EXTERNAL",
    ModifiedIn => "MODIFIED_IN",
    Authored => "AUTHORED",
});

/// Vulnerability severity (spec §3 `Vulnerability` row).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        }
    }
}

/// Given/When/Then BDD step keyword (spec §4.7).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepKeyword {
    Given,
    When,
    Then,
}

impl StepKeyword {
    pub fn as_str(&self) -> &'static str {
        match self {
            StepKeyword::Given => "given",
            StepKeyword::When => "when",
            StepKeyword::Then => "then",
        }
    }

    pub fn links_to_edge(&self) -> EdgeType {
        match self {
            StepKeyword::Given => EdgeType::GivenLinksTo,
            StepKeyword::When => EdgeType::WhenLinksTo,
            StepKeyword::Then => EdgeType::ThenLinksTo,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_label_round_trips_as_str() {
        assert_eq!(NodeLabel::Function.as_str(), "Function");
        assert_eq!(NodeLabel::ALL.len(), 29);
    }

    #[test]
    fn edge_type_matches_spec_names() {
        assert_eq!(EdgeType::CircularDependency.as_str(), "CIRCULAR_DEPENDENCY");
        assert_eq!(EdgeType::DependsOnExternal.as_str(), "DEPENDS_ON_EXTERNAL");
    }

    #[test]
    fn step_keyword_picks_matching_edge() {
        assert_eq!(StepKeyword::Given.links_to_edge(), EdgeType::GivenLinksTo);
        assert_eq!(StepKeyword::Then.links_to_edge(), EdgeType::ThenLinksTo);
    }
}
