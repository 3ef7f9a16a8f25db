//! Crate-spanning error type (spec §7).
//!
//! Every crate in the workspace converts into `CodegraphError` at its
//! boundary so the orchestrator can accumulate a single `RunReport` without
//! matching on five different error enums.

use std::fmt;

/// Error kind categorization, one per spec §7 error kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad path, conflicting flags — fatal at startup.
    Configuration,
    /// Permission denied on subtree — warned, subtree skipped.
    Discovery,
    /// Grammar error — warned, partial best-effort extraction.
    Parse,
    /// Unresolvable reference — silently dropped, counted.
    Resolve,
    /// Malformed C macro/pointer construct — warned, analyzer entry skipped.
    Analyzer,
    /// Transient transport retried; persistent is fatal after retry budget.
    Writer,
    /// Cooperative cancel or forced abort.
    Cancellation,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Configuration => "configuration",
            ErrorKind::Discovery => "discovery",
            ErrorKind::Parse => "parse",
            ErrorKind::Resolve => "resolve",
            ErrorKind::Analyzer => "analyzer",
            ErrorKind::Writer => "writer",
            ErrorKind::Cancellation => "cancellation",
        }
    }

    /// Per spec §7: only Configuration and persistent Writer failures are a
    /// user-visible (non-zero exit) failure; everything else is summarized
    /// as a count in the final report.
    pub fn is_fatal(&self) -> bool {
        matches!(self, ErrorKind::Configuration | ErrorKind::Writer)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Unified error type carried across crate boundaries.
#[derive(Debug)]
pub struct CodegraphError {
    pub kind: ErrorKind,
    pub message: String,
    pub file_path: Option<String>,
    pub line: Option<u32>,
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl CodegraphError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            file_path: None,
            line: None,
            source: None,
        }
    }

    pub fn with_file(mut self, file_path: impl Into<String>) -> Self {
        self.file_path = Some(file_path.into());
        self
    }

    pub fn with_line(mut self, line: u32) -> Self {
        self.line = Some(line);
        self
    }

    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Configuration, message)
    }

    pub fn discovery(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Discovery, message)
    }

    pub fn parse(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Parse, message)
    }

    pub fn resolve(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Resolve, message)
    }

    pub fn analyzer(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Analyzer, message)
    }

    pub fn writer(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Writer, message)
    }
}

impl fmt::Display for CodegraphError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.kind, self.message)?;
        if let Some(path) = &self.file_path {
            write!(f, " ({path}")?;
            if let Some(line) = self.line {
                write!(f, ":{line}")?;
            }
            write!(f, ")")?;
        }
        Ok(())
    }
}

impl std::error::Error for CodegraphError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

impl From<std::io::Error> for CodegraphError {
    fn from(err: std::io::Error) -> Self {
        CodegraphError::discovery(format!("I/O error: {err}")).with_source(err)
    }
}

impl From<serde_json::Error> for CodegraphError {
    fn from(err: serde_json::Error) -> Self {
        CodegraphError::new(ErrorKind::Writer, format!("JSON error: {err}")).with_source(err)
    }
}

pub type Result<T> = std::result::Result<T, CodegraphError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_kind_and_message() {
        let err = CodegraphError::parse("unexpected token");
        assert_eq!(format!("{err}"), "[parse] unexpected token");
    }

    #[test]
    fn display_includes_file_and_line_when_present() {
        let err = CodegraphError::parse("bad token").with_file("a.py").with_line(12);
        assert_eq!(format!("{err}"), "[parse] bad token (a.py:12)");
    }

    #[test]
    fn only_configuration_and_writer_are_fatal() {
        assert!(ErrorKind::Configuration.is_fatal());
        assert!(ErrorKind::Writer.is_fatal());
        assert!(!ErrorKind::Discovery.is_fatal());
        assert!(!ErrorKind::Parse.is_fatal());
        assert!(!ErrorKind::Resolve.is_fatal());
        assert!(!ErrorKind::Analyzer.is_fatal());
        assert!(!ErrorKind::Cancellation.is_fatal());
    }

    #[test]
    fn source_chain_is_preserved() {
        use std::error::Error;
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err = CodegraphError::discovery("could not read subtree").with_source(io_err);
        assert!(err.source().unwrap().to_string().contains("missing"));
    }
}
