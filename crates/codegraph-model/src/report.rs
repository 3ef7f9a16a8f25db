//! `RunReport`: the non-fatal-error accounting a caller needs to tell "ran
//! clean" apart from "ran with N files skipped" without scraping logs
//! (spec §7).

use std::collections::BTreeMap;

use crate::error::ErrorKind;

/// Counters and timing for one `ingest()` invocation.
#[derive(Debug, Default, Clone)]
pub struct RunReport {
    pub files_discovered: usize,
    pub files_parsed: usize,
    pub files_skipped_too_large: usize,
    pub nodes_written: usize,
    pub relationships_written: usize,
    pub calls_dropped_unresolved: usize,
    pub non_fatal_errors: BTreeMap<&'static str, usize>,
    pub cancelled: bool,
}

impl RunReport {
    pub fn record_error(&mut self, kind: ErrorKind) {
        debug_assert!(
            !kind.is_fatal(),
            "fatal error kinds must propagate, not accumulate in the report"
        );
        *self.non_fatal_errors.entry(kind.as_str()).or_insert(0) += 1;
    }

    pub fn total_non_fatal(&self) -> usize {
        self.non_fatal_errors.values().sum()
    }

    pub fn is_clean(&self) -> bool {
        self.total_non_fatal() == 0 && !self.cancelled
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_report_has_no_errors() {
        let report = RunReport::default();
        assert!(report.is_clean());
    }

    #[test]
    fn recording_errors_accumulates_by_kind() {
        let mut report = RunReport::default();
        report.record_error(ErrorKind::Parse);
        report.record_error(ErrorKind::Parse);
        report.record_error(ErrorKind::Resolve);
        assert_eq!(report.non_fatal_errors["parse"], 2);
        assert_eq!(report.non_fatal_errors["resolve"], 1);
        assert_eq!(report.total_non_fatal(), 3);
        assert!(!report.is_clean());
    }

    #[test]
    fn cancellation_marks_report_unclean() {
        let mut report = RunReport::default();
        report.cancelled = true;
        assert!(!report.is_clean());
    }
}
