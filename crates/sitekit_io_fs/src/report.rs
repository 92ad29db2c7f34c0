//! Copy report model and its mutable builder.

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;

use crate::spec::SpecCopyError;

/// Counters and diagnostics for one `copy_tree` run.
#[derive(Debug, Default, Clone, Serialize)]
pub struct ReportCopy {
    /// Entries visited by the walker.
    pub cnt_scanned: u64,
    /// Visited entries that passed include/exclude filters.
    pub cnt_matched: u64,
    /// Entries committed to the destination.
    pub cnt_copied: u64,
    /// Entries left alone by strategy, dry-run or loop detection.
    pub cnt_skipped: u64,
    pub warnings: Vec<String>,
    pub errors: Vec<SpecCopyError>,
}

impl ReportCopy {
    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    pub fn warning_count(&self) -> usize {
        self.warnings.len()
    }

    /// `true` when no entry failed.
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }

    /// Fold another run's counters and diagnostics into this one.
    pub fn absorb(&mut self, report_other: ReportCopy) {
        self.cnt_scanned += report_other.cnt_scanned;
        self.cnt_matched += report_other.cnt_matched;
        self.cnt_copied += report_other.cnt_copied;
        self.cnt_skipped += report_other.cnt_skipped;
        self.warnings.extend(report_other.warnings);
        self.errors.extend(report_other.errors);
    }

    /// Human-readable one-line summary.
    pub fn format(&self, prefix: &str) -> String {
        format!(
            "{prefix} scanned={} matched={} copied={} skipped={} errors={} warnings={}",
            self.cnt_scanned,
            self.cnt_matched,
            self.cnt_copied,
            self.cnt_skipped,
            self.error_count(),
            self.warning_count()
        )
    }
}

impl fmt::Display for ReportCopy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format("[copy]"))
    }
}

/// Mutable accumulator threaded through the walker.
#[derive(Debug, Default)]
pub(crate) struct ReportCopyBuilder {
    report: ReportCopy,
}

impl ReportCopyBuilder {
    pub(crate) fn add_scanned(&mut self) {
        self.report.cnt_scanned += 1;
    }

    pub(crate) fn add_matched(&mut self) {
        self.report.cnt_matched += 1;
    }

    pub(crate) fn add_copied(&mut self) {
        self.report.cnt_copied += 1;
    }

    pub(crate) fn add_skipped(&mut self) {
        self.report.cnt_skipped += 1;
    }

    pub(crate) fn add_warning(&mut self, warning: String) {
        self.report.warnings.push(warning);
    }

    pub(crate) fn add_error(&mut self, path: PathBuf, exception: String) {
        self.report.errors.push(SpecCopyError { path, exception });
    }

    pub(crate) fn build(self) -> ReportCopy {
        self.report
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::{ReportCopy, ReportCopyBuilder};

    #[test]
    fn format_lists_every_counter() {
        let report = ReportCopy {
            cnt_scanned: 8,
            cnt_matched: 5,
            cnt_copied: 3,
            cnt_skipped: 2,
            warnings: vec!["w".to_string()],
            errors: vec![],
        };

        let txt = report.format("[static]");
        assert_eq!(
            txt,
            "[static] scanned=8 matched=5 copied=3 skipped=2 errors=0 warnings=1"
        );
        assert!(report.to_string().starts_with("[copy] "));
        assert!(report.is_clean());
    }

    #[test]
    fn builder_records_errors() {
        let mut builder_cp_report = ReportCopyBuilder::default();
        builder_cp_report.add_scanned();
        builder_cp_report.add_matched();
        builder_cp_report.add_error(PathBuf::from("a.txt"), "boom".to_string());

        let report = builder_cp_report.build();
        assert!(!report.is_clean());
        assert_eq!(report.error_count(), 1);
        assert_eq!(report.errors[0].exception, "boom");
    }

    #[test]
    fn absorb_adds_counters_and_keeps_diagnostics() {
        let mut report_total = ReportCopy {
            cnt_copied: 2,
            warnings: vec!["first".to_string()],
            ..ReportCopy::default()
        };
        let mut builder_cp_report = ReportCopyBuilder::default();
        builder_cp_report.add_copied();
        builder_cp_report.add_warning("second".to_string());
        report_total.absorb(builder_cp_report.build());

        assert_eq!(report_total.cnt_copied, 3);
        assert_eq!(report_total.warnings, vec!["first", "second"]);
    }
}
