//! Build report model.

use std::path::PathBuf;

use serde::Serialize;

use sitekit_io_fs::ReportCopy;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EnumBundleStepStatus {
    Done,
    Skipped,
    Failed,
}

/// Outcome of one pipeline step.
#[derive(Debug, Clone, Serialize)]
pub struct ReportBundleStep {
    pub name: &'static str,
    pub status: EnumBundleStepStatus,
    #[serde(rename = "copy", skip_serializing_if = "Option::is_none")]
    pub report_copy: Option<ReportCopy>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl ReportBundleStep {
    pub(crate) fn new(name: &'static str, status: EnumBundleStepStatus) -> Self {
        Self {
            name,
            status,
            report_copy: None,
            detail: None,
        }
    }

    pub(crate) fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub(crate) fn with_copy(mut self, report_copy: ReportCopy) -> Self {
        self.report_copy = Some(report_copy);
        self
    }
}

/// Everything one `build_bundle` run did.
#[derive(Debug, Clone, Serialize)]
pub struct ReportBundle {
    #[serde(rename = "dist")]
    pub path_dir_dist: PathBuf,
    #[serde(rename = "dry_run")]
    pub if_dry_run: bool,
    pub steps: Vec<ReportBundleStep>,
    pub warnings: Vec<String>,
    pub missing_pages: Vec<String>,
}

impl ReportBundle {
    pub(crate) fn new(path_dir_dist: PathBuf, if_dry_run: bool) -> Self {
        Self {
            path_dir_dist,
            if_dry_run,
            steps: Vec::new(),
            warnings: Vec::new(),
            missing_pages: Vec::new(),
        }
    }

    pub fn step(&self, name: &str) -> Option<&ReportBundleStep> {
        self.steps.iter().find(|s| s.name == name)
    }

    /// Steps marked failed because of copy errors.
    ///
    /// A failed render is expected on machines without the template engine
    /// and is covered by the fallback page, so it does not count here.
    pub fn failed_steps(&self) -> Vec<&ReportBundleStep> {
        self.steps
            .iter()
            .filter(|s| s.status == EnumBundleStepStatus::Failed)
            .filter(|s| s.report_copy.as_ref().is_some_and(|c| !c.is_clean()))
            .collect()
    }

    pub fn is_success(&self) -> bool {
        self.failed_steps().is_empty()
    }

    pub fn summary_lines(&self) -> Vec<String> {
        let mut l_lines = Vec::with_capacity(self.steps.len() + 1);
        for report_step in &self.steps {
            let c_status = match report_step.status {
                EnumBundleStepStatus::Done => "done",
                EnumBundleStepStatus::Skipped => "skipped",
                EnumBundleStepStatus::Failed => "failed",
            };
            let mut c_line = format!("{:<14} {c_status}", report_step.name);
            if let Some(report_copy) = &report_step.report_copy {
                c_line.push_str(&format!(
                    " (copied={} skipped={} errors={})",
                    report_copy.cnt_copied,
                    report_copy.cnt_skipped,
                    report_copy.error_count()
                ));
            }
            if let Some(detail) = &report_step.detail {
                c_line.push_str(&format!(": {detail}"));
            }
            l_lines.push(c_line);
        }
        l_lines.push(format!(
            "warnings={} missing_pages={}",
            self.warnings.len(),
            self.missing_pages.len()
        ));
        l_lines
    }
}
