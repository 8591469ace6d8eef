use std::path::PathBuf;
use std::time::Duration;

use hnf1b_core::RunReport;

/// Where the run put its records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Destination {
    Directory(PathBuf),
    DryRunFile(PathBuf),
    /// Dry run without `--output`.
    Nowhere,
}

#[derive(Debug)]
pub struct RunOutcome {
    pub input: PathBuf,
    pub destination: Destination,
    pub report: RunReport,
    pub elapsed: Duration,
}

impl RunOutcome {
    pub fn has_errors(&self) -> bool {
        self.report.has_failures()
    }
}
