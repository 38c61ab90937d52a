//! Report generation port trait.

use std::path::{Path, PathBuf};

use crate::domain::analysis::AnalysisReport;
use crate::domain::error::StockevalError;

/// Port for writing per-stock evaluation reports.
pub trait ReportPort {
    /// Render `report` into `output_dir` and return the path written.
    fn write(&self, report: &AnalysisReport, output_dir: &Path)
        -> Result<PathBuf, StockevalError>;
}
