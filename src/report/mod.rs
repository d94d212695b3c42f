//! Report rendering
//!
//! `report_lines` decides what the report says; a `ReportRenderer` decides
//! how it is laid out and where the artifact lands.

mod layout;
mod pdf;

use chrono::{DateTime, Utc};
use std::path::PathBuf;

use crate::error::ReportError;

pub use layout::{report_lines, LineStyle, ReportInput, ReportLine, REPORT_TITLE};
pub use pdf::PdfReportRenderer;

/// A rendered report and where it was stored
#[derive(Debug, Clone)]
pub struct ReportArtifact {
    pub path: PathBuf,
    pub bytes: Vec<u8>,
    pub generated_at: DateTime<Utc>,
}

impl ReportArtifact {
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "report.pdf".to_string())
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }
}

/// Report renderer trait
///
/// Rendering is blocking; async callers go through `spawn_blocking`.
pub trait ReportRenderer: Send + Sync {
    fn render(&self, input: &ReportInput) -> Result<ReportArtifact, ReportError>;
}
