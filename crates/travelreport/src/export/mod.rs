//! Document export.
//!
//! Reports leave the tool as files in the export directory: one PDF per
//! report or draft, or one CSV with every saved report. Files are fully
//! rendered in memory and then moved into place, so a failed export never
//! leaves a partial file behind.

mod csv_export;
mod fonts;
pub mod pdf;

use std::path::{Path, PathBuf};

use chrono::Local;
use tracing::info;

use crate::error::{Error, Result};
use crate::report::{Report, ReportFields};
use crate::signature::SignatureImage;

pub use csv_export::{render_store_csv, CSV_COLUMNS};
pub use fonts::TextMetrics;
pub use pdf::{render_report_pdf, PageGeometry, PdfSource};

/// File name of the CSV export.
pub const CSV_FILE_NAME: &str = "travel-agent-reports.csv";

/// Footer timestamp format.
const GENERATED_AT_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Make a booking number safe to use inside a file name.
fn file_component(value: &str) -> String {
    let cleaned: String = value
        .trim()
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.is_empty() {
        "unnamed".to_string()
    } else {
        cleaned
    }
}

/// `TravelAgentReport_<bookingNo>.pdf`
#[must_use]
pub fn draft_pdf_name(booking_no: &str) -> String {
    format!("TravelAgentReport_{}.pdf", file_component(booking_no))
}

/// `TravelAgentReport_<bookingNo>_<id>.pdf`
#[must_use]
pub fn report_pdf_name(report: &Report) -> String {
    format!(
        "TravelAgentReport_{}_{}.pdf",
        file_component(&report.fields.booking_no),
        report.id
    )
}

/// Writes exported documents into a directory.
#[derive(Debug, Clone)]
pub struct Exporter {
    output_dir: PathBuf,
    geometry: PageGeometry,
}

impl Exporter {
    /// Create an exporter writing into `output_dir`.
    #[must_use]
    pub fn new(output_dir: impl Into<PathBuf>, geometry: PageGeometry) -> Self {
        Self {
            output_dir: output_dir.into(),
            geometry,
        }
    }

    /// The export directory.
    #[must_use]
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Render an unsaved draft to PDF.
    ///
    /// The caller validates the draft first.
    ///
    /// # Errors
    ///
    /// Returns an error if rendering or writing fails.
    pub fn export_draft_pdf(
        &self,
        fields: &ReportFields,
        traveler_signature: Option<&SignatureImage>,
        agent_signature: Option<&SignatureImage>,
    ) -> Result<PathBuf> {
        let source = PdfSource::from_draft(fields, traveler_signature, agent_signature);
        let bytes = render_report_pdf(&source, self.geometry, &generated_at())?;
        self.write(&draft_pdf_name(&fields.booking_no), &bytes)
    }

    /// Render a saved report to PDF.
    ///
    /// # Errors
    ///
    /// Returns an error if rendering or writing fails.
    pub fn export_report_pdf(&self, report: &Report) -> Result<PathBuf> {
        let source = PdfSource::from_report(report);
        let bytes = render_report_pdf(&source, self.geometry, &generated_at())?;
        self.write(&report_pdf_name(report), &bytes)
    }

    /// Write every report to one CSV file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NothingToExport`] for an empty list, without
    /// creating a file.
    pub fn export_csv(&self, reports: &[Report]) -> Result<PathBuf> {
        let bytes = render_store_csv(reports)?;
        self.write(CSV_FILE_NAME, &bytes)
    }

    fn write(&self, file_name: &str, bytes: &[u8]) -> Result<PathBuf> {
        std::fs::create_dir_all(&self.output_dir).map_err(|source| Error::DirectoryCreate {
            path: self.output_dir.clone(),
            source,
        })?;

        let path = self.output_dir.join(file_name);
        let partial = self.output_dir.join(format!(".{file_name}.part"));
        let write = std::fs::write(&partial, bytes).and_then(|()| std::fs::rename(&partial, &path));
        if let Err(source) = write {
            let _ = std::fs::remove_file(&partial);
            return Err(Error::FileWrite { path, source });
        }

        info!("Exported {} ({} bytes)", path.display(), bytes.len());
        Ok(path)
    }
}

fn generated_at() -> String {
    Local::now().format(GENERATED_AT_FORMAT).to_string()
}
