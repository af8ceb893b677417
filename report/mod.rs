//! Renders scored patients: the on-screen text report, CSV export and PDF export.
//!
//! All three are views over the same [`ScoredPatient`]; the line layout shared by
//! text and PDF lives in [`text::report_lines`].

pub mod csv;
pub mod pdf;
pub mod text;

use serde::Serialize;
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::Path;
use thiserror::Error;

use crate::catalog::PatientInput;
use crate::scorer::ScoreResult;

/// Default download name of the CSV export.
pub const CSV_FILE_NAME: &str = "hazard_ratio.csv";
/// Default download name of the PDF export.
pub const PDF_FILE_NAME: &str = "hazard_ratio.pdf";

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] ::csv::Error),
}

/// A validated patient together with the result it produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredPatient {
    pub patient: PatientInput,
    pub result: ScoreResult,
}

/// Hazard ratio as shown to the user.
pub fn format_display(hazard_ratio: f64) -> String {
    format!("{hazard_ratio:.3}")
}

/// Hazard ratio as written to data exports.
pub fn format_export(hazard_ratio: f64) -> String {
    format!("{hazard_ratio:.6}")
}

fn create_parent_dir(path: &Path) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

pub fn write_csv_file(
    path: &Path,
    variant: csv::CsvVariant,
    rows: &[ScoredPatient],
) -> Result<(), ReportError> {
    create_parent_dir(path)?;
    csv::write(variant, File::create(path)?, rows)?;
    log::info!("CSV export written to {}", path.display());
    Ok(())
}

pub fn write_pdf_file(path: &Path, scored: &ScoredPatient) -> Result<(), ReportError> {
    create_parent_dir(path)?;
    pdf::write_pdf(BufWriter::new(File::create(path)?), scored)?;
    log::info!("PDF report written to {}", path.display());
    Ok(())
}
