//! Line layout of the patient report, rendered as plain text here and as a PDF
//! page by [`super::pdf`].

use super::{ScoredPatient, format_display};
use crate::tiers::RiskTier;

pub const TITLE: &str = "Hazard Risk Ratio Calculator for Dialysis Patients";
pub const SUBTITLE: &str = "Dialysis patient risk estimate (Cox model)";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    Title,
    Subtitle,
    Body,
    /// The tier line, drawn in the tier's colour.
    Tier(RiskTier),
    Heading,
    Bullet,
    Blank,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportLine {
    pub kind: LineKind,
    pub text: String,
}

impl ReportLine {
    fn new(kind: LineKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }

    fn blank() -> Self {
        Self::new(LineKind::Blank, "")
    }
}

/// The sentence comparing the patient to the baseline hazard.
pub fn baseline_comparison(hazard_ratio: f64) -> String {
    format!(
        "The patient's mortality hazard risk is {hazard_ratio:.2}× higher than the baseline hazard."
    )
}

pub fn report_lines(scored: &ScoredPatient) -> Vec<ReportLine> {
    let patient = &scored.patient;
    let result = &scored.result;

    let mut lines = vec![
        ReportLine::new(LineKind::Title, TITLE),
        ReportLine::new(LineKind::Subtitle, SUBTITLE),
        ReportLine::blank(),
        ReportLine::new(
            LineKind::Body,
            format!(
                "Patient: {}, {} years at start of dialysis",
                patient.gender, patient.age
            ),
        ),
        ReportLine::new(
            LineKind::Body,
            format!("Primary comorbidity: {}", patient.comorbidity),
        ),
        ReportLine::new(
            LineKind::Body,
            format!("Hazard Risk Ratio: {}", format_display(result.hazard_ratio)),
        ),
        ReportLine::new(
            LineKind::Tier(result.risk_tier),
            format!("Risk level: {}", result.risk_tier),
        ),
        ReportLine::new(LineKind::Body, baseline_comparison(result.hazard_ratio)),
        ReportLine::blank(),
        ReportLine::new(LineKind::Heading, "Recommendations"),
    ];
    lines.extend(
        result
            .recommendation
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| ReportLine::new(LineKind::Bullet, line.trim())),
    );
    lines
}

/// Plain-text report for terminals and logs.
pub fn render_text(scored: &ScoredPatient) -> String {
    let mut out = String::new();
    for line in report_lines(scored) {
        match line.kind {
            LineKind::Title => {
                out.push_str(&line.text);
                out.push('\n');
                out.push_str(&"=".repeat(line.text.chars().count()));
            }
            LineKind::Tier(tier) => {
                out.push_str(&format!("{} ({})", line.text, tier.color()));
            }
            LineKind::Heading => {
                out.push_str(&line.text);
                out.push(':');
            }
            LineKind::Bullet => {
                out.push_str("  ");
                out.push_str(&line.text);
            }
            LineKind::Subtitle | LineKind::Body | LineKind::Blank => out.push_str(&line.text),
        }
        out.push('\n');
    }
    out
}
