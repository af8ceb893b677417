//! Scores a CSV of patients in parallel and writes the full CSV export for each.

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use rayon::prelude::*;
use serde::Deserialize;
use std::io::{IsTerminal, Read, Write};
use thiserror::Error;

use crate::catalog::PatientInput;
use crate::report::{ScoredPatient, csv as csv_export};
use crate::scorer::{RiskScorer, ScoreError};

#[derive(Debug, Error)]
pub enum BatchError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("line {line}: {source}")]
    Row {
        line: u64,
        #[source]
        source: ScoreError,
    },
}

/// One input row: raw labels exactly as entered, validated before scoring.
#[derive(Debug, Clone, Deserialize)]
pub struct BatchRow {
    pub gender: String,
    pub age: i64,
    pub comorbidity: String,
}

/// Counts reported back to the caller once the output is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchSummary {
    pub scored: usize,
}

fn create_progress_bar(len: u64) -> ProgressBar {
    let draw_target = if std::io::stderr().is_terminal() {
        ProgressDrawTarget::stderr_with_hz(20)
    } else {
        ProgressDrawTarget::hidden()
    };

    let pb = ProgressBar::with_draw_target(Some(len), draw_target);
    if let Ok(style) =
        ProgressStyle::with_template("> [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
    {
        pb.set_style(style.progress_chars("█▉▊▋▌▍▎▏  "));
    }
    pb.set_message("patients scored");
    pb
}

/// Reads rows with header `gender,age,comorbidity`, scores them and writes the
/// full export (`gender,age,comorb_idx,hr,risk_level`) in input order. The first
/// invalid row, in input order, aborts the batch and is reported with its line number.
pub fn score_csv<R: Read, W: Write>(
    scorer: &RiskScorer,
    input: R,
    output: W,
) -> Result<BatchSummary, BatchError> {
    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(input);
    let headers = reader.headers()?.clone();

    // Each row keeps the file line it starts on; blank lines and quoted
    // newlines make that differ from its record index.
    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        let line = record.position().map_or(0, |pos| pos.line());
        let row = record
            .deserialize::<BatchRow>(Some(&headers))
            .map_err(|err| BatchError::Row {
                line,
                source: ScoreError::invalid("row", err.to_string()),
            })?;
        rows.push((line, row));
    }
    log::info!("Scoring {} patients", rows.len());

    let pb = create_progress_bar(rows.len() as u64);
    let scored: Vec<ScoredPatient> = rows
        .into_par_iter()
        .map(|(line, row)| {
            let patient = PatientInput::new(&row.gender, row.age, &row.comorbidity, scorer.catalog())
                .map_err(|source| BatchError::Row { line, source })?;
            let result = scorer
                .score_patient(&patient)
                .map_err(|source| BatchError::Row { line, source })?;
            pb.inc(1);
            Ok(ScoredPatient { patient, result })
        })
        .collect::<Vec<Result<_, BatchError>>>()
        .into_iter()
        .collect::<Result<_, BatchError>>()?;
    pb.finish_and_clear();

    csv_export::write_full(output, &scored)?;
    log::info!("Wrote {} scored rows", scored.len());
    Ok(BatchSummary {
        scored: scored.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::csv::read_records;

    #[test]
    fn scores_rows_in_input_order() {
        let input = "gender,age,comorbidity\n\
                     Male,50,Diabetic Nephropathy\n\
                     female,0,Diabetic Nephropathy\n\
                     MALE, 80 ,Others (e.g. Uropatic Nephropathy)\n";
        let mut output = Vec::new();
        let summary = score_csv(RiskScorer::builtin(), input.as_bytes(), &mut output).unwrap();
        assert_eq!(summary.scored, 3);

        let text = String::from_utf8(output).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("gender,age,comorb_idx,hr,risk_level"));
        assert_eq!(lines.next(), Some("1,50,0,3.676643,Medium Risk"));
        assert_eq!(lines.next(), Some("0,0,0,1.000000,Low Risk"));

        let records = read_records(text.as_bytes()).unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[2].comorb_idx, 4);
        assert_eq!(records[2].age, 80);
    }

    #[test]
    fn invalid_row_reports_its_line() {
        let input = "gender,age,comorbidity\n\
                     Male,50,Diabetic Nephropathy\n\
                     Male,130,Diabetic Nephropathy\n";
        let err = score_csv(RiskScorer::builtin(), input.as_bytes(), Vec::new()).unwrap_err();
        match err {
            BatchError::Row { line, source } => {
                assert_eq!(line, 3);
                assert!(matches!(source, ScoreError::InvalidInput { field: "age", .. }));
            }
            other => panic!("unexpected error {other}"),
        }
    }

    #[test]
    fn earliest_invalid_row_wins() {
        let mut input = String::from("gender,age,comorbidity\n");
        for _ in 0..500 {
            input.push_str("Female,40,Gouty Nephropathy\n");
        }
        input.push_str("Female,-3,Gouty Nephropathy\n");
        for _ in 0..500 {
            input.push_str("Male,999,Gouty Nephropathy\n");
        }
        let err = score_csv(RiskScorer::builtin(), input.as_bytes(), Vec::new()).unwrap_err();
        assert!(matches!(err, BatchError::Row { line: 502, .. }), "{err}");
    }

    #[test]
    fn reported_line_counts_blank_lines() {
        let input = "gender,age,comorbidity\n\
                     Male,50,Diabetic Nephropathy\n\
                     \n\
                     Male,130,Diabetic Nephropathy\n";
        let err = score_csv(RiskScorer::builtin(), input.as_bytes(), Vec::new()).unwrap_err();
        assert!(matches!(err, BatchError::Row { line: 4, .. }), "{err}");
    }

    #[test]
    fn reported_line_follows_quoted_newlines() {
        // The quoted comorbidity spans lines 2 and 3; trimming restores the name.
        let input = "gender,age,comorbidity\n\
                     Male,50,\"Diabetic Nephropathy\n\"\n\
                     Female,-1,Gouty Nephropathy\n";
        let err = score_csv(RiskScorer::builtin(), input.as_bytes(), Vec::new()).unwrap_err();
        assert!(matches!(err, BatchError::Row { line: 4, .. }), "{err}");
    }

    #[test]
    fn malformed_age_reports_its_line() {
        let input = "gender,age,comorbidity\n\
                     Male,50,Diabetic Nephropathy\n\
                     Female,fifty,Gouty Nephropathy\n";
        let err = score_csv(RiskScorer::builtin(), input.as_bytes(), Vec::new()).unwrap_err();
        match err {
            BatchError::Row { line, source } => {
                assert_eq!(line, 3);
                assert!(matches!(source, ScoreError::InvalidInput { field: "row", .. }));
            }
            other => panic!("unexpected error {other}"),
        }
    }

    #[test]
    fn unknown_gender_is_rejected_in_batch_input() {
        let input = "gender,age,comorbidity\nX,50,Gouty Nephropathy\n";
        let err = score_csv(RiskScorer::builtin(), input.as_bytes(), Vec::new()).unwrap_err();
        assert!(matches!(err, BatchError::Row { line: 2, .. }));
    }

    #[test]
    fn empty_input_writes_only_the_header() {
        let mut output = Vec::new();
        let summary = score_csv(
            RiskScorer::builtin(),
            "gender,age,comorbidity\n".as_bytes(),
            &mut output,
        )
        .unwrap();
        assert_eq!(summary.scored, 0);
        assert_eq!(
            String::from_utf8(output).unwrap(),
            "gender,age,comorb_idx,hr,risk_level\n"
        );
    }
}
