//! CSV export of scored patients and the matching reader.

use serde::Deserialize;
use std::io::{Read, Write};

use super::{ScoredPatient, format_export};
use crate::tiers::RiskTier;

const FULL_HEADER: [&str; 5] = ["gender", "age", "comorb_idx", "hr", "risk_level"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CsvVariant {
    /// `gender,age,comorb_idx,hr,risk_level`
    #[default]
    Full,
    /// `gender,age,comorb_idx,hr`, for when no tier is produced.
    Minimal,
}

impl CsvVariant {
    pub fn header(self) -> &'static [&'static str] {
        match self {
            Self::Full => &FULL_HEADER,
            Self::Minimal => &FULL_HEADER[..4],
        }
    }

    fn fields(self, row: &ScoredPatient) -> Vec<String> {
        let covariates = &row.result.covariates;
        let mut fields = vec![
            covariates.gender_code.to_string(),
            covariates.age.to_string(),
            covariates.comorbidity_index.to_string(),
            format_export(row.result.hazard_ratio),
        ];
        if self == Self::Full {
            fields.push(row.result.risk_tier.label().to_string());
        }
        fields
    }
}

/// One parsed CSV line. `risk_level` is absent for the minimal variant.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CsvRecord {
    pub gender: u8,
    pub age: u32,
    pub comorb_idx: usize,
    pub hr: f64,
    #[serde(default)]
    pub risk_level: Option<String>,
}

impl CsvRecord {
    pub fn risk_tier(&self) -> Option<RiskTier> {
        self.risk_level.as_deref().and_then(RiskTier::from_label)
    }
}

/// Writes the header followed by one line per patient. The header is written
/// even when `rows` is empty.
pub fn write<W: Write>(variant: CsvVariant, output: W, rows: &[ScoredPatient]) -> csv::Result<()> {
    let mut writer = csv::Writer::from_writer(output);
    writer.write_record(variant.header())?;
    for row in rows {
        writer.write_record(variant.fields(row))?;
    }
    writer.flush()?;
    Ok(())
}

pub fn write_full<W: Write>(output: W, rows: &[ScoredPatient]) -> csv::Result<()> {
    write(CsvVariant::Full, output, rows)
}

pub fn to_string(variant: CsvVariant, rows: &[ScoredPatient]) -> csv::Result<String> {
    let mut buffer = Vec::new();
    write(variant, &mut buffer, rows)?;
    String::from_utf8(buffer).map_err(|err| {
        csv::Error::from(std::io::Error::new(std::io::ErrorKind::InvalidData, err))
    })
}

/// Parses either variant back into records.
pub fn read_records<R: Read>(input: R) -> csv::Result<Vec<CsvRecord>> {
    let mut reader = csv::Reader::from_reader(input);
    let records = reader.deserialize().collect::<csv::Result<Vec<CsvRecord>>>()?;
    Ok(records)
}
