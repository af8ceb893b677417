//! Patient-level inputs: gender, age at start of dialysis, and the ordered
//! comorbidity catalog whose positions double as the ordinal covariate.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::scorer::ScoreError;

/// Oldest accepted age at start of dialysis, in whole years.
pub const MAX_AGE_YEARS: u32 = 120;

/// The canonical catalog. Order is load-bearing: the position of each entry is the
/// value multiplied by the comorbidity coefficient.
pub const CANONICAL_COMORBIDITIES: [&str; 5] = [
    "Diabetic Nephropathy",
    "Hypertensive Nephrosclerosis",
    "Chronic Glomerulonephritis",
    "Gouty Nephropathy",
    "Others (e.g. Uropatic Nephropathy)",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    pub fn label(self) -> &'static str {
        match self {
            Self::Male => "Male",
            Self::Female => "Female",
        }
    }

    /// Binary covariate for an already-validated gender.
    pub fn code(self) -> u8 {
        gender_code(self.label())
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Gender {
    type Err = ScoreError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        if trimmed.eq_ignore_ascii_case("male") {
            Ok(Self::Male)
        } else if trimmed.eq_ignore_ascii_case("female") {
            Ok(Self::Female)
        } else {
            Err(ScoreError::invalid(
                "gender",
                format!("'{value}' is not one of Male, Female"),
            ))
        }
    }
}

/// Encodes a raw gender label: 1 when it equals "male" ignoring case, 0 for
/// everything else, including labels that are not genders at all.
pub fn gender_code(label: &str) -> u8 {
    u8::from(label.to_lowercase() == "male")
}

/// Ordered list of comorbidity names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComorbidityCatalog {
    names: Vec<String>,
}

impl ComorbidityCatalog {
    pub fn new(names: Vec<String>) -> Self {
        Self { names }
    }

    pub fn canonical() -> Self {
        Self::new(
            CANONICAL_COMORBIDITIES
                .iter()
                .map(|name| name.to_string())
                .collect(),
        )
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn name_at(&self, index: usize) -> Option<&str> {
        self.names.get(index).map(String::as_str)
    }

    /// Resolves a user-supplied name to its position and canonical spelling.
    /// Exact matches win over case-insensitive ones.
    pub fn resolve(&self, name: &str) -> Option<(usize, &str)> {
        let wanted = name.trim();
        self.names
            .iter()
            .position(|entry| entry == wanted)
            .or_else(|| {
                self.names
                    .iter()
                    .position(|entry| entry.eq_ignore_ascii_case(wanted))
            })
            .map(|index| (index, self.names[index].as_str()))
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.resolve(name).map(|(index, _)| index)
    }
}

/// A validated patient record, ready to score.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatientInput {
    pub gender: Gender,
    pub age: u32,
    /// Canonical catalog spelling.
    pub comorbidity: String,
}

impl PatientInput {
    /// Validates raw presentation-layer values against the catalog. Ages outside
    /// `0..=MAX_AGE_YEARS` are rejected rather than clamped.
    pub fn new(
        gender: &str,
        age: i64,
        comorbidity: &str,
        catalog: &ComorbidityCatalog,
    ) -> Result<Self, ScoreError> {
        let gender = gender.parse::<Gender>()?;
        let age = validate_age(age)?;
        let (_, canonical) = catalog.resolve(comorbidity).ok_or_else(|| {
            ScoreError::invalid(
                "comorbidity",
                format!("'{comorbidity}' is not in the comorbidity catalog"),
            )
        })?;
        Ok(Self {
            gender,
            age,
            comorbidity: canonical.to_string(),
        })
    }
}

pub fn validate_age(age: i64) -> Result<u32, ScoreError> {
    u32::try_from(age)
        .ok()
        .filter(|years| *years <= MAX_AGE_YEARS)
        .ok_or_else(|| {
            ScoreError::invalid(
                "age",
                format!("{age} is outside the accepted range 0..={MAX_AGE_YEARS}"),
            )
        })
}
