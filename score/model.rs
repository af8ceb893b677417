//! The constant tables behind the scorer, in the human-readable TOML form used
//! by `model.toml`. The builtin tables are the default; a file is only read
//! when the caller asks for one.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::io::{BufWriter, Write};
use std::path::Path;
use thiserror::Error;

use crate::catalog::{CANONICAL_COMORBIDITIES, ComorbidityCatalog};
use crate::cox::Coefficients;
use crate::recommend::RecommendationTable;
use crate::tiers::{RiskTier, TierBounds};

#[derive(Error, Debug)]
pub enum ModelError {
    #[error("Failed to read or write model file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse TOML model file: {0}")]
    TomlParseError(#[from] toml::de::Error),
    #[error("Failed to serialize model to TOML format: {0}")]
    TomlSerializeError(#[from] toml::ser::Error),
    #[error("Invalid model specification: {0}")]
    Invalid(String),
}

/// Everything the scorer needs, as one serializable artifact.
///
/// Field order matters for the TOML layout: plain arrays first, tables after.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSpec {
    /// Ordered catalog; an entry's position is its covariate value.
    pub comorbidities: Vec<String>,
    pub coefficients: Coefficients,
    pub tiers: TierBounds,
    #[serde(default)]
    pub recommendations: RecommendationTable,
}

impl Default for ModelSpec {
    fn default() -> Self {
        Self::builtin()
    }
}

impl ModelSpec {
    pub fn builtin() -> Self {
        Self {
            comorbidities: CANONICAL_COMORBIDITIES
                .iter()
                .map(|name| name.to_string())
                .collect(),
            coefficients: Coefficients::default(),
            tiers: TierBounds::default(),
            recommendations: RecommendationTable::builtin(),
        }
    }

    pub fn validate(&self) -> Result<(), ModelError> {
        if self.comorbidities.is_empty() {
            return Err(ModelError::Invalid(
                "the comorbidity catalog is empty".to_string(),
            ));
        }
        let mut seen = HashSet::with_capacity(self.comorbidities.len());
        for name in &self.comorbidities {
            if name.trim().is_empty() {
                return Err(ModelError::Invalid(
                    "comorbidity names must not be blank".to_string(),
                ));
            }
            if name.trim() != name {
                return Err(ModelError::Invalid(format!(
                    "comorbidity '{name}' has leading or trailing whitespace"
                )));
            }
            if !seen.insert(name.to_lowercase()) {
                return Err(ModelError::Invalid(format!(
                    "comorbidity '{name}' appears more than once"
                )));
            }
        }
        if !self.coefficients.is_finite() {
            return Err(ModelError::Invalid(
                "coefficients must be finite".to_string(),
            ));
        }
        self.tiers.validate().map_err(ModelError::Invalid)
    }

    /// Catalog entries and tiers that have no recommendation text.
    pub fn coverage_gaps(&self) -> Vec<(String, RiskTier)> {
        self.recommendations
            .coverage_gaps(&ComorbidityCatalog::new(self.comorbidities.clone()))
    }

    /// Saves the specification to a file in a human-readable TOML format.
    pub fn save(&self, path: &Path) -> Result<(), ModelError> {
        let toml_string = toml::to_string_pretty(self)?;
        let mut file = BufWriter::new(fs::File::create(path)?);
        file.write_all(toml_string.as_bytes())?;
        file.flush()?;
        Ok(())
    }

    /// Loads and validates a specification from a TOML file. Coverage gaps are
    /// logged, not rejected: scoring reports them as they are reached.
    pub fn load(path: &Path) -> Result<Self, ModelError> {
        let toml_string = fs::read_to_string(path)?;
        let spec: Self = toml::from_str(&toml_string)?;
        spec.validate()?;

        let catalog = ComorbidityCatalog::new(spec.comorbidities.clone());
        for (name, tier) in spec.coverage_gaps() {
            log::warn!(
                "{}: no recommendation for '{name}' at '{tier}'",
                path.display()
            );
        }
        for name in spec.recommendations.orphaned_entries(&catalog) {
            log::warn!(
                "{}: recommendations for '{name}' are not reachable from the catalog",
                path.display()
            );
        }
        log::info!(
            "Loaded model specification from {} ({} comorbidities)",
            path.display(),
            spec.comorbidities.len()
        );
        Ok(spec)
    }
}
