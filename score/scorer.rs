use serde::Serialize;
use std::sync::LazyLock;
use thiserror::Error;

use crate::catalog::{ComorbidityCatalog, PatientInput, gender_code, validate_age};
use crate::cox::{Coefficients, Covariates};
use crate::model::{ModelError, ModelSpec};
use crate::recommend::RecommendationTable;
use crate::tiers::{RiskTier, TierBounds};

/// Failures surfaced by the scorer. Neither is fatal; the caller decides how to
/// re-prompt or report.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScoreError {
    #[error("invalid {field}: {reason}")]
    InvalidInput { field: &'static str, reason: String },
    #[error("no recommendation for comorbidity '{comorbidity}' at tier '{tier}'")]
    MissingRecommendation { comorbidity: String, tier: RiskTier },
}

impl ScoreError {
    pub(crate) fn invalid(field: &'static str, reason: String) -> Self {
        Self::InvalidInput { field, reason }
    }
}

/// Output of a single scoring call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreResult {
    pub covariates: Covariates,
    pub linear_predictor: f64,
    pub hazard_ratio: f64,
    pub risk_tier: RiskTier,
    pub recommendation: String,
}

/// Pure, stateless scorer over immutable tables. Safe to share across threads.
#[derive(Debug, Clone)]
pub struct RiskScorer {
    coefficients: Coefficients,
    catalog: ComorbidityCatalog,
    bounds: TierBounds,
    recommendations: RecommendationTable,
}

static BUILTIN: LazyLock<RiskScorer> = LazyLock::new(|| RiskScorer {
    coefficients: Coefficients::default(),
    catalog: ComorbidityCatalog::canonical(),
    bounds: TierBounds::default(),
    recommendations: RecommendationTable::builtin(),
});

impl RiskScorer {
    /// The process-wide scorer over the builtin tables.
    pub fn builtin() -> &'static RiskScorer {
        &BUILTIN
    }

    pub fn from_spec(spec: ModelSpec) -> Result<Self, ModelError> {
        spec.validate()?;
        Ok(Self {
            coefficients: spec.coefficients,
            catalog: ComorbidityCatalog::new(spec.comorbidities),
            bounds: spec.tiers,
            recommendations: spec.recommendations,
        })
    }

    pub fn catalog(&self) -> &ComorbidityCatalog {
        &self.catalog
    }

    pub fn bounds(&self) -> &TierBounds {
        &self.bounds
    }

    pub fn coefficients(&self) -> &Coefficients {
        &self.coefficients
    }

    /// Scores raw presentation-layer values.
    ///
    /// Gender is encoded leniently: anything other than "male" (ignoring case) is 0.
    /// The comorbidity must resolve in the catalog and the age must not exceed
    /// [`crate::catalog::MAX_AGE_YEARS`].
    pub fn score(
        &self,
        gender: &str,
        age: u32,
        comorbidity: &str,
    ) -> Result<ScoreResult, ScoreError> {
        let age = validate_age(i64::from(age))?;
        let (comorbidity_index, canonical) =
            self.catalog.resolve(comorbidity).ok_or_else(|| {
                ScoreError::invalid(
                    "comorbidity",
                    format!("'{comorbidity}' is not in the comorbidity catalog"),
                )
            })?;

        let covariates = Covariates {
            gender_code: gender_code(gender),
            age,
            comorbidity_index,
        };
        let linear_predictor = self.coefficients.linear_predictor(&covariates);
        let hazard_ratio = linear_predictor.exp();
        let risk_tier = self.bounds.classify(hazard_ratio);
        let recommendation = self.recommendations.lookup(canonical, risk_tier)?;

        log::debug!(
            "scored gender_code={} age={} comorb_idx={} eta={linear_predictor:.6} hr={hazard_ratio:.6} tier={risk_tier}",
            covariates.gender_code,
            covariates.age,
            covariates.comorbidity_index,
        );

        Ok(ScoreResult {
            covariates,
            linear_predictor,
            hazard_ratio,
            risk_tier,
            recommendation: recommendation.to_string(),
        })
    }

    pub fn score_patient(&self, patient: &PatientInput) -> Result<ScoreResult, ScoreError> {
        self.score(patient.gender.label(), patient.age, &patient.comorbidity)
    }
}
