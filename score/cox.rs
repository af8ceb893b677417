use serde::{Deserialize, Serialize};

/// Coefficient on the binary gender covariate (1 = male).
pub const BETA_GENDER: f64 = 0.452;
/// Coefficient per year of age at start of dialysis.
pub const BETA_AGE: f64 = 0.017;
/// Coefficient on the ordinal comorbidity index.
pub const BETA_COMORBID: f64 = -0.138;

/// Fixed Cox proportional-hazards coefficients.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coefficients {
    pub gender: f64,
    pub age: f64,
    pub comorbidity: f64,
}

impl Default for Coefficients {
    fn default() -> Self {
        Self {
            gender: BETA_GENDER,
            age: BETA_AGE,
            comorbidity: BETA_COMORBID,
        }
    }
}

/// Covariate values exactly as they enter the linear predictor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Covariates {
    pub gender_code: u8,
    pub age: u32,
    pub comorbidity_index: usize,
}

impl Coefficients {
    pub fn is_finite(&self) -> bool {
        self.gender.is_finite() && self.age.is_finite() && self.comorbidity.is_finite()
    }

    /// `η = β_gender·g + β_age·age + β_comorbid·c`
    pub fn linear_predictor(&self, covariates: &Covariates) -> f64 {
        self.gender * f64::from(covariates.gender_code)
            + self.age * f64::from(covariates.age)
            + self.comorbidity * covariates.comorbidity_index as f64
    }

    /// Hazard ratio relative to the baseline individual, `exp(η)`.
    pub fn hazard_ratio(&self, covariates: &Covariates) -> f64 {
        self.linear_predictor(covariates).exp()
    }
}
