#![deny(unused_variables)]
#![deny(dead_code)]
#![deny(unused_imports)]
#![deny(clippy::no_effect_underscore_binding)]
pub mod batch;
pub mod catalog;
pub mod cox;
pub mod model;
pub mod recommend;
pub mod scorer;
pub mod tiers;

#[path = "../report/mod.rs"]
pub mod report;

pub use catalog::{ComorbidityCatalog, Gender, PatientInput};
pub use model::{ModelError, ModelSpec};
pub use scorer::{RiskScorer, ScoreError, ScoreResult};
pub use tiers::RiskTier;
