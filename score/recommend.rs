//! Treatment-recommendation text keyed by comorbidity name, then tier label.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::catalog::ComorbidityCatalog;
use crate::scorer::ScoreError;
use crate::tiers::RiskTier;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecommendationTable {
    entries: BTreeMap<String, BTreeMap<String, String>>,
}

impl RecommendationTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn builtin() -> Self {
        let mut table = Self::new();
        for (comorbidity, blocks) in BUILTIN_RECOMMENDATIONS {
            for (tier, text) in RiskTier::ALL.into_iter().zip(blocks) {
                table.insert(comorbidity, tier, text);
            }
        }
        table
    }

    pub fn insert(&mut self, comorbidity: &str, tier: RiskTier, text: &str) {
        self.entries
            .entry(comorbidity.to_string())
            .or_default()
            .insert(tier.label().to_string(), text.to_string());
    }

    /// Looks up the text for the literal comorbidity name and the tier label.
    /// Neither a missing comorbidity nor a missing tier falls back to anything.
    pub fn lookup(&self, comorbidity: &str, tier: RiskTier) -> Result<&str, ScoreError> {
        self.entries
            .get(comorbidity)
            .and_then(|by_tier| by_tier.get(tier.label()))
            .map(String::as_str)
            .ok_or_else(|| ScoreError::MissingRecommendation {
                comorbidity: comorbidity.to_string(),
                tier,
            })
    }

    /// Every catalog entry and tier combination that has no text.
    pub fn coverage_gaps(&self, catalog: &ComorbidityCatalog) -> Vec<(String, RiskTier)> {
        catalog
            .names()
            .iter()
            .flat_map(|name| RiskTier::ALL.into_iter().map(move |tier| (name, tier)))
            .filter(|(name, tier)| self.lookup(name, *tier).is_err())
            .map(|(name, tier)| (name.clone(), tier))
            .collect()
    }

    /// Keys that are not catalog members; these can never be reached by a score.
    pub fn orphaned_entries<'a>(&'a self, catalog: &ComorbidityCatalog) -> Vec<&'a str> {
        self.entries
            .keys()
            .filter(|name| !catalog.names().contains(name))
            .map(String::as_str)
            .collect()
    }
}

/// Text blocks per comorbidity in tier order Low, Medium, High, Very High.
const BUILTIN_RECOMMENDATIONS: [(&str, [&str; 4]); 5] = [
    (
        "Diabetic Nephropathy",
        [
            "• Maintain HbA1c between 7.0% and 8.0%; avoid hypoglycaemia on dialysis days\n\
             • Review glucose-lowering agents for dialysis dosing at each visit\n\
             • Annual retinal and foot examination\n\
             • Routine nephrology follow-up every 3 months",
            "• Tighten glycaemic monitoring with interdialytic glucose logs\n\
             • Screen for silent coronary disease and peripheral arterial disease\n\
             • Dietitian review of potassium, phosphate and carbohydrate intake\n\
             • Nephrology follow-up every 2 months",
            "• Multidisciplinary review (nephrology, endocrinology, cardiology)\n\
             • Optimise dialysis adequacy (target spKt/V ≥ 1.2) and fluid removal\n\
             • Podiatry review every 3 months to prevent diabetic foot ulcers\n\
             • Monthly clinical review and medication reconciliation",
            "• Urgent multidisciplinary case conference\n\
             • Consider more frequent or longer dialysis sessions\n\
             • Comprehensive cardiovascular work-up and infection surveillance\n\
             • Discuss goals of care and advance care planning with patient and family",
        ],
    ),
    (
        "Hypertensive Nephrosclerosis",
        [
            "• Target pre-dialysis blood pressure below 140/90 mmHg\n\
             • Reinforce salt restriction and interdialytic weight gain limits\n\
             • Routine nephrology follow-up every 3 months",
            "• Review antihypertensive regimen and dry-weight assessment\n\
             • Echocardiography to assess left ventricular hypertrophy\n\
             • Home blood pressure monitoring on non-dialysis days\n\
             • Nephrology follow-up every 2 months",
            "• Intensify volume control; consider probing dry weight downward\n\
             • Cardiology referral for structural heart disease evaluation\n\
             • Screen for cerebrovascular disease and arrhythmia\n\
             • Monthly clinical review",
            "• Urgent cardiology and nephrology joint review\n\
             • Consider extended or additional dialysis sessions for volume control\n\
             • Evaluate for heart failure therapy adjusted to dialysis\n\
             • Discuss goals of care and advance care planning with patient and family",
        ],
    ),
    (
        "Chronic Glomerulonephritis",
        [
            "• Confirm no residual active glomerular disease requiring immunosuppression\n\
             • Preserve residual renal function; avoid nephrotoxic agents\n\
             • Routine nephrology follow-up every 3 months",
            "• Review any ongoing immunosuppression and infection prophylaxis\n\
             • Monitor anaemia, mineral bone disease markers and albumin monthly\n\
             • Assess transplant eligibility\n\
             • Nephrology follow-up every 2 months",
            "• Screen for infection and malignancy risk linked to past immunosuppression\n\
             • Optimise nutrition and treat hypoalbuminaemia\n\
             • Expedite transplant work-up where eligible\n\
             • Monthly clinical review",
            "• Urgent multidisciplinary review of comorbid burden\n\
             • Consider intensified dialysis prescription\n\
             • Close infection surveillance and vaccination review\n\
             • Discuss goals of care and advance care planning with patient and family",
        ],
    ),
    (
        "Gouty Nephropathy",
        [
            "• Continue urate-lowering therapy dosed for dialysis\n\
             • Dietary counselling on purine and fructose intake\n\
             • Routine nephrology follow-up every 3 months",
            "• Monitor serum urate and flare frequency\n\
             • Avoid NSAIDs; use dialysis-appropriate flare treatment\n\
             • Cardiovascular risk factor screening\n\
             • Nephrology follow-up every 2 months",
            "• Rheumatology co-management for recurrent or tophaceous gout\n\
             • Screen for metabolic syndrome and coronary disease\n\
             • Review all medications for dialysis clearance\n\
             • Monthly clinical review",
            "• Urgent multidisciplinary review including rheumatology and cardiology\n\
             • Consider intensified dialysis prescription\n\
             • Aggressive cardiovascular risk management\n\
             • Discuss goals of care and advance care planning with patient and family",
        ],
    ),
    (
        "Others (e.g. Uropatic Nephropathy)",
        [
            "• Confirm the underlying cause is documented and treated\n\
             • Urological follow-up for obstructive or reflux disease where relevant\n\
             • Routine nephrology follow-up every 3 months",
            "• Screen for recurrent urinary tract infection\n\
             • Monitor anaemia and mineral bone disease markers monthly\n\
             • Assess transplant eligibility\n\
             • Nephrology follow-up every 2 months",
            "• Specialist review of the primary renal disease\n\
             • Optimise dialysis adequacy and nutrition\n\
             • Cardiovascular screening\n\
             • Monthly clinical review",
            "• Urgent multidisciplinary case conference\n\
             • Consider intensified dialysis prescription\n\
             • Close infection and cardiovascular surveillance\n\
             • Discuss goals of care and advance care planning with patient and family",
        ],
    ),
];
