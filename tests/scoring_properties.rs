use approx::assert_abs_diff_eq;
use dialysis_hazard::catalog::{CANONICAL_COMORBIDITIES, MAX_AGE_YEARS};
use dialysis_hazard::recommend::RecommendationTable;
use dialysis_hazard::tiers::TierBounds;
use dialysis_hazard::{ModelSpec, RiskScorer, RiskTier, ScoreError};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const GENDERS: [&str; 2] = ["Male", "Female"];

#[test]
fn hazard_ratio_is_positive_for_every_valid_input() {
    let scorer = RiskScorer::builtin();
    for gender in GENDERS {
        for age in 0..=MAX_AGE_YEARS {
            for comorbidity in CANONICAL_COMORBIDITIES {
                let result = scorer.score(gender, age, comorbidity).unwrap();
                assert!(result.hazard_ratio > 0.0);
                assert!(result.hazard_ratio.is_finite());
                assert_eq!(
                    result.risk_tier,
                    TierBounds::default().classify(result.hazard_ratio)
                );
            }
        }
    }
}

#[test]
fn gender_spellings_share_one_code() {
    let scorer = RiskScorer::builtin();
    let reference = scorer.score("Male", 45, "Gouty Nephropathy").unwrap();
    for spelling in ["MALE", "male", "mAle"] {
        let result = scorer.score(spelling, 45, "Gouty Nephropathy").unwrap();
        assert_eq!(result.covariates.gender_code, 1);
        assert_eq!(result.hazard_ratio, reference.hazard_ratio);
    }
    for other in ["Female", "f", "m", "males", " "] {
        let result = scorer.score(other, 45, "Gouty Nephropathy").unwrap();
        assert_eq!(result.covariates.gender_code, 0, "{other:?}");
    }
}

#[test]
fn hazard_strictly_increases_with_age() {
    let scorer = RiskScorer::builtin();
    let mut rng = StdRng::seed_from_u64(0x5eed);
    for _ in 0..200 {
        let gender = GENDERS[rng.gen_range(0..GENDERS.len())];
        let comorbidity = CANONICAL_COMORBIDITIES[rng.gen_range(0..CANONICAL_COMORBIDITIES.len())];
        let younger = rng.gen_range(0..MAX_AGE_YEARS);
        let older = rng.gen_range(younger + 1..=MAX_AGE_YEARS);

        let low = scorer.score(gender, younger, comorbidity).unwrap();
        let high = scorer.score(gender, older, comorbidity).unwrap();
        assert!(
            high.hazard_ratio > low.hazard_ratio,
            "{gender} {comorbidity}: age {older} should exceed age {younger}"
        );
        assert!(high.risk_tier >= low.risk_tier);
    }
}

#[test]
fn hazard_strictly_decreases_with_comorbidity_index() {
    let scorer = RiskScorer::builtin();
    for gender in GENDERS {
        for age in [0, 18, 50, 77, 120] {
            let ratios: Vec<f64> = CANONICAL_COMORBIDITIES
                .iter()
                .map(|name| scorer.score(gender, age, name).unwrap().hazard_ratio)
                .collect();
            assert!(ratios.windows(2).all(|pair| pair[1] < pair[0]), "{ratios:?}");
        }
    }
}

#[test]
fn reference_examples() {
    let scorer = RiskScorer::builtin();

    let male = scorer.score("Male", 50, "Diabetic Nephropathy").unwrap();
    assert_abs_diff_eq!(male.linear_predictor, 1.302, epsilon = 1e-12);
    assert_abs_diff_eq!(male.hazard_ratio, 3.676_643, epsilon = 1e-6);
    assert_eq!(male.risk_tier, RiskTier::Medium);

    let baseline = scorer.score("Female", 0, "Diabetic Nephropathy").unwrap();
    assert_eq!(baseline.linear_predictor, 0.0);
    assert_eq!(baseline.hazard_ratio, 1.0);
    assert_eq!(baseline.risk_tier, RiskTier::Low);
}

#[test]
fn tier_boundaries_are_exclusive_upper_bounds() {
    let bounds = TierBounds::default();
    assert_eq!(bounds.classify(2.5), RiskTier::Medium);
    assert_eq!(bounds.classify(4.0), RiskTier::High);
    assert_eq!(bounds.classify(6.0), RiskTier::VeryHigh);
    assert_eq!(bounds.classify(f64::from_bits(2.5_f64.to_bits() - 1)), RiskTier::Low);
}

#[test]
fn scorer_reports_gaps_instead_of_defaulting() {
    let mut spec = ModelSpec::builtin();
    spec.recommendations = RecommendationTable::new();
    spec.recommendations
        .insert("Diabetic Nephropathy", RiskTier::Low, "• Routine follow-up");
    let scorer = RiskScorer::from_spec(spec).unwrap();

    let covered = scorer.score("Female", 10, "Diabetic Nephropathy").unwrap();
    assert_eq!(covered.recommendation, "• Routine follow-up");

    // Male, 50: Medium Risk, which has no text here.
    let err = scorer.score("Male", 50, "Diabetic Nephropathy").unwrap_err();
    assert_eq!(
        err,
        ScoreError::MissingRecommendation {
            comorbidity: "Diabetic Nephropathy".to_string(),
            tier: RiskTier::Medium,
        }
    );

    let err = scorer.score("Female", 10, "Gouty Nephropathy").unwrap_err();
    assert!(matches!(err, ScoreError::MissingRecommendation { .. }));
}

#[test]
fn reordering_the_catalog_changes_ratios() {
    let mut spec = ModelSpec::builtin();
    spec.comorbidities.reverse();
    let reordered = RiskScorer::from_spec(spec).unwrap();
    let canonical = RiskScorer::builtin();

    let before = canonical.score("Male", 60, "Diabetic Nephropathy").unwrap();
    let after = reordered.score("Male", 60, "Diabetic Nephropathy").unwrap();
    assert_eq!(after.covariates.comorbidity_index, 4);
    assert!(after.hazard_ratio < before.hazard_ratio);
}

#[test]
fn concurrent_scoring_matches_sequential() {
    let scorer = RiskScorer::builtin();
    let expected: Vec<f64> = (0..=MAX_AGE_YEARS)
        .map(|age| scorer.score("Male", age, "Gouty Nephropathy").unwrap().hazard_ratio)
        .collect();

    let handles: Vec<_> = (0..4)
        .map(|_| {
            std::thread::spawn(|| {
                (0..=MAX_AGE_YEARS)
                    .map(|age| {
                        RiskScorer::builtin()
                            .score("Male", age, "Gouty Nephropathy")
                            .unwrap()
                            .hazard_ratio
                    })
                    .collect::<Vec<f64>>()
            })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.join().unwrap(), expected);
    }
}
