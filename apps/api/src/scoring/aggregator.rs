//! Score Aggregator: combines the four category scores into one ranked total.
//!
//! Algorithm:
//! 1. Resolve the user's weight profile for the candidate's tier (strict: a missing
//!    profile is an error, there is no hardcoded fallback).
//! 2. normalized[k] = weight[k] / Σ weights   (Σ treated as 1 when zero)
//! 3. weighted[k]   = round2(score[k] × normalized[k])
//! 4. total         = round2(Σ weighted[k])

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::scoring::weights::{Category, ProfileType, UserWeightConfig, WeightProfile};

/// Raw per-category scores (0–100). Absent categories deserialize as 0.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CategoryScores {
    pub skills: f64,
    pub experience: f64,
    pub education: f64,
    pub certifications: f64,
}

impl CategoryScores {
    pub fn get(&self, category: Category) -> f64 {
        match category {
            Category::Skills => self.skills,
            Category::Experience => self.experience,
            Category::Education => self.education,
            Category::Certifications => self.certifications,
        }
    }

    /// Clamps every score into [0, 100]; NaN becomes 0.
    pub fn clamped(self) -> Self {
        let clamp = |v: f64| if v.is_nan() { 0.0 } else { v.clamp(0.0, 100.0) };
        Self {
            skills: clamp(self.skills),
            experience: clamp(self.experience),
            education: clamp(self.education),
            certifications: clamp(self.certifications),
        }
    }
}

/// One category's contribution to the total.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CategoryBreakdown {
    /// Raw category score as produced by the scorer.
    pub score: f64,
    /// Normalized weight, rounded to 2 decimals.
    pub weight: f64,
    /// score × normalized weight, rounded to 2 decimals.
    pub weighted: f64,
}

pub type ScoreBreakdown = BTreeMap<Category, CategoryBreakdown>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreResult {
    pub total_score: f64,
    pub breakdown: ScoreBreakdown,
}

/// Computes the weighted total for a candidate using the user's profile for `profile_type`.
pub fn compute_total(
    scores: &CategoryScores,
    profile_type: ProfileType,
    config: &UserWeightConfig,
) -> Result<ScoreResult, AppError> {
    let weights = config
        .get(profile_type)
        .ok_or(AppError::MissingWeights(profile_type))?;
    Ok(aggregate(scores, weights))
}

/// Weighted combination against an explicit profile. Pure and infallible.
pub fn aggregate(scores: &CategoryScores, weights: &WeightProfile) -> ScoreResult {
    let total_weight = match weights.sum() {
        0 => 1.0,
        sum => sum as f64,
    };

    let mut breakdown = ScoreBreakdown::new();
    let mut total = 0.0_f64;

    for category in Category::ALL {
        let normalized = f64::from(weights.get(category)) / total_weight;
        let score = scores.get(category);
        let weighted = round2(score * normalized);
        total += weighted;

        breakdown.insert(
            category,
            CategoryBreakdown {
                score,
                weight: round2(normalized),
                weighted,
            },
        );
    }

    ScoreResult {
        total_score: round2(total),
        breakdown,
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn weights(skills: u32, experience: u32, education: u32, certifications: u32) -> WeightProfile {
        WeightProfile {
            skills,
            experience,
            education,
            certifications,
        }
    }

    fn scores(skills: f64, experience: f64, education: f64, certifications: f64) -> CategoryScores {
        CategoryScores {
            skills,
            experience,
            education,
            certifications,
        }
    }

    fn config_with(profile: ProfileType, w: WeightProfile) -> UserWeightConfig {
        [(profile, w)].into_iter().collect()
    }

    #[test]
    fn test_reference_total_is_82() {
        let result = aggregate(&scores(80.0, 90.0, 70.0, 60.0), &weights(30, 50, 10, 10));
        assert!((result.total_score - 82.0).abs() < 1e-9, "got {}", result.total_score);

        let skills = result.breakdown[&Category::Skills];
        assert_eq!(skills.score, 80.0);
        assert_eq!(skills.weight, 0.3);
        assert!((skills.weighted - 24.0).abs() < 1e-9);
        assert!((result.breakdown[&Category::Experience].weighted - 45.0).abs() < 1e-9);
    }

    #[test]
    fn test_scaling_weights_does_not_change_total() {
        let s = scores(73.0, 41.0, 88.0, 12.0);
        let base = aggregate(&s, &weights(30, 50, 10, 10));
        for factor in [2, 3, 7, 10] {
            let scaled = aggregate(
                &s,
                &weights(30 * factor, 50 * factor, 10 * factor, 10 * factor),
            );
            assert_eq!(base, scaled, "scale factor {factor}");
        }
    }

    #[test]
    fn test_zero_scores_give_zero_total() {
        for w in [weights(30, 50, 10, 10), weights(1, 0, 0, 0), weights(0, 0, 0, 0)] {
            assert_eq!(aggregate(&CategoryScores::default(), &w).total_score, 0.0);
        }
    }

    #[test]
    fn test_zero_weight_sum_does_not_divide_by_zero() {
        let result = aggregate(&scores(100.0, 100.0, 100.0, 100.0), &weights(0, 0, 0, 0));
        assert_eq!(result.total_score, 0.0);
        assert!(result.breakdown.values().all(|b| b.weight == 0.0));
    }

    #[test]
    fn test_weights_not_summing_to_100_are_normalized() {
        // 1:1 between skills and experience, nothing else
        let result = aggregate(&scores(60.0, 80.0, 100.0, 100.0), &weights(5, 5, 0, 0));
        assert!((result.total_score - 70.0).abs() < 1e-9);
        assert_eq!(result.breakdown[&Category::Skills].weight, 0.5);
    }

    #[test]
    fn test_absent_categories_contribute_zero() {
        let parsed: CategoryScores = serde_json::from_str(r#"{"skills": 90}"#).unwrap();
        let result = aggregate(&parsed, &weights(25, 25, 25, 25));
        assert!((result.total_score - 22.5).abs() < 1e-9);
    }

    #[test]
    fn test_huge_stored_weights_keep_total_in_range() {
        let result = aggregate(&scores(100.0, 100.0, 100.0, 100.0), &weights(u32::MAX, 101, 0, 0));
        assert!(
            (0.0..=100.0).contains(&result.total_score),
            "got {}",
            result.total_score
        );
        assert_eq!(result.breakdown[&Category::Skills].weight, 1.0);
    }

    #[test]
    fn test_breakdown_has_all_four_categories() {
        let result = aggregate(&scores(10.0, 20.0, 30.0, 40.0), &weights(40, 10, 30, 20));
        assert_eq!(result.breakdown.len(), 4);
    }

    #[test]
    fn test_rounding_to_two_decimals() {
        // 1/3 normalized weight
        let result = aggregate(&scores(50.0, 0.0, 0.0, 0.0), &weights(1, 1, 1, 0));
        let skills = result.breakdown[&Category::Skills];
        assert_eq!(skills.weight, 0.33);
        assert_eq!(skills.weighted, 16.67);
        assert_eq!(result.total_score, 16.67);
    }

    #[test]
    fn test_compute_total_uses_profile_for_tier() {
        let config = config_with(ProfileType::Fresher, weights(100, 0, 0, 0));
        let result = compute_total(&scores(64.0, 0.0, 0.0, 0.0), ProfileType::Fresher, &config).unwrap();
        assert_eq!(result.total_score, 64.0);
    }

    #[test]
    fn test_compute_total_missing_profile_fails() {
        let config = config_with(ProfileType::Fresher, weights(100, 0, 0, 0));
        let err = compute_total(&CategoryScores::default(), ProfileType::SeniorEngineer, &config)
            .unwrap_err();
        assert!(matches!(err, AppError::MissingWeights(ProfileType::SeniorEngineer)));
    }

    #[test]
    fn test_clamped_bounds_scores() {
        let clamped = scores(120.0, -5.0, f64::NAN, 55.5).clamped();
        assert_eq!(clamped, scores(100.0, 0.0, 0.0, 55.5));
    }

    #[test]
    fn test_breakdown_serializes_with_category_keys() {
        let result = aggregate(&scores(80.0, 90.0, 70.0, 60.0), &weights(30, 50, 10, 10));
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["breakdown"]["certifications"]["weight"], 0.1);
    }
}
