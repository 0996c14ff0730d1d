use crate::scoring::weights::ProfileType;

/// Years below which a candidate is a fresher.
const FRESHER_MAX_YEARS: f64 = 2.0;
/// Years at or above which a candidate is a senior engineer.
const SENIOR_MIN_YEARS: f64 = 4.0;

/// Maps total years of professional experience to an experience tier.
/// `< 2 → fresher`, `2..4 → mid_professional`, `≥ 4 → senior_engineer`.
pub fn classify_profile(years_experience: f64) -> ProfileType {
    if years_experience < FRESHER_MAX_YEARS {
        ProfileType::Fresher
    } else if years_experience < SENIOR_MIN_YEARS {
        ProfileType::MidProfessional
    } else {
        ProfileType::SeniorEngineer
    }
}

/// Resolves the tier for a scored candidate: the scoring model's label when it
/// parses, otherwise the tier implied by the candidate's stored experience.
pub fn resolve_profile(label: Option<&str>, years_experience: f64) -> ProfileType {
    label
        .and_then(ProfileType::from_label)
        .unwrap_or_else(|| classify_profile(years_experience))
}
