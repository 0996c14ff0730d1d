use std::collections::HashSet;

/// Minimum number of shared skills for a JD/candidate pair to be scored.
pub const MIN_SKILL_OVERLAP: usize = 1;

/// Returns true iff `|required ∩ candidate| ≥ min_overlap`.
///
/// Skills are compared as sets of exact, case-sensitive strings: "Python" and
/// "python" do not match. Duplicates on either side count once.
pub fn has_overlap(required_skills: &[String], candidate_skills: &[String], min_overlap: usize) -> bool {
    overlap_count(required_skills, candidate_skills) >= min_overlap
}

/// Number of distinct skills present on both sides.
pub fn overlap_count(required_skills: &[String], candidate_skills: &[String]) -> usize {
    let required: HashSet<&str> = required_skills.iter().map(String::as_str).collect();
    let candidate: HashSet<&str> = candidate_skills.iter().map(String::as_str).collect();
    required.intersection(&candidate).count()
}
