//! Weight profiles: per-category integer weights keyed by experience tier.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The four scored hiring dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Skills,
    Experience,
    Education,
    Certifications,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Skills,
        Category::Experience,
        Category::Education,
        Category::Certifications,
    ];
}

/// Experience tier. Selects which weight profile applies to a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfileType {
    Fresher,
    MidProfessional,
    SeniorEngineer,
}

impl ProfileType {
    pub const ALL: [ProfileType; 3] = [
        ProfileType::Fresher,
        ProfileType::MidProfessional,
        ProfileType::SeniorEngineer,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProfileType::Fresher => "fresher",
            ProfileType::MidProfessional => "mid_professional",
            ProfileType::SeniorEngineer => "senior_engineer",
        }
    }

    /// Lenient parse of a free-text tier label as produced by the scoring model.
    /// Accepts the canonical names plus the human phrasings the model tends to emit
    /// ("mid-level professional", "Senior Engineer", ...).
    pub fn from_label(label: &str) -> Option<Self> {
        let normalized: String = label
            .trim()
            .to_lowercase()
            .chars()
            .map(|c| if c.is_alphanumeric() { c } else { '_' })
            .collect();
        let normalized = normalized.trim_matches('_');

        match normalized {
            "fresher" | "junior" | "entry_level" | "graduate" => Some(ProfileType::Fresher),
            "mid_professional" | "mid_level_professional" | "mid_level" | "mid" => {
                Some(ProfileType::MidProfessional)
            }
            "senior_engineer" | "senior" | "senior_professional" => {
                Some(ProfileType::SeniorEngineer)
            }
            _ => None,
        }
    }
}

impl fmt::Display for ProfileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProfileType {
    type Err = String;

    /// Strict parse: only the canonical snake_case names.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ProfileType::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| format!("unknown profile type '{s}'"))
    }
}

/// Integer weight per category. Missing categories deserialize as 0 and
/// unknown category names are rejected.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WeightProfile {
    pub skills: u32,
    pub experience: u32,
    pub education: u32,
    pub certifications: u32,
}

impl WeightProfile {
    pub fn get(&self, category: Category) -> u32 {
        match category {
            Category::Skills => self.skills,
            Category::Experience => self.experience,
            Category::Education => self.education,
            Category::Certifications => self.certifications,
        }
    }

    /// Widened so that no combination of `u32` weights can wrap.
    pub fn sum(&self) -> u64 {
        Category::ALL.iter().map(|c| u64::from(self.get(*c))).sum()
    }

    pub fn largest(&self) -> u32 {
        Category::ALL.iter().map(|c| self.get(*c)).max().unwrap_or(0)
    }

    /// Seed weights for a tier. Each default profile sums to 100.
    pub fn default_for(profile: ProfileType) -> Self {
        match profile {
            ProfileType::Fresher => WeightProfile {
                skills: 40,
                experience: 10,
                education: 30,
                certifications: 20,
            },
            ProfileType::MidProfessional => WeightProfile {
                skills: 35,
                experience: 25,
                education: 25,
                certifications: 15,
            },
            ProfileType::SeniorEngineer => WeightProfile {
                skills: 30,
                experience: 40,
                education: 20,
                certifications: 10,
            },
        }
    }
}

/// All weight profiles stored for one user. Any tier may be absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserWeightConfig(BTreeMap<ProfileType, WeightProfile>);

impl UserWeightConfig {
    pub fn get(&self, profile: ProfileType) -> Option<&WeightProfile> {
        self.0.get(&profile)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(ProfileType, WeightProfile)> for UserWeightConfig {
    fn from_iter<I: IntoIterator<Item = (ProfileType, WeightProfile)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
