// Prompt constants for candidate scoring.

use crate::llm_client::prompts::JSON_ONLY_SYSTEM;

/// System prompt for batch candidate scoring: enforces JSON-only output.
pub const SCORING_SYSTEM: &str = JSON_ONLY_SYSTEM;

/// Scoring prompt template. Replace `{jd_json}` and `{candidates_json}` before sending.
pub const SCORING_PROMPT_TEMPLATE: &str = r#"You are an expert recruitment analyst. Given a job description and a list of candidate resumes,
evaluate how well each candidate matches the role across four hiring dimensions:
Skills, Experience, Education and Certifications.

Job Description:
{jd_json}

Candidates:
{candidates_json}

Return a JSON array with EXACTLY one object per candidate, using this schema:
[
  {
    "candidate_id": "<copy the candidate_id from the input verbatim>",
    "profile_type": "fresher" | "mid_professional" | "senior_engineer",
    "skills_score": 0-100,
    "skills_explanation": "...",
    "experience_score": 0-100,
    "experience_explanation": "...",
    "education_score": 0-100,
    "education_explanation": "...",
    "certifications_score": 0-100,
    "certifications_explanation": "...",
    "skills_matched": ["..."],
    "key_achievements": ["..."]
  }
]
If a candidate cannot be evaluated, return {"candidate_id": "...", "error": "<reason>"} for it instead.

SCORING BANDS (each category, 0–100):
- 90–100: Excellent match. Fully satisfies all key requirements.
- 70–89: Good match. Covers most important criteria with minor gaps.
- 50–69: Moderate match. Partially meets expectations but missing key items.
- 30–49: Weak match. Only a few relevant elements are present.
- 0–29: Very poor or no alignment.

SKILLS: compare technical and soft skills against required and preferred skills; weigh relevance,
recency, frequency and completeness. Score high only if most core skills are covered.
EXPERIENCE: compare previous titles, domains, seniority and tools with the responsibilities;
consider years of experience, job function and progression.
EDUCATION: compare degrees, fields of study and institutions with the stated qualifications.
CERTIFICATIONS: score relevance and industry recognition of certifications to the role.

PROFILE TYPE from total years of experience:
- less than 2 years: "fresher"
- 2 years up to (not including) 4 years: "mid_professional"
- 4 or more years: "senior_engineer"

SKILLS MATCHED: list technical skills present in BOTH the job description and the resume.
Only exact or clearly equivalent matches ("Python" and "Python" match; "Java" and "JavaScript" do not).
Do not infer skills that the resume does not mention."#;
