// Prompt constants for resume and job description field extraction.

use crate::llm_client::prompts::JSON_ONLY_SYSTEM;

pub const EXTRACTION_SYSTEM: &str = JSON_ONLY_SYSTEM;

/// Replace `{document_text}` before sending.
pub const RESUME_EXTRACTION_PROMPT: &str = r#"You are an information extraction engine. Extract structured candidate information from the resume below.

Return a single JSON object with this schema:
{
  "name": "full name of the candidate",
  "designation": "current or most recent job title",
  "experience": 0.0,
  "contact_number": "",
  "email": "",
  "location": "current city or address, or null",
  "education": [{"degree": "", "institution": "", "year": "or null"}],
  "technical_skills": ["technologies, languages, tools, frameworks"],
  "key_achievements": [""],
  "certifications": [""],
  "projects": [{"title": "", "description": ""}],
  "professional_summary": ""
}

FIELD RULES:
- experience: total professional experience in years as a number (e.g. 4.5).
- location: only the candidate's CURRENT location. Do not use past employers' or universities' locations.
- technical_skills: list each skill once, with its usual spelling and capitalisation (e.g. "Python", "AWS").
- projects: omit declarations and boilerplate; keep descriptions to one or two sentences.

{no_guessing}

Resume:
{document_text}"#;

/// Replace `{document_text}` before sending.
pub const JD_EXTRACTION_PROMPT: &str = r#"You are an information extraction engine. Extract structured fields from the job description below.

Return a single JSON object with this schema:
{
  "jobtitle": "",
  "company": "",
  "location": "or null",
  "required_experience": "e.g. \"3+ years\", or null",
  "job_type": "e.g. \"Full-time\", or null",
  "required_skills": ["technologies, languages, tools, frameworks"],
  "responsibilities": "or null",
  "qualifications": "",
  "salary_range": "or null",
  "posted_date": "or null",
  "contact_email": "or null",
  "description": "a short summary of the role"
}

FIELD RULES:
- required_skills: list each skill once, with its usual spelling and capitalisation (e.g. "Python", "AWS").
  Include both required and preferred skills.

{no_guessing}

Job description:
{document_text}"#;
