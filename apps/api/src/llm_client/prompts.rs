// Shared prompt constants and prompt-building utilities.
// Each service that needs LLM calls defines its own prompts.rs alongside it.
// This file contains cross-cutting prompt fragments.

/// System prompt fragment that enforces JSON-only output.
pub const JSON_ONLY_SYSTEM: &str = "You are a precise, structured assistant. \
    You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

/// Common instruction appended to every extraction prompt.
pub const NO_GUESSING_INSTRUCTION: &str = "\
    CRITICAL: Use only information explicitly present in the document. \
    Do NOT guess, infer or invent values. \
    If a field is not present, use an empty string, an empty list, 0, or null as the schema allows.";
