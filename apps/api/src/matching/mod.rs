// Matching pipeline: skill-overlap gate → batched LLM scoring → weighted
// aggregation → ranked results per JD. All LLM calls go through llm_client.

pub mod handlers;
pub mod orchestrator;
pub mod prompts;
pub mod scorer;
