// Document intake: text extraction, blob storage, LLM field extraction and
// the upload/list/delete handlers that drive the matching pipeline.

pub mod blob;
pub mod extraction;
pub mod handlers;
pub mod parser;
pub mod prompts;
