// Resume ingest: extract text from an upload, turn it into a draft document
// through the LLM, and keep the original file in blob storage.
// All LLM calls go through llm_client.

pub mod handlers;
pub mod parser;
pub mod prompts;
pub mod storage;

pub use parser::{LlmResumeParser, ResumeParser};
