// Adapters layer: concrete implementations for external systems
// (entropy provider, LLM, HTTP server).

pub mod entropy;
pub mod llm;
pub mod web;
