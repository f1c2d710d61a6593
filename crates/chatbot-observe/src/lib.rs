//! Observability for the chatbot service: subscriber setup and the
//! attribute names used on LLM call spans.

pub mod genai_attrs;
pub mod tracing_setup;
