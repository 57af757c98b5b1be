//! Research Agent analysis layer
//!
//! - **Backends**: Claude (Anthropic Messages API) and Gemini
//!   (OpenAI-compatible endpoint) behind one [`LlmBackend`] trait
//! - **Analyzer**: turns collected items into one completion and an
//!   [`research_core::AnalysisResult`]

pub mod backend;
pub mod analyzer;

pub use backend::*;
pub use analyzer::*;
