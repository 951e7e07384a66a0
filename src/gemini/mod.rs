//! Google Gemini `generateContent` client: grounded answers and plain text generation.

pub(crate) mod client;
pub(crate) mod grounding;
pub(crate) mod types;

pub use client::{GeminiClient, GenerationBackend};
pub use types::{GroundedResult, Source};
