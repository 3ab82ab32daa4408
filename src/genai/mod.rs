//! Generative-AI service adapter.

mod client;
mod gemini;

pub use client::GenAiClient;
pub use gemini::GeminiClient;
