//! HTTP adapters implementing [`ModelGateway`](crate::llms::ModelGateway).
//!
//! | Provider | Module | Structured mode |
//! |----------|--------|-----------------|
//! | Anthropic | [`anthropic`] | native (assistant prefill), then text |
//! | Google Gemini | [`gemini`] | text only |
//! | OpenAI and Ollama | [`openai`] | native (`response_format`), then text |
//!
//! The retry loop and error rendering shared by all of them live in [`utils`].

pub mod anthropic;
pub mod gemini;
pub mod openai;
pub mod utils;

pub use anthropic::AnthropicGateway;
pub use gemini::GeminiGateway;
pub use openai::OpenAiGateway;
