//! Simulated users: the response-simulator seam, a random clicker, and an
//! LLM-backed simulator with its response parser.

mod llm;
mod llm_handler;
mod random;
mod response;

pub use llm::{build_prompt, CompletionClient, CompletionRequest, LlmResponseSimulator};
pub use llm_handler::{LlmResponseHandler, FALLBACK_CLICK_PROBABILITY};
pub use random::RandomResponseSimulator;
pub use response::{Persona, ResponseSimulator, UserResponse, PERSONA_COUNT};
