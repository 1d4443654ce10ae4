use serde::Serialize;
use tracing::warn;

use super::llm_handler::LlmResponseHandler;
use super::response::{Persona, ResponseSimulator, UserResponse};
use crate::config::{LlmProvider, LlmSimulatorParams};
use crate::env::Content;
use crate::error::SimulatorError;

/// A single prompt sent to the configured LLM backend.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompletionRequest {
    pub provider: LlmProvider,
    pub model: String,
    pub temperature: f32,
    pub prompt: String,
}

/// Transport to an LLM provider. Embedding applications supply the
/// implementation (HTTP client, local runtime, recorded fixtures).
pub trait CompletionClient {
    fn complete(&mut self, request: &CompletionRequest) -> Result<String, SimulatorError>;
}

impl<C: CompletionClient + ?Sized> CompletionClient for Box<C> {
    fn complete(&mut self, request: &CompletionRequest) -> Result<String, SimulatorError> {
        (**self).complete(request)
    }
}

#[derive(Serialize)]
struct PromptItem<'a> {
    content_id: u64,
    content_type: &'a str,
}

/// Render the persona/slate prompt asking for one JSON response per item.
pub fn build_prompt(persona: &Persona, slate: &[Content]) -> String {
    let items: Vec<PromptItem<'_>> = slate
        .iter()
        .map(|c| PromptItem {
            content_id: c.id,
            content_type: &c.content_type,
        })
        .collect();
    let listing = serde_json::to_string_pretty(&items).unwrap_or_else(|_| "[]".to_string());
    format!(
        "You are simulating user persona #{persona_id}.\n\
         The following {count} items were recommended to you:\n\
         {listing}\n\
         For every item, in the same order, decide whether you click it and how many \
         seconds you spend on it. Answer with only a JSON array of {count} objects with \
         the keys \"content_id\", \"clicked\" (boolean) and \"dwell_time_seconds\" (integer).",
        persona_id = persona.id,
        count = slate.len(),
    )
}

/// Response simulator that asks an LLM to role-play the persona.
pub struct LlmResponseSimulator<C> {
    client: C,
    params: LlmSimulatorParams,
    handler: LlmResponseHandler,
}

impl<C: CompletionClient> LlmResponseSimulator<C> {
    pub fn new(client: C, params: LlmSimulatorParams, seed: u64) -> Self {
        LlmResponseSimulator {
            client,
            params,
            handler: LlmResponseHandler::new(seed),
        }
    }
}

impl<C: CompletionClient> ResponseSimulator for LlmResponseSimulator<C> {
    fn name(&self) -> &str {
        "llm"
    }

    fn simulate(
        &mut self,
        persona: &Persona,
        slate: &[Content],
    ) -> Result<Vec<UserResponse>, SimulatorError> {
        if slate.is_empty() {
            return Ok(Vec::new());
        }
        let request = CompletionRequest {
            provider: self.params.provider,
            model: self.params.model.clone(),
            temperature: self.params.temperature,
            prompt: build_prompt(persona, slate),
        };
        match self.client.complete(&request) {
            Ok(raw) => Ok(self.handler.extract_all_responses(&raw, slate)),
            Err(e) => {
                warn!(error = %e, provider = ?self.params.provider, "LLM completion failed, using fallback responses");
                Ok(self.handler.fallback_responses(slate))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct ScriptedClient {
        replies: Vec<Result<String, SimulatorError>>,
        prompts: Vec<CompletionRequest>,
    }

    impl CompletionClient for ScriptedClient {
        fn complete(&mut self, request: &CompletionRequest) -> Result<String, SimulatorError> {
            self.prompts.push(request.clone());
            self.replies.remove(0)
        }
    }

    fn slate() -> Vec<Content> {
        vec![
            Content {
                id: 3,
                content_type: "video".to_string(),
                embedding: vec![],
            },
            Content {
                id: 4,
                content_type: "news".to_string(),
                embedding: vec![],
            },
        ]
    }

    #[test]
    fn test_prompt_mentions_persona_and_items() {
        let prompt = build_prompt(&Persona { id: 17 }, &slate());
        assert!(prompt.contains("#17"));
        assert!(prompt.contains("\"content_id\": 3"));
        assert!(prompt.contains("\"content_type\": \"news\""));
        assert!(prompt.contains("2 objects"));
    }

    #[test]
    fn test_simulate_parses_client_reply() {
        let client = ScriptedClient {
            replies: vec![Ok(
                r#"[{"content_id": 3, "clicked": true, "dwell_time_seconds": 200},
                    {"content_id": 4, "clicked": false}]"#
                    .to_string(),
            )],
            prompts: Vec::new(),
        };
        let params = LlmSimulatorParams {
            provider: LlmProvider::OpenAi,
            model: "gpt-4o-mini".to_string(),
            ..Default::default()
        };
        let mut sim = LlmResponseSimulator::new(client, params, 0);
        let responses = sim.simulate(&Persona { id: 1 }, &slate()).unwrap();

        assert_eq!(responses[0].dwell_time, 200);
        assert!(responses[0].clicked);
        assert_eq!(responses[1], UserResponse::ignored(4));
        assert_eq!(sim.client.prompts[0].model, "gpt-4o-mini");
        assert_eq!(sim.client.prompts[0].provider, LlmProvider::OpenAi);
    }

    #[test]
    fn test_client_failure_falls_back() {
        let client = ScriptedClient {
            replies: vec![Err(SimulatorError::Completion("timeout".to_string()))],
            prompts: Vec::new(),
        };
        let mut sim = LlmResponseSimulator::new(client, LlmSimulatorParams::default(), 0);
        let responses = sim.simulate(&Persona { id: 1 }, &slate()).unwrap();
        let ids: Vec<u64> = responses.iter().map(|r| r.content_id).collect();
        assert_eq!(ids, vec![3, 4]);
    }

    #[test]
    fn test_empty_slate_skips_client() {
        let client = ScriptedClient {
            replies: Vec::new(),
            prompts: Vec::new(),
        };
        let mut sim = LlmResponseSimulator::new(client, LlmSimulatorParams::default(), 0);
        assert!(sim.simulate(&Persona { id: 1 }, &[]).unwrap().is_empty());
        assert!(sim.client.prompts.is_empty());
    }
}
