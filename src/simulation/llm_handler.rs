use std::collections::HashSet;

use rand::rngs::StdRng;
use rand::Rng;
use rand::SeedableRng;
use serde_json::Value;
use tracing::{debug, warn};

use super::response::UserResponse;
use crate::env::Content;
use crate::error::SimulatorError;

/// Click probability used when the LLM output cannot be used.
pub const FALLBACK_CLICK_PROBABILITY: f64 = 0.3;

/// Turns raw LLM completions into per-item user responses.
///
/// Anything the handler cannot trust (bad JSON, wrong number of responses,
/// missing content ids) is replaced by randomly generated fallback responses,
/// so callers always receive one response per slate item.
pub struct LlmResponseHandler {
    rng: StdRng,
}

impl LlmResponseHandler {
    pub fn new(seed: u64) -> Self {
        LlmResponseHandler {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Extract one response per slate item, falling back to random responses
    /// on any parse or validation failure.
    pub fn extract_all_responses(&mut self, raw: &str, slate: &[Content]) -> Vec<UserResponse> {
        match self.try_extract(raw, slate) {
            Ok(responses) => responses,
            Err(e) => {
                warn!(error = %e, "unusable LLM response, generating fallback responses");
                self.fallback_responses(slate)
            }
        }
    }

    fn try_extract(
        &self,
        raw: &str,
        slate: &[Content],
    ) -> Result<Vec<UserResponse>, SimulatorError> {
        let parsed = parse_json(raw)?;
        validate_response_count(&parsed, slate.len())?;
        extract_content_responses(&parsed, slate)
    }

    /// Random responses for every item: click with p = 0.3, dwell 60..=300 s.
    pub fn fallback_responses(&mut self, slate: &[Content]) -> Vec<UserResponse> {
        let responses: Vec<UserResponse> = slate
            .iter()
            .map(|content| {
                let clicked = self.rng.random_bool(FALLBACK_CLICK_PROBABILITY);
                UserResponse {
                    content_id: content.id,
                    clicked,
                    dwell_time: if clicked {
                        self.rng.random_range(60..=300)
                    } else {
                        0
                    },
                }
            })
            .collect();
        debug!(
            total = responses.len(),
            clicked = responses.iter().filter(|r| r.clicked).count(),
            "generated fallback responses"
        );
        responses
    }
}

/// Strip surrounding Markdown code fences (```` ``` ```` or ```` ```json ````).
pub fn strip_code_fences(text: &str) -> &str {
    let mut text = text.trim();
    if let Some(rest) = text.strip_prefix("```") {
        let rest = rest.strip_prefix("json").unwrap_or(rest);
        text = rest.trim_start();
    }
    if let Some(rest) = text.strip_suffix("```") {
        text = rest.trim_end();
    }
    text
}

/// Parse a JSON array, or an object carrying a `responses` array.
pub fn parse_json(raw: &str) -> Result<Vec<Value>, SimulatorError> {
    let text = strip_code_fences(raw);
    let parsed: Value = serde_json::from_str(text)
        .map_err(|e| SimulatorError::MalformedResponse(format!("invalid JSON: {e}")))?;
    match parsed {
        Value::Array(items) => {
            debug!(count = items.len(), "parsed LLM response array");
            Ok(items)
        }
        Value::Object(mut map) => match map.remove("responses") {
            Some(Value::Array(items)) => {
                debug!(count = items.len(), "parsed LLM 'responses' array");
                Ok(items)
            }
            Some(other) => Err(SimulatorError::MalformedResponse(format!(
                "'responses' is not an array: {other}"
            ))),
            None => Err(SimulatorError::MalformedResponse(
                "object without a 'responses' key".to_string(),
            )),
        },
        other => Err(SimulatorError::MalformedResponse(format!(
            "unexpected JSON structure: {other}"
        ))),
    }
}

pub fn validate_response_count(responses: &[Value], expected: usize) -> Result<(), SimulatorError> {
    if responses.len() != expected {
        return Err(SimulatorError::CountMismatch {
            expected,
            actual: responses.len(),
        });
    }
    Ok(())
}

fn content_id_of(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Match responses to slate items by position and sanitize each one.
fn extract_content_responses(
    responses: &[Value],
    slate: &[Content],
) -> Result<Vec<UserResponse>, SimulatorError> {
    let mut result = Vec::with_capacity(slate.len());

    for (i, resp) in responses.iter().enumerate() {
        let Some(obj) = resp.as_object() else {
            warn!(index = i, response = %resp, "response is not an object, using default");
            if let Some(content) = slate.get(i) {
                result.push(UserResponse::ignored(content.id));
            }
            continue;
        };

        if obj.get("content_id").and_then(content_id_of).is_none() {
            return Err(SimulatorError::MalformedResponse(format!(
                "response {i} has no usable content_id"
            )));
        }
        let Some(content) = slate.get(i) else {
            continue;
        };

        let (clicked, dwell_time) = parse_single_response(obj, content.id);
        result.push(UserResponse {
            content_id: content.id,
            clicked,
            dwell_time,
        });
    }

    let answered: HashSet<u64> = result.iter().map(|r| r.content_id).collect();
    for content in slate {
        if !answered.contains(&content.id) {
            warn!(content_id = content.id, "no response for content, adding default");
            result.push(UserResponse::ignored(content.id));
        }
    }

    debug!(
        total = result.len(),
        clicked = result.iter().filter(|r| r.clicked).count(),
        "extracted LLM responses"
    );
    Ok(result)
}

fn parse_single_response(obj: &serde_json::Map<String, Value>, content_id: u64) -> (bool, u32) {
    let clicked = match obj.get("clicked") {
        None => false,
        Some(Value::Bool(b)) => *b,
        Some(other) => {
            warn!(content_id, value = %other, "invalid clicked value, using false");
            false
        }
    };

    let raw_dwell = obj
        .get("dwell_time_seconds")
        .or_else(|| obj.get("dwell_time"));
    let mut dwell = match raw_dwell {
        None => 0.0,
        Some(Value::Number(n)) => match n.as_f64() {
            Some(v) if v >= 0.0 => v,
            _ => {
                warn!(content_id, value = %n, "invalid dwell_time, using 0");
                0.0
            }
        },
        Some(other) => {
            warn!(content_id, value = %other, "invalid dwell_time, using 0");
            0.0
        }
    };

    if clicked && dwell == 0.0 {
        warn!(content_id, "clicked=true but dwell_time=0");
    }
    if !clicked && dwell > 0.0 {
        warn!(content_id, dwell, "clicked=false but dwell_time > 0, correcting to 0");
        dwell = 0.0;
    }

    (clicked, dwell as u32)
}
