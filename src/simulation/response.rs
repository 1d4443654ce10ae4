use rand::rngs::StdRng;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::env::Content;
use crate::error::SimulatorError;

pub const PERSONA_COUNT: u32 = 100;

/// Simulated-user profile driving the response simulator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Persona {
    pub id: u32,
}

impl Persona {
    /// Use the configured persona, or draw one uniformly from `1..=100`.
    pub fn resolve(persona_id: Option<u32>, rng: &mut StdRng) -> Self {
        let id = persona_id.unwrap_or_else(|| rng.random_range(1..=PERSONA_COUNT));
        Persona { id }
    }
}

/// The simulated user's reaction to one recommended item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserResponse {
    pub content_id: u64,
    pub clicked: bool,
    /// Seconds; always 0 when not clicked.
    pub dwell_time: u32,
}

impl UserResponse {
    pub fn ignored(content_id: u64) -> Self {
        UserResponse {
            content_id,
            clicked: false,
            dwell_time: 0,
        }
    }
}

/// Source of simulated user behavior.
///
/// Implementations return exactly one response per slate item, in slate order.
pub trait ResponseSimulator {
    fn name(&self) -> &str;

    fn simulate(
        &mut self,
        persona: &Persona,
        slate: &[Content],
    ) -> Result<Vec<UserResponse>, SimulatorError>;
}
