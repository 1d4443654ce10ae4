use rand::rngs::StdRng;
use rand::Rng;
use rand::SeedableRng;

use super::response::{Persona, ResponseSimulator, UserResponse};
use crate::env::Content;
use crate::error::SimulatorError;

/// Clicks each item independently with a fixed probability.
pub struct RandomResponseSimulator {
    click_probability: f64,
    rng: StdRng,
}

impl RandomResponseSimulator {
    pub fn new(click_probability: f64, seed: u64) -> Self {
        RandomResponseSimulator {
            click_probability,
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl ResponseSimulator for RandomResponseSimulator {
    fn name(&self) -> &str {
        "random"
    }

    fn simulate(
        &mut self,
        _persona: &Persona,
        slate: &[Content],
    ) -> Result<Vec<UserResponse>, SimulatorError> {
        Ok(slate
            .iter()
            .map(|content| {
                let clicked = self.rng.random_bool(self.click_probability);
                UserResponse {
                    content_id: content.id,
                    clicked,
                    dwell_time: if clicked {
                        self.rng.random_range(60..=600)
                    } else {
                        0
                    },
                }
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slate(n: u64) -> Vec<Content> {
        (1..=n)
            .map(|id| Content {
                id,
                content_type: "news".to_string(),
                embedding: vec![0.0; 4],
            })
            .collect()
    }

    #[test]
    fn test_one_response_per_item_in_order() {
        let mut sim = RandomResponseSimulator::new(0.5, 1);
        let responses = sim.simulate(&Persona { id: 1 }, &slate(5)).unwrap();
        let ids: Vec<u64> = responses.iter().map(|r| r.content_id).collect();
        assert_eq!(ids, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_dwell_bounds() {
        let mut sim = RandomResponseSimulator::new(0.5, 2);
        for _ in 0..50 {
            for resp in sim.simulate(&Persona { id: 1 }, &slate(10)).unwrap() {
                if resp.clicked {
                    assert!((60..=600).contains(&resp.dwell_time));
                } else {
                    assert_eq!(resp.dwell_time, 0);
                }
            }
        }
    }

    #[test]
    fn test_extreme_probabilities() {
        let mut never = RandomResponseSimulator::new(0.0, 3);
        assert!(never
            .simulate(&Persona { id: 1 }, &slate(20))
            .unwrap()
            .iter()
            .all(|r| !r.clicked));

        let mut always = RandomResponseSimulator::new(1.0, 3);
        assert!(always
            .simulate(&Persona { id: 1 }, &slate(20))
            .unwrap()
            .iter()
            .all(|r| r.clicked));
    }

    #[test]
    fn test_same_seed_same_responses() {
        let mut a = RandomResponseSimulator::new(0.3, 9);
        let mut b = RandomResponseSimulator::new(0.3, 9);
        let persona = Persona { id: 4 };
        assert_eq!(
            a.simulate(&persona, &slate(8)).unwrap(),
            b.simulate(&persona, &slate(8)).unwrap()
        );
    }
}
