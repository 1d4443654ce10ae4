use rand::rngs::StdRng;
use rand_distr::{Distribution, StandardNormal};

use super::content::Content;

/// Produces and evolves the user-state vector the agent conditions on.
pub trait StateEmbedder {
    fn dim(&self) -> usize;

    /// Draw a fresh user state at episode start.
    fn initial_state(&self, rng: &mut StdRng) -> Vec<f32>;

    /// Fold the contents the user clicked into the next state.
    fn update(&self, state: &[f32], clicked: &[&Content]) -> Vec<f32>;
}

/// Moves the user state a fixed fraction toward the mean of clicked embeddings.
#[derive(Debug, Clone)]
pub struct DriftEmbedder {
    user_dim: usize,
    update_rate: f32,
}

impl DriftEmbedder {
    pub fn new(user_dim: usize, update_rate: f32) -> Self {
        DriftEmbedder {
            user_dim,
            update_rate,
        }
    }
}

impl StateEmbedder for DriftEmbedder {
    fn dim(&self) -> usize {
        self.user_dim
    }

    fn initial_state(&self, rng: &mut StdRng) -> Vec<f32> {
        unit_gaussian(self.user_dim, rng)
    }

    fn update(&self, state: &[f32], clicked: &[&Content]) -> Vec<f32> {
        if clicked.is_empty() {
            return state.to_vec();
        }
        let mut mean = vec![0.0f32; self.user_dim];
        for content in clicked {
            for (m, v) in mean.iter_mut().zip(project(&content.embedding, self.user_dim)) {
                *m += v;
            }
        }
        let n = clicked.len() as f32;
        let mixed: Vec<f32> = state
            .iter()
            .zip(&mean)
            .map(|(s, m)| (1.0 - self.update_rate) * s + self.update_rate * (m / n))
            .collect();
        normalize(mixed)
    }
}

/// Truncate or zero-pad an embedding to `dim`.
pub fn project(embedding: &[f32], dim: usize) -> Vec<f32> {
    let mut out: Vec<f32> = embedding.iter().copied().take(dim).collect();
    out.resize(dim, 0.0);
    out
}

fn normalize(mut v: Vec<f32>) -> Vec<f32> {
    let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > f32::EPSILON {
        v.iter_mut().for_each(|x| *x /= norm);
    }
    v
}

fn unit_gaussian(dim: usize, rng: &mut StdRng) -> Vec<f32> {
    normalize(
        (0..dim)
            .map(|_| Distribution::<f32>::sample(&StandardNormal, rng))
            .collect(),
    )
}

/// Build a synthetic catalog of `per_type` items for each content type.
pub fn random_catalog(
    content_types: &[String],
    per_type: usize,
    content_dim: usize,
    rng: &mut StdRng,
) -> Vec<Content> {
    let mut catalog = Vec::with_capacity(content_types.len() * per_type);
    for ctype in content_types {
        for _ in 0..per_type {
            catalog.push(Content {
                id: catalog.len() as u64 + 1,
                content_type: ctype.clone(),
                embedding: unit_gaussian(content_dim, rng),
            });
        }
    }
    catalog
}
