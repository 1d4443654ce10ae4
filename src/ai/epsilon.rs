/// Multiplicative per-episode epsilon decay, floored at `min`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EpsilonSchedule {
    pub start: f32,
    pub min: f32,
    pub decay: f32,
}

impl EpsilonSchedule {
    pub fn new(start: f32, min: f32, decay: f32) -> Self {
        EpsilonSchedule { start, min, decay }
    }

    /// Epsilon after `episode` completed episodes: `max(min, start * decay^episode)`.
    pub fn value_at(&self, episode: usize) -> f32 {
        (self.start * self.decay.powf(episode as f32)).max(self.min)
    }
}
