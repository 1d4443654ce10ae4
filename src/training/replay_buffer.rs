use rand::rngs::StdRng;
use rand::seq::index;
use rand::SeedableRng;

/// Fixed-capacity ring buffer for storing training transitions.
pub struct ReplayBuffer<T> {
    buffer: Vec<T>,
    capacity: usize,
    position: usize,
    len: usize,
    rng: StdRng,
}

impl<T: Clone> ReplayBuffer<T> {
    pub fn new(capacity: usize) -> Self {
        Self::with_rng(capacity, StdRng::from_os_rng())
    }

    pub fn with_seed(capacity: usize, seed: u64) -> Self {
        Self::with_rng(capacity, StdRng::seed_from_u64(seed))
    }

    fn with_rng(capacity: usize, rng: StdRng) -> Self {
        assert!(capacity > 0, "replay capacity must be positive");
        ReplayBuffer {
            buffer: Vec::with_capacity(capacity),
            capacity,
            position: 0,
            len: 0,
            rng,
        }
    }

    /// Add an item to the buffer. Overwrites the oldest when full.
    pub fn push(&mut self, item: T) {
        if self.buffer.len() < self.capacity {
            self.buffer.push(item);
        } else {
            self.buffer[self.position] = item;
        }
        self.position = (self.position + 1) % self.capacity;
        if self.len < self.capacity {
            self.len += 1;
        }
    }

    /// Sample a batch uniformly without replacement.
    pub fn sample(&mut self, batch_size: usize) -> Vec<T> {
        let mut out = Vec::with_capacity(batch_size);
        self.sample_into(batch_size, &mut out);
        out
    }

    /// Sample into a pre-allocated Vec. Clears `out` first.
    pub fn sample_into(&mut self, batch_size: usize, out: &mut Vec<T>) {
        assert!(batch_size <= self.len, "Not enough experiences to sample");
        let indices = index::sample(&mut self.rng, self.len, batch_size);
        out.clear();
        out.extend(indices.iter().map(|i| self.buffer[i].clone()));
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Iterate oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        let start = if self.len < self.capacity { 0 } else { self.position };
        (0..self.len).map(move |i| &self.buffer[(start + i) % self.capacity])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::HashSet;

    #[test]
    fn test_push_and_len() {
        let mut buf = ReplayBuffer::new(10);
        assert!(buf.is_empty());

        buf.push(0u32);
        assert_eq!(buf.len(), 1);

        for i in 1..10 {
            buf.push(i);
        }
        assert_eq!(buf.len(), 10);
        assert_eq!(buf.capacity(), 10);
    }

    #[test]
    fn test_ring_buffer_evicts_oldest() {
        let mut buf = ReplayBuffer::new(5);
        for i in 0..8u32 {
            buf.push(i);
        }
        assert_eq!(buf.len(), 5);
        let kept: Vec<u32> = buf.iter().copied().collect();
        assert_eq!(kept, vec![3, 4, 5, 6, 7]);
    }

    #[test]
    fn test_sample_distinct() {
        let mut buf = ReplayBuffer::with_seed(100, 7);
        for i in 0..50u32 {
            buf.push(i);
        }
        let batch = buf.sample(10);
        assert_eq!(batch.len(), 10);
        let unique: HashSet<u32> = batch.into_iter().collect();
        assert_eq!(unique.len(), 10);
    }

    #[test]
    fn test_seeded_sampling_is_reproducible() {
        let mut a = ReplayBuffer::with_seed(20, 42);
        let mut b = ReplayBuffer::with_seed(20, 42);
        for i in 0..20u32 {
            a.push(i);
            b.push(i);
        }
        assert_eq!(a.sample(5), b.sample(5));
    }

    #[test]
    fn test_sample_into_clears() {
        let mut buf = ReplayBuffer::with_seed(10, 1);
        for i in 0..10u32 {
            buf.push(i);
        }
        let mut out = vec![99, 98, 97, 96];
        buf.sample_into(2, &mut out);
        assert_eq!(out.len(), 2);
        assert!(out.iter().all(|&v| v < 10));
    }

    #[test]
    #[should_panic(expected = "Not enough experiences")]
    fn test_sample_too_many() {
        let mut buf = ReplayBuffer::new(10);
        buf.push(1u8);
        buf.sample(5);
    }

    proptest! {
        #[test]
        fn prop_len_never_exceeds_capacity(capacity in 1usize..32, pushes in 0usize..100) {
            let mut buf = ReplayBuffer::with_seed(capacity, 0);
            for i in 0..pushes {
                buf.push(i);
            }
            prop_assert_eq!(buf.len(), pushes.min(capacity));
            let kept: Vec<usize> = buf.iter().copied().collect();
            let expected: Vec<usize> = (pushes.saturating_sub(capacity)..pushes).collect();
            prop_assert_eq!(kept, expected);
        }
    }
}
