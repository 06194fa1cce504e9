use std::sync::atomic::{AtomicU32, Ordering};

const STEP: u32 = 0x6d2b79f5;

/// Shared mulberry32 stream; natives holding it stay `Send + Sync`.
#[derive(Debug)]
pub(crate) struct RandomStream {
    state: AtomicU32,
}

impl RandomStream {
    pub(crate) fn new(seed: u32) -> Self {
        Self {
            state: AtomicU32::new(seed),
        }
    }

    pub(crate) fn next_u32(&self) -> u32 {
        let next = self.state.fetch_add(STEP, Ordering::Relaxed).wrapping_add(STEP);
        mix(next)
    }

    pub(crate) fn next_bounded(&self, bound: u32) -> u32 {
        next_bounded_with(bound, || self.next_u32())
    }
}

fn mix(mut next: u32) -> u32 {
    next = (next ^ (next >> 15)).wrapping_mul(next | 1);
    next ^= next.wrapping_add((next ^ (next >> 7)).wrapping_mul(next | 61));
    next ^ (next >> 14)
}

fn next_bounded_with<F>(bound: u32, mut next: F) -> u32
where
    F: FnMut() -> u32,
{
    let threshold = (u64::from(u32::MAX) + 1) / u64::from(bound) * u64::from(bound);
    let mut candidate = next();
    while u64::from(candidate) >= threshold {
        candidate = next();
    }
    candidate % bound
}

#[cfg(test)]
mod rng_tests {
    use super::*;

    #[test]
    fn bounded_draws_retry_above_threshold() {
        let mut values = vec![u32::MAX, 42u32].into_iter();
        let result = next_bounded_with(10, || {
            values.next().expect("test values should be available")
        });
        assert_eq!(result, 2);
    }

    #[test]
    fn equal_seeds_give_equal_streams() {
        let a = RandomStream::new(7);
        let b = RandomStream::new(7);
        let first: Vec<u32> = (0..4).map(|_| a.next_u32()).collect();
        let second: Vec<u32> = (0..4).map(|_| b.next_u32()).collect();
        assert_eq!(first, second);
        assert!(a.next_bounded(3) < 3);
    }
}
