//! Seeded xorshift32 generator used for every procedural choice in a scene.
//!
//! Star positions, texture speckles, orbit phases and explosion debris all
//! draw from the same stream, so a seed reproduces a scene exactly.

use std::f32::consts::TAU;

#[derive(Debug, Clone)]
pub struct SeededRandom {
    state: u32,
}

impl SeededRandom {
    /// Seed 0 would lock xorshift at zero forever, so it is remapped to 1.
    pub fn new(seed: u32) -> Self {
        Self {
            state: if seed == 0 { 1 } else { seed },
        }
    }

    /// Seeds from the wall clock; used when no seed is configured.
    pub fn from_clock() -> Self {
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|elapsed| elapsed.subsec_nanos() ^ elapsed.as_secs() as u32)
            .unwrap_or(1);
        Self::new(nanos)
    }

    pub fn next_u32(&mut self) -> u32 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.state = x;
        x
    }

    /// Uniform float in `[0, 1)`.
    pub fn next_f32(&mut self) -> f32 {
        // 24 random mantissa bits keep the result strictly below 1.0.
        (self.next_u32() >> 8) as f32 / (1u32 << 24) as f32
    }

    /// Uniform float in `[min, max)`.
    pub fn range(&mut self, min: f32, max: f32) -> f32 {
        min + self.next_f32() * (max - min)
    }

    /// Uniform float in `[-half, half)`, i.e. `(random - 0.5) * 2 * half`.
    pub fn spread(&mut self, half: f32) -> f32 {
        (self.next_f32() - 0.5) * 2.0 * half
    }

    pub fn chance(&mut self, probability: f32) -> bool {
        self.next_f32() < probability
    }

    /// Uniform angle in `[0, 2π)`.
    pub fn angle(&mut self) -> f32 {
        self.next_f32() * TAU
    }

    pub fn state(&self) -> u32 {
        self.state
    }
}

impl Default for SeededRandom {
    fn default() -> Self {
        Self::new(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_sequence() {
        let mut a = SeededRandom::new(2024);
        let mut b = SeededRandom::new(2024);
        for _ in 0..500 {
            assert_eq!(a.next_u32(), b.next_u32());
        }
    }

    #[test]
    fn floats_stay_in_unit_interval() {
        let mut rng = SeededRandom::new(7);
        for _ in 0..10_000 {
            let value = rng.next_f32();
            assert!((0.0..1.0).contains(&value));
        }
    }

    #[test]
    fn range_and_spread_bounds() {
        let mut rng = SeededRandom::new(99);
        for _ in 0..1000 {
            let r = rng.range(13.0, 16.0);
            assert!((13.0..16.0).contains(&r));
            let s = rng.spread(0.15);
            assert!((-0.15..0.15).contains(&s));
        }
    }

    #[test]
    fn zero_seed_is_remapped() {
        assert_eq!(SeededRandom::new(0).state(), 1);
    }
}
