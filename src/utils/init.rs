use rand::{rngs::StdRng, Rng, SeedableRng};

/// A deterministic source of initial parameter values.
///
/// Parameters are drawn on the host from a seeded `StdRng` instead of the backend's global
/// generator, so the same seed always yields the same model, regardless of which backend or
/// thread builds it.
#[derive(Debug)]
pub struct Initializer {
    rng: StdRng,
}

impl Initializer {
    /// Create an initializer from a seed
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Draw `len` values uniformly from `[-bound, bound)`
    pub fn uniform(&mut self, len: usize, bound: f32) -> Vec<f32> {
        if bound <= 0.0 {
            return vec![0.0; len];
        }

        (0..len).map(|_| self.rng.gen_range(-bound..bound)).collect()
    }

    /// `len` copies of `value`
    pub fn constant(&mut self, len: usize, value: f32) -> Vec<f32> {
        vec![value; len]
    }
}
