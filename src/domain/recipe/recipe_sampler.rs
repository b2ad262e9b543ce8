use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use uuid::Uuid;

use crate::domain::recipe::distribution::DistributionSpec;
use crate::error::Result;

/// Draws runtimes, file sizes and file identifiers for the task builder.
///
/// Seeded samplers are fully reproducible, including the generated file names.
#[derive(Debug, Clone)]
pub struct RecipeSampler {
    rng: ChaCha8Rng,
}

impl RecipeSampler {
    pub fn new() -> Self {
        RecipeSampler { rng: ChaCha8Rng::from_rng(&mut rand::rng()) }
    }

    pub fn seeded(seed: u64) -> Self {
        RecipeSampler { rng: ChaCha8Rng::seed_from_u64(seed) }
    }

    pub fn sample(&mut self, spec: &DistributionSpec) -> Result<f64> {
        spec.sample(&mut self.rng)
    }

    /// Runtime in seconds, rounded to milliseconds and never negative.
    pub fn sample_runtime(&mut self, spec: &DistributionSpec) -> Result<f64> {
        let runtime = self.sample(spec)?.max(0.0);
        Ok((runtime * 1000.0).round() / 1000.0)
    }

    /// File size in bytes (truncated, never negative).
    pub fn sample_size(&mut self, spec: &DistributionSpec) -> Result<u64> {
        Ok(self.sample(spec)?.max(0.0) as u64)
    }

    pub fn random_uuid(&mut self) -> Uuid {
        let mut bytes = [0u8; 16];
        self.rng.fill(&mut bytes[..]);
        uuid::Builder::from_random_bytes(bytes).into_uuid()
    }
}

impl Default for RecipeSampler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::recipe::distribution::Distribution;

    fn spec(min: f64, max: f64) -> DistributionSpec {
        DistributionSpec { distribution: Some(Distribution::Uniform { loc: 0.0, scale: 1.0 }), min, max }
    }

    #[test]
    fn test_seeded_samplers_agree() {
        let mut first = RecipeSampler::seeded(42);
        let mut second = RecipeSampler::seeded(42);

        for _ in 0..10 {
            assert_eq!(first.sample(&spec(0.0, 100.0)).unwrap(), second.sample(&spec(0.0, 100.0)).unwrap());
        }
        assert_eq!(first.random_uuid(), second.random_uuid());
    }

    #[test]
    fn test_runtime_has_millisecond_precision() {
        let mut sampler = RecipeSampler::seeded(1);
        let runtime = sampler.sample_runtime(&spec(1.0, 2.0)).unwrap();
        assert!((1.0..=2.0).contains(&runtime));
        assert_eq!((runtime * 1000.0).round() / 1000.0, runtime);
    }

    #[test]
    fn test_uuid_is_version_4() {
        let mut sampler = RecipeSampler::seeded(3);
        assert_eq!(sampler.random_uuid().get_version_num(), 4);
    }
}
