use rand::Rng;
use rand_distr::{Beta, Exp1, Gamma, StandardNormal, Triangular, Weibull};

use crate::api::recipe_dto::{DistributionDto, DistributionSpecDto};
use crate::error::{Error, Result};

/// A fitted distribution, in scipy naming and parameter order.
///
/// Draws live on the normalized unit scale the recipes were fitted on; [`DistributionSpec`] maps them onto the
/// recipe's `[min, max]` bounds.
#[derive(Debug, Clone, PartialEq)]
pub enum Distribution {
    Uniform { loc: f64, scale: f64 },
    Norm { loc: f64, scale: f64 },
    LogNorm { s: f64, loc: f64, scale: f64 },
    Expon { loc: f64, scale: f64 },
    Gamma { a: f64, loc: f64, scale: f64 },
    Beta { a: f64, b: f64, loc: f64, scale: f64 },
    Triang { c: f64, loc: f64, scale: f64 },
    WeibullMin { c: f64, loc: f64, scale: f64 },
}

impl Distribution {
    pub fn draw<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<f64> {
        let value = match *self {
            Distribution::Uniform { loc, scale } => loc + scale * rng.random::<f64>(),
            Distribution::Norm { loc, scale } => {
                let z: f64 = rng.sample(StandardNormal);
                loc + scale * z
            }
            Distribution::LogNorm { s, loc, scale } => {
                let z: f64 = rng.sample(StandardNormal);
                loc + scale * (s * z).exp()
            }
            Distribution::Expon { loc, scale } => {
                let e: f64 = rng.sample(Exp1);
                loc + scale * e
            }
            Distribution::Gamma { a, loc, scale } => {
                let gamma = Gamma::new(a, 1.0).map_err(|e| invalid("gamma", e))?;
                loc + scale * rng.sample(gamma)
            }
            Distribution::Beta { a, b, loc, scale } => {
                let beta = Beta::new(a, b).map_err(|e| invalid("beta", e))?;
                loc + scale * rng.sample(beta)
            }
            Distribution::Triang { c, loc, scale } => {
                let triangular = Triangular::new(loc, loc + scale, loc + c * scale).map_err(|e| invalid("triang", e))?;
                rng.sample(triangular)
            }
            Distribution::WeibullMin { c, loc, scale } => {
                let weibull = Weibull::new(scale, c).map_err(|e| invalid("weibull_min", e))?;
                loc + rng.sample(weibull)
            }
        };
        Ok(value)
    }
}

fn invalid(name: &str, e: impl std::fmt::Display) -> Error {
    Error::ConfigurationError(format!("Invalid parameters for distribution '{}': {}", name, e))
}

impl TryFrom<&DistributionDto> for Distribution {
    type Error = Error;

    fn try_from(dto: &DistributionDto) -> Result<Self> {
        let expected = match dto.name.as_str() {
            "uniform" | "norm" | "expon" => 2,
            "lognorm" | "gamma" | "triang" | "weibull_min" => 3,
            "beta" => 4,
            other => return Err(Error::ConfigurationError(format!("Unknown distribution '{}'", other))),
        };
        if dto.params.len() != expected {
            return Err(Error::ConfigurationError(format!(
                "Distribution '{}' takes {} parameters, got {}",
                dto.name,
                expected,
                dto.params.len()
            )));
        }

        let p = &dto.params;
        let scale = p[expected - 1];
        if !(scale > 0.0) {
            return Err(invalid(&dto.name, format!("scale must be positive, got {}", scale)));
        }

        let distribution = match dto.name.as_str() {
            "uniform" => Distribution::Uniform { loc: p[0], scale },
            "norm" => Distribution::Norm { loc: p[0], scale },
            "expon" => Distribution::Expon { loc: p[0], scale },
            "lognorm" => Distribution::LogNorm { s: p[0], loc: p[1], scale },
            "gamma" => Distribution::Gamma { a: p[0], loc: p[1], scale },
            "triang" => Distribution::Triang { c: p[0], loc: p[1], scale },
            "weibull_min" => Distribution::WeibullMin { c: p[0], loc: p[1], scale },
            _ => Distribution::Beta { a: p[0], b: p[1], loc: p[2], scale },
        };

        // Surface shape errors at load time rather than on the first draw.
        distribution.draw(&mut rand::rng())?;
        Ok(distribution)
    }
}

/// A distribution bounded by `[min, max]`; without a distribution draws are uniform over the bounds.
#[derive(Debug, Clone, PartialEq)]
pub struct DistributionSpec {
    pub distribution: Option<Distribution>,
    pub min: f64,
    pub max: f64,
}

impl DistributionSpec {
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<f64> {
        if self.min == self.max {
            return Ok(self.min);
        }

        match &self.distribution {
            None => Ok(rng.random_range(self.min..=self.max)),
            Some(distribution) => {
                let unit = distribution.draw(rng)?;
                let value = self.min + unit * (self.max - self.min);
                Ok(value.clamp(self.min, self.max))
            }
        }
    }
}

impl TryFrom<&DistributionSpecDto> for DistributionSpec {
    type Error = Error;

    fn try_from(dto: &DistributionSpecDto) -> Result<Self> {
        if !dto.min.is_finite() || !dto.max.is_finite() || dto.min > dto.max {
            return Err(Error::ConfigurationError(format!("Invalid bounds [{}, {}]", dto.min, dto.max)));
        }

        let distribution = dto.distribution.as_ref().map(Distribution::try_from).transpose()?;
        Ok(DistributionSpec { distribution, min: dto.min, max: dto.max })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn dto(name: &str, params: &[f64]) -> DistributionDto {
        DistributionDto { name: name.to_string(), params: params.to_vec() }
    }

    #[test]
    fn test_all_supported_names_parse() {
        for (name, params) in [
            ("uniform", vec![0.0, 1.0]),
            ("norm", vec![0.5, 0.1]),
            ("expon", vec![0.0, 0.2]),
            ("lognorm", vec![0.5, 0.0, 0.3]),
            ("gamma", vec![2.0, 0.0, 0.1]),
            ("triang", vec![0.5, 0.0, 1.0]),
            ("weibull_min", vec![1.5, 0.0, 0.3]),
            ("beta", vec![2.0, 5.0, 0.0, 1.0]),
        ] {
            assert!(Distribution::try_from(&dto(name, &params)).is_ok(), "{} should parse", name);
        }
    }

    #[test]
    fn test_unknown_name_and_wrong_arity_are_rejected() {
        assert!(matches!(Distribution::try_from(&dto("levy_stable", &[1.0, 0.0])), Err(Error::ConfigurationError(_))));
        assert!(matches!(Distribution::try_from(&dto("beta", &[1.0, 0.0])), Err(Error::ConfigurationError(_))));
        assert!(matches!(Distribution::try_from(&dto("gamma", &[-1.0, 0.0, 1.0])), Err(Error::ConfigurationError(_))));
        assert!(matches!(Distribution::try_from(&dto("norm", &[0.0, 0.0])), Err(Error::ConfigurationError(_))));
    }

    #[test]
    fn test_samples_stay_within_bounds() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let spec = DistributionSpec {
            distribution: Some(Distribution::Norm { loc: 0.5, scale: 2.0 }),
            min: 10.0,
            max: 20.0,
        };
        for _ in 0..1000 {
            let value = spec.sample(&mut rng).unwrap();
            assert!((10.0..=20.0).contains(&value));
        }
    }

    #[test]
    fn test_degenerate_bounds_return_min() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let spec = DistributionSpec { distribution: None, min: 3.0, max: 3.0 };
        assert_eq!(spec.sample(&mut rng).unwrap(), 3.0);
    }

    #[test]
    fn test_inverted_bounds_are_rejected() {
        let spec = DistributionSpecDto { distribution: None, min: 5.0, max: 1.0 };
        assert!(matches!(DistributionSpec::try_from(&spec), Err(Error::ConfigurationError(_))));
    }
}
