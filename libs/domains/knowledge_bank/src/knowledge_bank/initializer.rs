use rand::Rng;

use crate::models::InitializerConfig;

impl InitializerConfig {
    /// Fresh vector of `dimension` values for a key seen for the first time.
    pub fn initialize(&self, dimension: usize) -> Vec<f32> {
        match *self {
            InitializerConfig::Zero => vec![0.0; dimension],
            InitializerConfig::RandomUniform { low, high } if low < high => {
                let mut rng = rand::rng();
                (0..dimension).map(|_| rng.random_range(low..high)).collect()
            }
            // Degenerate range, validated away for configs that came over the wire
            InitializerConfig::RandomUniform { low, .. } => vec![low; dimension],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_initializer() {
        assert_eq!(InitializerConfig::Zero.initialize(3), vec![0.0; 3]);
    }

    #[test]
    fn test_random_uniform_within_bounds() {
        let init = InitializerConfig::RandomUniform {
            low: -0.25,
            high: 0.25,
        };
        let v = init.initialize(256);
        assert_eq!(v.len(), 256);
        assert!(v.iter().all(|x| (-0.25..0.25).contains(x)));
    }

    #[test]
    fn test_degenerate_range_does_not_panic() {
        let init = InitializerConfig::RandomUniform { low: 1.0, high: 1.0 };
        assert_eq!(init.initialize(2), vec![1.0, 1.0]);
    }
}
