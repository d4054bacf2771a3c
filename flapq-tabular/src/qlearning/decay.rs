//! Learning-rate schedules.
use serde::{Deserialize, Serialize};

/// How the learning rate shrinks with the number of episodes.
///
/// The rate is a function of the initial rate and the episode counter only, so a
/// resumed training session continues the schedule where it stopped. No schedule
/// goes below its floor.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub enum LrDecay {
    /// The learning rate never changes.
    Constant,

    /// `alpha0 - rate * episode`.
    Linear {
        /// Decrease per episode.
        rate: f64,

        /// Lowest learning rate.
        floor: f64,
    },

    /// `alpha0 / (1 + rate * episode)`.
    Hyperbolic {
        /// Decay constant.
        rate: f64,

        /// Lowest learning rate.
        floor: f64,
    },
}

impl Default for LrDecay {
    fn default() -> Self {
        LrDecay::Linear {
            rate: 1e-5,
            floor: 0.1,
        }
    }
}

impl LrDecay {
    /// Learning rate after `episode` episodes.
    pub fn alpha(&self, alpha0: f64, episode: usize) -> f64 {
        let n = episode as f64;
        match *self {
            LrDecay::Constant => alpha0,
            LrDecay::Linear { rate, floor } => (alpha0 - rate * n).max(floor.min(alpha0)),
            LrDecay::Hyperbolic { rate, floor } => {
                (alpha0 / (1.0 + rate * n)).max(floor.min(alpha0))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linear_reaches_floor() {
        let decay = LrDecay::Linear {
            rate: 0.1,
            floor: 0.1,
        };
        assert_eq!(decay.alpha(0.7, 0), 0.7);
        assert!((decay.alpha(0.7, 3) - 0.4).abs() < 1e-12);
        assert_eq!(decay.alpha(0.7, 6), 0.1);
        assert_eq!(decay.alpha(0.7, 1_000_000), 0.1);
    }

    #[test]
    fn test_never_below_floor() {
        let schedules = [
            LrDecay::default(),
            LrDecay::Linear {
                rate: 0.05,
                floor: 0.1,
            },
            LrDecay::Hyperbolic {
                rate: 0.5,
                floor: 0.1,
            },
        ];
        for decay in schedules.iter() {
            for episode in (0..2_000_000).step_by(997) {
                assert!(decay.alpha(0.7, episode) >= 0.1);
            }
        }
    }

    #[test]
    fn test_hyperbolic() {
        let decay = LrDecay::Hyperbolic {
            rate: 1.0,
            floor: 0.1,
        };
        assert!((decay.alpha(0.8, 1) - 0.4).abs() < 1e-12);
        assert_eq!(decay.alpha(0.8, 100), 0.1);
        assert_eq!(LrDecay::Constant.alpha(0.8, 100), 0.8);
    }
}
