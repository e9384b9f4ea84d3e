//! Mock data for chart previews and the model-performance screen.
//!
//! Generators that add noise take the RNG as a parameter so callers can seed
//! them for reproducible output.

use rand::Rng;

use crate::models::PerformanceMetrics;
use crate::mwd;

/// One point of the predicted vs. experimental comparison chart.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ComparisonPoint {
    pub mw: f64,
    pub predicted: f64,
    pub experimental: f64,
}

/// Training and validation loss for one epoch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LossPoint {
    pub epoch: u32,
    pub training: f64,
    pub validation: f64,
}

/// Sensitivity of the prediction to one input at three levels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sensitivity {
    pub param: &'static str,
    pub low: f64,
    pub med: f64,
    pub high: f64,
}

/// Predictions per day over the last ten days.
pub const RECENT_PREDICTIONS: [(u32, u64); 10] = [
    (1, 12),
    (2, 19),
    (3, 15),
    (4, 22),
    (5, 18),
    (6, 25),
    (7, 28),
    (8, 24),
    (9, 30),
    (10, 27),
];

/// Predictions per weekday.
pub const WEEKLY_PREDICTIONS: [(&str, u64); 7] = [
    ("Mon", 12),
    ("Tue", 19),
    ("Wed", 15),
    ("Thu", 22),
    ("Fri", 18),
    ("Sat", 8),
    ("Sun", 5),
];

/// Chain-length histogram buckets.
pub const CHAIN_LENGTH: [(&str, u64); 8] = [
    ("0-50", 120),
    ("50-100", 280),
    ("100-150", 450),
    ("150-200", 380),
    ("200-250", 220),
    ("250-300", 150),
    ("300-350", 80),
    ("350+", 40),
];

/// Relative prediction error histogram.
pub const ERROR_DISTRIBUTION: [(&str, u64); 6] = [
    ("0-1%", 15),
    ("1-2%", 22),
    ("2-3%", 18),
    ("3-4%", 12),
    ("4-5%", 8),
    ("5%+", 5),
];

/// Model accuracy by reactor type (flow reactors are not supported yet).
pub const PERFORMANCE_BY_TYPE: [(&str, u64); 2] = [("Batch", 94), ("Flow", 0)];

/// Feature importance of the forward model.
pub const FEATURE_IMPORTANCE: [(&str, f64); 5] = [
    ("Temperature", 0.92),
    ("Monomer Conc.", 0.85),
    ("Reaction Time", 0.78),
    ("Initiator Conc.", 0.65),
    ("Propagation Rate", 0.52),
];

pub const SENSITIVITY: [Sensitivity; 4] = [
    Sensitivity {
        param: "Temp",
        low: 0.2,
        med: 0.5,
        high: 0.9,
    },
    Sensitivity {
        param: "Monomer",
        low: 0.3,
        med: 0.6,
        high: 0.85,
    },
    Sensitivity {
        param: "Time",
        low: 0.4,
        med: 0.7,
        high: 0.8,
    },
    Sensitivity {
        param: "Initiator",
        low: 0.1,
        med: 0.3,
        high: 0.6,
    },
];

/// Headline metrics of the deployed model.
pub fn model_metrics() -> PerformanceMetrics {
    PerformanceMetrics {
        r2_score: 0.943,
        mse: 0.0023,
        mae: 0.038,
        rmse: 0.048,
        training_samples: 45,
        validation_samples: 12,
        epochs: 500,
        learning_rate: 0.001,
    }
}

/// Preview MWD with a synthetic experimental trace within ±10 % of the
/// prediction.
pub fn comparison_curve<R: Rng + ?Sized>(rng: &mut R) -> Vec<ComparisonPoint> {
    mwd::preview_curve()
        .into_iter()
        .map(|p| {
            let experimental = p.predicted * rng.gen_range(0.9..1.1);
            ComparisonPoint {
                mw: p.mw,
                predicted: p.predicted,
                experimental: (experimental * 10_000.0).round() / 10_000.0,
            }
        })
        .collect()
}

/// Fifty epochs of exponentially decaying loss with small positive noise.
pub fn training_history<R: Rng + ?Sized>(rng: &mut R) -> Vec<LossPoint> {
    (0..50)
        .map(|i| {
            let x = i as f64;
            LossPoint {
                epoch: i + 1,
                training: 0.5 * (-x * 0.05).exp() + 0.02 + rng.gen_range(0.0..0.02),
                validation: 0.55 * (-x * 0.045).exp() + 0.025 + rng.gen_range(0.0..0.03),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_comparison_curve_within_ten_percent() {
        let mut rng = StdRng::seed_from_u64(7);
        let curve = comparison_curve(&mut rng);
        assert_eq!(curve.len(), mwd::CURVE_POINTS);
        for p in curve {
            assert!(p.experimental <= p.predicted * 1.1 + 1e-4);
            assert!(p.experimental >= p.predicted * 0.9 - 1e-4);
        }
    }

    #[test]
    fn test_training_history_decreases_overall() {
        let mut rng = StdRng::seed_from_u64(42);
        let history = training_history(&mut rng);
        assert_eq!(history.len(), 50);
        assert_eq!(history[0].epoch, 1);
        assert_eq!(history[49].epoch, 50);
        assert!(history[0].training > history[49].training);
        assert!(history[0].validation > history[49].validation);
    }

    #[test]
    fn test_seeded_generators_are_reproducible() {
        let a = training_history(&mut StdRng::seed_from_u64(1));
        let b = training_history(&mut StdRng::seed_from_u64(1));
        assert_eq!(a, b);
    }

    #[test]
    fn test_model_metrics_values() {
        let m = model_metrics();
        assert!((m.r2_score - 0.943).abs() < 1e-12);
        assert_eq!(m.training_samples + m.validation_samples, 57);
    }

    #[test]
    fn test_error_distribution_total() {
        let total: u64 = ERROR_DISTRIBUTION.iter().map(|(_, c)| c).sum();
        assert_eq!(total, 80);
    }
}
