//! Molecular-weight-distribution curve synthesis.
//!
//! Curves are sampled on a fixed log-spaced molecular-weight grid and are
//! normalised so the peak weight fraction is 1.0.

use crate::models::{MwdPoint, PredictionOutputs};

/// Number of samples per curve.
pub const CURVE_POINTS: usize = 50;
/// `log10` of the first sampled molecular weight.
pub const LOG_MW_START: f64 = 2.0;
/// Spacing of the grid in decades.
pub const LOG_MW_STEP: f64 = 0.08;

/// Peak of the preview curve shown before any prediction exists.
pub const PREVIEW_PEAK_MW: f64 = 100_000.0;
/// Width of the preview curve in decades.
pub const PREVIEW_SIGMA: f64 = 0.5;

const MIN_SIGMA: f64 = 0.05;
const MAX_SIGMA: f64 = 1.5;

/// Molecular weight of grid sample `index`.
pub fn grid_mw(index: usize) -> f64 {
    10_f64.powf(LOG_MW_START + index as f64 * LOG_MW_STEP)
}

/// Gaussian in `log10(M)` centred on `peak_mw` with width `sigma` decades.
///
/// Molecular weights are rounded to whole g/mol and fractions to four
/// decimals, matching what the result tables and exports print.
pub fn log_normal_curve(peak_mw: f64, sigma: f64) -> Vec<MwdPoint> {
    let log_peak = peak_mw.log10();
    (0..CURVE_POINTS)
        .map(|i| {
            let mw = grid_mw(i);
            let d = mw.log10() - log_peak;
            let predicted = (-(d * d) / (2.0 * sigma * sigma)).exp();
            MwdPoint {
                mw: mw.round(),
                predicted: (predicted * 10_000.0).round() / 10_000.0,
            }
        })
        .collect()
}

/// The fixed curve used for chart previews.
pub fn preview_curve() -> Vec<MwdPoint> {
    log_normal_curve(PREVIEW_PEAK_MW, PREVIEW_SIGMA)
}

/// Build a curve from predicted averages.
///
/// Uses `mw` as the peak and the dispersity `mw / mn` for the width
/// (`ln(Đ) = σ²` for a log-normal distribution). Falls back to the
/// preview curve when either average is missing or not physical.
pub fn curve_from_outputs(outputs: &PredictionOutputs) -> Vec<MwdPoint> {
    match (outputs.get("mn"), outputs.get("mw")) {
        (Some(mn), Some(mw)) if mn > 0.0 && mw >= mn && mw.is_finite() => {
            let dispersity = mw / mn;
            let sigma = (dispersity.ln().sqrt() / std::f64::consts::LN_10).clamp(MIN_SIGMA, MAX_SIGMA);
            log_normal_curve(mw, sigma)
        }
        _ => preview_curve(),
    }
}

/// Highest point of a curve.
pub fn peak(points: &[MwdPoint]) -> Option<MwdPoint> {
    points
        .iter()
        .copied()
        .max_by(|a, b| a.predicted.total_cmp(&b.predicted))
}

/// Full width at half maximum of a curve, in decades of molecular weight.
///
/// Returns `None` for empty curves or curves with no positive fraction.
pub fn half_max_width_decades(points: &[MwdPoint]) -> Option<f64> {
    let top = peak(points)?;
    if top.predicted <= 0.0 {
        return None;
    }
    let half = top.predicted / 2.0;
    let above: Vec<f64> = points
        .iter()
        .filter(|p| p.predicted >= half && p.mw > 0.0)
        .map(|p| p.mw.log10())
        .collect();
    let lo = above.iter().copied().fold(f64::INFINITY, f64::min);
    let hi = above.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    Some((hi - lo).max(0.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::OutputValue;

    fn outputs(mn: f64, mw: f64) -> PredictionOutputs {
        PredictionOutputs {
            fields: vec![
                OutputValue {
                    name: "mn".to_string(),
                    value: mn,
                },
                OutputValue {
                    name: "mw".to_string(),
                    value: mw,
                },
            ],
            confidence: 0.9,
        }
    }

    #[test]
    fn test_grid_spans_expected_range() {
        assert!((grid_mw(0) - 100.0).abs() < 1e-9);
        // 2 + 49 * 0.08 = 5.92
        assert!((grid_mw(CURVE_POINTS - 1).log10() - 5.92).abs() < 1e-9);
    }

    #[test]
    fn test_preview_curve_peaks_near_1e5() {
        let curve = preview_curve();
        assert_eq!(curve.len(), CURVE_POINTS);
        let top = peak(&curve).unwrap();
        assert!((top.mw.log10() - 5.0).abs() <= LOG_MW_STEP);
        assert!(top.predicted > 0.99);
    }

    #[test]
    fn test_curve_values_bounded() {
        for p in preview_curve() {
            assert!((0.0..=1.0).contains(&p.predicted));
            assert_eq!(p.mw, p.mw.round());
        }
    }

    #[test]
    fn test_curve_from_outputs_centres_on_mw() {
        let curve = curve_from_outputs(&outputs(10_000.0, 20_000.0));
        let top = peak(&curve).unwrap();
        assert!((top.mw.log10() - 20_000_f64.log10()).abs() <= LOG_MW_STEP);
    }

    #[test]
    fn test_higher_dispersity_gives_wider_curve() {
        let narrow = half_max_width_decades(&curve_from_outputs(&outputs(10_000.0, 11_000.0))).unwrap();
        let wide = half_max_width_decades(&curve_from_outputs(&outputs(10_000.0, 40_000.0))).unwrap();
        assert!(wide > narrow, "wide={wide} narrow={narrow}");
    }

    #[test]
    fn test_curve_from_outputs_falls_back_without_averages() {
        let curve = curve_from_outputs(&PredictionOutputs::default());
        assert_eq!(curve, preview_curve());

        // mw < mn is not physical.
        let curve = curve_from_outputs(&outputs(20_000.0, 10_000.0));
        assert_eq!(curve, preview_curve());
    }

    #[test]
    fn test_peak_and_width_of_empty_curve() {
        assert!(peak(&[]).is_none());
        assert!(half_max_width_decades(&[]).is_none());
    }
}
