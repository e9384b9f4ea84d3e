//! Inverse-problem screen state: a target distribution (drawn or uploaded)
//! and the reaction conditions estimated to produce it.

use serde::{Deserialize, Serialize};

use crate::error::{DashboardError, Result};
use crate::models::{MwdPoint, ParsedData};
use crate::mwd;
use crate::sketch::{FreehandCapture, Point, Raster, Surface};

/// Drawn curves need more than this many points before solving.
pub const MIN_DRAWN_POINTS: usize = 10;
/// Parameters below this confidence are flagged.
pub const LOW_CONFIDENCE: u8 = 70;

/// Decades of molecular weight spanned by the drawing canvas (10² to 10⁶).
const CANVAS_LOG_MW_MIN: f64 = 2.0;
const CANVAS_LOG_MW_MAX: f64 = 6.0;

/// FWHM of the reference distribution, in decades.
const REFERENCE_WIDTH: f64 = 2.354_820_045 * mwd::PREVIEW_SIGMA;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum InverseTab {
    Upload,
    #[default]
    Draw,
}

/// One estimated reaction condition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolvedParameter {
    pub name: String,
    pub value: f64,
    pub unit: String,
    /// Percentage, 0-100.
    pub confidence: u8,
}

impl SolvedParameter {
    pub fn is_low_confidence(&self) -> bool {
        self.confidence < LOW_CONFIDENCE
    }
}

/// Conditions estimated for a target distribution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InverseSolution {
    pub parameters: Vec<SolvedParameter>,
    /// Peak of the target curve, g/mol.
    pub target_peak_mw: f64,
}

impl InverseSolution {
    /// Deterministic estimate from the peak position and spread of a target
    /// curve.
    ///
    /// A target centred on 10⁵ g/mol with the reference width yields the
    /// baseline recipe. Higher molecular weights call for more monomer, less
    /// initiator, a lower temperature and a longer run; targets whose width
    /// departs from the reference lose confidence.
    pub fn estimate(target: &[MwdPoint]) -> Option<Self> {
        let peak = mwd::peak(target)?;
        if peak.mw <= 0.0 || peak.predicted <= 0.0 {
            return None;
        }
        let width = mwd::half_max_width_decades(target)?;
        let shift = peak.mw.log10() - mwd::PREVIEW_PEAK_MW.log10();
        let penalty = ((width - REFERENCE_WIDTH).abs() * 10.0).min(15.0);
        let confidence = |base: f64| (base - penalty).round().clamp(0.0, 100.0) as u8;
        let round = |v: f64, dp: i32| {
            let f = 10_f64.powi(dp);
            (v * f).round() / f
        };

        let parameters = vec![
            SolvedParameter {
                name: "Monomer Concentration".to_string(),
                value: round(2.73 * 10_f64.powf(0.25 * shift), 2),
                unit: "mol/L".to_string(),
                confidence: confidence(85.0),
            },
            SolvedParameter {
                name: "Temperature".to_string(),
                value: round(72.5 - 10.0 * shift, 1),
                unit: "°C".to_string(),
                confidence: confidence(78.0),
            },
            SolvedParameter {
                name: "Reaction Time".to_string(),
                value: round(135.0 * (1.0 + 0.2 * shift), 0),
                unit: "min".to_string(),
                confidence: confidence(82.0),
            },
            SolvedParameter {
                name: "Initiator Conc.".to_string(),
                value: round(0.048 * 10_f64.powf(-0.5 * shift), 3),
                unit: "mol/L".to_string(),
                confidence: confidence(68.0),
            },
        ];

        Some(Self {
            parameters,
            target_peak_mw: peak.mw,
        })
    }
}

/// Uploaded target distribution.
#[derive(Debug, Clone, PartialEq)]
pub struct TargetFile {
    pub name: String,
    pub curve: Vec<MwdPoint>,
}

impl TargetFile {
    /// Read the first two numeric columns as `(mw, fraction)`. Rows that do
    /// not parse are skipped; files with no usable rows fall back to the
    /// preview curve.
    pub fn from_parsed(name: impl Into<String>, data: &ParsedData) -> Self {
        let mut curve: Vec<MwdPoint> = data
            .rows
            .iter()
            .filter_map(|row| {
                let mw = row.first()?.parse::<f64>().ok()?;
                let predicted = row.get(1)?.parse::<f64>().ok()?;
                (mw > 0.0 && mw.is_finite() && predicted.is_finite())
                    .then_some(MwdPoint { mw, predicted })
            })
            .collect();
        if curve.is_empty() {
            tracing::debug!("target file has no numeric rows, using preview curve");
            curve = mwd::preview_curve();
        }
        curve.sort_by(|a, b| a.mw.total_cmp(&b.mw));
        Self {
            name: name.into(),
            curve,
        }
    }
}

/// Everything the inverse-problem screen owns.
#[derive(Debug, Clone, Default)]
pub struct InverseState {
    pub tab: InverseTab,
    pub capture: FreehandCapture,
    pub raster: Raster,
    target: Option<TargetFile>,
    solution: Option<InverseSolution>,
}

impl InverseState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn target(&self) -> Option<&TargetFile> {
        self.target.as_ref()
    }

    pub fn solution(&self) -> Option<&InverseSolution> {
        self.solution.as_ref()
    }

    /// Solving needs a drawn curve with enough points or an uploaded target.
    pub fn can_solve(&self) -> bool {
        self.capture.points().len() > MIN_DRAWN_POINTS || self.target.is_some()
    }

    /// Replace the uploaded target; any previous solution no longer applies.
    pub fn set_target(&mut self, target: TargetFile) {
        self.target = Some(target);
        self.solution = None;
    }

    pub fn pointer_down(&mut self, at: Point) {
        self.capture.pointer_down(at, &mut self.raster);
    }

    pub fn pointer_move(&mut self, at: Point) {
        self.capture.pointer_move(at, &mut self.raster);
    }

    pub fn pointer_up(&mut self) {
        self.capture.pointer_up();
    }

    pub fn pointer_leave(&mut self) {
        self.capture.pointer_leave();
    }

    /// Clear the drawing and the solution.
    pub fn clear(&mut self) {
        self.capture.clear(&mut self.raster);
        self.solution = None;
    }

    /// Repaint the grid after a theme change.
    pub fn redraw_background(&mut self) {
        self.raster.draw_background();
    }

    /// The curve the solver works on: the drawing when it is large enough,
    /// otherwise the uploaded file.
    pub fn target_curve(&self) -> Option<Vec<MwdPoint>> {
        if self.capture.points().len() > MIN_DRAWN_POINTS {
            let (w, h) = self.raster.size();
            return Some(drawn_curve(self.capture.points(), w, h));
        }
        self.target.as_ref().map(|t| t.curve.clone())
    }

    pub fn solve(&mut self) -> Result<&InverseSolution> {
        if !self.can_solve() {
            return Err(DashboardError::Validation {
                missing: vec!["target distribution".to_string()],
            });
        }
        let curve = self.target_curve().unwrap_or_default();
        let solution = InverseSolution::estimate(&curve).ok_or_else(|| {
            DashboardError::Validation {
                missing: vec!["target distribution".to_string()],
            }
        })?;
        tracing::info!(
            peak_mw = solution.target_peak_mw,
            points = curve.len(),
            "inverse problem solved"
        );
        Ok(self.solution.insert(solution))
    }
}

/// Map canvas pixels to `(mw, fraction)`: x spans 10² to 10⁶ g/mol, y runs
/// from 1.0 at the top to 0 at the bottom.
pub fn drawn_curve(points: &[Point], width: u32, height: u32) -> Vec<MwdPoint> {
    let (w, h) = (width.max(1) as f64, height.max(1) as f64);
    let mut curve: Vec<MwdPoint> = points
        .iter()
        .map(|p| {
            let log_mw = CANVAS_LOG_MW_MIN
                + (CANVAS_LOG_MW_MAX - CANVAS_LOG_MW_MIN) * (p.x / w).clamp(0.0, 1.0);
            MwdPoint {
                mw: 10_f64.powf(log_mw),
                predicted: (1.0 - p.y / h).clamp(0.0, 1.0),
            }
        })
        .collect();
    curve.sort_by(|a, b| a.mw.total_cmp(&b.mw));
    curve
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gaussian(peak_log: f64, sigma: f64) -> Vec<MwdPoint> {
        (0..=400)
            .map(|i| {
                let x = 2.0 + i as f64 * 0.01;
                MwdPoint {
                    mw: 10_f64.powf(x),
                    predicted: (-(x - peak_log).powi(2) / (2.0 * sigma * sigma)).exp(),
                }
            })
            .collect()
    }

    fn draw_arc(state: &mut InverseState, n: usize) {
        state.pointer_down(Point::new(10.0, 180.0));
        for i in 1..n {
            let x = 10.0 + i as f64 * 20.0;
            let y = 180.0 - (i as f64 * 15.0).min(170.0);
            state.pointer_move(Point::new(x, y));
        }
        state.pointer_up();
    }

    #[test]
    fn test_reference_target_gives_baseline() {
        let solution = InverseSolution::estimate(&gaussian(5.0, 0.5)).unwrap();
        let values: Vec<f64> = solution.parameters.iter().map(|p| p.value).collect();
        assert_eq!(values, vec![2.73, 72.5, 135.0, 0.048]);
        let confidence: Vec<u8> = solution.parameters.iter().map(|p| p.confidence).collect();
        assert_eq!(confidence, vec![85, 78, 82, 68]);
        assert!(solution.parameters[3].is_low_confidence());
        assert!(!solution.parameters[0].is_low_confidence());
    }

    #[test]
    fn test_higher_target_shifts_recipe() {
        let base = InverseSolution::estimate(&gaussian(5.0, 0.5)).unwrap();
        let high = InverseSolution::estimate(&gaussian(5.5, 0.5)).unwrap();
        assert!(high.parameters[0].value > base.parameters[0].value);
        assert!(high.parameters[1].value < base.parameters[1].value);
        assert!(high.parameters[3].value < base.parameters[3].value);
    }

    #[test]
    fn test_width_mismatch_lowers_confidence() {
        let base = InverseSolution::estimate(&gaussian(5.0, 0.5)).unwrap();
        let broad = InverseSolution::estimate(&gaussian(5.0, 0.8)).unwrap();
        assert!(broad.parameters[0].confidence < base.parameters[0].confidence);
    }

    #[test]
    fn test_estimate_is_deterministic() {
        let a = InverseSolution::estimate(&gaussian(4.3, 0.4));
        let b = InverseSolution::estimate(&gaussian(4.3, 0.4));
        assert_eq!(a, b);
    }

    #[test]
    fn test_estimate_empty_curve() {
        assert!(InverseSolution::estimate(&[]).is_none());
    }

    #[test]
    fn test_solve_gated_on_point_count() {
        let mut state = InverseState::new();
        draw_arc(&mut state, MIN_DRAWN_POINTS);
        assert!(!state.can_solve());
        assert!(matches!(state.solve(), Err(DashboardError::Validation { .. })));

        draw_arc(&mut state, MIN_DRAWN_POINTS + 1);
        assert!(state.can_solve());
        assert!(state.solve().is_ok());
        assert!(state.solution().is_some());
    }

    #[test]
    fn test_upload_enables_solve_and_invalidates() {
        let mut state = InverseState::new();
        let data = ParsedData {
            headers: vec!["mw".into(), "fraction".into()],
            rows: vec![
                vec!["1000".into(), "0.1".into()],
                vec!["100000".into(), "1.0".into()],
                vec!["1000000".into(), "0.2".into()],
            ],
            preview: Vec::new(),
        };
        state.set_target(TargetFile::from_parsed("target.csv", &data));
        assert!(state.can_solve());
        let peak = state.solve().unwrap().target_peak_mw;
        assert_eq!(peak, 100_000.0);

        state.set_target(TargetFile::from_parsed("other.csv", &data));
        assert!(state.solution().is_none());
    }

    #[test]
    fn test_clear_invalidates_solution() {
        let mut state = InverseState::new();
        draw_arc(&mut state, 15);
        state.solve().unwrap();
        state.clear();
        assert!(state.solution().is_none());
        assert!(state.capture.points().is_empty());
        assert!(!state.can_solve());
    }

    #[test]
    fn test_target_file_without_numbers_uses_preview() {
        let data = ParsedData {
            headers: vec!["a".into()],
            rows: vec![vec!["x".into()]],
            preview: Vec::new(),
        };
        let target = TargetFile::from_parsed("bad.csv", &data);
        assert_eq!(target.curve, mwd::preview_curve());
    }

    #[test]
    fn test_drawn_curve_axis_mapping() {
        let curve = drawn_curve(&[Point::new(400.0, 0.0), Point::new(0.0, 200.0)], 400, 200);
        assert!((curve[0].mw - 100.0).abs() < 1e-6);
        assert_eq!(curve[0].predicted, 0.0);
        assert!((curve[1].mw - 1_000_000.0).abs() < 1e-3);
        assert_eq!(curve[1].predicted, 1.0);
    }
}
