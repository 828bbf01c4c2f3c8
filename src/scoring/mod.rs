//! Scoring: weighted overall score, grade mapping and the composite
//! improvement blend used to compare an optimized prompt with the original.

use crate::config::{EvalConfig, GradingScale};
use crate::evaluator::{CompositeImprovement, DimensionScore, Grade, OutputEvaluation};

const STRUCTURAL_WEIGHT: f64 = 0.25;
const OUTPUT_DELTA_WEIGHT: f64 = 0.35;
const META_WEIGHT: f64 = 0.20;
const TOT_WEIGHT: f64 = 0.20;

/// Value used for a meta or tree-search signal that was not produced.
pub const MISSING_SIGNAL: f64 = 0.5;

/// Overall 0-100 score and its grade.
pub fn score(config: &EvalConfig, dimensions: &[DimensionScore]) -> (u32, Grade) {
    let overall = config.compute_overall(dimensions);
    (overall, config.grade_for(overall))
}

/// Grade of an output judgment whose overall score is in 0.0..=1.0.
pub fn output_grade(scale: &GradingScale, score: f64) -> Grade {
    let pct = score * 100.0;
    if pct >= f64::from(scale.excellent) {
        Grade::Excellent
    } else if pct >= f64::from(scale.good) {
        Grade::Good
    } else if pct >= f64::from(scale.needs_work) {
        Grade::NeedsWork
    } else {
        Grade::Weak
    }
}

/// Whole-number percentage of an output judgment, truncated. 0 when absent.
pub fn output_pct(evaluation: Option<&OutputEvaluation>) -> i64 {
    evaluation.map(|e| e.overall_pct().trunc() as i64).unwrap_or(0)
}

/// Inputs of the composite improvement score.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompositeSignals {
    /// Structural overall score, 0-100.
    pub structure_score: u32,
    pub original_output_pct: i64,
    pub optimized_output_pct: i64,
    pub meta_confidence: Option<f64>,
    /// Confidence of the selected tree-search branch.
    pub tot_confidence: Option<f64>,
}

fn pct(value: f64) -> i64 {
    (value * 100.0).round_ties_even() as i64
}

/// Blend structural gap, output delta, meta confidence and tree-search
/// confidence into one percentage. A worse optimized output counts as a
/// zero delta; a missing confidence counts as [`MISSING_SIGNAL`].
pub fn composite_improvement(signals: &CompositeSignals) -> CompositeImprovement {
    let structural = (100.0 - f64::from(signals.structure_score.min(100))) / 100.0;
    let raw_delta = signals.optimized_output_pct - signals.original_output_pct;
    let output = raw_delta.max(0) as f64 / 100.0;
    let meta = signals.meta_confidence.unwrap_or(MISSING_SIGNAL);
    let tot = signals.tot_confidence.unwrap_or(MISSING_SIGNAL);

    let blended = structural * STRUCTURAL_WEIGHT
        + output * OUTPUT_DELTA_WEIGHT
        + meta * META_WEIGHT
        + tot * TOT_WEIGHT;

    CompositeImprovement {
        composite_pct: pct(blended),
        structural_signal_pct: pct(structural),
        output_delta: raw_delta.abs(),
        output_delta_sign: if raw_delta >= 0 { '+' } else { '-' },
        meta_confidence_pct: pct(meta),
        tot_confidence_pct: pct(tot),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
