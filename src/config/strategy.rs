//! Strategy switches for the reasoning preamble, tree search and meta audit.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::evaluator::errors::EvaluatorError;

/// Named strategy presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum EvaluationStrategy {
    Standard,
    #[default]
    Enhanced,
    CotOnly,
    TotOnly,
    MetaOnly,
}

impl EvaluationStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            EvaluationStrategy::Standard => "standard",
            EvaluationStrategy::Enhanced => "enhanced",
            EvaluationStrategy::CotOnly => "cot_only",
            EvaluationStrategy::TotOnly => "tot_only",
            EvaluationStrategy::MetaOnly => "meta_only",
        }
    }
}

impl fmt::Display for EvaluationStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EvaluationStrategy {
    type Err = EvaluatorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "standard" => Ok(EvaluationStrategy::Standard),
            "enhanced" => Ok(EvaluationStrategy::Enhanced),
            "cot_only" => Ok(EvaluationStrategy::CotOnly),
            "tot_only" => Ok(EvaluationStrategy::TotOnly),
            "meta_only" => Ok(EvaluationStrategy::MetaOnly),
            other => Err(EvaluatorError::Strategy {
                message: format!("unknown strategy '{}'", other),
            }),
        }
    }
}

/// Which enhancements are active for one evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StrategyConfig {
    /// Prepend the step-by-step reasoning preamble to analysis instructions.
    pub use_cot: bool,
    /// Use tree search in the improve stage.
    pub use_tot: bool,
    /// Branches requested from the divergent phase (2..=10).
    pub tot_num_branches: usize,
    /// Run the meta audit stage.
    pub use_meta: bool,
    /// 1..=3.
    pub meta_refinement_rounds: usize,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self::preset(EvaluationStrategy::Enhanced)
    }
}

impl StrategyConfig {
    pub fn preset(strategy: EvaluationStrategy) -> Self {
        let (use_cot, use_tot, use_meta) = match strategy {
            EvaluationStrategy::Standard => (false, false, false),
            EvaluationStrategy::Enhanced => (true, true, true),
            EvaluationStrategy::CotOnly => (true, false, false),
            EvaluationStrategy::TotOnly => (false, true, false),
            EvaluationStrategy::MetaOnly => (false, false, true),
        };
        Self {
            use_cot,
            use_tot,
            tot_num_branches: 3,
            use_meta,
            meta_refinement_rounds: 1,
        }
    }

    pub fn validate(&self) -> Result<(), EvaluatorError> {
        if !(2..=10).contains(&self.tot_num_branches) {
            return Err(EvaluatorError::Strategy {
                message: format!("tot_num_branches must be 2..=10, got {}", self.tot_num_branches),
            });
        }
        if !(1..=3).contains(&self.meta_refinement_rounds) {
            return Err(EvaluatorError::Strategy {
                message: format!(
                    "meta_refinement_rounds must be 1..=3, got {}",
                    self.meta_refinement_rounds
                ),
            });
        }
        Ok(())
    }

    /// Label for reports, e.g. `enhanced (CoT+ToT+Meta)`.
    pub fn label(&self) -> String {
        let parts: Vec<&str> = [(self.use_cot, "CoT"), (self.use_tot, "ToT"), (self.use_meta, "Meta")]
            .iter()
            .filter(|(on, _)| *on)
            .map(|(_, name)| *name)
            .collect();
        match parts.len() {
            0 => "standard".to_string(),
            3 => "enhanced (CoT+ToT+Meta)".to_string(),
            _ => format!("custom ({})", parts.join("+")),
        }
    }
}
