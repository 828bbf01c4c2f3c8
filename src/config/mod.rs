//! Evaluation configuration.
//!
//! [`EvalConfig`] carries the per-task dimension weights and grading
//! thresholds consumed by the scorer. It can be overridden per task type
//! with a YAML file named `{task_type}.yaml` inside a config directory;
//! without one the built-in defaults apply.

pub mod settings;
pub mod strategy;

pub use settings::{LlmProvider, Settings};
pub use strategy::{EvaluationStrategy, StrategyConfig};

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::evaluator::criteria;
use crate::evaluator::{DimensionScore, Grade, TaskType, DIMENSION_NAMES};

/// Allowed distance of the weight sum from 1.0.
const WEIGHT_SUM_TOLERANCE: f64 = 0.01;

/// Errors from loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {message}")]
    Io { path: String, message: String },

    #[error("Invalid config YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid evaluation config: {message}")]
    Invalid { message: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DimensionConfig {
    pub weight: f64,
    #[serde(default)]
    pub sub_criteria: Vec<String>,
}

/// Lower bounds (inclusive) for each grade.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GradingScale {
    pub excellent: u32,
    pub good: u32,
    pub needs_work: u32,
}

impl Default for GradingScale {
    fn default() -> Self {
        Self {
            excellent: 85,
            good: 65,
            needs_work: 40,
        }
    }
}

impl GradingScale {
    pub fn grade_for(&self, score: u32) -> Grade {
        if score >= self.excellent {
            Grade::Excellent
        } else if score >= self.good {
            Grade::Good
        } else if score >= self.needs_work {
            Grade::NeedsWork
        } else {
            Grade::Weak
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvalConfig {
    pub dimensions: BTreeMap<String, DimensionConfig>,
    #[serde(default)]
    pub grading_scale: GradingScale,
}

/// A config file may wrap everything in an `evaluation:` key.
#[derive(Deserialize)]
#[serde(untagged)]
enum ConfigFile {
    Wrapped { evaluation: EvalConfig },
    Bare(EvalConfig),
}

impl EvalConfig {
    /// Built-in config for `task_type`: the standard weights, with sub-criterion
    /// names taken from that task type's catalog.
    pub fn default_for(task_type: TaskType) -> Self {
        let weights = [0.30, 0.25, 0.20, 0.25];
        let dimensions = criteria::catalog(task_type)
            .iter()
            .zip(weights)
            .map(|((name, criteria), weight)| {
                (
                    name.to_string(),
                    DimensionConfig {
                        weight,
                        sub_criteria: criteria.iter().map(|c| c.name.to_string()).collect(),
                    },
                )
            })
            .collect();
        Self {
            dimensions,
            grading_scale: GradingScale::default(),
        }
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let config = match serde_yaml::from_str::<ConfigFile>(yaml)? {
            ConfigFile::Wrapped { evaluation } => evaluation,
            ConfigFile::Bare(config) => config,
        };
        config.validate()?;
        Ok(config)
    }

    /// Load `{dir}/{task_type}.yaml` when it exists, else the built-in default.
    pub fn load(dir: Option<&Path>, task_type: TaskType) -> Result<Self, ConfigError> {
        let Some(dir) = dir else {
            return Ok(Self::default_for(task_type));
        };
        let path = dir.join(format!("{}.yaml", task_type.as_str()));
        if !path.exists() {
            log::debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default_for(task_type));
        }
        let text = std::fs::read_to_string(&path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        log::info!("Loaded evaluation config from {}", path.display());
        Self::from_yaml_str(&text)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for name in DIMENSION_NAMES {
            if !self.dimensions.contains_key(name) {
                return Err(ConfigError::Invalid {
                    message: format!("missing dimension '{}'", name),
                });
            }
        }
        if let Some((name, _)) = self
            .dimensions
            .iter()
            .find(|(_, d)| !(0.0..=1.0).contains(&d.weight))
        {
            return Err(ConfigError::Invalid {
                message: format!("weight of '{}' must be within 0.0..=1.0", name),
            });
        }
        let sum: f64 = self.dimensions.values().map(|d| d.weight).sum();
        if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(ConfigError::Invalid {
                message: format!("dimension weights sum to {:.3}, expected 1.0", sum),
            });
        }
        let scale = &self.grading_scale;
        if !(scale.excellent > scale.good && scale.good > scale.needs_work) {
            return Err(ConfigError::Invalid {
                message: "grading thresholds must be strictly descending".to_string(),
            });
        }
        Ok(())
    }

    pub fn weight(&self, dimension: &str) -> f64 {
        self.dimensions.get(dimension).map(|d| d.weight).unwrap_or(0.0)
    }

    /// Weighted overall score over the four fixed dimensions; missing ones count as 0.
    pub fn compute_overall(&self, dimensions: &[DimensionScore]) -> u32 {
        let total: f64 = DIMENSION_NAMES
            .iter()
            .map(|name| {
                let score = dimensions
                    .iter()
                    .find(|d| d.name == *name)
                    .map(|d| d.score)
                    .unwrap_or(0);
                f64::from(score) * self.weight(name)
            })
            .sum();
        total.round_ties_even().clamp(0.0, 100.0) as u32
    }

    pub fn grade_for(&self, score: u32) -> Grade {
        self.grading_scale.grade_for(score)
    }
}

impl Default for EvalConfig {
    fn default() -> Self {
        Self::default_for(TaskType::General)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn dim(name: &str, score: u32) -> DimensionScore {
        DimensionScore::new(name, score, vec![])
    }

    #[test]
    fn test_default_weights() {
        let config = EvalConfig::default();
        assert_eq!(config.weight("task"), 0.30);
        assert_eq!(config.weight("context"), 0.25);
        assert_eq!(config.weight("references"), 0.20);
        assert_eq!(config.weight("constraints"), 0.25);
        assert!(config.validate().is_ok());
        assert_eq!(
            config.dimensions["references"].sub_criteria,
            vec!["examples_included", "structured_references", "reference_labeling"]
        );
    }

    #[test]
    fn test_compute_overall_treats_missing_as_zero() {
        let config = EvalConfig::default();
        assert_eq!(config.compute_overall(&[dim("task", 100)]), 30);
        assert_eq!(config.compute_overall(&[]), 0);
        let all = [dim("task", 80), dim("context", 60), dim("references", 40), dim("constraints", 20)];
        // 24 + 15 + 8 + 5
        assert_eq!(config.compute_overall(&all), 52);
    }

    #[test]
    fn test_compute_overall_ties_round_to_even() {
        let config = EvalConfig::default();
        assert_eq!(config.compute_overall(&[dim("context", 10)]), 2);
        assert_eq!(config.compute_overall(&[dim("context", 30)]), 8);
    }

    #[test]
    fn test_unknown_dimensions_are_ignored() {
        let config = EvalConfig::default();
        assert_eq!(config.compute_overall(&[dim("tone", 100), dim("context", 100)]), 25);
    }

    #[test]
    fn test_grade_boundaries_inclusive() {
        let config = EvalConfig::default();
        assert_eq!(config.grade_for(85), Grade::Excellent);
        assert_eq!(config.grade_for(84), Grade::Good);
        assert_eq!(config.grade_for(65), Grade::Good);
        assert_eq!(config.grade_for(64), Grade::NeedsWork);
        assert_eq!(config.grade_for(40), Grade::NeedsWork);
        assert_eq!(config.grade_for(39), Grade::Weak);
    }

    #[test]
    fn test_yaml_wrapped_and_bare() {
        let bare = r#"
dimensions:
  task: { weight: 0.4, sub_criteria: [clear_action_verb] }
  context: { weight: 0.2 }
  references: { weight: 0.2 }
  constraints: { weight: 0.2 }
grading_scale: { excellent: 90, good: 70, needs_work: 50 }
"#;
        let config = EvalConfig::from_yaml_str(bare).unwrap();
        assert_eq!(config.weight("task"), 0.4);
        assert_eq!(config.grade_for(85), Grade::Good);

        let wrapped = format!("evaluation:\n{}", bare.lines().map(|l| format!("  {}\n", l)).collect::<String>());
        let config = EvalConfig::from_yaml_str(&wrapped).unwrap();
        assert_eq!(config.grading_scale.excellent, 90);
    }

    #[test]
    fn test_validate_rejects_bad_weight_sum() {
        let yaml = r#"
dimensions:
  task: { weight: 0.5 }
  context: { weight: 0.5 }
  references: { weight: 0.5 }
  constraints: { weight: 0.5 }
"#;
        let err = EvalConfig::from_yaml_str(yaml).unwrap_err();
        assert!(err.to_string().contains("sum to 2.000"));
    }

    #[test]
    fn test_validate_rejects_missing_dimension() {
        let yaml = "dimensions:\n  task: { weight: 1.0 }\n";
        assert!(matches!(
            EvalConfig::from_yaml_str(yaml),
            Err(ConfigError::Invalid { .. })
        ));
    }

    #[test]
    fn test_load_from_directory() {
        let dir = tempfile::tempdir().unwrap();
        let mut file = std::fs::File::create(dir.path().join("email_writing.yaml")).unwrap();
        writeln!(
            file,
            "dimensions:\n  task: {{ weight: 0.25 }}\n  context: {{ weight: 0.25 }}\n  references: {{ weight: 0.25 }}\n  constraints: {{ weight: 0.25 }}"
        )
        .unwrap();

        let email = EvalConfig::load(Some(dir.path()), TaskType::EmailWriting).unwrap();
        assert_eq!(email.weight("task"), 0.25);

        let general = EvalConfig::load(Some(dir.path()), TaskType::General).unwrap();
        assert_eq!(general, EvalConfig::default_for(TaskType::General));
    }
}
