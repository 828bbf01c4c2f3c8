//! Shapes of the JSON documents the model is asked to return.
//!
//! These are deliberately forgiving: every field has a default so a partial
//! reply still parses. Mapping onto domain types (clamping, priority
//! parsing, filling missing dimensions) happens in the stages.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

fn half() -> f64 {
    0.5
}

fn default_priority() -> String {
    "MEDIUM".to_string()
}

fn default_intent() -> String {
    "explain".to_string()
}

fn default_output_dimension_name() -> String {
    "unknown".to_string()
}

// ---------------------------------------------------------------------------
// Analysis
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct SubCriterionReply {
    pub name: String,
    pub found: bool,
    pub detail: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct DimensionReply {
    pub score: i64,
    pub sub_criteria: Vec<SubCriterionReply>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct TcreiReply {
    pub task: bool,
    pub context: bool,
    pub references: bool,
    pub evaluate: bool,
    pub iterate: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AnalysisReply {
    pub dimensions: HashMap<String, DimensionReply>,
    pub tcrei_flags: TcreiReply,
}

// ---------------------------------------------------------------------------
// Improvements
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImprovementReply {
    #[serde(default = "default_priority")]
    pub priority: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub suggestion: String,
}

impl Default for ImprovementReply {
    fn default() -> Self {
        Self {
            priority: default_priority(),
            title: String::new(),
            suggestion: String::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ImprovementsReply {
    pub improvements: Vec<ImprovementReply>,
    pub rewritten_prompt: Option<String>,
}

// ---------------------------------------------------------------------------
// Output judging
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputDimensionReply {
    #[serde(default = "default_output_dimension_name")]
    pub name: String,
    #[serde(default)]
    pub score: f64,
    #[serde(default)]
    pub comment: String,
    #[serde(default)]
    pub recommendation: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct OutputEvaluationReply {
    pub dimensions: Vec<OutputDimensionReply>,
    pub overall_score: f64,
    pub findings: Vec<String>,
}

// ---------------------------------------------------------------------------
// Follow-up
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FollowupReply {
    #[serde(default = "default_intent")]
    pub intent: String,
    #[serde(default)]
    pub response: String,
    #[serde(default)]
    pub new_prompt: Option<String>,
    #[serde(default)]
    pub new_rewrite: Option<String>,
    #[serde(default)]
    pub new_mode: Option<String>,
}

impl Default for FollowupReply {
    fn default() -> Self {
        Self {
            intent: default_intent(),
            response: String::new(),
            new_prompt: None,
            new_rewrite: None,
            new_mode: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Tree search
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BranchReply {
    #[serde(default)]
    pub approach: String,
    #[serde(default)]
    pub improvements: Vec<ImprovementReply>,
    #[serde(default)]
    pub rewritten_prompt: String,
    #[serde(default = "half")]
    pub confidence: f64,
}

impl Default for BranchReply {
    fn default() -> Self {
        Self {
            approach: String::new(),
            improvements: Vec::new(),
            rewritten_prompt: String::new(),
            confidence: half(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct BranchesReply {
    pub branches: Vec<BranchReply>,
}

/// Convergent phase reply. A null or missing index means "no pick".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct SelectionReply {
    #[serde(default)]
    pub selected_branch_index: Option<i64>,
    #[serde(default)]
    pub synthesized_prompt: Option<String>,
    #[serde(default)]
    pub rationale: String,
}

// ---------------------------------------------------------------------------
// Meta audit
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetaAssessmentReply {
    #[serde(default = "half")]
    pub accuracy_score: f64,
    #[serde(default = "half")]
    pub completeness_score: f64,
    #[serde(default = "half")]
    pub actionability_score: f64,
    #[serde(default = "half")]
    pub faithfulness_score: f64,
    #[serde(default = "half")]
    pub overall_confidence: f64,
}

impl Default for MetaAssessmentReply {
    fn default() -> Self {
        Self {
            accuracy_score: half(),
            completeness_score: half(),
            actionability_score: half(),
            faithfulness_score: half(),
            overall_confidence: half(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct MetaEvaluationReply {
    pub meta_assessment: MetaAssessmentReply,
    pub refined_improvements: Vec<ImprovementReply>,
    pub refined_rewritten_prompt: Option<String>,
    pub meta_findings: Vec<String>,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_analysis_reply_parses() {
        let reply: AnalysisReply =
            serde_json::from_str(r#"{"dimensions":{"task":{"score":70}}}"#).unwrap();
        assert_eq!(reply.dimensions["task"].score, 70);
        assert!(reply.dimensions["task"].sub_criteria.is_empty());
        assert_eq!(reply.tcrei_flags, TcreiReply::default());
    }

    #[test]
    fn test_selection_index_null_or_missing() {
        let missing: SelectionReply = serde_json::from_str(r#"{"rationale":"r"}"#).unwrap();
        assert_eq!(missing.selected_branch_index, None);

        let null: SelectionReply =
            serde_json::from_str(r#"{"selected_branch_index":null,"rationale":"r"}"#).unwrap();
        assert_eq!(null.selected_branch_index, None);
    }

    #[test]
    fn test_meta_defaults_are_half() {
        let reply: MetaEvaluationReply = serde_json::from_str(r#"{"meta_findings":["x"]}"#).unwrap();
        assert_eq!(reply.meta_assessment.overall_confidence, 0.5);
        assert_eq!(reply.meta_assessment.accuracy_score, 0.5);
    }

    #[test]
    fn test_branch_confidence_default() {
        let reply: BranchesReply =
            serde_json::from_str(r#"{"branches":[{"approach":"a","rewritten_prompt":"p"}]}"#).unwrap();
        assert_eq!(reply.branches[0].confidence, 0.5);
    }
}
