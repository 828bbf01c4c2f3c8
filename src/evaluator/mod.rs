//! Domain types for prompt evaluation.
//!
//! Everything the pipeline produces or consumes lives here: evaluation
//! modes and phases, the four scored rubric dimensions, TCREI presence
//! flags, improvements, output judgments, the meta assessment, the
//! tree-search audit trail and the final consolidated report.

pub mod criteria;
pub mod errors;
pub mod schemas;

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The four fixed rubric dimensions, in report order.
pub const DIMENSION_NAMES: [&str; 4] = ["task", "context", "references", "constraints"];

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// What kind of text is being evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum EvalMode {
    #[default]
    Prompt,
    SystemPrompt,
}

impl EvalMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            EvalMode::Prompt => "prompt",
            EvalMode::SystemPrompt => "system_prompt",
        }
    }

    /// Parse a mode name, accepting `system_prompt`/`system` and defaulting to `Prompt`.
    pub fn parse_lenient(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "system_prompt" | "system" | "system prompt" => EvalMode::SystemPrompt,
            _ => EvalMode::Prompt,
        }
    }
}

/// Which parts of the pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum EvalPhase {
    /// Structural rubric analysis and improvement only.
    #[default]
    Structure,
    /// Execute the prompt and judge its output only.
    Output,
    /// Structure and output, plus the optimized-prompt comparison.
    Full,
}

impl EvalPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            EvalPhase::Structure => "structure",
            EvalPhase::Output => "output",
            EvalPhase::Full => "full",
        }
    }
}

/// Task category; selects the criterion catalog, weights and judge instructions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
    #[default]
    General,
    EmailWriting,
    Summarization,
    CodingTask,
    ExamInterview,
    LinkedinPost,
}

impl TaskType {
    pub const ALL: [TaskType; 6] = [
        TaskType::General,
        TaskType::EmailWriting,
        TaskType::Summarization,
        TaskType::CodingTask,
        TaskType::ExamInterview,
        TaskType::LinkedinPost,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskType::General => "general",
            TaskType::EmailWriting => "email_writing",
            TaskType::Summarization => "summarization",
            TaskType::CodingTask => "coding_task",
            TaskType::ExamInterview => "exam_interview",
            TaskType::LinkedinPost => "linkedin_post",
        }
    }
}

/// Letter-style grade for a 0-100 score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Grade {
    Excellent,
    Good,
    #[serde(rename = "Needs Work")]
    NeedsWork,
    #[default]
    Weak,
}

impl Grade {
    pub fn as_str(&self) -> &'static str {
        match self {
            Grade::Excellent => "Excellent",
            Grade::Good => "Good",
            Grade::NeedsWork => "Needs Work",
            Grade::Weak => "Weak",
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Improvement priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum Priority {
    Critical,
    High,
    #[default]
    Medium,
    Low,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Critical => "CRITICAL",
            Priority::High => "HIGH",
            Priority::Medium => "MEDIUM",
            Priority::Low => "LOW",
        }
    }

    /// Models return priorities in any casing; anything unrecognised is `Medium`.
    pub fn parse_lenient(value: &str) -> Self {
        match value.trim().to_uppercase().as_str() {
            "CRITICAL" => Priority::Critical,
            "HIGH" => Priority::High,
            "LOW" => Priority::Low,
            _ => Priority::Medium,
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether a prompt stands alone or refers back to earlier conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PromptType {
    #[default]
    Initial,
    Continuation,
}

/// Intent of a follow-up message after a finished evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FollowupIntent {
    #[default]
    Explain,
    AdjustRewrite,
    ReEvaluate,
    ModeSwitch,
}

impl FollowupIntent {
    pub fn parse_lenient(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "adjust_rewrite" => FollowupIntent::AdjustRewrite,
            "re_evaluate" | "reevaluate" => FollowupIntent::ReEvaluate,
            "mode_switch" => FollowupIntent::ModeSwitch,
            _ => FollowupIntent::Explain,
        }
    }
}

// ---------------------------------------------------------------------------
// Structural results
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubCriterionResult {
    pub name: String,
    pub found: bool,
    pub detail: String,
}

/// Score for one rubric dimension. `score` is clamped to 0..=100.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DimensionScore {
    pub name: String,
    pub score: u32,
    #[serde(default)]
    pub sub_criteria: Vec<SubCriterionResult>,
}

impl DimensionScore {
    pub fn new(name: impl Into<String>, score: u32, sub_criteria: Vec<SubCriterionResult>) -> Self {
        Self {
            name: name.into(),
            score: score.min(100),
            sub_criteria,
        }
    }

    /// A zero-scored dimension with no findings.
    pub fn zero(name: impl Into<String>) -> Self {
        Self::new(name, 0, Vec::new())
    }
}

/// Zero-scored entries for all four dimensions.
pub fn zero_dimensions() -> Vec<DimensionScore> {
    DIMENSION_NAMES.iter().map(|n| DimensionScore::zero(*n)).collect()
}

/// Presence flags for Task / Context / References / Evaluate / Iterate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct TcreiFlags {
    #[serde(default)]
    pub task: bool,
    #[serde(default)]
    pub context: bool,
    #[serde(default)]
    pub references: bool,
    #[serde(default)]
    pub evaluate: bool,
    #[serde(default)]
    pub iterate: bool,
}

impl TcreiFlags {
    /// Logical OR of each flag.
    pub fn union(self, other: TcreiFlags) -> TcreiFlags {
        TcreiFlags {
            task: self.task || other.task,
            context: self.context || other.context,
            references: self.references || other.references,
            evaluate: self.evaluate || other.evaluate,
            iterate: self.iterate || other.iterate,
        }
    }
}

/// Structural analysis of one text (or one chunk of it).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Analysis {
    pub dimensions: Vec<DimensionScore>,
    pub tcrei_flags: TcreiFlags,
}

impl Analysis {
    /// Four zero-scored dimensions and no flags.
    pub fn empty() -> Self {
        Self {
            dimensions: zero_dimensions(),
            tcrei_flags: TcreiFlags::default(),
        }
    }

    pub fn dimension(&self, name: &str) -> Option<&DimensionScore> {
        self.dimensions.iter().find(|d| d.name == name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Improvement {
    pub priority: Priority,
    pub title: String,
    pub suggestion: String,
}

/// Structural evaluation snapshot assembled once improvements exist.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationResult {
    pub id: Uuid,
    pub mode: EvalMode,
    pub input_text: String,
    pub expected_outcome: Option<String>,
    pub overall_score: u32,
    pub grade: Grade,
    pub dimensions: Vec<DimensionScore>,
    pub tcrei_flags: TcreiFlags,
    pub improvements: Vec<Improvement>,
    pub rewritten_prompt: Option<String>,
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Output results
// ---------------------------------------------------------------------------

/// One judged quality dimension of a model output; `score` is in 0.0..=1.0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputDimensionScore {
    pub name: String,
    pub score: f64,
    pub comment: String,
    #[serde(default)]
    pub recommendation: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputEvaluation {
    pub prompt_used: String,
    pub llm_output: String,
    pub provider: String,
    pub model: String,
    pub dimensions: Vec<OutputDimensionScore>,
    pub overall_score: f64,
    pub grade: Grade,
    #[serde(default)]
    pub findings: Vec<String>,
}

impl OutputEvaluation {
    /// Overall score as a 0-100 percentage.
    pub fn overall_pct(&self) -> f64 {
        self.overall_score * 100.0
    }
}

// ---------------------------------------------------------------------------
// Meta / tree search
// ---------------------------------------------------------------------------

/// Self-assessment of an evaluation. All fields are in 0.0..=1.0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct MetaAssessment {
    pub accuracy_score: f64,
    pub completeness_score: f64,
    pub actionability_score: f64,
    pub faithfulness_score: f64,
    pub overall_confidence: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TotBranchAudit {
    pub approach: String,
    pub improvements_count: usize,
    /// First 200 characters of the branch rewrite.
    pub rewritten_prompt_preview: String,
    pub confidence: f64,
}

/// Record of one tree-search run. `selected_branch_index` may be out of
/// range when the selection call named a branch that does not exist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TotAuditTrail {
    pub branches: Vec<TotBranchAudit>,
    pub selected_branch_index: i64,
    pub selection_rationale: String,
    pub synthesized: bool,
}

impl TotAuditTrail {
    /// Confidence of the selected branch, if the index points at one.
    pub fn selected_confidence(&self) -> Option<f64> {
        usize::try_from(self.selected_branch_index)
            .ok()
            .and_then(|idx| self.branches.get(idx))
            .map(|b| b.confidence)
    }
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

/// Breakdown of the optimized-vs-original composite score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CompositeImprovement {
    pub composite_pct: i64,
    pub structural_signal_pct: i64,
    /// Absolute output delta in percentage points.
    pub output_delta: i64,
    /// `"+"` when the optimized output scored at least as well as the original.
    pub output_delta_sign: char,
    pub meta_confidence_pct: i64,
    pub tot_confidence_pct: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FullEvaluationReport {
    pub phase: EvalPhase,
    pub input_text: String,
    pub structure_result: Option<EvaluationResult>,
    pub output_result: Option<OutputEvaluation>,
    pub optimized_output_result: Option<OutputEvaluation>,
    pub combined_findings: Vec<String>,
    pub rewritten_prompt: Option<String>,
    pub meta_assessment: Option<MetaAssessment>,
    pub strategy_used: String,
    pub execution_count: usize,
    pub original_outputs: Option<Vec<String>>,
    pub optimized_outputs: Option<Vec<String>>,
    pub cot_reasoning_trace: Option<String>,
    pub tot_branches_data: Option<TotAuditTrail>,
    pub composite_improvement: Option<CompositeImprovement>,
}

impl FullEvaluationReport {
    /// Minimal report carrying only phase and input.
    pub fn minimal(phase: EvalPhase, input_text: impl Into<String>) -> Self {
        Self {
            phase,
            input_text: input_text.into(),
            structure_result: None,
            output_result: None,
            optimized_output_result: None,
            combined_findings: Vec::new(),
            rewritten_prompt: None,
            meta_assessment: None,
            strategy_used: String::new(),
            execution_count: 0,
            original_outputs: None,
            optimized_outputs: None,
            cot_reasoning_trace: None,
            tot_branches_data: None,
            composite_improvement: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
