//! Similar-evaluation lookup over past evaluations.
//!
//! The analyzer and improver consult [`EvaluationHistory`] for lessons from
//! earlier evaluations of similar text; the report builder records every
//! finished evaluation. Lookups are best-effort: a failing store only costs
//! the historical context.

pub mod sqlite;

use std::collections::HashSet;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::evaluator::Improvement;

pub use sqlite::SqliteHistory;

/// Past evaluations included in instructions.
pub const CONTEXT_LIMIT: usize = 3;

#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("History database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("History I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("History task failed: {message}")]
    Task { message: String },
}

/// One finished evaluation as stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryRecord {
    pub input_text: String,
    pub rewritten_prompt: Option<String>,
    pub overall_score: u32,
    pub grade: String,
    pub output_score: Option<f64>,
    pub improvements_summary: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A stored evaluation ranked against a query text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimilarEvaluation {
    pub record: HistoryRecord,
    /// 0.0..=1.0, higher is closer.
    pub similarity: f64,
}

#[async_trait]
pub trait EvaluationHistory: Send + Sync {
    /// Up to `limit` stored evaluations similar to `text`, closest first.
    async fn find_similar(&self, text: &str, limit: usize) -> Result<Vec<SimilarEvaluation>, HistoryError>;

    async fn record(&self, record: HistoryRecord) -> Result<(), HistoryError>;
}

fn tokens(text: &str) -> HashSet<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
        .collect()
}

/// Jaccard similarity of the lowercase word sets of `a` and `b`.
pub fn similarity(a: &str, b: &str) -> f64 {
    let (a, b) = (tokens(a), tokens(b));
    if a.is_empty() && b.is_empty() {
        return 0.0;
    }
    let shared = a.intersection(&b).count() as f64;
    let union = a.union(&b).count() as f64;
    shared / union
}

/// Compact summary stored with a record: up to five `[PRIORITY] suggestion`
/// entries, each suggestion cut to 100 characters.
pub fn summarize_improvements(improvements: &[Improvement]) -> Option<String> {
    if improvements.is_empty() {
        return None;
    }
    let parts: Vec<String> = improvements
        .iter()
        .take(5)
        .map(|imp| {
            let suggestion: String = imp.suggestion.chars().take(100).collect();
            format!("[{}] {}", imp.priority, suggestion)
        })
        .collect();
    Some(parts.join("; "))
}

fn preview(text: &str, chars: usize) -> String {
    text.chars().take(chars).collect()
}

/// Render past evaluations as an instruction section.
pub fn format_historical_context(similar: &[SimilarEvaluation]) -> String {
    let mut lines = vec!["## Lessons from Previous Evaluations".to_string()];
    for (i, past) in similar.iter().take(CONTEXT_LIMIT).enumerate() {
        let r = &past.record;
        lines.push(format!(
            "{}. Similar prompt (score: {}/100 - {}): \"{}...\"",
            i + 1,
            r.overall_score,
            r.grade,
            preview(&r.input_text, 120)
        ));
        if let Some(summary) = r.improvements_summary.as_deref().filter(|s| !s.is_empty()) {
            lines.push(format!("   Key improvements applied: {}", preview(summary, 200)));
        }
        if r.rewritten_prompt.as_deref().is_some_and(|p| !p.is_empty()) {
            lines.push("   Rewritten version available (scored higher)".to_string());
        }
    }
    lines.join("\n")
}

/// Improvement lessons for the improver: the summaries of the closest
/// past evaluations that have one.
pub fn format_historical_improvements(similar: &[SimilarEvaluation]) -> String {
    let lines: Vec<String> = similar
        .iter()
        .filter_map(|past| {
            past.record
                .improvements_summary
                .as_deref()
                .filter(|s| !s.is_empty())
                .map(|s| (past.record.overall_score, s))
        })
        .take(CONTEXT_LIMIT)
        .map(|(score, summary)| format!("- (scored {}/100) {}", score, preview(summary, 200)))
        .collect();
    if lines.is_empty() {
        return String::new();
    }
    format!(
        "## Improvements that helped similar prompts before\n{}",
        lines.join("\n")
    )
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
