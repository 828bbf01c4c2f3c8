//! SQLite-backed [`EvaluationHistory`].
//!
//! rusqlite is synchronous, so every operation opens the database inside a
//! `spawn_blocking` task.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};

use super::{similarity, EvaluationHistory, HistoryError, HistoryRecord, SimilarEvaluation};

/// Minimum similarity for a past evaluation to count as related.
pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 0.3;

/// Most recent rows scanned per lookup.
const SCAN_LIMIT: usize = 500;

pub struct SqliteHistory {
    pub db_path: PathBuf,
    pub threshold: f64,
}

impl SqliteHistory {
    /// Open (creating if needed) the history database at `db_path`.
    pub fn open(db_path: impl AsRef<Path>) -> Result<Self, HistoryError> {
        let db_path = db_path.as_ref().to_path_buf();
        if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let history = Self {
            db_path,
            threshold: DEFAULT_SIMILARITY_THRESHOLD,
        };
        history.initialize_db()?;
        Ok(history)
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    fn initialize_db(&self) -> Result<(), HistoryError> {
        let conn = Connection::open(&self.db_path)?;
        conn.execute(
            "CREATE TABLE IF NOT EXISTS evaluations (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                input_text TEXT NOT NULL,
                rewritten_prompt TEXT,
                overall_score INTEGER NOT NULL,
                grade TEXT NOT NULL,
                output_score REAL,
                improvements_summary TEXT,
                created_at TEXT NOT NULL
            )",
            [],
        )?;
        Ok(())
    }

    fn load_recent(db_path: &Path) -> Result<Vec<HistoryRecord>, HistoryError> {
        let conn = Connection::open(db_path)?;
        let mut stmt = conn.prepare(&format!(
            "SELECT input_text, rewritten_prompt, overall_score, grade, output_score,
                    improvements_summary, created_at
             FROM evaluations
             ORDER BY id DESC
             LIMIT {}",
            SCAN_LIMIT
        ))?;

        let rows = stmt.query_map([], |row| {
            let created_at: String = row.get(6)?;
            Ok(HistoryRecord {
                input_text: row.get(0)?,
                rewritten_prompt: row.get(1)?,
                overall_score: row.get(2)?,
                grade: row.get(3)?,
                output_score: row.get(4)?,
                improvements_summary: row.get(5)?,
                created_at: DateTime::parse_from_rfc3339(&created_at)
                    .map(|t| t.with_timezone(&Utc))
                    .unwrap_or_else(|_| Utc::now()),
            })
        })?;

        let mut records = Vec::new();
        for row in rows {
            records.push(row?);
        }
        Ok(records)
    }
}

fn join_error(e: tokio::task::JoinError) -> HistoryError {
    HistoryError::Task {
        message: e.to_string(),
    }
}

#[async_trait]
impl EvaluationHistory for SqliteHistory {
    async fn find_similar(&self, text: &str, limit: usize) -> Result<Vec<SimilarEvaluation>, HistoryError> {
        let db_path = self.db_path.clone();
        let records = tokio::task::spawn_blocking(move || Self::load_recent(&db_path))
            .await
            .map_err(join_error)??;

        let mut ranked: Vec<SimilarEvaluation> = records
            .into_iter()
            .map(|record| SimilarEvaluation {
                similarity: similarity(text, &record.input_text),
                record,
            })
            .filter(|s| s.similarity >= self.threshold)
            .collect();
        ranked.sort_by(|a, b| b.similarity.total_cmp(&a.similarity));
        ranked.truncate(limit);

        log::debug!("History lookup matched {} past evaluations", ranked.len());
        Ok(ranked)
    }

    async fn record(&self, record: HistoryRecord) -> Result<(), HistoryError> {
        let db_path = self.db_path.clone();
        tokio::task::spawn_blocking(move || -> Result<(), HistoryError> {
            let conn = Connection::open(&db_path)?;
            conn.execute(
                "INSERT INTO evaluations (input_text, rewritten_prompt, overall_score, grade,
                                          output_score, improvements_summary, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    record.input_text,
                    record.rewritten_prompt,
                    record.overall_score,
                    record.grade,
                    record.output_score,
                    record.improvements_summary,
                    record.created_at.to_rfc3339(),
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(join_error)?
    }
}
