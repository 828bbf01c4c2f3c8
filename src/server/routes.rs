//! Axum route handlers for the evaluation server.
//!
//! # Routes
//!
//! - `GET  /health`   — Returns `{"status": "healthy", "version": ...}`
//! - `POST /evaluate` — Accepts [`EvaluateRequest`], returns [`EvaluateResponse`]

use std::str::FromStr;
use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::config::{EvaluationStrategy, LlmProvider, StrategyConfig};
use crate::evaluator::{EvalMode, EvalPhase, FollowupIntent, FullEvaluationReport, Grade, TaskType};
use crate::pipeline::{EvaluationState, Outcome, Pipeline, DEFAULT_EXECUTION_COUNT, MAX_EXECUTION_COUNT};

/// Shared application state for the HTTP server.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<Pipeline>,
    /// Runs per prompt when a request does not say.
    pub execution_count: usize,
}

impl AppState {
    pub fn new(pipeline: Pipeline) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
            execution_count: DEFAULT_EXECUTION_COUNT,
        }
    }

    pub fn with_execution_count(mut self, count: usize) -> Self {
        self.execution_count = count.clamp(1, MAX_EXECUTION_COUNT);
        self
    }
}

/// Body of `POST /evaluate`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EvaluateRequest {
    pub text: String,
    #[serde(default)]
    pub mode: Option<String>,
    #[serde(default)]
    pub phase: Option<EvalPhase>,
    #[serde(default)]
    pub expected_outcome: Option<String>,
    #[serde(default)]
    pub task_type: Option<TaskType>,
    /// Preset name: standard, enhanced, cot_only, tot_only or meta_only.
    #[serde(default)]
    pub strategy: Option<String>,
    #[serde(default)]
    pub execution_count: Option<usize>,
    /// Follow-up question answered after the report.
    #[serde(default)]
    pub followup: Option<String>,
    #[serde(default)]
    pub provider: Option<LlmProvider>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EvaluateResponse {
    pub session_id: Uuid,
    pub mode: EvalMode,
    pub phase: EvalPhase,
    pub overall_score: u32,
    pub grade: Grade,
    pub report: Option<FullEvaluationReport>,
    pub followup_intent: Option<FollowupIntent>,
    pub transcript: Vec<String>,
}

impl From<EvaluationState> for EvaluateResponse {
    fn from(state: EvaluationState) -> Self {
        Self {
            session_id: state.session_id,
            mode: state.mode,
            phase: state.phase,
            overall_score: state.overall_score,
            grade: state.grade,
            report: state.report,
            followup_intent: state.followup_intent,
            transcript: state.transcript,
        }
    }
}

type ApiError = (StatusCode, Json<Value>);

fn api_error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (status, Json(serde_json::json!({ "error": message.into() })))
}

/// Build the axum router with all routes.
pub fn app_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/evaluate", post(evaluate_handler))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// GET /health — liveness probe.
async fn health_handler() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "version": crate::VERSION,
    }))
}

fn resolve_strategy(name: Option<&str>) -> Result<StrategyConfig, ApiError> {
    let preset = match name {
        Some(name) => EvaluationStrategy::from_str(name).map_err(|e| api_error(StatusCode::BAD_REQUEST, e.to_string()))?,
        None => EvaluationStrategy::default(),
    };
    let config = StrategyConfig::preset(preset);
    config
        .validate()
        .map_err(|e| api_error(StatusCode::BAD_REQUEST, e.to_string()))?;
    Ok(config)
}

/// Turn a request into the initial pipeline state.
fn initial_state(request: &EvaluateRequest, default_runs: usize) -> Result<EvaluationState, ApiError> {
    let text = request.text.trim();
    if text.is_empty() {
        return Err(api_error(StatusCode::BAD_REQUEST, "text must not be empty"));
    }

    let mut state = EvaluationState::new(text)
        .with_phase(request.phase.unwrap_or_default())
        .with_task_type(request.task_type.unwrap_or_default())
        .with_strategy(resolve_strategy(request.strategy.as_deref())?)
        .with_execution_count(request.execution_count.unwrap_or(default_runs));
    if let Some(mode) = request.mode.as_deref() {
        state = state.with_mode(EvalMode::parse_lenient(mode));
    }
    if let Some(expected) = request.expected_outcome.as_deref().filter(|e| !e.trim().is_empty()) {
        state = state.with_expected_outcome(expected);
    }
    if let Some(followup) = request.followup.as_deref().filter(|f| !f.trim().is_empty()) {
        state = state.with_followup(followup);
    }
    Ok(state)
}

/// POST /evaluate — run the pipeline to completion.
///
/// Aborted runs answer 502 with the stored fatal message verbatim.
async fn evaluate_handler(
    State(app): State<AppState>,
    Json(request): Json<EvaluateRequest>,
) -> Result<Json<EvaluateResponse>, ApiError> {
    let state = initial_state(&request, app.execution_count)?;
    log::info!(
        "Evaluate request {} ({} chars, phase={})",
        state.session_id,
        state.input_text.len(),
        state.phase.as_str()
    );

    let outcome = match request.provider {
        Some(provider) => {
            let pipeline = app.pipeline.as_ref().clone().with_provider(provider);
            pipeline.run(state, None).await
        }
        None => app.pipeline.run(state, None).await,
    };

    match outcome {
        Outcome::Completed(state) => Ok(Json(EvaluateResponse::from(state))),
        Outcome::Aborted { message, .. } => Err(api_error(StatusCode::BAD_GATEWAY, message)),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
