//! HTTP surface for the evaluation pipeline.
//!
//! # Endpoints
//!
//! - `GET  /health`   — Liveness probe
//! - `POST /evaluate` — Run one evaluation and return the report

pub mod routes;

pub use routes::{app_router, AppState, EvaluateRequest, EvaluateResponse};
