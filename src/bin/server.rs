//! Prompt evaluator HTTP server binary.
//!
//! # Environment Variables
//!
//! - `LLM_PROVIDER` and the provider keys/models, see `Settings::from_env`
//! - `EVAL_EXECUTION_COUNT` — Runs per prompt (default: 2)
//! - `EVAL_CONFIG_DIR` — Directory of per-task YAML weight files
//! - `EVAL_HISTORY_DB` — SQLite file for similar-evaluation lookup
//! - `SERVER_ADDR` — Bind address (default: 0.0.0.0:8080)
//! - `RUST_LOG` — Tracing filter (default: "info,prompt_evaluator=debug")
//!
//! # Usage
//!
//! ```bash
//! ANTHROPIC_API_KEY=... cargo run --bin server
//! ```

use std::sync::Arc;

use anyhow::Context;
use prompt_evaluator::config::Settings;
use prompt_evaluator::history::SqliteHistory;
use prompt_evaluator::llms::SettingsGatewayFactory;
use prompt_evaluator::pipeline::Pipeline;
use prompt_evaluator::server::{app_router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,prompt_evaluator=debug".into()),
        )
        .init();

    let settings = Settings::from_env().context("invalid environment configuration")?;
    let bind_addr = settings.server_addr.clone();
    let execution_count = settings.execution_count;

    let mut pipeline = Pipeline::new(Arc::new(SettingsGatewayFactory::new(settings.clone())));
    if let Some(dir) = &settings.config_dir {
        pipeline = pipeline.with_config_dir(dir);
    }
    if let Some(path) = &settings.history_db {
        match SqliteHistory::open(path) {
            Ok(history) => {
                tracing::info!("Evaluation history at {}", path.display());
                pipeline = pipeline.with_history(Arc::new(history));
            }
            Err(e) => tracing::warn!("History disabled, could not open {}: {}", path.display(), e),
        }
    }

    let app = app_router(AppState::new(pipeline).with_execution_count(execution_count));

    tracing::info!(
        "prompt-evaluator {} starting on {} (provider={})",
        prompt_evaluator::VERSION,
        bind_addr,
        settings.provider.as_str()
    );
    tracing::info!("Endpoints:");
    tracing::info!("  GET  /health   — liveness probe");
    tracing::info!("  POST /evaluate — run an evaluation");

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;
    axum::serve(listener, app).await.context("server failed")?;
    Ok(())
}
