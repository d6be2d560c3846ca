use anyhow::{Context, Result};
use axum::{
    Router,
    extract::State,
    http::{StatusCode, header},
    response::IntoResponse,
    routing::get,
};
use prometheus::{Encoder, Registry, TextEncoder};
use std::sync::Arc;
use tracing::{error, info};

use crate::valuation::PortfolioTotal;

#[derive(Clone)]
pub struct AppState {
    pub total: Arc<PortfolioTotal>,
    pub registry: Arc<Registry>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(get_portfolio))
        .route("/metrics", get(get_metrics))
        .with_state(state)
}

/// Serves until the process terminates. A bind failure is fatal and
/// propagates to the caller.
pub async fn serve(bind_address: &str, state: AppState) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(bind_address)
        .await
        .with_context(|| format!("Failed to bind {bind_address}"))?;
    info!("Listening on {bind_address}");
    axum::serve(listener, router(state))
        .await
        .context("HTTP server error")?;
    Ok(())
}

/// Last computed portfolio total, two fraction digits. Reads the shared
/// cell only; never waits on a cycle or triggers a fetch.
async fn get_portfolio(State(state): State<AppState>) -> String {
    format!("{:.2}", state.total.load())
}

async fn get_metrics(State(state): State<AppState>) -> impl IntoResponse {
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&state.registry.gather(), &mut buffer) {
        error!(error = %e, "Failed to encode metrics");
        return (StatusCode::INTERNAL_SERVER_ERROR, "encoding failure").into_response();
    }
    (
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        buffer,
    )
        .into_response()
}
