// SPDX-FileCopyrightText: 2026 Leadflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gateway HTTP server built on axum.
//!
//! Sets up routes, middleware, and shared state for the gateway.

use std::future::Future;
use std::sync::Arc;

use axum::{
    Router,
    routing::{get, patch, post},
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use leadflow_config::model::ServerConfig;
use leadflow_core::LeadflowError;
use leadflow_service::LeadService;

use crate::handlers;

/// Shared state for axum request handlers.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<LeadService>,
}

impl AppState {
    pub fn new(service: Arc<LeadService>) -> Self {
        Self { service }
    }
}

/// Builds the full route table with CORS and request tracing.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route(
            "/leads",
            post(handlers::create_lead).get(handlers::list_leads),
        )
        .route("/leads/{id}", get(handlers::get_lead))
        .route("/leads/{id}/stage", patch(handlers::update_lead_stage))
        .route("/leads/{id}/messages", patch(handlers::update_messages_count))
        .route("/leads/{id}/analyze", post(handlers::analyze_lead))
        .route("/leads/{id}/transfer", post(handlers::transfer_lead))
        .route("/leads/{id}/sale", get(handlers::get_sale_by_lead))
        .route("/sales/{id}", get(handlers::get_sale))
        .route("/sales/{id}/stage", patch(handlers::update_sale_stage))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Binds `host:port` and serves the API until `shutdown` resolves.
pub async fn start_server<F>(
    config: &ServerConfig,
    state: AppState,
    shutdown: F,
) -> Result<(), LeadflowError>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| LeadflowError::Internal(format!("failed to bind gateway to {addr}: {e}")))?;

    tracing::info!("gateway listening on {addr}");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| LeadflowError::Internal(format!("gateway server error: {e}")))?;

    tracing::info!("gateway stopped");
    Ok(())
}
