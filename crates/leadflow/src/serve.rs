// SPDX-FileCopyrightText: 2026 Leadflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `leadflow serve`: wires storage, scoring, the service and the gateway.

use std::sync::Arc;

use tracing::info;

use leadflow_anthropic::AnthropicScorer;
use leadflow_config::LeadflowConfig;
use leadflow_core::{HealthStatus, LeadStore, LeadflowError, PluginAdapter};
use leadflow_gateway::{AppState, start_server};
use leadflow_service::LeadService;
use leadflow_storage::SqliteStorage;

use crate::shutdown;

/// Runs the HTTP service until SIGINT/SIGTERM, then closes storage.
pub async fn run_serve(config: LeadflowConfig) -> Result<(), LeadflowError> {
    init_tracing(&config.service.log_level);

    info!(name = %config.service.name, "starting leadflow serve");

    let service = Arc::new(build_service(&config).await?);

    let cancel = shutdown::install_signal_handler();
    let result = start_server(
        &config.server,
        AppState::new(service.clone()),
        async move { cancel.cancelled().await },
    )
    .await;

    info!("shutting down");
    service.shutdown().await?;
    result
}

/// Opens storage and builds the scorer. A scorer without credentials is
/// still usable: analysis then reports the oracle as unavailable.
pub async fn build_service(config: &LeadflowConfig) -> Result<LeadService, LeadflowError> {
    let storage = SqliteStorage::new(config.storage.clone());
    storage.initialize().await?;
    info!(path = %config.storage.database_path, "storage initialized");

    let scorer = AnthropicScorer::new(&config.anthropic)?;
    if let HealthStatus::Healthy = storage.health_check().await? {
        info!(storage = storage.name(), scorer = scorer.name(), "collaborators ready");
    }

    Ok(LeadService::new(Arc::new(storage), Arc::new(scorer)))
}

fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("leadflow={log_level},tower_http={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}
