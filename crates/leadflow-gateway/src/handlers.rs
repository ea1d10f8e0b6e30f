// SPDX-FileCopyrightText: 2026 Leadflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP request handlers for the lead and sale REST API.

use axum::{
    Json,
    extract::{
        Path, State,
        rejection::{JsonRejection, PathRejection},
    },
    http::StatusCode,
};
use serde::{Deserialize, Serialize};

use leadflow_core::{
    AiResult, BusinessDomain, ColdStage, LeadId, LeadRecord, LeadSource, SaleId, SaleRecord,
    SaleStage,
};

use crate::error::ApiError;
use crate::server::AppState;

type ApiResult<T> = Result<T, ApiError>;

/// Request body for POST /leads.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateLeadRequest {
    pub source: LeadSource,
    #[serde(default)]
    pub business_domain: Option<BusinessDomain>,
}

/// Request body for PATCH /leads/{id}/stage.
#[derive(Debug, Deserialize)]
pub struct LeadStageRequest {
    pub stage: ColdStage,
}

/// Request body for PATCH /leads/{id}/messages.
///
/// Taken as a signed integer so a negative count is reported as a
/// validation error instead of a decoding failure.
#[derive(Debug, Deserialize)]
pub struct MessagesCountRequest {
    pub messages_count: i64,
}

/// Request body for PATCH /sales/{id}/stage.
#[derive(Debug, Deserialize)]
pub struct SaleStageRequest {
    pub stage: SaleStage,
}

/// Response body for GET /health.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// GET /health
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

/// POST /leads
pub async fn create_lead(
    State(state): State<AppState>,
    body: Result<Json<CreateLeadRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<LeadRecord>)> {
    let Json(body) = body?;
    let lead = state
        .service
        .create_lead(body.source, body.business_domain)
        .await?;
    Ok((StatusCode::CREATED, Json(LeadRecord::from(&lead))))
}

/// GET /leads
pub async fn list_leads(State(state): State<AppState>) -> ApiResult<Json<Vec<LeadRecord>>> {
    let leads = state.service.list_leads().await?;
    Ok(Json(leads.iter().map(LeadRecord::from).collect()))
}

/// GET /leads/{id}
pub async fn get_lead(
    State(state): State<AppState>,
    id: Result<Path<LeadId>, PathRejection>,
) -> ApiResult<Json<LeadRecord>> {
    let Path(id) = id?;
    let lead = state.service.get_lead(id).await?;
    Ok(Json(LeadRecord::from(&lead)))
}

/// PATCH /leads/{id}/stage
pub async fn update_lead_stage(
    State(state): State<AppState>,
    id: Result<Path<LeadId>, PathRejection>,
    body: Result<Json<LeadStageRequest>, JsonRejection>,
) -> ApiResult<Json<LeadRecord>> {
    let Path(id) = id?;
    let Json(body) = body?;
    let lead = state.service.update_lead_stage(id, body.stage).await?;
    Ok(Json(LeadRecord::from(&lead)))
}

/// PATCH /leads/{id}/messages
pub async fn update_messages_count(
    State(state): State<AppState>,
    id: Result<Path<LeadId>, PathRejection>,
    body: Result<Json<MessagesCountRequest>, JsonRejection>,
) -> ApiResult<Json<LeadRecord>> {
    let Path(id) = id?;
    let Json(body) = body?;
    let count = u32::try_from(body.messages_count).map_err(|_| {
        ApiError::InvalidRequest(format!(
            "messages_count must be between 0 and {}, got {}",
            u32::MAX,
            body.messages_count
        ))
    })?;
    let lead = state.service.update_messages_count(id, count).await?;
    Ok(Json(LeadRecord::from(&lead)))
}

/// POST /leads/{id}/analyze
pub async fn analyze_lead(
    State(state): State<AppState>,
    id: Result<Path<LeadId>, PathRejection>,
) -> ApiResult<Json<AiResult>> {
    let Path(id) = id?;
    Ok(Json(state.service.analyze_lead(id).await?))
}

/// POST /leads/{id}/transfer
pub async fn transfer_lead(
    State(state): State<AppState>,
    id: Result<Path<LeadId>, PathRejection>,
) -> ApiResult<(StatusCode, Json<SaleRecord>)> {
    let Path(id) = id?;
    let sale = state.service.transfer_to_sales(id).await?;
    Ok((StatusCode::CREATED, Json(SaleRecord::from(&sale))))
}

/// GET /leads/{id}/sale
pub async fn get_sale_by_lead(
    State(state): State<AppState>,
    id: Result<Path<LeadId>, PathRejection>,
) -> ApiResult<Json<SaleRecord>> {
    let Path(id) = id?;
    let sale = state.service.get_sale_by_lead(id).await?;
    Ok(Json(SaleRecord::from(&sale)))
}

/// GET /sales/{id}
pub async fn get_sale(
    State(state): State<AppState>,
    id: Result<Path<SaleId>, PathRejection>,
) -> ApiResult<Json<SaleRecord>> {
    let Path(id) = id?;
    let sale = state.service.get_sale(id).await?;
    Ok(Json(SaleRecord::from(&sale)))
}

/// PATCH /sales/{id}/stage
pub async fn update_sale_stage(
    State(state): State<AppState>,
    id: Result<Path<SaleId>, PathRejection>,
    body: Result<Json<SaleStageRequest>, JsonRejection>,
) -> ApiResult<Json<SaleRecord>> {
    let Path(id) = id?;
    let Json(body) = body?;
    let sale = state.service.update_sale_stage(id, body.stage).await?;
    Ok(Json(SaleRecord::from(&sale)))
}
