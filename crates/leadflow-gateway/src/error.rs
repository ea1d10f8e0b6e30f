// SPDX-FileCopyrightText: 2026 Leadflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mapping of lifecycle errors to HTTP responses.

use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

use leadflow_core::LeadflowError;

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Human-readable description.
    pub error: String,
    /// Stable snake_case error tag.
    pub kind: &'static str,
}

/// Everything a handler can fail with.
#[derive(Debug)]
pub enum ApiError {
    /// A lifecycle or collaborator error from the service.
    Service(LeadflowError),
    /// The request itself was malformed (bad id, bad body, unknown tag).
    InvalidRequest(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::InvalidRequest(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Service(e) if e.is_business_rule() => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Service(e) => match e {
                LeadflowError::NotFound { .. } => StatusCode::NOT_FOUND,
                LeadflowError::Conflict { .. } => StatusCode::CONFLICT,
                LeadflowError::ScoringUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
                LeadflowError::Scoring { .. } => StatusCode::BAD_GATEWAY,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }

    fn body(&self) -> ErrorResponse {
        match self {
            Self::InvalidRequest(message) => ErrorResponse {
                error: message.clone(),
                kind: "invalid_request",
            },
            Self::Service(e) => ErrorResponse {
                error: e.to_string(),
                kind: e.kind(),
            },
        }
    }
}

impl From<LeadflowError> for ApiError {
    fn from(e: LeadflowError) -> Self {
        Self::Service(e)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::InvalidRequest(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        Self::InvalidRequest(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(status = %status, error = ?self, "request failed");
        }
        (status, Json(self.body())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use leadflow_core::ColdStage;

    fn status_of(e: LeadflowError) -> StatusCode {
        ApiError::from(e).status()
    }

    #[test]
    fn business_rules_are_unprocessable() {
        assert_eq!(
            status_of(LeadflowError::MissingAnalysis),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            status_of(LeadflowError::WrongStage {
                current: ColdStage::New
            }),
            StatusCode::UNPROCESSABLE_ENTITY
        );
    }

    #[test]
    fn collaborator_failures_map_to_their_own_status() {
        assert_eq!(
            status_of(LeadflowError::ScoringUnavailable {
                message: "no key".into(),
                source: None,
            }),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            status_of(LeadflowError::Scoring {
                message: "bad json".into(),
                source: None,
            }),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            status_of(LeadflowError::Conflict {
                entity: "lead",
                id: "x".into(),
                reason: "stale".into(),
            }),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_of(LeadflowError::Internal("boom".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn body_carries_message_and_kind() {
        let body = ApiError::from(LeadflowError::MissingDomain).body();
        assert_eq!(body.kind, "missing_domain");
        assert!(body.error.contains("business domain"));
    }
}
