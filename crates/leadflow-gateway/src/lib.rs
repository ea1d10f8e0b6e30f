// SPDX-FileCopyrightText: 2026 Leadflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP gateway for the Leadflow lead and sale lifecycle.
//!
//! Routes map one-to-one onto [`leadflow_service::LeadService`] operations.
//! Business-rule rejections answer 422, missing entities 404, lost write
//! races 409, and scoring outages 503 (or 502 for a bad oracle answer).

pub mod error;
pub mod handlers;
pub mod server;

pub use error::{ApiError, ErrorResponse};
pub use server::{AppState, router, start_server};
