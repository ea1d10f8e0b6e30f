// SPDX-FileCopyrightText: 2026 Leadflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Persistence collaborator for leads and sales.

use async_trait::async_trait;

use crate::error::LeadflowError;
use crate::lead::Lead;
use crate::sale::Sale;
use crate::traits::adapter::PluginAdapter;
use crate::types::{LeadId, SaleId};

/// Adapter for lead and sale persistence.
///
/// Writes of existing entities are version-checked: `expected_version` is
/// the version the caller loaded, and a store holding any other version
/// must refuse the write with [`LeadflowError::Conflict`].
#[async_trait]
pub trait LeadStore: PluginAdapter {
    /// Initializes the storage backend (migrations, connections, etc.).
    async fn initialize(&self) -> Result<(), LeadflowError>;

    /// Closes the storage backend, flushing pending writes.
    async fn close(&self) -> Result<(), LeadflowError>;

    async fn insert_lead(&self, lead: &Lead) -> Result<(), LeadflowError>;

    async fn get_lead(&self, id: LeadId) -> Result<Option<Lead>, LeadflowError>;

    /// All leads, newest first.
    async fn list_leads(&self) -> Result<Vec<Lead>, LeadflowError>;

    async fn save_lead(&self, lead: &Lead, expected_version: u64) -> Result<(), LeadflowError>;

    async fn get_sale(&self, id: SaleId) -> Result<Option<Sale>, LeadflowError>;

    async fn get_sale_by_lead(&self, lead_id: LeadId) -> Result<Option<Sale>, LeadflowError>;

    async fn save_sale(&self, sale: &Sale, expected_version: u64) -> Result<(), LeadflowError>;

    /// Persists a transfer as one unit: the version-checked lead update and
    /// the new sale insert either both land or neither does.
    async fn commit_transfer(
        &self,
        lead: &Lead,
        expected_lead_version: u64,
        sale: &Sale,
    ) -> Result<(), LeadflowError>;
}
