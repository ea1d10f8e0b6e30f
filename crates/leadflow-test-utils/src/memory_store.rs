// SPDX-FileCopyrightText: 2026 Leadflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory lead store for fast service and gateway tests.
//!
//! Mirrors the SQLite store's contract: version-checked saves, a unique sale
//! per lead, and all-or-nothing transfers.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use leadflow_core::{
    AdapterType, HealthStatus, Lead, LeadId, LeadStore, LeadflowError, PluginAdapter, Sale,
    SaleId,
};

#[derive(Default)]
struct State {
    leads: HashMap<LeadId, Lead>,
    /// Insertion order, oldest first.
    lead_order: Vec<LeadId>,
    sales: HashMap<SaleId, Sale>,
}

/// A `LeadStore` held entirely in memory.
#[derive(Default)]
pub struct InMemoryStore {
    state: Mutex<State>,
    fail_next_transfer: AtomicBool,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next `commit_transfer` fail with a storage error without
    /// applying anything, as a crashed transaction would.
    pub fn fail_next_transfer(&self) {
        self.fail_next_transfer.store(true, Ordering::SeqCst);
    }

    /// Number of stored sales.
    pub async fn sale_count(&self) -> usize {
        self.state.lock().await.sales.len()
    }
}

fn stale(entity: &'static str, id: String) -> LeadflowError {
    LeadflowError::Conflict {
        entity,
        id,
        reason: "modified concurrently; reload and retry".to_string(),
    }
}

fn check_lead_version(
    state: &State,
    lead: &Lead,
    expected_version: u64,
) -> Result<(), LeadflowError> {
    match state.leads.get(&lead.id()) {
        None => Err(LeadflowError::NotFound {
            entity: "lead",
            id: lead.id().to_string(),
        }),
        Some(stored) if stored.version() != expected_version => {
            Err(stale("lead", lead.id().to_string()))
        }
        Some(_) => Ok(()),
    }
}

#[async_trait]
impl PluginAdapter for InMemoryStore {
    fn name(&self) -> &str {
        "in-memory"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, LeadflowError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), LeadflowError> {
        Ok(())
    }
}

#[async_trait]
impl LeadStore for InMemoryStore {
    async fn initialize(&self) -> Result<(), LeadflowError> {
        Ok(())
    }

    async fn close(&self) -> Result<(), LeadflowError> {
        Ok(())
    }

    async fn insert_lead(&self, lead: &Lead) -> Result<(), LeadflowError> {
        let mut state = self.state.lock().await;
        if state.leads.contains_key(&lead.id()) {
            return Err(LeadflowError::Conflict {
                entity: "lead",
                id: lead.id().to_string(),
                reason: "already exists".to_string(),
            });
        }
        state.leads.insert(lead.id(), lead.clone());
        state.lead_order.push(lead.id());
        Ok(())
    }

    async fn get_lead(&self, id: LeadId) -> Result<Option<Lead>, LeadflowError> {
        Ok(self.state.lock().await.leads.get(&id).cloned())
    }

    async fn list_leads(&self) -> Result<Vec<Lead>, LeadflowError> {
        let state = self.state.lock().await;
        Ok(state
            .lead_order
            .iter()
            .rev()
            .filter_map(|id| state.leads.get(id).cloned())
            .collect())
    }

    async fn save_lead(&self, lead: &Lead, expected_version: u64) -> Result<(), LeadflowError> {
        let mut state = self.state.lock().await;
        check_lead_version(&state, lead, expected_version)?;
        state.leads.insert(lead.id(), lead.clone());
        Ok(())
    }

    async fn get_sale(&self, id: SaleId) -> Result<Option<Sale>, LeadflowError> {
        Ok(self.state.lock().await.sales.get(&id).cloned())
    }

    async fn get_sale_by_lead(&self, lead_id: LeadId) -> Result<Option<Sale>, LeadflowError> {
        let state = self.state.lock().await;
        Ok(state
            .sales
            .values()
            .find(|sale| sale.lead_id() == lead_id)
            .cloned())
    }

    async fn save_sale(&self, sale: &Sale, expected_version: u64) -> Result<(), LeadflowError> {
        let mut state = self.state.lock().await;
        match state.sales.get(&sale.id()) {
            None => {
                return Err(LeadflowError::NotFound {
                    entity: "sale",
                    id: sale.id().to_string(),
                });
            }
            Some(stored) if stored.version() != expected_version => {
                return Err(stale("sale", sale.id().to_string()));
            }
            Some(_) => {}
        }
        state.sales.insert(sale.id(), sale.clone());
        Ok(())
    }

    async fn commit_transfer(
        &self,
        lead: &Lead,
        expected_lead_version: u64,
        sale: &Sale,
    ) -> Result<(), LeadflowError> {
        let mut state = self.state.lock().await;

        if self.fail_next_transfer.swap(false, Ordering::SeqCst) {
            return Err(LeadflowError::Storage {
                source: "injected transfer failure".into(),
            });
        }

        check_lead_version(&state, lead, expected_lead_version)?;
        if state.sales.values().any(|s| s.lead_id() == lead.id()) {
            return Err(LeadflowError::Conflict {
                entity: "lead",
                id: lead.id().to_string(),
                reason: "a sale already exists for this lead".to_string(),
            });
        }

        // Both checks passed: apply both writes under the same lock.
        state.leads.insert(lead.id(), lead.clone());
        state.sales.insert(sale.id(), sale.clone());
        Ok(())
    }
}
