// SPDX-FileCopyrightText: 2026 Leadflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Lead lifecycle host.
//!
//! `LeadService` runs every mutation as load, decide, persist while holding
//! a per-entity lock, so two requests against the same lead or sale never
//! interleave inside this process. Writes are also version-checked by the
//! store, which catches writers outside this process.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, info, warn};
use uuid::Uuid;

use leadflow_core::{
    AiResult, BusinessDomain, ColdStage, Lead, LeadId, LeadSource, LeadStore, LeadflowError,
    PluginAdapter, Sale, SaleId, SaleStage, ScoringAdapter, ScoringInput, attempt_transfer,
};

type LockTable = DashMap<Uuid, Arc<Mutex<()>>>;

/// Orchestrates the lifecycle operations over a store and a scorer.
pub struct LeadService {
    store: Arc<dyn LeadStore>,
    scorer: Arc<dyn ScoringAdapter>,
    locks: LockTable,
}

/// One entity's lock. Dropping it releases the mutex and removes the table
/// entry when no other request still holds or waits on it.
struct EntityLock<'a> {
    locks: &'a LockTable,
    id: Uuid,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for EntityLock<'_> {
    fn drop(&mut self) {
        drop(self.guard.take());
        // Runs under the shard write lock, so no request can clone the
        // mutex between the count check and the removal.
        self.locks
            .remove_if(&self.id, |_, mutex| Arc::strong_count(mutex) == 1);
    }
}

impl LeadService {
    pub fn new(store: Arc<dyn LeadStore>, scorer: Arc<dyn ScoringAdapter>) -> Self {
        Self {
            store,
            scorer,
            locks: DashMap::new(),
        }
    }

    /// Acquires the lock for one entity id. The map guard is dropped before
    /// awaiting so other entities are never blocked.
    async fn lock(&self, id: Uuid) -> EntityLock<'_> {
        let mutex = self.locks.entry(id).or_default().clone();
        let mut held = EntityLock {
            locks: &self.locks,
            id,
            guard: None,
        };
        // Declared after `held` so a cancelled wait drops its mutex handle
        // before `held` cleans up the entry.
        let acquire = mutex.lock_owned();
        held.guard = Some(acquire.await);
        held
    }

    async fn load_lead(&self, id: LeadId) -> Result<Lead, LeadflowError> {
        self.store
            .get_lead(id)
            .await?
            .ok_or_else(|| LeadflowError::NotFound {
                entity: "lead",
                id: id.to_string(),
            })
    }

    async fn load_sale(&self, id: SaleId) -> Result<Sale, LeadflowError> {
        self.store
            .get_sale(id)
            .await?
            .ok_or_else(|| LeadflowError::NotFound {
                entity: "sale",
                id: id.to_string(),
            })
    }

    pub async fn create_lead(
        &self,
        source: LeadSource,
        business_domain: Option<BusinessDomain>,
    ) -> Result<Lead, LeadflowError> {
        let lead = Lead::create(source, business_domain);
        self.store.insert_lead(&lead).await?;
        info!(lead_id = %lead.id(), %source, "lead created");
        Ok(lead)
    }

    pub async fn get_lead(&self, id: LeadId) -> Result<Lead, LeadflowError> {
        self.load_lead(id).await
    }

    /// All leads, newest first.
    pub async fn list_leads(&self) -> Result<Vec<Lead>, LeadflowError> {
        self.store.list_leads().await
    }

    pub async fn update_lead_stage(
        &self,
        id: LeadId,
        stage: ColdStage,
    ) -> Result<Lead, LeadflowError> {
        let _guard = self.lock(id.0).await;
        let mut lead = self.load_lead(id).await?;
        let expected = lead.version();
        let from = lead.stage();

        if let Err(e) = lead.update_stage(stage) {
            warn!(lead_id = %id, %from, to = %stage, error = %e, "lead stage change rejected");
            return Err(e);
        }

        self.store.save_lead(&lead, expected).await?;
        info!(lead_id = %id, %from, to = %stage, "lead stage changed");
        Ok(lead)
    }

    pub async fn update_messages_count(
        &self,
        id: LeadId,
        count: u32,
    ) -> Result<Lead, LeadflowError> {
        let _guard = self.lock(id.0).await;
        let mut lead = self.load_lead(id).await?;
        let expected = lead.version();
        lead.update_messages_count(count);
        self.store.save_lead(&lead, expected).await?;
        debug!(lead_id = %id, messages_count = count, "messages count updated");
        Ok(lead)
    }

    /// Scores the lead and records the result as its annotation bundle.
    ///
    /// The scorer runs without the entity lock held. The lead is reloaded
    /// under the lock afterwards, so a slow oracle never blocks stage
    /// changes. A scorer failure leaves the stored lead untouched.
    pub async fn analyze_lead(&self, id: LeadId) -> Result<AiResult, LeadflowError> {
        let input = ScoringInput::from(&self.load_lead(id).await?);
        debug!(lead_id = %id, ?input, "requesting lead score");

        let result = match self.scorer.score(&input).await {
            Ok(result) => result,
            Err(e) => {
                warn!(lead_id = %id, error = %e, "lead scoring failed");
                return Err(e);
            }
        };

        let _guard = self.lock(id.0).await;
        let mut lead = self.load_lead(id).await?;
        let expected = lead.version();
        if let Err(e) = lead.record_ai_analysis(result.clone()) {
            warn!(lead_id = %id, error = %e, "scorer result rejected");
            return Err(e);
        }
        self.store.save_lead(&lead, expected).await?;

        info!(
            lead_id = %id,
            score = result.score,
            recommendation = %result.recommendation,
            "lead analysis recorded"
        );
        Ok(result)
    }

    /// Runs the transfer gate and persists the locked lead and the new sale
    /// as one unit. Any failure leaves both the lead and the store as they
    /// were.
    pub async fn transfer_to_sales(&self, id: LeadId) -> Result<Sale, LeadflowError> {
        let _guard = self.lock(id.0).await;
        let lead = self.load_lead(id).await?;
        let expected = lead.version();

        let mut candidate = lead.clone();
        let sale = match attempt_transfer(&mut candidate) {
            Ok(sale) => sale,
            Err(e) => {
                warn!(lead_id = %id, error = %e, "transfer rejected");
                return Err(e);
            }
        };

        self.store.commit_transfer(&candidate, expected, &sale).await?;
        Ok(sale)
    }

    pub async fn get_sale(&self, id: SaleId) -> Result<Sale, LeadflowError> {
        self.load_sale(id).await
    }

    pub async fn get_sale_by_lead(&self, lead_id: LeadId) -> Result<Sale, LeadflowError> {
        self.store
            .get_sale_by_lead(lead_id)
            .await?
            .ok_or_else(|| LeadflowError::NotFound {
                entity: "sale",
                id: format!("for lead {lead_id}"),
            })
    }

    pub async fn update_sale_stage(
        &self,
        id: SaleId,
        stage: SaleStage,
    ) -> Result<Sale, LeadflowError> {
        let _guard = self.lock(id.0).await;
        let mut sale = self.load_sale(id).await?;
        let expected = sale.version();
        let from = sale.stage();

        if let Err(e) = sale.update_stage(stage) {
            warn!(sale_id = %id, %from, to = %stage, error = %e, "sale stage change rejected");
            return Err(e);
        }

        self.store.save_sale(&sale, expected).await?;
        info!(sale_id = %id, %from, to = %stage, "sale stage changed");
        Ok(sale)
    }

    /// Shuts down the scorer and closes the store.
    pub async fn shutdown(&self) -> Result<(), LeadflowError> {
        if let Err(e) = self.scorer.shutdown().await {
            warn!(error = %e, "scorer shutdown failed");
        }
        self.store.close().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use leadflow_test_utils::{InMemoryStore, MockScorer};

    fn service() -> LeadService {
        LeadService::new(Arc::new(InMemoryStore::new()), Arc::new(MockScorer::new()))
    }

    #[tokio::test]
    async fn same_entity_shares_one_lock() {
        let svc = service();
        let id = Uuid::new_v4();
        let guard = svc.lock(id).await;
        assert!(svc.locks.get(&id).unwrap().try_lock().is_err());
        drop(guard);
        assert!(svc.locks.get(&id).is_none());
    }

    #[tokio::test]
    async fn lock_table_is_empty_after_unknown_ids() {
        let svc = service();
        for _ in 0..1000 {
            let err = svc
                .update_lead_stage(LeadId::new(), ColdStage::Contacted)
                .await
                .unwrap_err();
            assert!(matches!(err, LeadflowError::NotFound { .. }));
        }
        let err = svc
            .update_sale_stage(SaleId::new(), SaleStage::Kyc)
            .await
            .unwrap_err();
        assert!(matches!(err, LeadflowError::NotFound { .. }));
        assert_eq!(svc.locks.len(), 0);
    }

    #[tokio::test]
    async fn lock_table_is_empty_after_completed_operations() {
        let svc = service();
        let lead = svc.create_lead(LeadSource::Scanner, None).await.unwrap();
        svc.update_lead_stage(lead.id(), ColdStage::Contacted)
            .await
            .unwrap();
        svc.update_messages_count(lead.id(), 4).await.unwrap();
        assert_eq!(svc.locks.len(), 0);
    }

    #[tokio::test]
    async fn entry_survives_while_a_waiter_remains() {
        let svc = service();
        let id = Uuid::new_v4();
        let first = svc.lock(id).await;

        // A waiter that gives up leaves the holder's entry in place.
        let waited =
            tokio::time::timeout(std::time::Duration::from_millis(20), svc.lock(id)).await;
        assert!(waited.is_err());
        assert_eq!(svc.locks.len(), 1);

        drop(first);
        assert_eq!(svc.locks.len(), 0);
        let _again = svc.lock(id).await;
        assert_eq!(svc.locks.len(), 1);
    }

    #[tokio::test]
    async fn different_entities_do_not_block_each_other() {
        let svc = service();
        let _a = svc.lock(Uuid::new_v4()).await;
        let _b = svc.lock(Uuid::new_v4()).await;
        assert_eq!(svc.locks.len(), 2);
    }

    #[tokio::test]
    async fn unknown_ids_are_not_found() {
        let svc = service();
        let err = svc.get_lead(LeadId::new()).await.unwrap_err();
        assert!(matches!(err, LeadflowError::NotFound { entity: "lead", .. }));
        let err = svc.get_sale(SaleId::new()).await.unwrap_err();
        assert!(matches!(err, LeadflowError::NotFound { entity: "sale", .. }));
        let err = svc
            .update_sale_stage(SaleId::new(), SaleStage::Kyc)
            .await
            .unwrap_err();
        assert!(matches!(err, LeadflowError::NotFound { entity: "sale", .. }));
    }
}
