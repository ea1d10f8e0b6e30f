// SPDX-FileCopyrightText: 2026 Leadflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end lifecycle tests for `LeadService` over the in-memory store.

use std::sync::Arc;
use std::time::Duration;

use leadflow_core::{
    BusinessDomain, ColdStage, LeadId, LeadSource, LeadflowError, SaleStage, ScoringInput,
};
use leadflow_service::LeadService;
use leadflow_test_utils::{InMemoryStore, MockScorer};
use tracing_test::traced_test;

struct Harness {
    service: Arc<LeadService>,
    store: Arc<InMemoryStore>,
    scorer: Arc<MockScorer>,
}

fn harness_with(scorer: MockScorer) -> Harness {
    let store = Arc::new(InMemoryStore::new());
    let scorer = Arc::new(scorer);
    let service = Arc::new(LeadService::new(store.clone(), scorer.clone()));
    Harness {
        service,
        store,
        scorer,
    }
}

fn harness() -> Harness {
    harness_with(MockScorer::new())
}

/// Creates a lead and walks it to `qualified`.
async fn qualified_lead(svc: &LeadService, domain: Option<BusinessDomain>) -> LeadId {
    let lead = svc.create_lead(LeadSource::Scanner, domain).await.unwrap();
    svc.update_lead_stage(lead.id(), ColdStage::Contacted)
        .await
        .unwrap();
    svc.update_lead_stage(lead.id(), ColdStage::Qualified)
        .await
        .unwrap();
    lead.id()
}

#[tokio::test]
async fn scanner_lead_reaches_sales_and_is_paid() {
    let h = harness();
    h.scorer
        .push_result(MockScorer::result(0.82, "transfer_to_sales", "engaged"))
        .await;
    let svc = &h.service;

    let id = qualified_lead(svc, Some(BusinessDomain::First)).await;
    svc.update_messages_count(id, 5).await.unwrap();

    let result = svc.analyze_lead(id).await.unwrap();
    assert_eq!(result.score, 0.82);
    let lead = svc.get_lead(id).await.unwrap();
    assert_eq!(lead.stage(), ColdStage::Qualified);
    assert_eq!(lead.analysis().unwrap().recommendation, "transfer_to_sales");

    let sale = svc.transfer_to_sales(id).await.unwrap();
    assert_eq!(sale.lead_id(), id);
    assert_eq!(sale.stage(), SaleStage::New);
    assert_eq!(svc.get_lead(id).await.unwrap().stage(), ColdStage::Transferred);
    assert_eq!(svc.get_sale_by_lead(id).await.unwrap().id(), sale.id());

    let err = svc
        .update_lead_stage(id, ColdStage::Lost)
        .await
        .unwrap_err();
    assert!(matches!(err, LeadflowError::LockedStage { .. }));

    for stage in [SaleStage::Kyc, SaleStage::Agreement, SaleStage::Paid] {
        svc.update_sale_stage(sale.id(), stage).await.unwrap();
    }
    let err = svc
        .update_sale_stage(sale.id(), SaleStage::Lost)
        .await
        .unwrap_err();
    assert!(matches!(err, LeadflowError::LockedStage { .. }));
    assert_eq!(svc.get_sale(sale.id()).await.unwrap().stage(), SaleStage::Paid);
}

#[tokio::test]
async fn analysis_sends_only_derived_fields() {
    let h = harness();
    let lead = h
        .service
        .create_lead(LeadSource::Partner, None)
        .await
        .unwrap();
    h.service.update_messages_count(lead.id(), 3).await.unwrap();
    h.service.analyze_lead(lead.id()).await.unwrap();

    assert_eq!(
        h.scorer.inputs().await,
        vec![ScoringInput {
            source: LeadSource::Partner,
            stage: ColdStage::New,
            messages_count: 3,
            has_business_domain: false,
        }]
    );
}

#[tokio::test]
async fn high_score_never_moves_the_stage() {
    let h = harness();
    h.scorer
        .push_result(MockScorer::result(0.99, "transfer_to_sales", "hot"))
        .await;
    let lead = h
        .service
        .create_lead(LeadSource::Scanner, Some(BusinessDomain::Second))
        .await
        .unwrap();
    h.service.analyze_lead(lead.id()).await.unwrap();
    assert_eq!(
        h.service.get_lead(lead.id()).await.unwrap().stage(),
        ColdStage::New
    );
}

#[tokio::test]
async fn unavailable_scorer_leaves_lead_untouched() {
    let h = harness_with(MockScorer::unavailable());
    let lead = h
        .service
        .create_lead(LeadSource::Manual, None)
        .await
        .unwrap();

    let err = h.service.analyze_lead(lead.id()).await.unwrap_err();
    assert!(matches!(err, LeadflowError::ScoringUnavailable { .. }));
    assert_eq!(h.service.get_lead(lead.id()).await.unwrap(), lead);
}

#[tokio::test]
async fn scorer_error_is_passed_through_unchanged() {
    let h = harness();
    h.scorer
        .push_error(LeadflowError::Scoring {
            message: "unparseable".into(),
            source: None,
        })
        .await;
    let lead = h
        .service
        .create_lead(LeadSource::Manual, None)
        .await
        .unwrap();
    let err = h.service.analyze_lead(lead.id()).await.unwrap_err();
    assert!(matches!(err, LeadflowError::Scoring { .. }));
    assert!(h.service.get_lead(lead.id()).await.unwrap().analysis().is_none());
}

#[tokio::test]
async fn out_of_range_score_is_rejected_and_lead_cannot_transfer() {
    let h = harness_with(MockScorer::with_results(vec![
        MockScorer::result(7.5, "transfer_to_sales", "overconfident"),
        MockScorer::result(f64::NAN, "transfer_to_sales", "broken"),
    ]));
    let id = qualified_lead(&h.service, Some(BusinessDomain::First)).await;
    let before = h.service.get_lead(id).await.unwrap();

    for _ in 0..2 {
        let err = h.service.analyze_lead(id).await.unwrap_err();
        assert!(matches!(err, LeadflowError::Scoring { .. }), "got {err:?}");
        assert_eq!(h.service.get_lead(id).await.unwrap(), before);
    }

    let err = h.service.transfer_to_sales(id).await.unwrap_err();
    assert!(matches!(err, LeadflowError::MissingAnalysis));
    assert_eq!(h.store.sale_count().await, 0);
}

#[tokio::test]
async fn manual_lead_transfer_reports_missing_analysis_first() {
    let h = harness();
    let lead = h
        .service
        .create_lead(LeadSource::Manual, None)
        .await
        .unwrap();
    let err = h.service.transfer_to_sales(lead.id()).await.unwrap_err();
    assert!(matches!(err, LeadflowError::MissingAnalysis));
    assert_eq!(h.store.sale_count().await, 0);
}

#[tokio::test]
async fn transfer_gate_failures_keep_their_own_kind() {
    let h = harness();
    let svc = &h.service;

    // Score below threshold.
    h.scorer
        .push_result(MockScorer::result(0.59, "continue_nurturing", "lukewarm"))
        .await;
    let id = qualified_lead(svc, Some(BusinessDomain::First)).await;
    svc.analyze_lead(id).await.unwrap();
    let err = svc.transfer_to_sales(id).await.unwrap_err();
    assert_eq!(err.kind(), "score_below_threshold");

    // Missing domain.
    h.scorer
        .push_result(MockScorer::result(0.9, "transfer_to_sales", "hot"))
        .await;
    let id = qualified_lead(svc, None).await;
    svc.analyze_lead(id).await.unwrap();
    let err = svc.transfer_to_sales(id).await.unwrap_err();
    assert_eq!(err.kind(), "missing_domain");

    // Wrong stage.
    h.scorer
        .push_result(MockScorer::result(0.9, "transfer_to_sales", "hot"))
        .await;
    let lead = svc
        .create_lead(LeadSource::Partner, Some(BusinessDomain::Third))
        .await
        .unwrap();
    svc.analyze_lead(lead.id()).await.unwrap();
    let err = svc.transfer_to_sales(lead.id()).await.unwrap_err();
    assert_eq!(err.kind(), "wrong_stage");

    assert_eq!(h.store.sale_count().await, 0);
}

#[tokio::test]
async fn failed_transfer_write_leaves_lead_qualified_without_sale() {
    let h = harness();
    h.scorer
        .push_result(MockScorer::result(0.7, "transfer_to_sales", "fit"))
        .await;
    let id = qualified_lead(&h.service, Some(BusinessDomain::Second)).await;
    h.service.analyze_lead(id).await.unwrap();

    h.store.fail_next_transfer();
    let err = h.service.transfer_to_sales(id).await.unwrap_err();
    assert!(matches!(err, LeadflowError::Storage { .. }));
    assert_eq!(
        h.service.get_lead(id).await.unwrap().stage(),
        ColdStage::Qualified
    );
    assert_eq!(h.store.sale_count().await, 0);

    // Retrying after the failure succeeds.
    h.service.transfer_to_sales(id).await.unwrap();
    assert_eq!(h.store.sale_count().await, 1);
}

#[tokio::test]
async fn lost_lead_stays_lost() {
    let h = harness();
    let lead = h
        .service
        .create_lead(LeadSource::Scanner, None)
        .await
        .unwrap();
    h.service
        .update_lead_stage(lead.id(), ColdStage::Lost)
        .await
        .unwrap();
    for stage in [ColdStage::New, ColdStage::Contacted, ColdStage::Lost] {
        let err = h
            .service
            .update_lead_stage(lead.id(), stage)
            .await
            .unwrap_err();
        assert!(matches!(err, LeadflowError::InvalidTransition { .. }));
    }
}

#[tokio::test]
async fn messages_count_updates_at_any_stage() {
    let h = harness();
    let lead = h
        .service
        .create_lead(LeadSource::Scanner, None)
        .await
        .unwrap();
    h.service
        .update_lead_stage(lead.id(), ColdStage::Lost)
        .await
        .unwrap();
    let updated = h.service.update_messages_count(lead.id(), 12).await.unwrap();
    assert_eq!(updated.messages_count(), 12);
    assert_eq!(updated.stage(), ColdStage::Lost);
}

#[tokio::test]
async fn leads_are_listed_newest_first() {
    let h = harness();
    let first = h
        .service
        .create_lead(LeadSource::Scanner, None)
        .await
        .unwrap();
    let second = h
        .service
        .create_lead(LeadSource::Partner, None)
        .await
        .unwrap();
    let ids: Vec<_> = h
        .service
        .list_leads()
        .await
        .unwrap()
        .iter()
        .map(|l| l.id())
        .collect();
    assert_eq!(ids, vec![second.id(), first.id()]);
}

#[tokio::test]
async fn sale_lookup_by_lead_without_sale_is_not_found() {
    let h = harness();
    let lead = h
        .service
        .create_lead(LeadSource::Scanner, None)
        .await
        .unwrap();
    let err = h.service.get_sale_by_lead(lead.id()).await.unwrap_err();
    assert!(matches!(err, LeadflowError::NotFound { entity: "sale", .. }));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_stage_updates_apply_exactly_once() {
    let h = harness();
    let lead = h
        .service
        .create_lead(LeadSource::Scanner, None)
        .await
        .unwrap();

    let tasks: Vec<_> = (0..8)
        .map(|_| {
            let svc = h.service.clone();
            let id = lead.id();
            tokio::spawn(async move { svc.update_lead_stage(id, ColdStage::Contacted).await })
        })
        .collect();

    let mut applied = 0;
    for task in tasks {
        match task.await.unwrap() {
            Ok(_) => applied += 1,
            Err(e) => assert!(
                matches!(e, LeadflowError::InvalidTransition { .. }),
                "unexpected error: {e:?}"
            ),
        }
    }
    assert_eq!(applied, 1);
    let stored = h.service.get_lead(lead.id()).await.unwrap();
    assert_eq!(stored.stage(), ColdStage::Contacted);
    assert_eq!(stored.version(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_transfers_create_exactly_one_sale() {
    let h = harness();
    h.scorer
        .push_result(MockScorer::result(0.9, "transfer_to_sales", "hot"))
        .await;
    let id = qualified_lead(&h.service, Some(BusinessDomain::First)).await;
    h.service.analyze_lead(id).await.unwrap();

    let tasks: Vec<_> = (0..8)
        .map(|_| {
            let svc = h.service.clone();
            tokio::spawn(async move { svc.transfer_to_sales(id).await })
        })
        .collect();

    let mut created = 0;
    for task in tasks {
        match task.await.unwrap() {
            Ok(_) => created += 1,
            Err(e) => assert!(
                matches!(
                    e,
                    LeadflowError::WrongStage {
                        current: ColdStage::Transferred
                    }
                ),
                "unexpected error: {e:?}"
            ),
        }
    }
    assert_eq!(created, 1);
    assert_eq!(h.store.sale_count().await, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn stage_change_during_slow_scoring_is_kept() {
    let h = harness_with(MockScorer::new().with_delay(Duration::from_millis(100)));
    h.scorer
        .push_result(MockScorer::result(0.65, "continue_nurturing", "ok"))
        .await;
    let lead = h
        .service
        .create_lead(LeadSource::Scanner, Some(BusinessDomain::First))
        .await
        .unwrap();

    let analysis = {
        let svc = h.service.clone();
        let id = lead.id();
        tokio::spawn(async move { svc.analyze_lead(id).await })
    };
    tokio::time::sleep(Duration::from_millis(20)).await;
    h.service
        .update_lead_stage(lead.id(), ColdStage::Contacted)
        .await
        .unwrap();

    analysis.await.unwrap().unwrap();
    let stored = h.service.get_lead(lead.id()).await.unwrap();
    assert_eq!(stored.stage(), ColdStage::Contacted);
    assert_eq!(stored.analysis().unwrap().score, 0.65);
}

#[traced_test]
#[tokio::test]
async fn rejected_stage_change_is_logged() {
    let h = harness();
    let lead = h
        .service
        .create_lead(LeadSource::Scanner, None)
        .await
        .unwrap();
    let _ = h
        .service
        .update_lead_stage(lead.id(), ColdStage::Transferred)
        .await;
    assert!(logs_contain("lead stage change rejected"));
}
