// SPDX-FileCopyrightText: 2026 Leadflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Transfer gate: the checks a lead must pass to become a sale.
//!
//! Checks run in a fixed order and the first failure is returned, so each
//! precondition keeps its own error kind.

use tracing::info;

use crate::error::LeadflowError;
use crate::lead::Lead;
use crate::sale::Sale;
use crate::stage::ColdStage;

/// Minimum AI score (inclusive) required for a transfer.
pub const MIN_TRANSFER_SCORE: f64 = 0.6;

type Check = fn(&Lead) -> Result<(), LeadflowError>;

/// Ordered transfer preconditions.
const CHECKS: [Check; 4] = [
    require_analysis,
    require_min_score,
    require_business_domain,
    require_qualified,
];

fn require_analysis(lead: &Lead) -> Result<(), LeadflowError> {
    match lead.analysis() {
        Some(_) => Ok(()),
        None => Err(LeadflowError::MissingAnalysis),
    }
}

fn require_min_score(lead: &Lead) -> Result<(), LeadflowError> {
    let Some(analysis) = lead.analysis() else {
        return Err(LeadflowError::MissingAnalysis);
    };
    // Written as a negated `>=` so a NaN score fails the check.
    if !(analysis.score >= MIN_TRANSFER_SCORE) {
        return Err(LeadflowError::ScoreBelowThreshold {
            score: analysis.score,
            threshold: MIN_TRANSFER_SCORE,
        });
    }
    Ok(())
}

fn require_business_domain(lead: &Lead) -> Result<(), LeadflowError> {
    match lead.business_domain() {
        Some(_) => Ok(()),
        None => Err(LeadflowError::MissingDomain),
    }
}

fn require_qualified(lead: &Lead) -> Result<(), LeadflowError> {
    if lead.stage() != ColdStage::Qualified {
        return Err(LeadflowError::WrongStage {
            current: lead.stage(),
        });
    }
    Ok(())
}

/// Runs every transfer check without mutating anything.
pub fn check_eligibility(lead: &Lead) -> Result<(), LeadflowError> {
    CHECKS.iter().try_for_each(|check| check(lead))
}

/// Converts an eligible lead into a sale.
///
/// On success the lead is moved to `transferred` and the new sale (stage
/// `new`, bound to the lead) is returned. Both belong to one unit of work:
/// the caller must persist them together. On failure neither exists and the
/// lead is unchanged.
pub fn attempt_transfer(lead: &mut Lead) -> Result<Sale, LeadflowError> {
    check_eligibility(lead)?;
    lead.update_stage(ColdStage::Transferred)?;
    let sale = Sale::open_for(lead.id());
    info!(lead_id = %lead.id(), sale_id = %sale.id(), "lead transferred to sales");
    Ok(sale)
}

#[cfg(test)]
mod tests {
    use tracing_test::traced_test;

    use super::*;
    use crate::lead::LeadRecord;
    use crate::stage::SaleStage;
    use crate::types::{AiResult, BusinessDomain, LeadSource};

    fn scored(score: f64) -> AiResult {
        AiResult {
            score,
            recommendation: "transfer_to_sales".into(),
            reason: "strong fit".into(),
        }
    }

    /// A lead that passes every check.
    fn eligible_lead(score: f64) -> Lead {
        let mut lead = Lead::create(LeadSource::Scanner, Some(BusinessDomain::First));
        lead.update_stage(ColdStage::Contacted).unwrap();
        lead.update_stage(ColdStage::Qualified).unwrap();
        lead.record_ai_analysis(scored(score)).unwrap();
        lead
    }

    #[test]
    fn exact_threshold_passes() {
        let mut lead = eligible_lead(0.6);
        let sale = attempt_transfer(&mut lead).unwrap();
        assert_eq!(lead.stage(), ColdStage::Transferred);
        assert_eq!(sale.lead_id(), lead.id());
        assert_eq!(sale.stage(), SaleStage::New);
    }

    #[test]
    fn just_below_threshold_fails() {
        let mut lead = eligible_lead(0.59999);
        let err = attempt_transfer(&mut lead).unwrap_err();
        match err {
            LeadflowError::ScoreBelowThreshold { score, threshold } => {
                assert_eq!(score, 0.59999);
                assert_eq!(threshold, MIN_TRANSFER_SCORE);
            }
            other => panic!("expected ScoreBelowThreshold, got {other:?}"),
        }
        assert_eq!(lead.stage(), ColdStage::Qualified);
    }

    #[test]
    fn nan_score_fails() {
        // Only reachable through a rebuilt record; recording rejects NaN.
        let mut record = LeadRecord::from(&eligible_lead(0.9));
        record.ai_score = Some(f64::NAN);
        let mut lead = Lead::from_record(record).unwrap();
        assert!(matches!(
            attempt_transfer(&mut lead),
            Err(LeadflowError::ScoreBelowThreshold { .. })
        ));
    }

    #[test]
    fn out_of_range_score_never_reaches_the_gate() {
        let mut lead = Lead::create(LeadSource::Scanner, Some(BusinessDomain::First));
        lead.update_stage(ColdStage::Contacted).unwrap();
        lead.update_stage(ColdStage::Qualified).unwrap();
        assert!(lead.record_ai_analysis(scored(7.5)).is_err());

        let err = attempt_transfer(&mut lead).unwrap_err();
        assert!(matches!(err, LeadflowError::MissingAnalysis), "got {err:?}");
        assert_eq!(lead.stage(), ColdStage::Qualified);
    }

    #[test]
    fn each_single_failure_maps_to_its_own_error() {
        // No analysis.
        let mut lead = Lead::create(LeadSource::Scanner, Some(BusinessDomain::First));
        lead.update_stage(ColdStage::Contacted).unwrap();
        lead.update_stage(ColdStage::Qualified).unwrap();
        assert!(matches!(
            check_eligibility(&lead),
            Err(LeadflowError::MissingAnalysis)
        ));

        // Low score.
        let lead = eligible_lead(0.4);
        assert!(matches!(
            check_eligibility(&lead),
            Err(LeadflowError::ScoreBelowThreshold { .. })
        ));

        // No domain.
        let mut lead = Lead::create(LeadSource::Scanner, None);
        lead.update_stage(ColdStage::Contacted).unwrap();
        lead.update_stage(ColdStage::Qualified).unwrap();
        lead.record_ai_analysis(scored(0.9)).unwrap();
        assert!(matches!(
            check_eligibility(&lead),
            Err(LeadflowError::MissingDomain)
        ));

        // Wrong stage.
        let mut lead = Lead::create(LeadSource::Scanner, Some(BusinessDomain::First));
        lead.update_stage(ColdStage::Contacted).unwrap();
        lead.record_ai_analysis(scored(0.9)).unwrap();
        assert!(matches!(
            check_eligibility(&lead),
            Err(LeadflowError::WrongStage {
                current: ColdStage::Contacted
            })
        ));
    }

    #[test]
    fn missing_analysis_is_reported_before_missing_domain() {
        let mut lead = Lead::create(LeadSource::Manual, None);
        let err = attempt_transfer(&mut lead).unwrap_err();
        assert!(matches!(err, LeadflowError::MissingAnalysis), "got {err:?}");
    }

    #[test]
    fn low_score_is_reported_before_wrong_stage() {
        let mut lead = Lead::create(LeadSource::Partner, None);
        lead.record_ai_analysis(scored(0.1)).unwrap();
        let err = attempt_transfer(&mut lead).unwrap_err();
        assert!(matches!(err, LeadflowError::ScoreBelowThreshold { .. }));
    }

    #[test]
    fn already_transferred_lead_fails_with_wrong_stage() {
        let mut lead = eligible_lead(0.9);
        attempt_transfer(&mut lead).unwrap();
        let err = attempt_transfer(&mut lead).unwrap_err();
        assert!(matches!(
            err,
            LeadflowError::WrongStage {
                current: ColdStage::Transferred
            }
        ));
    }

    #[test]
    fn failed_transfer_leaves_lead_untouched() {
        let mut lead = eligible_lead(0.2);
        let snapshot = lead.clone();
        assert!(attempt_transfer(&mut lead).is_err());
        assert_eq!(lead, snapshot);
    }

    #[traced_test]
    #[test]
    fn successful_transfer_is_logged() {
        let mut lead = eligible_lead(0.75);
        let sale = attempt_transfer(&mut lead).unwrap();
        assert!(logs_contain("lead transferred to sales"));
        assert!(logs_contain(&sale.id().to_string()));
    }
}
