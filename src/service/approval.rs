use chrono::Utc;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use crate::error::{ReconcileError, Result};
use crate::models::{ApprovalDecision, MatchStatus, ThreeWayMatch};

/// Approve/reject workflow over an in-memory match registry.
///
/// Transitions run inside the registry entry's lock, so two racing calls
/// on the same match id serialize: at most one wins, the loser observes
/// the terminal state and gets `InvalidState`.
pub struct MatchApprovalWorkflow {
    matches: DashMap<String, ThreeWayMatch>,
}

impl MatchApprovalWorkflow {
    pub fn new() -> Self {
        Self {
            matches: DashMap::new(),
        }
    }

    /// Insert a freshly evaluated match, or refresh an open one when a
    /// receipt or invoice arrived since the last evaluation. A resolved
    /// match cannot be re-registered.
    pub fn register(&self, m: ThreeWayMatch) -> Result<String> {
        let id = m.id.clone();
        match self.matches.entry(id.clone()) {
            Entry::Occupied(mut entry) => {
                if entry.get().is_terminal() {
                    return Err(ReconcileError::InvalidState(format!(
                        "match {} is already resolved",
                        id
                    )));
                }
                entry.insert(m);
                Ok(id)
            }
            Entry::Vacant(entry) => {
                entry.insert(m);
                Ok(id)
            }
        }
    }

    pub fn get(&self, match_id: &str) -> Result<ThreeWayMatch> {
        self.matches
            .get(match_id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| ReconcileError::NotFound(format!("match {} is not registered", match_id)))
    }

    /// Approve a match, marking it payment eligible.
    ///
    /// A full match approves directly. A partial match or discrepancy
    /// carries variance and requires `override_variance` as explicit
    /// acceptance; a pending match has nothing to approve against.
    pub fn approve(
        &self,
        match_id: &str,
        comments: Option<String>,
        override_variance: bool,
    ) -> Result<ThreeWayMatch> {
        let mut entry = self.matches.get_mut(match_id).ok_or_else(|| {
            ReconcileError::NotFound(format!("match {} is not registered", match_id))
        })?;
        let m = entry.value_mut();
        if m.is_terminal() {
            return Err(ReconcileError::InvalidState(format!(
                "match {} is already resolved",
                match_id
            )));
        }
        match m.status {
            MatchStatus::Pending => {
                return Err(ReconcileError::PolicyViolation(format!(
                    "match {} has no receipt or invoice to approve against",
                    match_id
                )));
            }
            MatchStatus::FullMatch => {}
            MatchStatus::PartialMatch | MatchStatus::Discrepancy => {
                if !override_variance {
                    return Err(ReconcileError::PolicyViolation(format!(
                        "match {} carries variance; approval requires an explicit override",
                        match_id
                    )));
                }
            }
        }

        m.approval = Some(ApprovalDecision {
            approved: true,
            comments,
            override_variance,
            decided_at: Utc::now(),
        });
        // downstream payment-eligibility flag picked up by the payables run
        m.payment_eligible = true;
        Ok(m.clone())
    }

    /// Reject a match with a mandatory comment. Legal from any
    /// non-terminal status, including pending.
    pub fn reject(&self, match_id: &str, comments: &str) -> Result<ThreeWayMatch> {
        if comments.trim().is_empty() {
            return Err(ReconcileError::Validation(
                "rejection requires a non-empty comment".to_string(),
            ));
        }
        let mut entry = self.matches.get_mut(match_id).ok_or_else(|| {
            ReconcileError::NotFound(format!("match {} is not registered", match_id))
        })?;
        let m = entry.value_mut();
        if m.is_terminal() {
            return Err(ReconcileError::InvalidState(format!(
                "match {} is already resolved",
                match_id
            )));
        }

        m.approval = Some(ApprovalDecision {
            approved: false,
            comments: Some(comments.to_string()),
            override_variance: false,
            decided_at: Utc::now(),
        });
        Ok(m.clone())
    }
}

impl Default for MatchApprovalWorkflow {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PurchaseOrder, PurchaseOrderLine};
    use crate::service::matcher::evaluate_match;
    use bigdecimal::BigDecimal;

    fn dec(s: &str) -> BigDecimal {
        s.parse().unwrap()
    }

    fn sample_po() -> PurchaseOrder {
        PurchaseOrder {
            id: "po-1".to_string(),
            supplier_id: "sup-1".to_string(),
            lines: vec![PurchaseOrderLine {
                description: "widget".to_string(),
                ordered_qty: dec("10"),
                unit_price: dec("100"),
            }],
            total: dec("1000"),
        }
    }

    fn registered(workflow: &MatchApprovalWorkflow, status: MatchStatus) -> String {
        let po = sample_po();
        let mut m = evaluate_match(&po, None, None, &dec("5")).unwrap();
        m.status = status;
        workflow.register(m).unwrap()
    }

    #[test]
    fn full_match_approves_and_becomes_payment_eligible() {
        let workflow = MatchApprovalWorkflow::new();
        let id = registered(&workflow, MatchStatus::FullMatch);

        let m = workflow.approve(&id, None, false).unwrap();
        assert!(m.payment_eligible);
        let decision = m.approval.unwrap();
        assert!(decision.approved);
        assert!(!decision.override_variance);
    }

    #[test]
    fn partial_match_requires_override() {
        let workflow = MatchApprovalWorkflow::new();
        let id = registered(&workflow, MatchStatus::PartialMatch);

        let err = workflow.approve(&id, None, false).unwrap_err();
        assert!(matches!(err, ReconcileError::PolicyViolation(_)));

        let m = workflow
            .approve(&id, Some("accepting shortfall".to_string()), true)
            .unwrap();
        assert!(m.approval.unwrap().override_variance);
    }

    #[test]
    fn discrepancy_without_override_is_policy_violation() {
        let workflow = MatchApprovalWorkflow::new();
        let id = registered(&workflow, MatchStatus::Discrepancy);

        let err = workflow.approve(&id, None, false).unwrap_err();
        assert!(matches!(err, ReconcileError::PolicyViolation(_)));
    }

    #[test]
    fn pending_match_cannot_be_approved() {
        let workflow = MatchApprovalWorkflow::new();
        let id = registered(&workflow, MatchStatus::Pending);

        let err = workflow.approve(&id, None, true).unwrap_err();
        assert!(matches!(err, ReconcileError::PolicyViolation(_)));
    }

    #[test]
    fn reject_requires_a_comment() {
        let workflow = MatchApprovalWorkflow::new();
        let id = registered(&workflow, MatchStatus::Pending);

        let err = workflow.reject(&id, "").unwrap_err();
        assert!(matches!(err, ReconcileError::Validation(_)));
        let err = workflow.reject(&id, "   ").unwrap_err();
        assert!(matches!(err, ReconcileError::Validation(_)));
    }

    #[test]
    fn reject_is_legal_from_pending() {
        let workflow = MatchApprovalWorkflow::new();
        let id = registered(&workflow, MatchStatus::Pending);

        let m = workflow.reject(&id, "price too high").unwrap();
        let decision = m.approval.unwrap();
        assert!(!decision.approved);
        assert_eq!(decision.comments.as_deref(), Some("price too high"));
        assert!(!m.payment_eligible);
    }

    #[test]
    fn second_transition_on_terminal_match_fails() {
        let workflow = MatchApprovalWorkflow::new();
        let id = registered(&workflow, MatchStatus::FullMatch);

        workflow.approve(&id, None, false).unwrap();
        let err = workflow.approve(&id, None, false).unwrap_err();
        assert!(matches!(err, ReconcileError::InvalidState(_)));
        let err = workflow.reject(&id, "too late").unwrap_err();
        assert!(matches!(err, ReconcileError::InvalidState(_)));

        // state is unchanged by the failed calls
        let m = workflow.get(&id).unwrap();
        assert!(m.approval.unwrap().approved);
    }

    #[test]
    fn unknown_match_is_not_found() {
        let workflow = MatchApprovalWorkflow::new();
        let err = workflow.approve("match-nope", None, false).unwrap_err();
        assert!(matches!(err, ReconcileError::NotFound(_)));
        let err = workflow.reject("match-nope", "comment").unwrap_err();
        assert!(matches!(err, ReconcileError::NotFound(_)));
        let err = workflow.get("match-nope").unwrap_err();
        assert!(matches!(err, ReconcileError::NotFound(_)));
    }

    #[test]
    fn resolved_match_cannot_be_re_registered() {
        let workflow = MatchApprovalWorkflow::new();
        let id = registered(&workflow, MatchStatus::FullMatch);
        workflow.approve(&id, None, false).unwrap();

        let po = sample_po();
        let m = evaluate_match(&po, None, None, &dec("5")).unwrap();
        let err = workflow.register(m).unwrap_err();
        assert!(matches!(err, ReconcileError::InvalidState(_)));
    }

    #[test]
    fn open_match_is_refreshed_on_re_registration() {
        let workflow = MatchApprovalWorkflow::new();
        let id = registered(&workflow, MatchStatus::Pending);

        let po = sample_po();
        let mut m = evaluate_match(&po, None, None, &dec("5")).unwrap();
        m.status = MatchStatus::FullMatch;
        workflow.register(m).unwrap();

        assert_eq!(workflow.get(&id).unwrap().status, MatchStatus::FullMatch);
    }
}
