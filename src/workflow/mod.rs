// src/workflow/mod.rs
//
// The approval state machine. `plan_transition` is a pure function over the
// request snapshot and the caller; committing the plan is the store's
// compare-and-swap, so a plan computed against a stale snapshot can only end
// in `Conflict`, never in a silently overwritten status.
pub mod orchestrator;
pub mod targeting;

use serde::{Deserialize, Serialize};

use crate::db::models::requests::{HrRequest, Outcome, RequestCategory, RequestStatus};
use crate::db::models::user::{Principal, Role};
use crate::db::store::StoreError;

#[derive(Debug, thiserror::Error)]
pub enum WorkflowError {
    #[error("request not found")]
    NotFound,
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    Validation(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Which tier of the approval chain produced a decision.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DecisionTier {
    Chef,
    Admin,
}

/// Emitted once per committed workflow step; input to the targeting policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkflowEvent {
    Created {
        request_id: i32,
        category: RequestCategory,
        owner_id: i32,
        owner_name: String,
    },
    Decided {
        request_id: i32,
        category: RequestCategory,
        owner_id: i32,
        owner_name: String,
        outcome: Outcome,
        tier: DecisionTier,
        actor_id: i32,
    },
}

/// A validated transition, ready to commit. `expected` is the status the
/// plan was computed against and becomes the CAS guard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitionPlan {
    pub expected: RequestStatus,
    pub new_status: RequestStatus,
    pub tier: DecisionTier,
}

/// Validates a requested transition against the request's current state, the
/// caller's role and the request's category.
///
/// `supervises_owner` is the chef-subordinate relation resolved by the
/// caller; it is only consulted for chef principals.
pub fn plan_transition(
    request: &HrRequest,
    principal: &Principal,
    outcome: Outcome,
    observation: &str,
    supervises_owner: bool,
) -> Result<TransitionPlan, WorkflowError> {
    if observation.trim().is_empty() {
        return Err(WorkflowError::Validation(
            "an observation is required".into(),
        ));
    }

    match principal.role {
        Role::Chef => {
            if !request.category.requires_chef_step() {
                return Err(WorkflowError::Forbidden(
                    "chef cannot act on this category".into(),
                ));
            }
            if !supervises_owner {
                return Err(WorkflowError::Forbidden("not your subordinate".into()));
            }
            if request.status != RequestStatus::Pending {
                return Err(WorkflowError::Conflict("already processed".into()));
            }
            let new_status = match outcome {
                Outcome::Approve => RequestStatus::ChefApproved,
                Outcome::Reject => RequestStatus::ChefRejected,
            };
            Ok(TransitionPlan {
                expected: request.status,
                new_status,
                tier: DecisionTier::Chef,
            })
        }
        Role::Admin => {
            if request.category.requires_chef_step() {
                match request.status {
                    RequestStatus::ChefApproved | RequestStatus::ChefRejected => {}
                    RequestStatus::Pending => {
                        return Err(WorkflowError::Conflict("awaiting chef decision".into()));
                    }
                    _ => return Err(WorkflowError::Conflict("already processed".into())),
                }
            } else if request.status != RequestStatus::Pending {
                return Err(WorkflowError::Conflict("already processed".into()));
            }
            let new_status = match outcome {
                Outcome::Approve => RequestStatus::FinalApproved,
                Outcome::Reject => RequestStatus::FinalRejected,
            };
            Ok(TransitionPlan {
                expected: request.status,
                new_status,
                tier: DecisionTier::Admin,
            })
        }
        Role::Employee => Err(WorkflowError::Forbidden(
            "employees cannot decide on requests".into(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn request(category: RequestCategory, status: RequestStatus) -> HrRequest {
        HrRequest {
            id: 1,
            category,
            user_id: 10,
            details: serde_json::json!({}),
            status,
            chef_observation: None,
            chef_processed_by: None,
            chef_processed_at: None,
            admin_response: None,
            admin_processed_by: None,
            admin_processed_at: None,
            created_at: Utc::now().naive_utc(),
        }
    }

    const CHEF: Principal = Principal { id: 3, role: Role::Chef };
    const ADMIN: Principal = Principal { id: 9, role: Role::Admin };
    const EMPLOYEE: Principal = Principal { id: 10, role: Role::Employee };

    #[test]
    fn chef_approves_pending_leave_request() {
        let req = request(RequestCategory::Leave, RequestStatus::Pending);
        let plan = plan_transition(&req, &CHEF, Outcome::Approve, "ok", true).unwrap();
        assert_eq!(plan.new_status, RequestStatus::ChefApproved);
        assert_eq!(plan.expected, RequestStatus::Pending);
        assert_eq!(plan.tier, DecisionTier::Chef);
    }

    #[test]
    fn chef_cannot_act_on_no_chef_step_category() {
        let req = request(RequestCategory::Document, RequestStatus::Pending);
        let err = plan_transition(&req, &CHEF, Outcome::Approve, "ok", true).unwrap_err();
        assert!(matches!(err, WorkflowError::Forbidden(_)));
    }

    #[test]
    fn chef_cannot_act_on_non_subordinate() {
        let req = request(RequestCategory::Leave, RequestStatus::Pending);
        let err = plan_transition(&req, &CHEF, Outcome::Approve, "ok", false).unwrap_err();
        assert!(matches!(err, WorkflowError::Forbidden(_)));
    }

    #[test]
    fn chef_gets_conflict_on_already_processed_request() {
        // Scenario C: approving a request already in CHEF_REJECTED.
        let req = request(RequestCategory::Leave, RequestStatus::ChefRejected);
        let err = plan_transition(&req, &CHEF, Outcome::Approve, "ok", true).unwrap_err();
        assert!(matches!(err, WorkflowError::Conflict(_)));
    }

    #[test]
    fn admin_must_wait_for_chef_on_chef_step_categories() {
        let req = request(RequestCategory::Training, RequestStatus::Pending);
        let err = plan_transition(&req, &ADMIN, Outcome::Approve, "ok", true).unwrap_err();
        match err {
            WorkflowError::Conflict(msg) => assert_eq!(msg, "awaiting chef decision"),
            other => panic!("expected Conflict, got {other:?}"),
        }
    }

    #[test]
    fn admin_outcome_is_independent_of_chef_outcome() {
        // Admin may approve after a chef rejection and vice versa.
        let rejected = request(RequestCategory::Leave, RequestStatus::ChefRejected);
        let plan = plan_transition(&rejected, &ADMIN, Outcome::Approve, "ok", true).unwrap();
        assert_eq!(plan.new_status, RequestStatus::FinalApproved);

        let approved = request(RequestCategory::Leave, RequestStatus::ChefApproved);
        let plan = plan_transition(&approved, &ADMIN, Outcome::Reject, "budget", true).unwrap();
        assert_eq!(plan.new_status, RequestStatus::FinalRejected);
    }

    #[test]
    fn admin_decides_directly_on_categories_without_chef_step() {
        let req = request(RequestCategory::Document, RequestStatus::Pending);
        let plan = plan_transition(&req, &ADMIN, Outcome::Approve, "ok", true).unwrap();
        assert_eq!(plan.new_status, RequestStatus::FinalApproved);
        assert_eq!(plan.tier, DecisionTier::Admin);
    }

    #[test]
    fn terminal_states_reject_every_transition() {
        for status in [RequestStatus::FinalApproved, RequestStatus::FinalRejected] {
            for category in [RequestCategory::Leave, RequestCategory::Loan] {
                let req = request(category, status);
                let err =
                    plan_transition(&req, &ADMIN, Outcome::Reject, "again", true).unwrap_err();
                assert!(matches!(err, WorkflowError::Conflict(_)));
            }
        }
    }

    #[test]
    fn employee_is_forbidden() {
        let req = request(RequestCategory::Leave, RequestStatus::Pending);
        let err = plan_transition(&req, &EMPLOYEE, Outcome::Approve, "ok", true).unwrap_err();
        assert!(matches!(err, WorkflowError::Forbidden(_)));
    }

    #[test]
    fn empty_observation_is_a_validation_error() {
        // Scenario D: whitespace-only text counts as empty.
        let req = request(RequestCategory::Leave, RequestStatus::Pending);
        let err = plan_transition(&req, &CHEF, Outcome::Approve, "   ", true).unwrap_err();
        assert!(matches!(err, WorkflowError::Validation(_)));
    }
}
