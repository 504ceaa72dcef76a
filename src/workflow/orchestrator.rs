// src/workflow/orchestrator.rs
//
// Thin coordination layer: authorize, run the state machine, commit through
// the store, then fan the resulting notifications out to the sink. On any
// failure nothing is dispatched and the error is surfaced unchanged.
use chrono::Utc;

use crate::app_state::AppState;
use crate::db::models::requests::{HrRequest, NewHrRequest, SetStatusPayload};
use crate::db::models::user::{Principal, Role};
use crate::db::store::DecisionPatch;
use crate::workflow::targeting::recipients_for;
use crate::workflow::{plan_transition, WorkflowError, WorkflowEvent};

async fn owner_display_name(state: &AppState, owner_id: i32) -> String {
    match state.users.find_user(owner_id).await {
        Ok(Some(profile)) => profile.username,
        _ => format!("employé #{owner_id}"),
    }
}

fn dispatch(state: &AppState, event: &WorkflowEvent) {
    for draft in recipients_for(event) {
        state.sink.deliver(&draft.into_notification());
    }
}

/// Creates a request in PENDING and notifies the approval audience.
pub async fn create_request(
    state: &AppState,
    principal: &Principal,
    new: NewHrRequest,
) -> Result<HrRequest, WorkflowError> {
    let request = state.store.insert(principal.id, new).await?;
    tracing::info!(
        request_id = request.id,
        owner_id = request.user_id,
        category = ?request.category,
        "request created"
    );

    let event = WorkflowEvent::Created {
        request_id: request.id,
        category: request.category,
        owner_id: request.user_id,
        owner_name: owner_display_name(state, request.user_id).await,
    };
    dispatch(state, &event);
    Ok(request)
}

/// The setStatus operation: one tier of the approval chain decides.
pub async fn set_status(
    state: &AppState,
    principal: &Principal,
    request_id: i32,
    payload: SetStatusPayload,
) -> Result<HrRequest, WorkflowError> {
    let request = state
        .store
        .find_by_id(request_id)
        .await?
        .ok_or(WorkflowError::NotFound)?;

    // Supervision relation is only meaningful for chefs; resolved here so
    // the planner stays pure.
    let supervises_owner = match principal.role {
        Role::Chef => state
            .subordinates_of(principal.id)
            .await?
            .contains(&request.user_id),
        _ => true,
    };

    let plan = plan_transition(
        &request,
        principal,
        payload.outcome,
        &payload.observation,
        supervises_owner,
    )?;

    let patch = DecisionPatch {
        new_status: plan.new_status,
        tier: plan.tier,
        text: payload.observation.trim().to_string(),
        decided_by: principal.id,
        decided_at: Utc::now().naive_utc(),
    };

    let updated = state
        .store
        .apply_decision(request_id, plan.expected, patch)
        .await?
        .ok_or_else(|| WorkflowError::Conflict("already processed".into()))?;

    tracing::info!(
        request_id,
        actor_id = principal.id,
        new_status = ?updated.status,
        "request transitioned"
    );

    let event = WorkflowEvent::Decided {
        request_id: updated.id,
        category: updated.category,
        owner_id: updated.user_id,
        owner_name: owner_display_name(state, updated.user_id).await,
        outcome: payload.outcome,
        tier: plan.tier,
        actor_id: principal.id,
    };
    dispatch(state, &event);
    Ok(updated)
}

/// Physical removal, gated by ownership or the admin role. Independent of
/// the state machine: no transition rules apply and nothing is notified.
pub async fn delete_request(
    state: &AppState,
    principal: &Principal,
    request_id: i32,
) -> Result<(), WorkflowError> {
    let request = state
        .store
        .find_by_id(request_id)
        .await?
        .ok_or(WorkflowError::NotFound)?;

    if principal.role != Role::Admin && request.user_id != principal.id {
        return Err(WorkflowError::Forbidden(
            "only the owner or an admin may delete a request".into(),
        ));
    }

    state.store.delete(request_id).await?;
    tracing::info!(request_id, actor_id = principal.id, "request deleted");
    Ok(())
}
