// src/db/models/requests.rs
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Category of an HR request. Immutable after creation; decides whether the
/// request goes through the chef before reaching the admin.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, sqlx::Type, ToSchema)]
#[sqlx(type_name = "request_category", rename_all = "snake_case")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RequestCategory {
    Leave,
    Training,
    Certificate,
    Loan,
    Advance,
    Document,
}

impl RequestCategory {
    /// LEAVE and TRAINING require a chef decision first; every other
    /// category goes straight to the admin.
    pub fn requires_chef_step(self) -> bool {
        matches!(self, RequestCategory::Leave | RequestCategory::Training)
    }

    /// French label used in notification copy.
    pub fn label_fr(self) -> &'static str {
        match self {
            RequestCategory::Leave => "congé",
            RequestCategory::Training => "formation",
            RequestCategory::Certificate => "attestation",
            RequestCategory::Loan => "prêt",
            RequestCategory::Advance => "avance",
            RequestCategory::Document => "document",
        }
    }
}

/// Workflow status of a request. Localized labels shown by the frontend
/// ("En attente", "Chef approuvé", ...) are presentation only; business
/// logic compares against this enum exclusively.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, sqlx::Type, ToSchema)]
#[sqlx(type_name = "request_status", rename_all = "snake_case")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RequestStatus {
    Pending,
    ChefApproved,
    ChefRejected,
    FinalApproved,
    FinalRejected,
}

impl RequestStatus {
    /// No transition is defined out of a final status.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            RequestStatus::FinalApproved | RequestStatus::FinalRejected
        )
    }
}

/// The decision an approver submits at either tier.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Outcome {
    Approve,
    Reject,
}

#[derive(Debug, Serialize, Deserialize, Clone, sqlx::FromRow, ToSchema)]
pub struct HrRequest {
    pub id: i32,
    pub category: RequestCategory,
    /// Owning employee.
    pub user_id: i32,
    /// Category-specific payload, opaque to the workflow.
    pub details: serde_json::Value,
    pub status: RequestStatus,
    pub chef_observation: Option<String>,
    pub chef_processed_by: Option<i32>,
    pub chef_processed_at: Option<NaiveDateTime>,
    pub admin_response: Option<String>,
    pub admin_processed_by: Option<i32>,
    pub admin_processed_at: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct NewHrRequest {
    pub category: RequestCategory,
    #[serde(default)]
    pub details: serde_json::Value,
}

/// Body of `PATCH /requests/{id}/status`.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SetStatusPayload {
    pub outcome: Outcome,
    /// Required free-text justification; rejected when empty after trimming.
    pub observation: String,
}
