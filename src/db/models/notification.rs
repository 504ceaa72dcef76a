// src/db/models/notification.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::user::Role;

/// Severity tag carried on every notification; drives frontend styling.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Success,
    Warning,
    Error,
}

/// Structured recipient descriptor. Routing is resolved from this field at
/// delivery time; message text is never parsed to decide who sees what.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, ToSchema)]
#[serde(tag = "scope", rename_all = "snake_case")]
pub enum Recipient {
    /// One specific user, every live session they hold.
    User { user_id: i32 },
    /// Every live session tagged with the role.
    Role { role: Role },
    /// Every live session except those tagged with the role.
    AllExceptRole { role: Role },
}

#[derive(Debug, Serialize, Deserialize, Clone, ToSchema)]
pub struct Notification {
    /// Time-ordered, collision-resistant id.
    pub id: Uuid,
    pub message: String,
    #[serde(rename = "type")]
    pub severity: Severity,
    pub timestamp: DateTime<Utc>,
    pub read: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    pub recipient: Recipient,
}

impl Notification {
    pub fn new(
        recipient: Recipient,
        message: impl Into<String>,
        severity: Severity,
        link: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::now_v7(),
            message: message.into(),
            severity,
            timestamp: Utc::now(),
            read: false,
            link,
            recipient,
        }
    }
}
