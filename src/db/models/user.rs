// src/db/models/user.rs
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Global role attached to every authenticated caller.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, sqlx::Type, ToSchema)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Employee,
    Chef,
    Admin,
}

impl Role {
    pub fn parse(value: &str) -> Option<Role> {
        match value.to_ascii_lowercase().as_str() {
            "employee" => Some(Role::Employee),
            "chef" => Some(Role::Chef),
            "admin" => Some(Role::Admin),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Employee => "employee",
            Role::Chef => "chef",
            Role::Admin => "admin",
        }
    }
}

/// Resolved caller identity, lifted from JWT claims by the auth middleware
/// and attached to every inbound call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Principal {
    pub id: i32,
    pub role: Role,
}

/// Directory record for a user. `chef_id` declares the supervision relation
/// used to scope what a chef may see and act on.
#[derive(Debug, Serialize, Deserialize, Clone, sqlx::FromRow, ToSchema)]
pub struct UserProfile {
    pub id: i32,
    pub username: String,
    pub role: Role,
    pub chef_id: Option<i32>,
}
