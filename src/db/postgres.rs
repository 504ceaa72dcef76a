// src/db/postgres.rs
//
// Postgres implementations of the storage seam. Plain runtime queries: the
// compare-and-swap is the `AND status = $n` guard on the UPDATE, so two
// concurrent decisions on the same request can never both return a row.
use std::time::Duration;

use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use crate::db::models::requests::{HrRequest, NewHrRequest, RequestStatus};
use crate::db::models::user::UserProfile;
use crate::db::store::{DecisionPatch, RequestStore, StoreError, UserDirectory};
use crate::workflow::DecisionTier;

const REQUEST_COLUMNS: &str = "id, category, user_id, details, status, \
     chef_observation, chef_processed_by, chef_processed_at, \
     admin_response, admin_processed_by, admin_processed_at, created_at";

pub async fn create_pool(database_url: &str) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .idle_timeout(Duration::from_secs(30))
        .connect(database_url)
        .await
}

pub struct PgRequestStore {
    pool: PgPool,
}

impl PgRequestStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RequestStore for PgRequestStore {
    async fn insert(&self, owner_id: i32, new: NewHrRequest) -> Result<HrRequest, StoreError> {
        let request = sqlx::query_as::<_, HrRequest>(&format!(
            "INSERT INTO requests (category, user_id, details, status)
             VALUES ($1, $2, $3, $4)
             RETURNING {REQUEST_COLUMNS}"
        ))
        .bind(new.category)
        .bind(owner_id)
        .bind(new.details)
        .bind(RequestStatus::Pending)
        .fetch_one(&self.pool)
        .await?;
        Ok(request)
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<HrRequest>, StoreError> {
        let request = sqlx::query_as::<_, HrRequest>(&format!(
            "SELECT {REQUEST_COLUMNS} FROM requests WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(request)
    }

    async fn list_all(&self) -> Result<Vec<HrRequest>, StoreError> {
        let requests = sqlx::query_as::<_, HrRequest>(&format!(
            "SELECT {REQUEST_COLUMNS} FROM requests ORDER BY created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(requests)
    }

    async fn list_for_owner(&self, owner_id: i32) -> Result<Vec<HrRequest>, StoreError> {
        let requests = sqlx::query_as::<_, HrRequest>(&format!(
            "SELECT {REQUEST_COLUMNS} FROM requests WHERE user_id = $1 ORDER BY created_at DESC"
        ))
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(requests)
    }

    async fn list_for_owners(&self, owner_ids: &[i32]) -> Result<Vec<HrRequest>, StoreError> {
        let requests = sqlx::query_as::<_, HrRequest>(&format!(
            "SELECT {REQUEST_COLUMNS} FROM requests WHERE user_id = ANY($1) ORDER BY created_at DESC"
        ))
        .bind(owner_ids)
        .fetch_all(&self.pool)
        .await?;
        Ok(requests)
    }

    async fn apply_decision(
        &self,
        id: i32,
        expected: RequestStatus,
        patch: DecisionPatch,
    ) -> Result<Option<HrRequest>, StoreError> {
        let sql = match patch.tier {
            DecisionTier::Chef => format!(
                "UPDATE requests
                 SET status = $1, chef_observation = $2, chef_processed_by = $3, chef_processed_at = $4
                 WHERE id = $5 AND status = $6
                 RETURNING {REQUEST_COLUMNS}"
            ),
            DecisionTier::Admin => format!(
                "UPDATE requests
                 SET status = $1, admin_response = $2, admin_processed_by = $3, admin_processed_at = $4
                 WHERE id = $5 AND status = $6
                 RETURNING {REQUEST_COLUMNS}"
            ),
        };
        let updated = sqlx::query_as::<_, HrRequest>(&sql)
            .bind(patch.new_status)
            .bind(&patch.text)
            .bind(patch.decided_by)
            .bind(patch.decided_at)
            .bind(id)
            .bind(expected)
            .fetch_optional(&self.pool)
            .await?;
        Ok(updated)
    }

    async fn delete(&self, id: i32) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM requests WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

pub struct PgUserDirectory {
    pool: PgPool,
}

impl PgUserDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserDirectory for PgUserDirectory {
    async fn find_user(&self, id: i32) -> Result<Option<UserProfile>, StoreError> {
        let user = sqlx::query_as::<_, UserProfile>(
            "SELECT id, username, role, chef_id FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn subordinate_ids(&self, chef_id: i32) -> Result<Vec<i32>, StoreError> {
        let ids: Vec<i32> = sqlx::query_scalar("SELECT id FROM users WHERE chef_id = $1")
            .bind(chef_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(ids)
    }
}
