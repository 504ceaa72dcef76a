// src/db/store.rs
//
// Storage seam for the workflow. The state machine never talks to a database
// directly; it goes through `RequestStore`/`UserDirectory` so the Postgres
// implementation and the in-memory one used by tests are interchangeable.
use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{NaiveDateTime, Utc};
use tokio::sync::RwLock;

use crate::db::models::requests::{HrRequest, NewHrRequest, RequestStatus};
use crate::db::models::user::UserProfile;
use crate::workflow::DecisionTier;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Audit fields stamped by a single tier decision. The store writes either
/// the chef_* or the admin_* columns depending on `tier`.
#[derive(Debug, Clone)]
pub struct DecisionPatch {
    pub new_status: RequestStatus,
    pub tier: DecisionTier,
    pub text: String,
    pub decided_by: i32,
    pub decided_at: NaiveDateTime,
}

#[async_trait]
pub trait RequestStore: Send + Sync {
    async fn insert(&self, owner_id: i32, new: NewHrRequest) -> Result<HrRequest, StoreError>;

    async fn find_by_id(&self, id: i32) -> Result<Option<HrRequest>, StoreError>;

    async fn list_all(&self) -> Result<Vec<HrRequest>, StoreError>;

    async fn list_for_owner(&self, owner_id: i32) -> Result<Vec<HrRequest>, StoreError>;

    async fn list_for_owners(&self, owner_ids: &[i32]) -> Result<Vec<HrRequest>, StoreError>;

    /// Atomic compare-and-swap on status: the patch is applied only while the
    /// stored status still equals `expected`. Returns `None` when the guard
    /// fails, i.e. a concurrent caller already advanced the request.
    async fn apply_decision(
        &self,
        id: i32,
        expected: RequestStatus,
        patch: DecisionPatch,
    ) -> Result<Option<HrRequest>, StoreError>;

    /// Physical removal; gated by ownership/admin at the API layer, outside
    /// the state machine.
    async fn delete(&self, id: i32) -> Result<bool, StoreError>;
}

#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn find_user(&self, id: i32) -> Result<Option<UserProfile>, StoreError>;

    /// Declared subordinates of a chef (users whose `chef_id` is this chef).
    async fn subordinate_ids(&self, chef_id: i32) -> Result<Vec<i32>, StoreError>;
}

fn apply_patch(request: &mut HrRequest, patch: &DecisionPatch) {
    request.status = patch.new_status;
    match patch.tier {
        DecisionTier::Chef => {
            request.chef_observation = Some(patch.text.clone());
            request.chef_processed_by = Some(patch.decided_by);
            request.chef_processed_at = Some(patch.decided_at);
        }
        DecisionTier::Admin => {
            request.admin_response = Some(patch.text.clone());
            request.admin_processed_by = Some(patch.decided_by);
            request.admin_processed_at = Some(patch.decided_at);
        }
    }
}

#[derive(Default)]
struct MemoryInner {
    next_id: i32,
    requests: HashMap<i32, HrRequest>,
}

/// In-memory store. Each operation holds the write lock for its whole
/// read-modify-write cycle, which gives the same at-most-one-winner guarantee
/// as the conditional UPDATE in Postgres.
#[derive(Default)]
pub struct InMemoryStore {
    inner: RwLock<MemoryInner>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RequestStore for InMemoryStore {
    async fn insert(&self, owner_id: i32, new: NewHrRequest) -> Result<HrRequest, StoreError> {
        let mut inner = self.inner.write().await;
        inner.next_id += 1;
        let request = HrRequest {
            id: inner.next_id,
            category: new.category,
            user_id: owner_id,
            details: new.details,
            status: RequestStatus::Pending,
            chef_observation: None,
            chef_processed_by: None,
            chef_processed_at: None,
            admin_response: None,
            admin_processed_by: None,
            admin_processed_at: None,
            created_at: Utc::now().naive_utc(),
        };
        inner.requests.insert(request.id, request.clone());
        Ok(request)
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<HrRequest>, StoreError> {
        Ok(self.inner.read().await.requests.get(&id).cloned())
    }

    async fn list_all(&self) -> Result<Vec<HrRequest>, StoreError> {
        let inner = self.inner.read().await;
        let mut requests: Vec<_> = inner.requests.values().cloned().collect();
        requests.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(requests)
    }

    async fn list_for_owner(&self, owner_id: i32) -> Result<Vec<HrRequest>, StoreError> {
        self.list_for_owners(&[owner_id]).await
    }

    async fn list_for_owners(&self, owner_ids: &[i32]) -> Result<Vec<HrRequest>, StoreError> {
        let inner = self.inner.read().await;
        let mut requests: Vec<_> = inner
            .requests
            .values()
            .filter(|r| owner_ids.contains(&r.user_id))
            .cloned()
            .collect();
        requests.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(requests)
    }

    async fn apply_decision(
        &self,
        id: i32,
        expected: RequestStatus,
        patch: DecisionPatch,
    ) -> Result<Option<HrRequest>, StoreError> {
        let mut inner = self.inner.write().await;
        let Some(request) = inner.requests.get_mut(&id) else {
            return Ok(None);
        };
        if request.status != expected {
            return Ok(None);
        }
        apply_patch(request, &patch);
        Ok(Some(request.clone()))
    }

    async fn delete(&self, id: i32) -> Result<bool, StoreError> {
        Ok(self.inner.write().await.requests.remove(&id).is_some())
    }
}

/// In-memory user directory seeded from a fixed set of profiles.
#[derive(Default)]
pub struct InMemoryDirectory {
    users: HashMap<i32, UserProfile>,
}

impl InMemoryDirectory {
    pub fn new(profiles: impl IntoIterator<Item = UserProfile>) -> Self {
        Self {
            users: profiles.into_iter().map(|p| (p.id, p)).collect(),
        }
    }
}

#[async_trait]
impl UserDirectory for InMemoryDirectory {
    async fn find_user(&self, id: i32) -> Result<Option<UserProfile>, StoreError> {
        Ok(self.users.get(&id).cloned())
    }

    async fn subordinate_ids(&self, chef_id: i32) -> Result<Vec<i32>, StoreError> {
        Ok(self
            .users
            .values()
            .filter(|u| u.chef_id == Some(chef_id))
            .map(|u| u.id)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::db::models::requests::RequestCategory;

    fn leave_request() -> NewHrRequest {
        NewHrRequest {
            category: RequestCategory::Leave,
            details: serde_json::json!({"days": 5}),
        }
    }

    fn admin_patch(status: RequestStatus) -> DecisionPatch {
        DecisionPatch {
            new_status: status,
            tier: DecisionTier::Admin,
            text: "ok".into(),
            decided_by: 99,
            decided_at: Utc::now().naive_utc(),
        }
    }

    #[tokio::test]
    async fn insert_assigns_sequential_ids_and_pending_status() {
        let store = InMemoryStore::new();
        let first = store.insert(1, leave_request()).await.unwrap();
        let second = store.insert(2, leave_request()).await.unwrap();
        assert_eq!(first.status, RequestStatus::Pending);
        assert!(second.id > first.id);
        assert_eq!(store.find_by_id(first.id).await.unwrap().unwrap().id, first.id);
    }

    #[tokio::test]
    async fn apply_decision_rejects_stale_expected_status() {
        let store = InMemoryStore::new();
        let request = store.insert(1, leave_request()).await.unwrap();

        let won = store
            .apply_decision(
                request.id,
                RequestStatus::Pending,
                admin_patch(RequestStatus::FinalApproved),
            )
            .await
            .unwrap();
        assert_eq!(won.unwrap().status, RequestStatus::FinalApproved);

        // Same guard again: the status moved, so the second writer loses.
        let lost = store
            .apply_decision(
                request.id,
                RequestStatus::Pending,
                admin_patch(RequestStatus::FinalRejected),
            )
            .await
            .unwrap();
        assert!(lost.is_none());
        let stored = store.find_by_id(request.id).await.unwrap().unwrap();
        assert_eq!(stored.status, RequestStatus::FinalApproved);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_decisions_have_exactly_one_winner() {
        let store = Arc::new(InMemoryStore::new());
        let request = store.insert(1, leave_request()).await.unwrap();

        let mut handles = Vec::new();
        for status in [RequestStatus::FinalApproved, RequestStatus::FinalRejected] {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store
                    .apply_decision(request.id, RequestStatus::Pending, admin_patch(status))
                    .await
                    .unwrap()
            }));
        }

        let mut winners = 0;
        for handle in handles {
            if handle.await.unwrap().is_some() {
                winners += 1;
            }
        }
        assert_eq!(winners, 1);
    }

    #[tokio::test]
    async fn decision_patch_stamps_only_its_tier() {
        let store = InMemoryStore::new();
        let request = store.insert(7, leave_request()).await.unwrap();
        let patch = DecisionPatch {
            new_status: RequestStatus::ChefApproved,
            tier: DecisionTier::Chef,
            text: "vu".into(),
            decided_by: 3,
            decided_at: Utc::now().naive_utc(),
        };
        let updated = store
            .apply_decision(request.id, RequestStatus::Pending, patch)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.chef_processed_by, Some(3));
        assert_eq!(updated.chef_observation.as_deref(), Some("vu"));
        assert!(updated.admin_processed_by.is_none());
        assert!(updated.admin_response.is_none());
    }

    #[tokio::test]
    async fn directory_scopes_subordinates_by_chef_id() {
        use crate::db::models::user::{Role, UserProfile};
        let dir = InMemoryDirectory::new([
            UserProfile { id: 1, username: "amina".into(), role: Role::Employee, chef_id: Some(3) },
            UserProfile { id: 2, username: "karim".into(), role: Role::Employee, chef_id: Some(4) },
            UserProfile { id: 3, username: "yacine".into(), role: Role::Chef, chef_id: None },
        ]);
        let mut ids = dir.subordinate_ids(3).await.unwrap();
        ids.sort();
        assert_eq!(ids, vec![1]);
        assert!(dir.subordinate_ids(9).await.unwrap().is_empty());
    }
}
