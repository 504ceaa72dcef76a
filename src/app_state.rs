// src/app_state.rs
use std::sync::Arc;
use std::time::Duration;

use moka::sync::Cache;

use crate::db::store::{RequestStore, StoreError, UserDirectory};
use crate::ws::dispatcher::{NotificationSink, SessionRegistry};

/// TTL cache of chef -> subordinate ids, so the supervision check does not
/// hit the directory on every transition.
pub type SubordinateCache = Cache<i32, Arc<Vec<i32>>>;

pub fn create_subordinate_cache() -> SubordinateCache {
    Cache::builder()
        .time_to_live(Duration::from_secs(60))
        .build()
}

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn RequestStore>,
    pub users: Arc<dyn UserDirectory>,
    pub registry: Arc<SessionRegistry>,
    pub sink: Arc<dyn NotificationSink>,
    pub subordinates: SubordinateCache,
}

impl AppState {
    pub fn new(
        store: Arc<dyn RequestStore>,
        users: Arc<dyn UserDirectory>,
        registry: Arc<SessionRegistry>,
    ) -> Self {
        let sink: Arc<dyn NotificationSink> = registry.clone();
        Self {
            store,
            users,
            registry,
            sink,
            subordinates: create_subordinate_cache(),
        }
    }

    /// Replaces the delivery sink; used by tests to record notifications.
    pub fn with_sink(mut self, sink: Arc<dyn NotificationSink>) -> Self {
        self.sink = sink;
        self
    }

    pub async fn subordinates_of(&self, chef_id: i32) -> Result<Arc<Vec<i32>>, StoreError> {
        if let Some(cached) = self.subordinates.get(&chef_id) {
            return Ok(cached);
        }
        let ids = Arc::new(self.users.subordinate_ids(chef_id).await?);
        self.subordinates.insert(chef_id, ids.clone());
        Ok(ids)
    }
}
