//! Storage capabilities consumed by the task service.
//!
//! [`TaskStore`] is the durable source of truth; [`CacheStore`] is an
//! expiring key/value cache. Both are injected into
//! [`TaskService`](crate::tasks::TaskService) as trait objects so the
//! service can run against Postgres in production and in-memory fakes in
//! tests.

use std::time::Duration;

use rocket::async_trait;
use rocket_db_pools::sqlx;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{NewTask, Task, TaskQuery, TaskUpdate};

pub mod cache;
pub mod memory;
pub mod postgres;

pub use cache::MemoryCache;
pub use memory::InMemoryTaskStore;
pub use postgres::PgTaskStore;

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("cache error: {0}")]
    Cache(String),
}

/// Durable task collection, keyed by owner.
///
/// The `*_by_id_and_owner` operations match on both columns; a task owned by
/// someone else behaves exactly like a missing one and yields `None`.
#[async_trait]
pub trait TaskStore: Send + Sync {
    async fn find(&self, owner_id: Uuid, query: &TaskQuery) -> StoreResult<Vec<Task>>;

    async fn create(&self, task: NewTask) -> StoreResult<Task>;

    async fn update_by_id_and_owner(
        &self,
        id: Uuid,
        owner_id: Uuid,
        fields: &TaskUpdate,
    ) -> StoreResult<Option<Task>>;

    async fn delete_by_id_and_owner(&self, id: Uuid, owner_id: Uuid) -> StoreResult<Option<Task>>;
}

/// Expiring byte cache.
#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn get(&self, key: &str) -> StoreResult<Option<Vec<u8>>>;

    async fn set_with_ttl(&self, key: &str, value: Vec<u8>, ttl: Duration) -> StoreResult<()>;

    async fn delete(&self, key: &str) -> StoreResult<()>;
}
