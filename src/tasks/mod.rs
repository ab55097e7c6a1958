//! Task service: cache-aside listing, invalidating mutations and the
//! priority-ordered listing.
//!
//! ## Caching
//!
//! Only unfiltered listings are cached. The entry under
//! `{namespace}:{owner_id}` holds the owner's complete unfiltered task list,
//! newest first; the requested page is cut out of it after every hit and
//! every miss, so differing `page`/`limit` values never observe each other's
//! results. Filtered listings always go to the record store and never touch
//! the cache.
//!
//! Every successful mutation deletes the owner's entry after the write has
//! committed. Cache failures are logged and never fail a request; record
//! store failures are returned to the caller. Nothing is retried.
//!
//! There is no per-owner lock: a listing that misses, reads the store, and
//! then writes the cache after a concurrent mutation has invalidated it will
//! re-install pre-mutation data until the next mutation or TTL expiry.

use std::sync::Arc;

use uuid::Uuid;

pub mod config;
pub mod error;
pub mod priority;

pub use config::CacheConfig;
pub use error::{TaskError, TaskResult};
pub use priority::{PriorityQueue, Prioritized, QueueFull, order_by_priority};

use crate::models::{
    CreateTaskRequest, NewTask, Task, TaskFilters, TaskListing, TaskQuery, TaskStatus, TaskUpdate,
};
use crate::store::{CacheStore, TaskStore};

#[derive(Clone)]
pub struct TaskService {
    store: Arc<dyn TaskStore>,
    cache: Arc<dyn CacheStore>,
    config: CacheConfig,
}

impl TaskService {
    pub fn new(store: Arc<dyn TaskStore>, cache: Arc<dyn CacheStore>, config: CacheConfig) -> Self {
        Self {
            store,
            cache,
            config,
        }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// List one page of an owner's tasks, newest first.
    ///
    /// Returns [`TaskListing::Empty`] when the page holds no tasks.
    pub async fn list_tasks(
        &self,
        owner_id: Uuid,
        page: i64,
        limit: i64,
        filters: TaskFilters,
    ) -> TaskResult<TaskListing> {
        let page = page.max(1);
        let limit = limit.max(1);

        if !filters.is_empty() {
            let query = TaskQuery::newest_first(filters).page(page, limit);
            let tasks = self.store.find(owner_id, &query).await?;
            return Ok(TaskListing::from_page(tasks));
        }

        let key = self.config.key_for(owner_id);
        let all = match self.read_cached(&key).await {
            Some(tasks) => {
                log::debug!("task cache hit for {}", key);
                tasks
            }
            None => {
                log::debug!("task cache miss for {}", key);
                let tasks = self
                    .store
                    .find(owner_id, &TaskQuery::newest_first(TaskFilters::default()))
                    .await?;
                self.write_cached(&key, &tasks).await;
                tasks
            }
        };

        Ok(TaskListing::from_page(paginate(all, page, limit)))
    }

    pub async fn create_task(&self, owner_id: Uuid, request: CreateTaskRequest) -> TaskResult<Task> {
        let (title, description, priority) = match (
            present(request.title),
            present(request.description),
            request.priority,
        ) {
            (Some(title), Some(description), Some(priority)) => (title, description, priority),
            _ => return Err(TaskError::Validation("All fields are required".to_string())),
        };

        let task = self
            .store
            .create(NewTask {
                owner_id,
                title,
                description,
                priority,
                status: TaskStatus::default(),
            })
            .await?;

        log::info!("created task {} for owner {}", task.id, owner_id);
        self.invalidate(owner_id).await;
        Ok(task)
    }

    pub async fn update_task(
        &self,
        owner_id: Uuid,
        task_id: Uuid,
        fields: TaskUpdate,
    ) -> TaskResult<Task> {
        let updated = self
            .store
            .update_by_id_and_owner(task_id, owner_id, &fields)
            .await?
            .ok_or_else(TaskError::task_not_found)?;

        self.invalidate(owner_id).await;
        Ok(updated)
    }

    pub async fn delete_task(&self, owner_id: Uuid, task_id: Uuid) -> TaskResult<Task> {
        let deleted = self
            .store
            .delete_by_id_and_owner(task_id, owner_id)
            .await?
            .ok_or_else(TaskError::task_not_found)?;

        log::info!("deleted task {} for owner {}", task_id, owner_id);
        self.invalidate(owner_id).await;
        Ok(deleted)
    }

    /// Every task of the owner, highest priority first. Equal priorities keep
    /// insertion order. Never served from the cache.
    pub async fn list_by_priority(&self, owner_id: Uuid) -> TaskResult<Vec<Task>> {
        let tasks = self.store.find(owner_id, &TaskQuery::all()).await?;
        Ok(order_by_priority(tasks)?)
    }

    async fn read_cached(&self, key: &str) -> Option<Vec<Task>> {
        let bytes = match self.cache.get(key).await {
            Ok(Some(bytes)) => bytes,
            Ok(None) => return None,
            Err(err) => {
                log::warn!("task cache read failed for {}: {}", key, err);
                return None;
            }
        };

        match bincode::deserialize::<Vec<Task>>(&bytes) {
            Ok(tasks) => Some(tasks),
            Err(err) => {
                log::warn!("discarding undecodable task cache entry {}: {}", key, err);
                if let Err(err) = self.cache.delete(key).await {
                    log::warn!("task cache delete failed for {}: {}", key, err);
                }
                None
            }
        }
    }

    async fn write_cached(&self, key: &str, tasks: &[Task]) {
        let bytes = match bincode::serialize(tasks) {
            Ok(bytes) => bytes,
            Err(err) => {
                log::warn!("failed to encode task cache entry {}: {}", key, err);
                return;
            }
        };

        if let Err(err) = self.cache.set_with_ttl(key, bytes, self.config.ttl).await {
            log::warn!("task cache write failed for {}: {}", key, err);
        }
    }

    async fn invalidate(&self, owner_id: Uuid) {
        let key = self.config.key_for(owner_id);
        if let Err(err) = self.cache.delete(&key).await {
            log::error!("task cache invalidation failed for {}: {}", key, err);
        }
    }
}

fn present(value: Option<String>) -> Option<String> {
    value.filter(|value| !value.trim().is_empty())
}

fn paginate(tasks: Vec<Task>, page: i64, limit: i64) -> Vec<Task> {
    let skip = usize::try_from((page - 1).saturating_mul(limit)).unwrap_or(usize::MAX);
    let take = usize::try_from(limit).unwrap_or(usize::MAX);
    tasks.into_iter().skip(skip).take(take).collect()
}
