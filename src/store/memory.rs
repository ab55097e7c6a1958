use chrono::Utc;
use parking_lot::RwLock;
use rocket::async_trait;
use std::sync::Arc;
use uuid::Uuid;

use super::{StoreResult, TaskStore};
use crate::models::{CreatedOrder, NewTask, Task, TaskQuery, TaskUpdate};

/// Task store kept in process memory.
///
/// Tasks are held in insertion order, which is the natural order returned by
/// [`TaskQuery::all`]. Used by tests and local development.
#[derive(Debug, Clone, Default)]
pub struct InMemoryTaskStore {
    tasks: Arc<RwLock<Vec<Task>>>,
}

impl InMemoryTaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a fully formed task, bypassing id and timestamp assignment.
    pub fn insert(&self, task: Task) {
        self.tasks.write().push(task);
    }

    pub fn len(&self) -> usize {
        self.tasks.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.read().is_empty()
    }

    pub fn get(&self, id: Uuid) -> Option<Task> {
        self.tasks.read().iter().find(|task| task.id == id).cloned()
    }
}

#[async_trait]
impl TaskStore for InMemoryTaskStore {
    async fn find(&self, owner_id: Uuid, query: &TaskQuery) -> StoreResult<Vec<Task>> {
        let tasks = self.tasks.read();

        let mut matched: Vec<(usize, &Task)> = tasks
            .iter()
            .enumerate()
            .filter(|(_, task)| task.owner_id == owner_id)
            .filter(|(_, task)| query.filters.status.is_none_or(|s| task.status == s))
            .filter(|(_, task)| query.filters.priority.is_none_or(|p| task.priority == p))
            .collect();

        match query.order {
            CreatedOrder::OldestFirst => {
                matched.sort_by(|(ia, a), (ib, b)| a.created_at.cmp(&b.created_at).then(ia.cmp(ib)))
            }
            CreatedOrder::NewestFirst => {
                matched.sort_by(|(ia, a), (ib, b)| b.created_at.cmp(&a.created_at).then(ib.cmp(ia)))
            }
        }

        let skip = usize::try_from(query.skip.max(0)).unwrap_or(usize::MAX);
        let take = query
            .limit
            .map(|limit| usize::try_from(limit.max(0)).unwrap_or(usize::MAX))
            .unwrap_or(usize::MAX);

        Ok(matched
            .into_iter()
            .skip(skip)
            .take(take)
            .map(|(_, task)| task.clone())
            .collect())
    }

    async fn create(&self, task: NewTask) -> StoreResult<Task> {
        let created = Task {
            id: Uuid::new_v4(),
            title: task.title,
            description: task.description,
            status: task.status,
            priority: task.priority,
            owner_id: task.owner_id,
            created_at: Utc::now(),
        };
        self.tasks.write().push(created.clone());
        Ok(created)
    }

    async fn update_by_id_and_owner(
        &self,
        id: Uuid,
        owner_id: Uuid,
        fields: &TaskUpdate,
    ) -> StoreResult<Option<Task>> {
        let mut tasks = self.tasks.write();
        let Some(task) = tasks
            .iter_mut()
            .find(|task| task.id == id && task.owner_id == owner_id)
        else {
            return Ok(None);
        };

        if let Some(title) = &fields.title {
            task.title = title.clone();
        }
        if let Some(description) = &fields.description {
            task.description = description.clone();
        }
        if let Some(status) = fields.status {
            task.status = status;
        }
        if let Some(priority) = fields.priority {
            task.priority = priority;
        }

        Ok(Some(task.clone()))
    }

    async fn delete_by_id_and_owner(&self, id: Uuid, owner_id: Uuid) -> StoreResult<Option<Task>> {
        let mut tasks = self.tasks.write();
        let position = tasks
            .iter()
            .position(|task| task.id == id && task.owner_id == owner_id);
        Ok(position.map(|index| tasks.remove(index)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{TaskFilters, TaskPriority, TaskStatus};

    fn new_task(owner_id: Uuid, title: &str, priority: TaskPriority) -> NewTask {
        NewTask {
            owner_id,
            title: title.to_string(),
            description: format!("{title} description"),
            priority,
            status: TaskStatus::Pending,
        }
    }

    #[tokio::test]
    async fn find_orders_and_paginates_per_owner() {
        let store = InMemoryTaskStore::new();
        let owner = Uuid::new_v4();
        let other = Uuid::new_v4();

        for title in ["first", "second", "third"] {
            store
                .create(new_task(owner, title, TaskPriority::Low))
                .await
                .expect("create");
        }
        store
            .create(new_task(other, "foreign", TaskPriority::High))
            .await
            .expect("create");

        let newest = store
            .find(owner, &TaskQuery::newest_first(TaskFilters::default()))
            .await
            .expect("find");
        let titles: Vec<_> = newest.iter().map(|task| task.title.as_str()).collect();
        assert_eq!(titles, ["third", "second", "first"]);

        let page_two = store
            .find(owner, &TaskQuery::newest_first(TaskFilters::default()).page(2, 2))
            .await
            .expect("find");
        assert_eq!(page_two.len(), 1);
        assert_eq!(page_two[0].title, "first");

        let natural = store.find(owner, &TaskQuery::all()).await.expect("find");
        let titles: Vec<_> = natural.iter().map(|task| task.title.as_str()).collect();
        assert_eq!(titles, ["first", "second", "third"]);
    }

    #[tokio::test]
    async fn find_applies_filters() {
        let store = InMemoryTaskStore::new();
        let owner = Uuid::new_v4();
        store
            .create(new_task(owner, "low", TaskPriority::Low))
            .await
            .expect("create");
        let high = store
            .create(new_task(owner, "high", TaskPriority::High))
            .await
            .expect("create");
        store
            .update_by_id_and_owner(
                high.id,
                owner,
                &TaskUpdate {
                    status: Some(TaskStatus::Completed),
                    ..TaskUpdate::default()
                },
            )
            .await
            .expect("update");

        let filters = TaskFilters {
            status: Some(TaskStatus::Completed),
            priority: Some(TaskPriority::High),
        };
        let found = store
            .find(owner, &TaskQuery::newest_first(filters))
            .await
            .expect("find");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, high.id);
    }

    #[tokio::test]
    async fn mutations_require_matching_owner() {
        let store = InMemoryTaskStore::new();
        let owner = Uuid::new_v4();
        let intruder = Uuid::new_v4();
        let task = store
            .create(new_task(owner, "mine", TaskPriority::Medium))
            .await
            .expect("create");

        let update = TaskUpdate {
            title: Some("stolen".into()),
            ..TaskUpdate::default()
        };
        assert!(
            store
                .update_by_id_and_owner(task.id, intruder, &update)
                .await
                .expect("update")
                .is_none()
        );
        assert!(
            store
                .delete_by_id_and_owner(task.id, intruder)
                .await
                .expect("delete")
                .is_none()
        );
        assert_eq!(store.get(task.id).map(|t| t.title), Some("mine".into()));

        let deleted = store
            .delete_by_id_and_owner(task.id, owner)
            .await
            .expect("delete");
        assert_eq!(deleted.map(|t| t.id), Some(task.id));
        assert!(store.is_empty());
    }
}
