use rocket::async_trait;
use rocket_db_pools::sqlx::{self, PgPool};
use uuid::Uuid;

use super::{StoreResult, TaskStore};
use crate::models::{CreatedOrder, NewTask, Task, TaskQuery, TaskUpdate};

const TASK_COLUMNS: &str = "id, title, description, status, priority, owner_id, created_at";

/// Postgres-backed task store.
///
/// `seq` is a bigserial column that records insertion order and breaks ties
/// between rows sharing a `created_at` value.
#[derive(Debug, Clone)]
pub struct PgTaskStore {
    pool: PgPool,
}

impl PgTaskStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn order_clause(order: CreatedOrder) -> &'static str {
    match order {
        CreatedOrder::NewestFirst => "ORDER BY created_at DESC, seq DESC",
        CreatedOrder::OldestFirst => "ORDER BY created_at ASC, seq ASC",
    }
}

#[async_trait]
impl TaskStore for PgTaskStore {
    async fn find(&self, owner_id: Uuid, query: &TaskQuery) -> StoreResult<Vec<Task>> {
        // LIMIT NULL is LIMIT ALL in Postgres.
        let sql = format!(
            r#"SELECT {TASK_COLUMNS}
               FROM tasks
               WHERE owner_id = $1
                 AND ($2::task_status IS NULL OR status = $2)
                 AND ($3::task_priority IS NULL OR priority = $3)
               {}
               OFFSET $4
               LIMIT $5"#,
            order_clause(query.order)
        );

        let tasks = sqlx::query_as::<_, Task>(&sql)
            .bind(owner_id)
            .bind(query.filters.status)
            .bind(query.filters.priority)
            .bind(query.skip.max(0))
            .bind(query.limit)
            .fetch_all(&self.pool)
            .await?;

        Ok(tasks)
    }

    async fn create(&self, task: NewTask) -> StoreResult<Task> {
        let sql = format!(
            r#"INSERT INTO tasks (id, title, description, status, priority, owner_id)
               VALUES ($1, $2, $3, $4, $5, $6)
               RETURNING {TASK_COLUMNS}"#
        );

        let created = sqlx::query_as::<_, Task>(&sql)
            .bind(Uuid::new_v4())
            .bind(&task.title)
            .bind(&task.description)
            .bind(task.status)
            .bind(task.priority)
            .bind(task.owner_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(created)
    }

    async fn update_by_id_and_owner(
        &self,
        id: Uuid,
        owner_id: Uuid,
        fields: &TaskUpdate,
    ) -> StoreResult<Option<Task>> {
        let sql = format!(
            r#"UPDATE tasks
               SET title = COALESCE($3, title),
                   description = COALESCE($4, description),
                   status = COALESCE($5, status),
                   priority = COALESCE($6, priority)
               WHERE id = $1 AND owner_id = $2
               RETURNING {TASK_COLUMNS}"#
        );

        let updated = sqlx::query_as::<_, Task>(&sql)
            .bind(id)
            .bind(owner_id)
            .bind(fields.title.as_deref())
            .bind(fields.description.as_deref())
            .bind(fields.status)
            .bind(fields.priority)
            .fetch_optional(&self.pool)
            .await?;

        Ok(updated)
    }

    async fn delete_by_id_and_owner(&self, id: Uuid, owner_id: Uuid) -> StoreResult<Option<Task>> {
        let sql = format!(
            "DELETE FROM tasks WHERE id = $1 AND owner_id = $2 RETURNING {TASK_COLUMNS}"
        );

        let deleted = sqlx::query_as::<_, Task>(&sql)
            .bind(id)
            .bind(owner_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(deleted)
    }
}
