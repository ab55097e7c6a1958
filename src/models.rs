use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rocket_db_pools::sqlx::{self, FromRow};
use rocket_okapi::okapi::schemars::{self, JsonSchema};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ===== Task Models =====

#[derive(
    Debug, Clone, Copy, Default, Serialize, Deserialize, JsonSchema, sqlx::Type, PartialEq, Eq, Hash,
)]
#[sqlx(type_name = "task_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    #[default]
    Pending,
    Completed,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::Completed => "completed",
        }
    }
}

impl FromStr for TaskStatus {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(TaskStatus::Pending),
            "completed" => Ok(TaskStatus::Completed),
            other => Err(format!(
                "invalid status '{other}'; expected 'pending' or 'completed'"
            )),
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(
    Debug, Clone, Copy, Default, Serialize, Deserialize, JsonSchema, sqlx::Type, PartialEq, Eq, Hash,
)]
#[sqlx(type_name = "task_priority", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TaskPriority {
    #[default]
    Low,
    Medium,
    High,
}

impl TaskPriority {
    /// Ordering weight used by the priority queue; higher sorts first.
    pub const fn weight(self) -> u8 {
        match self {
            TaskPriority::High => 3,
            TaskPriority::Medium => 2,
            TaskPriority::Low => 1,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskPriority::Low => "low",
            TaskPriority::Medium => "medium",
            TaskPriority::High => "high",
        }
    }
}

impl FromStr for TaskPriority {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(TaskPriority::Low),
            "medium" => Ok(TaskPriority::Medium),
            "high" => Ok(TaskPriority::High),
            other => Err(format!(
                "invalid priority '{other}'; expected 'low', 'medium' or 'high'"
            )),
        }
    }
}

impl fmt::Display for TaskPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, FromRow, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub owner_id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Insert payload handed to a record store. The owner is always the
/// authenticated principal.
#[derive(Debug, Clone)]
pub struct NewTask {
    pub owner_id: Uuid,
    pub title: String,
    pub description: String,
    pub priority: TaskPriority,
    pub status: TaskStatus,
}

/// Partial update; `None` leaves the stored column untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct TaskUpdate {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: Option<TaskStatus>,
    #[serde(default)]
    pub priority: Option<TaskPriority>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct CreateTaskRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub priority: Option<TaskPriority>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TaskFilters {
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
}

impl TaskFilters {
    pub fn is_empty(&self) -> bool {
        self.status.is_none() && self.priority.is_none()
    }
}

/// Ordering by creation time; ties fall back to insertion order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreatedOrder {
    NewestFirst,
    OldestFirst,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskQuery {
    pub filters: TaskFilters,
    pub order: CreatedOrder,
    pub skip: i64,
    pub limit: Option<i64>,
}

impl TaskQuery {
    /// Every task of an owner, in insertion order.
    pub fn all() -> Self {
        Self {
            filters: TaskFilters::default(),
            order: CreatedOrder::OldestFirst,
            skip: 0,
            limit: None,
        }
    }

    pub fn newest_first(filters: TaskFilters) -> Self {
        Self {
            filters,
            order: CreatedOrder::NewestFirst,
            skip: 0,
            limit: None,
        }
    }

    pub fn page(mut self, page: i64, limit: i64) -> Self {
        self.skip = (page - 1).max(0).saturating_mul(limit);
        self.limit = Some(limit);
        self
    }
}

// ===== API Responses =====

pub const NO_TASKS_FOUND: &str = "No tasks found";

/// Listing payload: a JSON array of tasks, or a message object when the
/// query matched nothing.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(untagged)]
pub enum TaskListing {
    Tasks(Vec<Task>),
    Empty { message: String },
}

impl TaskListing {
    pub fn from_page(tasks: Vec<Task>) -> Self {
        if tasks.is_empty() {
            TaskListing::Empty {
                message: NO_TASKS_FOUND.to_string(),
            }
        } else {
            TaskListing::Tasks(tasks)
        }
    }

    pub fn tasks(&self) -> &[Task] {
        match self {
            TaskListing::Tasks(tasks) => tasks,
            TaskListing::Empty { .. } => &[],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CreateTaskResponse {
    pub message: String,
    pub task: Task,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_tasks_default_to_pending_and_low() {
        assert_eq!(TaskStatus::default(), TaskStatus::Pending);
        assert_eq!(TaskPriority::default(), TaskPriority::Low);
        assert_eq!(TaskPriority::default().weight(), 1);
    }

    #[test]
    fn enums_parse_their_wire_names() {
        assert_eq!("Completed".parse::<TaskStatus>(), Ok(TaskStatus::Completed));
        assert_eq!(" medium ".parse::<TaskPriority>(), Ok(TaskPriority::Medium));
        assert!("urgent".parse::<TaskPriority>().is_err());
    }
}
