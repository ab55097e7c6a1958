use thiserror::Error;

use crate::store::StoreError;
use crate::tasks::QueueFull;

pub type TaskResult<T> = Result<T, TaskError>;

#[derive(Debug, Error)]
pub enum TaskError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    NotFound(String),
    #[error("store error: {0}")]
    Store(#[from] StoreError),
    #[error("priority ordering failed: {0}")]
    Ordering(#[from] QueueFull),
}

impl TaskError {
    pub fn task_not_found() -> Self {
        TaskError::NotFound("Task not found".to_string())
    }
}
