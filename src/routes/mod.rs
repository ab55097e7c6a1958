//! HTTP route handlers.
//!
//! Handlers are annotated with `#[openapi]` so `rocket_okapi` can derive the
//! OpenAPI document; the task logic itself lives in
//! [`TaskService`](crate::tasks::TaskService).

pub mod health;
pub mod params;
pub mod tasks;
