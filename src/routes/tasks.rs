//! Task endpoints. Every handler is scoped to the authenticated caller.

use rocket::response::status;
use rocket::serde::json::Json;
use rocket::{State, delete, get, post, put};
use rocket_okapi::openapi;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::models::{
    CreateTaskRequest, CreateTaskResponse, MessageResponse, Task, TaskListing, TaskUpdate,
};
use crate::routes::params::TaskListParams;
use crate::tasks::{TaskError, TaskService};

/// Unparseable ids cannot name an existing task.
fn parse_task_id(id: &str) -> Result<Uuid, ApiError> {
    id.parse()
        .map_err(|_| ApiError::from(TaskError::task_not_found()))
}

/// List the caller's tasks, newest first.
///
/// Returns `{"message": "No tasks found"}` instead of an empty array when the
/// requested page is empty. An unknown `status` or `priority` value is a 400.
#[openapi(tag = "Tasks")]
#[get("/tasks?<params..>")]
pub async fn list_tasks(
    user: AuthUser,
    service: &State<TaskService>,
    params: TaskListParams,
) -> Result<Json<TaskListing>, ApiError> {
    let filters = params.filters().map_err(ApiError::BadRequest)?;
    let listing = service
        .list_tasks(user.id, params.page(), params.limit(), filters)
        .await?;
    Ok(Json(listing))
}

/// All of the caller's tasks ordered high, medium, low.
#[openapi(tag = "Tasks")]
#[get("/tasks/priority")]
pub async fn list_tasks_by_priority(
    user: AuthUser,
    service: &State<TaskService>,
) -> Result<Json<Vec<Task>>, ApiError> {
    Ok(Json(service.list_by_priority(user.id).await?))
}

#[openapi(tag = "Tasks")]
#[post("/tasks", data = "<payload>")]
pub async fn create_task(
    user: AuthUser,
    service: &State<TaskService>,
    payload: Json<CreateTaskRequest>,
) -> Result<status::Created<Json<CreateTaskResponse>>, ApiError> {
    let task = service.create_task(user.id, payload.into_inner()).await?;
    let location = format!("/api/v1/tasks/{}", task.id);

    Ok(status::Created::new(location).body(Json(CreateTaskResponse {
        message: "Task created successfully".to_string(),
        task,
    })))
}

#[openapi(tag = "Tasks")]
#[put("/tasks/<id>", data = "<payload>")]
pub async fn update_task(
    user: AuthUser,
    service: &State<TaskService>,
    id: &str,
    payload: Json<TaskUpdate>,
) -> Result<Json<Task>, ApiError> {
    let task_id = parse_task_id(id)?;
    let task = service
        .update_task(user.id, task_id, payload.into_inner())
        .await?;
    Ok(Json(task))
}

#[openapi(tag = "Tasks")]
#[delete("/tasks/<id>")]
pub async fn delete_task(
    user: AuthUser,
    service: &State<TaskService>,
    id: &str,
) -> Result<Json<MessageResponse>, ApiError> {
    let task_id = parse_task_id(id)?;
    service.delete_task(user.id, task_id).await?;
    Ok(Json(MessageResponse::new("Task deleted successfully")))
}
