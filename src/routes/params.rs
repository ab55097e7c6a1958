//! Query parameter types for the task listing endpoint.
//!
//! Follows Rocket's `FromForm` conventions and derives `JsonSchema` so the
//! generated OpenAPI document lists the parameters and their defaults.

use std::str::FromStr;

use rocket_okapi::okapi::schemars::{self, JsonSchema};
use serde::{Deserialize, Serialize};

use crate::models::{TaskFilters, TaskPriority, TaskStatus};

const fn default_page() -> i64 {
    1
}

const fn default_limit() -> i64 {
    10
}

const MAX_LIMIT: i64 = 100;

/// Query parameters accepted by `GET /tasks`.
///
/// `status` and `priority` arrive as raw strings so a bad value is reported
/// instead of silently dropped; see [`TaskListParams::filters`].
#[derive(Debug, Clone, Serialize, Deserialize, rocket::form::FromForm, JsonSchema)]
pub struct TaskListParams {
    /// One-based page index (defaults to 1).
    #[field(default = 1)]
    #[serde(default = "default_page")]
    pub page: i64,
    /// Tasks per page (clamped between 1 and 100, default 10).
    #[field(default = 10)]
    #[serde(default = "default_limit")]
    pub limit: i64,
    /// `pending` or `completed`. Filtered listings are never cached.
    pub status: Option<String>,
    /// `low`, `medium` or `high`. Filtered listings are never cached.
    pub priority: Option<String>,
}

impl Default for TaskListParams {
    fn default() -> Self {
        Self {
            page: default_page(),
            limit: default_limit(),
            status: None,
            priority: None,
        }
    }
}

impl TaskListParams {
    pub fn page(&self) -> i64 {
        self.page.max(1)
    }

    pub fn limit(&self) -> i64 {
        self.limit.clamp(1, MAX_LIMIT)
    }

    /// Parsed filters. An empty value means no filter; an unknown one is an
    /// error carrying the message for the client.
    pub fn filters(&self) -> Result<TaskFilters, String> {
        Ok(TaskFilters {
            status: parse_filter::<TaskStatus>(self.status.as_deref())?,
            priority: parse_filter::<TaskPriority>(self.priority.as_deref())?,
        })
    }
}

fn parse_filter<T>(value: Option<&str>) -> Result<Option<T>, String>
where
    T: FromStr<Err = String>,
{
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => value.parse().map(Some),
    }
}
