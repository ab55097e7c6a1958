use rocket::http::Status;
use rocket::response::{self, Responder};
use rocket::serde::json::Json;
use rocket::{Catcher, Request, Response};
use rocket_okapi::r#gen::OpenApiGenerator;
use rocket_okapi::okapi::openapi3::Responses;
use rocket_okapi::okapi::schemars::{self, JsonSchema};
use rocket_okapi::response::OpenApiResponderInner;
use rocket_okapi::util::add_schema_response;
use serde::{Deserialize, Serialize};
use std::io::Cursor;

use crate::auth::guards::AuthRejection;
use crate::store::StoreError;
use crate::tasks::TaskError;

const INTERNAL_MESSAGE: &str = "Internal Server Error";

#[derive(Debug)]
pub enum ApiError {
    StoreError(StoreError),
    Internal(String),
    NotFound(String),
    BadRequest(String),
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl<'r> Responder<'r, 'static> for ApiError {
    fn respond_to(self, request: &'r Request<'_>) -> response::Result<'static> {
        let (status, error_type, message) = match self {
            ApiError::StoreError(e) => {
                log::error!("store error on {}: {}", request.uri(), e);
                (
                    Status::InternalServerError,
                    "InternalError",
                    INTERNAL_MESSAGE.to_string(),
                )
            }
            ApiError::Internal(msg) => {
                log::error!("internal error on {}: {}", request.uri(), msg);
                (
                    Status::InternalServerError,
                    "InternalError",
                    INTERNAL_MESSAGE.to_string(),
                )
            }
            ApiError::NotFound(msg) => {
                log::debug!("not found: {}", msg);
                (Status::NotFound, "NotFound", msg)
            }
            ApiError::BadRequest(msg) => {
                log::debug!("bad request: {}", msg);
                (Status::BadRequest, "BadRequest", msg)
            }
        };

        let error_response = ErrorResponse {
            error: error_type.to_string(),
            message,
        };

        let json = serde_json::to_string(&error_response).unwrap_or_else(|_| {
            r#"{"error":"SerializationError","message":"Failed to serialize error"}"#.to_string()
        });

        Response::build()
            .status(status)
            .header(rocket::http::ContentType::JSON)
            .sized_body(json.len(), Cursor::new(json))
            .ok()
    }
}

impl OpenApiResponderInner for ApiError {
    fn responses(generator: &mut OpenApiGenerator) -> rocket_okapi::Result<Responses> {
        let mut responses = Responses::default();
        let schema = generator.json_schema::<ErrorResponse>();
        for status in [400, 404, 500] {
            add_schema_response(&mut responses, status, "application/json", schema.clone())?;
        }
        Ok(responses)
    }
}

impl From<TaskError> for ApiError {
    fn from(err: TaskError) -> Self {
        match err {
            TaskError::Validation(msg) => ApiError::BadRequest(msg),
            TaskError::NotFound(msg) => ApiError::NotFound(msg),
            TaskError::Store(store) => ApiError::StoreError(store),
            TaskError::Ordering(err) => ApiError::Internal(err.to_string()),
        }
    }
}

fn rejection_body(request: &Request<'_>, error: &str, fallback: &str) -> Json<ErrorResponse> {
    let message = request
        .local_cache(AuthRejection::default)
        .0
        .clone()
        .unwrap_or_else(|| fallback.to_string());
    Json(ErrorResponse {
        error: error.to_string(),
        message,
    })
}

#[catch(400)]
fn bad_request(request: &Request<'_>) -> Json<ErrorResponse> {
    rejection_body(request, "BadRequest", "Bad Request")
}

#[catch(401)]
fn unauthorized(request: &Request<'_>) -> Json<ErrorResponse> {
    rejection_body(request, "Unauthorized", "Unauthorized")
}

/// JSON bodies for requests rejected before a handler ran, such as a missing
/// or invalid bearer token.
pub fn catchers() -> Vec<Catcher> {
    catchers![bad_request, unauthorized]
}
