use rocket::http::Status;
use rocket::response::status;
use rocket::serde::json::Json;
use rocket::{State, post};
use rocket_db_pools::sqlx;
use rocket_okapi::openapi;

use crate::auth::responses::{
    AuthErrorResponse, LoginRequest, LoginResponse, RegisterRequest, RegisterResponse,
};
use crate::auth::{AuthError, AuthState, users};

type AuthRouteResult<T> = Result<Json<T>, status::Custom<Json<AuthErrorResponse>>>;

/// Create a local account.
#[openapi(tag = "Auth")]
#[post("/register", data = "<payload>")]
pub async fn register(
    state: &State<AuthState>,
    pool: &State<sqlx::PgPool>,
    payload: Json<RegisterRequest>,
) -> AuthRouteResult<RegisterResponse> {
    let RegisterRequest {
        username,
        email,
        password,
    } = payload.into_inner();

    let (username, email, password) = match (
        required(username),
        required(email),
        password.filter(|p| !p.is_empty()),
    ) {
        (Some(username), Some(email), Some(password)) => (username, email, password),
        _ => return Err(respond_error(AuthError::MissingFields)),
    };

    let password_hash = state
        .password_service
        .hash_password(password)
        .await
        .map_err(respond_error)?;

    let user_id = users::insert_user(pool.inner(), &username, &email, &password_hash)
        .await
        .map_err(respond_error)?;

    log::info!("registered user {}", user_id);

    Ok(Json(RegisterResponse {
        message: "User registered successfully".to_string(),
        user_id,
    }))
}

/// Exchange email and password for a bearer token.
#[openapi(tag = "Auth")]
#[post("/login", data = "<payload>")]
pub async fn login(
    state: &State<AuthState>,
    pool: &State<sqlx::PgPool>,
    payload: Json<LoginRequest>,
) -> AuthRouteResult<LoginResponse> {
    let LoginRequest { email, password } = payload.into_inner();
    let (email, password) = match (required(email), password.filter(|p| !p.is_empty())) {
        (Some(email), Some(password)) => (email, password),
        _ => return Err(respond_error(AuthError::MissingFields)),
    };

    let user = users::find_by_email(pool.inner(), &email)
        .await
        .map_err(respond_error)?
        .ok_or_else(|| respond_error(AuthError::UserNotFound))?;

    let verified = state
        .password_service
        .verify_password(password, user.password_hash)
        .await
        .map_err(respond_error)?;

    if !verified {
        return Err(respond_error(AuthError::InvalidPassword));
    }

    let signed = state
        .jwt_service
        .issue_access_token(user.id)
        .map_err(respond_error)?;

    Ok(Json(LoginResponse {
        token: signed.token,
        expires_at: signed.expires_at,
    }))
}

fn required(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn respond_error(err: AuthError) -> status::Custom<Json<AuthErrorResponse>> {
    let status = err.status();
    let message = if err.is_client_error() {
        err.to_string()
    } else {
        log::error!("auth request failed: {}", err);
        "Internal Server Error".to_string()
    };
    respond_message(status, &message)
}

fn respond_message(status: Status, message: &str) -> status::Custom<Json<AuthErrorResponse>> {
    status::Custom(
        status,
        Json(AuthErrorResponse {
            status: status.code,
            message: message.to_string(),
        }),
    )
}
