use rocket::Request;
use rocket::State;
use rocket::request::{FromRequest, Outcome};
use rocket_okapi::request::OpenApiFromRequest;
use uuid::Uuid;

use crate::auth::{AuthError, AuthResult, AuthState};

/// Authenticated principal resolved from the `Authorization: Bearer` header.
///
/// Only the token is consulted; every task operation is scoped to `id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, OpenApiFromRequest)]
pub struct AuthUser {
    pub id: Uuid,
}

/// Client-facing message of a rejected bearer token, read back by the 400
/// and 401 catchers.
#[derive(Debug, Default)]
pub struct AuthRejection(pub Option<String>);

#[rocket::async_trait]
impl<'r> FromRequest<'r> for AuthUser {
    type Error = AuthError;

    async fn from_request(request: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        match extract_user(request).await {
            Ok(user) => Outcome::Success(user),
            Err(err) => {
                log::debug!("rejecting request to {}: {}", request.uri(), err);
                if err.is_client_error() {
                    request.local_cache(|| AuthRejection(Some(err.to_string())));
                }
                Outcome::Error((err.status(), err))
            }
        }
    }
}

async fn extract_user(request: &Request<'_>) -> AuthResult<AuthUser> {
    let token = bearer_token(request.headers().get_one("Authorization"))?;

    let auth_state = request
        .guard::<&State<AuthState>>()
        .await
        .succeeded()
        .ok_or_else(|| AuthError::Config("AuthState missing from state".into()))?;

    let id = auth_state.jwt_service.authenticate(token)?;
    Ok(AuthUser { id })
}

fn bearer_token(header: Option<&str>) -> AuthResult<&str> {
    let header = header.ok_or(AuthError::MissingToken)?;
    let mut parts = header.splitn(2, ' ');
    let scheme = parts.next().unwrap_or_default();
    let token = parts.next().unwrap_or_default().trim();
    if scheme.eq_ignore_ascii_case("Bearer") && !token.is_empty() {
        Ok(token)
    } else {
        Err(AuthError::MissingToken)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_bearer_header() {
        assert_eq!(bearer_token(Some("Bearer abc.def")).expect("token"), "abc.def");
        assert_eq!(bearer_token(Some("bearer xyz")).expect("token"), "xyz");
    }

    #[test]
    fn missing_or_malformed_header_is_missing_token() {
        assert!(matches!(bearer_token(None), Err(AuthError::MissingToken)));
        assert!(matches!(bearer_token(Some("Bearer ")), Err(AuthError::MissingToken)));
        assert!(matches!(bearer_token(Some("Basic abc")), Err(AuthError::MissingToken)));
    }
}
