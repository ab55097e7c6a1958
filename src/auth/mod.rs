//! Authentication: configuration, password hashing, token minting, the
//! bearer-token request guard, and the register/login routes.

use std::sync::Arc;

pub mod config;
pub mod error;
pub mod guards;
pub mod jwt;
pub mod passwords;
pub mod responses;
pub mod routes;
pub mod users;

pub use config::AuthConfig;
pub use error::{AuthError, AuthResult};
pub use guards::AuthUser;
pub use jwt::JwtService;
pub use passwords::PasswordService;

#[derive(Clone)]
pub struct AuthState {
    pub config: AuthConfig,
    pub password_service: Arc<PasswordService>,
    pub jwt_service: Arc<JwtService>,
}

impl AuthState {
    pub fn new(
        config: AuthConfig,
        password_service: PasswordService,
        jwt_service: JwtService,
    ) -> Self {
        Self {
            config,
            password_service: Arc::new(password_service),
            jwt_service: Arc::new(jwt_service),
        }
    }

    /// Build every auth component from the environment.
    pub fn from_env() -> AuthResult<Self> {
        let config = AuthConfig::from_env()?;
        let jwt_service = JwtService::from_config(&config)?;
        let password_service = PasswordService::new()?;
        Ok(Self::new(config, password_service, jwt_service))
    }
}
