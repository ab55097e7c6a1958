#[macro_use]
extern crate rocket;

pub mod auth;
pub mod db;
pub mod error;
pub mod models;
pub mod request_logger;
pub mod routes;
pub mod store;
pub mod tasks;

use crate::auth::AuthState;
use crate::db::TasksDb;
use crate::request_logger::RequestLogger;
use crate::store::{MemoryCache, PgTaskStore};
use crate::tasks::{CacheConfig, TaskService};
use env_logger::Env;
use rocket::fairing::AdHoc;
use rocket::http::Method;
use rocket::{Build, Rocket};
use rocket_cors::{AllowedOrigins, CorsOptions};
use rocket_db_pools::Database;
use rocket_okapi::{
    openapi_get_routes,
    rapidoc::{GeneralConfig, HideShowConfig, RapiDocConfig, make_rapidoc},
    settings::UrlObject,
    swagger_ui::{SwaggerUIConfig, make_swagger_ui},
};
use std::sync::{Arc, Once};

static LOGGER: Once = Once::new();

fn init_logger() {
    LOGGER.call_once(|| {
        env_logger::Builder::from_env(
            Env::default().default_filter_or("info,rocket::server=warn,rocket::request=warn"),
        )
        .init();
    });
}

pub fn rocket() -> Rocket<Build> {
    init_logger();

    let cors = CorsOptions::default()
        .allowed_origins(AllowedOrigins::all())
        .allowed_methods(
            vec![Method::Get, Method::Post, Method::Put, Method::Delete]
                .into_iter()
                .map(From::from)
                .collect(),
        )
        .allow_credentials(true)
        .to_cors()
        .expect("Error creating CORS");

    rocket::build()
        .attach(RequestLogger)
        .attach(TasksDb::init())
        .attach(cors)
        .attach(AdHoc::try_on_ignite(
            "Run Migrations",
            |rocket| async move {
                match TasksDb::fetch(&rocket) {
                    Some(db) => match db::run_migrations(db).await {
                        Ok(_) => {
                            log::info!("database migrations successful");
                            Ok(rocket)
                        }
                        Err(e) => {
                            log::error!("database migrations failed: {}", e);
                            Err(rocket)
                        }
                    },
                    None => {
                        log::error!("database pool not available for migrations");
                        Err(rocket)
                    }
                }
            },
        ))
        // Stores are process-wide: one pool and one cache shared by every request.
        .attach(AdHoc::try_on_ignite(
            "Task Service",
            |rocket| async move {
                match TasksDb::fetch(&rocket) {
                    Some(db) => {
                        let pool = (**db).clone();
                        let cache = MemoryCache::new();
                        let config = CacheConfig::from_env();
                        log::info!(
                            "task cache namespace '{}' ttl {}s",
                            config.namespace,
                            config.ttl.as_secs()
                        );
                        let service = TaskService::new(
                            Arc::new(PgTaskStore::new(pool.clone())),
                            Arc::new(cache.clone()),
                            config,
                        );

                        Ok(rocket.manage(pool).manage(cache).manage(service))
                    }
                    None => {
                        log::error!("database pool not available for task service");
                        Err(rocket)
                    }
                }
            },
        ))
        .attach(AdHoc::try_on_ignite(
            "Auth Configuration",
            |rocket| async move {
                match AuthState::from_env() {
                    Ok(state) => Ok(rocket.manage(state)),
                    Err(err) => {
                        log::error!("failed to initialize authentication: {}", err);
                        Err(rocket)
                    }
                }
            },
        ))
        .attach(AdHoc::on_liftoff("Spawn Cache Sweeper", |rocket| {
            Box::pin(async move {
                let cache = rocket.state::<MemoryCache>().cloned();
                let interval = rocket
                    .state::<TaskService>()
                    .map(|service| service.config().purge_interval);

                match (cache, interval) {
                    (Some(cache), Some(interval)) => {
                        tokio::spawn(async move {
                            log::info!("starting task cache sweeper");
                            let mut ticker = tokio::time::interval(interval);
                            loop {
                                ticker.tick().await;
                                let purged = cache.purge_expired();
                                if purged > 0 {
                                    log::debug!("purged {} expired task cache entries", purged);
                                }
                            }
                        });
                    }
                    _ => log::error!("failed to spawn cache sweeper: task cache not found"),
                }
            })
        }))
        .register("/", error::catchers())
        .mount(
            "/api/v1",
            openapi_get_routes![
                // Health routes
                routes::health::health_check,
                // Auth routes
                auth::routes::register,
                auth::routes::login,
                // Task routes
                routes::tasks::list_tasks,
                routes::tasks::list_tasks_by_priority,
                routes::tasks::create_task,
                routes::tasks::update_task,
                routes::tasks::delete_task,
            ],
        )
        .mount(
            "/api/docs/swagger/",
            make_swagger_ui(&SwaggerUIConfig {
                url: "../../v1/openapi.json".to_owned(),
                ..Default::default()
            }),
        )
        .mount(
            "/api/docs/rapidoc/",
            make_rapidoc(&RapiDocConfig {
                general: GeneralConfig {
                    spec_urls: vec![UrlObject::new("Task API", "../../v1/openapi.json")],
                    ..Default::default()
                },
                hide_show: HideShowConfig {
                    allow_spec_url_load: false,
                    allow_spec_file_load: false,
                    ..Default::default()
                },
                ..Default::default()
            }),
        )
}

#[cfg_attr(not(test), allow(dead_code))]
pub mod test_support {
    use std::sync::Arc;

    use rocket::config::LogLevel;
    use rocket::figment::Figment;
    use rocket::local::asynchronous::Client as AsyncClient;
    use rocket::local::blocking::Client;
    use rocket::{Build, Rocket, Route};
    use rocket_db_pools::sqlx::{self, PgPool};
    use uuid::Uuid;

    use crate::auth::{AuthConfig, AuthState, JwtService, PasswordService};
    use crate::store::{InMemoryTaskStore, MemoryCache};
    use crate::tasks::{CacheConfig, TaskService};

    pub use database::{TestDatabase, TestDatabaseError};

    pub const TEST_JWT_SECRET: &str = "task-server-test-secret";

    /// Auth state with a fixed signing secret, for minting test tokens.
    pub fn test_auth_state() -> AuthState {
        let config = AuthConfig {
            issuer: "https://tasks.test".into(),
            audience: "task-api".into(),
            access_token_ttl_secs: 900,
            jwt_secret: TEST_JWT_SECRET.into(),
            jwt_kid: Some("test-kid".into()),
        };
        let jwt_service = JwtService::from_config(&config).expect("jwt service");
        let password_service = PasswordService::new().expect("password service");
        AuthState::new(config, password_service, jwt_service)
    }

    /// Bearer header value for `user_id`.
    pub fn bearer_for(auth: &AuthState, user_id: Uuid) -> String {
        let token = auth
            .jwt_service
            .issue_access_token(user_id)
            .expect("issue access token");
        format!("Bearer {}", token.token)
    }

    /// Service wired to in-memory stores, returned alongside them for
    /// assertions.
    pub fn memory_task_service() -> (TaskService, InMemoryTaskStore, MemoryCache) {
        let store = InMemoryTaskStore::new();
        let cache = MemoryCache::new();
        let service = TaskService::new(
            Arc::new(store.clone()),
            Arc::new(cache.clone()),
            CacheConfig::default(),
        );
        (service, store, cache)
    }

    /// Helpers for seeding tables in Postgres-backed tests.
    pub struct TestFixtures<'a> {
        pool: &'a PgPool,
    }

    impl<'a> TestFixtures<'a> {
        pub fn new(pool: &'a PgPool) -> Self {
            Self { pool }
        }

        /// Insert a user row with a placeholder password hash.
        pub async fn insert_user(&self, username: &str, email: &str) -> Result<Uuid, sqlx::Error> {
            sqlx::query_scalar(
                "INSERT INTO users (id, username, email, password_hash) VALUES ($1, $2, $3, $4) RETURNING id",
            )
            .bind(Uuid::new_v4())
            .bind(username)
            .bind(email)
            .bind("$argon2id$placeholder")
            .fetch_one(self.pool)
            .await
        }
    }

    pub mod database {
        use log::LevelFilter;
        use rocket_db_pools::sqlx::postgres::{PgConnectOptions, PgPoolOptions};
        use rocket_db_pools::sqlx::{self, ConnectOptions, PgPool};
        use testcontainers_modules::postgres::Postgres;
        use testcontainers_modules::testcontainers::{
            ContainerAsync, core::error::TestcontainersError, runners::AsyncRunner,
        };
        use thiserror::Error;
        use tokio::runtime::Handle;
        use uuid::Uuid;

        use crate::db::MIGRATOR;

        /// Set to a Postgres URL, or to `container` to launch a disposable one.
        const TEST_DATABASE_URL: &str = "TEST_DATABASE_URL";

        #[derive(Debug, Error)]
        pub enum TestDatabaseError {
            #[error("TEST_DATABASE_URL not set")]
            MissingUrl,
            #[error("database error: {0}")]
            Sqlx(#[from] sqlx::Error),
            #[error("migration error: {0}")]
            Migration(#[from] sqlx::migrate::MigrateError),
            #[error("container error: {0}")]
            Container(#[from] TestcontainersError),
        }

        /// Ephemeral, migrated database for integration tests. Each instance
        /// creates its own uniquely named database and drops it on close.
        pub struct TestDatabase {
            pool: Option<PgPool>,
            admin_options: PgConnectOptions,
            database_name: String,
            container: Option<ContainerAsync<Postgres>>,
        }

        impl TestDatabase {
            pub async fn new_from_env() -> Result<Self, TestDatabaseError> {
                match std::env::var(TEST_DATABASE_URL) {
                    Ok(url) if url == "container" => Self::new_container().await,
                    Ok(url) if !url.is_empty() => Self::provision(&url, None).await,
                    _ => Err(TestDatabaseError::MissingUrl),
                }
            }

            async fn new_container() -> Result<Self, TestDatabaseError> {
                let container = Postgres::default().start().await?;
                let host = container.get_host().await?.to_string();
                let port = container.get_host_port_ipv4(5432).await?;
                let url = format!("postgres://postgres:postgres@{}:{}/postgres", host, port);
                Self::provision(&url, Some(container)).await
            }

            async fn provision(
                admin_url: &str,
                container: Option<ContainerAsync<Postgres>>,
            ) -> Result<Self, TestDatabaseError> {
                let base_options: PgConnectOptions = admin_url.parse()?;
                let base_options = base_options.log_statements(LevelFilter::Off);
                let admin_options = base_options.clone();

                let admin_pool = PgPoolOptions::new()
                    .max_connections(1)
                    .connect_with(admin_options.clone())
                    .await?;

                let database_name = format!("tasks_test_{}", Uuid::new_v4().simple());
                let create_sql = format!("CREATE DATABASE \"{}\" TEMPLATE template0", database_name);
                sqlx::query(&create_sql).execute(&admin_pool).await?;
                admin_pool.close().await;

                let pool = PgPoolOptions::new()
                    .max_connections(5)
                    .connect_with(base_options.database(&database_name))
                    .await?;

                MIGRATOR.run(&pool).await?;

                Ok(Self {
                    pool: Some(pool),
                    admin_options,
                    database_name,
                    container,
                })
            }

            pub fn pool(&self) -> &PgPool {
                self.pool.as_ref().expect("test database pool is available")
            }

            pub fn pool_clone(&self) -> PgPool {
                self.pool().clone()
            }

            /// Close the pool and drop the ephemeral database.
            pub async fn close(mut self) -> Result<(), TestDatabaseError> {
                if let Some(pool) = self.pool.take() {
                    pool.close().await;
                }

                drop_database(self.admin_options.clone(), &self.database_name).await?;
                self.container.take();
                Ok(())
            }
        }

        async fn drop_database(
            admin_options: PgConnectOptions,
            database_name: &str,
        ) -> Result<(), sqlx::Error> {
            let admin_pool = PgPoolOptions::new()
                .max_connections(1)
                .connect_with(admin_options)
                .await?;

            let drop_sql = format!("DROP DATABASE IF EXISTS \"{}\" WITH (FORCE)", database_name);
            sqlx::query(&drop_sql).execute(&admin_pool).await?;
            admin_pool.close().await;
            Ok(())
        }

        impl Drop for TestDatabase {
            fn drop(&mut self) {
                let Some(pool) = self.pool.take() else {
                    return;
                };
                let admin_options = self.admin_options.clone();
                let database_name = self.database_name.clone();

                if let Ok(handle) = Handle::try_current() {
                    handle.spawn(async move {
                        pool.close().await;
                        let _ = drop_database(admin_options, &database_name).await;
                    });
                }
            }
        }
    }

    /// Builder for Rocket instances used by route tests.
    #[derive(Default)]
    pub struct TestRocketBuilder {
        figment: Figment,
        mounts: Vec<(String, Vec<Route>)>,
        pg_pool: Option<PgPool>,
        task_service: Option<TaskService>,
        auth_state: Option<AuthState>,
    }

    impl TestRocketBuilder {
        /// Random port, logging disabled.
        pub fn new() -> Self {
            let figment = rocket::Config::figment()
                .merge(("port", 0))
                .merge(("log_level", LogLevel::Off))
                .merge(("cli_colors", false));

            Self {
                figment,
                ..Self::default()
            }
        }

        /// Mount routes under `/api/v1`.
        pub fn mount_api_routes(mut self, routes: Vec<Route>) -> Self {
            self.mounts.push(("/api/v1".to_string(), routes));
            self
        }

        pub fn manage_pg_pool(mut self, pool: PgPool) -> Self {
            self.pg_pool = Some(pool);
            self
        }

        pub fn manage_task_service(mut self, service: TaskService) -> Self {
            self.task_service = Some(service);
            self
        }

        pub fn manage_auth_state(mut self, state: AuthState) -> Self {
            self.auth_state = Some(state);
            self
        }

        pub fn build(self) -> Rocket<Build> {
            let mut rocket = rocket::custom(self.figment).register("/", crate::error::catchers());

            for (base, routes) in self.mounts {
                rocket = rocket.mount(base, routes);
            }

            if let Some(pool) = self.pg_pool {
                rocket = rocket.manage(pool);
            }
            if let Some(service) = self.task_service {
                rocket = rocket.manage(service);
            }
            if let Some(state) = self.auth_state {
                rocket = rocket.manage(state);
            }

            rocket
        }

        pub fn blocking_client(self) -> Client {
            Client::tracked(self.build()).expect("valid Rocket instance")
        }

        pub async fn async_client(self) -> AsyncClient {
            AsyncClient::tracked(self.build())
                .await
                .expect("valid Rocket instance")
        }
    }
}
