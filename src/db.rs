use rocket_db_pools::sqlx::{self, PgPool};
use rocket_db_pools::Database;

/// Primary task database, configured under `databases.tasks_db`.
#[derive(Database)]
#[database("tasks_db")]
pub struct TasksDb(sqlx::PgPool);

pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    MIGRATOR.run(pool).await
}
