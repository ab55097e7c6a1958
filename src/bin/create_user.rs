use std::io::{self, Write};

use clap::Parser;
use sqlx::postgres::PgPoolOptions;

use task_server::auth::AuthError;
use task_server::auth::passwords::PasswordService;
use task_server::auth::users;

#[derive(Parser, Debug)]
#[command(name = "create_user", about = "Create a task-server user account")]
struct Args {
    /// Display name for the account.
    #[arg(long)]
    username: String,

    /// Email address for the account (case insensitive).
    #[arg(long)]
    email: String,

    /// Plaintext password to hash and store for this user.
    #[arg(long)]
    password: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp(None)
        .init();

    let args = Args::parse();
    let username = args.username.trim();
    let email = users::normalize_email(&args.email);

    if username.is_empty() || args.password.is_empty() || !email.contains('@') {
        writeln!(
            io::stderr(),
            "error: username, password and a valid email are required"
        )?;
        std::process::exit(1);
    }

    let database_url = std::env::var("DATABASE_URL")?;
    let pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(&database_url)
        .await?;

    let password_service = PasswordService::new()?;
    let password_hash = password_service.hash_sync(&args.password)?;

    match users::insert_user(&pool, username, &email, &password_hash).await {
        Ok(user_id) => {
            println!("Created user '{email}' with id {user_id}");
            Ok(())
        }
        Err(AuthError::UserExists) => {
            writeln!(io::stderr(), "error: a user with email '{email}' already exists.")?;
            std::process::exit(1);
        }
        Err(err) => Err(err.into()),
    }
}
