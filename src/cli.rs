//! Command-line entry points: the HTTP server plus user maintenance.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use sqlx::{Pool, Sqlite};
use validator::Validate;

use crate::backend::{self, auth::hash_password};
use crate::backend::validation::{field_errors, normalize_email, RegisterPayload};
use crate::config::Config;
use crate::database::db::queries;

#[derive(Debug, Parser)]
#[command(name = "finance-tracker", version, about = "Personal finance tracking API")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the HTTP API (default)
    Serve,
    /// Register a user
    CreateUser { email: String, password: String },
    /// Replace a user's password
    SetPassword { email: String, password: String },
}

pub async fn run(command: Command, config: &Config, pool: Pool<Sqlite>) -> Result<()> {
    match command {
        Command::Serve => backend::run_server(config, pool).await,
        Command::CreateUser { email, password } => {
            let user_id = create_user(&pool, &email, &password).await?;
            println!("Created user {} (id {})", normalize_email(&email), user_id);
            Ok(())
        }
        Command::SetPassword { email, password } => {
            set_password(&pool, &email, &password).await?;
            println!("Password updated for {}", normalize_email(&email));
            Ok(())
        }
    }
}

// Same rules as POST /api/auth/register
fn check_credentials(email: &str, password: &str) -> Result<()> {
    let payload = RegisterPayload {
        email: email.to_string(),
        password: password.to_string(),
    };
    if let Err(errors) = payload.validate() {
        bail!("invalid credentials: {}", field_errors(&errors));
    }
    Ok(())
}

pub async fn create_user(pool: &Pool<Sqlite>, email: &str, password: &str) -> Result<i64> {
    check_credentials(email, password)?;
    let email = normalize_email(email);

    if queries::find_user_by_email(pool, &email).await?.is_some() {
        bail!("a user with email {email} already exists");
    }

    let hash = hash_password(password)?;
    let user = queries::create_user(pool, &email, &hash)
        .await
        .context("failed to insert user")?;
    tracing::info!(user_id = user.id, "created user from the command line");
    Ok(user.id)
}

pub async fn set_password(pool: &Pool<Sqlite>, email: &str, password: &str) -> Result<()> {
    check_credentials(email, password)?;
    let email = normalize_email(email);

    let hash = hash_password(password)?;
    if !queries::update_password_hash(pool, &email, &hash).await? {
        bail!("no user with email {email}");
    }
    tracing::info!(%email, "password updated");
    Ok(())
}
