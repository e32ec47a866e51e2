use clap::Parser;
use dotenvy::dotenv;
use tracing_subscriber::EnvFilter;

use finance_tracker::cli::{self, Cli, Command};
use finance_tracker::config::Config;
use finance_tracker::database::db::{connection::get_db_pool, migrate::run_migrations};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("finance_tracker=info,tower_http=info")),
        )
        .init();

    let args = Cli::parse();
    let config = Config::from_env()?;

    let pool = get_db_pool(&config).await?;
    run_migrations(&pool).await?;

    cli::run(args.command.unwrap_or(Command::Serve), &config, pool).await
}
