mod config;
mod http;
mod org_chart;
#[cfg(test)]
mod test_support;

use std::{path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use dotenvy::dotenv;
use migration::{Migrator, MigratorTrait};
use platform_db::{DbPool, SeaOrmEmployeeStore, connect};
use platform_obs::{ObsConfig, init_tracing, shutdown_tracing};
use platform_source::HttpEmployeeSource;
use tracing::info;

use crate::{
    config::AppConfig,
    http::{AppState, ServeConfig},
    org_chart::OrgChartService,
};

#[derive(Parser, Debug)]
#[command(name = "orgchart-server", version, about = "Org chart service")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP server.
    Serve(ServeCommand),
    /// Run database migrations.
    #[command(subcommand)]
    Migrate(MigrateCommand),
    /// Populate an empty store from the employee feed.
    Seed,
    /// Print the org chart as JSON.
    Print {
        #[arg(long, value_name = "FILE", help = "Write to FILE instead of stdout")]
        output: Option<PathBuf>,
    },
}

#[derive(Subcommand, Debug)]
enum MigrateCommand {
    /// Apply pending migrations.
    Up,
    /// Rollback the most recent migration.
    Down,
}

#[derive(Args, Debug)]
struct ServeCommand {
    #[arg(long, default_value = "0.0.0.0")]
    host: std::net::IpAddr,
    #[arg(long, default_value_t = 8080)]
    port: u16,
    #[arg(long, help = "Allow starting even when migrations are pending")]
    allow_dirty: bool,
}

impl From<&ServeCommand> for ServeConfig {
    fn from(value: &ServeCommand) -> Self {
        ServeConfig::new(value.host, value.port)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    init_tracing(ObsConfig::default())?;
    let cli = Cli::parse();
    let config = Arc::new(AppConfig::load()?);
    let result = match cli.command {
        Command::Serve(cmd) => run_server(cmd, config).await,
        Command::Migrate(action) => match action {
            MigrateCommand::Up => migrate_up(&config).await,
            MigrateCommand::Down => migrate_down(&config).await,
        },
        Command::Seed => run_seed(&config).await,
        Command::Print { output } => print_chart(&config, output).await,
    };
    shutdown_tracing();
    result
}

async fn setup_pool(config: &AppConfig) -> Result<DbPool> {
    connect(&config.database)
        .await
        .context("failed to connect to the employee database")
}

fn build_service(config: &AppConfig, pool: DbPool) -> Result<Arc<OrgChartService>> {
    let store = Arc::new(SeaOrmEmployeeStore::new(pool));
    let source = Arc::new(
        HttpEmployeeSource::new(config.source.clone())
            .context("failed to build employee feed client")?,
    );
    info!(url = source.url(), "employee feed configured");
    Ok(Arc::new(OrgChartService::new(store, source)))
}

async fn run_server(cmd: ServeCommand, config: Arc<AppConfig>) -> Result<()> {
    let pool = setup_pool(&config).await?;
    ensure_migrations(&pool, cmd.allow_dirty).await?;
    let state = AppState {
        service: build_service(&config, pool)?,
        config: config.clone(),
    };
    http::serve((&cmd).into(), state).await
}

async fn run_seed(config: &AppConfig) -> Result<()> {
    let pool = setup_pool(config).await?;
    ensure_migrations(&pool, false).await?;
    let service = build_service(config, pool)?;
    if service.ensure_populated().await? {
        info!("employee store seeded from feed");
    } else {
        info!("employee store already populated; nothing to seed");
    }
    Ok(())
}

async fn print_chart(config: &AppConfig, output: Option<PathBuf>) -> Result<()> {
    let pool = setup_pool(config).await?;
    ensure_migrations(&pool, false).await?;
    let chart = build_service(config, pool)?.org_chart().await?;
    let json = serde_json::to_string_pretty(&chart)?;
    match output {
        Some(path) => {
            std::fs::write(&path, json)
                .with_context(|| format!("failed to write {}", path.display()))?;
            info!(path = %path.display(), "org chart written");
        }
        None => println!("{json}"),
    }
    Ok(())
}

async fn ensure_migrations(pool: &DbPool, allow_dirty: bool) -> Result<()> {
    let pending = Migrator::get_pending_migrations(pool).await?;
    if !pending.is_empty() && !allow_dirty {
        anyhow::bail!(
            "pending migrations detected; run `cargo run -p server -- migrate up` or pass --allow-dirty"
        );
    }
    Ok(())
}

async fn migrate_up(config: &AppConfig) -> Result<()> {
    let pool = setup_pool(config).await?;
    Migrator::up(&pool, None).await?;
    info!("database migrations applied");
    Ok(())
}

async fn migrate_down(config: &AppConfig) -> Result<()> {
    let pool = setup_pool(config).await?;
    Migrator::down(&pool, Some(1)).await?;
    info!("most recent migration rolled back");
    Ok(())
}
