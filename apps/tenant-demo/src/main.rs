use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use tenant_demo::config::{AppConfig, CliOverrides};
use tenant_demo::{logging, open_session, scenario};

/// Tenant isolation demo over SQLite
#[derive(Parser)]
#[command(name = "tenant-demo")]
#[command(about = "Runs the tenant isolation smoke scenario")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Database DSN override (overrides config)
    #[arg(long)]
    dsn: Option<String>,

    /// Print effective configuration (YAML) and exit
    #[arg(long)]
    print_config: bool,

    /// Log verbosity level (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Seed the database and verify isolation for every account
    Run,
    /// Validate configuration and exit
    Check,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // 1) defaults -> 2) YAML (if provided) -> 3) env (APP__*) -> 4) CLI overrides
    let mut config = AppConfig::load(cli.config.as_deref())?;
    config.apply_cli_overrides(&CliOverrides {
        dsn: cli.dsn.clone(),
        verbose: cli.verbose,
    });

    logging::init(&config.logging);

    if cli.print_config {
        println!("{}", config.to_yaml()?);
        return Ok(());
    }

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => run(&config).await,
        Commands::Check => check(&config),
    }
}

async fn run(config: &AppConfig) -> Result<()> {
    config.validate()?;
    tracing::info!(policy = ?config.isolation.missing_tenant, "tenant demo starting");

    let session = open_session(&config.database, config.isolation).await?;
    let report = scenario::run(&session).await?;

    print!("{report}");
    Ok(())
}

fn check(config: &AppConfig) -> Result<()> {
    tracing::info!("Checking configuration...");
    config.validate()?;
    println!("Configuration is valid");
    Ok(())
}
