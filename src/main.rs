//! Relata - relationship mapping walkthrough

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::io::Write;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use relata::{
    api, commands,
    config::{Config, DEFAULT_CONFIG_FILE},
    db::{schema, Store},
};

#[derive(Debug, Parser)]
#[command(name = "relata")]
#[command(about = "Relationship mapping walkthrough over SQLite", long_about = None)]
struct Cli {
    /// Path to the YAML configuration file
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Drop every table and create them again
    InitDb,
    /// One-to-one walkthrough (User ↔ UserData)
    OneToOne,
    /// One-to-many walkthrough (Author → Article)
    OneToMany,
    /// Many-to-many walkthrough (Article ↔ Tag)
    ManyToMany,
    /// Interactive shell over the store
    Shell,
    /// Serve the HTTP routes
    Serve,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "relata=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = Config::load_with_env(&cli.config)?;
    tracing::debug!("Configuration loaded from {}", cli.config.display());

    let store = Store::connect(&config.database).await?;
    tracing::info!("Database opened: {}", store.pool().location());

    if !matches!(cli.command, Commands::InitDb) {
        schema::create_all(store.pool()).await?;
    }

    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    let result = match cli.command {
        Commands::InitDb => commands::dbinit::execute(&store, &mut out).await,
        Commands::OneToOne => commands::one_to_one::execute(&store, &mut out)
            .await
            .map(|_| ()),
        Commands::OneToMany => commands::one_to_many::execute(&store, &mut out)
            .await
            .map(|_| ()),
        Commands::ManyToMany => commands::many_to_many::execute(&store, &mut out)
            .await
            .map(|_| ()),
        Commands::Shell => {
            let stdin = std::io::stdin();
            commands::shell::execute(&store, stdin.lock(), &mut out).await
        }
        Commands::Serve => api::serve(store.clone(), &config.server).await,
    };

    out.flush()?;
    store.pool().close().await;
    result
}
