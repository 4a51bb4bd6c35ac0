use anyhow::Context;
use clap::{Parser, Subcommand};

use crate::config::{AppConfig, StorageBackend};
use crate::database::manager;

#[derive(Parser)]
#[command(name = "taskboard-api")]
#[command(about = "Taskboard API - multi-user task and project tracking backend")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    #[command(about = "Run the HTTP server (default)")]
    Serve {
        #[arg(long, help = "Address to bind, overrides SERVER_HOST")]
        host: Option<String>,

        #[arg(long, short, help = "Port to bind, overrides PORT")]
        port: Option<u16>,
    },

    #[command(about = "Apply the PostgreSQL schema and exit")]
    Migrate,
}

pub async fn run(cli: Cli, mut config: AppConfig) -> anyhow::Result<()> {
    match cli.command.unwrap_or(Commands::Serve { host: None, port: None }) {
        Commands::Serve { host, port } => {
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            crate::server::serve(config).await
        }
        Commands::Migrate => {
            if config.database.backend != StorageBackend::Postgres {
                anyhow::bail!("migrate requires STORAGE_BACKEND=postgres");
            }
            let pool = manager::connect(&config.database)
                .await
                .context("failed to connect to database")?;
            manager::migrate(&pool).await.context("failed to apply schema")?;
            Ok(())
        }
    }
}
