use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tokio::net::TcpListener;
use tracing::{info, warn};

use shopfront::{ShopfrontConfig, create_router, init_services, seed, telemetry};

#[derive(Parser, Debug)]
#[command(name = "shopfront")]
#[command(about = "E-commerce REST API server")]
struct Args {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override `server.bind_address`
    #[arg(short, long)]
    bind: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP server (default)
    Serve,
    /// Load the sample dataset, replacing existing records
    Seed {
        /// Delete all records instead of importing
        #[arg(long, short = 'd')]
        destroy: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut config = ShopfrontConfig::load(args.config.as_deref())
        .context("failed to load configuration")?;
    if let Some(bind) = args.bind {
        config.server.bind_address = bind;
    }

    telemetry::init(&config.logging);

    let (sessions, catalog) = init_services(&config.accounts).await?;

    match args.command.unwrap_or(Command::Serve) {
        Command::Seed { destroy: true } => {
            seed::destroy(&sessions, &catalog).await?;
            info!("Data destroyed");
        }
        Command::Seed { destroy: false } => {
            seed::import(&sessions, &catalog).await?;
            info!("Data imported");
        }
        Command::Serve => {
            if !config.server.secure_cookies {
                warn!("Refresh-token cookies are sent without the Secure attribute");
            }

            let app = create_router(sessions, catalog, &config.server);
            let listener = TcpListener::bind(&config.server.bind_address)
                .await
                .with_context(|| format!("failed to bind {}", config.server.bind_address))?;
            info!("Server running on {}", listener.local_addr()?);

            axum::serve(
                listener,
                app.into_make_service_with_connect_info::<SocketAddr>(),
            )
            .with_graceful_shutdown(shutdown_signal())
            .await?;
        }
    }

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutting down");
}
