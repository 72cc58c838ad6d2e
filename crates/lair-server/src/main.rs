//! Lair binary.
//!
//! # Usage
//!
//! ```bash
//! # One session on this terminal (logs go to lair.log)
//! lair local
//!
//! # Host sessions over SSH
//! lair serve --bind 0.0.0.0:23234 --host-key .ssh/lair_ed25519
//! ssh -p 23234 localhost
//! ```

use std::{
    collections::HashMap,
    fs::File,
    path::PathBuf,
    sync::{Arc, Mutex},
    time::Duration,
};

use clap::{Parser, Subcommand};
use lair_app::Router;
use lair_server::{
    LocalTerminal, Server, ServerConfig, Services, ServicesConfig, SessionHost, Store,
};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Dragon's Lair terminal site
#[derive(Parser, Debug)]
#[command(name = "lair")]
#[command(about = "Terminal site served locally or over SSH")]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", env = "LAIR_LOG_LEVEL", global = true)]
    log_level: String,

    /// Path to the user database
    #[arg(long, default_value = "lair.redb", env = "LAIR_DB", global = true)]
    db: PathBuf,

    /// Document shown on the About page
    #[arg(long, default_value = "about.md", env = "LAIR_ABOUT", global = true)]
    about: PathBuf,

    /// Location for the menu's weather line
    #[arg(long, default_value = "pretoria", env = "LAIR_WEATHER_LOCATION", global = true)]
    weather_location: String,

    /// Mail relay endpoint for contact messages (logged when unset)
    #[arg(long, env = "LAIR_MAIL_ENDPOINT", global = true)]
    mail_endpoint: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run one session on this terminal
    Local {
        /// Log file (the terminal is taken by the UI)
        #[arg(long, default_value = "lair.log", env = "LAIR_LOG_FILE")]
        log_file: PathBuf,
    },

    /// Serve sessions over SSH
    Serve {
        /// Address to bind to
        #[arg(short, long, default_value = "0.0.0.0:23234", env = "LAIR_BIND")]
        bind: String,

        /// Ed25519 host key (generated when missing)
        #[arg(long, default_value = ".ssh/lair_ed25519", env = "LAIR_HOST_KEY")]
        host_key: PathBuf,

        /// Seconds sessions get to finish on shutdown
        #[arg(long, default_value = "30")]
        grace_secs: u64,

        /// Seconds before an idle connection is closed
        #[arg(long, default_value = "600")]
        idle_timeout_secs: u64,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    match &args.command {
        Command::Local { log_file } => {
            let file = File::create(log_file)?;
            tracing_subscriber::registry()
                .with(fmt::layer().with_writer(Mutex::new(file)).with_ansi(false))
                .with(filter)
                .init();
        },
        Command::Serve { .. } => {
            tracing_subscriber::registry()
                .with(fmt::layer().with_writer(std::io::stderr))
                .with(filter)
                .init();
        },
    }

    let store = Arc::new(Store::open(&args.db)?);
    let health = store.health();
    info!(status = %health.status, users = health.users, "{}", health.message);

    let services = Services::from_config(ServicesConfig {
        weather_location: args.weather_location,
        mail_endpoint: args.mail_endpoint,
        documents: HashMap::from([("about".to_string(), args.about)]),
        ..Default::default()
    })?;

    let result = match args.command {
        Command::Local { .. } => run_local(services).await,
        Command::Serve { bind, host_key, grace_secs, idle_timeout_secs } => {
            let config = ServerConfig {
                bind,
                host_key,
                grace: Duration::from_secs(grace_secs),
                idle_timeout: Duration::from_secs(idle_timeout_secs),
            };
            run_server(config, services, Arc::clone(&store)).await
        },
    };

    match Arc::try_unwrap(store) {
        Ok(store) => store.close(),
        Err(_) => warn!("store still referenced at exit, dropping"),
    }
    result
}

async fn run_local(services: Services) -> Result<(), Box<dyn std::error::Error>> {
    let term = std::env::var("TERM").unwrap_or_else(|_| "unknown".to_string());
    let terminal = LocalTerminal::new()?;

    let mut host = SessionHost::new(0, terminal, Router::new(term), services);
    let end = host.run().await?;
    info!(?end, "local session finished");
    Ok(())
}

async fn run_server(
    config: ServerConfig,
    services: Services,
    store: Arc<Store>,
) -> Result<(), Box<dyn std::error::Error>> {
    info!("Lair server starting");
    info!("Binding to {}", config.bind);

    let server = Server::bind(config, services).await?.with_store(store);
    info!("Server listening on {}", server.local_addr()?);

    let report = server.run(shutdown_signal()).await;
    if report.aborted > 0 {
        warn!(finished = report.finished, aborted = report.aborted, "forced shutdown");
    } else {
        info!(finished = report.finished, "graceful shutdown complete");
    }
    Ok(())
}

/// Resolves on Ctrl-C, or SIGTERM on unix.
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => info!("Received SIGINT, initiating shutdown"),
                    _ = sigterm.recv() => info!("Received SIGTERM, initiating shutdown"),
                }
                return;
            },
            Err(e) => warn!(error = %e, "failed to install SIGTERM handler"),
        }
    }

    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Received SIGINT, initiating shutdown"),
        Err(e) => {
            warn!(error = %e, "failed to install Ctrl-C handler, running until killed");
            std::future::pending::<()>().await;
        },
    }
}
