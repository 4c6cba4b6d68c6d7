// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Allot: project allocation store + auditing gateway
//
//  Store:    Basic-auth JSON endpoint over a file-backed dataset
//  Gateway:  forwards to the store, writes one audit file per call
//  Runtime:  both axum apps on one tokio runtime, shared shutdown
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

use allot_api::server::{GatewayState, StoreState, build_gateway_router, build_store_router, serve};
use allot_core::AllotConfig;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "allot", version, about = "Allot: project allocation store and gateway")]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "allot.yaml")]
    config: PathBuf,

    /// Log level (overrides `logging.level`; `RUST_LOG` still wins)
    #[arg(long)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    /// Run only the Allocation Store Service
    Store,
    /// Run only the Allocation Gateway Service
    Gateway,
    /// Run both services in one process
    All,
    /// Print the effective configuration as YAML and exit
    Config,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let command = cli.command.unwrap_or(Command::All);

    // ── Config ──
    // A missing file leaves the defaults in place; env overrides still apply.
    let config_found = cli.config.exists();
    let config = AllotConfig::load(&cli.config)?;

    if command == Command::Config {
        print!("{}", serde_yaml::to_string(&config)?);
        return Ok(());
    }

    // ── Tracing ──
    allot_observability::init_tracing(&config.logging, cli.log_level.as_deref())?;

    info!(version = env!("CARGO_PKG_VERSION"), ?command, "Allot starting");
    if config_found {
        info!(path = %cli.config.display(), "Loaded config file");
    } else {
        info!(path = %cli.config.display(), "No config file found, using defaults");
    }

    // ── Shutdown fan-out ──
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        shutdown_signal().await;
        info!("Shutdown signal received, stopping...");
        let _ = shutdown_tx.send(true);
    });

    match command {
        Command::Store => run_store(&config, shutdown_rx).await?,
        Command::Gateway => run_gateway(&config, shutdown_rx).await?,
        Command::All => {
            tokio::try_join!(
                run_store(&config, shutdown_rx.clone()),
                run_gateway(&config, shutdown_rx),
            )?;
        }
        Command::Config => {}
    }

    info!("Allot stopped");
    Ok(())
}

async fn run_store(config: &AllotConfig, shutdown: watch::Receiver<bool>) -> anyhow::Result<()> {
    let state = Arc::new(StoreState::from_config(&config.store));

    let records = state.load_records().await?;
    info!(
        records = records.len(),
        path = %config.store.data_file.display(),
        "Allocation dataset available"
    );

    let app = build_store_router(state);
    serve("store", &config.store.addr, app, wait_for(shutdown)).await
}

async fn run_gateway(config: &AllotConfig, shutdown: watch::Receiver<bool>) -> anyhow::Result<()> {
    let state = Arc::new(GatewayState::from_config(&config.gateway)?);
    info!(
        upstream = %config.gateway.upstream_url,
        timeout_secs = config.gateway.timeout_secs,
        audit_dir = %config.gateway.audit_dir.display(),
        "Gateway configured"
    );

    let app = build_gateway_router(state);
    serve("gateway", &config.gateway.addr, app, wait_for(shutdown)).await
}

/// Resolves once the shutdown flag flips (or its sender is gone).
async fn wait_for(mut shutdown: watch::Receiver<bool>) {
    while !*shutdown.borrow_and_update() {
        if shutdown.changed().await.is_err() {
            break;
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
