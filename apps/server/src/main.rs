#![warn(clippy::all, clippy::pedantic)]

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use actix_web::{App, HttpServer, web};
use clap::Parser;
use tokio::sync::watch;

mod config;
mod error;
mod monitoring;
mod routes;
mod storage;
mod validation;

use config::Config;
use error::AppError;
use logger::init_tracing;
use monitoring::{MonitorScheduler, build_prober};
use routes::AppState;
use storage::{ChangeOracle, CsvStatusLog, StatusLog};

/// Network reachability monitor with a pull-based status dashboard.
#[derive(Debug, Parser)]
#[command(name = "netwatch-server", version)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[actix_web::main]
async fn main() -> Result<(), AppError> {
    init_tracing();

    let cli = Cli::parse();
    let config = Config::from_config(cli.config)
        .map_err(|error| AppError::Config(format!("{error:?}")))?;

    validation::validate_config(&config)
        .to_result()
        .map_err(|error| AppError::Config(error.to_string()))?;

    tracing::info!("{config}");

    let addr: SocketAddr = format!("{}:{}", config.server.bind, config.server.port).parse()?;

    let log: Arc<dyn StatusLog> =
        Arc::new(CsvStatusLog::open(&config.monitoring.log_file).await?);
    let oracle = ChangeOracle::new(log.clone());

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let prober = build_prober(config.monitoring.probe, config.probe_timeout());
    let scheduler = MonitorScheduler::new(prober, log.clone(), shutdown_rx);
    let monitors = scheduler.schedule_devices(config.monitored_devices());
    tracing::info!("started {} device monitors", monitors.len());

    run_server(addr, AppState { log, oracle }).await?;

    // The HTTP server has exited; stop the check loops before leaving.
    let _ = shutdown_tx.send(true);
    for monitor in monitors {
        let _ = monitor.await;
    }

    Ok(())
}

async fn run_server(addr: SocketAddr, state: AppState) -> Result<(), AppError> {
    tracing::info!("dashboard listening on http://{addr}");

    HttpServer::new(move || {
        App::new().app_data(web::Data::new(state.clone())).configure(routes::routes)
    })
    .bind(addr)?
    .run()
    .await?;

    Ok(())
}
