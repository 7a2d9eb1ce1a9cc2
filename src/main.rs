/*****************************************************************************************
 *
 *  formdrop – HTML form intake with a decoupled JSON writer
 *  --------------------------------------------------------
 *
 *  HTTP front end  ──UDP datagram──▶  sink  ──read/merge/write──▶  storage/data.json
 *
 *  The front end never writes to disk. A POST is forwarded as one datagram
 *  and the browser is redirected before anything is stored; a lost datagram
 *  is a lost submission.
 *
 *****************************************************************************************/

mod app;
mod config;
mod errors;
mod persistence;
mod routes;
mod services;
mod state;

use std::error::Error;
use std::path::PathBuf;

use axum::serve;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio::task;

use tracing::level_filters::LevelFilter;
use tracing_subscriber::FmtSubscriber;

use crate::config::AppConfig;
use crate::persistence::JsonStore;
use crate::services::sink_service::DatagramSink;
use crate::state::app::AppState;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    //
    // ────────────────────────────────────────────────────────
    //  Locate and load config.json (EXE folder, project root or CWD)
    // ────────────────────────────────────────────────────────
    //
    let config_path = locate_config();
    let cfg = match &config_path {
        Some(path) => AppConfig::load_from_file(path)?,
        None => AppConfig::default(),
    };

    //
    // ────────────────────────────────────────────────────────
    //  Configure logging
    // ────────────────────────────────────────────────────────
    //
    let level = match cfg.log_level.to_lowercase().as_str() {
        "trace" => LevelFilter::TRACE,
        "debug" => LevelFilter::DEBUG,
        "info" => LevelFilter::INFO,
        "warn" => LevelFilter::WARN,
        "error" => LevelFilter::ERROR,
        _ => LevelFilter::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_thread_names(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    match &config_path {
        Some(path) => tracing::info!("Loaded config.json from {}", path.display()),
        None => tracing::warn!("config.json not found, using built-in defaults"),
    }
    tracing::info!("Starting formdrop…");
    tracing::info!("Loaded configuration: {:?}", cfg);

    //
    // ────────────────────────────────────────────────────────
    //  Start the datagram sink
    // ────────────────────────────────────────────────────────
    //
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let store = JsonStore::from_config(&cfg);
    tracing::info!("Storing submissions in {}", store.path().display());

    let sink = DatagramSink::bind(&cfg, store).await?;
    let sink_task = task::spawn(sink.run(shutdown_rx));

    //
    // ────────────────────────────────────────────────────────
    //  Build Axum app and start listening
    // ────────────────────────────────────────────────────────
    //
    let app = app::build_app(AppState::new(&cfg));

    let listener = TcpListener::bind(cfg.http_addr).await?;
    tracing::info!("Listening on http://{}", listener.local_addr()?);

    serve(listener, app)
        .with_graceful_shutdown(shutdown(shutdown_tx))
        .await?;

    sink_task.await?;
    tracing::info!("Goodbye.");
    Ok(())
}

//
// ─────────────────────────────────────────────────────────────
//  Graceful shutdown handler
// ─────────────────────────────────────────────────────────────
//
async fn shutdown(sink_shutdown: watch::Sender<bool>) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }

    tracing::warn!("CTRL+C received, stopping HTTP server and datagram sink…");
    // The sink stops either way: a dropped sender ends its loop too.
    let _ = sink_shutdown.send(true);
}

fn locate_config() -> Option<PathBuf> {
    let mut candidates = Vec::new();

    if let Some(exe_dir) = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(PathBuf::from))
    {
        candidates.push(exe_dir.join("config.json"));
        candidates.push(exe_dir.join("..").join("config.json"));
    }
    candidates.push(PathBuf::from("config.json"));

    candidates.into_iter().find(|path| path.exists())
}
