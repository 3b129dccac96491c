use std::{net::SocketAddr, sync::Arc};

use anyhow::Result;
use controller::{Rotator, SlmController};
use patterns::PatternStore;
use tokio::{net::TcpListener, sync::watch};
use tracing::{error, info};

mod advance;
mod config;
mod routes;

use config::load_settings;
use routes::{build_router, AppState};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();

    let settings = load_settings();
    let store = PatternStore::open(&settings.patterns_dir, &settings.template).map_err(|error| {
        error!(
            %error,
            dir = %settings.patterns_dir,
            "failed to open patterns directory; verify it exists and holds at least one pattern"
        );
        error
    })?;

    let (sink, render, _last_shown) = display::channel();
    let controller = Arc::new(SlmController::new(store, Arc::new(sink))?);
    let rotator = Arc::new(Rotator::default());

    // One shutdown signal stops the render loop, the advance listener, and
    // the control surface; none of them waits on another.
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let render_task = tokio::spawn(render.run(shutdown_rx.clone()));

    let pulse_listener = TcpListener::bind(&settings.advance_bind).await?;
    let advance_task = tokio::spawn(advance::serve(
        pulse_listener,
        Arc::clone(&controller),
        shutdown_rx.clone(),
    ));

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("shutdown requested");
            let _ = shutdown_tx.send(true);
        }
    });

    let app = build_router(Arc::new(AppState { controller, rotator }));
    let addr: SocketAddr = settings.rpc_bind.parse()?;
    info!(%addr, "control surface listening");
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(wait_for_shutdown(shutdown_rx))
        .await?;

    advance_task.await??;
    render_task.await?;
    info!("shutdown complete");
    Ok(())
}

async fn wait_for_shutdown(mut shutdown: watch::Receiver<bool>) {
    while !*shutdown.borrow() {
        if shutdown.changed().await.is_err() {
            break;
        }
    }
}
