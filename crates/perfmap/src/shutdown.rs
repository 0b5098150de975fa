use crate::{Error, PerfMap};
use std::sync::Arc;
use tracing::info;

/// Close `perf_map` once the process is asked to terminate.
///
/// Waits for SIGINT or SIGTERM. Hosts `select!` this against their own
/// work as a backstop; calling [`PerfMap::close`] in their own shutdown
/// path stays the primary contract.
pub async fn close_on_shutdown(perf_map: Arc<PerfMap>) -> Result<(), Error> {
    wait_for_termination().await?;
    info!("shutdown requested, closing perf map");
    tokio::task::spawn_blocking(move || perf_map.close()).await?;
    Ok(())
}

#[cfg(unix)]
async fn wait_for_termination() -> Result<(), Error> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut sigint = signal(SignalKind::interrupt()).map_err(Error::SignalHandler)?;
    let mut sigterm = signal(SignalKind::terminate()).map_err(Error::SignalHandler)?;
    tokio::select! {
        _ = sigint.recv() => {}
        _ = sigterm.recv() => {}
    }
    Ok(())
}

#[cfg(not(unix))]
async fn wait_for_termination() -> Result<(), Error> {
    tokio::signal::ctrl_c().await.map_err(Error::SignalHandler)
}
