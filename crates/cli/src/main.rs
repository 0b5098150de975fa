use clap::Parser;
use config::Config;
use flume::bounded;
use perfmap::{EventBus, PerfMap, close_on_shutdown};
use perfmap_cli::{
    cli::Cli,
    replay::replay_input,
    signals::{SignalEvent, wait_for_signal},
};
use std::{
    io::{self, Write},
    sync::Arc,
    thread,
};
use tracing::{debug, info, warn};
use tracing_log::AsTrace;

#[cfg(feature = "jemalloc")]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    tracing_subscriber::fmt()
        .with_max_level(cli.verbosity.log_level_filter().as_trace())
        .with_level(true)
        .with_file(true)
        .with_line_number(true)
        .with_writer(io::stderr)
        .init();

    debug!(config = ?cli);

    let mut config = match &cli.config {
        Some(path) => Config::load(path)?,
        _ => Config::new()?,
    };
    cli.apply(&mut config);

    if cli.print_config {
        io::stdout().write_all(config.to_toml()?.as_bytes())?;
        return Ok(());
    }

    let bus = Arc::new(EventBus::new());
    let perf_map = Arc::new(PerfMap::new(&config, bus.clone()));
    perf_map.enable()?;
    let errors = perf_map.errors();

    // plain thread: a blocked stdin read must not hold up runtime shutdown
    let (replay_tx, replay_rx) = bounded(1);
    let input = cli.input_path().map(ToOwned::to_owned);
    let replay_bus = bus.clone();
    thread::Builder::new()
        .name("perfmap-replay".into())
        .spawn(move || {
            let _ = replay_tx.send(replay_input(input.as_deref(), &replay_bus));
        })?;

    let (signal_tx, signal_rx) = bounded(8);
    let signals = wait_for_signal(&signal_tx);
    let shutdown = close_on_shutdown(perf_map.clone());
    tokio::pin!(signals, shutdown);

    loop {
        tokio::select! {
            res = replay_rx.recv_async() => {
                let report = res??;
                info!(?report, "event log replayed");
                break;
            }
            res = &mut shutdown => {
                res?;
                break;
            }
            err = &mut signals => {
                tracing::error!(error = ?err, "Error while waiting for signal");
                err?;
                break;
            }
            Ok(event) = signal_rx.recv_async() => {
                match event {
                    SignalEvent::DumpStats => info!(stats = ?perf_map.stats(), "capture stats"),
                }
            }
            Ok(err) = errors.recv_async() => {
                warn!(%err, "capture error");
            }
        }
    }

    let closing = perf_map.clone();
    tokio::task::spawn_blocking(move || closing.close()).await?;
    for err in errors.drain() {
        warn!(%err, "capture error");
    }
    info!(path = %perf_map.path().display(), stats = ?perf_map.stats(), "done");

    Ok(())
}
