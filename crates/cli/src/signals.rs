use crate::error::Error;
use flume::Sender;
use tokio::signal::unix::{SignalKind, signal};

/// Indefinitely listens to signals and sends signal events to the provided channel.
pub async fn wait_for_signal(signal_event: &Sender<SignalEvent>) -> Result<(), Error> {
    let mut sigusr1 = signal(SignalKind::user_defined1()).map_err(Error::SignalHandler)?;

    loop {
        sigusr1.recv().await;
        signal_event.send_async(SignalEvent::DumpStats).await?;
    }
}

#[derive(Debug, Clone, Copy)]
pub enum SignalEvent {
    /// SIGUSR1: log the capture counters.
    DumpStats,
}
