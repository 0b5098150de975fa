mod stats;
mod worker;

pub use stats::CaptureStats;

use crate::{
    Error,
    error::CaptureError,
    event::CodeEvent,
    filter::{Accept, EventFilter},
    source::{EventCallback, EventSource, SubscriptionId},
};
use config::Config;
use flume::{Receiver, Sender, TrySendError};
use humansize::{DECIMAL, format_size};
use parking_lot::{Mutex, RwLock};
use stats::Counters;
use std::{
    fs::File,
    io::BufWriter,
    mem,
    path::{Path, PathBuf},
    sync::Arc,
    thread::{self, JoinHandle},
    time::Duration,
};
use tracing::{debug, error, info};
use worker::Worker;

/// Lifecycle of a [`PerfMap`]. `Closed` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Idle,
    Capturing,
    Closed,
}

#[derive(Debug)]
enum Lifecycle {
    Idle,
    Capturing {
        subscription: SubscriptionId,
        worker: JoinHandle<()>,
    },
    Closed,
}

/// Records code events from an [`EventSource`] into a perf map file.
///
/// Each accepted event becomes one line `<address-hex> <size-hex>
/// <kind>:<label>`, in delivery order. The subscription callback only
/// filters and enqueues; a dedicated writer thread formats and appends, so
/// the thread that generated the code never waits on I/O.
///
/// The capture is closed by [`disable`](PerfMap::disable) (or its alias
/// [`close`](PerfMap::close)), and as a backstop when the `PerfMap` is
/// dropped. Once closed it stays closed.
pub struct PerfMap {
    path: PathBuf,
    queue_capacity: usize,
    flush_interval: Duration,
    filter: Arc<EventFilter>,
    source: Arc<dyn EventSource>,
    lifecycle: Mutex<Lifecycle>,
    /// `None` outside of `Capturing`. Late events find it empty.
    sender: Arc<RwLock<Option<Sender<CodeEvent>>>>,
    counters: Arc<Counters>,
    errors_tx: Sender<CaptureError>,
    errors_rx: Receiver<CaptureError>,
}

impl PerfMap {
    /// Build an idle capture from configuration.
    pub fn new(config: &Config, source: Arc<dyn EventSource>) -> Self {
        let accept = Accept::from_config(config.capture.accept.as_ref());
        Self::with_accept(config, source, accept)
    }

    /// Like [`new`](PerfMap::new), but ignores `capture.accept` in favor of
    /// `accept`.
    pub fn with_accept(config: &Config, source: Arc<dyn EventSource>, accept: Accept) -> Self {
        let (errors_tx, errors_rx) = flume::bounded(config.capture.error_capacity.max(1));
        Self {
            path: config.output.resolved_path(),
            queue_capacity: config.capture.queue_capacity.max(1),
            flush_interval: config.capture.flush_interval,
            filter: Arc::new(EventFilter::new(accept)),
            source,
            lifecycle: Mutex::new(Lifecycle::Idle),
            sender: Arc::new(RwLock::new(None)),
            counters: Arc::default(),
            errors_tx,
            errors_rx,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn state(&self) -> State {
        match *self.lifecycle.lock() {
            Lifecycle::Idle => State::Idle,
            Lifecycle::Capturing { .. } => State::Capturing,
            Lifecycle::Closed => State::Closed,
        }
    }

    pub fn stats(&self) -> CaptureStats {
        self.counters.snapshot()
    }

    /// Failures that happened after capture started.
    pub fn errors(&self) -> Receiver<CaptureError> {
        self.errors_rx.clone()
    }

    /// Create (or truncate) the map and start recording.
    ///
    /// Does nothing unless the capture is idle. On error the capture stays
    /// idle.
    pub fn enable(&self) -> Result<(), Error> {
        let mut lifecycle = self.lifecycle.lock();
        if !matches!(*lifecycle, Lifecycle::Idle) {
            debug!(path = %self.path.display(), "perf map already enabled or closed");
            return Ok(());
        }

        let file = File::create(&self.path).map_err(|source| Error::Configuration {
            path: self.path.clone(),
            source,
        })?;

        let (events_tx, events_rx) = flume::bounded(self.queue_capacity);
        let worker = Worker::new(
            BufWriter::new(file),
            events_rx,
            Arc::clone(&self.counters),
            self.errors_tx.clone(),
            self.flush_interval,
        );
        let worker = thread::Builder::new()
            .name("perfmap-writer".into())
            .spawn(move || worker.run())
            .map_err(Error::Spawn)?;

        *self.sender.write() = Some(events_tx);
        let subscription = match self.source.subscribe(self.callback()) {
            Ok(subscription) => subscription,
            Err(err) => {
                self.sender.write().take();
                let _ = worker.join();
                return Err(err.into());
            }
        };
        self.source.enable(subscription);

        *lifecycle = Lifecycle::Capturing {
            subscription,
            worker,
        };
        info!(path = %self.path.display(), "perf map capture enabled");
        Ok(())
    }

    /// Stop recording, release the subscription, flush and close the map.
    ///
    /// Events accepted before this call are written before it returns;
    /// events delivered afterwards are discarded. Does nothing unless the
    /// capture is running, so calling it again is harmless.
    ///
    /// Must not be called from inside an event callback.
    pub fn disable(&self) {
        let mut lifecycle = self.lifecycle.lock();
        let (subscription, worker) = match mem::replace(&mut *lifecycle, Lifecycle::Closed) {
            Lifecycle::Capturing {
                subscription,
                worker,
            } => (subscription, worker),
            other => {
                *lifecycle = other;
                return;
            }
        };

        self.source.disable(subscription);
        self.source.unsubscribe(subscription);
        // the worker drains what is queued, then sees the channel disconnect
        self.sender.write().take();
        if worker.join().is_err() {
            error!(path = %self.path.display(), "perf map writer panicked");
        }

        let stats = self.stats();
        info!(
            path = %self.path.display(),
            records = stats.written,
            size = %format_size(stats.bytes, DECIMAL),
            rejected = stats.rejected,
            dropped = stats.dropped,
            "perf map capture closed"
        );
    }

    /// Alias of [`disable`](PerfMap::disable) for shutdown sequences.
    pub fn close(&self) {
        self.disable();
    }

    fn callback(&self) -> EventCallback {
        let filter = Arc::clone(&self.filter);
        let sender = Arc::clone(&self.sender);
        let counters = Arc::clone(&self.counters);
        let errors = self.errors_tx.clone();

        Arc::new(move |event: &CodeEvent| {
            // recursive: the runtime may report code generated while we run
            let sender = sender.read_recursive();
            let Some(events) = sender.as_ref() else {
                Counters::bump(&counters.discarded, 1);
                return;
            };
            if !filter.should_record(event) {
                Counters::bump(&counters.rejected, 1);
                return;
            }
            match events.try_send(event.clone()) {
                Ok(()) => Counters::bump(&counters.accepted, 1),
                Err(TrySendError::Full(event)) => {
                    Counters::bump(&counters.dropped, 1);
                    report(
                        &errors,
                        CaptureError::Overflow {
                            kind: event.kind,
                            address: event.address,
                        },
                    );
                }
                Err(TrySendError::Disconnected(_)) => Counters::bump(&counters.discarded, 1),
            }
        })
    }
}

impl Drop for PerfMap {
    fn drop(&mut self) {
        self.disable();
    }
}

impl std::fmt::Debug for PerfMap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PerfMap")
            .field("path", &self.path)
            .field("state", &self.state())
            .field("filter", &self.filter)
            .finish_non_exhaustive()
    }
}

/// Hand an error to whoever listens on [`PerfMap::errors`] without blocking.
pub(crate) fn report(errors: &Sender<CaptureError>, err: CaptureError) {
    if let Err(TrySendError::Full(err)) = errors.try_send(err) {
        debug!(%err, "error channel full, notification dropped");
    }
}
