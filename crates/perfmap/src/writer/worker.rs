use super::{report, stats::Counters};
use crate::{error::CaptureError, event::CodeEvent, symbolize::MapRecord};
use flume::{Receiver, RecvTimeoutError, Sender};
use std::{
    io::{self, Write},
    sync::Arc,
    time::Duration,
};
use tracing::{trace, warn};

/// Owns the output stream for the lifetime of one capture.
///
/// Appends records in arrival order until every sender is gone, then
/// flushes. Dropping the worker closes the stream.
pub(super) struct Worker<W: Write> {
    out: W,
    events: Receiver<CodeEvent>,
    counters: Arc<Counters>,
    errors: Sender<CaptureError>,
    flush_interval: Duration,
    line: String,
}

impl<W: Write> Worker<W> {
    pub(super) fn new(
        out: W,
        events: Receiver<CodeEvent>,
        counters: Arc<Counters>,
        errors: Sender<CaptureError>,
        flush_interval: Duration,
    ) -> Self {
        Self {
            out,
            events,
            counters,
            errors,
            flush_interval,
            line: String::new(),
        }
    }

    pub(super) fn run(mut self) {
        while let Some(event) = self.next_event() {
            self.append(&event);
        }
        self.flush();
    }

    fn next_event(&mut self) -> Option<CodeEvent> {
        if self.flush_interval.is_zero() {
            return self.events.recv().ok();
        }
        loop {
            match self.events.recv_timeout(self.flush_interval) {
                Ok(event) => return Some(event),
                Err(RecvTimeoutError::Timeout) => self.flush(),
                Err(RecvTimeoutError::Disconnected) => return None,
            }
        }
    }

    fn append(&mut self, event: &CodeEvent) {
        use std::fmt::Write as _;

        self.line.clear();
        // formatting into a String cannot fail
        let _ = writeln!(self.line, "{}", MapRecord::new(event));

        match self.out.write_all(self.line.as_bytes()) {
            Ok(()) => {
                Counters::bump(&self.counters.written, 1);
                Counters::bump(&self.counters.bytes, self.line.len() as u64);
                trace!(record = self.line.trim_end(), "record written");
            }
            Err(err) => self.fail(err),
        }
    }

    fn flush(&mut self) {
        if let Err(err) = self.out.flush() {
            self.fail(err);
        }
    }

    fn fail(&self, err: io::Error) {
        warn!(%err, "perf map write failed");
        report(&self.errors, CaptureError::Write(err));
    }
}
