use std::sync::atomic::{AtomicU64, Ordering};

/// Counters of a capture, as seen at one point in time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CaptureStats {
    /// Passed the filter and were queued for writing.
    pub accepted: u64,
    /// Rejected by the filter.
    pub rejected: u64,
    /// Records handed to the map's output buffer.
    ///
    /// A later flush that fails is reported as
    /// [`CaptureError::Write`](crate::CaptureError::Write) and is not
    /// subtracted here. Once the capture is closed without such an error,
    /// this equals the number of lines in the map.
    pub written: u64,
    /// Dropped because the writer queue was full.
    pub dropped: u64,
    /// Delivered after the capture was closed.
    pub discarded: u64,
    /// Bytes handed to the map's output buffer, counted like `written`.
    pub bytes: u64,
}

#[derive(Debug, Default)]
pub(crate) struct Counters {
    pub(crate) accepted: AtomicU64,
    pub(crate) rejected: AtomicU64,
    pub(crate) written: AtomicU64,
    pub(crate) dropped: AtomicU64,
    pub(crate) discarded: AtomicU64,
    pub(crate) bytes: AtomicU64,
}

impl Counters {
    #[inline]
    pub(crate) fn bump(counter: &AtomicU64, by: u64) {
        counter.fetch_add(by, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> CaptureStats {
        CaptureStats {
            accepted: self.accepted.load(Ordering::Relaxed),
            rejected: self.rejected.load(Ordering::Relaxed),
            written: self.written.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
            discarded: self.discarded.load(Ordering::Relaxed),
            bytes: self.bytes.load(Ordering::Relaxed),
        }
    }
}
