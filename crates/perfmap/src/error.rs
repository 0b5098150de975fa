use crate::event::CodeKind;
use std::{io, path::PathBuf};

/// Represents all possible errors that can occur in this crate.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The perf map destination could not be created or truncated.
    #[error("Failed to open perf map {path}: {source}")]
    Configuration {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The event source refused the subscription.
    #[error(transparent)]
    SourceUnavailable(#[from] SourceUnavailable),

    /// A kind name outside the closed set of code kinds.
    #[error("Unknown code kind: {0:?}")]
    UnknownKind(String),

    /// An event line without a kind field.
    #[error("Code event has no kind")]
    MissingKind,

    /// The writer thread could not be started.
    #[error("Failed to spawn writer thread: {0}")]
    Spawn(#[source] io::Error),

    /// Error occurred while installing a shutdown signal handler.
    #[error("Failed to install signal handler: {0}")]
    SignalHandler(#[source] io::Error),

    /// Error occurred during joining async tasks.
    #[error("Failed to join async tasks: {0}")]
    JoinError(#[from] tokio::task::JoinError),
}

/// Returned by an [`EventSource`](crate::EventSource) that cannot deliver
/// code events in this process, e.g. because the runtime was built without
/// code-event instrumentation.
#[derive(Debug, thiserror::Error)]
#[error("Event source unavailable: {reason}")]
pub struct SourceUnavailable {
    pub reason: String,
}

impl SourceUnavailable {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// Failures that happen after capture started.
///
/// These never reach the event-delivery path. They are reported through
/// [`PerfMap::errors`](crate::PerfMap::errors) and processing continues.
#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    /// Appending or flushing a record failed.
    #[error("Failed to write perf map record: {0}")]
    Write(#[source] io::Error),

    /// The writer queue was full and the event was dropped.
    #[error("Writer queue full, dropped {kind} event at {address:#x}")]
    Overflow { kind: CodeKind, address: u64 },
}
