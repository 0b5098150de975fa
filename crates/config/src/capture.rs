#![forbid(unsafe_code)]

use crate::accept::AcceptList;
use serde::{Deserialize, Serialize};
use serde_with::serde_as;
use std::time::Duration;

#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Capture {
    /// Kinds to record. Unset records every event.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accept: Option<AcceptList>,

    /// Bound of the queue between the event source and the writer thread.
    pub queue_capacity: usize,

    /// Bound of the out-of-band error channel.
    pub error_capacity: usize,

    /// Idle time after which buffered records are flushed, in milliseconds.
    ///
    /// Zero flushes only when the capture is closed.
    #[serde_as(as = "serde_with::DurationMilliSeconds<u64>")]
    pub flush_interval: Duration,
}

impl Default for Capture {
    fn default() -> Self {
        Self {
            accept: None,
            queue_capacity: 8192,
            error_capacity: 64,
            flush_interval: Duration::from_millis(1000),
        }
    }
}
