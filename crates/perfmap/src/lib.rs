//! Perf map capture for JIT-generated code.
//!
//! A [`PerfMap`] subscribes to an [`EventSource`] of code-lifecycle events,
//! keeps the ones its [`EventFilter`] accepts, labels them with the
//! [`symbolize`] rules and writes one `<addr> <size> <kind>:<label>` line
//! per event, the format `perf` reads from `/tmp/perf-<pid>.map`.

mod error;
pub mod event;
pub mod filter;
pub mod shutdown;
pub mod source;
pub mod symbolize;
mod writer;

pub use error::{CaptureError, Error, SourceUnavailable};
pub use event::{CodeEvent, CodeKind, KindSet};
pub use filter::{Accept, EventFilter};
pub use shutdown::close_on_shutdown;
pub use source::{EventBus, EventCallback, EventSource, SubscriptionId};
pub use writer::{CaptureStats, PerfMap, State};
