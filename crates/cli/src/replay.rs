use crate::error::Error;
use perfmap::{CodeEvent, EventBus};
use std::{
    fs::File,
    io::{self, BufRead, BufReader},
    path::Path,
};
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplayReport {
    /// Lines read, including blank and comment lines.
    pub lines: u64,
    pub emitted: u64,
    /// Lines without a usable kind.
    pub skipped: u64,
}

/// Emit every event of a recorded log on `bus`, in file order.
pub fn replay(reader: impl BufRead, bus: &EventBus) -> Result<ReplayReport, Error> {
    let mut report = ReplayReport::default();

    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        report.lines += 1;

        if line.trim().is_empty() || line.starts_with('#') {
            continue;
        }

        match line.parse::<CodeEvent>() {
            Ok(event) => {
                bus.emit(&event);
                report.emitted += 1;
            }
            Err(err) => {
                warn!(line = index + 1, %err, "skipping event");
                report.skipped += 1;
            }
        }
    }

    debug!(?report, "replay finished");
    Ok(report)
}

/// [`replay`] a file, or stdin when `path` is `None`.
pub fn replay_input(path: Option<&Path>, bus: &EventBus) -> Result<ReplayReport, Error> {
    match path {
        None => replay(io::stdin().lock(), bus),
        Some(path) => {
            let file = File::open(path).map_err(|source| Error::OpenInput {
                path: path.to_owned(),
                source,
            })?;
            replay(BufReader::new(file), bus)
        }
    }
}
