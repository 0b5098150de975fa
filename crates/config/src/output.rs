#![forbid(unsafe_code)]

use serde::{Deserialize, Serialize};
use std::{env, path::PathBuf, process};

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Output {
    /// Destination of the perf map.
    ///
    /// Unset means `<tmp-dir>/perf-<pid>.map`, which is where `perf` looks
    /// for the map of a process.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

impl Output {
    pub fn resolved_path(&self) -> PathBuf {
        self.path.clone().unwrap_or_else(default_path)
    }
}

/// The process-scoped location `perf report` probes for JIT symbols.
pub fn default_path() -> PathBuf {
    env::temp_dir().join(format!("perf-{}.map", process::id()))
}
