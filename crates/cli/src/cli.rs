use clap::Parser;
use clap_verbosity_flag::{Verbosity, WarnLevel};
use config::{AcceptList, Config};
use std::path::{Path, PathBuf};

/// perfmap: write JIT code events as a perf map
///
/// Replays a recorded log of code-lifecycle events and writes the ones
/// accepted into a map that `perf report` uses to symbolize samples of
/// generated code.
///
/// The log holds one event per line, tab-separated: kind, address,
/// previous address, size (hex), comment, function name, script name, line,
/// column. Blank lines and lines starting with `#` are ignored.
#[derive(Debug, Parser, Clone)]
#[command(about, long_about, version)]
pub struct Cli {
    /// Path to configuration file.
    #[arg(short, long, value_parser = validate_file)]
    pub config: Option<PathBuf>,

    /// Where to write the map.
    ///
    /// Defaults to `<tmp-dir>/perf-<pid>.map`.
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Comma-separated kinds to record, e.g. `Function,Script`.
    ///
    /// An empty string records nothing. Without this flag or a configured
    /// accept list, every event is recorded.
    #[arg(short, long)]
    pub accept: Option<String>,

    /// Print the effective configuration as TOML and exit.
    #[arg(long)]
    pub print_config: bool,

    /// Event log to replay. `-` or nothing reads stdin.
    pub input: Option<PathBuf>,

    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,
}

impl Cli {
    /// Apply command line overrides on top of `config`.
    pub fn apply(&self, config: &mut Config) {
        if let Some(output) = &self.output {
            config.output.path = Some(output.clone());
        }
        if let Some(accept) = &self.accept {
            config.capture.accept = Some(AcceptList::from(accept.as_str()));
        }
    }

    /// The event log path, `None` meaning stdin.
    pub fn input_path(&self) -> Option<&Path> {
        self.input
            .as_deref()
            .filter(|path| *path != Path::new("-"))
    }
}

/// Check if the file exists.
#[inline(always)]
fn validate_file(file: &str) -> Result<PathBuf, String> {
    let path = Path::new(file);
    if path.exists() {
        Ok(path.to_owned())
    } else {
        Err(format!("File not found: {:?}", path))
    }
}
