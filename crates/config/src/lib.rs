#![forbid(unsafe_code)]

mod accept;
mod capture;
mod error;
mod output;

pub use accept::AcceptList;
pub use capture::Capture;
pub use error::Error;
pub use output::{Output, default_path};

use figment::{
    Figment,
    providers::{Env, Format, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Prefix of environment variables that override file settings.
pub const ENV_PREFIX: &str = "PERFMAP_";

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub output: Output,
    pub capture: Capture,
}

impl Config {
    /// Configuration built from defaults and the environment only.
    pub fn new() -> Result<Self, Error> {
        Ok(Self::figment(Figment::new()).extract()?)
    }

    /// Load a TOML file, then apply `PERFMAP_*` environment overrides.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(Error::InvalidPath(path.to_owned()));
        }
        let figment = Figment::new().merge(Toml::file(path));
        Ok(Self::figment(figment).extract()?)
    }

    fn figment(base: Figment) -> Figment {
        base.merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Render the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String, Error> {
        Ok(toml_edit::ser::to_string_pretty(self)?)
    }
}
