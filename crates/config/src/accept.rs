#![forbid(unsafe_code)]

use serde::{Deserialize, Serialize};

/// Kind names a capture accepts, as written by the user.
///
/// Both `accept = "Function,Script"` and `accept = ["Function", "Script"]`
/// are valid. The names are not validated here; the capture pipeline owns
/// the closed set of kinds.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum AcceptList {
    Csv(String),
    List(Vec<String>),
}

impl AcceptList {
    /// Trimmed, non-empty names in the order they were written.
    ///
    /// An empty string or an empty array yields no names at all, which
    /// means "accept nothing" and not "accept everything".
    pub fn names(&self) -> Vec<&str> {
        let names: Box<dyn Iterator<Item = &str> + '_> = match self {
            Self::Csv(csv) => Box::new(csv.split(',')),
            Self::List(list) => Box::new(list.iter().map(String::as_str)),
        };
        names.map(str::trim).filter(|name| !name.is_empty()).collect()
    }
}

impl From<&str> for AcceptList {
    fn from(csv: &str) -> Self {
        Self::Csv(csv.to_owned())
    }
}

impl From<Vec<String>> for AcceptList {
    fn from(list: Vec<String>) -> Self {
        Self::List(list)
    }
}
