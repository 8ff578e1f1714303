use std::fmt;
use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::errors::{PluginError, Result};

/// Paths the load-time interceptor is registered for.
pub static LOAD_FILTER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\.([cm]?[jt]sx?)$").expect("static regex"));

static LOADER_SUFFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)([jt]sx?)$").expect("static regex"));

/// Source dialect of a module, used to pick the transpile path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Loader {
    Js,
    Jsx,
    Ts,
    Tsx,
}

impl Loader {
    /// Derives the loader from the final extension token, e.g. `.mts` is `ts`.
    pub fn from_path(path: &Path) -> Result<Self> {
        let file = path.to_string_lossy();
        let token = file.rsplit('.').next().unwrap_or_default();
        let suffix = LOADER_SUFFIX
            .captures(token)
            .and_then(|caps| caps.get(1))
            .ok_or_else(|| PluginError::UnknownLoader {
                path: path.to_path_buf(),
            })?;
        Ok(match suffix.as_str().to_ascii_lowercase().as_str() {
            "js" => Loader::Js,
            "jsx" => Loader::Jsx,
            "ts" => Loader::Ts,
            _ => Loader::Tsx,
        })
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Loader::Js => "js",
            Loader::Jsx => "jsx",
            Loader::Ts => "ts",
            Loader::Tsx => "tsx",
        }
    }
}

impl fmt::Display for Loader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
