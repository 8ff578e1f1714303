//! Error types for the obfuscator plugin

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, PluginError>;

/// Boxed error returned by user supplied filter predicates.
pub type PredicateError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, Error)]
pub enum PluginError {
    #[error("Could not determine loader for {}", path.display())]
    UnknownLoader { path: PathBuf },

    #[error("invalid glob pattern {pattern:?}: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },

    #[error("config error: {0}")]
    Config(#[from] crate::config::ConfigError),

    #[error("filter failed for {path}: {source}")]
    Filter {
        path: String,
        #[source]
        source: PredicateError,
    },

    #[error("transpile failed for {}: {source}", path.display())]
    Transpile {
        path: PathBuf,
        #[source]
        source: crate::tools::ToolError,
    },

    #[error("obfuscation failed for {}: {source}", path.display())]
    Obfuscate {
        path: PathBuf,
        #[source]
        source: crate::tools::ToolError,
    },

    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("output file {} is not valid UTF-8", path.display())]
    OutputEncoding { path: PathBuf },
}

/// Coarse classification of [`PluginError`] used by hosts when reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Configuration,
    DelegatedTool,
    Io,
}

impl PluginError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PluginError::UnknownLoader { .. }
            | PluginError::InvalidPattern { .. }
            | PluginError::Config(_)
            | PluginError::Filter { .. } => ErrorKind::Configuration,
            PluginError::Transpile { .. } | PluginError::Obfuscate { .. } => {
                ErrorKind::DelegatedTool
            }
            PluginError::Read { .. }
            | PluginError::Write { .. }
            | PluginError::OutputEncoding { .. } => ErrorKind::Io,
        }
    }
}
