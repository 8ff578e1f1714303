//! Delegated capabilities: transpiling and obfuscating source text.

mod esbuild;
mod node;

pub use esbuild::EsbuildTranspiler;
pub use node::NodeObfuscator;

use std::process::{ExitStatus, Stdio};

use async_trait::async_trait;
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use crate::config::ObfuscatorOptions;
use crate::loader::Loader;

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("failed to spawn {tool}: {source}")]
    Spawn {
        tool: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{tool} exited with {status}: {stderr}")]
    Failed {
        tool: String,
        status: ExitStatus,
        stderr: String,
    },
    #[error("{tool} produced non UTF-8 output")]
    InvalidOutput { tool: String },
    #[error("invalid options: {0}")]
    Options(#[from] serde_json::Error),
    #[error("{0}")]
    Other(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformOptions {
    pub loader: Loader,
    /// Prepended to the transpiled output.
    pub banner: String,
    pub sourcemap: bool,
}

#[async_trait]
pub trait Transpiler: Send + Sync {
    /// Lowers `source` to plain JavaScript.
    async fn transform(&self, source: &str, options: &TransformOptions) -> Result<String, ToolError>;
}

#[async_trait]
pub trait ObfuscationEngine: Send + Sync {
    async fn obfuscate(&self, source: &str, options: &ObfuscatorOptions) -> Result<String, ToolError>;
}

/// Runs `command` with `input` on stdin and returns its stdout.
pub(crate) async fn run_with_stdin(
    tool: &str,
    mut command: Command,
    input: &str,
) -> Result<String, ToolError> {
    let spawn_err = |source| ToolError::Spawn {
        tool: tool.to_string(),
        source,
    };
    let mut child = command
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(spawn_err)?;

    if let Some(mut stdin) = child.stdin.take() {
        stdin.write_all(input.as_bytes()).await.map_err(spawn_err)?;
        // stdin is dropped here so the tool sees EOF
    }

    let output = child.wait_with_output().await.map_err(spawn_err)?;
    if !output.status.success() {
        return Err(ToolError::Failed {
            tool: tool.to_string(),
            status: output.status,
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }
    String::from_utf8(output.stdout).map_err(|_| ToolError::InvalidOutput {
        tool: tool.to_string(),
    })
}
