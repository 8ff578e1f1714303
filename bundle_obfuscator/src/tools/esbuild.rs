use std::path::PathBuf;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use super::{run_with_stdin, ToolError, TransformOptions, Transpiler};

/// Transpiles through the `esbuild` binary's stdin transform mode.
#[derive(Debug, Clone)]
pub struct EsbuildTranspiler {
    binary: PathBuf,
}

impl EsbuildTranspiler {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    /// Uses the binary installed under `node_modules/.bin` of `project_dir`.
    pub fn from_project(project_dir: impl Into<PathBuf>) -> Self {
        Self::new(project_dir.into().join("node_modules").join(".bin").join("esbuild"))
    }

    fn args(options: &TransformOptions) -> Vec<String> {
        let mut args = vec![format!("--loader={}", options.loader), "--log-level=error".to_string()];
        if !options.banner.is_empty() {
            args.push(format!("--banner={}", options.banner));
        }
        if options.sourcemap {
            args.push("--sourcemap=inline".to_string());
        }
        args
    }
}

impl Default for EsbuildTranspiler {
    fn default() -> Self {
        Self::new("esbuild")
    }
}

#[async_trait]
impl Transpiler for EsbuildTranspiler {
    async fn transform(&self, source: &str, options: &TransformOptions) -> Result<String, ToolError> {
        let args = Self::args(options);
        debug!(binary = %self.binary.display(), ?args, "running esbuild transform");
        let mut command = Command::new(&self.binary);
        command.args(&args);
        run_with_stdin("esbuild", command, source).await
    }
}
