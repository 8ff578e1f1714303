use std::path::PathBuf;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use super::{run_with_stdin, ObfuscationEngine, ToolError};
use crate::config::ObfuscatorOptions;

const OBFUSCATE_SCRIPT: &str = r#"
const JavaScriptObfuscator = require('javascript-obfuscator');
const options = JSON.parse(process.argv[1] || '{}');
let source = '';
process.stdin.setEncoding('utf8');
process.stdin.on('data', (chunk) => { source += chunk; });
process.stdin.on('end', () => {
  process.stdout.write(JavaScriptObfuscator.obfuscate(source, options).getObfuscatedCode());
});
"#;

/// Runs the `javascript-obfuscator` package through `node`.
///
/// `working_dir` must be a directory from which `require('javascript-obfuscator')`
/// resolves, typically the project root.
#[derive(Debug, Clone)]
pub struct NodeObfuscator {
    node: PathBuf,
    working_dir: PathBuf,
}

impl NodeObfuscator {
    pub fn new(working_dir: impl Into<PathBuf>) -> Self {
        Self {
            node: PathBuf::from("node"),
            working_dir: working_dir.into(),
        }
    }

    pub fn with_node(mut self, node: impl Into<PathBuf>) -> Self {
        self.node = node.into();
        self
    }
}

#[async_trait]
impl ObfuscationEngine for NodeObfuscator {
    async fn obfuscate(&self, source: &str, options: &ObfuscatorOptions) -> Result<String, ToolError> {
        let options = serde_json::to_string(options)?;
        debug!(node = %self.node.display(), bytes = source.len(), "running javascript-obfuscator");
        let mut command = Command::new(&self.node);
        command
            .current_dir(&self.working_dir)
            .arg("-e")
            .arg(OBFUSCATE_SCRIPT)
            .arg(options);
        run_with_stdin("javascript-obfuscator", command, source).await
    }
}
