#![allow(dead_code)]

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bundle_obfuscator::config::ObfuscatorOptions;
use bundle_obfuscator::host::{
    BuildOptions, BuildResult, OnEnd, OnLoad, OnLoadArgs, OnLoadOptions, OnLoadResult,
    PluginBuild,
};
use bundle_obfuscator::tools::{ObfuscationEngine, ToolError, TransformOptions, Transpiler};

pub const OBFUSCATED_MARK: &str = "/* obfuscated */";

/// Minimal host that records what a plugin registers and dispatches to it.
#[derive(Default)]
pub struct TestBuild {
    pub options: BuildOptions,
    pub loaders: Vec<(OnLoadOptions, Arc<dyn OnLoad>)>,
    pub end_handlers: Vec<Arc<dyn OnEnd>>,
}

impl PluginBuild for TestBuild {
    fn initial_options(&mut self) -> &mut BuildOptions {
        &mut self.options
    }

    fn on_load(&mut self, options: OnLoadOptions, handler: Arc<dyn OnLoad>) {
        self.loaders.push((options, handler));
    }

    fn on_end(&mut self, handler: Arc<dyn OnEnd>) {
        self.end_handlers.push(handler);
    }
}

impl TestBuild {
    /// Runs the first load handler whose filter matches, like a bundler would.
    pub async fn load(&self, path: &Path) -> bundle_obfuscator::Result<Option<OnLoadResult>> {
        let name = path.to_string_lossy();
        for (options, handler) in &self.loaders {
            if options.filter.is_match(&name) {
                return handler.on_load(&OnLoadArgs::new(path)).await;
            }
        }
        Ok(None)
    }

    pub async fn end(&self, result: &BuildResult) -> bundle_obfuscator::Result<()> {
        for handler in &self.end_handlers {
            handler.on_end(result).await?;
        }
        Ok(())
    }
}

/// Prepends the banner, like esbuild's transform does.
#[derive(Default)]
pub struct FakeTranspiler {
    pub calls: Mutex<Vec<TransformOptions>>,
    pub fail: bool,
}

impl FakeTranspiler {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }
}

#[async_trait]
impl Transpiler for FakeTranspiler {
    async fn transform(&self, source: &str, options: &TransformOptions) -> Result<String, ToolError> {
        self.calls.lock().unwrap().push(options.clone());
        if self.fail {
            return Err(ToolError::Other("Expected \";\" but found \"}\"".into()));
        }
        let body = source.replace(": number", "");
        if options.banner.is_empty() {
            Ok(body)
        } else {
            Ok(format!("{}\n{}", options.banner, body))
        }
    }
}

/// Records every call and marks its output.
#[derive(Default)]
pub struct FakeEngine {
    pub calls: Mutex<Vec<(String, ObfuscatorOptions)>>,
    /// Fails when the source contains this text.
    pub fail_on: Option<String>,
}

impl FakeEngine {
    pub fn failing_on(marker: &str) -> Self {
        Self {
            fail_on: Some(marker.to_string()),
            ..Self::default()
        }
    }

    pub fn inputs(&self) -> Vec<String> {
        self.calls.lock().unwrap().iter().map(|(s, _)| s.clone()).collect()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl ObfuscationEngine for FakeEngine {
    async fn obfuscate(&self, source: &str, options: &ObfuscatorOptions) -> Result<String, ToolError> {
        self.calls
            .lock()
            .unwrap()
            .push((source.to_string(), options.clone()));
        if let Some(marker) = &self.fail_on {
            if source.contains(marker.as_str()) {
                return Err(ToolError::Other(format!("cannot obfuscate {marker}")));
            }
        }
        Ok(format!("{OBFUSCATED_MARK}{source}"))
    }
}
