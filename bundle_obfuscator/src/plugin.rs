//! The obfuscator plugin: module-level obfuscation at load time, or
//! whole-output obfuscation once the bundle is built.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::config::PluginConfig;
use crate::errors::{PluginError, Result};
use crate::filter::should_transform;
use crate::host::{
    BuildResult, OnEnd, OnLoad, OnLoadArgs, OnLoadOptions, OnLoadResult, OutputFile, Plugin,
    PluginBuild,
};
use crate::loader::{Loader, LOAD_FILTER};
use crate::metrics::Metrics;
use crate::tools::{ObfuscationEngine, TransformOptions, Transpiler};

pub const PLUGIN_NAME: &str = "obfuscator";

/// Shared state of both handlers.
struct Shared {
    config: Arc<PluginConfig>,
    transpiler: Arc<dyn Transpiler>,
    engine: Arc<dyn ObfuscationEngine>,
    metrics: Option<Metrics>,
}

impl Shared {
    fn accepts(&self, path: &Path) -> Result<bool> {
        let accepted = should_transform(&path.to_string_lossy(), &self.config.filter)?;
        if !accepted {
            if let Some(m) = &self.metrics {
                m.files_skipped.inc();
            }
        }
        Ok(accepted)
    }

    async fn obfuscate(&self, path: &Path, source: &str) -> Result<String> {
        let code = self
            .engine
            .obfuscate(source, &self.config.obfuscator_options)
            .await
            .map_err(|source| PluginError::Obfuscate {
                path: path.to_path_buf(),
                source,
            })?;
        if let Some(m) = &self.metrics {
            m.files_obfuscated.inc();
        }
        Ok(code)
    }
}

pub struct ObfuscatorPlugin {
    config: Arc<PluginConfig>,
    transpiler: Arc<dyn Transpiler>,
    engine: Arc<dyn ObfuscationEngine>,
    metrics: Option<Metrics>,
}

impl ObfuscatorPlugin {
    pub fn new(
        config: PluginConfig,
        transpiler: Arc<dyn Transpiler>,
        engine: Arc<dyn ObfuscationEngine>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            transpiler,
            engine,
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: Metrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn config(&self) -> &PluginConfig {
        &self.config
    }

    fn shared(&self) -> Arc<Shared> {
        Arc::new(Shared {
            config: self.config.clone(),
            transpiler: self.transpiler.clone(),
            engine: self.engine.clone(),
            metrics: self.metrics.clone(),
        })
    }
}

impl Plugin for ObfuscatorPlugin {
    fn name(&self) -> &str {
        PLUGIN_NAME
    }

    fn setup(&self, build: &mut dyn PluginBuild) -> Result<()> {
        let shared = self.shared();
        if self.config.obfuscate_output {
            build.initial_options().write = false;
            build.on_end(Arc::new(OutputObfuscator { shared }));
            debug!("registered output obfuscation");
            return Ok(());
        }

        build.on_load(
            OnLoadOptions {
                filter: LOAD_FILTER.clone(),
                namespace: None,
            },
            Arc::new(ModuleObfuscator { shared }),
        );
        debug!("registered module obfuscation");
        Ok(())
    }
}

/// Load handler that replaces each accepted module with obfuscated code.
pub struct ModuleObfuscator {
    shared: Arc<Shared>,
}

#[async_trait]
impl OnLoad for ModuleObfuscator {
    async fn on_load(&self, args: &OnLoadArgs) -> Result<Option<OnLoadResult>> {
        let path = args.path.as_path();
        if !self.shared.accepts(path)? {
            return Ok(None);
        }

        let loader = Loader::from_path(path)?;
        let banner = self.shared.config.inject.banner_for(&path.to_string_lossy());

        let source = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| PluginError::Read {
                path: path.to_path_buf(),
                source,
            })?;

        let options = TransformOptions {
            loader,
            banner,
            sourcemap: false,
        };
        let transpiled = self
            .shared
            .transpiler
            .transform(&source, &options)
            .await
            .map_err(|source| PluginError::Transpile {
                path: path.to_path_buf(),
                source,
            })?;

        let contents = self.shared.obfuscate(path, &transpiled).await?;
        info!(path = %path.display(), %loader, "obfuscated module");
        Ok(Some(OnLoadResult { contents, loader }))
    }
}

/// End handler that rewrites the bundle outputs on disk.
///
/// Outputs rejected by the filter are written unchanged, since the plugin
/// switched the host to in-memory output.
pub struct OutputObfuscator {
    shared: Arc<Shared>,
}

impl OutputObfuscator {
    async fn write(&self, output: &OutputFile, contents: &[u8]) -> Result<()> {
        let write_err = |source| PluginError::Write {
            path: output.path.clone(),
            source,
        };
        if let Some(parent) = output.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(write_err)?;
        }
        tokio::fs::write(&output.path, contents)
            .await
            .map_err(write_err)?;
        if let Some(m) = &self.shared.metrics {
            m.outputs_written.inc();
        }
        Ok(())
    }
}

#[async_trait]
impl OnEnd for OutputObfuscator {
    async fn on_end(&self, result: &BuildResult) -> Result<()> {
        if !result.errors.is_empty() {
            warn!(errors = result.errors.len(), "build failed, outputs left untouched");
            return Ok(());
        }
        let outputs = match result.output_files.as_deref() {
            Some(outputs) if !outputs.is_empty() => outputs,
            _ => return Ok(()),
        };

        for output in outputs {
            if !self.shared.accepts(&output.path)? {
                debug!(path = %output.path.display(), "output not obfuscated");
                self.write(output, &output.contents).await?;
                continue;
            }

            let text = output.text().ok_or_else(|| PluginError::OutputEncoding {
                path: output.path.clone(),
            })?;
            let code = self.shared.obfuscate(&output.path, text).await?;
            self.write(output, code.as_bytes()).await?;
            info!(path = %output.path.display(), "obfuscated output");
        }
        Ok(())
    }
}
