//! Extension points a bundling host exposes to plugins.
//!
//! The host owns the build. Plugins only register handlers during
//! [`Plugin::setup`]; the host decides when to call them and how to report
//! the errors they return.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use regex::Regex;

use crate::errors::Result;
use crate::loader::Loader;

/// Options the host reads once every plugin has been set up.
#[derive(Debug, Clone)]
pub struct BuildOptions {
    /// When false the host keeps outputs in memory and hands them to
    /// `on_end` handlers instead of writing them.
    pub write: bool,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self { write: true }
    }
}

#[derive(Debug, Clone)]
pub struct OnLoadOptions {
    pub filter: Regex,
    pub namespace: Option<String>,
}

#[derive(Debug, Clone)]
pub struct OnLoadArgs {
    pub path: PathBuf,
    pub namespace: String,
}

impl OnLoadArgs {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            namespace: "file".to_string(),
        }
    }
}

/// Replacement module contents returned from a load handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OnLoadResult {
    pub contents: String,
    pub loader: Loader,
}

#[derive(Debug, Clone)]
pub struct OutputFile {
    pub path: PathBuf,
    pub contents: Vec<u8>,
}

impl OutputFile {
    pub fn new(path: impl Into<PathBuf>, contents: impl Into<Vec<u8>>) -> Self {
        Self {
            path: path.into(),
            contents: contents.into(),
        }
    }

    pub fn text(&self) -> Option<&str> {
        std::str::from_utf8(&self.contents).ok()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub text: String,
}

impl Message {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

/// What the host hands to `on_end` handlers.
#[derive(Debug, Clone, Default)]
pub struct BuildResult {
    pub errors: Vec<Message>,
    pub warnings: Vec<Message>,
    /// Present only when the build ran with `write: false`.
    pub output_files: Option<Vec<OutputFile>>,
}

#[async_trait]
pub trait OnLoad: Send + Sync {
    /// `Ok(None)` lets the host load the file itself.
    async fn on_load(&self, args: &OnLoadArgs) -> Result<Option<OnLoadResult>>;
}

#[async_trait]
pub trait OnEnd: Send + Sync {
    async fn on_end(&self, result: &BuildResult) -> Result<()>;
}

/// Registration surface handed to [`Plugin::setup`].
pub trait PluginBuild {
    fn initial_options(&mut self) -> &mut BuildOptions;
    fn on_load(&mut self, options: OnLoadOptions, handler: Arc<dyn OnLoad>);
    fn on_end(&mut self, handler: Arc<dyn OnEnd>);
}

pub trait Plugin: Send + Sync {
    fn name(&self) -> &str;
    fn setup(&self, build: &mut dyn PluginBuild) -> Result<()>;
}
