//! Bundler plugin that obfuscates JavaScript and TypeScript, either module by
//! module as the host loads them or over the finished bundle outputs.

pub mod config;
pub mod errors;
pub mod filter;
pub mod host;
pub mod loader;
pub mod logger;
pub mod metrics;
pub mod patterns;
pub mod plugin;
pub mod tools;

pub use config::{load_config, InjectRules, ObfuscatorOptions, PluginConfig};
pub use errors::{ErrorKind, PluginError, Result};
pub use filter::{should_transform, Filter};
pub use host::{BuildOptions, BuildResult, OnLoadArgs, OnLoadResult, OutputFile, Plugin, PluginBuild};
pub use loader::Loader;
pub use plugin::ObfuscatorPlugin;
pub use tools::{EsbuildTranspiler, NodeObfuscator, ObfuscationEngine, Transpiler};
