use std::fmt;
use std::fs;
use std::path::Path;

use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::errors::Result;
use crate::filter::Filter;
use crate::patterns::PatternSet;

/// Options forwarded verbatim to the obfuscation engine.
pub type ObfuscatorOptions = Map<String, Value>;

/// Plugin configuration. Keys other than `obfuscateOutput`, `filter` and
/// `inject` are collected into `obfuscator_options`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PluginConfig {
    /// Obfuscate bundle outputs instead of individual modules.
    #[serde(default)]
    pub obfuscate_output: bool,
    #[serde(default)]
    pub filter: Filter,
    /// Code prepended to matching modules. Ignored when `obfuscate_output` is set.
    #[serde(default)]
    pub inject: InjectRules,
    #[serde(flatten)]
    pub obfuscator_options: ObfuscatorOptions,
}

impl PluginConfig {
    pub fn with_filter(mut self, filter: Filter) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_option(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.obfuscator_options.insert(key.into(), value.into());
        self
    }
}

#[derive(Debug, Clone)]
pub struct InjectRule {
    patterns: PatternSet,
    code: String,
}

impl InjectRule {
    pub fn new(pattern: impl Into<String>, fragments: InjectSource) -> Result<Self> {
        Ok(Self {
            patterns: PatternSet::new([pattern.into()])?,
            code: fragments.into_code(),
        })
    }

    pub fn pattern(&self) -> &str {
        self.patterns.patterns().first().map(String::as_str).unwrap_or_default()
    }

    pub fn code(&self) -> &str {
        &self.code
    }
}

/// A single fragment or a list of fragments joined with newlines.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum InjectSource {
    One(String),
    Many(Vec<String>),
}

impl InjectSource {
    fn into_code(self) -> String {
        match self {
            InjectSource::One(code) => code,
            InjectSource::Many(lines) => lines.join("\n"),
        }
    }
}

impl From<&str> for InjectSource {
    fn from(code: &str) -> Self {
        InjectSource::One(code.to_string())
    }
}

impl From<Vec<&str>> for InjectSource {
    fn from(lines: Vec<&str>) -> Self {
        InjectSource::Many(lines.into_iter().map(String::from).collect())
    }
}

/// Inject rules in configuration order.
#[derive(Debug, Clone, Default)]
pub struct InjectRules(Vec<InjectRule>);

impl InjectRules {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rule(mut self, pattern: impl Into<String>, code: impl Into<InjectSource>) -> Result<Self> {
        self.0.push(InjectRule::new(pattern, code.into())?);
        Ok(self)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &InjectRule> {
        self.0.iter()
    }

    /// Newline-joined code of every rule matching `path`.
    pub fn banner_for(&self, path: &str) -> String {
        self.0
            .iter()
            .filter(|rule| rule.patterns.is_match(path) && !rule.code.is_empty())
            .map(|rule| rule.code.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl<'de> Deserialize<'de> for InjectRules {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct RulesVisitor;

        impl<'de> Visitor<'de> for RulesVisitor {
            type Value = InjectRules;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of glob patterns to code fragments")
            }

            fn visit_unit<E: serde::de::Error>(self) -> std::result::Result<Self::Value, E> {
                Ok(InjectRules::default())
            }

            fn visit_map<A>(self, mut map: A) -> std::result::Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut rules = Vec::new();
                while let Some((pattern, source)) = map.next_entry::<String, InjectSource>()? {
                    rules.push(InjectRule::new(pattern, source).map_err(serde::de::Error::custom)?);
                }
                Ok(InjectRules(rules))
            }
        }

        deserializer.deserialize_any(RulesVisitor)
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("parse error: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("yaml error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Loads a plugin configuration from a JSON or YAML file.
pub fn load_config(path: impl AsRef<Path>) -> std::result::Result<PluginConfig, ConfigError> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)?;
    let is_yaml = matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml" | "yml")
    );
    let config = if is_yaml {
        serde_yaml::from_str(&content)?
    } else {
        serde_json::from_str(&content)?
    };
    Ok(config)
}
