//! Decides which files get obfuscated.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Deserializer};
use tracing::debug;

use crate::errors::{PluginError, PredicateError, Result};
use crate::patterns::PatternSet;

type PredicateFn = dyn Fn(&str) -> std::result::Result<bool, PredicateError> + Send + Sync;

/// Which files a plugin instance should transform.
#[derive(Clone, Default)]
pub enum Filter {
    /// Transform every file.
    #[default]
    All,
    /// Transform files whose name matches at least one pattern.
    Patterns(PatternSet),
    /// Transform files for which the predicate returns `true`.
    Predicate(Arc<PredicateFn>),
}

impl Filter {
    pub fn patterns<I, S>(patterns: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Ok(Filter::Patterns(PatternSet::new(patterns)?))
    }

    pub fn predicate<F>(f: F) -> Self
    where
        F: Fn(&str) -> std::result::Result<bool, PredicateError> + Send + Sync + 'static,
    {
        Filter::Predicate(Arc::new(f))
    }

    pub fn matches(&self, path: &str) -> Result<bool> {
        should_transform(path, self)
    }
}

impl fmt::Debug for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Filter::All => f.write_str("All"),
            Filter::Patterns(set) => f.debug_tuple("Patterns").field(&set.patterns()).finish(),
            Filter::Predicate(_) => f.write_str("Predicate(<fn>)"),
        }
    }
}

/// Returns whether `path` should be obfuscated under `filter`.
///
/// A predicate's error is returned as [`PluginError::Filter`] rather than
/// treated as a rejection. An empty pattern list accepts everything.
pub fn should_transform(path: &str, filter: &Filter) -> Result<bool> {
    let decision = match filter {
        Filter::All => true,
        Filter::Patterns(set) if set.is_empty() => true,
        Filter::Patterns(set) => set.is_match(path),
        Filter::Predicate(predicate) => predicate(path).map_err(|source| PluginError::Filter {
            path: path.to_string(),
            source,
        })?,
    };
    debug!(path, decision, "filter decision");
    Ok(decision)
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawFilter {
    One(String),
    Many(Vec<String>),
}

impl<'de> Deserialize<'de> for Filter {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let patterns = match Option::<RawFilter>::deserialize(deserializer)? {
            None => return Ok(Filter::All),
            Some(RawFilter::One(p)) => vec![p],
            Some(RawFilter::Many(ps)) => ps,
        };
        Filter::patterns(patterns).map_err(serde::de::Error::custom)
    }
}
