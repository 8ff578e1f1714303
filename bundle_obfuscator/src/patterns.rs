//! Glob pattern lists matched against file paths.
//!
//! Patterns without a `/` are tested against the final path segment only, so
//! `*.min.js` matches `dist/vendor/app.min.js`. Patterns that contain a `/`
//! are tested against the whole path with separators normalized to `/`.
//! Brace alternatives (`*.{ts,tsx}`) are expanded before compiling, up to
//! [`MAX_BRACE_EXPANSIONS`] patterns per entry. A `**` inside a segment such
//! as `**.js` means the same as `*`. Wildcards do not match a leading dot.

use glob::{MatchOptions, Pattern, PatternError};

use crate::errors::{PluginError, Result};

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: true,
};

/// Upper bound on the patterns one brace expression may expand to.
pub const MAX_BRACE_EXPANSIONS: usize = 256;

#[derive(Debug, Clone)]
struct CompiledGlob {
    pattern: Pattern,
    full_path: bool,
}

/// A compiled list of glob patterns.
#[derive(Debug, Clone, Default)]
pub struct PatternSet {
    sources: Vec<String>,
    compiled: Vec<CompiledGlob>,
}

impl PatternSet {
    pub fn new<I, S>(patterns: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut sources = Vec::new();
        let mut compiled = Vec::new();
        for source in patterns {
            let source = source.into();
            let invalid = |e| PluginError::InvalidPattern {
                pattern: source.clone(),
                source: e,
            };
            let expansions = expand_braces(&source).ok_or_else(|| {
                invalid(PatternError {
                    pos: 0,
                    msg: "too many brace alternatives",
                })
            })?;
            for expanded in expansions {
                let expanded = collapse_partial_globstars(&expanded);
                let pattern = Pattern::new(&expanded).map_err(invalid)?;
                compiled.push(CompiledGlob {
                    full_path: expanded.contains('/'),
                    pattern,
                });
            }
            sources.push(source);
        }
        Ok(Self { sources, compiled })
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// The patterns as they were written in the configuration.
    pub fn patterns(&self) -> &[String] {
        &self.sources
    }

    pub fn is_match(&self, path: &str) -> bool {
        let normalized = path.replace('\\', "/");
        let name = base_name(&normalized);
        self.compiled.iter().any(|glob| {
            let subject = if glob.full_path { normalized.as_str() } else { name };
            glob.pattern.matches_with(subject, MATCH_OPTIONS)
        })
    }
}

/// Final segment of a `/`-separated path.
pub fn base_name(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    trimmed.rsplit('/').next().unwrap_or(trimmed)
}

/// Expands `{a,b}` groups into separate patterns. Unbalanced braces are left
/// as literal text. Returns `None` once more than [`MAX_BRACE_EXPANSIONS`]
/// patterns would be produced.
pub fn expand_braces(pattern: &str) -> Option<Vec<String>> {
    let mut out = Vec::new();
    expand_into("", pattern, &mut out).then_some(out)
}

fn expand_into(head: &str, pattern: &str, out: &mut Vec<String>) -> bool {
    let Some((open, close)) = find_brace_group(pattern) else {
        if out.len() >= MAX_BRACE_EXPANSIONS {
            return false;
        }
        out.push(format!("{head}{pattern}"));
        return true;
    };
    let prefix = &pattern[..open];
    let body = &pattern[open + 1..close];
    let suffix = &pattern[close + 1..];

    let alternatives = split_alternatives(body);
    if alternatives.len() < 2 {
        // `{x}` is not an alternation; keep the braces and expand what follows
        return expand_into(&format!("{head}{prefix}{{{body}}}"), suffix, out);
    }

    let head = format!("{head}{prefix}");
    alternatives
        .into_iter()
        .all(|alt| expand_into(&head, &format!("{alt}{suffix}"), out))
}

/// Rewrites a `**` that shares its segment with other text (`**.js`) to `*`.
fn collapse_partial_globstars(pattern: &str) -> String {
    pattern
        .split('/')
        .map(|segment| {
            if segment == "**" || !segment.contains("**") {
                return segment.to_string();
            }
            let mut collapsed = String::with_capacity(segment.len());
            for c in segment.chars() {
                if !(c == '*' && collapsed.ends_with('*')) {
                    collapsed.push(c);
                }
            }
            collapsed
        })
        .collect::<Vec<_>>()
        .join("/")
}

fn find_brace_group(pattern: &str) -> Option<(usize, usize)> {
    let mut depth = 0usize;
    let mut open = None;
    let mut in_class = false;
    for (i, c) in pattern.char_indices() {
        match c {
            '[' if !in_class => in_class = true,
            ']' if in_class => in_class = false,
            '{' if !in_class => {
                if depth == 0 {
                    open = Some(i);
                }
                depth += 1;
            }
            '}' if !in_class && depth > 0 => {
                depth -= 1;
                if depth == 0 {
                    return open.map(|o| (o, i));
                }
            }
            _ => {}
        }
    }
    None
}

fn split_alternatives(body: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, c) in body.char_indices() {
        match c {
            '{' => depth += 1,
            '}' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                parts.push(&body[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&body[start..]);
    parts
}
