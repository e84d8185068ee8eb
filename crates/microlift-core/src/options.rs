//! Plugin construction options.
//!
//! A [`MicroAppPlugin`](crate::plugin::MicroAppPlugin) takes the sub-application
//! name positionally plus one of these option records. Everything is optional:
//! dev-mode rewriting and asset-path rewriting are both off by default.

use std::fmt;
use std::sync::Arc;

use regex_lite::Regex;

use crate::error::Error;

/// Replaces asset-path references in a whole module source.
///
/// Receives the full source text and returns the rewritten text, matching the
/// upstream contract where a user replacer maps the entire module rather than
/// individual paths.
pub type AssetsPathReplacer = Arc<dyn Fn(&str) -> String + Send + Sync>;

/// Matches a module id against the configured entry pattern.
#[derive(Clone)]
pub enum MatchPattern {
    /// Substring containment. The empty string matches nothing.
    Substring(String),
    /// Full regex match via `is_match`.
    Pattern(Regex),
}

impl MatchPattern {
    /// Compile a regex pattern. Invalid syntax surfaces as
    /// [`Error::InvalidPattern`] at construction time, not at transform time.
    pub fn regex(pattern: &str) -> Result<Self, Error> {
        let re = Regex::new(pattern)
            .map_err(|e| Error::invalid_pattern(pattern, e.to_string()))?;
        Ok(Self::Pattern(re))
    }

    #[must_use]
    pub fn substring(needle: impl Into<String>) -> Self {
        Self::Substring(needle.into())
    }

    /// Whether `id` matches this pattern.
    #[must_use]
    pub fn matches(&self, id: &str) -> bool {
        match self {
            Self::Substring(needle) => !needle.is_empty() && id.contains(needle.as_str()),
            Self::Pattern(re) => re.is_match(id),
        }
    }
}

impl fmt::Debug for MatchPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Substring(s) => f.debug_tuple("Substring").field(s).finish(),
            Self::Pattern(re) => f.debug_tuple("Pattern").field(&re.as_str()).finish(),
        }
    }
}

/// Options accepted at plugin construction.
#[derive(Clone, Default)]
pub struct MicroAppOptions {
    /// Prefix dynamic imports with the qiankun-injected public path during dev.
    pub use_dev_mode: bool,
    /// Which module ids get the entry-module lifecycle rewrite.
    pub entry_matcher: Option<MatchPattern>,
    /// Verbatim code appended after the lifecycle registration call.
    pub appended_code: Option<String>,
    /// Module-level variables hoisted onto the sandbox window, in order.
    pub sandbox_variables: Vec<String>,
    /// Rewrite `/src/...` asset references in non-entry modules.
    pub rewrite_assets_path: bool,
    /// User replacement for the default asset-path rewrite.
    pub assets_path_replacer: Option<AssetsPathReplacer>,
}

impl MicroAppOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dev_mode(mut self, on: bool) -> Self {
        self.use_dev_mode = on;
        self
    }

    pub fn entry_matcher(mut self, matcher: MatchPattern) -> Self {
        self.entry_matcher = Some(matcher);
        self
    }

    pub fn appended_code(mut self, code: impl Into<String>) -> Self {
        self.appended_code = Some(code.into());
        self
    }

    pub fn sandbox_variable(mut self, name: impl Into<String>) -> Self {
        self.sandbox_variables.push(name.into());
        self
    }

    pub fn rewrite_assets_path(mut self, on: bool) -> Self {
        self.rewrite_assets_path = on;
        self
    }

    pub fn assets_path_replacer(
        mut self,
        replacer: impl Fn(&str) -> String + Send + Sync + 'static,
    ) -> Self {
        self.assets_path_replacer = Some(Arc::new(replacer));
        self
    }
}

impl fmt::Debug for MicroAppOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MicroAppOptions")
            .field("use_dev_mode", &self.use_dev_mode)
            .field("entry_matcher", &self.entry_matcher)
            .field("appended_code", &self.appended_code)
            .field("sandbox_variables", &self.sandbox_variables)
            .field("rewrite_assets_path", &self.rewrite_assets_path)
            .field(
                "assets_path_replacer",
                &self.assets_path_replacer.as_ref().map(|_| "<fn>"),
            )
            .finish()
    }
}
