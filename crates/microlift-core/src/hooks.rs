//! Build-tool hook contract.
//!
//! A Vite/Rollup-style plugin interface: the subset of hooks the micro-app
//! adapter is written against, plus a container that dispatches them in
//! enforce order. All hook methods default to pass-through so a plugin only
//! implements what it cares about.
//!
//! ## Example
//!
//! ```
//! use microlift_core::hooks::{HookResult, Plugin, PluginContext, TransformResult};
//!
//! struct TxtPlugin;
//!
//! impl Plugin for TxtPlugin {
//!     fn name(&self) -> &str { "txt" }
//!
//!     fn transform(&self, code: &str, id: &str, _ctx: &PluginContext) -> HookResult<Option<TransformResult>> {
//!         if id.ends_with(".txt") {
//!             return Ok(Some(TransformResult::code(format!("export default {code:?};"))));
//!         }
//!         Ok(None)
//!     }
//! }
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use serde::Serialize;

/// Result type for plugin hooks.
pub type HookResult<T> = Result<T, PluginError>;

/// Error from a plugin hook. Aborts the build/dev step it was raised in.
#[derive(Debug)]
pub struct PluginError {
    /// Plugin name that caused the error.
    pub plugin: String,
    /// Hook that failed.
    pub hook: &'static str,
    /// Error message.
    pub message: String,
}

impl std::fmt::Display for PluginError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}: {}", self.plugin, self.hook, self.message)
    }
}

impl std::error::Error for PluginError {}

/// Context passed to plugin hooks.
#[derive(Debug, Default, Clone)]
pub struct PluginContext {
    /// Working directory.
    pub cwd: PathBuf,
    /// Whether this is a watch/dev build.
    pub watch: bool,
}

impl PluginContext {
    #[must_use]
    pub fn new(cwd: PathBuf) -> Self {
        Self { cwd, watch: false }
    }
}

/// Which command the build tool is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildCommand {
    /// Dev server.
    #[default]
    Serve,
    /// Production build.
    Build,
}

/// Dev server settings as the tool reports them.
///
/// `host` is `None` when the tool never bound an explicit host.
#[derive(Debug, Clone, Serialize)]
pub struct ServerOptions {
    pub host: Option<String>,
    pub port: u16,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            host: None,
            port: 5173,
        }
    }
}

/// The tool's fully resolved configuration, handed to `config_resolved`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ResolvedConfig {
    /// The command being run.
    pub command: BuildCommand,
    /// Production flag as the tool resolved it.
    pub is_production: bool,
    /// Base public path (e.g. `/`).
    pub base: String,
    /// Dev server settings.
    pub server: ServerOptions,
}

impl ResolvedConfig {
    #[must_use]
    pub fn serve(base: impl Into<String>) -> Self {
        Self {
            command: BuildCommand::Serve,
            is_production: false,
            base: base.into(),
            server: ServerOptions::default(),
        }
    }

    #[must_use]
    pub fn build(base: impl Into<String>) -> Self {
        Self {
            command: BuildCommand::Build,
            is_production: true,
            base: base.into(),
            server: ServerOptions::default(),
        }
    }
}

/// Result of the resolve hook.
#[derive(Debug, Clone)]
pub struct ResolveIdResult {
    /// Resolved module id.
    pub id: String,
    /// Whether this module is external (don't bundle).
    pub external: bool,
}

impl ResolveIdResult {
    pub fn resolved(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            external: false,
        }
    }
}

/// Result of the load hook.
#[derive(Debug, Clone)]
pub struct LoadResult {
    /// Module source code.
    pub code: String,
    /// Optional source map.
    pub map: Option<String>,
}

impl LoadResult {
    pub fn code(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            map: None,
        }
    }
}

/// Result of the transform hook.
#[derive(Debug, Clone)]
pub struct TransformResult {
    /// Transformed code.
    pub code: String,
    /// Optional source map.
    pub map: Option<String>,
}

impl TransformResult {
    pub fn code(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            map: None,
        }
    }
}

/// Plugin enforcement ordering, mirroring Vite's `enforce` option.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum PluginEnforce {
    /// Runs before normal plugins.
    Pre,
    /// Default ordering.
    #[default]
    Normal,
    /// Runs after normal plugins.
    Post,
}

/// A served-HTML body rewriter registered by `configure_server`.
///
/// Models the wrapped response `end`: the dev server runs the body through
/// every registered rewrite before sending it. Returning `None` leaves the
/// body untouched.
pub struct BodyRewrite {
    /// Name for debugging, usually the registering plugin's name.
    pub name: String,
    /// The rewrite function.
    pub rewrite: Arc<dyn Fn(&str) -> Option<String> + Send + Sync>,
}

/// Context for the dev server, passed to the `configure_server` hook.
pub struct ServerContext {
    /// The resolved configuration the server was started with.
    pub config: ResolvedConfig,
    /// Registered body rewrites, applied in registration order.
    pub body_rewrites: Vec<BodyRewrite>,
}

impl ServerContext {
    #[must_use]
    pub fn new(config: ResolvedConfig) -> Self {
        Self {
            config,
            body_rewrites: Vec::new(),
        }
    }

    /// Register a body rewrite.
    pub fn add_body_rewrite(
        &mut self,
        name: impl Into<String>,
        rewrite: impl Fn(&str) -> Option<String> + Send + Sync + 'static,
    ) {
        self.body_rewrites.push(BodyRewrite {
            name: name.into(),
            rewrite: Arc::new(rewrite),
        });
    }

    /// Run a served HTML body through every registered rewrite, in order.
    #[must_use]
    pub fn rewrite_html(&self, body: &str) -> String {
        let mut current = body.to_string();
        for rewrite in &self.body_rewrites {
            if let Some(next) = (rewrite.rewrite)(&current) {
                current = next;
            }
        }
        current
    }
}

/// The plugin trait.
///
/// All methods have pass-through defaults. Returning `Ok(None)` from
/// `resolve_id` / `load` / `transform` / `transform_index_html` means
/// "not handled / unchanged" and lets the next plugin run.
pub trait Plugin: Send + Sync {
    /// Plugin name for debugging and error messages.
    fn name(&self) -> &str;

    /// Plugin ordering: `Pre`, `Normal` (default), or `Post`.
    fn enforce(&self) -> PluginEnforce {
        PluginEnforce::Normal
    }

    /// Called once after the tool resolves its configuration (read-only).
    fn config_resolved(&self, _config: &ResolvedConfig) -> HookResult<()> {
        Ok(())
    }

    /// Called once at dev server startup. Plugins can register body rewrites.
    fn configure_server(&self, _server: &mut ServerContext) -> HookResult<()> {
        Ok(())
    }

    /// Resolve a module specifier to an id.
    fn resolve_id(
        &self,
        _specifier: &str,
        _importer: Option<&str>,
        _ctx: &PluginContext,
    ) -> HookResult<Option<ResolveIdResult>> {
        Ok(None)
    }

    /// Load a module by id.
    fn load(&self, _id: &str, _ctx: &PluginContext) -> HookResult<Option<LoadResult>> {
        Ok(None)
    }

    /// Transform module source code.
    fn transform(
        &self,
        _code: &str,
        _id: &str,
        _ctx: &PluginContext,
    ) -> HookResult<Option<TransformResult>> {
        Ok(None)
    }

    /// Transform the index HTML page.
    fn transform_index_html(&self, _html: &str) -> HookResult<Option<String>> {
        Ok(None)
    }
}

/// A container for managing multiple plugins.
///
/// Plugins are kept sorted by their `enforce()` ordering: `Pre` → `Normal` →
/// `Post`. Within the same enforcement level, insertion order is preserved.
pub struct PluginContainer {
    plugins: Vec<Box<dyn Plugin>>,
    ctx: PluginContext,
}

impl PluginContainer {
    #[must_use]
    pub fn new(cwd: PathBuf) -> Self {
        Self {
            plugins: Vec::new(),
            ctx: PluginContext::new(cwd),
        }
    }

    /// Add a plugin, re-sorting by enforce order (stable).
    pub fn add(&mut self, plugin: Box<dyn Plugin>) {
        self.plugins.push(plugin);
        self.plugins.sort_by_key(|p| p.enforce());
    }

    /// Set watch mode.
    pub fn set_watch(&mut self, watch: bool) {
        self.ctx.watch = watch;
    }

    /// Get the context (read-only).
    #[must_use]
    pub fn context(&self) -> &PluginContext {
        &self.ctx
    }

    #[must_use]
    pub fn has_plugins(&self) -> bool {
        !self.plugins.is_empty()
    }

    /// Call `config_resolved` on all plugins.
    pub fn call_config_resolved(&self, config: &ResolvedConfig) -> HookResult<()> {
        for plugin in &self.plugins {
            plugin.config_resolved(config)?;
        }
        Ok(())
    }

    /// Call `configure_server` on all plugins.
    pub fn call_configure_server(&self, server: &mut ServerContext) -> HookResult<()> {
        for plugin in &self.plugins {
            plugin.configure_server(server)?;
        }
        Ok(())
    }

    /// Try to resolve a module id through plugins.
    /// Returns `None` if no plugin handled the resolution.
    pub fn resolve_id(
        &self,
        specifier: &str,
        importer: Option<&str>,
    ) -> HookResult<Option<ResolveIdResult>> {
        for plugin in &self.plugins {
            if let Some(result) = plugin.resolve_id(specifier, importer, &self.ctx)? {
                return Ok(Some(result));
            }
        }
        Ok(None)
    }

    /// Try to load a module through plugins.
    /// Returns `None` if no plugin handled the load.
    pub fn load(&self, id: &str) -> HookResult<Option<LoadResult>> {
        for plugin in &self.plugins {
            if let Some(result) = plugin.load(id, &self.ctx)? {
                return Ok(Some(result));
            }
        }
        Ok(None)
    }

    /// Transform code through all plugins.
    /// Each plugin's output is passed to the next plugin.
    pub fn transform(&self, code: &str, id: &str) -> HookResult<String> {
        let mut current = code.to_string();
        for plugin in &self.plugins {
            if let Some(result) = plugin.transform(&current, id, &self.ctx)? {
                current = result.code;
            }
        }
        Ok(current)
    }

    /// Call `transform_index_html` on all plugins (chained).
    pub fn call_transform_index_html(&self, html: &str) -> HookResult<String> {
        let mut current = html.to_string();
        for plugin in &self.plugins {
            if let Some(transformed) = plugin.transform_index_html(&current)? {
                current = transformed;
            }
        }
        Ok(current)
    }
}

impl Default for PluginContainer {
    fn default() -> Self {
        Self::new(std::env::current_dir().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Tag(&'static str, PluginEnforce);

    impl Plugin for Tag {
        fn name(&self) -> &str {
            self.0
        }

        fn enforce(&self) -> PluginEnforce {
            self.1
        }

        fn transform(
            &self,
            code: &str,
            _id: &str,
            _ctx: &PluginContext,
        ) -> HookResult<Option<TransformResult>> {
            Ok(Some(TransformResult::code(format!("{code}{}", self.0))))
        }
    }

    #[test]
    fn test_enforce_order() {
        let mut container = PluginContainer::default();
        container.add(Box::new(Tag("b", PluginEnforce::Normal)));
        container.add(Box::new(Tag("c", PluginEnforce::Post)));
        container.add(Box::new(Tag("a", PluginEnforce::Pre)));

        let out = container.transform("", "x.js").unwrap();
        assert_eq!(out, "abc");
    }

    #[test]
    fn test_transform_chains_in_insertion_order() {
        let mut container = PluginContainer::default();
        container.add(Box::new(Tag("1", PluginEnforce::Normal)));
        container.add(Box::new(Tag("2", PluginEnforce::Normal)));

        let out = container.transform("x", "x.js").unwrap();
        assert_eq!(out, "x12");
    }

    #[test]
    fn test_body_rewrites_chain_and_pass_through() {
        let mut server = ServerContext::new(ResolvedConfig::serve("/"));
        server.add_body_rewrite("noop", |_| None);
        server.add_body_rewrite("upper", |body| Some(body.to_uppercase()));

        assert_eq!(server.rewrite_html("abc"), "ABC");
    }
}
