//! The micro-app adapter plugin.
//!
//! Wires the HTML and module transforms into the build-tool hook contract:
//! captures the resolved configuration once, registers the dev-server
//! passthrough rewrite, serves the runtime helper as a virtual module, and
//! dispatches the two transform hooks.

use std::sync::{Arc, RwLock};

use crate::error::Error;
use crate::hooks::{
    BuildCommand, HookResult, LoadResult, Plugin, PluginContext, PluginError, ResolveIdResult,
    ResolvedConfig, ServerContext, TransformResult,
};
use crate::options::MicroAppOptions;
use crate::{html, module, shims};

/// Hook name the plugin registers under.
pub const PLUGIN_NAME: &str = "qiankun-html-transform";

/// Build context captured once at `config_resolved`, read-only afterwards.
///
/// Scoped to one build or dev-server session. `server_host` falls back to
/// `127.0.0.1` when the tool reports none.
#[derive(Debug, Clone, serde::Serialize)]
pub struct CapturedConfig {
    pub is_production: bool,
    pub base: String,
    pub server_host: String,
    pub server_port: u16,
}

impl Default for CapturedConfig {
    fn default() -> Self {
        Self {
            is_production: false,
            base: "/".to_string(),
            server_host: "127.0.0.1".to_string(),
            server_port: 5173,
        }
    }
}

impl CapturedConfig {
    /// Capture the fields this plugin needs from the tool's resolved config.
    #[must_use]
    pub fn capture(config: &ResolvedConfig) -> Self {
        Self {
            is_production: config.command == BuildCommand::Build || config.is_production,
            base: config.base.clone(),
            server_host: config
                .server
                .host
                .clone()
                .unwrap_or_else(|| "127.0.0.1".to_string()),
            server_port: config.server.port,
        }
    }
}

/// Adapts an independently-built sub-application to the qiankun lifecycle
/// contract.
///
/// Construction takes the sub-application name positionally plus an options
/// record; both are immutable afterwards. The only mutable state is the
/// build context captured at `config_resolved`.
pub struct MicroAppPlugin {
    sub_app_name: String,
    options: MicroAppOptions,
    config: Arc<RwLock<Option<CapturedConfig>>>,
}

impl MicroAppPlugin {
    #[must_use]
    pub fn new(sub_app_name: impl Into<String>, options: MicroAppOptions) -> Self {
        Self {
            sub_app_name: sub_app_name.into(),
            options,
            config: Arc::new(RwLock::new(None)),
        }
    }

    /// The configured sub-application name.
    #[must_use]
    pub fn sub_app_name(&self) -> &str {
        &self.sub_app_name
    }

    /// Captured config, or session defaults when `config_resolved` has not
    /// run yet.
    #[must_use]
    pub fn captured_config(&self) -> CapturedConfig {
        self.config
            .read()
            .unwrap()
            .clone()
            .unwrap_or_default()
    }

    fn hook_err(&self, hook: &'static str, err: &Error) -> PluginError {
        PluginError {
            plugin: PLUGIN_NAME.to_string(),
            hook,
            message: err.to_string(),
        }
    }
}

impl Plugin for MicroAppPlugin {
    fn name(&self) -> &str {
        PLUGIN_NAME
    }

    fn config_resolved(&self, config: &ResolvedConfig) -> HookResult<()> {
        *self.config.write().unwrap() = Some(CapturedConfig::capture(config));
        Ok(())
    }

    fn configure_server(&self, server: &mut ServerContext) -> HookResult<()> {
        let config = Arc::clone(&self.config);
        let use_dev_mode = self.options.use_dev_mode;
        server.add_body_rewrite(PLUGIN_NAME, move |body| {
            let captured = config.read().unwrap().clone().unwrap_or_default();
            if captured.is_production || !use_dev_mode {
                return None;
            }
            html::rewrite_dev_client_script(body, &captured.base)
        });
        Ok(())
    }

    fn resolve_id(
        &self,
        specifier: &str,
        _importer: Option<&str>,
        _ctx: &PluginContext,
    ) -> HookResult<Option<ResolveIdResult>> {
        if specifier == shims::HELPER_SPECIFIER || specifier == shims::HELPER_URL {
            return Ok(Some(ResolveIdResult::resolved(shims::HELPER_VIRTUAL_ID)));
        }
        Ok(None)
    }

    fn load(&self, id: &str, _ctx: &PluginContext) -> HookResult<Option<LoadResult>> {
        if id == shims::HELPER_VIRTUAL_ID {
            return Ok(Some(LoadResult::code(shims::helper_module_source())));
        }
        Ok(None)
    }

    fn transform_index_html(&self, html: &str) -> HookResult<Option<String>> {
        html::transform_index_html(
            html,
            &self.sub_app_name,
            &self.options,
            &self.captured_config(),
        )
        .map_err(|e| self.hook_err("transformIndexHtml", &e))
    }

    fn transform(
        &self,
        code: &str,
        id: &str,
        _ctx: &PluginContext,
    ) -> HookResult<Option<TransformResult>> {
        module::transform(
            code,
            id,
            &self.sub_app_name,
            &self.options,
            &self.captured_config(),
        )
        .map(|out| out.map(TransformResult::code))
        .map_err(|e| self.hook_err("transform", &e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hooks::ServerOptions;
    use crate::options::MatchPattern;

    const PAGE: &str = r#"<html><head></head><body>
        <script type="module" src="/src/main.ts"></script>
    </body></html>"#;

    fn dev_server_config() -> ResolvedConfig {
        ResolvedConfig {
            command: BuildCommand::Serve,
            is_production: false,
            base: "/".to_string(),
            server: ServerOptions {
                host: None,
                port: 5173,
            },
        }
    }

    #[test]
    fn test_config_captured_once() {
        let plugin = MicroAppPlugin::new("app1", MicroAppOptions::new());
        plugin.config_resolved(&ResolvedConfig::build("/sub/")).unwrap();

        let captured = plugin.captured_config();
        assert!(captured.is_production);
        assert_eq!(captured.base, "/sub/");
        assert_eq!(captured.server_host, "127.0.0.1");
    }

    #[test]
    fn test_build_command_implies_production() {
        let plugin = MicroAppPlugin::new("app1", MicroAppOptions::new());
        let config = ResolvedConfig {
            command: BuildCommand::Build,
            is_production: false,
            ..ResolvedConfig::serve("/")
        };
        plugin.config_resolved(&config).unwrap();
        assert!(plugin.captured_config().is_production);
    }

    #[test]
    fn test_helper_module_resolve_and_load() {
        let plugin = MicroAppPlugin::new("app1", MicroAppOptions::new());
        let ctx = PluginContext::default();

        for specifier in [shims::HELPER_SPECIFIER, shims::HELPER_URL] {
            let resolved = plugin.resolve_id(specifier, None, &ctx).unwrap().unwrap();
            assert_eq!(resolved.id, shims::HELPER_VIRTUAL_ID);
        }

        let loaded = plugin.load(shims::HELPER_VIRTUAL_ID, &ctx).unwrap().unwrap();
        assert!(loaded.code.contains("renderWithQiankun"));
        assert!(plugin.load("/src/main.ts", &ctx).unwrap().is_none());
    }

    #[test]
    fn test_index_html_hook_round_trip() {
        let plugin = MicroAppPlugin::new("app1", MicroAppOptions::new());
        plugin.config_resolved(&dev_server_config()).unwrap();

        let out = plugin.transform_index_html(PAGE).unwrap().unwrap();
        assert!(out.contains("import('/src/main.ts')"));
        assert!(out.contains("global.qiankunName = 'app1';"));

        let untouched = plugin
            .transform_index_html("<html><body></body></html>")
            .unwrap();
        assert!(untouched.is_none());
    }

    #[test]
    fn test_dev_passthrough_rewrites_client_script() {
        let plugin = MicroAppPlugin::new("app1", MicroAppOptions::new().dev_mode(true));
        plugin.config_resolved(&dev_server_config()).unwrap();

        let mut server = ServerContext::new(dev_server_config());
        plugin.configure_server(&mut server).unwrap();

        let body = r#"<html><head><script type="module" src="/@vite/client"></script></head><body></body></html>"#;
        let out = server.rewrite_html(body);
        assert!(out.contains("'/@vite/client')"));
        assert!(!out.contains(r#"src="/@vite/client""#));
    }

    #[test]
    fn test_dev_passthrough_inactive_without_dev_mode() {
        let plugin = MicroAppPlugin::new("app1", MicroAppOptions::new());
        plugin.config_resolved(&dev_server_config()).unwrap();

        let mut server = ServerContext::new(dev_server_config());
        plugin.configure_server(&mut server).unwrap();

        let body = r#"<html><head><script src="/@vite/client"></script></head><body></body></html>"#;
        assert_eq!(server.rewrite_html(body), body);
    }

    #[test]
    fn test_dev_passthrough_inactive_in_production() {
        let plugin = MicroAppPlugin::new("app1", MicroAppOptions::new().dev_mode(true));
        plugin.config_resolved(&ResolvedConfig::build("/")).unwrap();

        let mut server = ServerContext::new(ResolvedConfig::build("/"));
        plugin.configure_server(&mut server).unwrap();

        let body = r#"<html><head><script src="/@vite/client"></script></head><body></body></html>"#;
        assert_eq!(server.rewrite_html(body), body);
    }

    #[test]
    fn test_transform_hook_dispatch() {
        let options = MicroAppOptions::new()
            .entry_matcher(MatchPattern::substring("src/main"));
        let plugin = MicroAppPlugin::new("app1", options);
        let ctx = PluginContext::default();

        let code = "export const mount=1,bootstrap=1,unmount=1,update=1;";
        let out = plugin.transform(code, "/p/src/main.ts", &ctx).unwrap().unwrap();
        assert!(out.code.contains("renderWithQiankun"));

        assert!(plugin.transform(code, "/p/src/other.ts", &ctx).unwrap().is_none());
    }
}
