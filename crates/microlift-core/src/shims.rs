//! Injected runtime snippets.
//!
//! Three JS templates emitted into the transformed output. Their text is the
//! runtime contract with the qiankun host: the global names, the `vite<hook>`
//! sandbox properties, and the `moudleQiankunAppLifeCycles` table (spelling
//! included) are all read by host-side code and must not drift.

/// Fixed import specifier for the runtime helper module.
pub const HELPER_SPECIFIER: &str = "microlift/helper";

/// Dev-server URL alias for the helper module.
pub const HELPER_URL: &str = "/@microlift/helper";

/// Internal virtual module id the helper resolves to.
pub const HELPER_VIRTUAL_ID: &str = "\0microlift-helper";

/// Import-path prefix used in dev mode: reads the qiankun-injected public
/// path off the sandbox proxy, falling back to an empty prefix when no proxy
/// is present.
pub const DEV_PUBLIC_PATH_PREFIX: &str =
    "(window.proxy ? (window.proxy.__INJECTED_PUBLIC_PATH_BY_QIANKUN__ + '..') : '') + ";

/// The handshake-creation shim, injected as an inline script at the end of
/// `<body>`.
///
/// Runs as soon as the page loads, before any entry module settles. Locates
/// the real top-level window through an indirect-eval escape hatch (the
/// current scope may itself be a sandbox proxy), registers this window into
/// the page-global sandbox map, and publishes four immediately-callable
/// lifecycle wrappers whose effect is deferred until the matching
/// `vite<hook>` sandbox property is assigned. Throws if the host never
/// designated this page as a sub-application; that is a fatal
/// misconfiguration.
#[must_use]
pub fn handshake_script(sub_app_name: &str) -> String {
    format!(
        r"
  const createDeffer = (hookName) => {{
    const mainWindow = (0, eval)('window');
    if (mainWindow.__QIANKUN_SUB_APP__) {{
      ;(mainWindow.__SUB_APP_SANDBOXES__ = mainWindow.__SUB_APP_SANDBOXES__ || new Map()).set(mainWindow.__QIANKUN_SUB_APP__.name, window);
    }} else {{
      throw new Error('please assign [app] param to window.__QIANKUN_SUB_APP__ in main project\'s qiankun life cycle \'beforeLoad\' and \'beforeMount\'')
    }}

    const d = new Promise((resolve, reject) => {{
      window.proxy && (window.proxy[`vite${{hookName}}`] = resolve)
    }})
    return props => d.then(fn => fn(props));
  }}
  const bootstrap = createDeffer('bootstrap');
  const mount = createDeffer('mount');
  const unmount = createDeffer('unmount');
  const update = createDeffer('update');

  ;(global => {{
    global.qiankunName = '{sub_app_name}';
    global['{sub_app_name}'] = {{
      bootstrap,
      mount,
      unmount,
      update
    }};
  }})(window);
"
    )
}

/// The lifecycle-export shim, chained via `.finally` onto the last entry
/// import.
///
/// Runs once the entry module graph has settled. Looks up the lifecycle
/// table populated by `renderWithQiankun` and, when present, resolves each
/// handshake deferred with a thin forwarder onto the real implementation.
#[must_use]
pub fn import_finally_resolve(sub_app_name: &str) -> String {
    format!(
        r"
    const qiankunLifeCycle = window.moudleQiankunAppLifeCycles && window.moudleQiankunAppLifeCycles['{sub_app_name}'];
    if (qiankunLifeCycle) {{
      window.proxy.vitemount((props) => qiankunLifeCycle.mount(props));
      window.proxy.viteunmount((props) => qiankunLifeCycle.unmount(props));
      window.proxy.vitebootstrap((props) => qiankunLifeCycle.bootstrap(props));
      window.proxy.viteupdate((props) => qiankunLifeCycle.update(props));
    }}
  "
    )
}

/// Source of the runtime helper module served for [`HELPER_VIRTUAL_ID`].
///
/// `qiankunWindow()` resolves the sandbox window: registry entry for this
/// sub-app, then the generic sandbox proxy, then the raw window, and an
/// empty object off-page. Lookups are guarded so the module also runs
/// standalone where none of the qiankun globals exist. `renderWithQiankun`
/// executes once per page load; outside a detected host it is a silent
/// no-op.
#[must_use]
pub fn helper_module_source() -> &'static str {
    r"export const qiankunWindow = () =>
  typeof window !== 'undefined'
    ? (window.__SUB_APP_SANDBOXES__ &&
        window.__QIANKUN_SUB_APP__ &&
        window.__SUB_APP_SANDBOXES__.get(window.__QIANKUN_SUB_APP__.name)) ||
      window.proxy ||
      window
    : {};

export const renderWithQiankun = (qiankunLifeCycle) => {
  const sandbox = qiankunWindow();
  if (sandbox && sandbox.__POWERED_BY_QIANKUN__) {
    if (!window.moudleQiankunAppLifeCycles) {
      window.moudleQiankunAppLifeCycles = {};
    }
    if (sandbox.qiankunName) {
      window.moudleQiankunAppLifeCycles[sandbox.qiankunName] = qiankunLifeCycle;
    }
  }
};
"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handshake_names_the_sub_app() {
        let js = handshake_script("app1");
        assert!(js.contains("global.qiankunName = 'app1';"));
        assert!(js.contains("global['app1'] = {"));
        assert!(js.contains("__QIANKUN_SUB_APP__"));
        assert!(js.contains("__SUB_APP_SANDBOXES__"));
        assert!(js.contains("(0, eval)('window')"));
    }

    #[test]
    fn test_handshake_covers_all_four_hooks() {
        let js = handshake_script("app1");
        for hook in ["bootstrap", "mount", "unmount", "update"] {
            assert!(js.contains(&format!("createDeffer('{hook}')")), "{hook}");
        }
    }

    #[test]
    fn test_finally_block_resolves_each_deferred() {
        let js = import_finally_resolve("app1");
        assert!(js.contains("moudleQiankunAppLifeCycles['app1']"));
        for hook in ["vitemount", "viteunmount", "vitebootstrap", "viteupdate"] {
            assert!(js.contains(hook), "{hook}");
        }
    }

    #[test]
    fn test_helper_is_standalone_safe() {
        let js = helper_module_source();
        assert!(js.contains("typeof window !== 'undefined'"));
        assert!(js.contains("window.__SUB_APP_SANDBOXES__ &&"));
        assert!(js.contains("__POWERED_BY_QIANKUN__"));
    }
}
