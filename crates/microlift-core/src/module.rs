//! Module source rewriting.
//!
//! Two mutually exclusive text-rewrite branches for the `transform` hook:
//! the entry-module lifecycle rewrite and the asset-path rewrite for other
//! modules. Both are plain pattern substitution over the source text; the
//! substitution rules are pinned by the tests below and intentionally not
//! syntax-aware.

use regex_lite::Regex;

use crate::error::Error;
use crate::options::MicroAppOptions;
use crate::plugin::CapturedConfig;
use crate::shims::HELPER_SPECIFIER;

/// Asset references eligible for the default path rewrite.
const ASSET_PATH_PATTERN: &str = r"/src/(.*)\.(svg|jp?g|png|webp|gif|ttf|heic|av1|mp4|webm|ogg|mp3|wav|flac|aac|woff2?|eot|ttf|otf)";

/// Apply whichever rewrite branch matches this module, if any.
///
/// Entry modules (id matched by the configured pattern) get the lifecycle
/// rewrite; any other module gets the asset-path rewrite when that option is
/// on. At most one branch applies; `Ok(None)` means pass-through.
pub fn transform(
    code: &str,
    id: &str,
    sub_app_name: &str,
    options: &MicroAppOptions,
    config: &CapturedConfig,
) -> Result<Option<String>, Error> {
    if options
        .entry_matcher
        .as_ref()
        .is_some_and(|m| m.matches(id))
    {
        return rewrite_entry_module(code, options).map(Some);
    }

    if options.rewrite_assets_path {
        return Ok(Some(rewrite_asset_paths(
            code,
            sub_app_name,
            options,
            config,
        )));
    }

    Ok(None)
}

/// The entry-module lifecycle rewrite, applied as ordered textual steps:
///
/// 1. Prepend the runtime helper import.
/// 2. Qualify the first bare `__webpack_public_path__` with `window.` so
///    reading it without a real global window does not throw.
/// 3. Hoist each configured sandbox variable: strip its first single-line
///    declaration, then rewrite every remaining bare reference to
///    `window.<name>`.
/// 4. Rewrite every bare `window` reference to the sandbox accessor
///    `qiankunWindow()` (this also rewrites the `window.` prefixes produced
///    by steps 2 and 3).
/// 5. Append the lifecycle registration call.
/// 6. Append any user-configured trailing code verbatim.
pub fn rewrite_entry_module(code: &str, options: &MicroAppOptions) -> Result<String, Error> {
    let mut code = format!(
        "import {{ renderWithQiankun, qiankunWindow }} from '{HELPER_SPECIFIER}';\n{code}"
    );

    if let Ok(re) = Regex::new(r"\b(__webpack_public_path__)\b") {
        code = re.replacen(&code, 1, "window.$1").into_owned();
    }

    for variable in &options.sandbox_variables {
        let strip = Regex::new(&format!(
            r"(var|let|const)?\s*\b{variable}\b[^\n;]+(\n|;)?"
        ))
        .map_err(|e| Error::invalid_pattern(variable, e.to_string()))?;
        code = strip.replacen(&code, 1, "").into_owned();

        let qualify = Regex::new(&format!(r"\b({variable})\b"))
            .map_err(|e| Error::invalid_pattern(variable, e.to_string()))?;
        code = qualify.replace_all(&code, "window.$1").into_owned();
    }

    if let Ok(re) = Regex::new(r"\bwindow\b") {
        code = re.replace_all(&code, "qiankunWindow()").into_owned();
    }

    code.push_str("renderWithQiankun({ mount, bootstrap, unmount, update });\n");
    if let Some(appended) = &options.appended_code {
        code.push_str(appended);
    }

    Ok(code)
}

/// The asset-path rewrite for non-entry modules.
///
/// With a user replacer configured, the whole source is mapped through it.
/// Otherwise every `/src/...` reference with a supported asset extension is
/// replaced: in production by the sub-application name, in development by an
/// absolute dev-server URL.
#[must_use]
pub fn rewrite_asset_paths(
    code: &str,
    sub_app_name: &str,
    options: &MicroAppOptions,
    config: &CapturedConfig,
) -> String {
    if let Some(replacer) = &options.assets_path_replacer {
        return replacer(code);
    }

    let Ok(re) = Regex::new(ASSET_PATH_PATTERN) else {
        return code.to_string();
    };
    let replacement = if config.is_production {
        sub_app_name.to_string()
    } else {
        format!(
            "http://{}:{}/src/$1.$2",
            config.server_host, config.server_port
        )
    };
    re.replace_all(code, replacement.as_str()).into_owned()
}
