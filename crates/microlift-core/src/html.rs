//! HTML entry transforms.
//!
//! Implements the entry-script rewrite rule (static module `<script>` tags
//! become deferred dynamic imports) and the two places it applies: the
//! `transform_index_html` hook and the dev-server passthrough rewrite of the
//! tool's own client script.

use markup5ever_rcdom::Handle;

use crate::error::Error;
use crate::markup::{self, MarkupDocument};
use crate::options::MicroAppOptions;
use crate::plugin::CapturedConfig;
use crate::shims;

/// Rewrite one located script element into a deferred dynamic import.
///
/// Reads `src`, drops the `src` and `type` attributes so the browser no
/// longer eagerly fetches the module, and sets the element body to a
/// dynamic-import expression of the original path. With `dev_prefix` the
/// import path is prefixed at runtime by the qiankun-injected public path.
///
/// Returns `None` when no element was matched or the element carries no
/// `src`; callers must treat that as "nothing to do".
pub fn rewrite_entry_script(el: Option<&Handle>, dev_prefix: bool) -> Option<Handle> {
    let el = el?;
    let src = markup::attr(el, "src")?;
    let prefix = if dev_prefix {
        shims::DEV_PUBLIC_PATH_PREFIX
    } else {
        ""
    };
    markup::remove_attr(el, "src");
    markup::remove_attr(el, "type");
    markup::set_text(el, &format!("import({prefix}'{src}')"));
    Some(el.clone())
}

/// The `transform_index_html` hook body.
///
/// Applies [`rewrite_entry_script`] to every matching script tag, chains the
/// lifecycle-export shim onto the last one via `.finally`, and appends the
/// handshake-creation shim as an inline script to `<body>`.
///
/// Returns `Ok(None)` when the document has no matching script tags: the
/// hook passes the HTML through unchanged. Re-running on already-transformed
/// output is unsupported.
pub fn transform_index_html(
    html: &str,
    sub_app_name: &str,
    options: &MicroAppOptions,
    config: &CapturedConfig,
) -> Result<Option<String>, Error> {
    let doc = MarkupDocument::parse(html);
    let scripts = doc.module_entry_scripts();
    if scripts.is_empty() {
        return Ok(None);
    }

    let dev_prefix = options.use_dev_mode && !config.is_production;
    let last = scripts.len() - 1;
    for (i, el) in scripts.iter().enumerate() {
        let rewritten = rewrite_entry_script(Some(el), dev_prefix);
        if i == last {
            if let Some(el) = rewritten {
                // Only the final script is guaranteed to settle after all
                // prior ones, so it is the one safe point to signal that the
                // entry graph finished loading.
                let import = markup::text(&el);
                markup::set_text(
                    &el,
                    &format!(
                        "{import}.finally(() => {{\n{}\n}})",
                        shims::import_finally_resolve(sub_app_name)
                    ),
                );
            }
        }
    }

    doc.append_inline_script(&shims::handshake_script(sub_app_name));
    doc.serialize().map(Some)
}

/// Dev-server passthrough rewrite of the served HTML body.
///
/// Locates the dev server's own client-bootstrap script (`src` equal to
/// `<base>@vite/client` exactly) and applies the entry-script rule to it, so
/// that script too loads as a deferred dynamic import. Returns `None` when
/// the tag is absent or serialization fails; the body then passes through
/// unmodified.
#[must_use]
pub fn rewrite_dev_client_script(body: &str, base: &str) -> Option<String> {
    let doc = MarkupDocument::parse(body);
    let client = doc.script_with_src(&format!("{base}@vite/client"))?;
    rewrite_entry_script(Some(&client), true)?;
    doc.serialize().ok()
}
