//! Markup parsing and mutation.
//!
//! Wraps html5ever's `RcDom` behind the small capability the transforms need:
//! parse an HTML string into a mutable tree, query script elements, read and
//! drop attributes, replace element text, append an inline script, and
//! serialize back to a string. A document is owned by a single transform call
//! and discarded after re-serialization.

use std::cell::RefCell;
use std::rc::Rc;

use html5ever::serialize::{serialize, SerializeOpts};
use html5ever::tendril::{StrTendril, TendrilSink};
use html5ever::{local_name, namespace_url, ns, parse_document, ParseOpts, QualName};
use markup5ever_rcdom::{Handle, Node, NodeData, RcDom, SerializableHandle};

use crate::error::Error;

/// An in-memory mutable HTML tree for the duration of one transform call.
pub struct MarkupDocument {
    dom: RcDom,
}

impl MarkupDocument {
    /// Parse an HTML string. html5ever recovers from malformed input, so
    /// parsing itself cannot fail.
    #[must_use]
    pub fn parse(html: &str) -> Self {
        let dom = parse_document(RcDom::default(), ParseOpts::default())
            .one(StrTendril::from_slice(html));
        Self { dom }
    }

    /// Script elements matching the entry selectors, in document order:
    /// `head script[crossorigin=""]` then `body script[type=module]`.
    /// Head precedes body in document order, so head matches come first.
    #[must_use]
    pub fn module_entry_scripts(&self) -> Vec<Handle> {
        let mut out = Vec::new();
        collect_entry_scripts(&self.dom.document, false, false, &mut out);
        out
    }

    /// The first script element whose `src` attribute equals `src` exactly.
    #[must_use]
    pub fn script_with_src(&self, src: &str) -> Option<Handle> {
        find_script_with_src(&self.dom.document, src)
    }

    /// The `<body>` element, if the document has one.
    #[must_use]
    pub fn body(&self) -> Option<Handle> {
        find_element(&self.dom.document, "body")
    }

    /// Append an inline `<script>` with the given body to `<body>`.
    /// No-op when the document has no body element.
    pub fn append_inline_script(&self, code: &str) {
        let Some(body) = self.body() else {
            return;
        };
        let script = Node::new(NodeData::Element {
            name: QualName::new(None, ns!(html), local_name!("script")),
            attrs: RefCell::new(Vec::new()),
            template_contents: RefCell::new(None),
            mathml_annotation_xml_integration_point: false,
        });
        set_text(&script, code);
        script.parent.set(Some(Rc::downgrade(&body)));
        body.children.borrow_mut().push(script);
    }

    /// Serialize the document back to an HTML string.
    pub fn serialize(&self) -> Result<String, Error> {
        let mut bytes = Vec::new();
        let document: SerializableHandle = self.dom.document.clone().into();
        serialize(&mut bytes, &document, SerializeOpts::default())
            .map_err(|e| Error::Markup(e.to_string()))?;
        String::from_utf8(bytes).map_err(|e| Error::Markup(e.to_string()))
    }
}

/// Read an attribute value from an element node.
#[must_use]
pub fn attr(el: &Handle, name: &str) -> Option<String> {
    if let NodeData::Element { attrs, .. } = &el.data {
        for a in attrs.borrow().iter() {
            if a.name.local.as_ref() == name {
                return Some(a.value.to_string());
            }
        }
    }
    None
}

/// Drop an attribute from an element node, if present.
pub fn remove_attr(el: &Handle, name: &str) {
    if let NodeData::Element { attrs, .. } = &el.data {
        attrs.borrow_mut().retain(|a| a.name.local.as_ref() != name);
    }
}

/// Concatenated text content of an element's direct text children.
#[must_use]
pub fn text(el: &Handle) -> String {
    let mut out = String::new();
    for child in el.children.borrow().iter() {
        if let NodeData::Text { contents } = &child.data {
            out.push_str(&contents.borrow());
        }
    }
    out
}

/// Replace an element's children with a single text node.
pub fn set_text(el: &Handle, value: &str) {
    let node = Node::new(NodeData::Text {
        contents: RefCell::new(StrTendril::from_slice(value)),
    });
    node.parent.set(Some(Rc::downgrade(el)));
    let mut children = el.children.borrow_mut();
    children.clear();
    children.push(node);
}

fn attr_eq(el: &Handle, name: &str, value: &str) -> bool {
    attr(el, name).as_deref() == Some(value)
}

fn element_name(el: &Handle) -> Option<&str> {
    match &el.data {
        NodeData::Element { name, .. } => Some(name.local.as_ref()),
        _ => None,
    }
}

fn collect_entry_scripts(node: &Handle, in_head: bool, in_body: bool, out: &mut Vec<Handle>) {
    for child in node.children.borrow().iter() {
        let tag = element_name(child);
        if tag == Some("script") {
            let matched = (in_head && attr_eq(child, "crossorigin", ""))
                || (in_body && attr_eq(child, "type", "module"));
            if matched {
                out.push(child.clone());
            }
        }
        collect_entry_scripts(
            child,
            in_head || tag == Some("head"),
            in_body || tag == Some("body"),
            out,
        );
    }
}

fn find_script_with_src(node: &Handle, src: &str) -> Option<Handle> {
    for child in node.children.borrow().iter() {
        if element_name(child) == Some("script") && attr_eq(child, "src", src) {
            return Some(child.clone());
        }
        if let Some(found) = find_script_with_src(child, src) {
            return Some(found);
        }
    }
    None
}

fn find_element(node: &Handle, name: &str) -> Option<Handle> {
    for child in node.children.borrow().iter() {
        if element_name(child) == Some(name) {
            return Some(child.clone());
        }
        if let Some(found) = find_element(child, name) {
            return Some(found);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"<!DOCTYPE html><html><head>
        <script crossorigin="" src="/assets/vendor.js"></script>
        <script src="/assets/other.js"></script>
    </head><body>
        <div id="app"></div>
        <script type="module" src="/src/main.ts"></script>
        <script src="/plain.js"></script>
    </body></html>"#;

    #[test]
    fn test_entry_selector_matches_head_then_body() {
        let doc = MarkupDocument::parse(PAGE);
        let scripts = doc.module_entry_scripts();
        assert_eq!(scripts.len(), 2);
        assert_eq!(attr(&scripts[0], "src").as_deref(), Some("/assets/vendor.js"));
        assert_eq!(attr(&scripts[1], "src").as_deref(), Some("/src/main.ts"));
    }

    #[test]
    fn test_plain_scripts_are_not_matched() {
        let doc = MarkupDocument::parse(PAGE);
        for el in doc.module_entry_scripts() {
            let src = attr(&el, "src").unwrap();
            assert_ne!(src, "/plain.js");
            assert_ne!(src, "/assets/other.js");
        }
    }

    #[test]
    fn test_attr_mutation_and_text() {
        let doc = MarkupDocument::parse(PAGE);
        let el = doc.script_with_src("/src/main.ts").unwrap();
        remove_attr(&el, "src");
        remove_attr(&el, "type");
        set_text(&el, "import('/src/main.ts')");

        assert_eq!(attr(&el, "src"), None);
        assert_eq!(text(&el), "import('/src/main.ts')");

        let html = doc.serialize().unwrap();
        assert!(html.contains("import('/src/main.ts')"));
        assert!(!html.contains(r#"src="/src/main.ts""#));
    }

    #[test]
    fn test_append_inline_script_lands_in_body() {
        let doc = MarkupDocument::parse(PAGE);
        doc.append_inline_script("console.log('hi')");
        let html = doc.serialize().unwrap();
        let body_at = html.find("<body").unwrap();
        let inline_at = html.find("console.log('hi')").unwrap();
        assert!(inline_at > body_at);
    }

    #[test]
    fn test_script_text_is_not_escaped() {
        let doc = MarkupDocument::parse(PAGE);
        doc.append_inline_script("if (a && b) { c('<x>'); }");
        let html = doc.serialize().unwrap();
        assert!(html.contains("if (a && b) { c('<x>'); }"));
    }
}
