//! Render a reconciled tree to an HTML string for the initial page load.
//!
//! The output carries the same wire attributes the JSON renderer emits
//! (`weft-event-*`, `weft-hook`, `weft-key`), so the browser client can
//! bind events against server-rendered markup before the first update
//! arrives. Text and attribute values are HTML-escaped.

use crate::consts::{CLIENT_HOOK_ATTR, CLIENT_HOOK_ID_ATTR, EVENT_ATTR_PREFIX, KEY_ATTR};
use askama_escape::{escape, Html};
use std::fmt::Write;
use weft_core::{Reconciled, ReconciledAttribute, Renderer};

/// Elements that never take a closing tag.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

/// Renders a reconciled tree to an HTML string.
pub struct HtmlRenderer;

impl Renderer for HtmlRenderer {
    type Output = String;

    fn render(&self, node: &Reconciled) -> String {
        render_html(node)
    }
}

/// Serialise a reconciled tree as HTML.
pub fn render_html(node: &Reconciled) -> String {
    let mut out = String::new();
    write_node(&mut out, node);
    out
}

fn write_node(out: &mut String, node: &Reconciled) {
    match node {
        Reconciled::Text(text) => {
            let _ = write!(out, "{}", escape(&text.text, Html));
        }

        // Components and fragments are invisible in markup.
        Reconciled::Component(comp) => write_node(out, &comp.child),
        Reconciled::Fragment(frag) => {
            for child in &frag.children {
                write_node(out, child);
            }
        }

        Reconciled::Element(el) => {
            let _ = write!(out, "<{}", el.tag);
            if let Some(key) = &el.key {
                write_attribute(out, KEY_ATTR, key);
            }
            for attr in &el.attributes {
                match attr {
                    ReconciledAttribute::Static { name, value } => {
                        write_attribute(out, name, value);
                    }
                    ReconciledAttribute::EventHandler { kind, id } => {
                        write_attribute(out, &format!("{EVENT_ATTR_PREFIX}-{kind}"), &id.to_string());
                    }
                    ReconciledAttribute::ClientHook { name, id } => {
                        write_attribute(out, CLIENT_HOOK_ATTR, name);
                        write_attribute(out, CLIENT_HOOK_ID_ATTR, &id.to_string());
                    }
                }
            }
            out.push('>');

            if VOID_ELEMENTS.contains(&el.tag.as_str()) {
                return;
            }
            for child in &el.children {
                write_node(out, child);
            }
            let _ = write!(out, "</{}>", el.tag);
        }
    }
}

fn write_attribute(out: &mut String, name: &str, value: &str) {
    let _ = write!(out, " {}=\"{}\"", name, escape(value, Html));
}
