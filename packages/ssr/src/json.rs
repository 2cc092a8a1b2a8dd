//! Reconciled trees and patches as JSON, in the shape the browser client
//! consumes.
//!
//! Elements render as objects keyed by child index:
//!
//! ```json
//! { "type": "a", "attrs": { "href": "#", "weft-event-click": "c1f-3" }, "0": "Home" }
//! ```
//!
//! Components and fragments render as transparent containers, text as bare
//! JSON strings. Patches mirror the same node encoding for `replace` and
//! `insert` payloads.

use crate::consts::{CLIENT_HOOK_ATTR, CLIENT_HOOK_ID_ATTR, EVENT_ATTR_PREFIX, KEY_ATTR};
use serde_json::{json, Map, Value};
use weft_core::patch::{AttributePatch, Patch};
use weft_core::{
    AttributeKey, Reconciled, ReconciledAttribute, Renderer, RenderedUpdate,
};

/// Renders a reconciled tree to a [`serde_json::Value`].
pub struct JsonRenderer;

impl Renderer for JsonRenderer {
    type Output = Value;

    fn render(&self, node: &Reconciled) -> Value {
        render_json(node)
    }
}

/// Serialise a reconciled tree.
pub fn render_json(node: &Reconciled) -> Value {
    match node {
        Reconciled::Text(text) => Value::String(text.text.clone()),

        Reconciled::Element(el) => {
            let mut object = Map::new();
            object.insert("type".into(), Value::String(el.tag.clone()));

            let mut attrs = Map::new();
            if let Some(key) = &el.key {
                attrs.insert(KEY_ATTR.into(), Value::String(key.clone()));
            }
            for attr in &el.attributes {
                match attr {
                    ReconciledAttribute::Static { name, value } => {
                        attrs.insert(name.clone(), Value::String(value.clone()));
                    }
                    ReconciledAttribute::EventHandler { kind, id } => {
                        attrs.insert(
                            format!("{EVENT_ATTR_PREFIX}-{kind}"),
                            Value::String(id.to_string()),
                        );
                    }
                    ReconciledAttribute::ClientHook { name, id } => {
                        attrs.insert(CLIENT_HOOK_ATTR.into(), Value::String(name.clone()));
                        attrs.insert(CLIENT_HOOK_ID_ATTR.into(), Value::String(id.to_string()));
                    }
                }
            }
            object.insert("attrs".into(), Value::Object(attrs));

            for (index, child) in el.children.iter().enumerate() {
                object.insert(index.to_string(), render_json(child));
            }
            Value::Object(object)
        }

        Reconciled::Component(comp) => {
            json!({ "type": "component", "0": render_json(&comp.child) })
        }

        Reconciled::Fragment(frag) => {
            let mut object = Map::new();
            object.insert("type".into(), Value::String("fragment".into()));
            if let Some(key) = &frag.key {
                object.insert(KEY_ATTR.into(), Value::String(key.clone()));
            }
            for (index, child) in frag.children.iter().enumerate() {
                object.insert(index.to_string(), render_json(child));
            }
            Value::Object(object)
        }
    }
}

/// Serialise a patch.
pub fn patch_json(patch: &Patch) -> Value {
    match patch {
        Patch::NoOp => json!({ "op": "noop" }),

        Patch::Update {
            attributes,
            children,
        } => {
            let mut object = Map::new();
            object.insert("op".into(), Value::String("update".into()));
            if let Some(patches) = attributes {
                let rendered: Vec<Value> = patches.iter().flat_map(attribute_patch_json).collect();
                object.insert("attrs".into(), Value::Array(rendered));
            }
            if let Some(ops) = children {
                let mut child_ops = Map::new();
                for (index, child_patch) in ops {
                    child_ops.insert(index.to_string(), patch_json(child_patch));
                }
                object.insert("children".into(), Value::Object(child_ops));
            }
            Value::Object(object)
        }

        Patch::Replace(node) => json!({ "op": "replace", "node": render_json(node) }),
        Patch::Insert(node) => json!({ "op": "insert", "node": render_json(node) }),
        Patch::Remove => json!({ "op": "remove" }),
        Patch::Move { from, patch } => {
            json!({ "op": "move", "from": from, "patch": patch_json(patch) })
        }
    }
}

/// A single attribute patch can touch more than one wire attribute (a
/// client hook occupies two), hence the list.
fn attribute_patch_json(patch: &AttributePatch) -> Vec<Value> {
    match patch {
        AttributePatch::Set(ReconciledAttribute::Static { name, value }) => {
            vec![json!({ "op": "set", "name": name, "value": value })]
        }
        AttributePatch::Set(ReconciledAttribute::EventHandler { kind, id }) => {
            vec![json!({
                "op": "set",
                "name": format!("{EVENT_ATTR_PREFIX}-{kind}"),
                "value": id.to_string(),
            })]
        }
        AttributePatch::Set(ReconciledAttribute::ClientHook { name, id }) => vec![
            json!({ "op": "set", "name": CLIENT_HOOK_ATTR, "value": name }),
            json!({ "op": "set", "name": CLIENT_HOOK_ID_ATTR, "value": id.to_string() }),
        ],
        AttributePatch::Remove { key } => match key {
            AttributeKey::Static { name } => {
                vec![json!({ "op": "remove", "name": name })]
            }
            AttributeKey::EventHandler { kind } => {
                vec![json!({ "op": "remove", "name": format!("{EVENT_ATTR_PREFIX}-{kind}") })]
            }
            AttributeKey::ClientHook { .. } => vec![
                json!({ "op": "remove", "name": CLIENT_HOOK_ATTR }),
                json!({ "op": "remove", "name": CLIENT_HOOK_ID_ATTR }),
            ],
        },
    }
}

/// Serialise a full or patch update as pushed to the client.
pub fn render_update_json(update: &RenderedUpdate) -> Value {
    match update {
        RenderedUpdate::FullUpdate(tree) => json!({ "type": "full", "tree": render_json(tree) }),
        RenderedUpdate::PatchUpdate(patch) => {
            json!({ "type": "patch", "patch": patch_json(patch) })
        }
    }
}
