//! Tests for the JSON tree and patch encodings.

use serde_json::json;
use weft_core::patch::{AttributePatch, Patch};
use weft_core::{
    AttributeKey, Cuid, Reconciled, ReconciledAttribute, ReconciledElement, ReconciledFragment,
    ReconciledText,
};
use weft_ssr::{patch_json, render_json};

fn anchor(id: &Cuid) -> Reconciled {
    Reconciled::Element(ReconciledElement {
        tag: "a".into(),
        key: None,
        attributes: vec![
            ReconciledAttribute::Static {
                name: "href".into(),
                value: "#".into(),
            },
            ReconciledAttribute::EventHandler {
                kind: "click".into(),
                id: id.clone(),
            },
        ],
        children: vec![Reconciled::Text(ReconciledText {
            text: "Home".into(),
        })],
    })
}

#[test]
fn elements_render_with_type_attrs_and_indexed_children() {
    let id = Cuid::from_string("h1");
    assert_eq!(
        render_json(&anchor(&id)),
        json!({
            "type": "a",
            "attrs": { "href": "#", "weft-event-click": "h1" },
            "0": "Home",
        })
    );
}

#[test]
fn keys_and_client_hooks_render_as_wire_attributes() {
    let node = Reconciled::Element(ReconciledElement {
        tag: "div".into(),
        key: Some("row-9".into()),
        attributes: vec![ReconciledAttribute::ClientHook {
            name: "Clock".into(),
            id: Cuid::from_string("ch2"),
        }],
        children: vec![],
    });
    assert_eq!(
        render_json(&node),
        json!({
            "type": "div",
            "attrs": {
                "weft-key": "row-9",
                "weft-hook": "Clock",
                "weft-hook-id": "ch2",
            },
        })
    );
}

#[test]
fn fragments_render_transparently() {
    let node = Reconciled::Fragment(ReconciledFragment {
        key: None,
        children: vec![
            Reconciled::Text(ReconciledText { text: "a".into() }),
            Reconciled::Text(ReconciledText { text: "b".into() }),
        ],
    });
    assert_eq!(
        render_json(&node),
        json!({ "type": "fragment", "0": "a", "1": "b" })
    );
}

#[test]
fn update_patches_carry_attr_and_child_deltas() {
    let patch = Patch::Update {
        attributes: Some(vec![
            AttributePatch::Set(ReconciledAttribute::Static {
                name: "class".into(),
                value: "bold".into(),
            }),
            AttributePatch::Remove {
                key: AttributeKey::EventHandler {
                    kind: "click".into(),
                },
            },
        ]),
        children: Some(vec![(
            1,
            Patch::Replace(Reconciled::Text(ReconciledText { text: "Two".into() })),
        )]),
    };
    assert_eq!(
        patch_json(&patch),
        json!({
            "op": "update",
            "attrs": [
                { "op": "set", "name": "class", "value": "bold" },
                { "op": "remove", "name": "weft-event-click" },
            ],
            "children": { "1": { "op": "replace", "node": "Two" } },
        })
    );
}

#[test]
fn moves_and_removals_encode_source_positions() {
    let patch = Patch::Update {
        attributes: None,
        children: Some(vec![
            (
                0,
                Patch::Move {
                    from: 2,
                    patch: Box::new(Patch::NoOp),
                },
            ),
            (2, Patch::Remove),
        ]),
    };
    assert_eq!(
        patch_json(&patch),
        json!({
            "op": "update",
            "children": {
                "0": { "op": "move", "from": 2, "patch": { "op": "noop" } },
                "2": { "op": "remove" },
            },
        })
    );
}
