//! Tests for the initial-page-load HTML renderer.

use async_trait::async_trait;
use std::sync::Arc;
use weft_core::prelude::*;
use weft_core::{
    Cuid, Reconciled, ReconciledAttribute, ReconciledElement, ReconciledText, RenderedUpdate,
    Updater, UpdaterError,
};
use weft_ssr::render_html;

#[test]
fn static_attributes_and_text_are_escaped() {
    let node = Reconciled::Element(ReconciledElement {
        tag: "div".into(),
        key: None,
        attributes: vec![ReconciledAttribute::Static {
            name: "title".into(),
            value: "a \"b\" <c>".into(),
        }],
        children: vec![Reconciled::Text(ReconciledText {
            text: "1 < 2 && 3".into(),
        })],
    });
    assert_eq!(
        render_html(&node),
        r#"<div title="a &quot;b&quot; &lt;c&gt;">1 &lt; 2 &amp;&amp; 3</div>"#
    );
}

#[test]
fn event_handlers_keys_and_void_elements_render() {
    let node = Reconciled::Element(ReconciledElement {
        tag: "form".into(),
        key: Some("login".into()),
        attributes: vec![ReconciledAttribute::EventHandler {
            kind: "submit".into(),
            id: Cuid::from_string("h7"),
        }],
        children: vec![Reconciled::Element(ReconciledElement {
            tag: "input".into(),
            key: None,
            attributes: vec![ReconciledAttribute::Static {
                name: "type".into(),
                value: "text".into(),
            }],
            children: vec![],
        })],
    });
    assert_eq!(
        render_html(&node),
        r#"<form weft-key="login" weft-event-submit="h7"><input type="text"></form>"#
    );
}

struct NullUpdater;

#[async_trait]
impl Updater for NullUpdater {
    async fn send(&self, _update: RenderedUpdate) -> Result<(), UpdaterError> {
        Ok(())
    }
}

fn greeter(_ctx: &mut Context, name: &String) -> Vec<Element> {
    vec![el("p", vec![], vec![text(format!("Hello, {name}"))])]
}

#[tokio::test]
async fn components_and_fragments_are_invisible_in_markup() {
    let view = fragment(vec![
        component(greeter, "Ada".to_string()),
        el("hr", vec![], vec![]),
    ]);
    let handle = start(view, Arc::new(NullUpdater), None);

    let tree = handle.get_reconciled().await.unwrap().unwrap();
    assert_eq!(render_html(&tree), "<p>Hello, Ada</p><hr>");

    handle.stop();
}
