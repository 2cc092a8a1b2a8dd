//! Tests for first-render reconciliation: elements, fragments, providers.

use async_trait::async_trait;
use weft_core::prelude::*;
use weft_core::{
    Reconciled, ReconciledAttribute, RenderedUpdate, Updater, UpdaterError,
};

struct NullUpdater;

#[async_trait]
impl Updater for NullUpdater {
    async fn send(&self, _update: RenderedUpdate) -> Result<(), UpdaterError> {
        Ok(())
    }
}

fn updater() -> std::sync::Arc<NullUpdater> {
    std::sync::Arc::new(NullUpdater)
}

#[derive(Clone)]
struct NavProps {
    active: bool,
}

fn nav_link(ctx: &mut Context, props: &NavProps) -> Vec<Element> {
    let on_click = use_handler(ctx, |_| {});
    vec![el(
        "a",
        vec![
            attr(
                "class",
                classes(&[Some("base"), props.active.then_some("bold")]),
            ),
            attr("href", "#"),
            on("click", on_click),
        ],
        vec![text("Home")],
    )]
}

#[tokio::test]
async fn basic_element_render() {
    let handle = start(
        component(nav_link, NavProps { active: true }),
        updater(),
        None,
    );

    let tree = handle.get_reconciled().await.unwrap().expect("first render");
    let Reconciled::Component(comp) = &tree else {
        panic!("root should be a component, got {tree:?}");
    };
    let Reconciled::Element(anchor) = comp.child.as_ref() else {
        panic!("component child should be an element");
    };

    assert_eq!(anchor.tag, "a");
    assert_eq!(anchor.key, None);
    assert_eq!(
        anchor.attributes[0],
        ReconciledAttribute::Static {
            name: "class".into(),
            value: "base bold".into()
        }
    );
    assert_eq!(
        anchor.attributes[1],
        ReconciledAttribute::Static {
            name: "href".into(),
            value: "#".into()
        }
    );
    assert!(matches!(
        &anchor.attributes[2],
        ReconciledAttribute::EventHandler { kind, .. } if kind == "click"
    ));
    assert_eq!(
        anchor.children,
        vec![Reconciled::Text(weft_core::ReconciledText {
            text: "Home".into()
        })]
    );

    handle.stop();
}

fn anchor_pair(ctx: &mut Context, _props: &()) -> Vec<Element> {
    let first = use_handler(ctx, |_| {});
    let second = use_handler(ctx, |_| {});
    vec![
        el(
            "a",
            vec![attr("href", "#one"), on("click", first)],
            vec![text("One")],
        ),
        el(
            "a",
            vec![attr("href", "#two"), on("click", second)],
            vec![text("Two")],
        ),
    ]
}

#[tokio::test]
async fn component_with_multiple_roots_renders_a_fragment() {
    let handle = start(component(anchor_pair, ()), updater(), None);

    let tree = handle.get_reconciled().await.unwrap().expect("first render");
    let Reconciled::Component(comp) = &tree else {
        panic!("root should be a component");
    };
    let Reconciled::Fragment(frag) = comp.child.as_ref() else {
        panic!("multi-root component should reconcile to a fragment");
    };
    assert_eq!(frag.key, None);
    assert_eq!(frag.children.len(), 2);

    // Every handler in the tree must be dispatchable, which proves it was
    // recorded in the handler registry for this pass.
    let mut handler_ids = Vec::new();
    collect_handler_ids(&tree, &mut handler_ids);
    assert_eq!(handler_ids.len(), 2);
    for id in handler_ids {
        handle
            .process_event_immediate(id, None)
            .await
            .expect("handler should be registered");
    }

    handle.stop();
}

#[derive(Clone, PartialEq)]
struct TitleContext(String);

fn titled(ctx: &mut Context, _props: &()) -> Vec<Element> {
    let title = use_context::<TitleContext>(ctx, "title");
    vec![text(title.0.clone())]
}

#[tokio::test]
async fn provider_value_reaches_nested_consumer() {
    let view = el(
        "div",
        vec![attr("class", "first")],
        vec![provider(
            "title",
            TitleContext("A different title".into()),
            el(
                "div",
                vec![attr("class", "second")],
                vec![component(titled, ())],
            ),
        )],
    );
    let handle = start(view, updater(), None);

    let tree = handle.get_reconciled().await.unwrap().expect("first render");
    let mut texts = Vec::new();
    collect_texts(&tree, &mut texts);
    assert_eq!(texts, vec!["A different title".to_string()]);

    handle.stop();
}

#[tokio::test]
async fn keyed_children_keep_identity_across_reorders() {
    // Positional fallback must not confuse keyed items of the same tag.
    let view = el(
        "ul",
        vec![],
        vec![
            keyed("x", el("li", vec![], vec![text("x")])),
            keyed("y", el("li", vec![], vec![text("y")])),
        ],
    );
    let handle = start(view, updater(), None);
    let tree = handle.get_reconciled().await.unwrap().expect("first render");
    let Reconciled::Element(ul) = &tree else {
        panic!("root should be an element");
    };
    assert_eq!(ul.children[0].key(), Some("x"));
    assert_eq!(ul.children[1].key(), Some("y"));

    handle.stop();
}

fn collect_handler_ids(node: &Reconciled, out: &mut Vec<weft_core::Cuid>) {
    match node {
        Reconciled::Element(el) => {
            for attr in &el.attributes {
                if let ReconciledAttribute::EventHandler { id, .. } = attr {
                    out.push(id.clone());
                }
            }
            el.children.iter().for_each(|c| collect_handler_ids(c, out));
        }
        Reconciled::Fragment(frag) => {
            frag.children.iter().for_each(|c| collect_handler_ids(c, out))
        }
        Reconciled::Component(comp) => collect_handler_ids(&comp.child, out),
        Reconciled::Text(_) => {}
    }
}

fn collect_texts(node: &Reconciled, out: &mut Vec<String>) {
    match node {
        Reconciled::Element(el) => el.children.iter().for_each(|c| collect_texts(c, out)),
        Reconciled::Fragment(frag) => frag.children.iter().for_each(|c| collect_texts(c, out)),
        Reconciled::Component(comp) => collect_texts(&comp.child, out),
        Reconciled::Text(text) => out.push(text.text.clone()),
    }
}
