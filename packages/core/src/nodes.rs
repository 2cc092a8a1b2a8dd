//! The virtual element tree built by component functions.
//!
//! [`Element`]s are immutable descriptions of intended UI. They are cheap to
//! clone (shared interiors sit behind `Arc`) and live only as long as a
//! single reconciliation pass; the durable counterpart is the
//! [`Reconciled`](crate::reconciled::Reconciled) tree.

use crate::context::Context;
use crate::cuid::Cuid;
use crate::events::IdentifiableHandler;
use std::any::{Any, TypeId};
use std::sync::Arc;

/// Type-erased component props.
pub type Props = Arc<dyn Any + Send + Sync>;

/// Type-erased value bound by a provider node.
pub type ProviderValue = Arc<dyn Any + Send + Sync>;

/// A node in the virtual tree.
#[derive(Clone)]
pub enum Element {
    Element(VElement),
    Component(VComponent),
    Fragment(VFragment),
    Provider(VProvider),
    Text(VText),
}

/// A concrete markup element such as `div` or `a`.
#[derive(Clone)]
pub struct VElement {
    pub tag: String,
    pub key: Option<String>,
    pub attributes: Vec<Attribute>,
    pub children: Vec<Element>,
}

/// A functional component plus the props it closes over.
///
/// The props are stored behind an opaque handle; the typed signature is
/// restored inside the render closure built by [`component`]. That closure
/// and the constructor are the only places a downcast happens.
#[derive(Clone)]
pub struct VComponent {
    pub key: Option<String>,
    pub(crate) fn_id: usize,
    pub(crate) props: Props,
    pub(crate) render: RenderFn,
}

pub(crate) type RenderFn =
    Arc<dyn Fn(&mut Context, &(dyn Any + Send + Sync)) -> Vec<Element> + Send + Sync>;

/// A keyless grouping of sibling nodes.
#[derive(Clone)]
pub struct VFragment {
    pub key: Option<String>,
    pub children: Vec<Element>,
}

/// Binds a named value visible to every descendant during reconciliation.
#[derive(Clone)]
pub struct VProvider {
    pub key: String,
    pub value: ProviderValue,
    pub child: Box<Element>,
}

#[derive(Clone)]
pub struct VText {
    pub text: String,
}

/// An attribute on a [`VElement`].
#[derive(Clone)]
pub enum Attribute {
    Static { name: String, value: String },
    EventHandler { kind: String, handler: IdentifiableHandler },
    ClientHook { id: Cuid, name: String },
    /// Promoted onto the enclosing node's `key` during reconciliation and
    /// never rendered as an attribute.
    Key { value: String },
}

impl Element {
    /// The reconciliation key of this node, with a `Key` attribute taking
    /// precedence over none at all.
    pub fn key(&self) -> Option<&str> {
        match self {
            Element::Element(el) => el.key.as_deref().or_else(|| {
                el.attributes.iter().find_map(|attr| match attr {
                    Attribute::Key { value } => Some(value.as_str()),
                    _ => None,
                })
            }),
            Element::Component(comp) => comp.key.as_deref(),
            Element::Fragment(frag) => frag.key.as_deref(),
            // Providers are transparent; they pair by their child.
            Element::Provider(provider) => provider.child.key(),
            Element::Text(_) => None,
        }
    }
}

/// Build a markup element.
pub fn el(
    tag: impl Into<String>,
    attributes: Vec<Attribute>,
    children: Vec<Element>,
) -> Element {
    Element::Element(VElement {
        tag: tag.into(),
        key: None,
        attributes,
        children,
    })
}

/// Build a text node.
pub fn text(text: impl Into<String>) -> Element {
    Element::Text(VText { text: text.into() })
}

/// Group siblings without introducing markup.
pub fn fragment(children: Vec<Element>) -> Element {
    Element::Fragment(VFragment { key: None, children })
}

/// Mount a functional component.
///
/// The component is identified across renders by the raw function pointer
/// together with its key, so re-rendering the same function at the same
/// position carries its hooks forward.
pub fn component<P: Send + Sync + 'static>(
    f: fn(&mut Context, &P) -> Vec<Element>,
    props: P,
) -> Element {
    let fn_id = f as usize;
    let render: RenderFn = Arc::new(move |ctx: &mut Context, props: &(dyn Any + Send + Sync)| {
        let props = props
            .downcast_ref::<P>()
            .expect("component invoked with props of a different type than it was mounted with");
        f(ctx, props)
    });
    Element::Component(VComponent {
        key: None,
        fn_id,
        props: Arc::new(props),
        render,
    })
}

/// Bind `value` under `key` for the subtree rooted at `child`.
pub fn provider<T: Send + Sync + 'static>(
    key: impl Into<String>,
    value: T,
    child: Element,
) -> Element {
    Element::Provider(VProvider {
        key: key.into(),
        value: Arc::new(value),
        child: Box::new(child),
    })
}

/// Attach a reconciliation key to an element, component, or fragment.
///
/// Text nodes and providers carry no key; they pass through unchanged.
pub fn keyed(key: impl Into<String>, element: Element) -> Element {
    let key = key.into();
    match element {
        Element::Element(mut el) => {
            el.key = Some(key);
            Element::Element(el)
        }
        Element::Component(mut comp) => {
            comp.key = Some(key);
            Element::Component(comp)
        }
        Element::Fragment(mut frag) => {
            frag.key = Some(key);
            Element::Fragment(frag)
        }
        other => other,
    }
}

/// Build a static attribute.
pub fn attr(name: impl Into<String>, value: impl Into<String>) -> Attribute {
    Attribute::Static {
        name: name.into(),
        value: value.into(),
    }
}

/// Attach an event handler attribute for the given event kind.
pub fn on(kind: impl Into<String>, handler: IdentifiableHandler) -> Attribute {
    Attribute::EventHandler {
        kind: kind.into(),
        handler,
    }
}

/// Build a key attribute; promoted to the node's key during reconciliation.
pub fn key(value: impl Into<String>) -> Attribute {
    Attribute::Key { value: value.into() }
}

/// Compose a space-joined class string, dropping absent entries.
///
/// ```rust,ignore
/// let class = classes(&[Some("base"), active.then_some("bold")]);
/// ```
pub fn classes(names: &[Option<&str>]) -> String {
    names.iter().flatten().copied().collect::<Vec<_>>().join(" ")
}

/// A value that can be compared structurally without knowing its type.
///
/// Used for hook dependency values and anywhere else the tree stores
/// heterogeneous data that still needs equality.
pub trait AnyValue: Send + Sync {
    fn any_cmp(&self, other: &dyn AnyValue) -> bool;
    fn our_typeid(&self) -> TypeId;
    fn as_any(&self) -> &dyn Any;
}

impl<T: PartialEq + Send + Sync + 'static> AnyValue for T {
    fn any_cmp(&self, other: &dyn AnyValue) -> bool {
        if self.our_typeid() != other.our_typeid() {
            return false;
        }
        other
            .as_any()
            .downcast_ref::<T>()
            .map(|other| self == other)
            .unwrap_or(false)
    }

    fn our_typeid(&self) -> TypeId {
        TypeId::of::<T>()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classes_drops_absent_entries() {
        assert_eq!(classes(&[Some("base"), None, Some("bold")]), "base bold");
        assert_eq!(classes(&[None, None]), "");
    }

    #[test]
    fn key_attribute_is_promoted() {
        let node = el("li", vec![key("row-1")], vec![]);
        assert_eq!(node.key(), Some("row-1"));
    }

    #[test]
    fn keyed_wraps_components_and_fragments() {
        assert_eq!(keyed("a", fragment(vec![])).key(), Some("a"));
        assert_eq!(keyed("b", text("plain")).key(), None);
    }

    #[test]
    fn any_cmp_is_structural_and_typed() {
        let a: Arc<dyn AnyValue> = Arc::new(3_i64);
        let b: Arc<dyn AnyValue> = Arc::new(3_i64);
        let c: Arc<dyn AnyValue> = Arc::new("3".to_string());
        assert!(a.any_cmp(b.as_ref()));
        assert!(!a.any_cmp(c.as_ref()));
    }
}
