//! The realised tree produced by reconciliation.
//!
//! Unlike [`Element`](crate::nodes::Element)s, reconciled nodes persist
//! across renders: a component node keeps its ordered hook map for as long
//! as the same component function occupies the same position. The tree is
//! cheaply cloneable so the runtime can hold the previous render alive
//! while building the next one and diffing the two.

use crate::context::HookUpdateFn;
use crate::cuid::Cuid;
use crate::hooks::{ClientEventFn, Hook};
use crate::nodes::{Props, RenderFn};
use indexmap::IndexMap;
use rustc_hash::FxHashSet;
use std::fmt;

#[derive(Clone, Debug)]
pub enum Reconciled {
    Element(ReconciledElement),
    Component(ReconciledComponent),
    Fragment(ReconciledFragment),
    Text(ReconciledText),
}

#[derive(Clone, Debug)]
pub struct ReconciledElement {
    pub tag: String,
    pub key: Option<String>,
    pub attributes: Vec<ReconciledAttribute>,
    pub children: Vec<Reconciled>,
}

#[derive(Clone)]
pub struct ReconciledComponent {
    pub(crate) fn_id: usize,
    pub(crate) render: RenderFn,
    pub key: Option<String>,
    pub(crate) props: Props,
    pub hooks: IndexMap<usize, Hook>,
    pub child: Box<Reconciled>,
}

#[derive(Clone, Debug)]
pub struct ReconciledFragment {
    pub key: Option<String>,
    pub children: Vec<Reconciled>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReconciledText {
    pub text: String,
}

/// An attribute as the client will see it.
#[derive(Clone, Debug, PartialEq)]
pub enum ReconciledAttribute {
    Static { name: String, value: String },
    EventHandler { kind: String, id: Cuid },
    ClientHook { name: String, id: Cuid },
}

/// Names an attribute slot for diffing: static attributes by name, event
/// handlers by event kind, client hooks by hook name.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum AttributeKey {
    Static { name: String },
    EventHandler { kind: String },
    ClientHook { name: String },
}

impl ReconciledAttribute {
    pub fn key(&self) -> AttributeKey {
        match self {
            ReconciledAttribute::Static { name, .. } => AttributeKey::Static { name: name.clone() },
            ReconciledAttribute::EventHandler { kind, .. } => {
                AttributeKey::EventHandler { kind: kind.clone() }
            }
            ReconciledAttribute::ClientHook { name, .. } => {
                AttributeKey::ClientHook { name: name.clone() }
            }
        }
    }
}

/// Variant tag used when pairing siblings during reconciliation and
/// child-list diffing.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub(crate) enum NodeKind {
    Element,
    Component,
    Fragment,
    Text,
}

impl Reconciled {
    pub fn key(&self) -> Option<&str> {
        match self {
            Reconciled::Element(el) => el.key.as_deref(),
            Reconciled::Component(comp) => comp.key.as_deref(),
            Reconciled::Fragment(frag) => frag.key.as_deref(),
            Reconciled::Text(_) => None,
        }
    }

    pub(crate) fn kind(&self) -> NodeKind {
        match self {
            Reconciled::Element(_) => NodeKind::Element,
            Reconciled::Component(_) => NodeKind::Component,
            Reconciled::Fragment(_) => NodeKind::Fragment,
            Reconciled::Text(_) => NodeKind::Text,
        }
    }

    /// Clone every hook in the tree into `out`, pre-order.
    pub fn collect_hooks(&self, out: &mut Vec<Hook>) {
        match self {
            Reconciled::Element(el) => el.children.iter().for_each(|c| c.collect_hooks(out)),
            Reconciled::Fragment(frag) => frag.children.iter().for_each(|c| c.collect_hooks(out)),
            Reconciled::Component(comp) => {
                out.extend(comp.hooks.values().cloned());
                comp.child.collect_hooks(out);
            }
            Reconciled::Text(_) => {}
        }
    }

    pub fn collect_hook_ids(&self, out: &mut FxHashSet<Cuid>) {
        match self {
            Reconciled::Element(el) => el.children.iter().for_each(|c| c.collect_hook_ids(out)),
            Reconciled::Fragment(frag) => {
                frag.children.iter().for_each(|c| c.collect_hook_ids(out))
            }
            Reconciled::Component(comp) => {
                out.extend(comp.hooks.values().map(|h| h.id().clone()));
                comp.child.collect_hook_ids(out);
            }
            Reconciled::Text(_) => {}
        }
    }

    /// Apply `update` to the state hook with the given id, if it is still
    /// mounted. Hooks of any other variant with that id are left untouched.
    pub(crate) fn update_state_hook(&mut self, id: &Cuid, update: HookUpdateFn) -> bool {
        fn walk(node: &mut Reconciled, id: &Cuid, update: &mut Option<HookUpdateFn>) -> bool {
            match node {
                Reconciled::Element(el) => {
                    el.children.iter_mut().any(|c| walk(c, id, update))
                }
                Reconciled::Fragment(frag) => {
                    frag.children.iter_mut().any(|c| walk(c, id, update))
                }
                Reconciled::Text(_) => false,
                Reconciled::Component(comp) => {
                    for hook in comp.hooks.values_mut() {
                        if hook.id() == id {
                            if matches!(hook, Hook::State { .. }) {
                                if let Some(f) = update.take() {
                                    *hook = f(hook.clone());
                                }
                            }
                            return true;
                        }
                    }
                    walk(&mut comp.child, id, update)
                }
            }
        }
        walk(self, id, &mut Some(update))
    }

    /// Locate a client hook by id.
    pub(crate) fn find_client_hook(&self, id: &Cuid) -> Option<(String, Option<ClientEventFn>)> {
        match self {
            Reconciled::Element(el) => el.children.iter().find_map(|c| c.find_client_hook(id)),
            Reconciled::Fragment(frag) => {
                frag.children.iter().find_map(|c| c.find_client_hook(id))
            }
            Reconciled::Text(_) => None,
            Reconciled::Component(comp) => comp
                .hooks
                .values()
                .find_map(|hook| match hook {
                    Hook::Client {
                        id: hook_id,
                        name,
                        on_event,
                    } if hook_id == id => Some((name.clone(), on_event.clone())),
                    _ => None,
                })
                .or_else(|| comp.child.find_client_hook(id)),
        }
    }
}

impl fmt::Debug for ReconciledComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReconciledComponent")
            .field("fn_id", &self.fn_id)
            .field("key", &self.key)
            .field("hooks", &self.hooks.values().collect::<Vec<_>>())
            .field("child", &self.child)
            .finish()
    }
}

/// Structural equality as a client sees the tree: tags, keys, attributes
/// (order-insensitive), text, and component identity. Hook state and props
/// are invisible on the wire and are not compared.
impl PartialEq for Reconciled {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Reconciled::Element(a), Reconciled::Element(b)) => {
                a.tag == b.tag
                    && a.key == b.key
                    && attributes_eq(&a.attributes, &b.attributes)
                    && a.children == b.children
            }
            (Reconciled::Component(a), Reconciled::Component(b)) => {
                a.fn_id == b.fn_id && a.key == b.key && a.child == b.child
            }
            (Reconciled::Fragment(a), Reconciled::Fragment(b)) => {
                a.key == b.key && a.children == b.children
            }
            (Reconciled::Text(a), Reconciled::Text(b)) => a.text == b.text,
            _ => false,
        }
    }
}

fn attributes_eq(a: &[ReconciledAttribute], b: &[ReconciledAttribute]) -> bool {
    a.len() == b.len() && a.iter().all(|attr| b.contains(attr))
}
