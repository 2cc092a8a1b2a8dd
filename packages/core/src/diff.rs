//! The reconciler: diffs an element tree against the previous reconciled
//! tree, threading hook state through matched components.
//!
//! Reconciliation is strictly pre-order and left-to-right, so hook indices
//! inside a component advance in source order. Siblings pair by
//! `(variant, key)` where keys are present; unkeyed siblings pair
//! positionally among peers of the same variant. Anything unmatched from
//! the previous render is discarded, and its hooks are cleaned up by the
//! disposal pass that follows reconciliation.

use crate::context::Context;
use crate::hooks::{compare_deps, DepsDiff, EffectFn, EffectResult, Hook, Trigger};
use crate::nodes::{Attribute, Element, VFragment};
use crate::reconciled::{
    NodeKind, Reconciled, ReconciledAttribute, ReconciledComponent, ReconciledElement,
    ReconciledFragment, ReconciledText,
};
use rustc_hash::{FxHashMap, FxHashSet};
use std::collections::VecDeque;

/// Reconcile `element` against the node that previously occupied the same
/// position, producing the realised node for this render.
pub fn reconcile(ctx: &mut Context, element: &Element, prev: Option<&Reconciled>) -> Reconciled {
    match element {
        Element::Text(text) => Reconciled::Text(ReconciledText {
            text: text.text.clone(),
        }),

        Element::Element(el) => {
            let key = element.key().map(str::to_string);
            let prev_el = match prev {
                Some(Reconciled::Element(p))
                    if p.tag == el.tag && p.key.as_deref() == key.as_deref() =>
                {
                    Some(p)
                }
                _ => None,
            };
            // Attributes are rebuilt from the new element every pass; event
            // handler ids come from the hook system, never from the old tree.
            let attributes = build_attributes(&el.attributes);
            let children =
                reconcile_children(ctx, &el.children, prev_el.map(|p| p.children.as_slice()));
            Reconciled::Element(ReconciledElement {
                tag: el.tag.clone(),
                key,
                attributes,
                children,
            })
        }

        Element::Fragment(frag) => {
            let prev_frag = match prev {
                Some(Reconciled::Fragment(p)) if p.key.as_deref() == frag.key.as_deref() => Some(p),
                _ => None,
            };
            let children =
                reconcile_children(ctx, &frag.children, prev_frag.map(|p| p.children.as_slice()));
            Reconciled::Fragment(ReconciledFragment {
                key: frag.key.clone(),
                children,
            })
        }

        // Providers are transparent in the reconciled tree: the binding is
        // visible while the subtree reconciles and is restored afterwards.
        Element::Provider(provider) => {
            let saved = ctx.enter_provider(provider.key.clone(), provider.value.clone());
            let reconciled = reconcile(ctx, &provider.child, prev);
            ctx.restore_providers(saved);
            reconciled
        }

        Element::Component(comp) => {
            let (baseline, prev_child) = match prev {
                Some(Reconciled::Component(p)) if p.fn_id == comp.fn_id && p.key == comp.key => {
                    (Some(p.hooks.clone()), Some(&*p.child))
                }
                _ => (None, None),
            };
            let enclosing = ctx.begin_component(baseline);
            let children = (*comp.render)(ctx, comp.props.as_ref());
            let hooks = ctx.end_component(enclosing);

            // A component rendering multiple nodes reconciles as a fragment.
            let child_element = match children.len() {
                1 => children.into_iter().next().unwrap(),
                _ => Element::Fragment(VFragment {
                    key: None,
                    children,
                }),
            };
            let child = reconcile(ctx, &child_element, prev_child);

            Reconciled::Component(ReconciledComponent {
                fn_id: comp.fn_id,
                render: comp.render.clone(),
                key: comp.key.clone(),
                props: comp.props.clone(),
                hooks,
                child: Box::new(child),
            })
        }
    }
}

fn build_attributes(attributes: &[Attribute]) -> Vec<ReconciledAttribute> {
    attributes
        .iter()
        .filter_map(|attribute| match attribute {
            Attribute::Static { name, value } => Some(ReconciledAttribute::Static {
                name: name.clone(),
                value: value.clone(),
            }),
            Attribute::EventHandler { kind, handler } => Some(ReconciledAttribute::EventHandler {
                kind: kind.clone(),
                id: handler.id.clone(),
            }),
            Attribute::ClientHook { id, name } => Some(ReconciledAttribute::ClientHook {
                name: name.clone(),
                id: id.clone(),
            }),
            // Lifted onto the node itself.
            Attribute::Key { .. } => None,
        })
        .collect()
}

fn element_kind(element: &Element) -> NodeKind {
    match element {
        Element::Element(_) => NodeKind::Element,
        Element::Component(_) => NodeKind::Component,
        Element::Fragment(_) => NodeKind::Fragment,
        Element::Text(_) => NodeKind::Text,
        Element::Provider(provider) => element_kind(&provider.child),
    }
}

fn reconcile_children(
    ctx: &mut Context,
    new: &[Element],
    prev: Option<&[Reconciled]>,
) -> Vec<Reconciled> {
    let prev = prev.unwrap_or(&[]);

    let mut keyed: FxHashMap<(NodeKind, &str), &Reconciled> = FxHashMap::default();
    let mut unkeyed: FxHashMap<NodeKind, VecDeque<&Reconciled>> = FxHashMap::default();
    for previous in prev {
        match previous.key() {
            Some(key) => {
                keyed.insert((previous.kind(), key), previous);
            }
            None => unkeyed
                .entry(previous.kind())
                .or_default()
                .push_back(previous),
        }
    }

    new.iter()
        .map(|child| {
            let kind = element_kind(child);
            let matched = match child.key() {
                Some(key) => keyed.remove(&(kind, key)),
                None => unkeyed.get_mut(&kind).and_then(VecDeque::pop_front),
            };
            reconcile(ctx, child, matched)
        })
        .collect()
}

/// Run the post-reconciliation effect pass over a freshly reconciled tree.
///
/// Each effect hook consults its trigger and the deps it last ran with; a
/// re-running effect calls its previous cleanup first.
pub(crate) fn run_effects(node: &mut Reconciled) {
    match node {
        Reconciled::Element(el) => el.children.iter_mut().for_each(run_effects),
        Reconciled::Fragment(frag) => frag.children.iter_mut().for_each(run_effects),
        Reconciled::Text(_) => {}
        Reconciled::Component(comp) => {
            for hook in comp.hooks.values_mut() {
                if let Hook::Effect {
                    f, trigger, prev, ..
                } = hook
                {
                    run_effect(f, trigger, prev);
                }
            }
            run_effects(&mut comp.child);
        }
    }
}

fn run_effect(f: &EffectFn, trigger: &Trigger, prev: &mut Option<EffectResult>) {
    match trigger {
        Trigger::OnMount => {
            if prev.is_none() {
                *prev = Some(EffectResult {
                    cleanup: (**f)(),
                    deps: Some(Vec::new()),
                });
            }
        }
        Trigger::OnUpdate => {
            run_prev_cleanup(prev);
            *prev = Some(EffectResult {
                cleanup: (**f)(),
                deps: None,
            });
        }
        Trigger::WithDeps(next) => {
            let rerun = match prev.as_ref() {
                None => true,
                Some(result) => match &result.deps {
                    None => true,
                    Some(old) => matches!(compare_deps(old, next), DepsDiff::Changed),
                },
            };
            if rerun {
                run_prev_cleanup(prev);
                *prev = Some(EffectResult {
                    cleanup: (**f)(),
                    deps: Some(next.clone()),
                });
            }
        }
    }
}

fn run_prev_cleanup(prev: &mut Option<EffectResult>) {
    if let Some(result) = prev.take() {
        if let Some(cleanup) = result.cleanup {
            (*cleanup)();
        }
    }
}

/// Run cleanups for every hook that existed in `prev` but not in `next`.
///
/// This runs before the effect pass so a replaced effect never overlaps
/// with its successor's resources.
pub(crate) fn run_disposed_cleanups(prev: &Reconciled, next: &Reconciled) {
    let mut surviving = FxHashSet::default();
    next.collect_hook_ids(&mut surviving);

    let mut previous_hooks = Vec::new();
    prev.collect_hooks(&mut previous_hooks);

    for hook in &previous_hooks {
        if !surviving.contains(hook.id()) {
            dispose_hook(hook);
        }
    }
}

/// Run every cleanup in the tree; used on runtime shutdown.
pub(crate) fn run_all_cleanups(tree: &Reconciled) {
    let mut hooks = Vec::new();
    tree.collect_hooks(&mut hooks);
    for hook in &hooks {
        dispose_hook(hook);
    }
}

fn dispose_hook(hook: &Hook) {
    match hook {
        Hook::Effect {
            id,
            prev: Some(result),
            ..
        } => {
            if let Some(cleanup) = &result.cleanup {
                tracing::trace!(hook = %id, "running effect cleanup");
                (**cleanup)();
            }
        }
        Hook::Reducer { id, cell } => {
            tracing::trace!(hook = %id, "shutting down reducer");
            cell.shutdown();
        }
        _ => {}
    }
}
