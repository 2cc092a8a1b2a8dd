//! Structural diffs between two reconciled trees.
//!
//! A patch is the wire-friendly delta a client applies to its copy of the
//! previous tree to obtain the next one. The contract is exact:
//! `apply(a, create(a, b))` is structurally equal to `b`, and
//! `create(a, a)` is [`Patch::NoOp`].

use crate::reconciled::{AttributeKey, NodeKind, Reconciled, ReconciledAttribute};
use rustc_hash::FxHashMap;

/// One node's worth of difference between two renders.
#[derive(Clone, Debug, PartialEq)]
pub enum Patch {
    /// The node is unchanged, children included.
    NoOp,
    /// Same node, changed content: an attribute delta and/or per-index
    /// child patches.
    Update {
        attributes: Option<Vec<AttributePatch>>,
        children: Option<Vec<(usize, Patch)>>,
    },
    /// Full subtree replacement; emitted on any variant, tag, or key
    /// mismatch.
    Replace(Reconciled),
    /// A child appearing at an index past the previous child count.
    Insert(Reconciled),
    /// A child index dropped from the tail of the previous child list.
    Remove,
    /// A keyed child that changed position. Sits at its destination index;
    /// `from` names the slot it occupied in the previous render, and the
    /// nested patch applies to the moved node itself.
    Move { from: usize, patch: Box<Patch> },
}

/// Delta for a single attribute slot, addressed by [`AttributeKey`].
#[derive(Clone, Debug, PartialEq)]
pub enum AttributePatch {
    Set(ReconciledAttribute),
    Remove { key: AttributeKey },
}

impl Patch {
    pub fn is_noop(&self) -> bool {
        matches!(self, Patch::NoOp)
    }
}

/// Diff two reconciled trees.
pub fn create(prev: &Reconciled, next: &Reconciled) -> Patch {
    match (prev, next) {
        (Reconciled::Text(a), Reconciled::Text(b)) => {
            if a.text == b.text {
                Patch::NoOp
            } else {
                Patch::Replace(next.clone())
            }
        }

        (Reconciled::Element(a), Reconciled::Element(b)) if a.tag == b.tag && a.key == b.key => {
            update_or_noop(
                diff_attributes(&a.attributes, &b.attributes),
                diff_children(&a.children, &b.children),
            )
        }

        // Matching components are transparent: descend into their single
        // child, expressed as the patch for child index 0.
        (Reconciled::Component(a), Reconciled::Component(b))
            if a.fn_id == b.fn_id && a.key == b.key =>
        {
            match create(&a.child, &b.child) {
                Patch::NoOp => Patch::NoOp,
                inner => Patch::Update {
                    attributes: None,
                    children: Some(vec![(0, inner)]),
                },
            }
        }

        (Reconciled::Fragment(a), Reconciled::Fragment(b)) if a.key == b.key => {
            update_or_noop(None, diff_children(&a.children, &b.children))
        }

        _ => Patch::Replace(next.clone()),
    }
}

fn update_or_noop(
    attributes: Option<Vec<AttributePatch>>,
    children: Option<Vec<(usize, Patch)>>,
) -> Patch {
    if attributes.is_none() && children.is_none() {
        Patch::NoOp
    } else {
        Patch::Update {
            attributes,
            children,
        }
    }
}

fn diff_attributes(
    prev: &[ReconciledAttribute],
    next: &[ReconciledAttribute],
) -> Option<Vec<AttributePatch>> {
    let mut remaining: FxHashMap<AttributeKey, &ReconciledAttribute> =
        prev.iter().map(|attr| (attr.key(), attr)).collect();

    let mut patches = Vec::new();
    for attr in next {
        match remaining.remove(&attr.key()) {
            Some(old) if old == attr => {}
            _ => patches.push(AttributePatch::Set(attr.clone())),
        }
    }
    patches.extend(
        remaining
            .into_keys()
            .map(|key| AttributePatch::Remove { key }),
    );

    if patches.is_empty() {
        None
    } else {
        Some(patches)
    }
}

fn diff_children(prev: &[Reconciled], next: &[Reconciled]) -> Option<Vec<(usize, Patch)>> {
    let mut keyed: FxHashMap<(NodeKind, &str), usize> = FxHashMap::default();
    for (index, previous) in prev.iter().enumerate() {
        if let Some(key) = previous.key() {
            keyed.insert((previous.kind(), key), index);
        }
    }

    let mut ops = Vec::new();
    for (index, child) in next.iter().enumerate() {
        let keyed_match = child
            .key()
            .and_then(|key| keyed.get(&(child.kind(), key)).copied());
        match keyed_match {
            Some(from) if from != index => ops.push((
                index,
                Patch::Move {
                    from,
                    patch: Box::new(create(&prev[from], child)),
                },
            )),
            Some(from) => {
                let patch = create(&prev[from], child);
                if !patch.is_noop() {
                    ops.push((index, patch));
                }
            }
            None if index < prev.len() => {
                let patch = create(&prev[index], child);
                if !patch.is_noop() {
                    ops.push((index, patch));
                }
            }
            None => ops.push((index, Patch::Insert(child.clone()))),
        }
    }
    for index in next.len()..prev.len() {
        ops.push((index, Patch::Remove));
    }

    if ops.is_empty() {
        None
    } else {
        Some(ops)
    }
}

/// Apply a patch to the tree it was created from. This is the reference
/// implementation of the client's reapply rule, and what keeps the
/// round-trip contract testable on the server.
pub fn apply(prev: &Reconciled, patch: &Patch) -> Reconciled {
    match patch {
        Patch::NoOp => prev.clone(),
        Patch::Replace(node) | Patch::Insert(node) => node.clone(),
        // Positioned ops are resolved by the parent in `apply_children`;
        // at node level there is nothing to do.
        Patch::Remove | Patch::Move { .. } => prev.clone(),
        Patch::Update {
            attributes,
            children,
        } => match prev {
            Reconciled::Element(el) => {
                let mut el = el.clone();
                if let Some(patches) = attributes {
                    apply_attributes(&mut el.attributes, patches);
                }
                if let Some(ops) = children {
                    el.children = apply_children(&el.children, ops);
                }
                Reconciled::Element(el)
            }
            Reconciled::Component(comp) => {
                let mut comp = comp.clone();
                if let Some(ops) = children {
                    if let Some((_, inner)) = ops.first() {
                        comp.child = Box::new(apply(&comp.child, inner));
                    }
                }
                Reconciled::Component(comp)
            }
            Reconciled::Fragment(frag) => {
                let mut frag = frag.clone();
                if let Some(ops) = children {
                    frag.children = apply_children(&frag.children, ops);
                }
                Reconciled::Fragment(frag)
            }
            Reconciled::Text(text) => Reconciled::Text(text.clone()),
        },
    }
}

fn apply_children(prev: &[Reconciled], ops: &[(usize, Patch)]) -> Vec<Reconciled> {
    let by_index: FxHashMap<usize, &Patch> =
        ops.iter().map(|(index, patch)| (*index, patch)).collect();

    let remove_from = ops
        .iter()
        .filter(|(_, patch)| matches!(patch, Patch::Remove))
        .map(|(index, _)| *index)
        .min();
    let highest = ops
        .iter()
        .filter(|(_, patch)| !matches!(patch, Patch::Remove))
        .map(|(index, _)| index + 1)
        .max()
        .unwrap_or(0);
    let new_len = remove_from.unwrap_or_else(|| prev.len().max(highest));

    (0..new_len)
        .map(|index| match by_index.get(&index) {
            None => prev[index].clone(),
            Some(Patch::Move { from, patch }) => apply(&prev[*from], patch),
            Some(Patch::Insert(node)) | Some(Patch::Replace(node)) => node.clone(),
            Some(patch) => apply(&prev[index], patch),
        })
        .collect()
}

fn apply_attributes(attributes: &mut Vec<ReconciledAttribute>, patches: &[AttributePatch]) {
    for patch in patches {
        match patch {
            AttributePatch::Set(attr) => {
                match attributes.iter_mut().find(|a| a.key() == attr.key()) {
                    Some(slot) => *slot = attr.clone(),
                    None => attributes.push(attr.clone()),
                }
            }
            AttributePatch::Remove { key } => attributes.retain(|a| a.key() != *key),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cuid::cuid_source;
    use crate::reconciled::{ReconciledElement, ReconciledFragment, ReconciledText};

    fn el(tag: &str, key: Option<&str>, children: Vec<Reconciled>) -> Reconciled {
        Reconciled::Element(ReconciledElement {
            tag: tag.into(),
            key: key.map(str::to_string),
            attributes: vec![],
            children,
        })
    }

    fn txt(text: &str) -> Reconciled {
        Reconciled::Text(ReconciledText { text: text.into() })
    }

    #[test]
    fn identical_trees_diff_to_noop() {
        let tree = el("div", None, vec![txt("hello"), el("span", None, vec![])]);
        assert_eq!(create(&tree, &tree.clone()), Patch::NoOp);
    }

    #[test]
    fn text_change_round_trips() {
        let a = el("a", None, vec![txt("One")]);
        let b = el("a", None, vec![txt("Two")]);
        let patch = create(&a, &b);
        assert!(matches!(
            &patch,
            Patch::Update { attributes: None, children: Some(ops) } if ops.len() == 1 && ops[0].0 == 0
        ));
        assert_eq!(apply(&a, &patch), b);
    }

    #[test]
    fn attribute_add_remove_and_replace_round_trip() {
        let a = Reconciled::Element(ReconciledElement {
            tag: "div".into(),
            key: None,
            attributes: vec![
                ReconciledAttribute::Static { name: "class".into(), value: "old".into() },
                ReconciledAttribute::Static { name: "id".into(), value: "root".into() },
            ],
            children: vec![],
        });
        let b = Reconciled::Element(ReconciledElement {
            tag: "div".into(),
            key: None,
            attributes: vec![
                ReconciledAttribute::Static { name: "class".into(), value: "new".into() },
                ReconciledAttribute::Static { name: "href".into(), value: "#".into() },
            ],
            children: vec![],
        });
        assert_eq!(apply(&a, &create(&a, &b)), b);
    }

    #[test]
    fn event_handler_delta_compares_kind_and_id() {
        let id_a = cuid_source().next();
        let id_b = cuid_source().next();
        let with = |id: &crate::cuid::Cuid| {
            Reconciled::Element(ReconciledElement {
                tag: "button".into(),
                key: None,
                attributes: vec![ReconciledAttribute::EventHandler {
                    kind: "click".into(),
                    id: id.clone(),
                }],
                children: vec![],
            })
        };
        assert_eq!(create(&with(&id_a), &with(&id_a)), Patch::NoOp);
        let patch = create(&with(&id_a), &with(&id_b));
        assert_eq!(apply(&with(&id_a), &patch), with(&id_b));
    }

    #[test]
    fn keyed_reorder_emits_moves_and_round_trips() {
        let a = el(
            "ul",
            None,
            vec![
                el("li", Some("x"), vec![txt("x")]),
                el("li", Some("y"), vec![txt("y")]),
                el("li", Some("z"), vec![txt("z")]),
            ],
        );
        let b = el(
            "ul",
            None,
            vec![
                el("li", Some("z"), vec![txt("z")]),
                el("li", Some("x"), vec![txt("x")]),
                el("li", Some("y"), vec![txt("y")]),
            ],
        );
        let patch = create(&a, &b);
        let Patch::Update { children: Some(ops), .. } = &patch else {
            panic!("expected child ops, got {patch:?}");
        };
        assert!(ops
            .iter()
            .any(|(_, p)| matches!(p, Patch::Move { .. })));
        assert_eq!(apply(&a, &patch), b);
    }

    #[test]
    fn insert_and_remove_round_trip() {
        let shorter = el("div", None, vec![txt("a")]);
        let longer = el("div", None, vec![txt("a"), txt("b"), txt("c")]);
        assert_eq!(apply(&shorter, &create(&shorter, &longer)), longer);
        assert_eq!(apply(&longer, &create(&longer, &shorter)), shorter);
    }

    #[test]
    fn variant_mismatch_replaces() {
        let a = el("div", None, vec![]);
        let b = Reconciled::Fragment(ReconciledFragment { key: None, children: vec![] });
        assert!(matches!(create(&a, &b), Patch::Replace(_)));
    }

    #[test]
    fn keyed_list_truncation_round_trips() {
        let a = el(
            "ul",
            None,
            vec![
                el("li", Some("x"), vec![]),
                el("li", Some("y"), vec![]),
            ],
        );
        let b = el("ul", None, vec![el("li", Some("y"), vec![])]);
        assert_eq!(apply(&a, &create(&a, &b)), b);
    }
}
