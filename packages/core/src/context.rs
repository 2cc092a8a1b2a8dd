//! The per-render cursor threaded through every component function.
//!
//! A [`Context`] belongs to exactly one runtime. It carries the root view,
//! the provider bindings visible to the subtree currently being reconciled,
//! the handlers recorded this pass, and the hook cursor for the component
//! currently rendering. Everything in here is reset by
//! [`Context::prepare_for_reconciliation`] except the view and the channel
//! back to the runtime.

use crate::cuid::{cuid_source, Cuid, CuidSource};
use crate::events::{Dispatcher, IdentifiableHandler};
use crate::hooks::{Hook, HookVariant};
use crate::nodes::{Element, ProviderValue};
use crate::runtime::RuntimeMessage;
use indexmap::IndexMap;
use rustc_hash::FxHashMap;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;

/// Applied by the runtime to the hook with a matching id.
pub type HookUpdateFn = Box<dyn FnOnce(Hook) -> Hook + Send>;

/// A cheap handle for scheduling work on the owning runtime.
///
/// Cloned into every setter and dispatch closure handed out by hooks. Both
/// operations enqueue mailbox messages, so a setter fired from inside an
/// effect runs after the in-flight reconciliation completes.
#[derive(Clone)]
pub struct Scheduler {
    tx: UnboundedSender<RuntimeMessage>,
}

impl Scheduler {
    pub(crate) fn new(tx: UnboundedSender<RuntimeMessage>) -> Self {
        Self { tx }
    }

    /// Schedule a re-render.
    pub fn schedule_render(&self) {
        let _ = self.tx.send(RuntimeMessage::RenderUpdate);
    }

    /// Post a mutation for the hook with the given id.
    pub fn post_hook_update(&self, id: Cuid, update: HookUpdateFn) {
        let _ = self.tx.send(RuntimeMessage::UpdateHookState { id, update });
    }
}

pub(crate) const HOOK_VARIANT_ERR: &str = r#"
A hook changed variant between renders at the same call index.
Hooks rely on consistent call ordering: functions prefixed with "use" must
not be called conditionally or in loops with varying iteration counts.
"#;

pub(crate) const HOOK_COUNT_ERR: &str = r#"
A component used a different number of hooks than it did on its previous
render. Hooks rely on consistent call ordering: functions prefixed with
"use" must not be called conditionally.
"#;

/// The ordered hook storage for the component currently rendering.
#[derive(Default)]
pub(crate) struct HookCursor {
    hooks: IndexMap<usize, Hook>,
    index: usize,
    /// Hook count carried over from the previous render of this component,
    /// if the component instance persisted.
    baseline: Option<usize>,
}

/// The result of advancing the hook cursor by one slot.
pub struct FetchedHook {
    pub index: usize,
    pub hook: Hook,
    /// True when the hook was created by this call rather than carried over.
    pub fresh: bool,
}

/// The render cursor handed to every component function.
pub struct Context {
    pub(crate) view: Element,
    cuids: &'static CuidSource,
    providers: FxHashMap<String, ProviderValue>,
    handlers: Vec<IdentifiableHandler>,
    scheduler: Scheduler,
    cursor: HookCursor,
    client_dispatcher: Option<Arc<dyn Dispatcher>>,
}

impl Context {
    pub(crate) fn new(
        view: Element,
        scheduler: Scheduler,
        client_dispatcher: Option<Arc<dyn Dispatcher>>,
    ) -> Self {
        Self {
            view,
            cuids: cuid_source(),
            providers: FxHashMap::default(),
            handlers: Vec::new(),
            scheduler,
            cursor: HookCursor::default(),
            client_dispatcher,
        }
    }

    /// Clear the per-pass state ahead of a reconciliation.
    pub(crate) fn prepare_for_reconciliation(&mut self) {
        self.handlers.clear();
        self.providers.clear();
        self.cursor = HookCursor::default();
    }

    /// The channel back to the owning runtime.
    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    /// Schedule a re-render on the owning runtime.
    pub fn schedule_render(&self) {
        self.scheduler.schedule_render();
    }

    pub(crate) fn client_dispatcher(&self) -> Option<Arc<dyn Dispatcher>> {
        self.client_dispatcher.clone()
    }

    pub(crate) fn record_handler(&mut self, handler: IdentifiableHandler) {
        self.handlers.push(handler);
    }

    /// The handlers recorded by the most recent reconciliation pass.
    pub(crate) fn handlers(&self) -> &[IdentifiableHandler] {
        &self.handlers
    }

    pub(crate) fn provider_value(&self, key: &str) -> Option<ProviderValue> {
        self.providers.get(key).cloned()
    }

    /// Bind a provider value for a subtree. Returns the previous bindings;
    /// the caller restores them with [`Context::restore_providers`] once the
    /// subtree is reconciled, so an early exit cannot leak a binding into
    /// sibling subtrees.
    pub(crate) fn enter_provider(
        &mut self,
        key: String,
        value: ProviderValue,
    ) -> FxHashMap<String, ProviderValue> {
        let saved = self.providers.clone();
        self.providers.insert(key, value);
        saved
    }

    pub(crate) fn restore_providers(&mut self, saved: FxHashMap<String, ProviderValue>) {
        self.providers = saved;
    }

    /// Fetch the hook at the current cursor index, initialising it with a
    /// fresh id if this is the first render to reach this slot. Advances
    /// the cursor.
    ///
    /// This is the foundational operation every `use_*` function builds on.
    /// A variant mismatch against the carried-over hook is a fatal usage
    /// error.
    pub fn fetch_or_init_hook(
        &mut self,
        variant: HookVariant,
        init: impl FnOnce(Cuid) -> Hook,
    ) -> FetchedHook {
        let index = self.cursor.index;
        self.cursor.index += 1;
        match self.cursor.hooks.get(&index) {
            Some(existing) => {
                if existing.variant() != variant {
                    panic!(
                        "{HOOK_VARIANT_ERR}\nexpected {variant:?} at hook index {index}, found {:?}",
                        existing.variant()
                    );
                }
                FetchedHook {
                    index,
                    hook: existing.clone(),
                    fresh: false,
                }
            }
            None => {
                let hook = init(self.cuids.next());
                self.cursor.hooks.insert(index, hook.clone());
                FetchedHook {
                    index,
                    hook,
                    fresh: true,
                }
            }
        }
    }

    /// Replace the hook stored at a known index, keeping its id.
    ///
    /// Used by hooks that record a new closure every render without
    /// allocating a new identity.
    pub fn replace_hook(&mut self, index: usize, hook: Hook) {
        self.cursor.hooks.insert(index, hook);
    }

    /// Install `baseline` as the hook storage for a component about to
    /// render, returning the enclosing component's cursor.
    pub(crate) fn begin_component(
        &mut self,
        baseline: Option<IndexMap<usize, Hook>>,
    ) -> HookCursor {
        let carried = baseline.as_ref().map(IndexMap::len);
        std::mem::replace(
            &mut self.cursor,
            HookCursor {
                hooks: baseline.unwrap_or_default(),
                index: 0,
                baseline: carried,
            },
        )
    }

    /// Collect the hooks used by the component that just rendered and
    /// restore the enclosing cursor. Detects hook-count drift against the
    /// previous render of the same component instance.
    pub(crate) fn end_component(&mut self, enclosing: HookCursor) -> IndexMap<usize, Hook> {
        let finished = std::mem::replace(&mut self.cursor, enclosing);
        if let Some(carried) = finished.baseline {
            if finished.index != carried {
                panic!(
                    "{HOOK_COUNT_ERR}\nprevious render used {carried} hooks, this render used {}",
                    finished.index
                );
            }
        }
        finished.hooks
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nodes::text;
    use std::sync::Arc;

    fn test_context() -> Context {
        let (tx, _rx) = tokio::sync::mpsc::unbounded_channel();
        Context::new(text("root"), Scheduler::new(tx), None)
    }

    fn state_hook(value: i32) -> impl FnOnce(Cuid) -> Hook {
        move |id| Hook::State {
            id,
            value: Arc::new(value),
        }
    }

    #[test]
    fn hooks_keep_their_ids_between_renders() {
        let mut ctx = test_context();

        let enclosing = ctx.begin_component(None);
        let first = ctx.fetch_or_init_hook(HookVariant::State, state_hook(1));
        assert!(first.fresh);
        let hooks = ctx.end_component(enclosing);

        let enclosing = ctx.begin_component(Some(hooks));
        let second = ctx.fetch_or_init_hook(HookVariant::State, state_hook(2));
        ctx.end_component(enclosing);

        assert!(!second.fresh);
        assert_eq!(first.hook.id(), second.hook.id());
    }

    #[test]
    #[should_panic]
    fn variant_drift_between_renders_is_fatal() {
        let mut ctx = test_context();

        let enclosing = ctx.begin_component(None);
        ctx.fetch_or_init_hook(HookVariant::State, state_hook(1));
        let hooks = ctx.end_component(enclosing);

        let _enclosing = ctx.begin_component(Some(hooks));
        ctx.fetch_or_init_hook(HookVariant::Memo, |id| Hook::Memo {
            id,
            value: Arc::new(1),
            deps: None,
        });
    }

    #[test]
    #[should_panic]
    fn hook_count_drift_between_renders_is_fatal() {
        let mut ctx = test_context();

        let enclosing = ctx.begin_component(None);
        ctx.fetch_or_init_hook(HookVariant::State, state_hook(1));
        ctx.fetch_or_init_hook(HookVariant::State, state_hook(2));
        let hooks = ctx.end_component(enclosing);

        let enclosing = ctx.begin_component(Some(hooks));
        ctx.fetch_or_init_hook(HookVariant::State, state_hook(1));
        ctx.end_component(enclosing);
    }
}
