//! The hook library: per-component retained state with stable identities.
//!
//! Hooks are matched by call index within a component, not by call site, so
//! every `use_*` function must run unconditionally and in the same order on
//! every render of a component. Violations are fatal usage errors and shut
//! the runtime down.

use crate::context::Context;
use crate::cuid::Cuid;
use crate::events::{Dispatcher, HandlerFn, IdentifiableHandler};
use crate::nodes::{AnyValue, Attribute};
use crate::reducer::ReducerCell;
use serde_json::Value;
use std::any::Any;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

/// Type-erased hook payload.
pub type HookValue = Arc<dyn Any + Send + Sync>;

/// A cleanup registered by an effect. Invoked exactly once, either before
/// the effect re-runs or when the owning hook is disposed.
pub type Cleanup = Arc<dyn Fn() + Send + Sync>;

/// The body of an effect hook; may hand back a cleanup.
pub type EffectFn = Arc<dyn Fn() -> Option<Cleanup> + Send + Sync>;

/// Invoked when the client pushes an event at a client hook. The dispatcher
/// argument replies towards that client.
pub type ClientEventFn = Arc<dyn Fn(&str, Option<Value>, &dyn Dispatcher) + Send + Sync>;

/// A structurally-comparable dependency value, built with [`deps!`].
pub type Dep = Arc<dyn AnyValue>;

/// Controls when an effect, memo, or callback re-runs.
#[derive(Clone)]
pub enum Trigger {
    /// Run once, on the render that creates the hook.
    OnMount,
    /// Run after every render.
    OnUpdate,
    /// Run when any dependency differs structurally from the previous
    /// render. An empty list behaves like [`Trigger::OnMount`].
    WithDeps(Vec<Dep>),
}

impl fmt::Debug for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Trigger::OnMount => f.write_str("OnMount"),
            Trigger::OnUpdate => f.write_str("OnUpdate"),
            Trigger::WithDeps(deps) => write!(f, "WithDeps(len={})", deps.len()),
        }
    }
}

/// What an effect left behind: its cleanup and the deps it last ran with.
#[derive(Clone)]
pub struct EffectResult {
    pub cleanup: Option<Cleanup>,
    pub deps: Option<Vec<Dep>>,
}

/// Discriminates hook variants for cursor validation.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum HookVariant {
    State,
    Reducer,
    Effect,
    Memo,
    Callback,
    Handler,
    Client,
}

/// A single slot of retained component state.
///
/// The id is allocated once, on the render that creates the hook, and never
/// changes while the component instance persists. Closures stored inside
/// are replaced every render; identity-bearing fields are not.
#[derive(Clone)]
pub enum Hook {
    State {
        id: Cuid,
        value: HookValue,
    },
    Reducer {
        id: Cuid,
        cell: ReducerCell,
    },
    Effect {
        id: Cuid,
        f: EffectFn,
        trigger: Trigger,
        prev: Option<EffectResult>,
    },
    Memo {
        id: Cuid,
        value: HookValue,
        deps: Option<Vec<Dep>>,
    },
    Callback {
        id: Cuid,
        callback: HookValue,
        deps: Option<Vec<Dep>>,
    },
    Handler {
        id: Cuid,
        handler: IdentifiableHandler,
    },
    Client {
        id: Cuid,
        name: String,
        on_event: Option<ClientEventFn>,
    },
}

impl Hook {
    pub fn id(&self) -> &Cuid {
        match self {
            Hook::State { id, .. }
            | Hook::Reducer { id, .. }
            | Hook::Effect { id, .. }
            | Hook::Memo { id, .. }
            | Hook::Callback { id, .. }
            | Hook::Handler { id, .. }
            | Hook::Client { id, .. } => id,
        }
    }

    pub fn variant(&self) -> HookVariant {
        match self {
            Hook::State { .. } => HookVariant::State,
            Hook::Reducer { .. } => HookVariant::Reducer,
            Hook::Effect { .. } => HookVariant::Effect,
            Hook::Memo { .. } => HookVariant::Memo,
            Hook::Callback { .. } => HookVariant::Callback,
            Hook::Handler { .. } => HookVariant::Handler,
            Hook::Client { .. } => HookVariant::Client,
        }
    }
}

impl fmt::Debug for Hook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}({})", self.variant(), self.id())
    }
}

pub(crate) const HOOK_STATE_ERR: &str = r#"
A hook held a value of a different type than the caller expected.
This usually means two different components rendered into the same position
with hooks that line up by index but not by type.
"#;

pub(crate) const DEPS_LEN_ERR: &str = r#"
A hook's dependency list changed length between renders.
Dependency lists must be the same shape on every render; wrap optional
values in Option instead of adding or removing entries.
"#;

pub(crate) enum DepsDiff {
    Unchanged,
    Changed,
}

/// Element-wise structural comparison of two dependency lists.
pub(crate) fn compare_deps(prev: &[Dep], next: &[Dep]) -> DepsDiff {
    if prev.len() != next.len() {
        panic!("{DEPS_LEN_ERR}\nprevious length {}, next length {}", prev.len(), next.len());
    }
    if prev.iter().zip(next).all(|(a, b)| a.any_cmp(b.as_ref())) {
        DepsDiff::Unchanged
    } else {
        DepsDiff::Changed
    }
}

enum Recompute {
    No,
    Yes(Option<Vec<Dep>>),
}

/// Shared dependency-change rule for memo and callback hooks, which decide
/// at render time (effects decide in the post-reconciliation pass).
fn should_recompute(trigger: &Trigger, prev_deps: &Option<Vec<Dep>>) -> Recompute {
    match trigger {
        Trigger::OnMount => Recompute::No,
        Trigger::OnUpdate => Recompute::Yes(None),
        Trigger::WithDeps(next) => match prev_deps {
            None => Recompute::Yes(Some(next.clone())),
            Some(prev) => match compare_deps(prev, next) {
                DepsDiff::Unchanged => Recompute::No,
                DepsDiff::Changed => Recompute::Yes(Some(next.clone())),
            },
        },
    }
}

fn initial_deps(trigger: &Trigger) -> Option<Vec<Dep>> {
    match trigger {
        Trigger::WithDeps(deps) => Some(deps.clone()),
        Trigger::OnMount | Trigger::OnUpdate => None,
    }
}

/// Retain a value across renders and get a setter that schedules a
/// re-render when called.
///
/// The setter posts its mutation to the runtime mailbox, so the new value
/// becomes visible on the render that follows - never mid-pass.
pub fn use_state<T>(ctx: &mut Context, init: impl FnOnce() -> T) -> (Arc<T>, SetState<T>)
where
    T: Send + Sync + 'static,
{
    let fetched = ctx.fetch_or_init_hook(HookVariant::State, |id| Hook::State {
        id,
        value: Arc::new(init()),
    });
    let Hook::State { id, value } = fetched.hook else {
        unreachable!()
    };
    let value = value
        .downcast::<T>()
        .unwrap_or_else(|_| panic!("{HOOK_STATE_ERR}"));
    let setter = SetState {
        id,
        scheduler: ctx.scheduler().clone(),
        _marker: PhantomData,
    };
    (value, setter)
}

/// Replaces the value of a state hook. Identity of the setter itself is not
/// stable across renders; the hook id it targets is.
pub struct SetState<T> {
    id: Cuid,
    scheduler: crate::context::Scheduler,
    _marker: PhantomData<fn(T) -> T>,
}

impl<T> Clone for SetState<T> {
    fn clone(&self) -> Self {
        Self {
            id: self.id.clone(),
            scheduler: self.scheduler.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T: Send + Sync + 'static> SetState<T> {
    pub fn set(&self, value: T) {
        let next: HookValue = Arc::new(value);
        self.scheduler.post_hook_update(
            self.id.clone(),
            Box::new(move |hook| match hook {
                Hook::State { id, .. } => Hook::State { id, value: next },
                other => other,
            }),
        );
        self.scheduler.schedule_render();
    }

    /// Replace the value as a function of the one committed to the tree.
    pub fn update(&self, f: impl FnOnce(&T) -> T + Send + 'static) {
        self.scheduler.post_hook_update(
            self.id.clone(),
            Box::new(move |hook| match hook {
                Hook::State { id, value } => {
                    let next: HookValue = match value.downcast_ref::<T>() {
                        Some(current) => Arc::new(f(current)),
                        None => value.clone(),
                    };
                    Hook::State { id, value: next }
                }
                other => other,
            }),
        );
        self.scheduler.schedule_render();
    }
}

/// Run a side effect after reconciliation, controlled by `trigger`.
///
/// The effect body may return a cleanup; it runs before the effect re-runs
/// and when the hook is disposed.
pub fn use_effect(
    ctx: &mut Context,
    f: impl Fn() -> Option<Cleanup> + Send + Sync + 'static,
    trigger: Trigger,
) {
    let f: EffectFn = Arc::new(f);
    let fetched = ctx.fetch_or_init_hook(HookVariant::Effect, {
        let f = f.clone();
        let trigger = trigger.clone();
        move |id| Hook::Effect {
            id,
            f,
            trigger,
            prev: None,
        }
    });
    let Hook::Effect { id, prev, .. } = fetched.hook else {
        unreachable!()
    };
    ctx.replace_hook(
        fetched.index,
        Hook::Effect {
            id,
            f,
            trigger,
            prev,
        },
    );
}

/// Wrap an effect cleanup closure.
pub fn cleanup(f: impl Fn() + Send + Sync + 'static) -> Option<Cleanup> {
    Some(Arc::new(f))
}

/// Retain a computed value, recomputing per `trigger`.
pub fn use_memo<T>(ctx: &mut Context, f: impl Fn() -> T, trigger: Trigger) -> Arc<T>
where
    T: Send + Sync + 'static,
{
    let fetched = ctx.fetch_or_init_hook(HookVariant::Memo, |id| Hook::Memo {
        id,
        value: Arc::new(f()),
        deps: initial_deps(&trigger),
    });
    let Hook::Memo { id, value, deps } = fetched.hook else {
        unreachable!()
    };
    let (value, deps) = if fetched.fresh {
        (value, deps)
    } else {
        match should_recompute(&trigger, &deps) {
            Recompute::No => (value, deps),
            Recompute::Yes(new_deps) => (Arc::new(f()) as HookValue, new_deps),
        }
    };
    ctx.replace_hook(
        fetched.index,
        Hook::Memo {
            id,
            value: value.clone(),
            deps,
        },
    );
    value
        .downcast::<T>()
        .unwrap_or_else(|_| panic!("{HOOK_STATE_ERR}"))
}

/// Retain a function whose identity is stable while its deps are unchanged.
pub fn use_callback<A>(
    ctx: &mut Context,
    f: impl Fn(A) + Send + Sync + 'static,
    trigger: Trigger,
) -> Arc<dyn Fn(A) + Send + Sync>
where
    A: 'static,
{
    let f: Arc<dyn Fn(A) + Send + Sync> = Arc::new(f);
    let fetched = ctx.fetch_or_init_hook(HookVariant::Callback, {
        let f = f.clone();
        let deps = initial_deps(&trigger);
        move |id| Hook::Callback {
            id,
            callback: Arc::new(f),
            deps,
        }
    });
    let Hook::Callback { id, callback, deps } = fetched.hook else {
        unreachable!()
    };
    let (callback, deps) = if fetched.fresh {
        (callback, deps)
    } else {
        match should_recompute(&trigger, &deps) {
            Recompute::No => (callback, deps),
            Recompute::Yes(new_deps) => (Arc::new(f) as HookValue, new_deps),
        }
    };
    ctx.replace_hook(
        fetched.index,
        Hook::Callback {
            id,
            callback: callback.clone(),
            deps,
        },
    );
    callback
        .downcast::<Arc<dyn Fn(A) + Send + Sync>>()
        .unwrap_or_else(|_| panic!("{HOOK_STATE_ERR}"))
        .as_ref()
        .clone()
}

/// An event handler with a stable id, automatically recorded into the
/// context's handler registry for this pass.
pub fn use_handler(
    ctx: &mut Context,
    f: impl Fn(Option<Value>) + Send + Sync + 'static,
) -> IdentifiableHandler {
    let f: HandlerFn = Arc::new(f);
    let fetched = ctx.fetch_or_init_hook(HookVariant::Handler, {
        let f = f.clone();
        move |id| Hook::Handler {
            id: id.clone(),
            handler: IdentifiableHandler::new(id, f),
        }
    });
    let Hook::Handler { id, .. } = fetched.hook else {
        unreachable!()
    };
    let handler = IdentifiableHandler::new(id.clone(), f);
    ctx.replace_hook(
        fetched.index,
        Hook::Handler {
            id,
            handler: handler.clone(),
        },
    );
    ctx.record_handler(handler.clone());
    handler
}

/// Read the nearest enclosing provider value bound under `key`.
///
/// Consuming a key with no provider in scope is a fatal usage error.
pub fn use_context<T>(ctx: &Context, key: &str) -> Arc<T>
where
    T: Send + Sync + 'static,
{
    let value = ctx.provider_value(key).unwrap_or_else(|| {
        panic!("no provider in scope for context key {key:?}; wrap the consuming subtree in a provider")
    });
    value.downcast::<T>().unwrap_or_else(|_| {
        panic!("provider value for context key {key:?} has a different type than the consumer expects")
    })
}

/// Bind a named client hook: an attribute marking the element for the
/// browser-side hook, plus a channel for pushing events to that client.
pub fn use_client(
    ctx: &mut Context,
    name: impl Into<String>,
    on_event: Option<ClientEventFn>,
) -> ClientHandle {
    let name = name.into();
    let fetched = ctx.fetch_or_init_hook(HookVariant::Client, {
        let name = name.clone();
        let on_event = on_event.clone();
        move |id| Hook::Client { id, name, on_event }
    });
    let Hook::Client { id, .. } = fetched.hook else {
        unreachable!()
    };
    ctx.replace_hook(
        fetched.index,
        Hook::Client {
            id: id.clone(),
            name: name.clone(),
            on_event,
        },
    );
    ClientHandle {
        id,
        name,
        dispatcher: ctx.client_dispatcher(),
    }
}

/// The render-side face of a client hook.
#[derive(Clone)]
pub struct ClientHandle {
    id: Cuid,
    name: String,
    dispatcher: Option<Arc<dyn Dispatcher>>,
}

impl ClientHandle {
    /// The attribute binding this hook to an element.
    pub fn attr(&self) -> Attribute {
        Attribute::ClientHook {
            id: self.id.clone(),
            name: self.name.clone(),
        }
    }

    pub fn id(&self) -> &Cuid {
        &self.id
    }

    /// Push an event towards the client side of this hook.
    pub fn dispatch(&self, event: &str, payload: Option<Value>) {
        match &self.dispatcher {
            Some(dispatcher) => dispatcher.dispatch(event, payload),
            None => tracing::warn!(
                hook = %self.id,
                event,
                "client dispatch dropped: runtime started without a dispatcher"
            ),
        }
    }
}

/// Build a dependency list for [`Trigger::WithDeps`].
#[macro_export]
macro_rules! deps {
    () => { ::std::vec::Vec::<$crate::Dep>::new() };
    ($($dep:expr),+ $(,)?) => {
        <[_]>::into_vec(::std::boxed::Box::new([
            $(::std::sync::Arc::new($dep) as $crate::Dep),+
        ]))
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unchanged_deps_compare_equal() {
        let prev = deps![1_u32, "a".to_string()];
        let next = deps![1_u32, "a".to_string()];
        assert!(matches!(compare_deps(&prev, &next), DepsDiff::Unchanged));
    }

    #[test]
    fn changed_deps_are_detected() {
        let prev = deps![1_u32];
        let next = deps![2_u32];
        assert!(matches!(compare_deps(&prev, &next), DepsDiff::Changed));
    }

    #[test]
    #[should_panic]
    fn deps_length_drift_is_fatal() {
        let prev = deps![1_u32];
        let next = deps![1_u32, 2_u32];
        compare_deps(&prev, &next);
    }
}
