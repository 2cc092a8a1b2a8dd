//! # Weft core
//!
//! A server-driven, hook-based UI runtime. A [`start`]ed runtime owns a
//! component tree, reconciles it against the previous render whenever an
//! event or state update arrives, and pushes either the full tree or a
//! minimal [`Patch`] to a transport-supplied [`Updater`].
//!
//! Components are plain functions over a [`Context`] and typed props:
//!
//! ```rust,ignore
//! fn counter(ctx: &mut Context, _props: &()) -> Vec<Element> {
//!     let (count, set_count) = use_state(ctx, || 0);
//!     let increment = use_handler(ctx, {
//!         let set_count = set_count.clone();
//!         let count = *count;
//!         move |_| set_count.set(count + 1)
//!     });
//!     vec![button(
//!         vec![on("click", increment)],
//!         vec![text(count.to_string())],
//!     )]
//! }
//!
//! let handle = start(component(counter, ()), updater, None);
//! ```
//!
//! Hooks follow call-order matching: every `use_*` call must happen
//! unconditionally and in the same order on every render of a component.

pub(crate) mod context;
pub(crate) mod cuid;
pub(crate) mod diff;
pub(crate) mod events;
pub(crate) mod hooks;
pub mod html;
pub(crate) mod nodes;
pub mod patch;
pub(crate) mod reconciled;
pub(crate) mod reducer;
pub(crate) mod render;
pub(crate) mod runtime;

pub(crate) mod innerlude {
    pub use crate::context::{Context, FetchedHook, HookUpdateFn, Scheduler};
    pub use crate::cuid::{cuid_source, Cuid, CuidSource};
    pub use crate::diff::reconcile;
    pub use crate::events::{
        Dispatcher, EventError, IdentifiableHandler, RenderedUpdate, Updater, UpdaterError,
    };
    pub use crate::hooks::{
        cleanup, use_callback, use_client, use_context, use_effect, use_handler, use_memo,
        use_state, Cleanup, ClientEventFn, ClientHandle, Dep, EffectFn, EffectResult, Hook,
        HookValue, HookVariant, SetState, Trigger,
    };
    pub use crate::nodes::{
        attr, classes, component, el, fragment, key, keyed, on, provider, text, AnyValue,
        Attribute, Element, Props, ProviderValue, VComponent, VElement, VFragment, VProvider,
        VText,
    };
    pub use crate::patch::{AttributePatch, Patch};
    pub use crate::reconciled::{
        AttributeKey, Reconciled, ReconciledAttribute, ReconciledComponent, ReconciledElement,
        ReconciledFragment, ReconciledText,
    };
    pub use crate::reducer::{
        use_reducer, DispatchMsg, ReduceFn, ReducerError, ReducerHandle, ReducerMsg,
    };
    pub use crate::render::{IdentityRenderer, Renderer};
    pub use crate::runtime::{
        start, start_with_config, RuntimeConfig, RuntimeHandle, RuntimeMessage,
    };
}

pub use crate::innerlude::*;

/// The things almost every component module needs.
pub mod prelude {
    pub use crate::hooks::{
        cleanup, use_callback, use_client, use_context, use_effect, use_handler, use_memo,
        use_state, Trigger,
    };
    pub use crate::nodes::{
        attr, classes, component, el, fragment, key, keyed, on, provider, text, Attribute, Element,
    };
    pub use crate::reducer::use_reducer;
    pub use crate::runtime::{start, RuntimeHandle};
    pub use crate::{deps, Context};
}
