//! The runtime actor: a single task that owns one component tree.
//!
//! Every mutation of the tree - event dispatch, hook updates, renders -
//! happens inside the actor, driven by a FIFO mailbox. Nothing outside the
//! task ever observes the tree mid-render. Setters and effects that
//! schedule follow-up work enqueue messages behind the one currently being
//! processed, so re-entrancy is ordering, not recursion.

use crate::context::{Context, HookUpdateFn, Scheduler};
use crate::cuid::Cuid;
use crate::diff::{reconcile, run_all_cleanups, run_disposed_cleanups, run_effects};
use crate::events::{Dispatcher, EventError, RenderedUpdate, Updater};
use crate::nodes::Element;
use crate::patch;
use crate::reconciled::Reconciled;
use serde_json::Value;
use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};

/// Mailbox messages understood by the runtime actor.
pub enum RuntimeMessage {
    /// Run all cleanups and terminate.
    Shutdown,
    /// Reply with the current reconciled tree. Test use.
    GetReconciled {
        reply: oneshot::Sender<Option<Reconciled>>,
    },
    /// Fire-and-forget event dispatch; unknown handler ids are logged.
    ProcessEvent { id: Cuid, payload: Option<Value> },
    /// Event dispatch that reports whether a handler was found.
    ProcessEventImmediate {
        reply: oneshot::Sender<Result<(), EventError>>,
        id: Cuid,
        payload: Option<Value>,
    },
    /// Fire-and-forget delivery of a client-originated event to a client
    /// hook; unknown hook ids are logged.
    ProcessClientHook {
        id: Cuid,
        event: String,
        payload: Option<Value>,
        dispatcher: Arc<dyn Dispatcher>,
    },
    /// Client-hook delivery that reports whether the hook was found.
    ProcessClientHookImmediate {
        reply: oneshot::Sender<Result<(), EventError>>,
        id: Cuid,
        event: String,
        payload: Option<Value>,
        dispatcher: Arc<dyn Dispatcher>,
    },
    /// Replace the state hook with the given id via `update`.
    UpdateHookState { id: Cuid, update: HookUpdateFn },
    /// Reconcile and reply with the new tree, without touching the
    /// updater. Test use.
    ReconcileImmediate { reply: oneshot::Sender<Reconciled> },
    /// Reconcile; push a `FullUpdate` on the first pass, a `PatchUpdate`
    /// after.
    RenderUpdate,
}

/// How long replying calls (`get`-style messages) wait for the actor.
#[derive(Clone, Debug)]
pub struct RuntimeConfig {
    pub call_timeout: Duration,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            call_timeout: Duration::from_secs(5),
        }
    }
}

/// Spawn a runtime for `view` and schedule its first render, which emits a
/// [`RenderedUpdate::FullUpdate`] to the updater.
///
/// Must be called from within a tokio runtime.
pub fn start(
    view: Element,
    updater: Arc<dyn Updater>,
    dispatcher: Option<Arc<dyn Dispatcher>>,
) -> RuntimeHandle {
    start_with_config(view, updater, dispatcher, RuntimeConfig::default())
}

pub fn start_with_config(
    view: Element,
    updater: Arc<dyn Updater>,
    dispatcher: Option<Arc<dyn Dispatcher>>,
    config: RuntimeConfig,
) -> RuntimeHandle {
    let (tx, rx) = mpsc::unbounded_channel();
    let context = Context::new(view, Scheduler::new(tx.clone()), dispatcher);
    let state = RuntimeState {
        context,
        updater,
        reconciled: None,
    };
    tokio::spawn(state.run(rx));

    let handle = RuntimeHandle {
        tx,
        call_timeout: config.call_timeout,
    };
    handle.render_update();
    handle
}

/// A cheap, cloneable reference to a running runtime.
#[derive(Clone)]
pub struct RuntimeHandle {
    tx: mpsc::UnboundedSender<RuntimeMessage>,
    call_timeout: Duration,
}

impl RuntimeHandle {
    /// Shut the runtime down; cleanups run before the actor exits.
    pub fn stop(&self) {
        let _ = self.tx.send(RuntimeMessage::Shutdown);
    }

    /// Schedule a render.
    pub fn render_update(&self) {
        let _ = self.tx.send(RuntimeMessage::RenderUpdate);
    }

    /// Dispatch an event without waiting for the outcome.
    pub fn process_event(&self, id: Cuid, payload: Option<Value>) {
        let _ = self.tx.send(RuntimeMessage::ProcessEvent { id, payload });
    }

    /// Dispatch an event and learn whether a handler received it.
    pub async fn process_event_immediate(
        &self,
        id: Cuid,
        payload: Option<Value>,
    ) -> Result<(), EventError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(RuntimeMessage::ProcessEventImmediate { reply, id, payload })
            .map_err(|_| EventError::RuntimeClosed)?;
        self.await_reply(rx).await?
    }

    /// Forward a client-originated event to the client hook with `id`.
    pub fn process_client_hook(
        &self,
        id: Cuid,
        event: impl Into<String>,
        payload: Option<Value>,
        dispatcher: Arc<dyn Dispatcher>,
    ) {
        let _ = self.tx.send(RuntimeMessage::ProcessClientHook {
            id,
            event: event.into(),
            payload,
            dispatcher,
        });
    }

    /// Forward a client-originated event and learn whether the hook with
    /// `id` is mounted.
    pub async fn process_client_hook_immediate(
        &self,
        id: Cuid,
        event: impl Into<String>,
        payload: Option<Value>,
        dispatcher: Arc<dyn Dispatcher>,
    ) -> Result<(), EventError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(RuntimeMessage::ProcessClientHookImmediate {
                reply,
                id,
                event: event.into(),
                payload,
                dispatcher,
            })
            .map_err(|_| EventError::RuntimeClosed)?;
        self.await_reply(rx).await?
    }

    /// Reconcile now and return the new tree. Test use.
    pub async fn reconcile_immediate(&self) -> Result<Reconciled, EventError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(RuntimeMessage::ReconcileImmediate { reply })
            .map_err(|_| EventError::RuntimeClosed)?;
        self.await_reply(rx).await
    }

    /// The current reconciled tree, if a render has completed. Test use.
    pub async fn get_reconciled(&self) -> Result<Option<Reconciled>, EventError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(RuntimeMessage::GetReconciled { reply })
            .map_err(|_| EventError::RuntimeClosed)?;
        self.await_reply(rx).await
    }

    async fn await_reply<T>(&self, rx: oneshot::Receiver<T>) -> Result<T, EventError> {
        match tokio::time::timeout(self.call_timeout, rx).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(_)) => Err(EventError::RuntimeClosed),
            Err(_) => Err(EventError::ReplyTimeout),
        }
    }
}

/// A component panicked while rendering; the runtime is coming down.
struct RenderAborted;

struct RuntimeState {
    context: Context,
    updater: Arc<dyn Updater>,
    reconciled: Option<Reconciled>,
}

impl RuntimeState {
    async fn run(mut self, mut rx: mpsc::UnboundedReceiver<RuntimeMessage>) {
        while let Some(message) = rx.recv().await {
            match message {
                RuntimeMessage::Shutdown => break,

                RuntimeMessage::GetReconciled { reply } => {
                    let _ = reply.send(self.reconciled.clone());
                }

                RuntimeMessage::ProcessEvent { id, payload } => {
                    if let Err(error) = self.dispatch_event(&id, payload) {
                        tracing::warn!(%error, "dropping event");
                    }
                }

                RuntimeMessage::ProcessEventImmediate { reply, id, payload } => {
                    let _ = reply.send(self.dispatch_event(&id, payload));
                }

                RuntimeMessage::ProcessClientHook {
                    id,
                    event,
                    payload,
                    dispatcher,
                } => {
                    if let Err(error) = self.dispatch_client_hook(&id, &event, payload, dispatcher)
                    {
                        tracing::warn!(%error, "dropping client event");
                    }
                }

                RuntimeMessage::ProcessClientHookImmediate {
                    reply,
                    id,
                    event,
                    payload,
                    dispatcher,
                } => {
                    let _ = reply.send(self.dispatch_client_hook(&id, &event, payload, dispatcher));
                }

                RuntimeMessage::UpdateHookState { id, update } => {
                    if let Some(tree) = self.reconciled.as_mut() {
                        if !tree.update_state_hook(&id, update) {
                            tracing::trace!(hook = %id, "hook update for a hook that is no longer mounted");
                        }
                    }
                }

                RuntimeMessage::ReconcileImmediate { reply } => match self.reconcile_pass() {
                    Ok(tree) => {
                        let _ = reply.send(tree);
                    }
                    Err(RenderAborted) => break,
                },

                RuntimeMessage::RenderUpdate => {
                    if self.render_update().await.is_err() {
                        break;
                    }
                }
            }
        }

        // Reached on Shutdown and on fatal render errors alike: the tree
        // retained here is the last one that completed a reconciliation.
        if let Some(tree) = self.reconciled.take() {
            run_all_cleanups(&tree);
        }
    }

    /// Reconcile against the previous tree and commit the result. On a
    /// component panic the previous tree is left untouched and the error
    /// is returned so the actor can terminate cleanly.
    fn reconcile_pass(&mut self) -> Result<Reconciled, RenderAborted> {
        self.context.prepare_for_reconciliation();
        let view = self.context.view.clone();
        let prev = self.reconciled.clone();

        let outcome = catch_unwind(AssertUnwindSafe(|| {
            let mut next = reconcile(&mut self.context, &view, prev.as_ref());
            if let Some(prev_tree) = prev.as_ref() {
                run_disposed_cleanups(prev_tree, &next);
            }
            run_effects(&mut next);
            next
        }));

        match outcome {
            Ok(next) => {
                self.reconciled = Some(next.clone());
                Ok(next)
            }
            Err(panic) => {
                tracing::error!(
                    reason = panic_message(&panic),
                    "render aborted by a component error; shutting the runtime down"
                );
                Err(RenderAborted)
            }
        }
    }

    async fn render_update(&mut self) -> Result<(), RenderAborted> {
        let prev = self.reconciled.clone();
        let next = self.reconcile_pass()?;
        let update = match &prev {
            Some(prev_tree) => RenderedUpdate::PatchUpdate(patch::create(prev_tree, &next)),
            None => RenderedUpdate::FullUpdate(next),
        };
        if let Err(error) = self.updater.send(update).await {
            // The tree stays committed; the next patch diffs from it.
            tracing::error!(%error, "failed to push rendered update");
        }
        Ok(())
    }

    fn dispatch_event(&self, id: &Cuid, payload: Option<Value>) -> Result<(), EventError> {
        match self.context.handlers().iter().find(|h| &h.id == id) {
            Some(handler) => {
                handler.call(payload);
                Ok(())
            }
            None => Err(EventError::UnknownHandler(id.clone())),
        }
    }

    fn dispatch_client_hook(
        &self,
        id: &Cuid,
        event: &str,
        payload: Option<Value>,
        dispatcher: Arc<dyn Dispatcher>,
    ) -> Result<(), EventError> {
        let found = self
            .reconciled
            .as_ref()
            .and_then(|tree| tree.find_client_hook(id));
        match found {
            None => Err(EventError::UnknownClientHook(id.clone())),
            Some((name, None)) => {
                tracing::trace!(hook = %id, name, "client hook has no event callback");
                Ok(())
            }
            Some((_, Some(on_event))) => {
                (*on_event)(event, payload, dispatcher.as_ref());
                Ok(())
            }
        }
    }
}

fn panic_message(panic: &Box<dyn Any + Send>) -> &str {
    panic
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| panic.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown panic")
}
