//! The reducer hook: component state owned by an isolated task.
//!
//! Each reducer hook spawns one task holding the model, driven by a typed
//! `Get` / `Dispatch` / `Shutdown` mailbox. Component renders are
//! synchronous, so the task also maintains a read mirror of the model; a
//! dispatch updates the mirror *before* scheduling the follow-up render,
//! which means a render never observes a stale model.

use crate::context::{Context, Scheduler};
use crate::hooks::{Hook, HookValue, HookVariant, HOOK_STATE_ERR};
use std::sync::{Arc, RwLock};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};

/// Applied to the current model on every dispatch. Carried inside the
/// `Dispatch` message so the task always runs the closure from the render
/// that issued the dispatch.
pub type ReduceFn<Model, Msg> = Arc<dyn Fn(Model, Msg) -> Model + Send + Sync>;

pub enum ReducerMsg<Model, Msg> {
    Get(oneshot::Sender<Model>),
    Dispatch(ReduceFn<Model, Msg>, Msg),
    Shutdown,
}

/// A reducer `Get` did not complete.
#[derive(Debug, thiserror::Error)]
pub enum ReducerError {
    #[error("the reducer task has shut down")]
    Closed,
    #[error("timed out waiting for the reducer to reply")]
    ReplyTimeout,
}

/// Handle to one reducer task. Cloneable; the task lives until `Shutdown`.
pub struct ReducerHandle<Model, Msg> {
    tx: mpsc::UnboundedSender<ReducerMsg<Model, Msg>>,
    mirror: Arc<RwLock<Model>>,
}

impl<Model, Msg> Clone for ReducerHandle<Model, Msg> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
            mirror: Arc::clone(&self.mirror),
        }
    }
}

impl<Model, Msg> ReducerHandle<Model, Msg>
where
    Model: Clone + Send + Sync + 'static,
    Msg: Send + 'static,
{
    /// Spawn the task owning `initial`. Follow-up renders are scheduled by
    /// the task itself, after the mirror is updated.
    pub(crate) fn spawn(initial: Model, scheduler: Scheduler) -> Self {
        let mirror = Arc::new(RwLock::new(initial.clone()));
        let (tx, mut rx) = mpsc::unbounded_channel();
        let task_mirror = Arc::clone(&mirror);
        tokio::spawn(async move {
            let mut model = initial;
            while let Some(msg) = rx.recv().await {
                match msg {
                    ReducerMsg::Get(reply) => {
                        let _ = reply.send(model.clone());
                    }
                    ReducerMsg::Dispatch(reduce, msg) => {
                        model = (*reduce)(model, msg);
                        *write_lock(&task_mirror) = model.clone();
                        scheduler.schedule_render();
                    }
                    ReducerMsg::Shutdown => break,
                }
            }
        });
        Self { tx, mirror }
    }

    /// The model as of the most recent completed dispatch.
    pub fn model(&self) -> Model {
        read_lock(&self.mirror).clone()
    }

    /// Fire-and-forget dispatch. A dispatch after shutdown is logged and
    /// dropped.
    pub fn dispatch(&self, reduce: ReduceFn<Model, Msg>, msg: Msg) {
        if self.tx.send(ReducerMsg::Dispatch(reduce, msg)).is_err() {
            tracing::warn!("dispatch dropped: reducer task has shut down");
        }
    }

    /// Ask the task for its model, bounded by `timeout`.
    pub async fn get(&self, timeout: Duration) -> Result<Model, ReducerError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(ReducerMsg::Get(reply))
            .map_err(|_| ReducerError::Closed)?;
        match tokio::time::timeout(timeout, rx).await {
            Ok(Ok(model)) => Ok(model),
            Ok(Err(_)) => Err(ReducerError::Closed),
            Err(_) => Err(ReducerError::ReplyTimeout),
        }
    }

    pub fn shutdown(&self) {
        let _ = self.tx.send(ReducerMsg::Shutdown);
    }
}

fn read_lock<T>(lock: &RwLock<T>) -> std::sync::RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn write_lock<T>(lock: &RwLock<T>) -> std::sync::RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// The type-erased face of a reducer handle stored in the hook tree. The
/// shutdown closure doubles as the hook's cleanup on disposal.
#[derive(Clone)]
pub struct ReducerCell {
    handle: HookValue,
    shutdown: Arc<dyn Fn() + Send + Sync>,
}

impl ReducerCell {
    fn new<Model, Msg>(handle: ReducerHandle<Model, Msg>) -> Self
    where
        Model: Clone + Send + Sync + 'static,
        Msg: Send + 'static,
    {
        let for_shutdown = handle.clone();
        Self {
            handle: Arc::new(handle),
            shutdown: Arc::new(move || for_shutdown.shutdown()),
        }
    }

    pub(crate) fn shutdown(&self) {
        (*self.shutdown)()
    }

    fn downcast<Model, Msg>(&self) -> ReducerHandle<Model, Msg>
    where
        Model: Clone + Send + Sync + 'static,
        Msg: Send + 'static,
    {
        self.handle
            .downcast_ref::<ReducerHandle<Model, Msg>>()
            .cloned()
            .unwrap_or_else(|| panic!("{HOOK_STATE_ERR}"))
    }
}

/// Dispatches messages into a reducer hook and schedules the re-render.
pub struct DispatchMsg<Msg>(Arc<dyn Fn(Msg) + Send + Sync>);

impl<Msg> Clone for DispatchMsg<Msg> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<Msg> DispatchMsg<Msg> {
    pub fn dispatch(&self, msg: Msg) {
        (*self.0)(msg)
    }
}

/// Component state managed through messages, in the manner of a reducer.
///
/// Returns the current model and a dispatcher. Dispatching applies the
/// reducer inside the hook's own task and then schedules a re-render, so
/// the next pass always reads the reduced model.
pub fn use_reducer<Model, Msg>(
    ctx: &mut Context,
    init: impl FnOnce() -> Model,
    reduce: impl Fn(Model, Msg) -> Model + Send + Sync + 'static,
) -> (Model, DispatchMsg<Msg>)
where
    Model: Clone + Send + Sync + 'static,
    Msg: Send + 'static,
{
    let fetched = ctx.fetch_or_init_hook(HookVariant::Reducer, {
        let scheduler = ctx.scheduler().clone();
        move |id| Hook::Reducer {
            id,
            cell: ReducerCell::new(ReducerHandle::<Model, Msg>::spawn(init(), scheduler)),
        }
    });
    let Hook::Reducer { cell, .. } = fetched.hook else {
        unreachable!()
    };
    let handle = cell.downcast::<Model, Msg>();
    let model = handle.model();
    let reduce: ReduceFn<Model, Msg> = Arc::new(reduce);
    let dispatch = DispatchMsg(Arc::new(move |msg| handle.dispatch(reduce.clone(), msg)));
    (model, dispatch)
}
