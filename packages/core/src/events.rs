//! Event handlers and the contracts a transport implements.
//!
//! The runtime never talks to a socket itself. It hands every render result
//! to an [`Updater`] and routes client-directed hook messages through a
//! [`Dispatcher`]; both are supplied by the embedding transport.

use crate::cuid::Cuid;
use crate::patch::Patch;
use crate::reconciled::Reconciled;
use async_trait::async_trait;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

pub(crate) type HandlerFn = Arc<dyn Fn(Option<Value>) + Send + Sync>;

/// An event handler with a stable identity.
///
/// The id survives re-renders while the function is replaced every pass, so
/// a client can keep firing the same id across updates and always reach the
/// closure from the latest render.
#[derive(Clone)]
pub struct IdentifiableHandler {
    pub id: Cuid,
    pub(crate) f: HandlerFn,
}

impl IdentifiableHandler {
    pub(crate) fn new(id: Cuid, f: HandlerFn) -> Self {
        Self { id, f }
    }

    pub(crate) fn call(&self, payload: Option<Value>) {
        (*self.f)(payload)
    }
}

impl fmt::Debug for IdentifiableHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "IdentifiableHandler({})", self.id)
    }
}

/// What a render produced: the whole tree on first render, a diff after.
#[derive(Clone, Debug)]
pub enum RenderedUpdate {
    FullUpdate(Reconciled),
    PatchUpdate(Patch),
}

/// The transport-side sink for rendered output.
///
/// Implementations typically serialise through the JSON renderer and push
/// over a websocket. Send failures are reported back to the runtime, which
/// logs them and keeps its tree intact.
#[async_trait]
pub trait Updater: Send + Sync {
    async fn send(&self, update: RenderedUpdate) -> Result<(), UpdaterError>;
}

/// The transport-side sink for client-directed hook messages.
pub trait Dispatcher: Send + Sync {
    fn dispatch(&self, event: &str, payload: Option<Value>);
}

/// The updater could not deliver an update to its transport.
#[derive(Debug, thiserror::Error)]
#[error("updater send failed: {0}")]
pub struct UpdaterError(pub String);

/// Errors surfaced by the immediate (replying) runtime calls.
#[derive(Debug, thiserror::Error)]
pub enum EventError {
    #[error("no handler registered for event id {0}")]
    UnknownHandler(Cuid),
    #[error("no client hook registered for id {0}")]
    UnknownClientHook(Cuid),
    #[error("the runtime has shut down")]
    RuntimeClosed,
    #[error("timed out waiting for the runtime to reply")]
    ReplyTimeout,
}
