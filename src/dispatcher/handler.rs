use futures::future::BoxFuture;
use futures::FutureExt;
use parking_lot::Mutex;
use serde_json::Value;
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::runtime::{Handle, RuntimeFlavor};
use tracing::warn;

use crate::pattern::{ParamVec, PatternMatch};

/// What a handler sees of one invocation.
///
/// Built fresh for every binding that matches, from that binding's match and
/// the full original argument list. Cheap to clone, so async handlers can move
/// it into their future.
#[derive(Debug, Clone)]
pub struct Request {
    /// Name of the intercepted operation
    pub operation: Arc<str>,
    /// Parameters extracted by this binding's pattern
    pub params: ParamVec,
    /// The portion of the path this binding's pattern matched
    pub path: String,
    /// Every positional argument of the call, path first
    pub args: Arc<[Value]>,
}

impl Request {
    pub(crate) fn new(operation: Arc<str>, matched: PatternMatch, args: Arc<[Value]>) -> Self {
        Self {
            operation,
            params: matched.params,
            path: matched.path,
            args,
        }
    }

    /// Get a path parameter by name
    ///
    /// Uses "last write wins" semantics, matching [`PatternMatch::get_param`].
    #[inline]
    #[must_use]
    pub fn get_param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .rfind(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }

    /// Get a positional argument; index 0 is the path.
    #[inline]
    #[must_use]
    pub fn arg(&self, index: usize) -> Option<&Value> {
        self.args.get(index)
    }

    /// Convert params to HashMap for compatibility
    /// Note: This allocates - use get_param() in hot paths
    #[must_use]
    pub fn params_map(&self) -> HashMap<String, String> {
        self.params
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }
}

/// Ends the chain of one invocation.
///
/// One `Response` is shared by every handler evaluated for a call, so `end`
/// from any of them short-circuits the whole chain.
#[derive(Clone, Default)]
pub struct Response {
    payload: Arc<Mutex<Option<Value>>>,
}

impl Response {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Record `payload` as the call's result and stop the chain.
    ///
    /// The first `end` wins. Later calls leave the recorded payload alone and
    /// return `false`. `Value::Null` is a valid payload.
    pub fn end(&self, payload: impl Into<Value>) -> bool {
        let mut slot = self.payload.lock();
        if slot.is_some() {
            warn!("Response already ended - payload ignored");
            return false;
        }
        *slot = Some(payload.into());
        true
    }

    /// True once a handler has called [`Response::end`].
    #[must_use]
    pub fn is_ended(&self) -> bool {
        self.payload.lock().is_some()
    }

    pub(crate) fn take(&self) -> Option<Value> {
        self.payload.lock().take()
    }
}

impl fmt::Debug for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Response")
            .field("ended", &self.is_ended())
            .finish()
    }
}

/// Continuation token handed to every handler.
///
/// Calling [`Next::proceed`] passes control to the next matching binding, or
/// to the original operation after the last one. Returning without ending the
/// response does the same.
#[derive(Debug)]
pub struct Next {
    _private: (),
}

impl Next {
    pub(crate) fn new() -> Self {
        Self { _private: () }
    }

    pub fn proceed(self) {}
}

/// Outcome of a handler call: already settled, or still pending.
pub enum Handled {
    Ready(anyhow::Result<()>),
    Pending(BoxFuture<'static, anyhow::Result<()>>),
}

impl Handled {
    /// Wrap an async handler body.
    pub fn pending<F>(future: F) -> Self
    where
        F: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        Handled::Pending(Box::pin(future))
    }

    /// Wait for the outcome without blocking the executor.
    ///
    /// A panic inside a pending handler settles as an error.
    pub async fn settle(self) -> anyhow::Result<()> {
        match self {
            Handled::Ready(result) => result,
            Handled::Pending(future) => AssertUnwindSafe(future)
                .catch_unwind()
                .await
                .unwrap_or_else(|payload| Err(panic_error(payload))),
        }
    }

    /// Drive the outcome to completion on the calling thread.
    ///
    /// On a multi-thread tokio worker the future runs through `block_in_place`
    /// so tokio timers and IO keep being driven. Anywhere else it runs on a
    /// local executor; inside a current-thread runtime that means a handler
    /// awaiting tokio timers or IO never completes.
    pub fn settle_blocking(self) -> anyhow::Result<()> {
        let future = match self {
            Handled::Ready(result) => return result,
            Handled::Pending(future) => AssertUnwindSafe(future).catch_unwind(),
        };
        let settled = match Handle::try_current() {
            Ok(handle) if handle.runtime_flavor() == RuntimeFlavor::MultiThread => {
                tokio::task::block_in_place(|| handle.block_on(future))
            }
            _ => futures::executor::block_on(future),
        };
        settled.unwrap_or_else(|payload| Err(panic_error(payload)))
    }
}

/// Turn a caught handler panic into an error.
pub(crate) fn panic_error(payload: Box<dyn Any + Send>) -> anyhow::Error {
    let message = payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "non-string panic payload".to_string());
    anyhow::anyhow!("Handler panicked: {message}")
}

impl fmt::Debug for Handled {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Handled::Ready(result) => f.debug_tuple("Ready").field(result).finish(),
            Handled::Pending(_) => f.write_str("Pending(..)"),
        }
    }
}

impl From<()> for Handled {
    fn from((): ()) -> Self {
        Handled::Ready(Ok(()))
    }
}

impl<E> From<Result<(), E>> for Handled
where
    E: Into<anyhow::Error>,
{
    fn from(result: Result<(), E>) -> Self {
        Handled::Ready(result.map_err(Into::into))
    }
}

impl From<BoxFuture<'static, anyhow::Result<()>>> for Handled {
    fn from(future: BoxFuture<'static, anyhow::Result<()>>) -> Self {
        Handled::Pending(future)
    }
}

/// A middleware bound to a path template.
///
/// Closures `Fn(Request, Response, Next) -> R` where `R: Into<Handled>`
/// implement this automatically, so a handler may return `()`, a `Result`, or
/// a boxed future without saying which up front.
pub trait Handler: Send + Sync {
    fn handle(&self, req: Request, res: Response, next: Next) -> Handled;
}

impl<F, R> Handler for F
where
    F: Fn(Request, Response, Next) -> R + Send + Sync,
    R: Into<Handled>,
{
    fn handle(&self, req: Request, res: Response, next: Next) -> Handled {
        self(req, res, next).into()
    }
}
