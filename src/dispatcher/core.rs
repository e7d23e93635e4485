use arc_swap::ArcSwap;
use dashmap::DashMap;
use futures::channel::oneshot;
use serde_json::Value;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use tokio::runtime::Handle;
use tracing::{debug, info, warn};

use super::handler::{panic_error, Handled, Handler, Next, Request, Response};
use crate::error::{DispatchError, HandlerError, OperationMode};
use crate::operation::{Callback, DeferredFn, Invocation, Operation, OperationTable};
use crate::pattern::{CompiledPattern, PathMatcher, PatternMatcher};
use crate::runtime_config::RouterConfig;

/// A compiled template and the handler it guards. Immutable once built.
pub(crate) struct Binding {
    template: String,
    pattern: Arc<dyn CompiledPattern>,
    handler: Arc<dyn Handler>,
}

impl Binding {
    /// Run the handler if the pattern matches `path`. `None` means no match.
    fn evaluate(
        &self,
        operation: &Arc<str>,
        path: &str,
        args: &Arc<[Value]>,
        response: &Response,
    ) -> Option<Handled> {
        let matched = self.pattern.test(path)?;

        // C2: Binding matched
        debug!(
            operation = %operation,
            template = %self.template,
            path = %path,
            matched_path = %matched.path,
            params = matched.params.len(),
            "Binding matched"
        );

        let req = Request::new(Arc::clone(operation), matched, Arc::clone(args));
        let handled = panic::catch_unwind(AssertUnwindSafe(|| {
            self.handler.handle(req, response.clone(), Next::new())
        }))
        .unwrap_or_else(|payload| Handled::Ready(Err(panic_error(payload))));
        Some(handled)
    }
}

impl fmt::Debug for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Binding")
            .field("template", &self.template)
            .finish_non_exhaustive()
    }
}

/// How a chain run ended.
enum Outcome {
    Ended(Value),
    Failed(anyhow::Error),
    Exhausted,
}

/// The interception wrapper of one operation: the original it replaces plus
/// the bindings evaluated in front of it.
pub(crate) struct Chain {
    operation: Arc<str>,
    original: Operation,
    bindings: ArcSwap<Vec<Arc<Binding>>>,
}

impl Chain {
    fn new(operation: Arc<str>, original: Operation) -> Self {
        Self {
            operation,
            original,
            bindings: ArcSwap::from_pointee(Vec::new()),
        }
    }

    /// Append a binding. In-flight invocations keep the snapshot they loaded.
    fn push(&self, binding: Binding) -> usize {
        let binding = Arc::new(binding);
        let previous = self.bindings.rcu(|current| {
            let mut next: Vec<Arc<Binding>> = current.iter().cloned().collect();
            next.push(Arc::clone(&binding));
            next
        });
        previous.len() + 1
    }

    fn is_empty(&self) -> bool {
        self.bindings.load().is_empty()
    }

    fn templates(&self) -> Vec<String> {
        self.bindings
            .load()
            .iter()
            .map(|b| b.template.clone())
            .collect()
    }

    /// Evaluate the chain on the calling thread.
    ///
    /// Pending handler outcomes are driven to completion before the next
    /// binding is considered.
    fn run_blocking(&self, invocation: &Invocation) -> Outcome {
        let bindings = self.bindings.load();
        let args = invocation.arguments();
        let response = Response::new();

        // C1: Chain start
        debug!(
            operation = %self.operation,
            path = %invocation.path,
            bindings = bindings.len(),
            mode = %OperationMode::Blocking,
            "Handler chain started"
        );

        for (idx, binding) in bindings.iter().enumerate() {
            let Some(handled) =
                binding.evaluate(&self.operation, &invocation.path, &args, &response)
            else {
                continue;
            };
            if let Err(err) = handled.settle_blocking() {
                return self.failed(idx, binding, err);
            }
            if let Some(payload) = response.take() {
                return self.ended(idx, binding, payload);
            }
        }

        Outcome::Exhausted
    }

    /// Evaluate the chain, awaiting each matching handler in turn.
    async fn run_deferred(&self, invocation: &Invocation) -> Outcome {
        let bindings = self.bindings.load_full();
        let args = invocation.arguments();
        let response = Response::new();

        // C1: Chain start
        debug!(
            operation = %self.operation,
            path = %invocation.path,
            bindings = bindings.len(),
            mode = %OperationMode::Deferred,
            "Handler chain started"
        );

        for (idx, binding) in bindings.iter().enumerate() {
            let Some(handled) =
                binding.evaluate(&self.operation, &invocation.path, &args, &response)
            else {
                continue;
            };
            if let Err(err) = handled.settle().await {
                return self.failed(idx, binding, err);
            }
            if let Some(payload) = response.take() {
                return self.ended(idx, binding, payload);
            }
        }

        Outcome::Exhausted
    }

    fn ended(&self, idx: usize, binding: &Binding, payload: Value) -> Outcome {
        // C3: Early end
        info!(
            operation = %self.operation,
            template = %binding.template,
            binding_idx = idx,
            "Handler ended the chain"
        );
        Outcome::Ended(payload)
    }

    fn failed(&self, idx: usize, binding: &Binding, err: anyhow::Error) -> Outcome {
        // C4: Handler failure
        warn!(
            operation = %self.operation,
            template = %binding.template,
            binding_idx = idx,
            error = %err,
            "Handler failed - chain aborted"
        );
        Outcome::Failed(HandlerError::new(&self.operation, &binding.template, err).into())
    }
}

struct Shared {
    table: OperationTable,
    chains: DashMap<Arc<str>, Arc<Chain>>,
    matcher: Arc<dyn PatternMatcher>,
    runtime: Option<Handle>,
    config: RouterConfig,
}

/// Path-pattern middleware router over an [`OperationTable`].
///
/// Cloning is cheap; clones share bindings. Handlers registered through any
/// clone are visible to every [`Operations`] facade obtained from any clone.
#[derive(Clone)]
pub struct Router {
    shared: Arc<Shared>,
}

impl Router {
    /// Router over `table` with the default [`RouterConfig`].
    #[must_use]
    pub fn new(table: OperationTable) -> Self {
        Self::builder(table).build()
    }

    /// Router over `table` configured from `FSROUTER_*` environment variables.
    #[must_use]
    pub fn from_env(table: OperationTable) -> Self {
        Self::builder(table).config(RouterConfig::from_env()).build()
    }

    #[must_use]
    pub fn builder(table: OperationTable) -> RouterBuilder {
        RouterBuilder {
            table,
            config: RouterConfig::default(),
            matcher: None,
            runtime: None,
        }
    }

    /// Bind `handler` to `template` for `operation`.
    ///
    /// The first registration for a name installs its interception wrapper;
    /// later ones append. Bindings are evaluated in registration order.
    ///
    /// # Errors
    ///
    /// [`DispatchError::UnknownOperation`] if the table has no such operation,
    /// [`DispatchError::InvalidPattern`] if the template does not compile. In
    /// both cases nothing is registered.
    pub fn register<F, R>(
        &self,
        operation: &str,
        template: &str,
        handler: F,
    ) -> Result<(), DispatchError>
    where
        F: Fn(Request, Response, Next) -> R + Send + Sync + 'static,
        R: Into<Handled>,
    {
        self.register_handler(operation, template, Arc::new(handler))
    }

    /// Like [`Router::register`], for handlers that are not closures.
    ///
    /// # Errors
    ///
    /// See [`Router::register`].
    pub fn register_handler(
        &self,
        operation: &str,
        template: &str,
        handler: Arc<dyn Handler>,
    ) -> Result<(), DispatchError> {
        let original = self
            .shared
            .table
            .get(operation)
            .cloned()
            .ok_or_else(|| DispatchError::UnknownOperation(operation.to_string()))?;

        let pattern = match self.shared.matcher.compile(template) {
            Ok(pattern) => pattern,
            Err(err) => {
                warn!(
                    operation = %operation,
                    template = %template,
                    error = %err,
                    "Registration rejected - invalid path pattern"
                );
                return Err(err.into());
            }
        };

        let chain = Arc::clone(
            self.shared
                .chains
                .entry(Arc::from(operation))
                .or_insert_with(|| {
                    // R1: Wrapper installed
                    info!(
                        operation = %operation,
                        mode = %original.mode(),
                        "Interception wrapper installed"
                    );
                    Arc::new(Chain::new(Arc::from(operation), original))
                })
                .value(),
        );

        let bindings = chain.push(Binding {
            template: template.to_string(),
            pattern,
            handler,
        });

        // R2: Binding registered
        info!(
            operation = %operation,
            template = %template,
            bindings = bindings,
            "Handler registered"
        );
        Ok(())
    }

    /// Templates bound to `operation`, in evaluation order.
    #[must_use]
    pub fn bindings(&self, operation: &str) -> Vec<String> {
        self.shared
            .chains
            .get(operation)
            .map(|chain| chain.templates())
            .unwrap_or_default()
    }

    /// Names of the operations that have an interception wrapper, sorted.
    #[must_use]
    pub fn installed(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .shared
            .chains
            .iter()
            .map(|entry| entry.key().to_string())
            .collect();
        names.sort_unstable();
        names
    }

    #[must_use]
    pub fn config(&self) -> &RouterConfig {
        &self.shared.config
    }

    /// The call surface of the wrapped operations.
    #[must_use]
    pub fn operations(&self) -> Operations {
        Operations {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl fmt::Debug for Router {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Router")
            .field("operations", &self.shared.table.len())
            .field("installed", &self.installed())
            .field("config", &self.shared.config)
            .finish_non_exhaustive()
    }
}

/// Builder for [`Router`].
pub struct RouterBuilder {
    table: OperationTable,
    config: RouterConfig,
    matcher: Option<Arc<dyn PatternMatcher>>,
    runtime: Option<Handle>,
}

impl RouterBuilder {
    /// Configuration for the default [`PathMatcher`].
    #[must_use]
    pub fn config(mut self, config: RouterConfig) -> Self {
        self.config = config;
        self
    }

    /// Use a custom pattern matcher instead of [`PathMatcher`].
    #[must_use]
    pub fn matcher(mut self, matcher: Arc<dyn PatternMatcher>) -> Self {
        self.matcher = Some(matcher);
        self
    }

    /// Runtime that deferred chains are spawned on. Without one, the ambient
    /// runtime of the caller is used.
    #[must_use]
    pub fn runtime(mut self, handle: Handle) -> Self {
        self.runtime = Some(handle);
        self
    }

    #[must_use]
    pub fn build(self) -> Router {
        let matcher = self
            .matcher
            .unwrap_or_else(|| Arc::new(PathMatcher::new(self.config.match_options())));
        Router {
            shared: Arc::new(Shared {
                table: self.table,
                chains: DashMap::new(),
                matcher,
                runtime: self.runtime,
                config: self.config,
            }),
        }
    }
}

/// Invokes wrapped operations.
///
/// Operations without bindings go straight to the original.
#[derive(Clone)]
pub struct Operations {
    shared: Arc<Shared>,
}

impl Operations {
    /// The installed wrapper and its original, or the bare original.
    fn resolve(&self, operation: &str) -> Result<(Operation, Option<Arc<Chain>>), DispatchError> {
        if let Some(chain) = self.shared.chains.get(operation) {
            return Ok((chain.original.clone(), Some(Arc::clone(chain.value()))));
        }
        self.shared
            .table
            .get(operation)
            .map(|original| (original.clone(), None))
            .ok_or_else(|| DispatchError::UnknownOperation(operation.to_string()))
    }

    fn mismatch(operation: &str, actual: &Operation, requested: OperationMode) -> DispatchError {
        DispatchError::ModeMismatch {
            operation: operation.to_string(),
            actual: actual.mode(),
            requested,
        }
    }

    /// Call a blocking operation and return its result.
    ///
    /// Pending handlers are settled on the calling thread. From a tokio
    /// multi-thread worker they run under `block_in_place`; from a
    /// current-thread runtime a handler awaiting tokio timers or IO never
    /// completes, so call deferred operations there instead.
    ///
    /// # Errors
    ///
    /// A [`HandlerError`] if a matching handler fails, the original's own error
    /// if it runs and fails, and [`DispatchError`] for unknown operations or a
    /// deferred operation.
    pub fn call_sync(
        &self,
        operation: &str,
        path: impl Into<String>,
        args: Vec<Value>,
    ) -> anyhow::Result<Value> {
        let (original, chain) = self.resolve(operation)?;
        let original = match original {
            Operation::Blocking(original) => original,
            other => return Err(Self::mismatch(operation, &other, OperationMode::Blocking).into()),
        };
        let invocation = Invocation::new(operation, path, args);

        if let Some(chain) = chain {
            match chain.run_blocking(&invocation) {
                Outcome::Ended(payload) => return Ok(payload),
                Outcome::Failed(err) => return Err(err),
                Outcome::Exhausted => fallback(&invocation),
            }
        }
        original(&invocation)
    }

    /// Call a deferred operation; `callback` receives the outcome exactly once.
    ///
    /// With bindings in place the chain runs as a task on the configured
    /// runtime, or the caller's ambient one. Router errors and handler panics
    /// are delivered through `callback` as well.
    pub fn call<C>(
        &self,
        operation: &str,
        path: impl Into<String>,
        args: Vec<Value>,
        callback: C,
    ) where
        C: FnOnce(anyhow::Result<Value>) + Send + 'static,
    {
        let callback: Callback = Box::new(callback);
        let (original, chain) = match self.resolve(operation) {
            Ok(resolved) => resolved,
            Err(err) => return callback(Err(err.into())),
        };
        let original = match original {
            Operation::Deferred(original) => original,
            other => {
                let err = Self::mismatch(operation, &other, OperationMode::Deferred);
                return callback(Err(err.into()));
            }
        };
        let invocation = Invocation::new(operation, path, args);

        let chain = match chain {
            Some(chain) if !chain.is_empty() => chain,
            _ => return original(invocation, callback),
        };

        let Some(handle) = self
            .shared
            .runtime
            .clone()
            .or_else(|| Handle::try_current().ok())
        else {
            warn!(operation = %operation, "No async runtime - deferred call rejected");
            return callback(Err(DispatchError::NoRuntime(operation.to_string()).into()));
        };

        handle.spawn(async move {
            match chain.run_deferred(&invocation).await {
                Outcome::Ended(payload) => callback(Ok(payload)),
                Outcome::Failed(err) => callback(Err(err)),
                Outcome::Exhausted => {
                    fallback(&invocation);
                    original(invocation, callback);
                }
            }
        });
    }

    /// Call a deferred operation from async code.
    ///
    /// The chain runs in the caller's task; the original's callback is bridged
    /// back through a oneshot channel.
    ///
    /// # Errors
    ///
    /// As [`Operations::call_sync`], plus [`DispatchError::Abandoned`] if the
    /// original drops its callback without calling it.
    pub async fn call_async(
        &self,
        operation: &str,
        path: impl Into<String>,
        args: Vec<Value>,
    ) -> anyhow::Result<Value> {
        let (original, chain) = self.resolve(operation)?;
        let original = match original {
            Operation::Deferred(original) => original,
            other => return Err(Self::mismatch(operation, &other, OperationMode::Deferred).into()),
        };
        let invocation = Invocation::new(operation, path, args);

        if let Some(chain) = chain {
            match chain.run_deferred(&invocation).await {
                Outcome::Ended(payload) => return Ok(payload),
                Outcome::Failed(err) => return Err(err),
                Outcome::Exhausted => fallback(&invocation),
            }
        }
        bridge(original.as_ref(), invocation).await
    }
}

impl fmt::Debug for Operations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Operations")
            .field("operations", &self.shared.table.len())
            .finish_non_exhaustive()
    }
}

fn fallback(invocation: &Invocation) {
    // C5: Fallback to original
    debug!(
        operation = %invocation.operation,
        path = %invocation.path,
        "No handler ended the chain - calling original operation"
    );
}

async fn bridge(original: &DeferredFn, invocation: Invocation) -> anyhow::Result<Value> {
    let operation = Arc::clone(&invocation.operation);
    let (tx, rx) = oneshot::channel();
    original(
        invocation,
        Box::new(move |result| {
            if tx.send(result).is_err() {
                debug!("Deferred result arrived after the caller went away");
            }
        }),
    );
    rx.await
        .map_err(|_| DispatchError::Abandoned(operation.to_string()))?
}
