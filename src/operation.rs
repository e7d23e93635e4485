//! # Operation Module
//!
//! The original operations the router wraps.
//!
//! An [`OperationTable`] maps operation names to their default behavior. Each
//! entry declares its call convention when it is added:
//!
//! - [`OperationTable::blocking`]: `(invocation) -> Result<Value>`, the result
//!   is returned to the caller directly.
//! - [`OperationTable::deferred`]: `(invocation, callback)`, the result is
//!   delivered by calling `callback` exactly once, possibly later.
//!
//! The router never guesses a convention from the name: `stat` and `statSync`
//! are just two entries that happen to be declared differently.
//!
//! ```rust
//! use fsrouter::operation::OperationTable;
//! use serde_json::json;
//!
//! let table = OperationTable::new()
//!     .blocking("statSync", |inv| Ok(json!({ "path": inv.path })))
//!     .deferred("stat", |inv, done| done(Ok(json!({ "path": inv.path }))));
//! assert_eq!(table.len(), 2);
//! ```

use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::error::OperationMode;

/// Completion callback of a deferred operation.
pub type Callback = Box<dyn FnOnce(anyhow::Result<Value>) + Send + 'static>;

/// Original blocking operation.
pub type BlockingFn = dyn Fn(&Invocation) -> anyhow::Result<Value> + Send + Sync;

/// Original deferred operation. Must call the callback exactly once.
pub type DeferredFn = dyn Fn(Invocation, Callback) + Send + Sync;

/// The arguments of one call to a wrapped operation.
#[derive(Debug, Clone, PartialEq)]
pub struct Invocation {
    /// Name of the called operation
    pub operation: Arc<str>,
    /// First argument: the path the templates are matched against
    pub path: String,
    /// Remaining positional arguments, in call order
    pub args: Vec<Value>,
}

impl Invocation {
    #[must_use]
    pub fn new(operation: &str, path: impl Into<String>, args: Vec<Value>) -> Self {
        Self {
            operation: Arc::from(operation),
            path: path.into(),
            args,
        }
    }

    /// The full positional argument list, path first.
    #[must_use]
    pub fn arguments(&self) -> Arc<[Value]> {
        std::iter::once(Value::String(self.path.clone()))
            .chain(self.args.iter().cloned())
            .collect()
    }
}

/// An original operation with its declared call convention.
#[derive(Clone)]
pub enum Operation {
    Blocking(Arc<BlockingFn>),
    Deferred(Arc<DeferredFn>),
}

impl Operation {
    #[must_use]
    pub fn mode(&self) -> OperationMode {
        match self {
            Operation::Blocking(_) => OperationMode::Blocking,
            Operation::Deferred(_) => OperationMode::Deferred,
        }
    }
}

impl fmt::Debug for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Operation").field(&self.mode()).finish()
    }
}

/// Original operations keyed by name.
#[derive(Debug, Clone, Default)]
pub struct OperationTable {
    operations: HashMap<Arc<str>, Operation>,
}

impl OperationTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a blocking operation, replacing any entry with the same name.
    #[must_use]
    pub fn blocking<F>(mut self, name: &str, operation: F) -> Self
    where
        F: Fn(&Invocation) -> anyhow::Result<Value> + Send + Sync + 'static,
    {
        self.insert(name, Operation::Blocking(Arc::new(operation)));
        self
    }

    /// Add a deferred operation, replacing any entry with the same name.
    #[must_use]
    pub fn deferred<F>(mut self, name: &str, operation: F) -> Self
    where
        F: Fn(Invocation, Callback) + Send + Sync + 'static,
    {
        self.insert(name, Operation::Deferred(Arc::new(operation)));
        self
    }

    /// Insert an operation, returning the one it replaced.
    pub fn insert(&mut self, name: &str, operation: Operation) -> Option<Operation> {
        self.operations.insert(Arc::from(name), operation)
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Operation> {
        self.operations.get(name)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.operations.contains_key(name)
    }

    /// Operation names, sorted
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.operations.keys().map(AsRef::as_ref).collect();
        names.sort_unstable();
        names
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.operations.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }
}
