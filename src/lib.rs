//! # fsrouter
//!
//! **fsrouter** puts chains of path-pattern middleware in front of named
//! operations, in the style of an HTTP router, but for filesystem-style calls
//! such as `stat`, `readFile` or `mkdirSync`.
//!
//! ## Overview
//!
//! An [`OperationTable`] holds the original operations. A [`Router`] wraps
//! them: handlers are registered per operation against a path template, and
//! every call runs the handlers whose template matches the call's first
//! argument, in registration order. Any handler may end the chain with a
//! result of its own; otherwise the original operation runs unchanged.
//!
//! Two call conventions are supported:
//!
//! - **Blocking** operations return their result directly
//!   ([`Operations::call_sync`])
//! - **Deferred** operations deliver it through a completion callback
//!   ([`Operations::call`]) or a future ([`Operations::call_async`])
//!
//! ## Architecture
//!
//! - **[`pattern`]** - Path template compilation and matching
//! - **[`operation`]** - The original operations and their call conventions
//! - **[`dispatcher`]** - Bindings, handler chains and the call facade
//! - **[`error`]** - Registration and chain errors
//! - **[`runtime_config`]** - Environment-driven matcher configuration
//! - **[`logging`]** - Structured logging setup
//!
//! ## Quick Start
//!
//! ```rust
//! use fsrouter::{OperationTable, Router};
//! use serde_json::json;
//!
//! let table = OperationTable::new()
//!     .blocking("statSync", |inv| Ok(json!({ "path": inv.path, "size": 0 })));
//!
//! let router = Router::new(table);
//! router
//!     .stat_sync("/virtual/:name", |req, res, _next| {
//!         res.end(json!({ "path": req.path, "virtual": req.get_param("name") }));
//!     })
//!     .unwrap();
//!
//! let fs = router.operations();
//! let stat = fs.call_sync("statSync", "/virtual/a.txt", vec![]).unwrap();
//! assert_eq!(stat["virtual"], json!("a.txt"));
//! ```
//!
//! ## Handler Outcomes
//!
//! A handler is any `Fn(Request, Response, Next) -> R` where `R` converts into
//! [`Handled`]: `()`, a `Result<(), E>`, or a boxed future of
//! `anyhow::Result<()>`. Failures abort the chain and reach the caller as a
//! [`HandlerError`] wrapping the handler's own error.

pub mod dispatcher;
pub mod error;
pub mod logging;
pub mod operation;
pub mod pattern;
pub mod runtime_config;

pub use dispatcher::{
    Handled, Handler, Next, Operations, Request, Response, Router, RouterBuilder,
    SUPPORTED_OPERATIONS,
};
pub use error::{DispatchError, HandlerError, InvalidPatternError, OperationMode};
pub use operation::{Invocation, Operation, OperationTable};
pub use pattern::{MatchOptions, PathMatcher, PatternMatcher};
pub use runtime_config::RouterConfig;
