//! # Dispatcher Module
//!
//! Runs chains of path-pattern handlers in front of named operations.
//!
//! ## Overview
//!
//! A [`Router`] owns, per operation name, an ordered list of bindings. Each
//! binding pairs a compiled path template with a [`Handler`]. The first
//! registration for a name installs an interception wrapper around the
//! original operation from the [`OperationTable`](crate::operation::OperationTable);
//! later registrations append to it.
//!
//! Calls go through the [`Operations`] facade:
//!
//! - [`Operations::call_sync`] for blocking operations. The chain runs on the
//!   calling thread and the result is returned.
//! - [`Operations::call`] for deferred operations. The chain runs as a tokio
//!   task and the result is delivered to a completion callback.
//! - [`Operations::call_async`] for deferred operations called from async code.
//!
//! ## Chain Semantics
//!
//! 1. Bindings are evaluated in registration order against the first argument
//! 2. A binding whose pattern does not match is skipped
//! 3. A matching handler gets a fresh [`Request`], the call's shared
//!    [`Response`] and a [`Next`]
//! 4. A handler failure aborts the chain and is reported as a
//!    [`HandlerError`](crate::error::HandlerError)
//! 5. [`Response::end`] stops the chain; the payload is the call's result
//! 6. Otherwise the original operation runs with the original arguments
//!
//! ## Example
//!
//! ```rust
//! use fsrouter::dispatcher::Router;
//! use fsrouter::operation::OperationTable;
//! use serde_json::json;
//!
//! let table = OperationTable::new().blocking("statSync", |inv| Ok(json!({ "real": inv.path })));
//! let router = Router::new(table);
//!
//! router
//!     .stat_sync("/:file", |req, res, _next| {
//!         if req.get_param("file") == Some("some-file") {
//!             res.end(json!({ "someData": 1 }));
//!         }
//!     })
//!     .unwrap();
//!
//! let fs = router.operations();
//! assert_eq!(fs.call_sync("statSync", "/some-file", vec![]).unwrap(), json!({ "someData": 1 }));
//! assert_eq!(fs.call_sync("statSync", "/other", vec![]).unwrap(), json!({ "real": "/other" }));
//! ```

mod core;
mod handler;
mod methods;

pub use core::{Operations, Router, RouterBuilder};
pub use handler::{Handled, Handler, Next, Request, Response};
pub use methods::SUPPORTED_OPERATIONS;
