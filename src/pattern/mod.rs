//! # Pattern Module
//!
//! Path templates and the matcher contract the router compiles them with.
//!
//! ## Overview
//!
//! The router never interprets templates itself. It hands each template to a
//! [`PatternMatcher`] at registration time and keeps the resulting
//! [`CompiledPattern`]. On every invocation the compiled pattern is tested
//! against the operation's first argument; a hit yields a [`PatternMatch`]
//! with the extracted parameters and the matched portion of the path.
//!
//! ## Template syntax
//!
//! [`PathMatcher`] is the default matcher. Templates compile to a single
//! anchored regex:
//!
//! | Template            | Matches                      | Params                 |
//! |---------------------|------------------------------|------------------------|
//! | `/some-file`        | `/some-file`                 | none                   |
//! | `/:file`            | `/some-file`                 | `file = "some-file"`   |
//! | `/{file}`           | `/some-file`                 | `file = "some-file"`   |
//! | `/user/:id(\d+)`    | `/user/42`                   | `id = "42"`            |
//! | `/files/:name?`     | `/files`, `/files/a`         | `name` when present    |
//! | `/files/:rest*`     | `/files`, `/files/a/b`       | `rest = "a/b"`         |
//! | `/files/:rest+`     | `/files/a`, `/files/a/b`     | `rest = "a/b"`         |
//! | `/assets/*`         | `/assets/css/site.css`       | `0 = "css/site.css"`   |
//!
//! A parameter without a custom pattern stops at `/`, `#` and `?` and takes
//! as little as it can, so in `/:a-:b` the first `-` splits the two.
//! Matching is case-insensitive and tolerates a trailing `/` unless
//! [`MatchOptions`] say otherwise.
//!
//! ## Example
//!
//! ```rust
//! use fsrouter::pattern::{MatchOptions, PathPattern};
//!
//! let pattern = PathPattern::compile("/:file", MatchOptions::default()).unwrap();
//! let matched = pattern.matches("/some-file").unwrap();
//! assert_eq!(matched.get_param("file"), Some("some-file"));
//! assert_eq!(matched.path, "/some-file");
//! ```

mod core;
#[cfg(test)]
mod tests;

pub use core::{
    CompiledPattern, MatchOptions, ParamVec, PathMatcher, PathPattern, PatternMatch,
    PatternMatcher, MAX_INLINE_PARAMS,
};
