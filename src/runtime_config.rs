//! # Runtime Configuration Module
//!
//! Environment variable-based configuration for the router's default path
//! matcher.
//!
//! ## Environment Variables
//!
//! | Variable | Default | Effect |
//! |----------|---------|--------|
//! | `FSROUTER_CASE_SENSITIVE` | `false` | Literal segments compare case-sensitively |
//! | `FSROUTER_STRICT` | `false` | A trailing `/` the template lacks is refused |
//! | `FSROUTER_END` | `true` | Templates must match the whole path |
//!
//! Booleans accept `1`/`true`/`yes`/`on` and `0`/`false`/`no`/`off`, in any
//! case. Anything else keeps the default.
//!
//! ## Usage
//!
//! ```rust
//! use fsrouter::runtime_config::RouterConfig;
//!
//! let config = RouterConfig::from_env();
//! println!("case sensitive: {}", config.case_sensitive);
//! ```
//!
//! ```bash
//! # Match /Docs and /docs differently
//! export FSROUTER_CASE_SENSITIVE=true
//! ```

use std::env;
use tracing::warn;

use crate::pattern::MatchOptions;

/// Router configuration loaded from environment variables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouterConfig {
    /// Case-sensitive matching of literal segments (default: false)
    pub case_sensitive: bool,
    /// Refuse trailing slashes the template does not have (default: false)
    pub strict: bool,
    /// Templates must consume the whole path (default: true)
    pub end: bool,
}

impl Default for RouterConfig {
    fn default() -> Self {
        let options = MatchOptions::default();
        Self {
            case_sensitive: options.sensitive,
            strict: options.strict,
            end: options.end,
        }
    }
}

impl RouterConfig {
    /// Load configuration from environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through `lookup` instead of the process environment.
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let flag = |key: &str, default: bool| match lookup(key) {
            Some(val) => parse_bool(&val).unwrap_or_else(|| {
                warn!(key = %key, value = %val, default = default, "Invalid boolean - using default");
                default
            }),
            None => default,
        };

        RouterConfig {
            case_sensitive: flag("FSROUTER_CASE_SENSITIVE", defaults.case_sensitive),
            strict: flag("FSROUTER_STRICT", defaults.strict),
            end: flag("FSROUTER_END", defaults.end),
        }
    }

    /// Options for the default path matcher
    #[must_use]
    pub fn match_options(&self) -> MatchOptions {
        MatchOptions {
            sensitive: self.case_sensitive,
            strict: self.strict,
            end: self.end,
        }
    }
}

fn parse_bool(val: &str) -> Option<bool> {
    match val.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
