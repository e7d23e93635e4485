use regex::Regex;
use smallvec::SmallVec;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

use crate::error::{InvalidPatternError, PatternErrorKind};

/// Maximum number of path parameters before heap allocation.
/// Filesystem templates rarely carry more than two or three.
pub const MAX_INLINE_PARAMS: usize = 8;

/// Stack-allocated parameter storage for the hot path.
///
/// Param names are `Arc<str>` because they come from the compiled template
/// and are shared by every match; values are per-invocation.
pub type ParamVec = SmallVec<[(Arc<str>, String); MAX_INLINE_PARAMS]>;

/// Default pattern for a named parameter: the shortest run of characters
/// within one path segment, stopping at `#` and `?`.
const SEGMENT: &str = "[^/#?]+?";

/// Pattern for a bare `*`: the rest of the path.
const SPLAT: &str = ".*";

/// Options applied when compiling a template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchOptions {
    /// Case-sensitive comparison of literal segments (default: false)
    pub sensitive: bool,
    /// Refuse a trailing `/` the template does not have (default: false)
    pub strict: bool,
    /// Require the template to consume the whole path (default: true).
    /// When false the template matches any path it is a segment prefix of.
    pub end: bool,
}

impl Default for MatchOptions {
    fn default() -> Self {
        Self {
            sensitive: false,
            strict: false,
            end: true,
        }
    }
}

/// Result of testing a path against a compiled pattern.
///
/// Produced fresh for every invocation; never cached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternMatch {
    /// Extracted parameters in template order. Optional parameters that did
    /// not participate in the match are absent.
    pub params: ParamVec,
    /// The portion of the tested value the template matched
    pub path: String,
}

impl PatternMatch {
    /// Get a parameter by name ("last write wins" if a name repeats)
    #[inline]
    #[must_use]
    pub fn get_param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .rfind(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }

    /// Convert params to a HashMap.
    /// Note: This allocates - use get_param() in hot paths
    #[must_use]
    pub fn params_map(&self) -> HashMap<String, String> {
        self.params
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }
}

/// A template compiled by a [`PatternMatcher`].
pub trait CompiledPattern: Send + Sync + fmt::Debug {
    /// The template this pattern was compiled from
    fn template(&self) -> &str;

    /// Test `value` against the pattern; `None` means no match.
    fn test(&self, value: &str) -> Option<PatternMatch>;
}

/// Compiles path templates. The router only depends on this contract.
pub trait PatternMatcher: Send + Sync {
    fn compile(&self, template: &str) -> Result<Arc<dyn CompiledPattern>, InvalidPatternError>;
}

/// The default matcher: path-to-regexp style templates backed by `regex`.
#[derive(Debug, Clone, Copy, Default)]
pub struct PathMatcher {
    options: MatchOptions,
}

impl PathMatcher {
    #[must_use]
    pub fn new(options: MatchOptions) -> Self {
        Self { options }
    }

    #[must_use]
    pub fn options(&self) -> MatchOptions {
        self.options
    }
}

impl PatternMatcher for PathMatcher {
    fn compile(&self, template: &str) -> Result<Arc<dyn CompiledPattern>, InvalidPatternError> {
        let pattern = PathPattern::compile(template, self.options)?;
        Ok(Arc::new(pattern))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Modifier {
    One,
    Optional,
    ZeroOrMore,
    OneOrMore,
}

#[derive(Debug)]
struct Param {
    name: Arc<str>,
    pattern: String,
    modifier: Modifier,
    prefix: String,
}

#[derive(Debug)]
enum Token {
    Literal(String),
    Param(Param),
}

/// A template compiled into an anchored regex plus its parameter names.
#[derive(Debug, Clone)]
pub struct PathPattern {
    template: String,
    regex: Regex,
    /// Capture group `i + 2` holds `param_names[i]`; group 1 is the matched path.
    param_names: Vec<Arc<str>>,
    end: bool,
}

impl PathPattern {
    /// Compile a template.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidPatternError`] for empty templates, parameters without
    /// a name, duplicate names, unbalanced or capturing groups, and custom
    /// patterns the regex engine rejects.
    pub fn compile(template: &str, options: MatchOptions) -> Result<Self, InvalidPatternError> {
        let invalid = |kind| InvalidPatternError::new(template, kind);

        if template.is_empty() {
            return Err(invalid(PatternErrorKind::Empty));
        }

        let tokens = tokenize(template).map_err(invalid)?;
        let (body, param_names) = build_body(&tokens);

        let mut source = String::with_capacity(body.len() + 16);
        if !options.sensitive {
            source.push_str("(?i)");
        }
        source.push_str("^(");
        source.push_str(&body);
        source.push(')');
        let trailing_slash = template.ends_with('/');
        if options.end {
            if !options.strict && !trailing_slash {
                source.push_str("/?");
            }
            source.push('$');
        } else if !trailing_slash {
            source.push_str("(?:/|$)");
        }

        let regex =
            Regex::new(&source).map_err(|e| invalid(PatternErrorKind::Regex(e.to_string())))?;

        debug!(
            template = %template,
            regex = %source,
            params = ?param_names,
            "Path pattern compiled"
        );

        Ok(Self {
            template: template.to_string(),
            regex,
            param_names,
            end: options.end,
        })
    }

    /// Parameter names in template order
    #[must_use]
    pub fn param_names(&self) -> &[Arc<str>] {
        &self.param_names
    }

    /// Test `value` against the pattern.
    #[must_use]
    pub fn matches(&self, value: &str) -> Option<PatternMatch> {
        let captures = self.regex.captures(value)?;
        let whole = if self.end {
            captures.get(0)
        } else {
            captures.get(1)
        };

        let mut params = ParamVec::new();
        for (i, name) in self.param_names.iter().enumerate() {
            if let Some(val) = captures.get(i + 2) {
                params.push((Arc::clone(name), val.as_str().to_string()));
            }
        }

        Some(PatternMatch {
            params,
            path: whole.map(|m| m.as_str().to_string()).unwrap_or_default(),
        })
    }
}

impl CompiledPattern for PathPattern {
    fn template(&self) -> &str {
        &self.template
    }

    fn test(&self, value: &str) -> Option<PatternMatch> {
        self.matches(value)
    }
}

fn tokenize(template: &str) -> Result<Vec<Token>, PatternErrorKind> {
    let chars: Vec<char> = template.chars().collect();
    let mut tokens = Vec::new();
    let mut literal = String::new();
    let mut seen = HashSet::new();
    let mut positional = 0usize;
    let mut i = 0;

    while i < chars.len() {
        let start = i;
        let (name, pattern) = match chars[i] {
            '\\' => {
                // Escaped character: always literal
                literal.push(chars.get(i + 1).copied().unwrap_or('\\'));
                i += 2;
                continue;
            }
            ':' => {
                i += 1;
                let name = read_name(&chars, &mut i);
                if name.is_empty() {
                    return Err(PatternErrorKind::MissingName(start));
                }
                let pattern = if chars.get(i) == Some(&'(') {
                    read_group(&chars, &mut i)?
                } else {
                    SEGMENT.to_string()
                };
                (name, pattern)
            }
            '{' => {
                i += 1;
                let name = read_name(&chars, &mut i);
                if chars.get(i) != Some(&'}') {
                    return Err(PatternErrorKind::UnterminatedBrace(start));
                }
                if name.is_empty() {
                    return Err(PatternErrorKind::MissingName(start));
                }
                i += 1;
                (name, SEGMENT.to_string())
            }
            '(' => {
                let pattern = read_group(&chars, &mut i)?;
                let name = positional.to_string();
                positional += 1;
                (name, pattern)
            }
            '*' => {
                i += 1;
                let name = positional.to_string();
                positional += 1;
                (name, SPLAT.to_string())
            }
            c => {
                literal.push(c);
                i += 1;
                continue;
            }
        };

        if !seen.insert(name.clone()) {
            return Err(PatternErrorKind::DuplicateName(name));
        }

        let modifier = if chars[start] == '*' {
            Modifier::One
        } else {
            read_modifier(&chars, &mut i)
        };

        // Optional and repeated params own the `/` in front of them, so
        // `/files/:name?` also matches `/files`.
        let mut prefix = String::new();
        if modifier != Modifier::One && literal.ends_with('/') {
            literal.pop();
            prefix.push('/');
        }
        if !literal.is_empty() {
            tokens.push(Token::Literal(std::mem::take(&mut literal)));
        }
        tokens.push(Token::Param(Param {
            name: Arc::from(name),
            pattern,
            modifier,
            prefix,
        }));
    }

    if !literal.is_empty() {
        tokens.push(Token::Literal(literal));
    }
    Ok(tokens)
}

fn read_name(chars: &[char], i: &mut usize) -> String {
    let mut name = String::new();
    while let Some(&c) = chars.get(*i) {
        if c.is_ascii_alphanumeric() || c == '_' {
            name.push(c);
            *i += 1;
        } else {
            break;
        }
    }
    name
}

/// Read a `( ... )` group starting at `chars[*i] == '('`, returning its body.
fn read_group(chars: &[char], i: &mut usize) -> Result<String, PatternErrorKind> {
    let start = *i;
    let mut depth = 1usize;
    let mut body = String::new();
    *i += 1;

    while let Some(&c) = chars.get(*i) {
        match c {
            '\\' => {
                body.push(c);
                if let Some(&next) = chars.get(*i + 1) {
                    body.push(next);
                }
                *i += 2;
                continue;
            }
            '(' => {
                let capturing = match chars.get(*i + 1) {
                    Some('?') => matches!(chars.get(*i + 2), Some('P') | Some('<')),
                    _ => true,
                };
                if capturing {
                    return Err(PatternErrorKind::CapturingGroup(*i));
                }
                depth += 1;
            }
            ')' => {
                depth -= 1;
                if depth == 0 {
                    *i += 1;
                    if body.is_empty() {
                        return Err(PatternErrorKind::EmptyGroup(start));
                    }
                    if body.starts_with('?') {
                        return Err(PatternErrorKind::GroupModifier(start));
                    }
                    return Ok(body);
                }
            }
            _ => {}
        }
        body.push(c);
        *i += 1;
    }

    Err(PatternErrorKind::UnbalancedGroup(start))
}

fn read_modifier(chars: &[char], i: &mut usize) -> Modifier {
    let modifier = match chars.get(*i) {
        Some('?') => Modifier::Optional,
        Some('*') => Modifier::ZeroOrMore,
        Some('+') => Modifier::OneOrMore,
        _ => return Modifier::One,
    };
    *i += 1;
    modifier
}

fn build_body(tokens: &[Token]) -> (String, Vec<Arc<str>>) {
    let mut body = String::new();
    let mut names = Vec::new();

    for token in tokens {
        match token {
            Token::Literal(text) => body.push_str(&regex::escape(text)),
            Token::Param(param) => {
                let prefix = regex::escape(&param.prefix);
                let pattern = &param.pattern;
                let group = match param.modifier {
                    Modifier::One => format!("{prefix}({pattern})"),
                    Modifier::Optional => format!("(?:{prefix}({pattern}))?"),
                    Modifier::OneOrMore => {
                        format!("{prefix}((?:{pattern})(?:{prefix}(?:{pattern}))*)")
                    }
                    Modifier::ZeroOrMore => {
                        format!("(?:{prefix}((?:{pattern})(?:{prefix}(?:{pattern}))*))?")
                    }
                };
                body.push_str(&group);
                names.push(Arc::clone(&param.name));
            }
        }
    }

    (body, names)
}
