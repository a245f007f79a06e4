//! Permission pattern matching.
//!
//! Patterns have the form `Tool` or `Tool(argument-glob)`. Two patterns
//! match under one of three modes, tried in order:
//!
//! - [`MatchMode::Exact`]: the strings are equal.
//! - [`MatchMode::Wildcard`]: one side contains `*`, which matches any run
//!   of characters, and the other side fits it. Everything else in the
//!   wildcard side is literal.
//! - [`MatchMode::ParenPrefix`]: one side is a bare tool name and the other
//!   is the same tool with an argument list, so `Read` matches `Read(*)`
//!   and `Read(./src/**)`.
//!
//! The relation is symmetric. Malformed patterns never error; they just
//! fail to match.

use regex::Regex;

/// How two patterns were found to match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchMode {
    /// Identical strings
    Exact,
    /// A `*` wildcard on either side covers the other
    Wildcard,
    /// Bare tool name against the same tool with arguments
    ParenPrefix,
}

/// The mode under which `a` and `b` match, if any.
#[must_use]
pub fn match_mode(a: &str, b: &str) -> Option<MatchMode> {
    if a == b {
        Some(MatchMode::Exact)
    } else if wildcard_covers(a, b) || wildcard_covers(b, a) {
        Some(MatchMode::Wildcard)
    } else if paren_prefix(a, b) || paren_prefix(b, a) {
        Some(MatchMode::ParenPrefix)
    } else {
        None
    }
}

/// Whether `a` and `b` match under any mode.
#[must_use]
pub fn matches(a: &str, b: &str) -> bool {
    match_mode(a, b).is_some()
}

/// Whether any rule matches any of the given patterns.
#[must_use]
pub fn matches_any<'a>(rules: impl IntoIterator<Item = &'a String>, patterns: &[&str]) -> bool {
    rules.into_iter().any(|rule| patterns.iter().any(|pattern| matches(rule, pattern)))
}

/// `glob` contains `*` and its translation matches all of `candidate`.
fn wildcard_covers(glob: &str, candidate: &str) -> bool {
    if !glob.contains('*') {
        return false;
    }

    let body = glob.split('*').map(regex::escape).collect::<Vec<_>>().join(".*");
    Regex::new(&format!("^{body}$")).is_ok_and(|re| re.is_match(candidate))
}

/// `bare` is a tool name and `qualified` is `bare(...)`.
fn paren_prefix(bare: &str, qualified: &str) -> bool {
    if !is_tool_name(bare) {
        return false;
    }

    qualified
        .strip_prefix(bare)
        .is_some_and(|rest| rest.len() >= 2 && rest.starts_with('(') && rest.ends_with(')'))
}

fn is_tool_name(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}
