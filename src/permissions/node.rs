//! Node syntax and wildcard matching
//!
//! A node is a dot-separated list of lowercase segments (`mod.ban`).
//! Stored keys may additionally be wildcards: `mod.*` covers `mod` and
//! everything beneath it, and the bare `*` covers every node.

use std::sync::OnceLock;

use regex::Regex;

use crate::core::{PolicyError, PolicyResult};

/// The global wildcard key
pub const GLOBAL_WILDCARD: &str = "*";

/// Suffix that turns a prefix into a wildcard key
pub const WILDCARD_SUFFIX: &str = ".*";

fn literal_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[a-z0-9_-]+(\.[a-z0-9_-]+)*$").expect("node pattern is a valid regex")
    })
}

/// Check if a string is a well-formed literal node (no wildcard)
pub fn is_literal(node: &str) -> bool {
    literal_pattern().is_match(node)
}

/// Check if a string is a well-formed wildcard key (`*` or `prefix.*`)
pub fn is_wildcard(key: &str) -> bool {
    if key == GLOBAL_WILDCARD {
        return true;
    }
    key.strip_suffix(WILDCARD_SUFFIX).is_some_and(is_literal)
}

/// Trim and lowercase a node or key as typed by an administrator
pub fn normalize(node: &str) -> String {
    node.trim().to_lowercase()
}

/// Normalize and validate a key destined for storage
///
/// Accepts literal nodes and wildcard keys.
pub fn validate_key(raw: &str) -> PolicyResult<String> {
    let key = normalize(raw);
    if key.is_empty() {
        return Err(PolicyError::validation(raw, "node is empty"));
    }
    if is_literal(&key) || is_wildcard(&key) {
        return Ok(key);
    }
    let reason = if key.contains('*') {
        "a wildcard may only appear as the final segment"
    } else {
        "segments must be non-empty and use only a-z, 0-9, '_' or '-'"
    };
    Err(PolicyError::validation(raw, reason))
}

/// The top-level group of a node (`economy` for `economy.gambling.slots`)
pub fn top_level(node: &str) -> &str {
    node.split('.').next().unwrap_or(node)
}

/// A key that decided a lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeMatch {
    /// The stored key that matched (`mod.ban`, `mod.*`, `*`)
    pub key: String,
    /// The value stored under it
    pub allowed: bool,
}

/// Resolve a query node against a keyed policy
///
/// Order:
/// 1. Exact key
/// 2. Prefix wildcards, scanned from the shortest prefix to the full node.
///    Every hit overwrites the previous one, so the surviving match is the
///    longest prefix.
/// 3. The global `*`, only when no prefix wildcard matched
///
/// Returns `None` when nothing applies. The scan order matters: do not
/// replace it with a sort by key length.
pub fn resolve<F>(node: &str, lookup: F) -> Option<NodeMatch>
where
    F: Fn(&str) -> Option<bool>,
{
    if let Some(allowed) = lookup(node) {
        return Some(NodeMatch {
            key: node.to_string(),
            allowed,
        });
    }

    let mut best = None;
    let mut prefix = String::with_capacity(node.len());
    for segment in node.split('.') {
        if !prefix.is_empty() {
            prefix.push('.');
        }
        prefix.push_str(segment);

        let candidate = format!("{prefix}{WILDCARD_SUFFIX}");
        if let Some(allowed) = lookup(&candidate) {
            best = Some(NodeMatch {
                key: candidate,
                allowed,
            });
        }
    }

    best.or_else(|| {
        lookup(GLOBAL_WILDCARD).map(|allowed| NodeMatch {
            key: GLOBAL_WILDCARD.to_string(),
            allowed,
        })
    })
}
