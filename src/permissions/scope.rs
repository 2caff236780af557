//! Scope and override value types

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::core::{RoleId, TenantId, UserId};

use super::node;

/// Level at which a policy opinion is recorded
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    /// A single user
    User,
    /// A role held by the user
    Role,
    /// Every member of the tenant
    Everyone,
    /// The built-in table (never stored per tenant)
    Default,
}

impl Scope {
    /// Lowercase name used in storage keys
    pub fn as_str(&self) -> &'static str {
        match self {
            Scope::User => "user",
            Scope::Role => "role",
            Scope::Everyone => "everyone",
            Scope::Default => "default",
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The subject an override is attached to
///
/// Carries the scope id where one exists, so an `Everyone` override can
/// never be written with a stray id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(tag = "scope", content = "id", rename_all = "lowercase")]
pub enum ScopeTarget {
    User(UserId),
    Role(RoleId),
    Everyone,
}

impl ScopeTarget {
    /// The scope this target belongs to
    pub fn scope(&self) -> Scope {
        match self {
            ScopeTarget::User(_) => Scope::User,
            ScopeTarget::Role(_) => Scope::Role,
            ScopeTarget::Everyone => Scope::Everyone,
        }
    }

    /// The scope id, absent for `Everyone`
    pub fn scope_id(&self) -> Option<u64> {
        match self {
            ScopeTarget::User(id) => Some(id.0),
            ScopeTarget::Role(id) => Some(id.0),
            ScopeTarget::Everyone => None,
        }
    }
}

impl fmt::Display for ScopeTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.scope_id() {
            Some(id) => write!(f, "{}:{}", self.scope(), id),
            None => write!(f, "{}", self.scope()),
        }
    }
}

/// Opinion of a single scope about a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverrideState {
    /// The scope has no matching override
    #[default]
    Unset,
    Allow,
    Deny,
}

impl OverrideState {
    /// Whether this scope expressed an opinion
    pub fn is_set(&self) -> bool {
        !matches!(self, OverrideState::Unset)
    }

    /// The opinion as a boolean, `None` when unset
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            OverrideState::Unset => None,
            OverrideState::Allow => Some(true),
            OverrideState::Deny => Some(false),
        }
    }
}

impl From<bool> for OverrideState {
    fn from(allowed: bool) -> Self {
        if allowed {
            OverrideState::Allow
        } else {
            OverrideState::Deny
        }
    }
}

impl From<Option<bool>> for OverrideState {
    fn from(value: Option<bool>) -> Self {
        value.map(OverrideState::from).unwrap_or_default()
    }
}

/// A stored override record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Override {
    pub tenant: TenantId,
    pub target: ScopeTarget,
    /// Literal node or wildcard key
    pub node: String,
    pub allowed: bool,
}

/// Flat storage key of an override: `perm:<scope>:<id>:<node>`
///
/// `Everyone` overrides leave the id empty (`perm:everyone::levels.use`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverrideKey {
    pub target: ScopeTarget,
    pub node: String,
}

impl OverrideKey {
    /// Prefix shared by every override key in a tenant's settings
    pub const PREFIX: &'static str = "perm:";

    pub fn new(target: ScopeTarget, node: impl Into<String>) -> Self {
        Self {
            target,
            node: node.into(),
        }
    }

    /// Key prefix covering every override of one target
    pub fn target_prefix(target: ScopeTarget) -> String {
        let id = target.scope_id().map(|id| id.to_string()).unwrap_or_default();
        format!("{}{}:{}:", Self::PREFIX, target.scope(), id)
    }

    /// Render the storage key
    pub fn encode(&self) -> String {
        format!("{}{}", Self::target_prefix(self.target), self.node)
    }

    /// Parse a storage key; `None` for keys that are not overrides
    pub fn decode(key: &str) -> Option<Self> {
        let rest = key.strip_prefix(Self::PREFIX)?;
        let mut parts = rest.splitn(3, ':');
        let scope = parts.next()?;
        let id = parts.next()?;
        let key_node = parts.next()?;
        if node::validate_key(key_node).ok()? != key_node {
            return None;
        }

        let target = match scope {
            "user" => ScopeTarget::User(UserId(canonical_id(id)?)),
            "role" => ScopeTarget::Role(RoleId(canonical_id(id)?)),
            "everyone" if id.is_empty() => ScopeTarget::Everyone,
            _ => return None,
        };
        Some(Self::new(target, key_node))
    }
}

/// Parse an id only if it is written the way `encode` writes it
fn canonical_id(id: &str) -> Option<u64> {
    let parsed: u64 = id.parse().ok()?;
    (parsed.to_string() == id).then_some(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_encoding() {
        let key = OverrideKey::new(ScopeTarget::Role(RoleId(55)), "mod.*");
        assert_eq!(key.encode(), "perm:role:55:mod.*");

        let key = OverrideKey::new(ScopeTarget::Everyone, "levels.use");
        assert_eq!(key.encode(), "perm:everyone::levels.use");
    }

    #[test]
    fn test_key_decoding() {
        let key = OverrideKey::decode("perm:user:9:economy.gambling.slots").unwrap();
        assert_eq!(key.target, ScopeTarget::User(UserId(9)));
        assert_eq!(key.node, "economy.gambling.slots");

        let key = OverrideKey::decode("perm:everyone::*").unwrap();
        assert_eq!(key.target, ScopeTarget::Everyone);
        assert_eq!(key.node, "*");
    }

    #[test]
    fn test_decode_rejects_foreign_keys() {
        assert!(OverrideKey::decode("prefix").is_none());
        assert!(OverrideKey::decode("perm:role:abc:mod.ban").is_none());
        assert!(OverrideKey::decode("perm:everyone:3:mod.ban").is_none());
        assert!(OverrideKey::decode("perm:default::mod.ban").is_none());
        assert!(OverrideKey::decode("perm:user:1:").is_none());
    }

    #[test]
    fn test_decode_rejects_non_canonical_records() {
        assert!(OverrideKey::decode("perm:user:007:mod.ban").is_none());
        assert!(OverrideKey::decode("perm:role:+5:mod.ban").is_none());
        assert!(OverrideKey::decode("perm:user:7:MOD.BAN").is_none());
        assert!(OverrideKey::decode("perm:role:5: mod.ban").is_none());
        assert!(OverrideKey::decode("perm:role:5:mod.*.ban").is_none());
        assert!(OverrideKey::decode("perm:user:7:mod.ban").is_some());
    }

    #[test]
    fn test_target_prefixes_do_not_collide() {
        let a = OverrideKey::target_prefix(ScopeTarget::Role(RoleId(1)));
        let b = OverrideKey::target_prefix(ScopeTarget::Role(RoleId(12)));
        assert!(!b.starts_with(&a));
    }

    #[test]
    fn test_override_state() {
        assert_eq!(OverrideState::from(true), OverrideState::Allow);
        assert_eq!(OverrideState::from(None), OverrideState::Unset);
        assert_eq!(OverrideState::Deny.as_bool(), Some(false));
        assert!(!OverrideState::Unset.is_set());
    }

    #[test]
    fn test_target_display() {
        assert_eq!(ScopeTarget::User(UserId(4)).to_string(), "user:4");
        assert_eq!(ScopeTarget::Everyone.to_string(), "everyone");
    }
}
