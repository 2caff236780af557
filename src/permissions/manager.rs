//! Scope override manager
//!
//! Translates typed override operations into reads and writes of flat
//! `perm:<scope>:<id>:<node>` keys in a tenant's settings.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::core::{PolicyResult, TenantId};
use crate::store::{PolicyStore, Settings};

use super::node::{self, NodeMatch};
use super::scope::{Override, OverrideKey, OverrideState, ScopeTarget};

/// CRUD and lookup of per-tenant overrides
///
/// Holds no state of its own; every call goes to the store, so a write is
/// visible to the very next lookup.
#[derive(Clone)]
pub struct ScopeOverrideManager {
    store: Arc<dyn PolicyStore>,
}

impl ScopeOverrideManager {
    /// Create a manager over a settings store
    pub fn new(store: Arc<dyn PolicyStore>) -> Self {
        Self { store }
    }

    /// Get the underlying store
    pub fn store(&self) -> &Arc<dyn PolicyStore> {
        &self.store
    }

    /// Record an override, replacing any previous value for the same key
    pub async fn set_override(
        &self,
        tenant: TenantId,
        target: ScopeTarget,
        node: &str,
        allowed: bool,
    ) -> PolicyResult<()> {
        let node = node::validate_key(node)?;
        let key = OverrideKey::new(target, &node).encode();

        self.store.set(tenant, &key, Some(Value::Bool(allowed))).await?;
        tracing::info!(
            tenant = %tenant,
            "[ScopeOverrideManager] Set {} override {} = {}",
            target,
            node,
            allowed
        );
        Ok(())
    }

    /// Delete an override; deleting one that does not exist succeeds
    pub async fn remove_override(
        &self,
        tenant: TenantId,
        target: ScopeTarget,
        node: &str,
    ) -> PolicyResult<()> {
        let node = node::validate_key(node)?;
        let key = OverrideKey::new(target, &node).encode();

        self.store.set(tenant, &key, None).await?;
        tracing::info!(
            tenant = %tenant,
            "[ScopeOverrideManager] Removed {} override {}",
            target,
            node
        );
        Ok(())
    }

    /// Every override of one target, keyed by node
    pub async fn get_overrides_for_scope(
        &self,
        tenant: TenantId,
        target: ScopeTarget,
    ) -> PolicyResult<BTreeMap<String, bool>> {
        let settings = self.store.get(tenant).await?;
        Ok(overrides_in(&settings)
            .filter(|(key, _)| key.target == target)
            .map(|(key, allowed)| (key.node, allowed))
            .collect())
    }

    /// Every override of a tenant across all scopes
    ///
    /// Ordered by scope (user, role, everyone), then id, then node.
    pub async fn list_overrides(&self, tenant: TenantId) -> PolicyResult<Vec<Override>> {
        let settings = self.store.get(tenant).await?;
        let mut overrides: Vec<Override> = overrides_in(&settings)
            .map(|(key, allowed)| Override {
                tenant,
                target: key.target,
                node: key.node,
                allowed,
            })
            .collect();
        overrides.sort_by(|a, b| (a.target, &a.node).cmp(&(b.target, &b.node)));
        Ok(overrides)
    }

    /// Remove every override of one target, returning how many were removed
    ///
    /// Used when a role is deleted or a member leaves.
    pub async fn clear_scope(&self, tenant: TenantId, target: ScopeTarget) -> PolicyResult<usize> {
        let nodes = self.get_overrides_for_scope(tenant, target).await?;
        for node in nodes.keys() {
            let key = OverrideKey::new(target, node).encode();
            self.store.set(tenant, &key, None).await?;
        }
        if !nodes.is_empty() {
            tracing::info!(
                tenant = %tenant,
                "[ScopeOverrideManager] Cleared {} overrides for {}",
                nodes.len(),
                target
            );
        }
        Ok(nodes.len())
    }

    /// This target's opinion about a query node
    pub async fn resolve_override(
        &self,
        tenant: TenantId,
        target: ScopeTarget,
        node: &str,
    ) -> PolicyResult<OverrideState> {
        let found = self.resolve_override_match(tenant, target, node).await?;
        Ok(found.map(|m| m.allowed).into())
    }

    /// Like `resolve_override`, also reporting the key that matched
    pub async fn resolve_override_match(
        &self,
        tenant: TenantId,
        target: ScopeTarget,
        node: &str,
    ) -> PolicyResult<Option<NodeMatch>> {
        let settings = self.snapshot(tenant).await?;
        Ok(Self::resolve_in(&settings, target, node))
    }

    /// Read a tenant's settings once
    ///
    /// Lets several scopes be resolved against the same state with
    /// `resolve_in`.
    pub async fn snapshot(&self, tenant: TenantId) -> PolicyResult<Settings> {
        self.store.get(tenant).await
    }

    /// One target's opinion about a query node, from a settings snapshot
    pub fn resolve_in(settings: &Settings, target: ScopeTarget, node: &str) -> Option<NodeMatch> {
        node::resolve(node, |candidate| {
            let key = OverrideKey::new(target, candidate).encode();
            bool_value(&key, settings.get(&key)?)
        })
    }
}

impl fmt::Debug for ScopeOverrideManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScopeOverrideManager")
            .field("store", &self.store.name())
            .finish()
    }
}

/// Decode the override entries of a settings snapshot
fn overrides_in(settings: &Settings) -> impl Iterator<Item = (OverrideKey, bool)> + '_ {
    settings.iter().filter_map(|(raw, value)| {
        let key = OverrideKey::decode(raw)?;
        Some((key, bool_value(raw, value)?))
    })
}

/// The boolean stored under an override key; other values are ignored
fn bool_value(key: &str, value: &Value) -> Option<bool> {
    let allowed = value.as_bool();
    if allowed.is_none() {
        tracing::debug!(
            "[ScopeOverrideManager] Ignoring non-boolean value under {}: {}",
            key,
            value
        );
    }
    allowed
}
