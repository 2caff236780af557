//! Permission resolution
//!
//! Decides whether a principal may use a node in a tenant.
//!
//! Resolution order (first decisive answer wins):
//! 1. Super-owner-restricted nodes answer `principal.is_super_owner`, nothing else
//! 2. Tenant owner → allow
//! 3. Administrator → allow
//! 4. User override
//! 5. Role overrides across every held role, deny wins
//! 6. Everyone override
//! 7. Default policy table

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use serde::Serialize;

use crate::core::TenantId;
use crate::store::Settings;

use super::defaults::DefaultPolicyTable;
use super::manager::ScopeOverrideManager;
use super::node::{self, NodeMatch};
use super::principal::Principal;
use super::scope::ScopeTarget;

/// Nodes gated on super ownership when no set is configured
pub const DEFAULT_SUPER_OWNER_NODES: &[&str] = &["restart.use"];

/// What decided an evaluation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DecisionSource {
    /// Node is restricted to super owners
    SuperOwnerGate,
    TenantOwner,
    Administrator,
    /// A stored override of `target`, matched through `key`
    Override { target: ScopeTarget, key: String },
    /// The default table; `key` is `None` when nothing matched
    Default { key: Option<String> },
    /// The query was not a well-formed literal node
    InvalidNode,
}

/// Outcome of an evaluation together with its reason
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Decision {
    pub allowed: bool,
    pub source: DecisionSource,
}

impl Decision {
    fn new(allowed: bool, source: DecisionSource) -> Self {
        Self { allowed, source }
    }

    fn from_override(target: ScopeTarget, found: NodeMatch) -> Self {
        Self::new(
            found.allowed,
            DecisionSource::Override {
                target,
                key: found.key,
            },
        )
    }
}

/// The single decision entry point
///
/// Cheap to clone; holds only shared read-only state and a handle to the store.
#[derive(Clone)]
pub struct PermissionResolver {
    table: Arc<DefaultPolicyTable>,
    overrides: ScopeOverrideManager,
    super_owner_nodes: Arc<BTreeSet<String>>,
}

impl PermissionResolver {
    /// Create a resolver with the built-in super-owner set
    pub fn new(table: Arc<DefaultPolicyTable>, overrides: ScopeOverrideManager) -> Self {
        Self {
            table,
            overrides,
            super_owner_nodes: Arc::new(
                DEFAULT_SUPER_OWNER_NODES.iter().map(|n| n.to_string()).collect(),
            ),
        }
    }

    /// Replace the super-owner-restricted node set
    pub fn with_super_owner_nodes<I, S>(mut self, nodes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.super_owner_nodes = Arc::new(nodes.into_iter().map(Into::into).collect());
        self
    }

    /// Get the default table
    pub fn table(&self) -> &Arc<DefaultPolicyTable> {
        &self.table
    }

    /// Get the override manager
    pub fn overrides(&self) -> &ScopeOverrideManager {
        &self.overrides
    }

    /// Whether a node is restricted to super owners
    pub fn is_super_owner_node(&self, node: &str) -> bool {
        self.super_owner_nodes.contains(node)
    }

    /// Check if the principal may use `node` in `tenant`
    ///
    /// Never fails. Store errors make the affected scope count as unset.
    pub async fn evaluate(&self, principal: &Principal, tenant: TenantId, node: &str) -> bool {
        self.explain(principal, tenant, node).await.allowed
    }

    /// Evaluate and report what decided the answer
    pub async fn explain(&self, principal: &Principal, tenant: TenantId, node: &str) -> Decision {
        let decision = self.decide(principal, tenant, node).await;
        tracing::debug!(
            tenant = %tenant,
            user = %principal.user_id,
            node,
            allowed = decision.allowed,
            "[PermissionResolver] Decided by {:?}",
            decision.source
        );
        decision
    }

    async fn decide(&self, principal: &Principal, tenant: TenantId, node: &str) -> Decision {
        if self.is_super_owner_node(node) {
            return Decision::new(principal.is_super_owner, DecisionSource::SuperOwnerGate);
        }
        if principal.is_tenant_owner {
            return Decision::new(true, DecisionSource::TenantOwner);
        }
        if principal.has_administrator_flag {
            return Decision::new(true, DecisionSource::Administrator);
        }

        if !node::is_literal(node) {
            tracing::warn!(
                tenant = %tenant,
                "[PermissionResolver] Malformed query node '{}', denying",
                node
            );
            return Decision::new(false, DecisionSource::InvalidNode);
        }

        if let Some(settings) = self.read_overrides(tenant).await {
            if let Some(decision) = Self::override_opinion(&settings, principal, node) {
                return decision;
            }
        }

        let found = self.table.resolve_match(node);
        Decision::new(
            found.as_ref().map(|m| m.allowed).unwrap_or(false),
            DecisionSource::Default {
                key: found.map(|m| m.key),
            },
        )
    }

    /// First decisive override scope: user, then roles, then everyone
    ///
    /// Every scope is resolved from the same snapshot.
    fn override_opinion(settings: &Settings, principal: &Principal, node: &str) -> Option<Decision> {
        let user = ScopeTarget::User(principal.user_id);
        if let Some(found) = ScopeOverrideManager::resolve_in(settings, user, node) {
            return Some(Decision::from_override(user, found));
        }

        if let Some(decision) = Self::role_opinion(settings, principal, node) {
            return Some(decision);
        }

        let everyone = ScopeTarget::Everyone;
        ScopeOverrideManager::resolve_in(settings, everyone, node)
            .map(|found| Decision::from_override(everyone, found))
    }

    /// Combined opinion of every held role
    ///
    /// A deny from any role beats an allow from any other.
    fn role_opinion(settings: &Settings, principal: &Principal, node: &str) -> Option<Decision> {
        let opinions: Vec<(ScopeTarget, NodeMatch)> = principal
            .role_ids
            .iter()
            .filter_map(|role| {
                let target = ScopeTarget::Role(*role);
                ScopeOverrideManager::resolve_in(settings, target, node).map(|m| (target, m))
            })
            .collect();

        let (target, found) = opinions
            .iter()
            .find(|(_, m)| !m.allowed)
            .or_else(|| opinions.first())?
            .clone();
        Some(Decision::from_override(target, found))
    }

    /// The tenant's overrides, or `None` when the store cannot be read
    ///
    /// An unreadable store leaves every override scope without an opinion.
    async fn read_overrides(&self, tenant: TenantId) -> Option<Settings> {
        match self.overrides.snapshot(tenant).await {
            Ok(settings) => Some(settings),
            Err(e) => {
                tracing::warn!(
                    tenant = %tenant,
                    store = self.overrides.store().name(),
                    "[PermissionResolver] Override lookup failed, treating user, role and everyone scopes as unset: {}",
                    e
                );
                None
            }
        }
    }
}

impl fmt::Debug for PermissionResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PermissionResolver")
            .field("defaults", &self.table.len())
            .field("overrides", &self.overrides)
            .field("super_owner_nodes", &self.super_owner_nodes)
            .finish()
    }
}
