//! Engine assembly
//!
//! Wires one shared `DefaultPolicyTable` into the resolver and the catalog,
//! and one store into the override manager.

use std::sync::Arc;

use crate::config::EngineConfig;
use crate::core::PolicyResult;
use crate::permissions::{NodeCatalog, PermissionResolver, ScopeOverrideManager};
use crate::store::PolicyStore;

/// The assembled authorization engine
#[derive(Debug, Clone)]
pub struct PolicyEngine {
    resolver: PermissionResolver,
    overrides: ScopeOverrideManager,
    catalog: NodeCatalog,
}

impl PolicyEngine {
    /// Build from configuration and a settings store
    pub fn from_config(config: &EngineConfig, store: Arc<dyn PolicyStore>) -> PolicyResult<Self> {
        let table = Arc::new(config.build_table()?);
        let overrides = ScopeOverrideManager::new(store);
        let resolver = PermissionResolver::new(table.clone(), overrides.clone())
            .with_super_owner_nodes(config.super_owner_nodes.iter().cloned());
        let catalog = NodeCatalog::new(table.clone());

        tracing::info!(
            "[PolicyEngine] Ready: {} default entries, {} super-owner nodes, store '{}'",
            table.len(),
            config.super_owner_nodes.len(),
            overrides.store().name()
        );

        Ok(Self {
            resolver,
            overrides,
            catalog,
        })
    }

    /// The decision entry point
    pub fn resolver(&self) -> &PermissionResolver {
        &self.resolver
    }

    /// Administrative override operations
    pub fn overrides(&self) -> &ScopeOverrideManager {
        &self.overrides
    }

    /// Node validation and listing
    pub fn catalog(&self) -> &NodeCatalog {
        &self.catalog
    }
}
