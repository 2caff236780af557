//! Permission authorization
//!
//! Hierarchical, wildcard-aware, multi-scope policy resolution:
//! - **Default**: Built-in table, shared read-only (`Arc<DefaultPolicyTable>`)
//! - **Everyone / Role / User**: Per-tenant overrides in a `PolicyStore`
//!
//! ## Nodes
//!
//! Nodes are dot-separated lowercase segments (`mod.ban`). Stored keys may end
//! in `*` (`mod.*`) or be the bare `*`. Within one scope an exact key beats any
//! wildcard, and the longest matching wildcard prefix beats shorter ones.
//!
//! ## Example
//!
//! ```rust,ignore
//! use tenant_policy_engine::permissions::*;
//! use tenant_policy_engine::store::MemoryPolicyStore;
//! use std::sync::Arc;
//!
//! let table = Arc::new(DefaultPolicyTable::new([("mod.*", false), ("levels.use", true)])?);
//! let overrides = ScopeOverrideManager::new(Arc::new(MemoryPolicyStore::new()));
//! let resolver = PermissionResolver::new(table, overrides.clone());
//!
//! overrides.set_override(tenant, ScopeTarget::Role(mods), "mod.*", true).await?;
//!
//! let principal = Principal::new(user).with_roles([mods]);
//! if resolver.evaluate(&principal, tenant, "mod.ban").await {
//!     // perform the ban
//! }
//! ```

mod catalog;
mod defaults;
mod manager;
pub mod node;
mod principal;
mod resolver;
mod scope;

pub use catalog::NodeCatalog;
pub use defaults::DefaultPolicyTable;
pub use manager::ScopeOverrideManager;
pub use node::NodeMatch;
pub use principal::Principal;
pub use resolver::{Decision, DecisionSource, PermissionResolver, DEFAULT_SUPER_OWNER_NODES};
pub use scope::{Override, OverrideKey, OverrideState, Scope, ScopeTarget};
