//! Per-tenant settings persistence
//!
//! The engine only needs two operations from persistence:
//! - `get` - a full snapshot of one tenant's settings
//! - `set` - write or delete (`None`) a single key
//!
//! Override records live in the same flat key/value bag as any other tenant
//! setting; see `permissions::OverrideKey` for the key scheme.

mod file;
mod memory;

use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::Value;

use crate::core::{PolicyResult, TenantId};

pub use file::JsonFilePolicyStore;
pub use memory::MemoryPolicyStore;

/// Snapshot of one tenant's settings
pub type Settings = HashMap<String, Value>;

/// Trait for settings backends
///
/// Implementations own write serialization: concurrent `set` calls on
/// different keys of the same tenant must not lose each other.
#[async_trait]
pub trait PolicyStore: Send + Sync {
    /// Read every setting of a tenant
    ///
    /// A tenant with no settings yields an empty map, not an error.
    async fn get(&self, tenant: TenantId) -> PolicyResult<Settings>;

    /// Write a single key, or delete it when `value` is `None`
    ///
    /// Deleting an absent key succeeds.
    async fn set(&self, tenant: TenantId, key: &str, value: Option<Value>) -> PolicyResult<()>;

    /// Store name for logging and debugging
    fn name(&self) -> &str;
}
