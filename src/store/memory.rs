//! In-process settings store

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use serde_json::Value;

use crate::core::{PolicyError, PolicyResult, TenantId};

use super::{PolicyStore, Settings};

/// Settings held in memory, shared across tasks
///
/// Useful for tests and single-process deployments. Nothing survives a restart.
#[derive(Debug, Default)]
pub struct MemoryPolicyStore {
    tenants: RwLock<HashMap<TenantId, Settings>>,
}

impl MemoryPolicyStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of tenants with at least one setting
    pub fn tenant_count(&self) -> usize {
        self.tenants.read().map(|t| t.len()).unwrap_or(0)
    }
}

fn poisoned() -> PolicyError {
    PolicyError::store_unavailable("memory store lock poisoned")
}

#[async_trait]
impl PolicyStore for MemoryPolicyStore {
    async fn get(&self, tenant: TenantId) -> PolicyResult<Settings> {
        let tenants = self.tenants.read().map_err(|_| poisoned())?;
        Ok(tenants.get(&tenant).cloned().unwrap_or_default())
    }

    async fn set(&self, tenant: TenantId, key: &str, value: Option<Value>) -> PolicyResult<()> {
        let mut tenants = self.tenants.write().map_err(|_| poisoned())?;
        match value {
            Some(value) => {
                tenants
                    .entry(tenant)
                    .or_default()
                    .insert(key.to_string(), value);
            }
            None => {
                if let Some(settings) = tenants.get_mut(&tenant) {
                    settings.remove(key);
                    if settings.is_empty() {
                        tenants.remove(&tenant);
                    }
                }
            }
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_set_get_delete() {
        let store = MemoryPolicyStore::new();
        let tenant = TenantId(1);

        store.set(tenant, "prefix", Some(json!("!"))).await.unwrap();
        store.set(tenant, "perm:everyone::levels.use", Some(json!(false))).await.unwrap();

        let settings = store.get(tenant).await.unwrap();
        assert_eq!(settings.len(), 2);
        assert_eq!(settings["prefix"], json!("!"));

        store.set(tenant, "prefix", None).await.unwrap();
        let settings = store.get(tenant).await.unwrap();
        assert_eq!(settings.len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_tenant_is_empty() {
        let store = MemoryPolicyStore::new();
        assert!(store.get(TenantId(99)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_absent_key_is_noop() {
        let store = MemoryPolicyStore::new();
        store.set(TenantId(1), "missing", None).await.unwrap();
        assert_eq!(store.tenant_count(), 0);
    }

    #[tokio::test]
    async fn test_tenants_isolated() {
        let store = MemoryPolicyStore::new();
        store.set(TenantId(1), "k", Some(json!(true))).await.unwrap();

        assert!(store.get(TenantId(2)).await.unwrap().is_empty());
        assert_eq!(store.tenant_count(), 1);
    }
}
