//! JSON file settings store
//!
//! Keeps one `<tenant>.json` object per tenant under a base directory.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde_json::Value;
use tokio::fs;
use tokio::sync::Mutex;

use crate::core::{PolicyResult, TenantId};

use super::{PolicyStore, Settings};

/// Default directory for tenant settings
const SETTINGS_DIR: &str = "tenant-settings";

/// File-backed settings store
///
/// Writes are read-modify-write of the whole tenant file, serialized by an
/// async mutex and published with a rename so readers never see a partial file.
#[derive(Debug)]
pub struct JsonFilePolicyStore {
    base_dir: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonFilePolicyStore {
    /// Create a store in the default directory
    pub fn new() -> Self {
        Self::with_dir(SETTINGS_DIR)
    }

    /// Create a store in a custom directory
    pub fn with_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: dir.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Get the settings file path for a tenant
    pub fn tenant_path(&self, tenant: TenantId) -> PathBuf {
        self.base_dir.join(format!("{tenant}.json"))
    }

    /// Get the base directory
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    async fn read_settings(&self, tenant: TenantId) -> PolicyResult<Settings> {
        let path = self.tenant_path(tenant);
        let bytes = match fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Settings::new()),
            Err(e) => return Err(e.into()),
        };
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Settings::new());
        }
        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn write_settings(&self, tenant: TenantId, settings: &Settings) -> PolicyResult<()> {
        let path = self.tenant_path(tenant);
        if settings.is_empty() {
            return match fs::remove_file(&path).await {
                Ok(()) => Ok(()),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
                Err(e) => Err(e.into()),
            };
        }

        fs::create_dir_all(&self.base_dir).await?;
        let tmp = path.with_extension("json.tmp");
        let json = serde_json::to_vec_pretty(settings)?;
        fs::write(&tmp, json).await?;
        fs::rename(&tmp, &path).await?;
        Ok(())
    }
}

impl Default for JsonFilePolicyStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PolicyStore for JsonFilePolicyStore {
    async fn get(&self, tenant: TenantId) -> PolicyResult<Settings> {
        self.read_settings(tenant).await
    }

    async fn set(&self, tenant: TenantId, key: &str, value: Option<Value>) -> PolicyResult<()> {
        let _guard = self.write_lock.lock().await;
        let mut settings = self.read_settings(tenant).await?;

        let changed = match value {
            Some(value) => settings.insert(key.to_string(), value.clone()) != Some(value),
            None => settings.remove(key).is_some(),
        };
        if !changed {
            return Ok(());
        }

        self.write_settings(tenant, &settings).await?;
        tracing::debug!(
            "[JsonFilePolicyStore] Wrote {} keys for tenant {}",
            settings.len(),
            tenant
        );
        Ok(())
    }

    fn name(&self) -> &str {
        "json-file"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::PolicyError;
    use serde_json::json;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn create_test_store() -> (JsonFilePolicyStore, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let store = JsonFilePolicyStore::with_dir(temp_dir.path());
        (store, temp_dir)
    }

    #[tokio::test]
    async fn test_set_and_reload() {
        let (store, temp) = create_test_store();
        let tenant = TenantId(10);

        store.set(tenant, "perm:role:5:mod.*", Some(json!(true))).await.unwrap();

        let reopened = JsonFilePolicyStore::with_dir(temp.path());
        let settings = reopened.get(tenant).await.unwrap();
        assert_eq!(settings["perm:role:5:mod.*"], json!(true));
        assert!(reopened.tenant_path(tenant).exists());
    }

    #[tokio::test]
    async fn test_missing_file_reads_empty() {
        let (store, _temp) = create_test_store();
        assert!(store.get(TenantId(1)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_last_key_removes_file() {
        let (store, _temp) = create_test_store();
        let tenant = TenantId(3);

        store.set(tenant, "k", Some(json!(false))).await.unwrap();
        store.set(tenant, "k", None).await.unwrap();

        assert!(!store.tenant_path(tenant).exists());
        store.set(tenant, "k", None).await.unwrap();
    }

    #[tokio::test]
    async fn test_corrupt_file_is_store_failure() {
        let (store, _temp) = create_test_store();
        let tenant = TenantId(4);
        std::fs::create_dir_all(store.base_dir()).unwrap();
        std::fs::write(store.tenant_path(tenant), "{not json").unwrap();

        let err = store.get(tenant).await.unwrap_err();
        assert!(matches!(err, PolicyError::Serialization(_)));
        assert!(err.is_store_failure());
    }

    #[tokio::test]
    async fn test_concurrent_writes_keep_every_key() {
        let (store, _temp) = create_test_store();
        let store = Arc::new(store);
        let tenant = TenantId(5);

        let mut handles = Vec::new();
        for i in 0..16 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store
                    .set(tenant, &format!("perm:user:{i}:mod.ban"), Some(json!(true)))
                    .await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(store.get(tenant).await.unwrap().len(), 16);
    }
}
