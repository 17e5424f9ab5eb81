use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::config::ConnectionConfig;
use crate::error::SqlBridgeError;

/// Process-lifetime store of known connection configs, keyed by connection id.
///
/// Every call is atomic on its own. Nothing orders a `get` against a concurrent `put` or
/// `remove` for the same id: the last writer wins, and a reader holding an `Arc` keeps the
/// config it already looked up.
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    entries: RwLock<HashMap<String, Arc<ConnectionConfig>>>,
}

impl ConnectionRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `config` under its connection id, returning the config it replaced.
    pub async fn put(&self, config: ConnectionConfig) -> Option<Arc<ConnectionConfig>> {
        let mut entries = self.entries.write().await;
        entries.insert(config.connection_id.clone(), Arc::new(config))
    }

    /// Look up the config stored for `connection_id`.
    ///
    /// # Errors
    /// Returns `SqlBridgeError::ConfigNotFound` if the id is unknown.
    pub async fn get(&self, connection_id: &str) -> Result<Arc<ConnectionConfig>, SqlBridgeError> {
        let entries = self.entries.read().await;
        entries
            .get(connection_id)
            .cloned()
            .ok_or_else(|| SqlBridgeError::ConfigNotFound(connection_id.to_string()))
    }

    /// Remove the entry for `connection_id`. Returns whether one existed; removing an
    /// unknown id is not an error.
    pub async fn remove(&self, connection_id: &str) -> bool {
        let mut entries = self.entries.write().await;
        entries.remove(connection_id).is_some()
    }

    pub async fn contains(&self, connection_id: &str) -> bool {
        self.entries.read().await.contains_key(connection_id)
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// Drop every entry (process teardown).
    pub async fn clear(&self) {
        self.entries.write().await.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg(id: &str, host: &str) -> ConnectionConfig {
        ConnectionConfig::new(id, host, 1433, "sales", "u", "p")
    }

    #[tokio::test]
    async fn put_overwrites_last_write_wins() {
        let registry = ConnectionRegistry::new();
        assert!(registry.put(cfg("c1", "db-a")).await.is_none());
        let replaced = registry.put(cfg("c1", "db-b")).await.unwrap();
        assert_eq!(replaced.host, "db-a");
        assert_eq!(registry.get("c1").await.unwrap().host, "db-b");
        assert_eq!(registry.len().await, 1);
    }

    #[tokio::test]
    async fn get_unknown_is_not_found() {
        let registry = ConnectionRegistry::new();
        assert_eq!(
            registry.get("nope").await.unwrap_err(),
            SqlBridgeError::ConfigNotFound("nope".into())
        );
    }

    #[tokio::test]
    async fn remove_is_idempotent() {
        let registry = ConnectionRegistry::new();
        registry.put(cfg("c1", "db")).await;
        assert!(registry.remove("c1").await);
        assert!(!registry.remove("c1").await);
        assert!(!registry.contains("c1").await);
        assert!(registry.is_empty().await);
    }

    #[tokio::test]
    async fn captured_config_survives_removal() {
        let registry = ConnectionRegistry::new();
        registry.put(cfg("c1", "db")).await;
        let captured = registry.get("c1").await.unwrap();
        registry.remove("c1").await;
        assert_eq!(captured.host, "db");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_puts_on_distinct_ids() {
        let registry = Arc::new(ConnectionRegistry::new());
        let mut handles = Vec::new();
        for i in 0..64 {
            let registry = Arc::clone(&registry);
            handles.push(tokio::spawn(async move {
                registry.put(cfg(&format!("c{i}"), "db")).await;
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }
        assert_eq!(registry.len().await, 64);
        registry.clear().await;
        assert!(registry.is_empty().await);
    }
}
