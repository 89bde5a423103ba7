//! Key-value persistence for audit snapshots, tags, and checklist state

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use async_trait::async_trait;
use rusqlite::{params, Connection};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::{BrowserSecurityAudit, ManualCheckState, TagEntry};

/// Persisted browser audit snapshot.
pub const KEY_BROWSER_AUDIT: &str = "browser_security_audit";
/// Opt-in preference for the browser settings audit.
pub const KEY_AUDIT_ENABLED: &str = "browser_audit_enabled";
/// Verified-state map for the manual hardening checklist.
pub const KEY_MANUAL_CHECKS: &str = "manual_security_checks";
/// Usage tags keyed by extension id.
pub const KEY_EXTENSION_TAGS: &str = "extension_tags";
/// Digest of the profile snapshot the last persisted scan was based on.
pub const KEY_PROFILE_DIGEST: &str = "profile_digest";

/// Storage boundary for everything the auditor keeps between runs.
///
/// Values are opaque JSON documents; the typed accessors below handle
/// the shapes the engine actually stores.
#[async_trait]
pub trait KvStore: Send + Sync {
    /// Fetch the value stored under `key`, if any.
    async fn get(&self, key: &str) -> anyhow::Result<Option<Value>>;

    /// Store `value` under `key`, replacing any previous value.
    async fn put(&self, key: &str, value: Value) -> anyhow::Result<()>;

    /// Delete the value under `key`. Removing a missing key is not an error.
    async fn remove(&self, key: &str) -> anyhow::Result<()>;
}

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open or create the store
    pub fn open(path: &Path) -> anyhow::Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)?;
        Self::initialize(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Open an in-memory store (for testing)
    pub fn open_in_memory() -> anyhow::Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::initialize(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Initialize store schema
    fn initialize(conn: &Connection) -> anyhow::Result<()> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS kv (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            "#,
        )?;

        info!("Store initialized");
        Ok(())
    }
}

#[async_trait]
impl KvStore for SqliteStore {
    async fn get(&self, key: &str) -> anyhow::Result<Option<Value>> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare("SELECT value FROM kv WHERE key = ?1")?;

        let raw: Option<String> = stmt
            .query_map([key], |row| row.get(0))?
            .filter_map(|r| r.ok())
            .next();

        match raw {
            Some(text) => Ok(Some(serde_json::from_str(&text)?)),
            None => Ok(None),
        }
    }

    async fn put(&self, key: &str, value: Value) -> anyhow::Result<()> {
        let conn = self.conn.lock().await;
        conn.execute(
            r#"
            INSERT INTO kv (key, value, updated_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at
            "#,
            params![key, value.to_string(), chrono::Utc::now().to_rfc3339()],
        )?;

        Ok(())
    }

    async fn remove(&self, key: &str) -> anyhow::Result<()> {
        let conn = self.conn.lock().await;
        conn.execute("DELETE FROM kv WHERE key = ?1", [key])?;
        Ok(())
    }
}

/// HashMap-backed store for tests and ephemeral runs.
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KvStore for MemoryStore {
    async fn get(&self, key: &str) -> anyhow::Result<Option<Value>> {
        Ok(self.entries.lock().await.get(key).cloned())
    }

    async fn put(&self, key: &str, value: Value) -> anyhow::Result<()> {
        self.entries.lock().await.insert(key.to_string(), value);
        Ok(())
    }

    async fn remove(&self, key: &str) -> anyhow::Result<()> {
        self.entries.lock().await.remove(key);
        Ok(())
    }
}

// ============================================================================
// Typed accessors
// ============================================================================

/// Read a key and deserialize it, falling back to the default when the key
/// is absent, unreadable, or holds a malformed payload. Audit state must
/// never be lost to a bad read; the caller gets an empty slate instead.
async fn load_or_default<T>(store: &dyn KvStore, key: &str) -> T
where
    T: DeserializeOwned + Default,
{
    match store.get(key).await {
        Ok(Some(value)) => match serde_json::from_value(value) {
            Ok(parsed) => parsed,
            Err(err) => {
                warn!("Ignoring malformed payload under '{}': {}", key, err);
                T::default()
            }
        },
        Ok(None) => T::default(),
        Err(err) => {
            warn!("Failed to read '{}': {}", key, err);
            T::default()
        }
    }
}

async fn save_json<T: Serialize>(
    store: &dyn KvStore,
    key: &str,
    value: &T,
) -> anyhow::Result<()> {
    store.put(key, serde_json::to_value(value)?).await
}

pub async fn load_tags(store: &dyn KvStore) -> BTreeMap<String, TagEntry> {
    load_or_default(store, KEY_EXTENSION_TAGS).await
}

pub async fn save_tags(
    store: &dyn KvStore,
    tags: &BTreeMap<String, TagEntry>,
) -> anyhow::Result<()> {
    save_json(store, KEY_EXTENSION_TAGS, tags).await
}

pub async fn load_manual_checks(store: &dyn KvStore) -> BTreeMap<String, ManualCheckState> {
    load_or_default(store, KEY_MANUAL_CHECKS).await
}

pub async fn save_manual_checks(
    store: &dyn KvStore,
    checks: &BTreeMap<String, ManualCheckState>,
) -> anyhow::Result<()> {
    save_json(store, KEY_MANUAL_CHECKS, checks).await
}

pub async fn load_audit(store: &dyn KvStore) -> BrowserSecurityAudit {
    load_or_default(store, KEY_BROWSER_AUDIT).await
}

pub async fn save_audit(
    store: &dyn KvStore,
    audit: &BrowserSecurityAudit,
) -> anyhow::Result<()> {
    save_json(store, KEY_BROWSER_AUDIT, audit).await
}

pub async fn load_opt_in(store: &dyn KvStore) -> bool {
    load_or_default(store, KEY_AUDIT_ENABLED).await
}

pub async fn save_opt_in(store: &dyn KvStore, enabled: bool) -> anyhow::Result<()> {
    save_json(store, KEY_AUDIT_ENABLED, &enabled).await
}

pub async fn load_profile_digest(store: &dyn KvStore) -> Option<String> {
    load_or_default(store, KEY_PROFILE_DIGEST).await
}

pub async fn save_profile_digest(store: &dyn KvStore, digest: &str) -> anyhow::Result<()> {
    save_json(store, KEY_PROFILE_DIGEST, &digest).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::UsageTag;
    use serde_json::json;

    #[tokio::test]
    async fn round_trips_values_through_sqlite() {
        let store = SqliteStore::open_in_memory().unwrap();

        store
            .put("a-key", json!({"n": 3, "s": "hello"}))
            .await
            .unwrap();

        let value = store.get("a-key").await.unwrap().unwrap();
        assert_eq!(value["n"], 3);
        assert_eq!(value["s"], "hello");

        store.remove("a-key").await.unwrap();
        assert!(store.get("a-key").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn put_overwrites_existing_value() {
        let store = SqliteStore::open_in_memory().unwrap();

        store.put("k", json!(1)).await.unwrap();
        store.put("k", json!(2)).await.unwrap();

        assert_eq!(store.get("k").await.unwrap(), Some(json!(2)));
    }

    #[tokio::test]
    async fn open_creates_missing_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/deeper/store.db");

        let store = SqliteStore::open(&path).unwrap();
        store.put("k", json!(true)).await.unwrap();

        assert!(path.exists());
    }

    #[tokio::test]
    async fn memory_store_behaves_like_sqlite() {
        let store = MemoryStore::new();

        assert!(store.get("missing").await.unwrap().is_none());
        store.put("k", json!("v")).await.unwrap();
        assert_eq!(store.get("k").await.unwrap(), Some(json!("v")));
        store.remove("k").await.unwrap();
        store.remove("k").await.unwrap();
        assert!(store.get("k").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn typed_accessors_default_when_empty() {
        let store = SqliteStore::open_in_memory().unwrap();

        assert!(load_tags(&store).await.is_empty());
        assert!(load_manual_checks(&store).await.is_empty());
        assert!(!load_opt_in(&store).await);

        let audit = load_audit(&store).await;
        assert!(!audit.granted);
        assert_eq!(audit.score, 0);
        assert!(audit.observations.is_empty());
    }

    #[tokio::test]
    async fn corrupt_payload_degrades_to_default() {
        let store = SqliteStore::open_in_memory().unwrap();

        store.put(KEY_EXTENSION_TAGS, json!(42)).await.unwrap();
        store
            .put(KEY_BROWSER_AUDIT, json!(["not", "an", "audit"]))
            .await
            .unwrap();

        assert!(load_tags(&store).await.is_empty());
        assert!(!load_audit(&store).await.granted);
    }

    #[tokio::test]
    async fn tags_round_trip_with_timestamps() {
        let store = SqliteStore::open_in_memory().unwrap();

        let mut tags = BTreeMap::new();
        tags.insert(
            "abc".to_string(),
            TagEntry {
                tag: UsageTag::RarelyUsed,
                tagged_at: chrono::Utc::now(),
            },
        );

        save_tags(&store, &tags).await.unwrap();
        let loaded = load_tags(&store).await;

        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded["abc"].tag, UsageTag::RarelyUsed);
    }

    #[tokio::test]
    async fn opt_in_round_trips() {
        let store = SqliteStore::open_in_memory().unwrap();

        save_opt_in(&store, true).await.unwrap();
        assert!(load_opt_in(&store).await);

        save_opt_in(&store, false).await.unwrap();
        assert!(!load_opt_in(&store).await);
    }
}
