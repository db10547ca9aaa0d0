//! Durable storage of each group's tournament collection.

use crate::models::{GroupId, Tournament};
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use thiserror::Error;
use tokio::sync::Mutex;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("storage format error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("storage unavailable")]
    Unavailable,
}

/// Whole-collection load/save per group. No transactional guarantees.
#[async_trait]
pub trait StateStore: Send + Sync {
    /// All tournaments stored for `group`; empty if nothing was saved yet.
    async fn load(&self, group: &str) -> Result<Vec<Tournament>, StorageError>;

    /// Replace the stored collection for `group`.
    async fn save(&self, group: &str, tournaments: &[Tournament]) -> Result<(), StorageError>;

    /// Groups that have a stored collection.
    async fn groups(&self) -> Result<Vec<GroupId>, StorageError>;
}

const FILE_PREFIX: &str = "group-";

/// One JSON file per group inside `dir`, named `group-<hex of the group id>.json`.
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, group: &str) -> PathBuf {
        self.dir
            .join(format!("{FILE_PREFIX}{}.json", hex::encode(group.as_bytes())))
    }

    /// Inverse of `path_for`; `None` for files this store did not write.
    fn group_of(file_name: &str) -> Option<GroupId> {
        let encoded = file_name.strip_prefix(FILE_PREFIX)?.strip_suffix(".json")?;
        let bytes = hex::decode(encoded).ok()?;
        String::from_utf8(bytes).ok()
    }
}

#[async_trait]
impl StateStore for JsonFileStore {
    async fn load(&self, group: &str) -> Result<Vec<Tournament>, StorageError> {
        match tokio::fs::read(self.path_for(group)).await {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }

    async fn save(&self, group: &str, tournaments: &[Tournament]) -> Result<(), StorageError> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let path = self.path_for(group);
        let tmp = path.with_extension("json.tmp");
        let bytes = serde_json::to_vec_pretty(tournaments)?;
        tokio::fs::write(&tmp, bytes).await?;
        tokio::fs::rename(&tmp, &path).await?;
        Ok(())
    }

    async fn groups(&self) -> Result<Vec<GroupId>, StorageError> {
        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        let mut groups = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let file_name = entry.file_name();
            let Some(file_name) = file_name.to_str() else {
                continue;
            };
            match Self::group_of(file_name) {
                Some(group) => groups.push(group),
                None if file_name.ends_with(".json") => {
                    log::warn!("Ignoring unrecognized file {} in the data directory", file_name);
                }
                None => {}
            }
        }
        groups.sort();
        Ok(groups)
    }
}

/// In-process store. `set_failing(true)` makes every save fail, for exercising best-effort persistence.
#[derive(Default)]
pub struct MemoryStore {
    data: Mutex<HashMap<GroupId, Vec<Tournament>>>,
    failing: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

#[async_trait]
impl StateStore for MemoryStore {
    async fn load(&self, group: &str) -> Result<Vec<Tournament>, StorageError> {
        Ok(self.data.lock().await.get(group).cloned().unwrap_or_default())
    }

    async fn save(&self, group: &str, tournaments: &[Tournament]) -> Result<(), StorageError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable);
        }
        self.data
            .lock()
            .await
            .insert(group.to_string(), tournaments.to_vec());
        Ok(())
    }

    async fn groups(&self) -> Result<Vec<GroupId>, StorageError> {
        let mut groups: Vec<_> = self.data.lock().await.keys().cloned().collect();
        groups.sort();
        Ok(groups)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_dir(label: &str) -> PathBuf {
        std::env::temp_dir().join(format!("bracket_cup_{label}_{}", uuid::Uuid::new_v4()))
    }

    #[tokio::test]
    async fn json_store_round_trips_a_group() {
        let dir = temp_dir("roundtrip");
        let store = JsonFileStore::new(&dir);
        assert!(store.load("guild-1").await.unwrap().is_empty());
        assert!(store.groups().await.unwrap().is_empty());

        let t = Tournament::new("guild-1", "Cup", 4).unwrap();
        store.save("guild-1", std::slice::from_ref(&t)).await.unwrap();

        let loaded = store.load("guild-1").await.unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].id, t.id);
        assert_eq!(store.groups().await.unwrap(), ["guild-1"]);
        let _ = std::fs::remove_dir_all(dir);
    }

    #[tokio::test]
    async fn similar_group_ids_get_separate_files() {
        let dir = temp_dir("similar");
        let store = JsonFileStore::new(&dir);
        let spaced = Tournament::new("team a", "Spring", 4).unwrap();
        let underscored = Tournament::new("team_a", "Autumn", 4).unwrap();
        store.save("team a", std::slice::from_ref(&spaced)).await.unwrap();
        store.save("team_a", std::slice::from_ref(&underscored)).await.unwrap();
        store.save("", &[]).await.unwrap();
        std::fs::write(dir.join("notes.json"), b"[]").unwrap();

        let loaded = store.load("team a").await.unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].id, spaced.id);
        assert_eq!(store.load("team_a").await.unwrap()[0].id, underscored.id);
        assert_eq!(store.groups().await.unwrap(), ["", "team a", "team_a"]);
        let _ = std::fs::remove_dir_all(dir);
    }

    #[tokio::test]
    async fn memory_store_failure_switch() {
        let store = MemoryStore::new();
        store.set_failing(true);
        assert!(matches!(
            store.save("g", &[]).await,
            Err(StorageError::Unavailable)
        ));
        store.set_failing(false);
        store.save("g", &[]).await.unwrap();
        assert_eq!(store.groups().await.unwrap(), ["g"]);
    }
}
