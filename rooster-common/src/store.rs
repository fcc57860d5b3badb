//! JSON-file store shared by all Rooster services
//!
//! `db.json` holds tags, articles, subscriptions and review items.
//! `approved.json` is an append-only log of approved texts.
//!
//! Every write replaces the whole document through a uniquely named temp file
//! and a rename, so readers never observe a partially written file. A store
//! transaction holds an exclusive advisory lock on `db.json.lock` from
//! `begin()` to `commit()`, which serializes writers across processes (both
//! services share the file) as well as within one.

use chrono::Utc;
use fs4::fs_std::FileExt;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tokio::sync::{Mutex, MutexGuard};
use tracing::debug;

use crate::models::{next_id, ApprovedText, DashboardData};
use crate::{Error, Result};

/// File name of the main store inside the root folder
pub const STORE_FILE: &str = "db.json";
/// File name of the approved-text log inside the root folder
pub const APPROVED_FILE: &str = "approved.json";
/// Advisory lock file next to the main store
pub const STORE_LOCK_FILE: &str = "db.json.lock";

/// Read a JSON document, falling back to `T::default()` for a missing or empty file
async fn read_json_or_default<T>(path: &Path) -> Result<T>
where
    T: DeserializeOwned + Default,
{
    let content = match tokio::fs::read_to_string(path).await {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(T::default()),
        Err(e) => return Err(e.into()),
    };

    if content.trim().is_empty() {
        return Ok(T::default());
    }

    Ok(serde_json::from_str(&content)?)
}

fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}

/// Write a JSON document atomically (unique temp file in the same directory + rename)
async fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    let path = path.to_path_buf();

    tokio::task::spawn_blocking(move || -> Result<()> {
        let dir = parent_dir(&path);
        std::fs::create_dir_all(dir)?;

        let mut tmp = NamedTempFile::new_in(dir)?;
        tmp.write_all(json.as_bytes())?;
        tmp.as_file().sync_all()?;
        tmp.persist(&path).map_err(|e| e.error)?;

        debug!(path = %path.display(), "Store file written");
        Ok(())
    })
    .await
    .map_err(|e| Error::Internal(format!("Store write task failed: {}", e)))?
}

/// Open the lock file and block until its exclusive lock is held
///
/// The lock is released when the returned file is closed.
async fn lock_exclusive(path: &Path) -> Result<File> {
    let path = path.to_path_buf();

    tokio::task::spawn_blocking(move || -> Result<File> {
        std::fs::create_dir_all(parent_dir(&path))?;
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .read(true)
            .write(true)
            .open(&path)?;
        file.lock_exclusive()?;
        Ok(file)
    })
    .await
    .map_err(|e| Error::Internal(format!("Store lock task failed: {}", e)))?
}

/// Main dashboard store (`db.json`)
#[derive(Debug)]
pub struct JsonStore {
    path: PathBuf,
    lock_path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let lock_path = parent_dir(&path).join(STORE_LOCK_FILE);
        Self {
            path,
            lock_path,
            write_lock: Mutex::new(()),
        }
    }

    /// Store located in the given root folder
    pub fn in_root(root_folder: &Path) -> Self {
        Self::new(root_folder.join(STORE_FILE))
    }

    /// Read a snapshot of the whole store
    pub async fn load(&self) -> Result<DashboardData> {
        read_json_or_default(&self.path).await
    }

    /// Start a read-modify-write transaction
    ///
    /// Holds the in-process writer lock and the cross-process file lock
    /// until the transaction is committed or dropped. Dropping without
    /// `commit()` discards all changes.
    pub async fn begin(&self) -> Result<StoreTxn<'_>> {
        let guard = self.write_lock.lock().await;
        let file_lock = lock_exclusive(&self.lock_path).await?;
        let data = read_json_or_default(&self.path).await?;
        Ok(StoreTxn {
            _guard: guard,
            _file_lock: file_lock,
            path: &self.path,
            data,
        })
    }
}

/// An open transaction on a [`JsonStore`]
pub struct StoreTxn<'a> {
    _guard: MutexGuard<'a, ()>,
    _file_lock: File,
    path: &'a Path,
    pub data: DashboardData,
}

impl StoreTxn<'_> {
    /// Persist the modified document and release the lock
    pub async fn commit(self) -> Result<DashboardData> {
        write_json_atomic(self.path, &self.data).await?;
        Ok(self.data)
    }
}

/// Append-only log of approved texts (`approved.json`)
#[derive(Debug)]
pub struct ApprovedLog {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl ApprovedLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn in_root(root_folder: &Path) -> Self {
        Self::new(root_folder.join(APPROVED_FILE))
    }

    /// All approved entries in file order
    pub async fn list(&self) -> Result<Vec<ApprovedText>> {
        read_json_or_default(&self.path).await
    }

    /// Append an approved text, assigning the next id and the approval time
    pub async fn append(&self, text: &str) -> Result<ApprovedText> {
        let _guard = self.write_lock.lock().await;
        let mut entries: Vec<ApprovedText> = read_json_or_default(&self.path).await?;

        let entry = ApprovedText {
            id: next_id(entries.iter().map(|e| e.id)),
            text: text.to_string(),
            approved_at: Utc::now(),
        };
        entries.push(entry.clone());

        write_json_atomic(&self.path, &entries).await?;
        Ok(entry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Tag;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_missing_file_loads_default() {
        let dir = TempDir::new().unwrap();
        let store = JsonStore::in_root(dir.path());
        let data = store.load().await.unwrap();
        assert_eq!(data, DashboardData::default());
    }

    #[tokio::test]
    async fn test_empty_file_loads_default() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(STORE_FILE), "  \n").unwrap();
        let store = JsonStore::in_root(dir.path());
        assert!(store.load().await.unwrap().tags.is_empty());
    }

    #[tokio::test]
    async fn test_malformed_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(STORE_FILE), "{ not json").unwrap();
        let store = JsonStore::in_root(dir.path());
        assert!(matches!(store.load().await, Err(crate::Error::Json(_))));
    }

    #[tokio::test]
    async fn test_commit_persists_and_drop_discards() {
        let dir = TempDir::new().unwrap();
        let store = JsonStore::in_root(dir.path());

        let mut txn = store.begin().await.unwrap();
        txn.data.tags.push(Tag { id: 1, name: "Inflation".into() });
        txn.commit().await.unwrap();

        {
            let mut txn = store.begin().await.unwrap();
            txn.data.tags.clear();
            // dropped without commit
        }

        let data = store.load().await.unwrap();
        assert_eq!(data.tags.len(), 1);

        let leftovers: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .filter(|name| name != STORE_FILE && name != STORE_LOCK_FILE)
            .collect();
        assert!(leftovers.is_empty(), "unexpected files: {:?}", leftovers);
    }

    #[tokio::test]
    async fn test_transactions_on_separate_handles_are_serialized() {
        let dir = TempDir::new().unwrap();
        let dash = JsonStore::in_root(dir.path());

        let mut first = dash.begin().await.unwrap();
        first.data.tags.push(Tag { id: 1, name: "FromDash".into() });

        // A second handle on the same file, as another service would open it
        let root = dir.path().to_path_buf();
        let second = tokio::spawn(async move {
            let ingest = JsonStore::in_root(&root);
            let mut txn = ingest.begin().await.unwrap();
            let id = txn.data.next_tag_id();
            txn.data.tags.push(Tag { id, name: "FromIngest".into() });
            txn.commit().await.unwrap();
        });

        tokio::time::sleep(std::time::Duration::from_millis(200)).await;
        assert!(!second.is_finished());

        first.commit().await.unwrap();
        second.await.unwrap();

        let names: Vec<String> = dash.load().await.unwrap().tags.into_iter().map(|t| t.name).collect();
        assert_eq!(names, vec!["FromDash", "FromIngest"]);
    }

    #[tokio::test]
    async fn test_approved_log_assigns_sequential_ids() {
        let dir = TempDir::new().unwrap();
        let log = ApprovedLog::in_root(dir.path());

        let first = log.append("first").await.unwrap();
        let second = log.append("second").await.unwrap();
        assert_eq!(first.id, 1);
        assert_eq!(second.id, 2);

        let entries = log.list().await.unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].text, "second");
    }
}
