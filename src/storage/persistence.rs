//! File-backed contact store.
//!
//! Every successful mutation rewrites a JSON snapshot of the whole table. The
//! write goes to a sibling `*.tmp` file first and is renamed into place, so a
//! crash mid-write leaves the previous snapshot intact.

use super::memory::ContactTable;
use super::{ContactStore, StoreResult};
use crate::core::{Contact, ContactId, ContactPage, PageToken, StoreError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{debug, info};

/// Snapshot file name inside the data directory.
pub const SNAPSHOT_FILE_NAME: &str = "contacts.json";

const SNAPSHOT_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct ContactSnapshot {
    version: u32,
    last_id: u64,
    contacts: Vec<Contact>,
}

impl ContactSnapshot {
    fn capture(table: &ContactTable) -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            last_id: table.last_id(),
            contacts: table.rows().cloned().collect(),
        }
    }
}

pub struct FileStore {
    path: PathBuf,
    table: Mutex<ContactTable>,
}

impl FileStore {
    /// Opens the store rooted at `data_dir`, loading an existing snapshot.
    pub async fn open(data_dir: impl AsRef<Path>) -> StoreResult<Self> {
        let data_dir = data_dir.as_ref();
        fs::create_dir_all(data_dir).await.map_err(|err| {
            StoreError::Io(format!(
                "Failed to create data directory '{}': {}",
                data_dir.display(),
                err
            ))
        })?;

        let path = data_dir.join(SNAPSHOT_FILE_NAME);
        let table = load_snapshot(&path).await?;
        info!(
            path = %path.display(),
            contacts = table.len(),
            "opened file-backed contact store"
        );

        Ok(Self {
            path,
            table: Mutex::new(table),
        })
    }

    pub fn snapshot_path(&self) -> &Path {
        &self.path
    }

    /// Applies `mutation` to a copy of the table and commits it only after
    /// the snapshot has been written.
    async fn mutate<T>(
        &self,
        mutation: impl FnOnce(&mut ContactTable) -> StoreResult<T>,
    ) -> StoreResult<T> {
        let mut table = self.table.lock().await;
        let mut next = table.clone();
        let out = mutation(&mut next)?;

        let bytes = serde_json::to_vec_pretty(&ContactSnapshot::capture(&next))
            .map_err(|err| StoreError::Codec(err.to_string()))?;
        atomic_write(&self.path, &bytes).await?;
        debug!(path = %self.path.display(), contacts = next.len(), "snapshot written");

        *table = next;
        Ok(out)
    }
}

#[async_trait]
impl ContactStore for FileStore {
    async fn get(&self, id: ContactId) -> StoreResult<Contact> {
        self.table.lock().await.get(id)
    }

    async fn put(&self, contact: Contact) -> StoreResult<Contact> {
        self.mutate(|table| table.put(contact)).await
    }

    async fn delete(&self, id: ContactId) -> StoreResult<()> {
        self.mutate(|table| table.delete(id).map(|_| ())).await
    }

    async fn query(&self, limit: usize, page_token: Option<&PageToken>) -> StoreResult<ContactPage> {
        self.table.lock().await.query(limit, page_token)
    }
}

async fn load_snapshot(path: &Path) -> StoreResult<ContactTable> {
    let bytes = match fs::read(path).await {
        Ok(bytes) => bytes,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return Ok(ContactTable::default());
        }
        Err(err) => {
            return Err(StoreError::Io(format!(
                "Failed to read snapshot '{}': {}",
                path.display(),
                err
            )));
        }
    };

    let snapshot: ContactSnapshot = serde_json::from_slice(&bytes).map_err(|err| {
        StoreError::Codec(format!(
            "Failed to decode snapshot '{}': {}",
            path.display(),
            err
        ))
    })?;
    if snapshot.version != SNAPSHOT_VERSION {
        return Err(StoreError::Codec(format!(
            "Unsupported snapshot version {} in '{}'",
            snapshot.version,
            path.display()
        )));
    }
    if let Some(missing) = snapshot.contacts.iter().position(|c| c.id.is_none()) {
        return Err(StoreError::Codec(format!(
            "Snapshot '{}' has a contact without id at position {}",
            path.display(),
            missing
        )));
    }

    ContactTable::from_rows(snapshot.contacts, snapshot.last_id)
}

async fn atomic_write(path: &Path, bytes: &[u8]) -> StoreResult<()> {
    let tmp = path.with_extension("tmp");
    fs::write(&tmp, bytes).await.map_err(|err| {
        StoreError::Io(format!(
            "Failed to write temp file '{}': {}",
            tmp.display(),
            err
        ))
    })?;

    fs::rename(&tmp, path).await.map_err(|err| {
        StoreError::Io(format!(
            "Failed to rename temp file '{}' -> '{}': {}",
            tmp.display(),
            path.display(),
            err
        ))
    })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn reopen_restores_rows_and_allocator() {
        let dir = TempDir::new().unwrap();

        let first_id = {
            let store = FileStore::open(dir.path()).await.unwrap();
            let ann = store.put(Contact::named("Ann").with_country("NO")).await.unwrap();
            let bob = store.put(Contact::named("Bob")).await.unwrap();
            store.delete(bob.id.unwrap()).await.unwrap();
            ann.id.unwrap()
        };

        let store = FileStore::open(dir.path()).await.unwrap();
        let ann = store.get(first_id).await.unwrap();
        assert_eq!(ann.name, "Ann");
        assert_eq!(ann.country.as_deref(), Some("NO"));

        // Bob's id (2) must not be reused after restart.
        let carl = store.put(Contact::named("Carl")).await.unwrap();
        assert_eq!(carl.id.map(ContactId::get), Some(3));
    }

    #[tokio::test]
    async fn exhausted_allocator_reopens_and_keeps_rejecting() {
        let dir = TempDir::new().unwrap();
        let max = ContactId::new(u64::MAX).unwrap();
        {
            let store = FileStore::open(dir.path()).await.unwrap();
            store.put(Contact::named("Max").with_id(max)).await.unwrap();
            let before = std::fs::read(store.snapshot_path()).unwrap();
            assert_eq!(
                store.put(Contact::named("Next")).await,
                Err(StoreError::IdsExhausted)
            );
            assert_eq!(std::fs::read(store.snapshot_path()).unwrap(), before);
        }

        let store = FileStore::open(dir.path()).await.unwrap();
        assert_eq!(store.get(max).await.unwrap().name, "Max");
        assert_eq!(
            store.put(Contact::named("Next")).await,
            Err(StoreError::IdsExhausted)
        );
    }

    #[tokio::test]
    async fn failed_delete_leaves_snapshot_untouched() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::open(dir.path()).await.unwrap();
        store.put(Contact::named("Ann")).await.unwrap();
        let before = std::fs::read(store.snapshot_path()).unwrap();

        let missing = ContactId::new(99).unwrap();
        assert_eq!(store.delete(missing).await, Err(StoreError::NotFound(missing)));
        assert_eq!(std::fs::read(store.snapshot_path()).unwrap(), before);
    }

    #[tokio::test]
    async fn corrupt_snapshot_is_a_codec_error() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(SNAPSHOT_FILE_NAME), b"{not json").unwrap();
        let result = FileStore::open(dir.path()).await;
        assert!(matches!(result, Err(StoreError::Codec(_))));
    }

    #[tokio::test]
    async fn missing_directory_is_created() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("a").join("b");
        let store = FileStore::open(&nested).await.unwrap();
        store.put(Contact::named("Ann")).await.unwrap();
        assert!(nested.join(SNAPSHOT_FILE_NAME).exists());
    }
}
