//! Store adapters for contact records.
//!
//! The service layer only depends on [`ContactStore`]; concrete backends are
//! picked at bootstrap.

pub mod memory;
pub mod persistence;
pub mod retry;

use crate::core::{Contact, ContactId, ContactPage, PageToken, StoreError};
use async_trait::async_trait;
use std::sync::Arc;

pub use memory::MemoryStore;
pub use persistence::FileStore;
pub use retry::{RetryPolicy, RetryingStore};

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Key/value style access to persisted contacts.
///
/// Every call is atomic per key; concurrent writers to the same id resolve as
/// last-write-wins.
#[async_trait]
pub trait ContactStore: Send + Sync {
    /// Fetches a record, failing with `StoreError::NotFound` when absent.
    async fn get(&self, id: ContactId) -> StoreResult<Contact>;

    /// Inserts or overwrites. Assigns an id when the contact has none and
    /// returns the stored record.
    async fn put(&self, contact: Contact) -> StoreResult<Contact>;

    /// Removes a record, failing with `StoreError::NotFound` when absent.
    async fn delete(&self, id: ContactId) -> StoreResult<()>;

    /// Returns up to `limit` records in ascending id order, starting after the
    /// cursor carried by `page_token` (or from the beginning).
    async fn query(&self, limit: usize, page_token: Option<&PageToken>) -> StoreResult<ContactPage>;
}

pub type SharedStore = Arc<dyn ContactStore>;
