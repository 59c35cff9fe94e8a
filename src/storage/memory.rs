use super::{ContactStore, StoreResult};
use crate::core::{Contact, ContactId, ContactPage, PageToken, StoreError};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::ops::Bound;
use tokio::sync::RwLock;

/// Ordered contact table plus the id allocator.
///
/// Shared by the in-memory and file-backed stores; all methods are
/// synchronous and run under the owning store's lock.
#[derive(Debug, Clone, Default)]
pub(crate) struct ContactTable {
    /// Last id handed out or observed. Allocation continues after it.
    last_id: u64,
    rows: BTreeMap<ContactId, Contact>,
}

impl ContactTable {
    pub(crate) fn from_rows(
        rows: impl IntoIterator<Item = Contact>,
        last_id: u64,
    ) -> StoreResult<Self> {
        let mut table = Self {
            last_id,
            rows: BTreeMap::new(),
        };
        for contact in rows {
            table.put(contact)?;
        }
        Ok(table)
    }

    pub(crate) fn last_id(&self) -> u64 {
        self.last_id
    }

    pub(crate) fn rows(&self) -> impl Iterator<Item = &Contact> {
        self.rows.values()
    }

    pub(crate) fn len(&self) -> usize {
        self.rows.len()
    }

    pub(crate) fn get(&self, id: ContactId) -> StoreResult<Contact> {
        self.rows.get(&id).cloned().ok_or(StoreError::NotFound(id))
    }

    pub(crate) fn put(&mut self, mut contact: Contact) -> StoreResult<Contact> {
        let id = match contact.id {
            Some(id) => {
                self.last_id = self.last_id.max(id.get());
                id
            }
            None => self.allocate()?,
        };
        contact.id = Some(id);
        self.rows.insert(id, contact.clone());
        Ok(contact)
    }

    pub(crate) fn delete(&mut self, id: ContactId) -> StoreResult<Contact> {
        self.rows.remove(&id).ok_or(StoreError::NotFound(id))
    }

    pub(crate) fn query(&self, limit: usize, page_token: Option<&PageToken>) -> StoreResult<ContactPage> {
        let lower = match page_token {
            Some(token) => Bound::Excluded(
                token
                    .cursor()
                    .map_err(|err| StoreError::Codec(err.to_string()))?,
            ),
            None => Bound::Unbounded,
        };

        let mut rows = self.rows.range((lower, Bound::Unbounded)).map(|(_, c)| c);
        let items: Vec<Contact> = rows.by_ref().take(limit).cloned().collect();

        let next_page_token = match (items.last(), rows.next()) {
            (Some(last), Some(_)) => last.id.map(PageToken::after),
            _ => None,
        };

        Ok(ContactPage {
            items,
            next_page_token,
        })
    }

    /// Hands out `last_id + 1`. Fails once an explicit id has taken `u64::MAX`.
    fn allocate(&mut self) -> StoreResult<ContactId> {
        let next = self
            .last_id
            .checked_add(1)
            .and_then(ContactId::new)
            .ok_or(StoreError::IdsExhausted)?;
        self.last_id = next.get();
        Ok(next)
    }
}

/// Process-local store. Contents are lost on shutdown.
#[derive(Debug, Default)]
pub struct MemoryStore {
    table: RwLock<ContactTable>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.table.read().await.len()
    }
}

#[async_trait]
impl ContactStore for MemoryStore {
    async fn get(&self, id: ContactId) -> StoreResult<Contact> {
        self.table.read().await.get(id)
    }

    async fn put(&self, contact: Contact) -> StoreResult<Contact> {
        self.table.write().await.put(contact)
    }

    async fn delete(&self, id: ContactId) -> StoreResult<()> {
        self.table.write().await.delete(id).map(|_| ())
    }

    async fn query(&self, limit: usize, page_token: Option<&PageToken>) -> StoreResult<ContactPage> {
        self.table.read().await.query(limit, page_token)
    }
}
