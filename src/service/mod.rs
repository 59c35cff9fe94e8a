//! Contact entity service.
//!
//! Applies the existence and upsert rules on top of any [`ContactStore`].
//! Insert and update are both unconditional upserts; get and delete resolve
//! the id first and fail with `NotFound` when it does not exist.

pub mod bulk;

use crate::core::{Contact, ContactError, ContactId, ContactPage, PageToken, Result, StoreError};
use crate::storage::SharedStore;
use tracing::{debug, info};

pub use bulk::{BulkFailure, BulkFailurePolicy, BulkInsertOutcome, BulkItemStatus};

/// Page size bounds for `list`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageLimits {
    pub default_page_size: usize,
    pub max_page_size: usize,
}

impl Default for PageLimits {
    fn default() -> Self {
        Self {
            default_page_size: 20,
            max_page_size: 100,
        }
    }
}

impl PageLimits {
    /// Resolves the requested limit. Zero is rejected; larger values are
    /// clamped to `max_page_size`.
    pub fn resolve(&self, requested: Option<usize>) -> Result<usize> {
        let max = self.max_page_size.max(1);
        match requested {
            None => Ok(self.default_page_size.clamp(1, max)),
            Some(0) => Err(ContactError::Validation(
                "limit must be greater than zero".to_string(),
            )),
            Some(limit) => Ok(limit.min(max)),
        }
    }
}

#[derive(Clone)]
pub struct ContactService {
    store: SharedStore,
    limits: PageLimits,
    bulk_policy: BulkFailurePolicy,
}

impl ContactService {
    pub fn new(store: SharedStore) -> Self {
        Self {
            store,
            limits: PageLimits::default(),
            bulk_policy: BulkFailurePolicy::default(),
        }
    }

    pub fn with_page_limits(mut self, limits: PageLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn with_bulk_policy(mut self, policy: BulkFailurePolicy) -> Self {
        self.bulk_policy = policy;
        self
    }

    pub fn bulk_policy(&self) -> BulkFailurePolicy {
        self.bulk_policy
    }

    /// Writes `contact`, assigning an id when it has none.
    pub async fn insert(&self, contact: Contact) -> Result<Contact> {
        contact.validate()?;
        let stored = self.store.put(contact).await?;
        info!(id = ?stored.id, "contact inserted");
        Ok(stored)
    }

    /// Same write path as `insert`. A missing id is not an error; the record
    /// is created.
    pub async fn update(&self, contact: Contact) -> Result<Contact> {
        contact.validate()?;
        let stored = self.store.put(contact).await?;
        info!(id = ?stored.id, "contact updated");
        Ok(stored)
    }

    /// Deletes the record and returns it as it was just before removal.
    pub async fn delete(&self, id: ContactId) -> Result<Contact> {
        let existing = self.resolve(id).await?;
        match self.store.delete(id).await {
            Ok(()) | Err(StoreError::NotFound(_)) => {}
            Err(err) => return Err(err.into()),
        }
        info!(%id, "contact deleted");
        Ok(existing)
    }

    pub async fn get(&self, id: ContactId) -> Result<Contact> {
        let contact = self.resolve(id).await?;
        debug!(%id, "contact fetched");
        Ok(contact)
    }

    /// Lists one page in store order. `page_token` of `None` (or empty)
    /// starts from the beginning.
    pub async fn list(&self, limit: Option<usize>, page_token: Option<&str>) -> Result<ContactPage> {
        let limit = self.limits.resolve(limit)?;
        let token = match page_token.map(str::trim).filter(|raw| !raw.is_empty()) {
            Some(raw) => Some(raw.parse::<PageToken>()?),
            None => None,
        };

        let page = self.store.query(limit, token.as_ref()).await?;
        debug!(
            limit,
            returned = page.items.len(),
            has_more = page.next_page_token.is_some(),
            "contacts listed"
        );
        Ok(page)
    }

    /// Inserts every item that is not already persisted. See [`bulk`].
    pub async fn insert_many(&self, contacts: Vec<Contact>) -> Result<BulkInsertOutcome> {
        bulk::insert_many(self.store.as_ref(), self.bulk_policy, contacts).await
    }

    /// Resolves `id` to the stored record; a missing record is `NotFound`.
    async fn resolve(&self, id: ContactId) -> Result<Contact> {
        match self.store.get(id).await {
            Ok(contact) => Ok(contact),
            Err(StoreError::NotFound(_)) => Err(ContactError::contact_not_found()),
            Err(err) => Err(err.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use std::sync::Arc;

    fn service() -> ContactService {
        ContactService::new(Arc::new(MemoryStore::new()))
    }

    fn id(raw: u64) -> ContactId {
        ContactId::new(raw).unwrap()
    }

    #[test]
    fn page_limits_resolve() {
        let limits = PageLimits {
            default_page_size: 20,
            max_page_size: 50,
        };
        assert_eq!(limits.resolve(None).unwrap(), 20);
        assert_eq!(limits.resolve(Some(5)).unwrap(), 5);
        assert_eq!(limits.resolve(Some(500)).unwrap(), 50);
        assert!(matches!(limits.resolve(Some(0)), Err(ContactError::Validation(_))));
    }

    #[tokio::test]
    async fn insert_rejects_blank_name_without_writing() {
        let svc = service();
        let err = svc.insert(Contact::named(" ")).await.unwrap_err();
        assert!(matches!(err, ContactError::Validation(_)));
        assert!(svc.list(None, None).await.unwrap().items.is_empty());
    }

    #[tokio::test]
    async fn update_of_unknown_id_creates_it() {
        let svc = service();
        let updated = svc
            .update(Contact::named("Ghost").with_id(id(7)))
            .await
            .unwrap();
        assert_eq!(updated.id, Some(id(7)));
        assert_eq!(svc.get(id(7)).await.unwrap().name, "Ghost");
    }

    #[tokio::test]
    async fn update_overwrites_all_fields() {
        let svc = service();
        let ann = svc
            .insert(Contact::named("Ann").with_email("ann@example.com"))
            .await
            .unwrap();
        let replacement = Contact::named("Ann B").with_id(ann.id.unwrap());
        svc.update(replacement.clone()).await.unwrap();

        let stored = svc.get(ann.id.unwrap()).await.unwrap();
        assert_eq!(stored, replacement);
        assert_eq!(stored.email, None);
    }

    #[tokio::test]
    async fn get_and_delete_unknown_ids_are_not_found() {
        let svc = service();
        let get = svc.get(id(3)).await.unwrap_err();
        let delete = svc.delete(id(3)).await.unwrap_err();
        assert!(matches!(get, ContactError::NotFound(_)));
        assert!(matches!(delete, ContactError::NotFound(ref msg) if msg == "Contact not found."));
    }

    #[tokio::test]
    async fn list_rejects_bad_tokens_and_ignores_empty_ones() {
        let svc = service();
        svc.insert(Contact::named("Ann")).await.unwrap();
        assert!(matches!(
            svc.list(Some(1), Some("nope")).await,
            Err(ContactError::Validation(_))
        ));
        assert_eq!(svc.list(Some(1), Some("")).await.unwrap().items.len(), 1);
    }
}
