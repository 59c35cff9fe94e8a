//! Bulk insert-if-absent over an ordered batch.

use crate::core::{Contact, ContactError, Result, StoreError};
use crate::storage::ContactStore;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::{info, warn};

/// What happens when one item of a batch cannot be written.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BulkFailurePolicy {
    /// Abort at the first failing item. Items before it stay written.
    #[default]
    FailFast,
    /// Attempt every item and report failures by index.
    ContinueOnError,
}

impl FromStr for BulkFailurePolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fail_fast" | "fail-fast" => Ok(Self::FailFast),
            "continue" | "continue_on_error" => Ok(Self::ContinueOnError),
            other => Err(format!("unknown bulk failure policy '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BulkItemStatus {
    Inserted,
    Skipped,
    Failed,
}

/// One failed item under `ContinueOnError`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkFailure {
    pub index: usize,
    pub code: String,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BulkInsertOutcome {
    /// Post-operation state of every input item, in input order.
    pub items: Vec<Contact>,
    pub statuses: Vec<BulkItemStatus>,
    pub failures: Vec<BulkFailure>,
}

impl BulkInsertOutcome {
    pub fn count(&self, status: BulkItemStatus) -> usize {
        self.statuses.iter().filter(|s| **s == status).count()
    }
}

/// Writes each contact that does not already resolve to a stored record.
///
/// Items carrying an id that exists are skipped and come back as stored.
/// Everything else is validated and written, gaining an id if it had none.
pub async fn insert_many(
    store: &dyn ContactStore,
    policy: BulkFailurePolicy,
    contacts: Vec<Contact>,
) -> Result<BulkInsertOutcome> {
    let mut outcome = BulkInsertOutcome {
        items: Vec::with_capacity(contacts.len()),
        statuses: Vec::with_capacity(contacts.len()),
        failures: Vec::new(),
    };

    for (index, contact) in contacts.into_iter().enumerate() {
        match insert_if_absent(store, &contact).await {
            Ok((stored, status)) => {
                outcome.items.push(stored);
                outcome.statuses.push(status);
            }
            Err(err) => match policy {
                BulkFailurePolicy::FailFast => {
                    warn!(index, error = %err, "bulk insert aborted");
                    return Err(ContactError::BatchItemFailed {
                        index,
                        source: Box::new(err),
                    });
                }
                BulkFailurePolicy::ContinueOnError => {
                    warn!(index, error = %err, "bulk insert item failed");
                    outcome.failures.push(BulkFailure {
                        index,
                        code: err.code().to_string(),
                        message: err.to_string(),
                    });
                    outcome.items.push(contact);
                    outcome.statuses.push(BulkItemStatus::Failed);
                }
            },
        }
    }

    info!(
        inserted = outcome.count(BulkItemStatus::Inserted),
        skipped = outcome.count(BulkItemStatus::Skipped),
        failed = outcome.count(BulkItemStatus::Failed),
        "bulk insert finished"
    );
    Ok(outcome)
}

async fn insert_if_absent(
    store: &dyn ContactStore,
    contact: &Contact,
) -> Result<(Contact, BulkItemStatus)> {
    if let Some(id) = contact.id {
        match store.get(id).await {
            Ok(existing) => return Ok((existing, BulkItemStatus::Skipped)),
            Err(StoreError::NotFound(_)) => {}
            Err(err) => return Err(err.into()),
        }
    }

    contact.validate()?;
    let stored = store.put(contact.clone()).await?;
    Ok((stored, BulkItemStatus::Inserted))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ContactId;
    use crate::storage::MemoryStore;

    #[tokio::test]
    async fn persisted_items_are_skipped_and_new_ones_written() {
        let store = MemoryStore::new();
        let existing = store
            .put(Contact::named("Ann").with_phone("555"))
            .await
            .unwrap();

        // Same id, different payload: must not overwrite.
        let batch = vec![
            Contact::named("Changed").with_id(existing.id.unwrap()),
            Contact::named("Bob"),
        ];
        let outcome = insert_many(&store, BulkFailurePolicy::FailFast, batch)
            .await
            .unwrap();

        assert_eq!(
            outcome.statuses,
            [BulkItemStatus::Skipped, BulkItemStatus::Inserted]
        );
        assert_eq!(outcome.items[0], existing);
        assert!(outcome.items[1].id.is_some());
        assert_eq!(store.get(existing.id.unwrap()).await.unwrap(), existing);
    }

    #[tokio::test]
    async fn unknown_id_is_written_under_that_id() {
        let store = MemoryStore::new();
        let id = ContactId::new(40).unwrap();
        let outcome = insert_many(
            &store,
            BulkFailurePolicy::FailFast,
            vec![Contact::named("Zed").with_id(id)],
        )
        .await
        .unwrap();
        assert_eq!(outcome.items[0].id, Some(id));
        assert_eq!(outcome.statuses, [BulkItemStatus::Inserted]);
    }

    #[tokio::test]
    async fn fail_fast_reports_index_and_keeps_earlier_writes() {
        let store = MemoryStore::new();
        let batch = vec![Contact::named("Ann"), Contact::named(""), Contact::named("Cy")];
        let err = insert_many(&store, BulkFailurePolicy::FailFast, batch)
            .await
            .unwrap_err();

        assert!(matches!(err, ContactError::BatchItemFailed { index: 1, .. }));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn continue_on_error_attempts_everything() {
        let store = MemoryStore::new();
        let batch = vec![Contact::named(""), Contact::named("Bob"), Contact::named("")];
        let outcome = insert_many(&store, BulkFailurePolicy::ContinueOnError, batch)
            .await
            .unwrap();

        assert_eq!(outcome.items.len(), 3);
        assert_eq!(outcome.count(BulkItemStatus::Inserted), 1);
        let failed: Vec<usize> = outcome.failures.iter().map(|f| f.index).collect();
        assert_eq!(failed, [0, 2]);
        assert_eq!(outcome.failures[0].code, "invalid_argument");
        assert!(outcome.items[0].id.is_none());
    }

    #[test]
    fn policy_parses_from_config_strings() {
        assert_eq!("fail_fast".parse::<BulkFailurePolicy>(), Ok(BulkFailurePolicy::FailFast));
        assert_eq!("Continue".parse::<BulkFailurePolicy>(), Ok(BulkFailurePolicy::ContinueOnError));
        assert!("sometimes".parse::<BulkFailurePolicy>().is_err());
    }
}
