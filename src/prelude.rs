//! Common imports for code embedding the service or writing a store.

pub use crate::core::{Contact, ContactError, ContactId, ContactList, ContactPage, PageToken, StoreError};
pub use crate::service::{BulkFailurePolicy, ContactService};
pub use crate::storage::{ContactStore, SharedStore, StoreResult};
