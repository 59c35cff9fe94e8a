// ============================================================================
// Contacts API Library
// ============================================================================

pub mod app;
pub mod config;
pub mod core;
pub mod prelude;
pub mod service;
pub mod storage;
pub mod web;

// Re-export main types for convenience
pub use app::{ContactsBootstrap, bootstrap, init_tracing, open_store, shutdown_signal};
pub use config::AppConfig;
pub use crate::core::{Contact, ContactError, ContactId, ContactList, ContactPage, PageToken, Result, StoreError};
pub use service::{BulkFailurePolicy, BulkInsertOutcome, BulkItemStatus, ContactService, PageLimits};
pub use storage::{ContactStore, FileStore, MemoryStore, RetryPolicy, RetryingStore, SharedStore};
pub use web::{AppState, WebError, build_router};
