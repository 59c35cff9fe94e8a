pub mod error;
pub mod types;

pub use error::{ContactError, Result, StoreError};
pub use types::{Contact, ContactId, ContactList, ContactPage, PageToken};
