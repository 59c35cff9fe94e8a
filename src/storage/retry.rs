use super::{ContactStore, StoreResult};
use crate::core::{Contact, ContactId, ContactPage, PageToken, StoreError};
use async_trait::async_trait;
use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// Bounded exponential backoff for transient store failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first one.
    pub max_attempts: usize,
    pub base_backoff_ms: u64,
    pub max_backoff_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_backoff_ms: 25,
            max_backoff_ms: 500,
        }
    }
}

impl RetryPolicy {
    /// A policy that tries exactly once.
    pub fn disabled() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// Backoff before attempt `attempt + 1`, where `attempt` is 1-based.
    pub fn backoff_ms(&self, attempt: usize) -> u64 {
        let base = self.base_backoff_ms.max(1);
        let cap = self.max_backoff_ms.max(base);

        let mut backoff = base;
        for _ in 1..attempt {
            backoff = backoff.saturating_mul(2).min(cap);
        }
        backoff
    }

    fn should_retry(&self, attempt: usize, err: &StoreError) -> bool {
        attempt < self.max_attempts.max(1) && err.is_transient()
    }
}

/// Decorates a store with retries around every call.
pub struct RetryingStore<S> {
    inner: S,
    policy: RetryPolicy,
}

impl<S: ContactStore> RetryingStore<S> {
    pub fn new(inner: S, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    async fn run<T, F, Fut>(&self, op: &'static str, mut call: F) -> StoreResult<T>
    where
        F: FnMut(usize) -> Fut + Send,
        Fut: Future<Output = StoreResult<T>> + Send,
    {
        let mut attempt = 1;
        loop {
            match call(attempt).await {
                Ok(value) => return Ok(value),
                Err(err) if self.policy.should_retry(attempt, &err) => {
                    let backoff = self.policy.backoff_ms(attempt);
                    warn!(op, attempt, backoff_ms = backoff, error = %err, "retrying store call");
                    tokio::time::sleep(Duration::from_millis(backoff)).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

#[async_trait]
impl<S: ContactStore> ContactStore for RetryingStore<S> {
    async fn get(&self, id: ContactId) -> StoreResult<Contact> {
        self.run("get", |_| self.inner.get(id)).await
    }

    async fn put(&self, contact: Contact) -> StoreResult<Contact> {
        // Without an id a lost response cannot be told apart from a failed
        // write, and a second attempt would allocate a second record.
        if contact.id.is_none() {
            return self.inner.put(contact).await;
        }
        self.run("put", |_| self.inner.put(contact.clone())).await
    }

    async fn delete(&self, id: ContactId) -> StoreResult<()> {
        self.run("delete", |attempt| async move {
            match self.inner.delete(id).await {
                // An earlier attempt may have landed before its response was lost.
                Err(StoreError::NotFound(_)) if attempt > 1 => Ok(()),
                other => other,
            }
        })
        .await
    }

    async fn query(&self, limit: usize, page_token: Option<&PageToken>) -> StoreResult<ContactPage> {
        self.run("query", |_| self.inner.query(limit, page_token)).await
    }
}
