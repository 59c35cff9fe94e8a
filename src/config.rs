use crate::service::{BulkFailurePolicy, PageLimits};
use crate::storage::RetryPolicy;
use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::path::PathBuf;

/// Default mount point of the API routes.
pub const DEFAULT_BASE_PATH: &str = "/_ah/api/contacts/v1";

#[derive(Debug, Clone)]
pub struct AppConfig {
    bind_addr: SocketAddr,
    /// `None` keeps contacts in memory only.
    data_dir: Option<PathBuf>,
    base_path: String,
    page_limits: PageLimits,
    bulk_policy: BulkFailurePolicy,
    retry: RetryPolicy,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        let bind_addr = env_string("CONTACTS_BIND_ADDR", "127.0.0.1:8080")
            .parse::<SocketAddr>()
            .context("CONTACTS_BIND_ADDR must be valid host:port")?;

        let data_dir = std::env::var("CONTACTS_DATA_DIR")
            .ok()
            .map(|raw| raw.trim().to_string())
            .filter(|raw| !raw.is_empty())
            .map(PathBuf::from);

        let defaults = PageLimits::default();
        let page_limits = PageLimits {
            default_page_size: env_usize("CONTACTS_DEFAULT_PAGE_SIZE", defaults.default_page_size)?,
            max_page_size: env_usize("CONTACTS_MAX_PAGE_SIZE", defaults.max_page_size)?,
        };
        if page_limits.max_page_size == 0 {
            return Err(anyhow::anyhow!("CONTACTS_MAX_PAGE_SIZE must be greater than zero"));
        }

        let bulk_policy = env_string("CONTACTS_BULK_POLICY", "fail_fast")
            .parse::<BulkFailurePolicy>()
            .map_err(|err| anyhow::anyhow!("CONTACTS_BULK_POLICY must be fail_fast|continue: {err}"))?;

        let retry_defaults = RetryPolicy::default();
        let retry = RetryPolicy {
            max_attempts: env_usize("CONTACTS_RETRY_ATTEMPTS", retry_defaults.max_attempts)?,
            base_backoff_ms: env_u64("CONTACTS_RETRY_BASE_MS", retry_defaults.base_backoff_ms)?,
            max_backoff_ms: env_u64("CONTACTS_RETRY_MAX_MS", retry_defaults.max_backoff_ms)?,
        };

        Ok(Self {
            bind_addr,
            data_dir,
            base_path: normalize_base_path(&env_string("CONTACTS_BASE_PATH", DEFAULT_BASE_PATH)),
            page_limits,
            bulk_policy,
            retry,
        })
    }

    /// In-memory store, loopback port 0, no retry delays.
    pub fn for_testing() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 0)),
            data_dir: None,
            base_path: DEFAULT_BASE_PATH.to_string(),
            page_limits: PageLimits::default(),
            bulk_policy: BulkFailurePolicy::default(),
            retry: RetryPolicy::disabled(),
        }
    }

    pub fn with_bind_addr(mut self, bind_addr: SocketAddr) -> Self {
        self.bind_addr = bind_addr;
        self
    }

    pub fn with_data_dir(mut self, data_dir: impl Into<PathBuf>) -> Self {
        self.data_dir = Some(data_dir.into());
        self
    }

    pub fn in_memory(mut self) -> Self {
        self.data_dir = None;
        self
    }

    pub fn with_base_path(mut self, base_path: &str) -> Self {
        self.base_path = normalize_base_path(base_path);
        self
    }

    pub fn with_page_limits(mut self, page_limits: PageLimits) -> Self {
        self.page_limits = page_limits;
        self
    }

    pub fn with_bulk_policy(mut self, bulk_policy: BulkFailurePolicy) -> Self {
        self.bulk_policy = bulk_policy;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn bind_addr(&self) -> SocketAddr {
        self.bind_addr
    }

    pub fn data_dir(&self) -> Option<&PathBuf> {
        self.data_dir.as_ref()
    }

    pub fn base_path(&self) -> &str {
        &self.base_path
    }

    pub fn page_limits(&self) -> PageLimits {
        self.page_limits
    }

    pub fn bulk_policy(&self) -> BulkFailurePolicy {
        self.bulk_policy
    }

    pub fn retry(&self) -> RetryPolicy {
        self.retry
    }
}

/// Leading slash, no trailing slash; `""` and `"/"` both mean the root.
fn normalize_base_path(raw: &str) -> String {
    let trimmed = raw.trim().trim_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("/{trimmed}")
    }
}

fn env_string(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_u64(key: &str, default: u64) -> Result<u64> {
    let raw = std::env::var(key).unwrap_or_else(|_| default.to_string());
    raw.parse::<u64>()
        .with_context(|| format!("{key} must be u64"))
}

fn env_usize(key: &str, default: usize) -> Result<usize> {
    let raw = std::env::var(key).unwrap_or_else(|_| default.to_string());
    raw.parse::<usize>()
        .with_context(|| format!("{key} must be usize"))
}
