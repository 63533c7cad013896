//! Expiring mutual-exclusion lock held in the shared store.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::error::PipelineError;
use crate::infrastructure::store::StateStore;

/// Serializes job processing across worker processes.
pub const WORKER_LOCK_KEY: &str = "image_worker:lock";
/// Prevents overlapping populator runs.
pub const POPULATOR_LOCK_KEY: &str = "image_populator:lock";

/// A named lock acquired with set-if-absent and released with
/// compare-and-delete.
///
/// Each instance carries a random holder token, so a holder whose lock
/// already expired cannot release a lock someone else has since taken. The
/// TTL bounds how long a crashed holder can wedge the system.
pub struct DistributedLock {
    store: Arc<dyn StateStore>,
    key: String,
    holder: String,
    ttl: Duration,
}

impl DistributedLock {
    pub fn new(store: Arc<dyn StateStore>, key: impl Into<String>, ttl: Duration) -> Self {
        Self {
            store,
            key: key.into(),
            holder: new_holder_token(),
            ttl,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn holder(&self) -> &str {
        &self.holder
    }

    /// Attempts to take the lock. Returns false if someone else holds it.
    pub async fn try_acquire(&self) -> Result<bool, PipelineError> {
        let acquired = self
            .store
            .set_if_absent(&self.key, &self.holder, self.ttl)
            .await?;
        debug!(key = %self.key, acquired, "Lock acquisition");
        Ok(acquired)
    }

    /// Releases the lock if this instance still holds it.
    ///
    /// Errors are logged and swallowed; the TTL reclaims the lock anyway.
    pub async fn release(&self) {
        match self.store.delete_if_equals(&self.key, &self.holder).await {
            Ok(true) => debug!(key = %self.key, "Lock released"),
            Ok(false) => warn!(key = %self.key, "Lock expired or taken over before release"),
            Err(e) => warn!(key = %self.key, error = %e, "Lock release failed, waiting for TTL"),
        }
    }

    /// True if any holder currently has the lock.
    pub async fn is_held(&self) -> Result<bool, PipelineError> {
        Ok(self.store.exists(&self.key).await?)
    }
}

/// `<pid>-<16 hex chars>`; the pid helps when reading the key by hand.
fn new_holder_token() -> String {
    let mut buffer = [0u8; 8];
    if let Err(e) = getrandom::fill(&mut buffer) {
        warn!(error = %e, "No OS randomness for lock token, falling back to time");
        let nanos = chrono::Utc::now()
            .timestamp_nanos_opt()
            .unwrap_or_default()
            .to_le_bytes();
        buffer.copy_from_slice(&nanos);
    }
    format!("{}-{}", std::process::id(), hex::encode(buffer))
}
