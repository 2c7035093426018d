//! Per-subdomain mutual exclusion for lifecycle operations.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard};

/// Table of async mutexes keyed by subdomain.
///
/// A lifecycle operation holds its subdomain's guard from first step to
/// last, so a teardown cannot rename a directory while a provision for the
/// same subdomain is writing into it. Entries nobody holds or waits on are
/// pruned on the next acquire.
#[derive(Default)]
pub struct TenantLocks {
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl TenantLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `subdomain`.
    pub async fn acquire(&self, subdomain: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().await;
            // The map's own reference is the only one left for idle entries.
            locks.retain(|key, lock| key == subdomain || Arc::strong_count(lock) > 1);
            Arc::clone(locks.entry(subdomain.to_string()).or_default())
        };
        lock.lock_owned().await
    }

    /// Number of tracked subdomains.
    pub async fn tracked(&self) -> usize {
        self.locks.lock().await.len()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
