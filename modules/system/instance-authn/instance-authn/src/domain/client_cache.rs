use std::future::Future;
use std::sync::Arc;

use instance_authn_sdk::{PlatformClient, PlatformError};
use parking_lot::RwLock;
use tokio::sync::Mutex;
use tracing::{info, warn};

/// Observable state of a [`PlatformClientCache`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    Absent,
    Fresh,
    Tainted,
}

enum CacheState {
    Absent,
    Fresh(Arc<dyn PlatformClient>),
    Tainted,
}

/// Process-wide platform client, shared by all logins and renewals.
///
/// Connecting is single-flight: concurrent callers that find the cache
/// absent or tainted wait for one connection attempt. A failed attempt
/// leaves the state unchanged, so the next caller tries again.
pub struct PlatformClientCache {
    /// Current state (sync lock for fast access and sync taint).
    state: RwLock<CacheState>,
    /// Serializes connection attempts.
    connect_lock: Mutex<()>,
}

impl Default for PlatformClientCache {
    fn default() -> Self {
        Self::new()
    }
}

impl PlatformClientCache {
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: RwLock::new(CacheState::Absent),
            connect_lock: Mutex::new(()),
        }
    }

    /// Returns the cached client, or builds one with `connect` when the
    /// cache is absent or tainted.
    ///
    /// # Errors
    ///
    /// Returns `Err(PlatformError)` if the provided `connect` future fails.
    pub async fn get_or_connect<F, Fut>(
        &self,
        connect: F,
    ) -> Result<Arc<dyn PlatformClient>, PlatformError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Arc<dyn PlatformClient>, PlatformError>>,
    {
        if let Some(client) = self.fresh() {
            return Ok(client);
        }

        let _connect_guard = self.connect_lock.lock().await;

        // Another caller may have connected while we waited.
        if let Some(client) = self.fresh() {
            return Ok(client);
        }

        let was_tainted = self.status() == CacheStatus::Tainted;
        let client = connect().await.inspect_err(|e| {
            warn!(error = %e, was_tainted, "platform client connection failed");
        })?;

        *self.state.write() = CacheState::Fresh(Arc::clone(&client));
        info!(was_tainted, "platform client connected");

        Ok(client)
    }

    /// Marks `client` unusable if it is still the cached one. The next
    /// caller reconnects.
    ///
    /// Returns `true` if the cache was tainted by this call.
    #[must_use]
    pub fn taint(&self, client: &Arc<dyn PlatformClient>) -> bool {
        let mut state = self.state.write();
        match &*state {
            CacheState::Fresh(current) if same_client(current, client) => {
                *state = CacheState::Tainted;
                true
            }
            _ => false,
        }
    }

    /// Drops the cached client, e.g. after the configuration changed.
    ///
    /// Returns `true` if a client was cached.
    pub async fn reset(&self) -> bool {
        let _connect_guard = self.connect_lock.lock().await;
        let mut state = self.state.write();
        let had_client = matches!(*state, CacheState::Fresh(_));
        *state = CacheState::Absent;
        had_client
    }

    #[must_use]
    pub fn status(&self) -> CacheStatus {
        match *self.state.read() {
            CacheState::Absent => CacheStatus::Absent,
            CacheState::Fresh(_) => CacheStatus::Fresh,
            CacheState::Tainted => CacheStatus::Tainted,
        }
    }

    fn fresh(&self) -> Option<Arc<dyn PlatformClient>> {
        match &*self.state.read() {
            CacheState::Fresh(client) => Some(Arc::clone(client)),
            CacheState::Absent | CacheState::Tainted => None,
        }
    }
}

fn same_client(a: &Arc<dyn PlatformClient>, b: &Arc<dyn PlatformClient>) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}
