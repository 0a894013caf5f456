//! In-flight download registry with time-boxed bookkeeping.
//!
//! The registry is the only shared mutable state in the crate. It rejects a
//! second operation for a [`DownloadKey`] that is already in flight and evicts
//! entries older than a staleness threshold, so an operation that never
//! reports completion cannot pin its key forever.
//!
//! The downloader runs on a multi-threaded runtime, so admission goes through
//! [`DownloadRegistry::try_begin`], an atomic compare-and-insert. The separate
//! [`is_active`](DownloadRegistry::is_active) / [`begin`](DownloadRegistry::begin)
//! pair is only race-free under a single-writer scheduler.

use crate::types::{DownloadKey, DownloadingEntry};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// Source of "now" for the registry
pub trait Clock: Send + Sync {
    /// Current wall-clock time
    fn now(&self) -> DateTime<Utc>;
}

/// Clock backed by the system time
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Manually driven clock for deterministic sweeps
///
/// ```
/// use carousel_dl::registry::{Clock, ManualClock};
/// use std::time::Duration;
///
/// let clock = ManualClock::default();
/// let start = clock.now();
/// clock.advance(Duration::from_secs(90));
/// assert_eq!((clock.now() - start).num_seconds(), 90);
/// ```
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    /// Create a clock frozen at `start`
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    /// Move the clock forward
    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(PoisonError::into_inner);
        if let Ok(delta) = chrono::Duration::from_std(by)
            && let Some(next) = now.checked_add_signed(delta)
        {
            *now = next;
        }
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new(Utc::now())
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

struct RegistryInner {
    entries: Mutex<HashMap<DownloadKey, DownloadingEntry>>,
    clock: Arc<dyn Clock>,
    stale_after: Duration,
    next_ticket: AtomicU64,
}

/// Registry of in-flight downloads (cloneable, all clones share state)
#[derive(Clone)]
pub struct DownloadRegistry {
    inner: Arc<RegistryInner>,
}

impl std::fmt::Debug for DownloadRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DownloadRegistry")
            .field("active", &self.len())
            .field("stale_after", &self.inner.stale_after)
            .finish()
    }
}

impl DownloadRegistry {
    /// Create a registry using the system clock
    pub fn new(stale_after: Duration) -> Self {
        Self::with_clock(stale_after, Arc::new(SystemClock))
    }

    /// Create a registry with an injected clock
    pub fn with_clock(stale_after: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            inner: Arc::new(RegistryInner {
                entries: Mutex::new(HashMap::new()),
                clock,
                stale_after,
                next_ticket: AtomicU64::new(1),
            }),
        }
    }

    // A panic while holding the lock cannot leave the map half-updated
    // (every critical section is a single insert/remove/retain).
    fn entries(&self) -> MutexGuard<'_, HashMap<DownloadKey, DownloadingEntry>> {
        self.inner
            .entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn new_entry(&self, key: DownloadKey) -> DownloadingEntry {
        DownloadingEntry {
            key,
            started_at: self.inner.clock.now(),
            ticket: self.inner.next_ticket.fetch_add(1, Ordering::Relaxed),
        }
    }

    /// True iff an entry for `key` currently exists
    pub fn is_active(&self, key: &DownloadKey) -> bool {
        self.entries().contains_key(key)
    }

    /// Insert an entry for `key` stamped with the current time.
    ///
    /// The caller must have checked [`is_active`](Self::is_active); calling
    /// this for an active key replaces the existing entry.
    pub fn begin(&self, key: DownloadKey) {
        let entry = self.new_entry(key.clone());
        self.entries().insert(key, entry);
    }

    /// Remove the entry for `key`. Removing an absent key is a no-op.
    pub fn end(&self, key: &DownloadKey) {
        self.entries().remove(key);
    }

    /// Atomically admit `key` unless it is already active.
    ///
    /// The returned guard removes the entry exactly once when dropped. If the
    /// entry was evicted by a sweep and the key re-admitted meanwhile, the old
    /// guard leaves the newer admission alone.
    pub fn try_begin(&self, key: DownloadKey) -> Option<RegistryGuard> {
        let mut entries = self.entries();
        if entries.contains_key(&key) {
            return None;
        }
        let entry = self.new_entry(key.clone());
        let ticket = entry.ticket;
        entries.insert(key.clone(), entry);
        drop(entries);

        Some(RegistryGuard {
            registry: self.clone(),
            key,
            ticket,
        })
    }

    fn release(&self, key: &DownloadKey, ticket: u64) {
        let mut entries = self.entries();
        if entries.get(key).is_some_and(|entry| entry.ticket == ticket) {
            entries.remove(key);
        }
    }

    /// Remove every entry at least `stale_after` old. Returns how many were removed.
    pub fn sweep(&self) -> usize {
        let now = self.inner.clock.now();
        let stale_after = self.inner.stale_after;
        let mut entries = self.entries();
        let before = entries.len();

        entries.retain(|key, entry| {
            let age = now
                .signed_duration_since(entry.started_at)
                .to_std()
                .unwrap_or(Duration::ZERO);
            let keep = age < stale_after;
            if !keep {
                tracing::warn!(
                    resource = %key.resource,
                    filename = %key.filename,
                    age_secs = age.as_secs(),
                    "Evicting stale download entry"
                );
            }
            keep
        });

        before - entries.len()
    }

    /// Snapshot of all entries, oldest first
    pub fn active(&self) -> Vec<DownloadingEntry> {
        let mut snapshot: Vec<_> = self.entries().values().cloned().collect();
        snapshot.sort_by_key(|entry| (entry.started_at, entry.ticket));
        snapshot
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries().len()
    }

    /// True when nothing is in flight
    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }

    /// Configured staleness threshold
    pub fn stale_after(&self) -> Duration {
        self.inner.stale_after
    }
}

/// Releases a registry admission when dropped
#[must_use = "dropping the guard releases the registry entry immediately"]
pub struct RegistryGuard {
    registry: DownloadRegistry,
    key: DownloadKey,
    ticket: u64,
}

impl RegistryGuard {
    /// Key this guard holds
    pub fn key(&self) -> &DownloadKey {
        &self.key
    }
}

impl std::fmt::Debug for RegistryGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistryGuard")
            .field("key", &self.key)
            .field("ticket", &self.ticket)
            .finish()
    }
}

impl Drop for RegistryGuard {
    fn drop(&mut self) {
        self.registry.release(&self.key, self.ticket);
    }
}
