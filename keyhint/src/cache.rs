//! Short-lived reuse of the last discovery result

use crate::types::ProcessId;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::trace;

/// Digest of a window's observable shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fingerprint([u8; 32]);

impl Fingerprint {
    pub fn from_hash(hash: blake3::Hash) -> Self {
        Self(*hash.as_bytes())
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

/// Time source, swappable in tests.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Clock that only moves when told to.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<Mutex<Instant>>,
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            now: Arc::new(Mutex::new(Instant::now())),
        }
    }

    pub fn advance(&self, by: Duration) {
        *self.now.lock() += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        *self.now.lock()
    }
}

struct Entry<V> {
    pid: ProcessId,
    fingerprint: Fingerprint,
    stored_at: Instant,
    value: V,
}

/// Single-slot cache: one application, one window shape, one value.
///
/// A lookup for another process clears the slot, so results never leak
/// across applications.
pub struct TtlCache<V> {
    ttl: Duration,
    clock: Box<dyn Clock>,
    slot: Mutex<Option<Entry<V>>>,
}

impl<V: Clone> TtlCache<V> {
    pub fn new(ttl: Duration) -> Self {
        Self::with_clock(ttl, SystemClock)
    }

    pub fn with_clock(ttl: Duration, clock: impl Clock + 'static) -> Self {
        Self {
            ttl,
            clock: Box::new(clock),
            slot: Mutex::new(None),
        }
    }

    pub fn get(&self, pid: ProcessId, fingerprint: &Fingerprint) -> Option<V> {
        let mut slot = self.slot.lock();
        let entry = slot.as_ref()?;
        if entry.pid != pid {
            trace!(cached = %entry.pid, requested = %pid, "cache cleared for other process");
            *slot = None;
            return None;
        }
        if entry.fingerprint != *fingerprint {
            trace!("cache miss: window changed");
            return None;
        }
        if self.clock.now().duration_since(entry.stored_at) >= self.ttl {
            trace!("cache miss: entry expired");
            *slot = None;
            return None;
        }
        Some(entry.value.clone())
    }

    pub fn insert(&self, pid: ProcessId, fingerprint: Fingerprint, value: V) {
        *self.slot.lock() = Some(Entry {
            pid,
            fingerprint,
            stored_at: self.clock.now(),
            value,
        });
    }

    pub fn invalidate(&self) {
        *self.slot.lock() = None;
    }
}
