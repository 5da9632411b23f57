//! Monotonic Engine Clock
//!
//! The engine measures everything (dwell gates, preload TTLs, indicator
//! windows) in milliseconds relative to an arbitrary session epoch. Time is
//! injected through the [`Clock`] trait so production code reads a monotonic
//! system clock while tests drive a manual one deterministically.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::OnceLock;
use std::time::Instant;

/// A point in engine time, in milliseconds since the session epoch.
///
/// Stored as a raw `u64`; arithmetic saturates so elapsed calculations never
/// underflow even if a caller hands timestamps out of order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(u64);

impl Timestamp {
    /// Create a timestamp from raw milliseconds.
    #[inline]
    pub const fn from_millis(ms: u64) -> Self {
        Self(ms)
    }

    /// Get the raw millisecond value.
    #[inline]
    pub const fn as_millis(&self) -> u64 {
        self.0
    }

    /// Milliseconds elapsed since `earlier`. Returns 0 if `earlier` is later.
    #[inline]
    pub fn millis_since(&self, earlier: Timestamp) -> u64 {
        self.0.saturating_sub(earlier.0)
    }

    /// This timestamp shifted forward by `ms` milliseconds.
    #[inline]
    pub const fn plus_millis(&self, ms: u64) -> Self {
        Self(self.0.saturating_add(ms))
    }

    /// Check if this timestamp is strictly after another.
    #[inline]
    pub fn is_after(&self, other: Timestamp) -> bool {
        self.0 > other.0
    }
}

/// Source of engine time.
///
/// Implementations must be monotonic: successive `now()` calls never go
/// backward.
pub trait Clock: Send + Sync {
    /// Current engine time.
    fn now(&self) -> Timestamp;
}

/// Session epoch for [`SystemClock`], anchored on first use.
static EPOCH: OnceLock<Instant> = OnceLock::new();

/// Monotonic wall clock anchored at the first instantiation in the process.
///
/// Backed by `std::time::Instant`, so it is immune to wall-clock adjustments.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl SystemClock {
    /// Create a system clock, anchoring the session epoch if not yet set.
    pub fn new() -> Self {
        EPOCH.get_or_init(Instant::now);
        Self
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        let epoch = EPOCH.get_or_init(Instant::now);
        Timestamp::from_millis(epoch.elapsed().as_millis() as u64)
    }
}

/// Hand-driven clock for tests and trace replay.
///
/// Starts at 0 and only moves when told to. `advance`/`set` never move time
/// backward.
#[derive(Debug, Default)]
pub struct ManualClock {
    now_ms: AtomicU64,
}

impl ManualClock {
    /// Create a manual clock at t = 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a manual clock at the given millisecond offset.
    pub fn at(ms: u64) -> Self {
        Self {
            now_ms: AtomicU64::new(ms),
        }
    }

    /// Advance the clock by `ms` milliseconds.
    pub fn advance(&self, ms: u64) {
        self.now_ms.fetch_add(ms, Ordering::SeqCst);
    }

    /// Jump to an absolute offset. Ignored if it would move time backward.
    pub fn set(&self, ms: u64) {
        self.now_ms.fetch_max(ms, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        Timestamp::from_millis(self.now_ms.load(Ordering::SeqCst))
    }
}
