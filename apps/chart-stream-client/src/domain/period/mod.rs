//! Price Period Cache
//!
//! Ordered store of reconstructed OHLCV periods for one chart session.
//!
//! # Design
//!
//! The service delivers periods incrementally: historical backfill and live
//! updates both arrive as `(time, values)` records and may touch the same
//! bucket repeatedly. The cache therefore keys strictly by period start time
//! with last-write-wins replacement, and derives its ordering from the key
//! rather than from arrival order.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

// =============================================================================
// Price Period
// =============================================================================

/// One reconstructed OHLCV bucket, keyed by its start time.
///
/// Values arrive on the wire as a flat vector; see
/// `infrastructure::protocol::PeriodRecord` for the index mapping.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePeriod {
    /// Period start timestamp (Unix seconds).
    pub time: i64,

    /// Period open value.
    pub open: f64,

    /// Period close value.
    pub close: f64,

    /// Period maximum value.
    pub max: f64,

    /// Period minimum value.
    pub min: f64,

    /// Period volume, rounded to two decimal places on ingest.
    pub volume: f64,
}

// =============================================================================
// Period Cache
// =============================================================================

/// Ordered store of reconstructed price periods.
///
/// Holds at most one period per start time. Used both for historical
/// backfill and for live updates touching the same bucket; an upsert at an
/// existing time fully replaces the stored period.
///
/// # Example
///
/// ```rust
/// use chart_stream_client::domain::period::{PeriodCache, PricePeriod};
///
/// let mut cache = PeriodCache::new();
/// cache.upsert(PricePeriod { time: 60, open: 1.0, close: 2.0, max: 2.5, min: 0.5, volume: 10.0 });
/// cache.upsert(PricePeriod { time: 120, open: 2.0, close: 3.0, max: 3.5, min: 1.5, volume: 12.0 });
///
/// // Snapshots are always most-recent-first.
/// let periods = cache.snapshot();
/// assert_eq!(periods[0].time, 120);
/// assert_eq!(periods[1].time, 60);
/// ```
#[derive(Debug, Clone, Default)]
pub struct PeriodCache {
    periods: BTreeMap<i64, PricePeriod>,
}

impl PeriodCache {
    /// Create an empty cache.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            periods: BTreeMap::new(),
        }
    }

    /// Insert or fully replace the period at `period.time`.
    pub fn upsert(&mut self, period: PricePeriod) {
        self.periods.insert(period.time, period);
    }

    /// Get the period at a specific start time, if present.
    #[must_use]
    pub fn get(&self, time: i64) -> Option<&PricePeriod> {
        self.periods.get(&time)
    }

    /// All periods ordered by start time descending (most recent first),
    /// independent of insertion order.
    #[must_use]
    pub fn snapshot(&self) -> Vec<PricePeriod> {
        self.periods.values().rev().copied().collect()
    }

    /// Drop all entries.
    ///
    /// Called on every context switch that invalidates prior data (market,
    /// series framing, or timezone change); stale periods must not survive
    /// those transitions.
    pub fn clear(&mut self) {
        self.periods.clear();
    }

    /// Number of cached periods.
    #[must_use]
    pub fn len(&self) -> usize {
        self.periods.len()
    }

    /// Check whether the cache holds no periods.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.periods.is_empty()
    }
}

// =============================================================================
// Tests
// =============================================================================
