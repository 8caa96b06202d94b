//! Creation/modification stamping for auditable entities.
//!
//! # Responsibility
//! - Provide the clock used by structured writes.
//! - Apply the "touch" step: stamp both fields on insert, refresh
//!   modification on update.
//!
//! # Invariants
//! - `creation_timestamp` never changes once set.
//! - `modification_timestamp >= creation_timestamp` after every touch.
//! - Native seed and bulk statements never go through this module.

use log::warn;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

/// Unix epoch milliseconds.
pub type EpochMillis = i64;

/// Source of "now" for audit stamping.
pub trait Clock {
    fn now_ms(&self) -> EpochMillis;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> EpochMillis {
        millis_since_epoch(SystemTime::now())
    }
}

/// Epoch milliseconds of `at`; instants before the epoch read as 0.
fn millis_since_epoch(at: SystemTime) -> EpochMillis {
    match at.duration_since(UNIX_EPOCH) {
        Ok(elapsed) => elapsed.as_millis() as EpochMillis,
        Err(err) => {
            warn!(
                "event=clock_read module=model status=error behind_epoch_ms={} fallback=0",
                err.duration().as_millis()
            );
            0
        }
    }
}

/// Manually driven clock. Clones share the same instant.
#[derive(Debug, Clone, Default)]
pub struct FixedClock {
    now: Arc<AtomicI64>,
}

impl FixedClock {
    pub fn at(now: EpochMillis) -> Self {
        Self {
            now: Arc::new(AtomicI64::new(now)),
        }
    }

    pub fn set(&self, now: EpochMillis) {
        self.now.store(now, Ordering::SeqCst);
    }

    pub fn advance(&self, delta_ms: EpochMillis) {
        self.now.fetch_add(delta_ms, Ordering::SeqCst);
    }
}

impl Clock for FixedClock {
    fn now_ms(&self) -> EpochMillis {
        self.now.load(Ordering::SeqCst)
    }
}

/// Audit columns embedded in an auditable row.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditStamp {
    pub creation_timestamp: Option<EpochMillis>,
    pub modification_timestamp: Option<EpochMillis>,
}

impl AuditStamp {
    /// First structured persist: both fields take `now`.
    pub fn touch_created(&mut self, now: EpochMillis) {
        self.creation_timestamp = Some(now);
        self.modification_timestamp = Some(now);
    }

    /// Structured update: `stored_creation` is what the row already holds and
    /// wins over whatever the caller put in memory.
    pub fn touch_modified(&mut self, now: EpochMillis, stored_creation: Option<EpochMillis>) {
        self.creation_timestamp = stored_creation;
        let modified = match stored_creation {
            Some(created) => now.max(created),
            None => now,
        };
        self.modification_timestamp = Some(modified);
    }
}
