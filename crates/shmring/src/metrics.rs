use std::sync::atomic::{AtomicU64, Ordering};

/// Optional, cheaply-disableable operation counters.
///
/// Local to this process only: the counters are not part of the on-disk
/// layout and are never shared across attachments. Gated by
/// [`crate::RingConfig::enable_metrics`]; when disabled, every update is a
/// single relaxed branch.
#[derive(Debug, Default)]
pub struct Metrics {
    enqueued: AtomicU64,
    dequeued: AtomicU64,
    cas_retries: AtomicU64,
    wraps: AtomicU64,
    enabled: bool,
}

impl Metrics {
    pub(crate) fn new(enabled: bool) -> Self {
        Self {
            enabled,
            ..Default::default()
        }
    }

    pub(crate) fn record_enqueue(&self, wrapped: bool) {
        if !self.enabled {
            return;
        }
        self.enqueued.fetch_add(1, Ordering::Relaxed);
        if wrapped {
            self.wraps.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub(crate) fn record_dequeue(&self) {
        if !self.enabled {
            return;
        }
        self.dequeued.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_cas_retry(&self) {
        if !self.enabled {
            return;
        }
        self.cas_retries.fetch_add(1, Ordering::Relaxed);
    }

    /// Takes a point-in-time snapshot of the counters.
    #[must_use]
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            enqueued: self.enqueued.load(Ordering::Relaxed),
            dequeued: self.dequeued.load(Ordering::Relaxed),
            cas_retries: self.cas_retries.load(Ordering::Relaxed),
            wraps: self.wraps.load(Ordering::Relaxed),
        }
    }
}

/// A consistent-enough snapshot of [`Metrics`] at one instant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    /// Number of messages successfully committed by producers.
    pub enqueued: u64,
    /// Number of messages successfully committed by consumers.
    pub dequeued: u64,
    /// Number of times a `head` CAS had to be retried due to contention.
    pub cas_retries: u64,
    /// Number of producer reservations that wrapped the data area.
    pub wraps: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_metrics_stay_zero() {
        let m = Metrics::new(false);
        m.record_enqueue(true);
        m.record_dequeue();
        m.record_cas_retry();
        assert_eq!(m.snapshot(), MetricsSnapshot::default());
    }

    #[test]
    fn enabled_metrics_count() {
        let m = Metrics::new(true);
        m.record_enqueue(false);
        m.record_enqueue(true);
        m.record_dequeue();
        m.record_cas_retry();
        let snap = m.snapshot();
        assert_eq!(snap.enqueued, 2);
        assert_eq!(snap.dequeued, 1);
        assert_eq!(snap.cas_retries, 1);
        assert_eq!(snap.wraps, 1);
    }
}
