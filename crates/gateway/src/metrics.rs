use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Atomic counters tracking mailer dispatch outcomes.
///
/// All counters use relaxed ordering. For a consistent point-in-time
/// view, call [`snapshot`](Self::snapshot).
#[derive(Debug, Default)]
pub struct MailerMetrics {
    /// Calls to `send_mail`.
    pub dispatched: AtomicU64,
    /// Sends the backend accepted.
    pub sent: AtomicU64,
    /// Envelopes rejected by validation.
    pub rejected: AtomicU64,
    /// Calls aborted by a hook.
    pub hook_failures: AtomicU64,
    /// Backend or selection failures.
    pub failed: AtomicU64,
}

impl MailerMetrics {
    pub fn increment_dispatched(&self) {
        self.dispatched.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_sent(&self) {
        self.sent.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_rejected(&self) {
        self.rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_hook_failures(&self) {
        self.hook_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_failed(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
    }

    /// Take a point-in-time snapshot of all counters.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            dispatched: self.dispatched.load(Ordering::Relaxed),
            sent: self.sent.load(Ordering::Relaxed),
            rejected: self.rejected.load(Ordering::Relaxed),
            hook_failures: self.hook_failures.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
        }
    }
}

/// A plain data snapshot of [`MailerMetrics`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub dispatched: u64,
    pub sent: u64,
    pub rejected: u64,
    pub hook_failures: u64,
    pub failed: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_metrics_are_zero() {
        assert_eq!(MailerMetrics::default().snapshot(), MetricsSnapshot::default());
    }

    #[test]
    fn increment_and_snapshot() {
        let m = MailerMetrics::default();
        m.increment_dispatched();
        m.increment_dispatched();
        m.increment_sent();
        m.increment_rejected();
        m.increment_hook_failures();
        m.increment_failed();

        let snap = m.snapshot();
        assert_eq!(snap.dispatched, 2);
        assert_eq!(snap.sent, 1);
        assert_eq!(snap.rejected, 1);
        assert_eq!(snap.hook_failures, 1);
        assert_eq!(snap.failed, 1);
    }
}
