//! Event-driven reachability monitor.
//!
//! Holds the latest connectivity snapshot pushed by the host environment and
//! broadcasts transitions over a watch channel. Repeated reports of the same
//! state are absorbed, so subscribers observe exactly one event per
//! transition and never poll.

use flexlog_core::Reachability;
use tokio::sync::watch;
use tracing::info;

/// Connectivity state holder implementing the reachability port.
pub struct ReachabilityMonitor {
    tx: watch::Sender<bool>,
}

impl ReachabilityMonitor {
    /// Create a monitor with the given initial snapshot.
    pub fn new(initially_reachable: bool) -> Self {
        let (tx, _) = watch::channel(initially_reachable);
        Self { tx }
    }

    /// Report the current connectivity state. Returns true when this report
    /// was a transition and subscribers were notified.
    pub fn set_reachable(&self, reachable: bool) -> bool {
        let changed = self.tx.send_if_modified(|state| {
            if *state == reachable {
                false
            } else {
                *state = reachable;
                true
            }
        });
        if changed {
            info!(reachable, "reachability transition");
        }
        changed
    }
}

impl Default for ReachabilityMonitor {
    fn default() -> Self {
        Self::new(false)
    }
}

impl Reachability for ReachabilityMonitor {
    fn is_reachable(&self) -> bool {
        *self.tx.borrow()
    }

    fn subscribe(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn transition_notifies_subscribers_once() {
        let monitor = ReachabilityMonitor::new(false);
        let mut rx = monitor.subscribe();

        assert!(monitor.set_reachable(true));
        assert!(rx.changed().await.is_ok());
        assert!(*rx.borrow_and_update());

        // Same state again: no new event.
        assert!(!monitor.set_reachable(true));
        assert!(!rx.has_changed().unwrap());
    }

    #[tokio::test]
    async fn snapshot_tracks_latest_report() {
        let monitor = ReachabilityMonitor::new(true);
        assert!(monitor.is_reachable());

        monitor.set_reachable(false);
        assert!(!monitor.is_reachable());
    }

    #[tokio::test]
    async fn late_subscriber_sees_current_state_without_event() {
        let monitor = ReachabilityMonitor::new(false);
        monitor.set_reachable(true);

        let rx = monitor.subscribe();
        assert!(*rx.borrow());
        assert!(!rx.has_changed().unwrap());
    }
}
