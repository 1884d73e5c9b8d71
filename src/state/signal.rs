//! Shared start signal for the active round.

use tokio::sync::watch;

use crate::dao::models::StartFlagEntity;

/// In-memory mirror of the persisted start flag.
///
/// Monotonic within a round: [`StartSignal::mark_started`] only ever flips the
/// value to started, and [`StartSignal::reset`] is reserved for seeding a
/// brand-new round. Late subscribers read the current value first, so there is
/// no missed-event window between "already started" and "starts later".
pub struct StartSignal {
    sender: watch::Sender<StartFlagEntity>,
}

impl StartSignal {
    /// Create an unstarted signal.
    pub fn new() -> Self {
        let (sender, _receiver) = watch::channel(StartFlagEntity::default());
        Self { sender }
    }

    /// Current flag value.
    pub fn current(&self) -> StartFlagEntity {
        self.sender.borrow().clone()
    }

    /// True once the round has been started.
    pub fn is_started(&self) -> bool {
        self.sender.borrow().started
    }

    /// Subscribe to flag changes. The receiver immediately observes the
    /// current value.
    pub fn watcher(&self) -> watch::Receiver<StartFlagEntity> {
        self.sender.subscribe()
    }

    /// Record the started flag. Returns the now-current flag; a second call
    /// is a no-op that keeps the original start timestamp.
    pub fn mark_started(&self, flag: StartFlagEntity) -> StartFlagEntity {
        let mut result = self.sender.borrow().clone();
        self.sender.send_if_modified(|current| {
            if current.started {
                return false;
            }
            *current = flag;
            true
        });
        let updated = self.sender.borrow().clone();
        if updated.started {
            result = updated;
        }
        result
    }

    /// Hydrate the signal from a persisted flag, never reverting to unstarted.
    pub fn hydrate(&self, flag: StartFlagEntity) {
        if flag.started {
            self.mark_started(flag);
        }
    }

    /// Reset to unstarted for a brand-new round. Takes effect even when no
    /// watcher is subscribed.
    pub fn reset(&self) {
        self.sender.send_replace(StartFlagEntity::default());
    }
}

impl Default for StartSignal {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_unset() {
        let signal = StartSignal::new();
        assert!(!signal.is_started());
        assert_eq!(signal.current().started_at, None);
    }

    #[test]
    fn mark_started_is_monotonic() {
        let signal = StartSignal::new();
        let first = signal.mark_started(StartFlagEntity::started_now());
        assert!(first.started);

        // Second start keeps the original timestamp.
        let second = signal.mark_started(StartFlagEntity::started_now());
        assert_eq!(second.started_at, first.started_at);
        assert!(signal.is_started());
    }

    #[test]
    fn hydrate_ignores_unstarted_flags() {
        let signal = StartSignal::new();
        signal.hydrate(StartFlagEntity::default());
        assert!(!signal.is_started());

        signal.hydrate(StartFlagEntity::started_now());
        assert!(signal.is_started());

        // Hydrating an unstarted flag afterwards must not revert.
        signal.hydrate(StartFlagEntity::default());
        assert!(signal.is_started());
    }

    #[test]
    fn reset_clears_the_flag_without_watchers() {
        let signal = StartSignal::new();
        signal.mark_started(StartFlagEntity::started_now());
        assert!(signal.is_started());

        // No receiver is alive here; the reset must still land.
        signal.reset();
        assert!(!signal.is_started());
        assert_eq!(signal.current().started_at, None);
    }

    #[tokio::test]
    async fn late_watcher_sees_current_value() {
        let signal = StartSignal::new();
        signal.mark_started(StartFlagEntity::started_now());

        // Subscribing after the transition still observes started=true.
        let watcher = signal.watcher();
        assert!(watcher.borrow().started);
    }
}
