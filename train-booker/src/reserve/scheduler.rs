//! Single-slot retry timer.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::domain::ChainId;

struct ArmedTimer {
    chain: ChainId,
    handle: JoinHandle<()>,
}

/// A delayed-execution timer with exactly one slot.
///
/// Arming while already armed replaces the pending timer; a fire
/// happens exactly once per arm unless disarmed first. The timer never
/// captures attempt state: a fire only delivers the [`ChainId`] it was
/// armed with, and the receiver decides whether that chain is still
/// live.
pub struct RetryScheduler {
    tx: mpsc::UnboundedSender<ChainId>,
    armed: Option<ArmedTimer>,
}

impl RetryScheduler {
    /// Create a scheduler and the channel its fires are delivered on.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<ChainId>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx, armed: None }, rx)
    }

    /// Arm the timer for `chain`, replacing any pending timer.
    pub fn arm(&mut self, delay: Duration, chain: ChainId) {
        self.disarm();
        tracing::debug!(%chain, ?delay, "arming retry timer");

        let tx = self.tx.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            // Receiver dropped means the orchestrator is gone; nothing
            // left to retry.
            let _ = tx.send(chain);
        });
        self.armed = Some(ArmedTimer { chain, handle });
    }

    /// Disarm any pending timer. Idempotent; safe when nothing is
    /// armed.
    pub fn disarm(&mut self) {
        if let Some(timer) = self.armed.take() {
            tracing::debug!(chain = %timer.chain, "disarming retry timer");
            timer.handle.abort();
        }
    }

    /// The chain the timer is currently armed for, if any.
    pub fn armed_chain(&self) -> Option<ChainId> {
        self.armed
            .as_ref()
            .filter(|t| !t.handle.is_finished())
            .map(|t| t.chain)
    }

    /// Whether a timer is pending.
    pub fn is_armed(&self) -> bool {
        self.armed_chain().is_some()
    }
}

impl Drop for RetryScheduler {
    fn drop(&mut self) {
        self.disarm();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn fires_once_after_the_delay() {
        let (mut scheduler, mut fired) = RetryScheduler::new();
        scheduler.arm(Duration::from_secs(5), ChainId::new(1));
        assert!(scheduler.is_armed());

        assert_eq!(fired.recv().await, Some(ChainId::new(1)));

        // Exactly once: nothing else queued after the fire.
        tokio::time::advance(Duration::from_secs(60)).await;
        assert!(fired.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn rearming_replaces_the_pending_timer() {
        let (mut scheduler, mut fired) = RetryScheduler::new();
        scheduler.arm(Duration::from_secs(5), ChainId::new(1));
        scheduler.arm(Duration::from_secs(5), ChainId::new(2));

        assert_eq!(scheduler.armed_chain(), Some(ChainId::new(2)));

        // Only the replacement fires.
        assert_eq!(fired.recv().await, Some(ChainId::new(2)));
        tokio::time::advance(Duration::from_secs(60)).await;
        assert!(fired.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn disarm_prevents_the_fire() {
        let (mut scheduler, mut fired) = RetryScheduler::new();
        scheduler.arm(Duration::from_secs(5), ChainId::new(1));
        scheduler.disarm();
        assert!(!scheduler.is_armed());

        tokio::time::advance(Duration::from_secs(60)).await;
        tokio::task::yield_now().await;
        assert!(fired.try_recv().is_err());
    }

    #[tokio::test]
    async fn disarm_is_idempotent() {
        let (mut scheduler, _fired) = RetryScheduler::new();
        scheduler.disarm();
        scheduler.disarm();
        assert!(!scheduler.is_armed());
    }
}
