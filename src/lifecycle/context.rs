use std::time::Duration;
use tokio::time::{sleep_until, Instant};
use tokio_util::sync::CancellationToken;

/// Cancellation and deadline handed to every component's `shutdown`
#[derive(Debug, Clone, Default)]
pub struct ShutdownContext {
    token: CancellationToken,
    deadline: Option<Instant>,
}

impl ShutdownContext {
    /// A context with no deadline that is only done when cancelled
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self::with_deadline(Instant::now() + timeout)
    }

    pub fn with_deadline(deadline: Instant) -> Self {
        Self {
            token: CancellationToken::new(),
            deadline: Some(deadline),
        }
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Time left before the deadline, `None` without one
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|deadline| deadline.saturating_duration_since(Instant::now()))
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// True once cancelled or past the deadline
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
            || self
                .deadline
                .is_some_and(|deadline| Instant::now() >= deadline)
    }

    /// Resolves on cancellation or when the deadline passes
    pub async fn cancelled(&self) {
        match self.deadline {
            Some(deadline) => {
                tokio::select! {
                    _ = self.token.cancelled() => {}
                    _ = sleep_until(deadline) => {}
                }
            }
            None => self.token.cancelled().await,
        }
    }

    /// Derived context cancelled with this one, sharing its deadline
    pub fn child(&self) -> Self {
        Self {
            token: self.token.child_token(),
            deadline: self.deadline,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_deadline_expires() {
        let ctx = ShutdownContext::with_timeout(Duration::from_millis(50));
        assert!(!ctx.is_cancelled());
        assert_eq!(ctx.remaining(), Some(Duration::from_millis(50)));

        ctx.cancelled().await;

        assert!(ctx.is_cancelled());
        assert_eq!(ctx.remaining(), Some(Duration::ZERO));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_propagates_to_children() {
        let ctx = ShutdownContext::new();
        let child = ctx.child();
        assert_eq!(child.deadline(), None);

        ctx.cancel();
        child.cancelled().await;

        assert!(child.is_cancelled());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_before_deadline() {
        let ctx = ShutdownContext::with_timeout(Duration::from_secs(60));
        let waiter = ctx.clone();
        let started = Instant::now();

        ctx.cancel();
        waiter.cancelled().await;

        assert!(started.elapsed() < Duration::from_secs(60));
    }
}
