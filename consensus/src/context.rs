//! Cancellation context handed to every resolution and every source.
//!
//! A [`Context`] couples a [`CancellationToken`] with an optional deadline.
//! It is done as soon as the token is cancelled or the deadline passes,
//! whichever happens first. Clones share the same token, so cancelling any
//! clone cancels them all; [`Context::child`] derives a context that can be
//! cancelled on its own without touching its parent.

use std::time::Duration;

use thiserror::Error;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Stand-in for "practically never" when `now + timeout` overflows.
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

/// `now + timeout`, clamped to a far-future instant on overflow.
fn deadline_after(timeout: Duration) -> Instant {
    let now = Instant::now();
    now.checked_add(timeout)
        .or_else(|| now.checked_add(FAR_FUTURE))
        .unwrap_or(now)
}

/// Why a context is done.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Cancelled {
    /// The token was cancelled.
    #[error("context cancelled")]
    Cancelled,

    /// The deadline passed first.
    #[error("context deadline exceeded")]
    DeadlineExceeded,
}

/// Cancellation token plus optional deadline.
#[derive(Debug, Clone)]
pub struct Context {
    token: CancellationToken,
    deadline: Option<Instant>,
}

impl Context {
    /// A context that is never done unless [`cancel`](Self::cancel) is called.
    pub fn background() -> Self {
        Self::from_token(CancellationToken::new())
    }

    /// Wrap an existing token, e.g. one cancelled by a signal handler.
    pub fn from_token(token: CancellationToken) -> Self {
        Self {
            token,
            deadline: None,
        }
    }

    /// A context that expires `timeout` from now. Timeouts too large to
    /// represent are clamped to a far-future deadline.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            token: CancellationToken::new(),
            deadline: Some(deadline_after(timeout)),
        }
    }

    /// A context that expires at `deadline`.
    pub fn with_deadline(deadline: Instant) -> Self {
        Self {
            token: CancellationToken::new(),
            deadline: Some(deadline),
        }
    }

    /// Derive a child context.
    ///
    /// The child is cancelled whenever this context is, keeps this context's
    /// deadline, and falls back to `default_timeout` from now when this
    /// context has none. Cancelling the child leaves this context untouched.
    pub fn child(&self, default_timeout: Duration) -> Self {
        Self {
            token: self.token.child_token(),
            deadline: Some(self.deadline.unwrap_or_else(|| deadline_after(default_timeout))),
        }
    }

    /// Cancel this context and every child derived from it.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// The underlying token.
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// When this context expires, if ever.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// The reason this context is done, or `None` while it is still live.
    pub fn err(&self) -> Option<Cancelled> {
        if self.token.is_cancelled() {
            return Some(Cancelled::Cancelled);
        }
        match self.deadline {
            Some(deadline) if deadline <= Instant::now() => Some(Cancelled::DeadlineExceeded),
            _ => None,
        }
    }

    /// Completes once the context is done, yielding the reason.
    pub async fn done(&self) -> Cancelled {
        match self.deadline {
            Some(deadline) => tokio::select! {
                biased;
                _ = self.token.cancelled() => Cancelled::Cancelled,
                _ = tokio::time::sleep_until(deadline) => Cancelled::DeadlineExceeded,
            },
            None => {
                self.token.cancelled().await;
                Cancelled::Cancelled
            }
        }
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::background()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn background_is_live() {
        let ctx = Context::background();
        assert_eq!(ctx.err(), None);
        assert!(ctx.deadline().is_none());
    }

    #[test]
    fn cancel_is_shared_between_clones() {
        let ctx = Context::background();
        let clone = ctx.clone();
        clone.cancel();
        assert_eq!(ctx.err(), Some(Cancelled::Cancelled));
    }

    #[test]
    fn elapsed_deadline_reports_deadline_exceeded() {
        let ctx = Context::with_timeout(Duration::ZERO);
        assert_eq!(ctx.err(), Some(Cancelled::DeadlineExceeded));
    }

    #[test]
    fn cancellation_takes_precedence_over_deadline() {
        let ctx = Context::with_timeout(Duration::ZERO);
        ctx.cancel();
        assert_eq!(ctx.err(), Some(Cancelled::Cancelled));
    }

    #[test]
    fn unrepresentable_timeout_still_sets_a_deadline() {
        let ctx = Context::with_timeout(Duration::MAX);
        let deadline = ctx.deadline().expect("deadline should be clamped, not dropped");
        assert!(deadline > Instant::now() + Duration::from_secs(86_400 * 365));
        assert_eq!(ctx.err(), None);
    }

    #[test]
    fn child_of_unbounded_context_keeps_far_deadline() {
        let parent = Context::with_timeout(Duration::MAX);
        let child = parent.child(Duration::from_millis(50));
        assert_eq!(child.deadline(), parent.deadline());
    }

    #[tokio::test]
    async fn done_completes_on_cancel() {
        let ctx = Context::background();
        let canceller = ctx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            canceller.cancel();
        });
        assert_eq!(ctx.done().await, Cancelled::Cancelled);
    }

    #[tokio::test]
    async fn done_completes_on_deadline() {
        let ctx = Context::with_timeout(Duration::from_millis(20));
        assert_eq!(ctx.done().await, Cancelled::DeadlineExceeded);
    }

    #[test]
    fn child_follows_parent_cancellation() {
        let parent = Context::background();
        let child = parent.child(Duration::from_secs(30));
        parent.cancel();
        assert_eq!(child.err(), Some(Cancelled::Cancelled));
    }

    #[test]
    fn cancelling_child_leaves_parent_live() {
        let parent = Context::background();
        let child = parent.child(Duration::from_secs(30));
        child.cancel();
        assert_eq!(child.err(), Some(Cancelled::Cancelled));
        assert_eq!(parent.err(), None);
    }

    #[test]
    fn child_keeps_parent_deadline() {
        let parent = Context::with_timeout(Duration::from_secs(5));
        let child = parent.child(Duration::from_secs(60));
        assert_eq!(child.deadline(), parent.deadline());
    }

    #[test]
    fn child_uses_default_timeout_without_parent_deadline() {
        let before = Instant::now();
        let child = Context::background().child(Duration::from_secs(30));
        let deadline = child.deadline().expect("child should carry a deadline");
        assert!(deadline >= before + Duration::from_secs(30));
        assert!(deadline <= Instant::now() + Duration::from_secs(30));
    }
}
