//! Cancellation and deadline context for update operations.

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::error::{Result, UpdateError};

/// Carries a cancellation token and an optional deadline through an update
/// operation. Every network await is raced against both.
///
/// Cloning shares the token, so cancelling any clone cancels them all.
#[derive(Debug, Clone, Default)]
pub struct UpdateContext {
    cancel: CancellationToken,
    deadline: Option<Instant>,
}

impl UpdateContext {
    /// Creates a context with no deadline.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a context driven by an existing token (e.g. one cancelled on Ctrl-C).
    #[must_use]
    pub fn with_token(cancel: CancellationToken) -> Self {
        Self {
            cancel,
            deadline: None,
        }
    }

    /// Returns a copy of this context that expires after `timeout`.
    ///
    /// An earlier deadline already present is kept.
    #[must_use]
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    /// Returns a copy of this context that expires at `deadline`.
    #[must_use]
    pub fn with_deadline(&self, deadline: Instant) -> Self {
        let deadline = match self.deadline {
            Some(existing) if existing < deadline => existing,
            _ => deadline,
        };
        Self {
            cancel: self.cancel.clone(),
            deadline: Some(deadline),
        }
    }

    /// Cancels every operation using this context.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Returns true once the context has been cancelled.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// The underlying cancellation token.
    #[must_use]
    pub fn token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// The deadline, if one was set.
    #[must_use]
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Fails if the context is already cancelled or past its deadline.
    pub fn ensure_active(&self) -> Result<()> {
        if self.cancel.is_cancelled() {
            return Err(UpdateError::Cancelled);
        }
        if self.deadline.is_some_and(|d| Instant::now() >= d) {
            return Err(UpdateError::Timeout("context deadline exceeded".to_string()));
        }
        Ok(())
    }

    /// Runs `fut` until it completes, the context is cancelled, or the
    /// deadline passes, whichever happens first.
    pub async fn run<F, T>(&self, fut: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        let deadline = async {
            match self.deadline {
                Some(d) => tokio::time::sleep_until(d).await,
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            biased;
            () = self.cancel.cancelled() => Err(UpdateError::Cancelled),
            () = deadline => Err(UpdateError::Timeout("context deadline exceeded".to_string())),
            result = fut => result,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_run_completes() {
        let ctx = UpdateContext::new();
        let value = ctx.run(async { Ok(7) }).await.unwrap();
        assert_eq!(value, 7);
    }

    #[tokio::test]
    async fn test_cancelled_context_aborts() {
        let ctx = UpdateContext::new();
        ctx.cancel();
        let result = ctx
            .run(std::future::pending::<Result<()>>())
            .await;
        assert!(matches!(result, Err(UpdateError::Cancelled)));
        assert!(matches!(ctx.ensure_active(), Err(UpdateError::Cancelled)));
    }

    #[tokio::test]
    async fn test_cancel_from_clone() {
        let ctx = UpdateContext::new();
        let clone = ctx.clone();
        let handle = tokio::spawn(async move {
            clone.run(std::future::pending::<Result<()>>()).await
        });
        ctx.cancel();
        let result = handle.await.unwrap();
        assert!(result.unwrap_err().is_cancelled());
    }

    #[tokio::test]
    async fn test_deadline_elapses() {
        let ctx = UpdateContext::new().with_timeout(Duration::from_millis(10));
        let result = ctx.run(std::future::pending::<Result<()>>()).await;
        assert!(matches!(result, Err(UpdateError::Timeout(_))));
    }

    #[test]
    fn test_earlier_deadline_wins() {
        let base = UpdateContext::new().with_timeout(Duration::from_secs(1));
        let later = base.with_timeout(Duration::from_secs(60));
        assert_eq!(base.deadline(), later.deadline());
    }
}
