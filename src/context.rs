// SPDX-License-Identifier: GPL-3.0-only
use futures_util::future::select_all;
use std::future::Future;
use tokio::sync::watch;

use crate::error::{Error, Result};

/// Cancellation signal passed down through services and repositories.
///
/// A context is cancelled as soon as any of the signals it inherited fires.
/// `background()` is never cancelled.
#[derive(Debug, Clone, Default)]
pub struct Context {
    signals: Vec<watch::Receiver<bool>>,
}

/// Owning side of a cancellable context. Dropping it does not cancel.
#[derive(Debug)]
pub struct CancelHandle {
    tx: watch::Sender<bool>,
}

impl Context {
    pub fn background() -> Self {
        Self::default()
    }

    /// Derive a child that is cancelled by its own handle or by any ancestor.
    pub fn with_cancel(&self) -> (Self, CancelHandle) {
        let (tx, rx) = watch::channel(false);
        let mut signals = self.signals.clone();
        signals.push(rx);
        (Self { signals }, CancelHandle { tx })
    }

    pub fn is_cancelled(&self) -> bool {
        self.signals.iter().any(|rx| *rx.borrow())
    }

    /// Resolves once the context is cancelled; pends forever otherwise.
    pub async fn cancelled(&self) {
        if self.signals.is_empty() {
            return std::future::pending().await;
        }

        let waits = self.signals.iter().cloned().map(|mut rx| {
            Box::pin(async move {
                // A dropped handle can never cancel.
                if rx.wait_for(|cancelled| *cancelled).await.is_err() {
                    std::future::pending::<()>().await;
                }
            })
        });
        select_all(waits).await;
    }

    /// Run `op` unless the context is, or becomes, cancelled first.
    pub async fn run<T, F>(&self, op: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        if self.is_cancelled() {
            return Err(Error::CancelledContext);
        }

        tokio::select! {
            biased;
            _ = self.cancelled() => Err(Error::CancelledContext),
            result = op => result,
        }
    }
}

impl CancelHandle {
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use std::time::Duration;

    #[test]
    fn test_background_is_never_cancelled() {
        assert!(!Context::background().is_cancelled());
    }

    #[test]
    fn test_cancel_propagates_to_children_only() {
        let (parent, parent_handle) = Context::background().with_cancel();
        let (child, child_handle) = parent.with_cancel();

        child_handle.cancel();
        assert!(child.is_cancelled());
        assert!(!parent.is_cancelled());

        let (sibling, _sibling_handle) = parent.with_cancel();
        parent_handle.cancel();
        assert!(parent.is_cancelled());
        assert!(sibling.is_cancelled());
    }

    #[test]
    fn test_dropped_handle_does_not_cancel() {
        let (ctx, handle) = Context::background().with_cancel();
        drop(handle);
        assert!(!ctx.is_cancelled());
    }

    #[tokio::test]
    async fn test_run_short_circuits_when_already_cancelled() {
        let (ctx, handle) = Context::background().with_cancel();
        handle.cancel();

        let result = ctx.run(async { Ok::<_, Error>(42) }).await;
        assert_eq!(result.unwrap_err().kind(), ErrorKind::CancelledContext);
    }

    #[tokio::test]
    async fn test_run_aborts_pending_operation_on_cancel() {
        let (ctx, handle) = Context::background().with_cancel();

        let waiter = tokio::spawn(async move {
            ctx.run(async {
                tokio::time::sleep(Duration::from_secs(60)).await;
                Ok::<_, Error>(())
            })
            .await
        });

        tokio::time::sleep(Duration::from_millis(20)).await;
        handle.cancel();

        let result = tokio::time::timeout(Duration::from_secs(5), waiter)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(result.unwrap_err().kind(), ErrorKind::CancelledContext);
    }

    #[tokio::test]
    async fn test_run_completes_on_live_context() {
        let (ctx, _handle) = Context::background().with_cancel();
        assert_eq!(ctx.run(async { Ok::<_, Error>("done") }).await.unwrap(), "done");
        assert_eq!(
            Context::background().run(async { Ok::<_, Error>(7) }).await.unwrap(),
            7
        );
    }
}
