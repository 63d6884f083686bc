//! Single-settlement adaptation of native one-shot callbacks.
//!
//! [`settle_pair`] returns a cloneable [`Settler`] and the [`Settlement`]
//! future it completes. The first `resolve`/`reject` wins; any later call
//! is a no-op and returns `false`. When every settler is dropped without
//! settling, the future yields `None`.

use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, PoisonError};
use std::task::{Context, Poll};

use tokio::sync::oneshot;

type Slot<T, E> = Arc<Mutex<Option<oneshot::Sender<Result<T, E>>>>>;

/// Create a connected settler/settlement pair.
#[must_use]
pub fn settle_pair<T, E>() -> (Settler<T, E>, Settlement<T, E>) {
    let (tx, rx) = oneshot::channel();
    (
        Settler {
            slot: Arc::new(Mutex::new(Some(tx))),
        },
        Settlement { rx },
    )
}

/// Write side of a single-settlement cell.
pub struct Settler<T, E> {
    slot: Slot<T, E>,
}

impl<T, E> Clone for Settler<T, E> {
    fn clone(&self) -> Self {
        Self {
            slot: Arc::clone(&self.slot),
        }
    }
}

impl<T, E> std::fmt::Debug for Settler<T, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Settler")
            .field("settled", &self.is_settled())
            .finish()
    }
}

impl<T, E> Settler<T, E> {
    /// Settle with a success value. Returns `false` if already settled.
    pub fn resolve(&self, value: T) -> bool {
        self.settle(Ok(value))
    }

    /// Settle with a failure. Returns `false` if already settled.
    pub fn reject(&self, error: E) -> bool {
        self.settle(Err(error))
    }

    /// Settle with an outcome. Returns `false` if already settled.
    ///
    /// A settlement whose future was dropped still counts as settled.
    pub fn settle(&self, outcome: Result<T, E>) -> bool {
        let sender = self
            .slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        match sender {
            Some(tx) => {
                // The receiver may be gone; the settlement still happened.
                let _ = tx.send(outcome);
                true
            },
            None => false,
        }
    }

    /// Whether an outcome has already been delivered.
    #[must_use]
    pub fn is_settled(&self) -> bool {
        self.slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_none()
    }
}

/// Read side of a single-settlement cell.
#[derive(Debug)]
pub struct Settlement<T, E> {
    rx: oneshot::Receiver<Result<T, E>>,
}

impl<T, E> Future for Settlement<T, E> {
    type Output = Option<Result<T, E>>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.rx).poll(cx).map(Result::ok)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_resolve() {
        let (settler, settlement) = settle_pair::<u32, String>();
        assert!(!settler.is_settled());
        assert!(settler.resolve(7));
        assert!(settler.is_settled());
        assert_eq!(settlement.await, Some(Ok(7)));
    }

    #[tokio::test]
    async fn test_reject() {
        let (settler, settlement) = settle_pair::<u32, String>();
        assert!(settler.reject("boom".to_string()));
        assert_eq!(settlement.await, Some(Err("boom".to_string())));
    }

    #[tokio::test]
    async fn test_first_settlement_wins() {
        let (settler, settlement) = settle_pair::<u32, String>();
        let other = settler.clone();

        assert!(settler.resolve(1));
        assert!(!other.reject("late".to_string()));
        assert!(!settler.resolve(2));

        assert_eq!(settlement.await, Some(Ok(1)));
    }

    #[tokio::test]
    async fn test_dropped_settlers_yield_none() {
        let (settler, settlement) = settle_pair::<u32, String>();
        let other = settler.clone();
        drop(settler);
        drop(other);
        assert_eq!(settlement.await, None);
    }

    #[tokio::test]
    async fn test_settle_from_another_task() {
        let (settler, settlement) = settle_pair::<&'static str, ()>();
        tokio::spawn(async move {
            tokio::task::yield_now().await;
            settler.resolve("done");
        });
        assert_eq!(settlement.await, Some(Ok("done")));
    }

    #[test]
    fn test_settle_after_settlement_dropped() {
        let (settler, settlement) = settle_pair::<u32, ()>();
        drop(settlement);
        assert!(settler.resolve(3));
        assert!(!settler.resolve(4));
    }
}
