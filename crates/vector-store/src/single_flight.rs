use std::future::Future;
use tokio::sync::OnceCell;

/// A value computed at most once, with concurrent callers awaiting the same computation.
///
/// The first caller of [`SingleFlight::run`] drives the future; everyone arriving while it is
/// in flight waits for it instead of starting their own. If the driving future is dropped
/// before finishing, the next waiter takes over. Once a value is stored it never changes,
/// which is what makes a stored failure sticky.
#[derive(Debug)]
pub struct SingleFlight<T> {
    cell: OnceCell<T>,
}

impl<T> SingleFlight<T> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            cell: OnceCell::new(),
        }
    }

    /// The settled value, if any.
    pub fn get(&self) -> Option<&T> {
        self.cell.get()
    }

    pub fn is_settled(&self) -> bool {
        self.cell.initialized()
    }

    pub async fn run<F, Fut>(&self, init: F) -> &T
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        self.cell.get_or_init(init).await
    }
}

impl<T> Default for SingleFlight<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test]
    async fn concurrent_callers_share_one_computation() {
        let flight = Arc::new(SingleFlight::<usize>::new());
        let runs = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let flight = Arc::clone(&flight);
            let runs = Arc::clone(&runs);
            handles.push(tokio::spawn(async move {
                *flight
                    .run(|| async {
                        runs.fetch_add(1, Ordering::SeqCst);
                        tokio::time::sleep(Duration::from_millis(20)).await;
                        42
                    })
                    .await
            }));
        }

        for handle in handles {
            assert_eq!(handle.await.unwrap(), 42);
        }
        assert_eq!(runs.load(Ordering::SeqCst), 1);
        assert!(flight.is_settled());
    }

    #[tokio::test]
    async fn settled_value_is_never_recomputed() {
        let flight = SingleFlight::new();
        assert_eq!(*flight.run(|| async { "first" }).await, "first");
        assert_eq!(*flight.run(|| async { "second" }).await, "first");
        assert_eq!(flight.get(), Some(&"first"));
    }
}
