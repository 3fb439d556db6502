// ── Collection change streams ──
//
// Subscription type for consuming re-instantiations of a collection
// manager's collections.

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures_core::Stream;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;

use crate::store::CollectionSnapshot;

/// A subscription to one collection manager.
///
/// Provides point-in-time snapshot access and change notification via
/// `changed()` or by converting to a `Stream`. Every snapshot holds the
/// instances current at publication; earlier `Arc<Collection>` handles
/// are never updated, so consumers re-fetch from the new snapshot.
pub struct CollectionStream {
    current: Arc<CollectionSnapshot>,
    receiver: watch::Receiver<Arc<CollectionSnapshot>>,
}

impl CollectionStream {
    pub(crate) fn new(receiver: watch::Receiver<Arc<CollectionSnapshot>>) -> Self {
        let current = receiver.borrow().clone();
        Self { current, receiver }
    }

    /// The snapshot captured at creation or at the last `changed()`.
    pub fn current(&self) -> &Arc<CollectionSnapshot> {
        &self.current
    }

    /// The latest published snapshot.
    pub fn latest(&self) -> Arc<CollectionSnapshot> {
        self.receiver.borrow().clone()
    }

    /// Wait for the next change, returning the new snapshot.
    /// Returns `None` once the manager has been dropped.
    pub async fn changed(&mut self) -> Option<Arc<CollectionSnapshot>> {
        self.receiver.changed().await.ok()?;
        let snap = self.receiver.borrow_and_update().clone();
        self.current = Arc::clone(&snap);
        Some(snap)
    }

    /// Convert into a `Stream` for use with `StreamExt` combinators.
    pub fn into_stream(self) -> CollectionWatchStream {
        CollectionWatchStream {
            inner: WatchStream::new(self.receiver),
        }
    }
}

/// `Stream` adapter backed by a `watch::Receiver`. Yields the current
/// snapshot first, then one per change.
pub struct CollectionWatchStream {
    inner: WatchStream<Arc<CollectionSnapshot>>,
}

impl Stream for CollectionWatchStream {
    type Item = Arc<CollectionSnapshot>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.inner).poll_next(cx)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use tokio_test::{assert_pending, assert_ready, task};

    use super::*;
    use crate::model::CollectionOptions;
    use crate::registry::Registries;
    use crate::store::CollectionManager;

    fn manager() -> CollectionManager {
        CollectionManager::new("main", Arc::new(Registries::new()))
    }

    #[test]
    fn changed_waits_for_the_next_publication() {
        let manager = manager();
        let mut stream = manager.subscribe();
        assert!(stream.current().is_empty());

        {
            let mut changed = task::spawn(stream.changed());
            assert_pending!(changed.poll());

            manager.add_collections([CollectionOptions::new("users")]);
            assert!(changed.is_woken());
            let snap = assert_ready!(changed.poll()).unwrap();
            assert!(snap.get("users").is_some());
        }

        assert_eq!(stream.current().len(), 1);
    }

    #[test]
    fn stream_yields_current_snapshot_first() {
        let manager = manager();
        manager.add_collections([CollectionOptions::new("users")]);

        let mut stream = task::spawn(manager.subscribe().into_stream());
        let first = assert_ready!(stream.poll_next()).unwrap();
        assert_eq!(first.len(), 1);
        assert_pending!(stream.poll_next());

        manager.add_collections([CollectionOptions::new("roles")]);
        let second = assert_ready!(stream.poll_next()).unwrap();
        assert_eq!(second.len(), 2);
    }

    #[test]
    fn changed_ends_when_the_manager_is_dropped() {
        let manager = manager();
        let mut stream = manager.subscribe();
        drop(manager);

        let mut changed = task::spawn(stream.changed());
        assert!(assert_ready!(changed.poll()).is_none());
    }
}
