//! The storage collaborator: fetch, replace, subscribe.
//!
//! The real store sits behind a network transport owned by the host
//! application; the core only ever sees this trait. Persistence is
//! full-document: `replace` swaps a list's entire entry collection, and
//! subscribers receive whole snapshots, never per-entry patches.
//!
//! [`InMemoryBackend`] is the reference implementation used by tests and
//! the demo. It is faithful in the one way that matters here: every
//! accepted replace is fanned out to all of the list's subscribers,
//! including the client that pushed it. That echo is the behavior the
//! dirty window exists to absorb.

use std::sync::mpsc;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;

use rustc_hash::FxHashMap;
use thiserror::Error;

use crate::id::ListId;
use crate::snapshot::SnapshotEntry;

/// Failures crossing the storage boundary.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum BackendError {
    /// The store could not be reached or refused the operation.
    #[error("backend unavailable: {reason}")]
    Unavailable { reason: String },
}

/// A live feed of snapshots for one list. Dropping the handle
/// unsubscribes.
#[derive(Debug)]
pub struct Subscription {
    feed: mpsc::Receiver<Vec<SnapshotEntry>>,
}

impl Subscription {
    /// Wrap a receiving channel as a snapshot feed.
    pub fn new(feed: mpsc::Receiver<Vec<SnapshotEntry>>) -> Subscription {
        return Subscription { feed };
    }

    /// The next delivered snapshot, if any is waiting. Never blocks.
    pub fn poll(&self) -> Result<Option<Vec<SnapshotEntry>>, BackendError> {
        return match self.feed.try_recv() {
            Ok(snapshot) => Ok(Some(snapshot)),
            Err(mpsc::TryRecvError::Empty) => Ok(None),
            Err(mpsc::TryRecvError::Disconnected) => Err(BackendError::Unavailable {
                reason: "snapshot feed closed".into(),
            }),
        };
    }
}

/// The document store behind a sync session.
///
/// Methods take `&self`; implementations carry their own interior
/// mutability so one handle can be shared across sessions.
pub trait Backend {
    /// Fetch a list's current entries. A list that was never written is
    /// empty, not an error.
    fn fetch(&self, list: &ListId) -> Result<Vec<SnapshotEntry>, BackendError>;

    /// Replace a list's entire entry collection.
    fn replace(&self, list: &ListId, entries: Vec<SnapshotEntry>) -> Result<(), BackendError>;

    /// Open a snapshot feed for a list. Every accepted replace is
    /// delivered to all of the list's feeds, the replacer's own included.
    fn subscribe(&self, list: &ListId) -> Result<Subscription, BackendError>;
}

/// In-process reference backend with echoing fan-out. Cloning the handle
/// shares the store, which is how tests simulate multiple clients.
#[derive(Clone, Debug, Default)]
pub struct InMemoryBackend {
    inner: Arc<Mutex<Inner>>,
}

#[derive(Debug, Default)]
struct Inner {
    lists: FxHashMap<ListId, Vec<SnapshotEntry>>,
    feeds: FxHashMap<ListId, Vec<mpsc::Sender<Vec<SnapshotEntry>>>>,
}

impl InMemoryBackend {
    pub fn new() -> InMemoryBackend {
        return InMemoryBackend::default();
    }

    fn locked(&self) -> Result<MutexGuard<'_, Inner>, BackendError> {
        return self.inner.lock().map_err(|_| BackendError::Unavailable {
            reason: "store lock poisoned".into(),
        });
    }
}

impl Backend for InMemoryBackend {
    fn fetch(&self, list: &ListId) -> Result<Vec<SnapshotEntry>, BackendError> {
        let inner = self.locked()?;
        return Ok(inner.lists.get(list).cloned().unwrap_or_default());
    }

    fn replace(&self, list: &ListId, entries: Vec<SnapshotEntry>) -> Result<(), BackendError> {
        let mut inner = self.locked()?;
        inner.lists.insert(list.clone(), entries.clone());
        // Fan out to every live feed, echo included. Feeds whose
        // subscription was dropped fail to send and are pruned here.
        if let Some(feeds) = inner.feeds.get_mut(list) {
            feeds.retain(|feed| feed.send(entries.clone()).is_ok());
        }
        return Ok(());
    }

    fn subscribe(&self, list: &ListId) -> Result<Subscription, BackendError> {
        let (sender, receiver) = mpsc::channel();
        let mut inner = self.locked()?;
        inner.feeds.entry(list.clone()).or_default().push(sender);
        return Ok(Subscription::new(receiver));
    }
}
