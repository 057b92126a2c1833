//! The sync session: one list, one backend, one editing client.
//!
//! Every local mutation routes through the coordinator so three things
//! always happen together: the list changes, the dirty window opens, and
//! the push debounce restarts. The host loop then drives time explicitly,
//! calling [`SyncCoordinator::tick`] to let a due push fire and
//! [`SyncCoordinator::pump`] to drain incoming snapshots. No thread is
//! spawned and no clock is read internally, which keeps whole sessions
//! deterministic under test.
//!
//! Convergence model: pushes replace the backend's whole collection, and
//! the last snapshot applied wins outside the dirty window. Within the
//! window the local session wins unconditionally. This is deliberately
//! weaker than a CRDT and documented as such; the window is what makes it
//! livable in practice.

use std::time::Duration;
use std::time::Instant;

use thiserror::Error;
use tracing::debug;
use tracing::warn;

use crate::backend::Backend;
use crate::backend::BackendError;
use crate::backend::Subscription;
use crate::debounce::Debounce;
use crate::entry::same_shapes;
use crate::entry::Draft;
use crate::entry::ListEntry;
use crate::entry::OrderScope;
use crate::id::EntryId;
use crate::id::ListId;
use crate::id::MealId;
use crate::list::OrderedItemList;
use crate::snapshot;
use crate::snapshot::SnapshotEntry;
use crate::snapshot::SnapshotError;
use crate::window::DirtyWindow;

/// Failures surfaced by a sync session.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum SyncError {
    #[error(transparent)]
    Backend(#[from] BackendError),
    #[error(transparent)]
    Snapshot(#[from] SnapshotError),
}

/// Session timing knobs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SyncConfig {
    /// Quiet time after the last edit before the list is pushed.
    pub debounce: Duration,
    /// How long incoming snapshots are discarded after a local edit.
    pub grace: Duration,
}

impl Default for SyncConfig {
    fn default() -> Self {
        return SyncConfig {
            debounce: Duration::from_millis(500),
            grace: Duration::from_millis(700),
        };
    }
}

struct Active {
    list_id: ListId,
    feed: Subscription,
}

/// Owns one client's view of one list and arbitrates between local edits
/// and backend snapshots.
pub struct SyncCoordinator<B> {
    backend: B,
    config: SyncConfig,
    list: OrderedItemList,
    window: DirtyWindow,
    push: Debounce,
    active: Option<Active>,
}

impl<B: Backend> SyncCoordinator<B> {
    /// A detached session with default timing. Local edits work
    /// immediately; nothing is pushed or received until [`attach`].
    ///
    /// [`attach`]: SyncCoordinator::attach
    pub fn new(backend: B) -> SyncCoordinator<B> {
        return SyncCoordinator::with_config(backend, SyncConfig::default());
    }

    /// A detached session with explicit timing.
    pub fn with_config(backend: B, config: SyncConfig) -> SyncCoordinator<B> {
        return SyncCoordinator {
            backend,
            list: OrderedItemList::new(),
            window: DirtyWindow::new(config.grace),
            push: Debounce::new(config.debounce),
            active: None,
            config,
        };
    }

    /// Switch the session to a list. The previous subscription is
    /// dropped, timers are cleared, and the list's current state is
    /// adopted, normalized to a single blank row when empty.
    pub fn attach(&mut self, list_id: ListId) -> Result<(), SyncError> {
        self.active = None;
        self.push.cancel();
        self.window.reset();

        // Subscribe before fetching; a replace landing in between is
        // then waiting in the feed instead of lost.
        let feed = self.backend.subscribe(&list_id)?;
        let mut entries = snapshot::validate(self.backend.fetch(&list_id)?)?;
        if entries.is_empty() {
            entries.push(ListEntry::placeholder());
        }
        self.list = OrderedItemList::from_entries(entries);
        self.active = Some(Active { list_id, feed });
        return Ok(());
    }

    /// The attached list, if any.
    pub fn list_id(&self) -> Option<&ListId> {
        return self.active.as_ref().map(|a| &a.list_id);
    }

    /// Session timing, for hosts scheduling their wakeups.
    pub fn config(&self) -> &SyncConfig {
        return &self.config;
    }

    /// All entries in flat list order.
    pub fn entries(&self) -> &[ListEntry] {
        return self.list.entries();
    }

    /// A meal's ingredient rows, in meal order.
    pub fn meal_entries(&self, meal: &MealId) -> Vec<&ListEntry> {
        return self.list.in_scope(&OrderScope::Meal(meal.clone()));
    }

    /// Look up an entry by id.
    pub fn get(&self, id: &EntryId) -> Option<&ListEntry> {
        return self.list.get(id);
    }

    /// Whether an un-pushed edit is waiting on the debounce.
    pub fn pending_push(&self) -> bool {
        return self.push.is_armed();
    }

    /// Append content at the end of `scope`.
    pub fn append(&mut self, draft: Draft, scope: &OrderScope, now: Instant) -> EntryId {
        let id = self.list.append(draft, scope);
        self.touched(now);
        return id;
    }

    /// Insert content after an existing entry within `scope`. A stale
    /// anchor makes this a no-op, like the list layer it wraps.
    pub fn insert_after(
        &mut self,
        after: &EntryId,
        draft: Draft,
        scope: &OrderScope,
        now: Instant,
    ) -> Option<EntryId> {
        let id = self.list.insert_after(after, draft, scope)?;
        self.touched(now);
        return Some(id);
    }

    /// Replace an entry's text.
    pub fn set_text(&mut self, id: &EntryId, text: impl Into<String>, now: Instant) -> bool {
        let changed = self.list.set_text(id, text);
        if changed {
            self.touched(now);
        }
        return changed;
    }

    /// Tick or untick an entry.
    pub fn set_checked(&mut self, id: &EntryId, checked: bool, now: Instant) -> bool {
        let changed = self.list.set_checked(id, checked);
        if changed {
            self.touched(now);
        }
        return changed;
    }

    /// Replace an entry's quantity.
    pub fn set_quantity(
        &mut self,
        id: &EntryId,
        quantity: Option<String>,
        now: Instant,
    ) -> bool {
        let changed = self.list.set_quantity(id, quantity);
        if changed {
            self.touched(now);
        }
        return changed;
    }

    /// Remove an entry. A list never renders empty: deleting the last
    /// row leaves a fresh blank one in its place.
    pub fn delete(&mut self, id: &EntryId, now: Instant) -> bool {
        if !self.list.delete(id) {
            return false;
        }
        if self.list.is_empty() {
            self.list.append(Draft::item(""), &OrderScope::List);
        }
        self.touched(now);
        return true;
    }

    /// Adopt a dropped order for the whole scope.
    pub fn apply_drag(&mut self, ordered: &[EntryId], scope: &OrderScope, now: Instant) -> bool {
        let changed = self.list.apply_drag(ordered, scope);
        if changed {
            self.touched(now);
        }
        return changed;
    }

    /// Let a due push fire. Returns whether a push was delivered.
    ///
    /// Only the freshest state ever goes out: edits restart the debounce,
    /// so a burst of typing collapses into one replace. Rows with empty
    /// text are local-only and stay out of the push. A failed push is
    /// logged and dropped; the next edit's debounce is the retry.
    pub fn tick(&mut self, now: Instant) -> bool {
        if !self.push.fire(now) {
            return false;
        }
        let Some(active) = &self.active else {
            debug!("push deadline fired with no attached list");
            return false;
        };
        let entries: Vec<SnapshotEntry> = self
            .list
            .entries()
            .iter()
            .filter(|e| !e.text.is_empty())
            .map(SnapshotEntry::of)
            .collect();
        return match self.backend.replace(&active.list_id, entries) {
            Ok(()) => {
                debug!(list = %active.list_id, rows = self.list.len(), "pushed list");
                true
            }
            Err(err) => {
                warn!(list = %active.list_id, %err, "push failed, keeping local state");
                false
            }
        };
    }

    /// Drain the snapshot feed, applying each waiting snapshot under the
    /// arbitration policy. Returns how many snapshots changed the list.
    pub fn pump(&mut self, now: Instant) -> Result<usize, SyncError> {
        let mut applied = 0;
        loop {
            let Some(active) = &self.active else {
                return Ok(applied);
            };
            let snapshot = match active.feed.poll()? {
                Some(snapshot) => snapshot,
                None => return Ok(applied),
            };
            if self.apply_snapshot(snapshot, now)? {
                applied += 1;
            }
        }
    }

    /// Arbitrate one incoming snapshot.
    ///
    /// Suppressed snapshots are discarded outright, different or not;
    /// grace means grace. Unsuppressed snapshots replace local state only
    /// when they differ in shape, so echoes of our own pushes never
    /// trigger a re-render.
    fn apply_snapshot(&mut self, raw: Vec<SnapshotEntry>, now: Instant) -> Result<bool, SyncError> {
        if self.window.is_suppressed(now) {
            debug!("discarding snapshot inside the dirty window");
            return Ok(false);
        }
        let mut entries = snapshot::validate(raw)?;
        if entries.is_empty() {
            entries.push(ListEntry::placeholder());
        }
        if same_shapes(self.list.entries(), &entries) {
            debug!("snapshot matches local state, skipping");
            return Ok(false);
        }
        self.list = OrderedItemList::from_entries(entries);
        return Ok(true);
    }

    /// Bookkeeping shared by every successful local mutation.
    fn touched(&mut self, now: Instant) {
        self.window.mark_dirty(now);
        self.push.restart(now);
    }
}
