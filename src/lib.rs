//! Potluck - ranking and sync cores for collaborative grocery lists.
//!
//! Entries are ordered by fractional rank keys that sort as plain
//! strings, lists assign and repair those keys on every mutation, and a
//! sync coordinator arbitrates between local edits and whole-list
//! snapshots pushed by the backend.
//!
//! # Quick Start
//!
//! ```
//! use std::time::Instant;
//!
//! use potluck::backend::InMemoryBackend;
//! use potluck::entry::Draft;
//! use potluck::entry::OrderScope;
//! use potluck::id::ListId;
//! use potluck::sync::SyncCoordinator;
//!
//! // Open a session on a shared list
//! let mut sync = SyncCoordinator::new(InMemoryBackend::new());
//! sync.attach(ListId::from_raw("groceries")).unwrap();
//!
//! // Edit locally; rank keys are assigned automatically
//! let now = Instant::now();
//! let milk = sync.append(Draft::item("milk"), &OrderScope::List, now);
//! sync.insert_after(&milk, Draft::item("bread"), &OrderScope::List, now).unwrap();
//!
//! // The debounced push delivers the whole list to the backend
//! assert!(sync.tick(now + sync.config().debounce));
//! ```

pub mod backend;
pub mod debounce;
pub mod entry;
pub mod id;
pub mod list;
pub mod meal;
pub mod optimistic;
pub mod rank;
pub mod snapshot;
pub mod sync;
pub mod window;
