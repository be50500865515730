//! A small two-context to-do store.
//!
//! Entries live in one of two contexts, [`Context::Active`] or
//! [`Context::Deferred`], with exactly one context in view at a time. All
//! state is held in memory and mirrored into a [`KeyValueStorage`] backend
//! through fire-and-forget write-throughs; [`Store::hydrate`] rebuilds the
//! state on startup and falls back to defaults for anything missing or
//! malformed.

pub mod diagnostics;
pub mod domain;
pub mod persistence;
pub mod store;

pub use diagnostics::{Diagnostic, DiagnosticKind};
pub use domain::{Context, Entry, EntryId, EntryMap};
pub use persistence::{CodecError, FileStorage, KeyValueStorage, MemoryStorage, StorageError};
pub use store::{Store, StoreError, CONTEXT_KEY, ENTRIES_KEY};
