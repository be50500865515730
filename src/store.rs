use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::domain::{Context, Entry, EntryId, EntryMap};
use crate::persistence::{codec, KeyValueStorage};
use std::pin::pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tokio::runtime::Handle;
use tokio::sync::{broadcast, Notify};

/// Storage key for the serialized entry mapping
pub const ENTRIES_KEY: &str = "entries";
/// Storage key for the serialized context flag
pub const CONTEXT_KEY: &str = "context";

/// Failure of a store operation. Only lookups and edit preconditions can
/// fail; persistence trouble never surfaces here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The id does not name a live entry
    #[error("no entry with id {0}")]
    UnknownEntry(EntryId),
    /// The entry exists but is not the one being edited
    #[error("entry {0} is not being edited")]
    NotEditing(EntryId),
}

/// Count of write-throughs still in flight, with a wakeup for waiters.
#[derive(Default)]
struct PendingWrites {
    in_flight: AtomicUsize,
    idle: Notify,
}

impl PendingWrites {
    fn begin(&self) {
        self.in_flight.fetch_add(1, Ordering::SeqCst);
    }

    fn finish(&self) {
        if self.in_flight.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.idle.notify_waiters();
        }
    }

    async fn settled(&self) {
        loop {
            // Register the wakeup before the check so a finish() between
            // the two cannot be missed
            let mut idle = pin!(self.idle.notified());
            idle.as_mut().enable();
            if self.in_flight.load(Ordering::SeqCst) == 0 {
                return;
            }
            idle.await;
        }
    }
}

/// In-memory to-do state with durable write-through.
///
/// All reads and mutations are synchronous against the in-memory state;
/// every mutation that changes durable state spawns a detached background
/// task that rewrites the affected storage blob. Failed write-throughs are
/// logged and broadcast via [`Store::diagnostics`], never returned from the
/// mutating call. [`Store::settled`] waits until no write-through is in
/// flight, which is the moment durable state is known to match memory.
pub struct Store {
    entries: EntryMap,
    current: Context,
    active_edit: Option<EntryId>,
    storage: Arc<dyn KeyValueStorage>,
    runtime: Handle,
    pending: Arc<PendingWrites>,
    diagnostics: Diagnostics,
    hydration: Vec<Diagnostic>,
}

impl Store {
    /// Build a store from whatever the backend currently holds.
    ///
    /// Each key is read and parsed independently; a key that is absent,
    /// unreadable or malformed falls back to its default (no entries,
    /// [`Context::Active`]) without failing the startup. What was skipped
    /// is available from [`Store::hydration_diagnostics`].
    ///
    /// Must be called inside a Tokio runtime; write-throughs are spawned
    /// onto the runtime that hydrated the store.
    pub async fn hydrate(storage: Arc<dyn KeyValueStorage>) -> Self {
        let diagnostics = Diagnostics::new();
        let mut hydration = Vec::new();

        let entries: EntryMap =
            load_key(&storage, ENTRIES_KEY, codec::decode_entries, &diagnostics, &mut hydration)
                .await
                .unwrap_or_default();
        let current =
            load_key(&storage, CONTEXT_KEY, codec::decode_context, &diagnostics, &mut hydration)
                .await
                .unwrap_or_default();

        tracing::debug!(entries = entries.len(), context = %current, "store hydrated");

        Self {
            entries,
            current,
            active_edit: None,
            storage,
            runtime: Handle::current(),
            pending: Arc::new(PendingWrites::default()),
            diagnostics,
            hydration,
        }
    }

    /// Switch the context in view.
    ///
    /// Always persists the flag, even when the context did not change.
    pub fn set_context(&mut self, context: Context) {
        self.current = context;
        self.persist_context();
    }

    /// Capture a new entry in the current context.
    ///
    /// Returns the id of the new entry, or `None` when `text` is empty.
    /// Text is taken verbatim; whitespace-only input is accepted.
    pub fn add(&mut self, text: impl Into<String>) -> Option<EntryId> {
        let text = text.into();
        if text.is_empty() {
            return None;
        }

        let entry = Entry::new(text, self.current);
        let id = entry.id;
        self.entries.insert(id, entry);
        self.persist_entries();
        Some(id)
    }

    /// Delete an entry and return it.
    pub fn remove(&mut self, id: EntryId) -> Result<Entry, StoreError> {
        let removed = self.entries.remove(&id).ok_or(StoreError::UnknownEntry(id))?;
        if self.active_edit == Some(id) {
            self.active_edit = None;
        }
        self.persist_entries();
        Ok(removed)
    }

    /// Confirmation question to show before removing an entry
    pub fn removal_prompt(&self, id: EntryId) -> Option<String> {
        self.entries
            .get(&id)
            .map(|entry| format!("Are you sure to delete \"{}\"?", entry.text))
    }

    /// Flip an entry between open and completed; returns the new state.
    ///
    /// Completing the entry that is being edited also ends that edit.
    pub fn toggle_complete(&mut self, id: EntryId) -> Result<bool, StoreError> {
        let entry = self.entries.get_mut(&id).ok_or(StoreError::UnknownEntry(id))?;
        let completed = entry.toggle_completed();
        if completed && self.active_edit == Some(id) {
            self.active_edit = None;
        }
        self.persist_entries();
        Ok(completed)
    }

    /// Toggle edit mode for an entry; returns whether it is now being edited.
    ///
    /// At most one entry is in edit mode; starting an edit displaces any
    /// other. Edit mode is view state and is never persisted.
    pub fn begin_edit(&mut self, id: EntryId) -> Result<bool, StoreError> {
        if !self.entries.contains_key(&id) {
            return Err(StoreError::UnknownEntry(id));
        }
        if self.active_edit == Some(id) {
            self.active_edit = None;
            Ok(false)
        } else {
            self.active_edit = Some(id);
            Ok(true)
        }
    }

    /// Replace the text of the entry being edited and end the edit.
    ///
    /// Unlike [`Store::add`], the replacement text may be empty.
    pub fn commit_edit(&mut self, id: EntryId, text: impl Into<String>) -> Result<(), StoreError> {
        let entry = self.entries.get_mut(&id).ok_or(StoreError::UnknownEntry(id))?;
        if self.active_edit != Some(id) {
            return Err(StoreError::NotEditing(id));
        }
        entry.set_text(text);
        self.active_edit = None;
        self.persist_entries();
        Ok(())
    }

    /// The full entry mapping, both contexts included
    pub fn entries(&self) -> &EntryMap {
        &self.entries
    }

    /// Look up a single entry
    pub fn entry(&self, id: EntryId) -> Option<&Entry> {
        self.entries.get(&id)
    }

    /// Entries of the current context, oldest first
    pub fn visible(&self) -> Vec<&Entry> {
        let mut view: Vec<&Entry> = self
            .entries
            .values()
            .filter(|entry| entry.context == self.current)
            .collect();
        view.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        view
    }

    /// The context currently in view
    pub fn current_context(&self) -> Context {
        self.current
    }

    /// Id of the entry in edit mode, if any
    pub fn active_edit(&self) -> Option<EntryId> {
        self.active_edit
    }

    /// Check if a specific entry is in edit mode
    pub fn is_editing(&self, id: EntryId) -> bool {
        self.active_edit == Some(id)
    }

    /// Total number of entries across both contexts
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Subscribe to storage failures absorbed by the store
    pub fn diagnostics(&self) -> broadcast::Receiver<Diagnostic> {
        self.diagnostics.subscribe()
    }

    /// What hydration skipped over (empty when startup was clean)
    pub fn hydration_diagnostics(&self) -> &[Diagnostic] {
        &self.hydration
    }

    /// Wait until every spawned write-through has finished, successfully
    /// or not. Returns immediately when none is in flight.
    pub async fn settled(&self) {
        self.pending.settled().await;
    }

    fn persist_entries(&self) {
        match codec::encode_entries(&self.entries) {
            Ok(blob) => self.spawn_write(ENTRIES_KEY, blob),
            Err(err) => self.diagnostics.report(Diagnostic::write_failed(ENTRIES_KEY, err)),
        }
    }

    fn persist_context(&self) {
        match codec::encode_context(self.current) {
            Ok(blob) => self.spawn_write(CONTEXT_KEY, blob),
            Err(err) => self.diagnostics.report(Diagnostic::write_failed(CONTEXT_KEY, err)),
        }
    }

    /// Fire-and-forget write of one blob. The mutation that triggered the
    /// write has already completed; the task only reports failure.
    fn spawn_write(&self, key: &'static str, blob: String) {
        let storage = Arc::clone(&self.storage);
        let diagnostics = self.diagnostics.clone();
        let pending = Arc::clone(&self.pending);

        // Counted before the spawn so settled() can never observe a gap
        pending.begin();
        tracing::trace!(key, bytes = blob.len(), "write-through issued");

        self.runtime.spawn(async move {
            if let Err(err) = storage.set(key, blob).await {
                diagnostics.report(Diagnostic::write_failed(key, err));
            }
            pending.finish();
        });
    }
}

/// Read and decode one key, reporting and defaulting on any failure
async fn load_key<T>(
    storage: &Arc<dyn KeyValueStorage>,
    key: &'static str,
    decode: impl Fn(&str) -> Result<T, codec::CodecError>,
    diagnostics: &Diagnostics,
    report: &mut Vec<Diagnostic>,
) -> Option<T> {
    match storage.get(key).await {
        Ok(Some(raw)) => match decode(&raw) {
            Ok(value) => Some(value),
            Err(err) => {
                let diagnostic = Diagnostic::malformed_value(key, err);
                diagnostics.report(diagnostic.clone());
                report.push(diagnostic);
                None
            }
        },
        Ok(None) => None,
        Err(err) => {
            let diagnostic = Diagnostic::read_failed(key, err);
            diagnostics.report(diagnostic.clone());
            report.push(diagnostic);
            None
        }
    }
}
