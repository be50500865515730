use super::enums::Context;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;

/// Unique identifier of an entry, stable across restarts.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct EntryId(Uuid);

impl EntryId {
    /// Mint a fresh random id
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wrap an existing UUID (for ids read back from storage)
    pub const fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// Borrow the underlying UUID
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for EntryId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A single to-do entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    /// Unique ID, also the key under which the entry is stored
    pub id: EntryId,
    /// User-supplied text, shown verbatim
    pub text: String,
    /// Context the entry was captured in
    pub context: Context,
    /// Whether the entry has been checked off
    #[serde(default)]
    pub completed: bool,
    /// When the entry was captured
    pub created_at: DateTime<Utc>,
}

impl Entry {
    pub fn new(text: impl Into<String>, context: Context) -> Self {
        Self {
            id: EntryId::new(),
            text: text.into(),
            context,
            completed: false,
            created_at: Utc::now(),
        }
    }

    /// Flip the completion flag and return the new value
    pub fn toggle_completed(&mut self) -> bool {
        self.completed = !self.completed;
        self.completed
    }

    /// Replace the entry text
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }
}

/// The full entry mapping, ordered by id for deterministic serialization.
pub type EntryMap = BTreeMap<EntryId, Entry>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_new() {
        let entry = Entry::new("Buy milk", Context::Active);
        assert_eq!(entry.text, "Buy milk");
        assert_eq!(entry.context, Context::Active);
        assert!(!entry.completed);
    }

    #[test]
    fn test_entry_ids_are_unique() {
        let a = Entry::new("a", Context::Active);
        let b = Entry::new("a", Context::Active);
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_entry_toggle_completed() {
        let mut entry = Entry::new("Buy milk", Context::Active);

        // open -> completed
        assert!(entry.toggle_completed());
        assert!(entry.completed);

        // completed -> open
        assert!(!entry.toggle_completed());
        assert!(!entry.completed);
    }

    #[test]
    fn test_entry_set_text() {
        let mut entry = Entry::new("Buy milk", Context::Active);
        entry.set_text("Buy oat milk");
        assert_eq!(entry.text, "Buy oat milk");
    }

    #[test]
    fn test_entry_serde_round_trip() {
        let entry = Entry::new("Visit Tokyo", Context::Deferred);
        let json = serde_json::to_string(&entry).unwrap();
        let back: Entry = serde_json::from_str(&json).unwrap();
        assert_eq!(back, entry);
    }

    #[test]
    fn test_entry_completed_defaults_to_false() {
        // Records written before the completion flag existed omit it.
        let json = format!(
            r#"{{"id":"{}","text":"Buy milk","context":"active","created_at":"2024-11-02T09:30:00Z"}}"#,
            Uuid::new_v4()
        );
        let entry: Entry = serde_json::from_str(&json).unwrap();
        assert!(!entry.completed);
    }

    #[test]
    fn test_entry_id_display_matches_uuid() {
        let raw = Uuid::new_v4();
        let id = EntryId::from_uuid(raw);
        assert_eq!(id.to_string(), raw.to_string());
        assert_eq!(id.as_uuid(), &raw);
    }
}
