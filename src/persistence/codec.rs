use crate::domain::{Context, EntryMap};
use thiserror::Error;

/// Failure while turning state into stored blobs or back.
#[derive(Debug, Error)]
pub enum CodecError {
    /// State could not be serialized
    #[error("failed to serialize state: {0}")]
    Encode(#[source] serde_json::Error),
    /// A stored blob did not parse as the expected shape
    #[error("malformed stored value: {0}")]
    Decode(#[source] serde_json::Error),
}

/// Serialize the whole entry mapping as one pretty-printed JSON object
pub fn encode_entries(entries: &EntryMap) -> Result<String, CodecError> {
    serde_json::to_string_pretty(entries).map_err(CodecError::Encode)
}

/// Parse an entry mapping blob
pub fn decode_entries(raw: &str) -> Result<EntryMap, CodecError> {
    serde_json::from_str(raw).map_err(CodecError::Decode)
}

/// Serialize the context flag
pub fn encode_context(context: Context) -> Result<String, CodecError> {
    serde_json::to_string(&context).map_err(CodecError::Encode)
}

/// Parse a context flag blob
pub fn decode_context(raw: &str) -> Result<Context, CodecError> {
    serde_json::from_str(raw).map_err(CodecError::Decode)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Entry;
    use pretty_assertions::assert_eq;

    fn sample_entries() -> EntryMap {
        let mut entries = EntryMap::new();
        for (text, context) in [("Buy milk", Context::Active), ("Visit Tokyo", Context::Deferred)] {
            let entry = Entry::new(text, context);
            entries.insert(entry.id, entry);
        }
        entries
    }

    #[test]
    fn test_entries_round_trip() {
        let entries = sample_entries();
        let blob = encode_entries(&entries).unwrap();
        assert_eq!(decode_entries(&blob).unwrap(), entries);
    }

    #[test]
    fn test_entries_blob_is_keyed_by_id() {
        let entries = sample_entries();
        let blob = encode_entries(&entries).unwrap();

        let parsed: serde_json::Value = serde_json::from_str(&blob).unwrap();
        let object = parsed.as_object().unwrap();
        assert_eq!(object.len(), entries.len());
        for (id, entry) in &entries {
            assert_eq!(object[&id.to_string()]["text"], entry.text.as_str());
        }
    }

    #[test]
    fn test_empty_entries_decode_to_empty_map() {
        assert!(decode_entries("{}").unwrap().is_empty());
    }

    #[test]
    fn test_malformed_entries_blob_is_rejected() {
        assert!(decode_entries("{ not json").is_err());
        // Well-formed JSON of the wrong shape is rejected too
        assert!(decode_entries("[1, 2, 3]").is_err());
    }

    #[test]
    fn test_context_round_trip() {
        for &context in Context::all() {
            let blob = encode_context(context).unwrap();
            assert_eq!(decode_context(&blob).unwrap(), context);
        }
    }

    #[test]
    fn test_legacy_boolean_context_is_rejected() {
        // Earlier builds stored the flag as a bare boolean; those blobs
        // fall back to the default context instead of being guessed at.
        assert!(decode_context("true").is_err());
        assert!(decode_context("false").is_err());
    }
}
