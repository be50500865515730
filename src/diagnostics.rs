use chrono::{DateTime, Utc};
use std::fmt;
use tokio::sync::broadcast;

/// How many un-consumed diagnostics a subscriber may lag behind by.
const CHANNEL_CAPACITY: usize = 16;

/// What went wrong on the storage boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticKind {
    /// A background write-through did not reach storage
    WriteFailed,
    /// A startup read failed outright
    ReadFailed,
    /// A stored blob did not parse and was discarded
    MalformedValue,
}

/// Record of a storage failure the store absorbed instead of surfacing.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    /// Storage key the failure concerns
    pub key: &'static str,
    /// Human-readable cause
    pub detail: String,
    /// When the failure was observed
    pub at: DateTime<Utc>,
}

impl Diagnostic {
    fn new(kind: DiagnosticKind, key: &'static str, detail: impl fmt::Display) -> Self {
        Self {
            kind,
            key,
            detail: detail.to_string(),
            at: Utc::now(),
        }
    }

    pub(crate) fn write_failed(key: &'static str, cause: impl fmt::Display) -> Self {
        Self::new(DiagnosticKind::WriteFailed, key, cause)
    }

    pub(crate) fn read_failed(key: &'static str, cause: impl fmt::Display) -> Self {
        Self::new(DiagnosticKind::ReadFailed, key, cause)
    }

    pub(crate) fn malformed_value(key: &'static str, cause: impl fmt::Display) -> Self {
        Self::new(DiagnosticKind::MalformedValue, key, cause)
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            DiagnosticKind::WriteFailed => {
                write!(f, "write-through for `{}` failed: {}", self.key, self.detail)
            }
            DiagnosticKind::ReadFailed => {
                write!(f, "read of `{}` failed: {}", self.key, self.detail)
            }
            DiagnosticKind::MalformedValue => {
                write!(f, "stored value for `{}` discarded: {}", self.key, self.detail)
            }
        }
    }
}

/// Fan-out point for diagnostics. Every report lands in the tracing log and
/// on the broadcast channel for any live subscriber.
#[derive(Clone)]
pub(crate) struct Diagnostics {
    channel: broadcast::Sender<Diagnostic>,
}

impl Diagnostics {
    pub(crate) fn new() -> Self {
        let (channel, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { channel }
    }

    pub(crate) fn subscribe(&self) -> broadcast::Receiver<Diagnostic> {
        self.channel.subscribe()
    }

    pub(crate) fn report(&self, diagnostic: Diagnostic) {
        tracing::warn!(key = diagnostic.key, "{diagnostic}");
        // A send error only means nobody is subscribed right now
        let _ = self.channel.send(diagnostic);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_reaches_subscriber() {
        let diagnostics = Diagnostics::new();
        let mut receiver = diagnostics.subscribe();

        diagnostics.report(Diagnostic::write_failed("entries", "disk full"));

        let received = receiver.try_recv().unwrap();
        assert_eq!(received.kind, DiagnosticKind::WriteFailed);
        assert_eq!(received.key, "entries");
        assert_eq!(received.detail, "disk full");
    }

    #[test]
    fn test_report_without_subscriber_is_absorbed() {
        let diagnostics = Diagnostics::new();
        // Must not panic or error
        diagnostics.report(Diagnostic::read_failed("context", "io error"));
    }

    #[test]
    fn test_display_names_the_key() {
        let diagnostic = Diagnostic::malformed_value("entries", "expected a map");
        let rendered = diagnostic.to_string();
        assert!(rendered.contains("entries"));
        assert!(rendered.contains("expected a map"));
    }
}
