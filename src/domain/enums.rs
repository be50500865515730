use serde::{Deserialize, Serialize};
use std::fmt;

/// Context a to-do entry belongs to. Exactly one context is in view at a time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Context {
    /// Day-to-day tasks. The context shown on first launch.
    #[default]
    Active,
    /// Parked tasks, kept out of the way until picked up again.
    Deferred,
}

impl Context {
    /// Get the display name for this context
    pub fn name(&self) -> &'static str {
        match self {
            Context::Active => "Active",
            Context::Deferred => "Deferred",
        }
    }

    /// Get the other context
    pub fn other(&self) -> Self {
        match self {
            Context::Active => Context::Deferred,
            Context::Deferred => Context::Active,
        }
    }

    /// Get all contexts as a list
    pub fn all() -> &'static [Context] {
        &[Context::Active, Context::Deferred]
    }
}

impl fmt::Display for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
