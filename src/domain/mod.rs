pub mod entry;
pub mod enums;

pub use entry::{Entry, EntryId, EntryMap};
pub use enums::Context;
