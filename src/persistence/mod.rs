pub mod codec;
pub mod file;
pub mod kv;
pub mod memory;

pub use codec::{decode_context, decode_entries, encode_context, encode_entries, CodecError};
pub use file::FileStorage;
pub use kv::{KeyValueStorage, StorageError};
pub use memory::MemoryStorage;
