// Keyward — Store Module
//
// In-memory, ownership-aware key-value engine. All reads and mutations are
// serialized through a single worker task; only the identity that created a key
// may update or delete it.

mod engine;
mod error;
mod models;

pub use engine::KvStore;
pub use error::StoreError;
pub use models::{Entry, EntryInfo};
