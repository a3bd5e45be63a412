//! Ballot persistence.
//!
//! - `BallotStore`: async trait the hosting service saves through
//! - `MemoryStore`: in-process store for tests and embedded use
//! - `FileStore`: single CBOR file with atomic replace

pub mod file;
pub mod memory;
pub mod traits;

pub use file::FileStore;
pub use memory::MemoryStore;
pub use traits::{BallotSnapshot, BallotStore, StoreError, StoreResult, SCHEMA_VERSION};
