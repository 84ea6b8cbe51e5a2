//! # cm-store-local
//! campus-market/crates/cm-plugins/cm-store-local/src/lib.rs
//! On-device implementations of `KvBackend` and `SeedSource`.
//! Features: one document per key with atomic replace, an in-memory map,
//! and file or embedded seed datasets.

pub mod fs;
pub mod memory;
pub mod seed;

pub use fs::LocalFileStore;
pub use memory::MemoryStore;
pub use seed::{FileSeedSource, StaticSeed};
