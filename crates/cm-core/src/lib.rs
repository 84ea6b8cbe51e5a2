//! campus-market/crates/cm-core/src/lib.rs
//!
//! The central domain logic and interface definitions for campus-market:
//! models, the filter/sort engine, saved-search predicates, session
//! ownership and the ports implemented by plugins.

pub mod contact;
pub mod error;
pub mod filter;
pub mod matching;
pub mod models;
pub mod seller;
pub mod session;
pub mod traits;

// Re-exporting for easier access in other crates
pub use error::*;
pub use filter::{apply, FilterState, ListingFilter, SortMode};
pub use models::*;
pub use session::SessionOwnership;
pub use traits::*;
