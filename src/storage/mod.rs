//! Flat-file persistence for the user map

pub mod users;

// Re-exports for convenience
pub use users::{UserMap, UserRecord, UserStore};
