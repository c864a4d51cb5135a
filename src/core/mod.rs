//! In-memory authoritative catalog, membership, and lending engine.

/// Authoritative library store and undo engine.
pub mod store;
