//! Shared identifier aliases.

/// Caller-assigned book identifier, unique within the catalog.
pub type BookId = String;
/// Caller-assigned user identifier, unique within the membership.
pub type UserId = String;
