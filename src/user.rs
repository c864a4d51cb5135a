//! User record and registration payload.

use serde::{Deserialize, Serialize};

use crate::types::{BookId, UserId};

/// Membership entry for a single library user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Stable user identifier.
    pub id: UserId,
    /// Display name.
    pub name: String,
    /// Contact email.
    pub email: String,
    /// Books currently held, in borrow order.
    pub borrowed: Vec<BookId>,
}

/// Registration payload used to create a new [`User`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserDraft {
    /// Stable user identifier.
    pub id: UserId,
    /// Display name.
    pub name: String,
    /// Contact email.
    pub email: String,
}
